use anyhow::Context;
use clap::Parser;
use helpers::general::InputValueError;
use ratrace::core::handle_race::handle_race;
use ratrace::core::sprite_cache::{SpriteRecolorCache, SpriteSheet};
use ratrace::interfaces::render_interface::RaceState;
use ratrace::post::race_result::RaceResult;
use ratrace::pre::read_sim_pars::{read_sim_pars, SimPars};
use ratrace::pre::sim_opts::SimOpts;
use ratrace::pre::sprite_meta::default_animations;
use rayon::prelude::*;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// summarize_race_state creates a one-line overview of a race state for the log.
fn summarize_race_state(race_state: &RaceState) -> String {
    let rats: Vec<String> = race_state
        .rat_states
        .iter()
        .map(|rat_state| format!("{} ({:?})", rat_state.name, rat_state.state))
        .collect();

    format!(
        "t = {:8.3}s | gate {:?} ({:.2}) | music {:?} | {}",
        race_state.cur_racetime / 1000.0,
        race_state.gate_state,
        race_state.gate_opacity,
        race_state.music_state,
        rats.join(", ")
    )
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();

    // setup logging
    let log_level = if sim_opts.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // check simulation options
    if !(1.0..=100.0).contains(&sim_opts.timestep_size) {
        return Err(InputValueError::new(format!(
            "time step size must be in the range [1.0, 100.0] ms, got {}",
            sim_opts.timestep_size
        ))
        .into());
    }
    if sim_opts.realtime_factor <= 0.0 {
        return Err(InputValueError::new("real-time factor must be positive").into());
    }

    // get simulation parameters
    let mut sim_pars = if let Some(parfile_path) = &sim_opts.parfile_path {
        info!("Reading simulation parameters from {}", parfile_path.display());
        read_sim_pars(parfile_path)?
    } else {
        info!("No parameter file given, using default parameters");
        SimPars::default()
    };

    if sim_opts.seed.is_some() {
        sim_pars.race_pars.seed = sim_opts.seed;
    }

    // get sprite sheet and animations
    let sprite_sheet = match &sim_opts.sprite_dir {
        Some(sprite_dir) => Some(
            SpriteSheet::load(
                &sprite_dir.join("spritesheet_meta.json"),
                &sprite_dir.join("spritesheet_grey.png"),
                &sprite_dir.join("spritesheet_vest_mask.png"),
            )
            .context("Failed to load sprites!")?,
        ),
        None => None,
    };

    let animations = match &sprite_sheet {
        Some(sprite_sheet) => sprite_sheet.get_animations().to_owned(),
        None => default_animations(),
    };

    // print race details
    info!(
        "Simulating {} rat(s) over {} lap(s) with a time step size of {:.1}ms",
        sim_pars.race_pars.no_rats, sim_pars.timing_pars.laps_to_finish, sim_opts.timestep_size
    );

    // EXECUTION -----------------------------------------------------------------------------------
    if !sim_opts.realtime {
        // NON-REAL-TIME CASE
        let t_start = Instant::now();

        let race_results: Vec<anyhow::Result<RaceResult>> = (0..sim_opts.no_sim_runs)
            .into_par_iter()
            .map(|run| {
                // every run gets its own seed if a seed was set
                let mut run_pars = sim_pars.clone();
                run_pars.race_pars.seed = sim_pars
                    .race_pars
                    .seed
                    .map(|seed| seed.wrapping_add(run as u64));

                handle_race(
                    &run_pars,
                    animations.clone(),
                    sim_opts.timestep_size,
                    None,
                    1.0,
                    sim_opts.max_racetime,
                )
            })
            .collect();

        info!(
            "Execution time: {}ms ({} run(s))",
            t_start.elapsed().as_millis(),
            sim_opts.no_sim_runs
        );

        // POST-PROCESSING -------------------------------------------------------------------------
        for (run, race_result) in race_results.into_iter().enumerate() {
            let race_result = race_result.context(format!("Simulation run {} failed!", run + 1))?;

            if sim_opts.no_sim_runs > 1 {
                info!("Simulation run {}", run + 1);
            }
            race_result.print_results();
        }
    } else {
        // REAL-TIME CASE
        if sim_opts.no_sim_runs > 1 {
            warn!("The number of simulation runs is ignored in real-time mode");
        }

        // create channel for communication between the simulation thread and the renderer
        let (tx, rx) = flume::unbounded();

        // start simulation in a separate thread
        let sim_opts_thread = sim_opts.clone();
        let sim_pars_thread = sim_pars.clone();

        let sim_thread = thread::spawn(move || {
            handle_race(
                &sim_pars_thread,
                animations,
                sim_opts_thread.timestep_size,
                Some(&tx),
                sim_opts_thread.realtime_factor,
                sim_opts_thread.max_racetime,
            )
        });

        // consume race states in the main thread
        let mut sprite_cache = sprite_sheet.map(SpriteRecolorCache::new);

        for race_state in rx.iter() {
            if let Some(sprite_cache) = sprite_cache.as_mut() {
                for rat_state in race_state.rat_states.iter().filter(|r| r.visible) {
                    if let Some(sprite_name) = &rat_state.sprite_name {
                        sprite_cache.recolor(
                            sprite_name,
                            Some(rat_state.vest_hue),
                            rat_state.fur_color.as_ref(),
                        );
                    }
                }
            }

            match &race_state.final_result {
                Some(race_result) => race_result.print_results(),
                None => debug!("{}", summarize_race_state(&race_state)),
            }
        }

        sim_thread
            .join()
            .map_err(|_| anyhow::anyhow!("Simulation thread panicked!"))??;

        if let Some(sprite_cache) = &sprite_cache {
            info!("Recolored {} sprite(s)", sprite_cache.len());
        }
    }

    Ok(())
}

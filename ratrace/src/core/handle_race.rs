use crate::core::behavior::Animations;
use crate::core::race::Race;
use crate::interfaces::render_interface::{RaceState, MAX_RENDER_UPDATE_FREQUENCY};
use crate::post::race_result::RaceResult;
use crate::pre::read_sim_pars::SimPars;
use anyhow::Context;
use flume::Sender;
use std::thread::sleep;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// handle_race creates and simulates a race on the basis of the inserted parameters, and returns
/// the results for post-processing. Without a sender the race is simulated as fast as possible;
/// with a sender it runs in (scaled) real time and pushes race states to the receiver, followed
/// by one final state carrying the result. The simulation stops early once max_racetime (ms) is
/// exceeded.
pub fn handle_race(
    sim_pars: &SimPars,
    animations: Animations,
    timestep_size: f64,
    tx: Option<&Sender<RaceState>>,
    realtime_factor: f64,
    max_racetime: f64,
) -> anyhow::Result<RaceResult> {
    let mut race = Race::new(sim_pars, animations);

    match tx {
        None => {
            let mut t_race_update_print = 0.0;

            while !race.all_finished() && race.cur_racetime < max_racetime {
                for event in race.simulate_timestep(timestep_size) {
                    debug!(?event, racetime = race.cur_racetime, "Race event");
                }
                if race.cur_racetime > t_race_update_print + 9999.9 {
                    debug!(
                        "Simulating... Current race time is {:.3}s",
                        race.cur_racetime / 1000.0
                    );
                    t_race_update_print = race.cur_racetime;
                }
            }
        }
        Some(tx) => {
            let mut t_race_update_render = f64::NEG_INFINITY;

            while !race.all_finished() && race.cur_racetime < max_racetime {
                let t_start = Instant::now();
                race.simulate_timestep(timestep_size);

                if race.cur_racetime
                    > t_race_update_render + 1000.0 / MAX_RENDER_UPDATE_FREQUENCY - 0.001
                {
                    // send current race state
                    tx.send(race.get_race_state())
                        .context("Failed to send race state to the renderer!")?;
                    t_race_update_render = race.cur_racetime;
                }

                // sleep until time step is finished in real-time as well (calculation in ms)
                let t_sleep =
                    (timestep_size / realtime_factor) as i64 - t_start.elapsed().as_millis() as i64;

                if t_sleep > 0 {
                    sleep(Duration::from_millis(t_sleep as u64));
                } else if t_sleep < 0 {
                    warn!("Could not keep up with real-time!")
                }
            }

            // after real-time loop finishes, send final state once
            let mut final_state = race.get_race_state();
            final_state.final_result = Some(race.get_race_result());
            tx.send(final_state)
                .context("Failed to send final race result to the renderer!")?;
        }
    }

    if !race.all_finished() {
        info!(
            "Race stopped after {:.3}s before all rats finished",
            race.cur_racetime / 1000.0
        );
    }

    // return race result
    Ok(race.get_race_result())
}

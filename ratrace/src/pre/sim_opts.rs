use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "ratrace",
    about = "A time-discrete rat race screensaver simulation written in Rust"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging
    #[clap(short, long)]
    pub debug: bool,

    /// Activate real-time mode - race states are streamed to the renderer while the race runs
    #[clap(long)]
    pub realtime: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set number of simulation runs (only for non-real-time mode, runs are executed in parallel)
    #[clap(short, long, default_value = "1")]
    pub no_sim_runs: u32,

    /// Set path to the simulation parameter file (OPTIONAL: defaults are used if not set)
    #[clap(short, long)]
    pub parfile_path: Option<PathBuf>,

    /// Set path to a directory containing spritesheet_meta.json, spritesheet_grey.png and
    /// spritesheet_vest_mask.png (OPTIONAL: built-in animation table is used if not set)
    #[clap(long)]
    pub sprite_dir: Option<PathBuf>,

    /// Set real-time factor (only relevant in real-time mode)
    #[clap(short, long, default_value = "1.0")]
    pub realtime_factor: f64,

    /// Set simulation timestep size in ms, should be in the range [1.0, 100.0]
    #[clap(short, long, default_value = "16.0")]
    pub timestep_size: f64,

    /// Set seed of the random number generator (overrides the seed of the parameter file)
    #[clap(short, long)]
    pub seed: Option<u64>,

    /// Set maximum simulated race time in ms after which a race is stopped
    #[clap(short, long, default_value = "3600000.0")]
    pub max_racetime: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults() {
        let opts = SimOpts::parse_from(["ratrace"]);
        assert!(!opts.debug);
        assert!(!opts.realtime);
        assert_eq!(opts.no_sim_runs, 1);
        assert!(opts.parfile_path.is_none());
        assert_relative_eq!(opts.timestep_size, 16.0);
        assert_relative_eq!(opts.realtime_factor, 1.0);
        assert!(opts.seed.is_none());
    }

    #[test]
    fn options_are_parsed() {
        let opts = SimOpts::parse_from([
            "ratrace",
            "-d",
            "--realtime",
            "-n",
            "4",
            "-p",
            "pars.json",
            "-t",
            "10",
            "-s",
            "7",
        ]);
        assert!(opts.debug);
        assert!(opts.realtime);
        assert_eq!(opts.no_sim_runs, 4);
        assert_eq!(opts.parfile_path, Some(PathBuf::from("pars.json")));
        assert_relative_eq!(opts.timestep_size, 10.0);
        assert_eq!(opts.seed, Some(7));
    }
}

use crate::core::behavior::BehaviorPars;
use crate::core::race::{RacePars, TimingPars};
use crate::core::track::TrackPars;
use anyhow::Context;
use helpers::general::InputValueError;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// * `width` - (px) Canvas width
/// * `height` - (px) Canvas height
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CanvasPars {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasPars {
    fn default() -> Self {
        CanvasPars {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

/// SimPars is used to store all other parameter structs. Every group is optional in the parameter
/// file, missing groups and fields fall back to their defaults.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct SimPars {
    pub race_pars: RacePars,
    pub canvas_pars: CanvasPars,
    pub track_pars: TrackPars,
    pub timing_pars: TimingPars,
    pub behavior_pars: BehaviorPars,
}

fn check_range(name: &str, range: [f64; 2]) -> Result<(), InputValueError> {
    if range[0] < 0.0 || range[0] > range[1] {
        return Err(InputValueError::new(format!(
            "{} must be a non-negative range [min, max] with min <= max, got {:?}",
            name, range
        )));
    }
    Ok(())
}

impl SimPars {
    /// validate checks the parameters for values the simulation cannot handle.
    pub fn validate(&self) -> Result<(), InputValueError> {
        let track = &self.track_pars;
        let canvas = &self.canvas_pars;

        if canvas.width <= 0.0 || canvas.height <= 0.0 {
            return Err(InputValueError::new("canvas size must be positive"));
        }
        if track.no_lanes == 0 {
            return Err(InputValueError::new("track must have at least one lane"));
        }
        for (name, percent) in [
            ("h_percent", track.h_percent),
            ("v_percent", track.v_percent),
            ("width_percent", track.width_percent),
        ] {
            if percent <= 0.0 || percent > 100.0 {
                return Err(InputValueError::new(format!(
                    "{} must be in (0, 100], got {}",
                    name, percent
                )));
            }
        }

        let track_w = track.h_percent / 100.0 * canvas.width;
        let track_h = track.v_percent / 100.0 * canvas.height;
        if track.corner_radius <= 0.0 || 2.0 * track.corner_radius > track_w.min(track_h) {
            return Err(InputValueError::new(format!(
                "corner_radius must be positive and fit into the track ({:.1}px x {:.1}px), got {}",
                track_w, track_h, track.corner_radius
            )));
        }

        let timing = &self.timing_pars;
        if timing.animation_fps <= 0.0 {
            return Err(InputValueError::new("animation_fps must be positive"));
        }
        if timing.speed_multiplier < 0.0 {
            return Err(InputValueError::new("speed_multiplier must not be negative"));
        }
        if timing.gate_fade_rate <= 0.0 {
            return Err(InputValueError::new("gate_fade_rate must be positive"));
        }
        if timing.laps_to_finish == 0 {
            return Err(InputValueError::new("laps_to_finish must be at least 1"));
        }

        if self.race_pars.no_rats == 0 {
            return Err(InputValueError::new("race needs at least one rat"));
        }
        if self.race_pars.start_delay_step < 0.0 {
            return Err(InputValueError::new("start_delay_step must not be negative"));
        }

        let behavior = &self.behavior_pars;
        if behavior.base_speed <= 0.0 || behavior.speed_variance < 0.0 {
            return Err(InputValueError::new(
                "base_speed must be positive and speed_variance non-negative",
            ));
        }
        check_range("sniff_duration", behavior.sniff_duration)?;
        check_range("groom_duration", behavior.groom_duration)?;
        check_range("backwards_time", behavior.backwards_time)?;
        check_range("cooldown_after_action", behavior.cooldown_after_action)?;

        Ok(())
    }
}

/// read_sim_pars reads the JSON file and decodes the JSON string into the simulation parameters
/// struct. The parameters are validated afterwards.
pub fn read_sim_pars(filepath: &Path) -> anyhow::Result<SimPars> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open parameter file {}!",
            filepath.display()
        ))?;
    let pars: SimPars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse parameter file {}!",
        filepath.display()
    ))?;
    pars.validate().context(format!(
        "Invalid parameters in parameter file {}!",
        filepath.display()
    ))?;
    Ok(pars)
}

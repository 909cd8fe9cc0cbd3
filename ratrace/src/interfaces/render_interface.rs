use crate::core::music_cue::MusicState;
use crate::core::race::GateState;
use crate::core::rat::FurColor;
use crate::core::state_handler::RatState;
use crate::post::race_result::RaceResult;
use serde::Serialize;

/// Upper bound for the rate at which race states are pushed to a renderer (Hz).
pub const MAX_RENDER_UPDATE_FREQUENCY: f64 = 30.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Everything a renderer needs to draw one rat in the current frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatRenderState {
    pub name: String,
    pub lane: u32,
    pub state: RatState,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub sprite_name: Option<String>,
    pub visible: bool,
    pub vest_hue: f64,
    pub vest_color: RgbColor,
    pub fur_color: Option<FurColor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RaceState {
    // rats in draw order (back to front)
    pub rat_states: Vec<RatRenderState>,
    pub gate_state: GateState,
    pub gate_opacity: f64,
    pub race_started: bool,
    pub music_state: MusicState,
    pub cur_racetime: f64,

    // final results payload (sent once when all rats finished)
    pub final_result: Option<RaceResult>,
}

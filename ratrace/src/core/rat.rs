use crate::core::behavior::{
    AnimKind, Animations, BehaviorOutcome, BehaviorPars, BehaviorScheduler, Direction,
};
use crate::core::color::hsl_to_rgb;
use crate::core::race::GateState;
use crate::core::state_handler::{RatState, StateHandler};
use crate::core::track::{Track, TrackSegment};
use crate::interfaces::render_interface::RatRenderState;
use helpers::general::lin_interp;
use rand::Rng;
use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, PI};

/// Saturation used for the vest in the sprites and in the vest swatch.
pub const VEST_SATURATION: f64 = 0.85;
const VEST_SWATCH_LIGHTNESS: f64 = 0.5;
/// Lower bound of the corner speed factor, outer lanes of wide tracks would stall otherwise.
const MIN_CORNER_SPEED_FACTOR: f64 = 0.2;

/// * `hue` - (deg) Fur hue
/// * `sat` - Fur saturation
/// * `light` - Multiplier applied to the grey value of the sprite to get the fur lightness
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FurColor {
    pub hue: f64,
    pub sat: f64,
    pub light: f64,
    pub name: &'static str,
}

/// * `name` - Rat name, e.g. Rat O' War
/// * `lane` - Lane index, 0 is the innermost lane
/// * `vest_hue` - (deg) Hue of the vest
/// * `fur_color` - Fur color, `None` keeps the grey sprite fur
/// * `start_delay` - (ms, scaled by the speed multiplier) Delay before the rat starts entering
#[derive(Debug, Clone)]
pub struct RatPars {
    pub name: String,
    pub lane: u32,
    pub vest_hue: f64,
    pub fur_color: Option<FurColor>,
    pub start_delay: f64,
}

/// Inputs shared by all rats during one simulation step. `dt` is the wall time step in ms,
/// positions additionally scale with `speed_multiplier`, frames advance every `frame_interval`
/// ms of scaled time.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub dt: f64,
    pub speed_multiplier: f64,
    pub frame_interval: f64,
    pub track: &'a Track,
    pub gate_state: GateState,
    pub animations: &'a Animations,
    pub behavior_pars: &'a BehaviorPars,
    pub wait_offset: f64,
    pub exit_margin: f64,
}

/// draw_speed returns a random rat speed in [base_speed, base_speed + speed_variance[.
pub fn draw_speed<R: Rng + ?Sized>(rng: &mut R, base_speed: f64, speed_variance: f64) -> f64 {
    base_speed + rng.gen::<f64>() * speed_variance
}

#[derive(Debug, Clone)]
pub struct Rat {
    name: String,
    lane: u32,
    vest_hue: f64,
    fur_color: Option<FurColor>,
    pub speed: f64,
    direction: Direction,
    current_segment: Option<TrackSegment>,
    segment_frame_idx: usize,
    idle_frame_idx: usize,
    frame_timer: f64,
    pub sh: StateHandler,
    pub behavior: BehaviorScheduler,
}

impl Rat {
    pub fn new(rat_pars: &RatPars, speed: f64, laps_to_finish: u32) -> Rat {
        Rat {
            name: rat_pars.name.to_owned(),
            lane: rat_pars.lane,
            vest_hue: rat_pars.vest_hue,
            fur_color: rat_pars.fur_color,
            speed,
            direction: Direction::Forward,
            current_segment: None,
            segment_frame_idx: 0,
            idle_frame_idx: 0,
            frame_timer: 0.0,
            sh: StateHandler::new(rat_pars.start_delay, laps_to_finish),
            behavior: BehaviorScheduler::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lane(&self) -> u32 {
        self.lane
    }

    pub fn vest_hue(&self) -> f64 {
        self.vest_hue
    }

    pub fn fur_color(&self) -> Option<FurColor> {
        self.fur_color
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> RatState {
        self.sh.get_state()
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// update advances the rat by one simulation step and returns the new state if the rat
    /// changed its state during this step.
    pub fn update<R: Rng + ?Sized>(&mut self, rng: &mut R, ctx: &TickContext) -> Option<RatState> {
        if matches!(self.sh.get_state(), RatState::Finished) {
            return None;
        }

        let scaled_dt = ctx.dt * ctx.speed_multiplier;

        if self.sh.is_delayed() {
            self.sh.count_down_start_delay(scaled_dt);
            return None;
        }

        let frame_advanced = self.advance_frame_clock(scaled_dt, ctx.frame_interval);
        if frame_advanced {
            self.segment_frame_idx += 1;
        }

        match self.sh.get_state() {
            RatState::Entering => self.update_entering(ctx),
            RatState::Waiting => self.update_waiting(ctx, frame_advanced),
            RatState::Racing => self.update_racing(rng, ctx, frame_advanced),
            RatState::Exiting => self.update_exiting(ctx),
            RatState::Finished => None,
        }
    }

    // ---------------------------------------------------------------------------------------------
    // STATE HANDLERS ------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn update_entering(&mut self, ctx: &TickContext) -> Option<RatState> {
        self.sh
            .advance_lane_x(self.get_pixel_speed(ctx.track) * ctx.dt * ctx.speed_multiplier);

        if self
            .sh
            .check_arrives_at_gate(ctx.track.get_gate_x() - ctx.wait_offset)
        {
            self.idle_frame_idx = 0;
            return Some(RatState::Waiting);
        }
        None
    }

    fn update_waiting(&mut self, ctx: &TickContext, frame_advanced: bool) -> Option<RatState> {
        self.sh.increment_wait_timer(ctx.dt);

        // idle sniffing at the gate
        if frame_advanced {
            self.idle_frame_idx += 1;
            if self.idle_frame_idx >= AnimKind::Sniff.frames(ctx.animations).len() {
                self.idle_frame_idx = 0;
            }
        }

        if matches!(ctx.gate_state, GateState::Hidden)
            && self
                .sh
                .act_racing(ctx.track.get_entry_x(), ctx.track.get_perimeter())
        {
            self.behavior.reset();
            self.current_segment = None;
            return Some(RatState::Racing);
        }
        None
    }

    fn update_racing<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        ctx: &TickContext,
        frame_advanced: bool,
    ) -> Option<RatState> {
        self.behavior.decay_timers(ctx.dt, ctx.speed_multiplier);

        let segment = ctx
            .track
            .get_position_on_track(self.sh.get_track_pos(), self.lane)
            .segment;

        if self.current_segment != Some(segment) {
            self.current_segment = Some(segment);
            self.segment_frame_idx = 0;
            self.frame_timer = 0.0;
        }

        // an active behavior suspends the movement
        if self.behavior.is_active() {
            let outcome = self.behavior.advance(
                rng,
                ctx.dt,
                frame_advanced,
                &mut self.direction,
                ctx.animations,
                ctx.behavior_pars,
            );
            if let BehaviorOutcome::Turned(direction) = outcome {
                tracing::trace!(rat = %self.name, ?direction, "Turned around");
            }
            return None;
        }

        let delta_pos = self.speed
            * ctx.dt
            * ctx.speed_multiplier
            * self.direction.sign()
            * self.get_corner_speed_factor(segment);

        if self.sh.update_race_prog(delta_pos, ctx.track.get_exit_x()) {
            return Some(RatState::Exiting);
        }

        if self
            .behavior
            .try_trigger(
                rng,
                ctx.dt,
                self.direction,
                segment,
                ctx.animations,
                ctx.behavior_pars,
            )
            .is_some()
        {
            self.frame_timer = 0.0;
        }
        None
    }

    fn update_exiting(&mut self, ctx: &TickContext) -> Option<RatState> {
        self.sh
            .advance_lane_x(self.get_pixel_speed(ctx.track) * ctx.dt * ctx.speed_multiplier);

        if self
            .sh
            .check_leaves_canvas(ctx.track.canvas_width + ctx.exit_margin)
        {
            return Some(RatState::Finished);
        }
        None
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn advance_frame_clock(&mut self, scaled_dt: f64, frame_interval: f64) -> bool {
        self.frame_timer += scaled_dt;
        if self.frame_timer >= frame_interval {
            self.frame_timer = 0.0;
            return true;
        }
        false
    }

    /// get_pixel_speed returns the speed on the straight entry/exit lane (px/ms).
    pub fn get_pixel_speed(&self, track: &Track) -> f64 {
        self.speed * track.get_perimeter()
    }

    /// get_corner_speed_factor returns the speed bonus inside corners, inner lanes get the
    /// bigger bonus. The factor never drops below MIN_CORNER_SPEED_FACTOR.
    pub fn get_corner_speed_factor(&self, segment: TrackSegment) -> f64 {
        if segment.is_corner() {
            (1.2 + (2.0 - self.lane as f64) * 0.2).max(MIN_CORNER_SPEED_FACTOR)
        } else {
            1.0
        }
    }

    /// trigger_turn makes a racing rat turn around on demand, e.g. when it was clicked.
    pub fn trigger_turn(&mut self, animations: &Animations) -> bool {
        if !matches!(self.sh.get_state(), RatState::Racing) {
            return false;
        }
        let started = self.behavior.start_turn(self.direction, animations);
        if started {
            self.frame_timer = 0.0;
        }
        started
    }

    /// get_screen_pos returns the screen coordinates of the rat, either on the entry/exit lane or
    /// on the track.
    pub fn get_screen_pos(&self, track: &Track) -> (f64, f64) {
        match self.sh.get_state() {
            RatState::Racing => {
                let pos = track.get_position_on_track(self.sh.get_track_pos(), self.lane);
                (pos.x, pos.y)
            }
            _ => (self.sh.get_lane_x(), track.get_entry_lane_y(self.lane)),
        }
    }

    /// rotation_for_segment returns the heading (rad) of the rat. Straights have fixed headings,
    /// corners interpolate a quarter turn along the corner progress.
    pub fn rotation_for_segment(&self, segment: TrackSegment, corner_progress: f64) -> f64 {
        let forward = matches!(self.direction, Direction::Forward);

        if segment.is_corner() {
            let progress = if forward {
                corner_progress
            } else {
                1.0 - corner_progress
            };

            let (start, end) = match (segment, forward) {
                (TrackSegment::CornerBr, true) => (0.0, -FRAC_PI_2),
                (TrackSegment::CornerTr, true) => (-FRAC_PI_2, -PI),
                (TrackSegment::CornerTl, true) => (PI, FRAC_PI_2),
                (TrackSegment::CornerBl, true) => (FRAC_PI_2, 0.0),
                (TrackSegment::CornerBr, false) => (FRAC_PI_2, PI),
                (TrackSegment::CornerTr, false) => (0.0, FRAC_PI_2),
                (TrackSegment::CornerTl, false) => (-FRAC_PI_2, 0.0),
                (_, false) => (PI, 3.0 * FRAC_PI_2),
                (_, true) => (0.0, 0.0),
            };
            return lin_interp(progress, &[0.0, 1.0], &[start, end]);
        }

        match (segment, forward) {
            (TrackSegment::Right, true) | (TrackSegment::Left, false) => 0.0,
            (TrackSegment::Left, true) | (TrackSegment::Right, false) => PI,
            (TrackSegment::Up, true) | (TrackSegment::Down, false) => -FRAC_PI_2,
            (TrackSegment::Down, true) | (TrackSegment::Up, false) => FRAC_PI_2,
            (_, true) => 0.0,
            (_, false) => PI,
        }
    }

    /// render_state collects the data a renderer needs for the current frame. Finished rats and
    /// rats still waiting for their start delay are invisible; a missing animation leaves the
    /// sprite name empty.
    pub fn render_state(&self, track: &Track, animations: &Animations) -> RatRenderState {
        let state = self.sh.get_state();
        let (x, y) = self.get_screen_pos(track);

        let (kind, rotation, frame_idx) = match state {
            RatState::Waiting => (AnimKind::Sniff, 0.0, self.idle_frame_idx),
            RatState::Racing => {
                let pos = track.get_position_on_track(self.sh.get_track_pos(), self.lane);
                let rotation = self.rotation_for_segment(pos.segment, pos.corner_progress);
                let active = self.behavior.get_active();

                match active.kind() {
                    Some(kind) => (kind, rotation, active.frame_idx()),
                    None => {
                        let no_frames = AnimKind::Walk.frames(animations).len();
                        let raw_idx = self.segment_frame_idx % no_frames.max(1);
                        let frame_idx = match self.direction {
                            Direction::Forward => raw_idx,
                            Direction::Backward => {
                                no_frames.saturating_sub(1).saturating_sub(raw_idx)
                            }
                        };
                        (AnimKind::Walk, rotation, frame_idx)
                    }
                }
            }
            _ => {
                let no_frames = AnimKind::Walk.frames(animations).len();
                (
                    AnimKind::Walk,
                    0.0,
                    self.segment_frame_idx % no_frames.max(1),
                )
            }
        };

        let frames = kind.frames(animations);
        let sprite_name = if frames.is_empty() {
            None
        } else {
            Some(frames[frame_idx.min(frames.len() - 1)].to_owned())
        };

        RatRenderState {
            name: self.name.to_owned(),
            lane: self.lane,
            state,
            x,
            y,
            rotation,
            sprite_name,
            visible: !matches!(state, RatState::Finished) && !self.sh.is_delayed(),
            vest_hue: self.vest_hue,
            vest_color: hsl_to_rgb(self.vest_hue, VEST_SATURATION, VEST_SWATCH_LIGHTNESS),
            fur_color: self.fur_color,
        }
    }
}

use crate::core::track::TrackSegment;
use helpers::general::rand_in_range;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Map from animation name (`walk`, `sniff`, `groom`, `turn`) to its ordered sprite names.
pub type Animations = HashMap<String, Vec<String>>;

/// Shares of the action chance at which sniffing, grooming and turning start. The slices are
/// cumulative parts of a single draw.
const SNIFF_SHARE: f64 = 0.45;
const GROOM_SHARE: f64 = 0.75;
const TURN_SHARE: f64 = 0.9;

/// All durations are given in ms, all chances per ms.
///
/// * `base_speed` - (laps/ms) Minimum rat speed
/// * `speed_variance` - (laps/ms) Range of the random speed added on top of the base speed
/// * `action_chance` - Chance to start a behavior while running forward
/// * `sniff_duration` - Range of the duration of a sniff
/// * `groom_duration` - Range of the duration of grooming
/// * `backwards_turn_chance` - Chance to turn around again while running backwards
/// * `backwards_time` - Range of the time a rat runs backwards before it may turn again
/// * `cooldown_after_action` - Range of the cooldown after sniffing or grooming
/// * `cooldown_after_turn_forward` - Cooldown after turning back into forward direction
/// * `cooldown_after_turn_backward` - Cooldown after turning into backward direction
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct BehaviorPars {
    pub base_speed: f64,
    pub speed_variance: f64,
    pub action_chance: f64,
    pub sniff_duration: [f64; 2],
    pub groom_duration: [f64; 2],
    pub backwards_turn_chance: f64,
    pub backwards_time: [f64; 2],
    pub cooldown_after_action: [f64; 2],
    pub cooldown_after_turn_forward: f64,
    pub cooldown_after_turn_backward: f64,
}

impl Default for BehaviorPars {
    fn default() -> Self {
        BehaviorPars {
            base_speed: 0.00015,
            speed_variance: 0.0001,
            action_chance: 0.004,
            sniff_duration: [1000.0, 3000.0],
            groom_duration: [1000.0, 3000.0],
            backwards_turn_chance: 0.02,
            backwards_time: [1000.0, 5000.0],
            cooldown_after_action: [500.0, 2000.0],
            cooldown_after_turn_forward: 500.0,
            cooldown_after_turn_backward: 2000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimKind {
    Walk,
    Sniff,
    Groom,
    Turn,
}

impl AnimKind {
    pub fn name(self) -> &'static str {
        match self {
            AnimKind::Walk => "walk",
            AnimKind::Sniff => "sniff",
            AnimKind::Groom => "groom",
            AnimKind::Turn => "turn",
        }
    }

    /// frames returns the sprite names of the animation, an absent animation is empty.
    pub fn frames(self, animations: &Animations) -> &[String] {
        animations
            .get(self.name())
            .map(|frames| frames.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }

    pub fn flipped(self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// The behavior animation that currently overrides the rat's locomotion. Sniffing and grooming
/// run for a wall time duration and loop their frames, turning runs its frames exactly once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActiveBehavior {
    None,
    Sniff {
        frame_idx: usize,
        elapsed: f64,
        duration: f64,
    },
    Groom {
        frame_idx: usize,
        elapsed: f64,
        duration: f64,
    },
    Turn {
        frame_idx: usize,
        start_direction: Direction,
    },
}

impl ActiveBehavior {
    pub fn kind(&self) -> Option<AnimKind> {
        match self {
            ActiveBehavior::None => None,
            ActiveBehavior::Sniff { .. } => Some(AnimKind::Sniff),
            ActiveBehavior::Groom { .. } => Some(AnimKind::Groom),
            ActiveBehavior::Turn { .. } => Some(AnimKind::Turn),
        }
    }

    pub fn frame_idx(&self) -> usize {
        match self {
            ActiveBehavior::None => 0,
            ActiveBehavior::Sniff { frame_idx, .. }
            | ActiveBehavior::Groom { frame_idx, .. }
            | ActiveBehavior::Turn { frame_idx, .. } => *frame_idx,
        }
    }
}

/// Result of advancing an active behavior by one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BehaviorOutcome {
    Continues,
    Finished(AnimKind),
    Turned(Direction),
}

/// BehaviorScheduler owns the active behavior of one rat together with the timers that gate
/// when the next behavior may start.
#[derive(Debug, Clone)]
pub struct BehaviorScheduler {
    active: ActiveBehavior,
    trigger_cooldown: f64,
    backwards_timer: f64,
}

impl Default for BehaviorScheduler {
    fn default() -> Self {
        BehaviorScheduler {
            active: ActiveBehavior::None,
            trigger_cooldown: 0.0,
            backwards_timer: 0.0,
        }
    }
}

impl BehaviorScheduler {
    pub fn get_active(&self) -> ActiveBehavior {
        self.active
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.active, ActiveBehavior::None)
    }

    pub fn get_trigger_cooldown(&self) -> f64 {
        self.trigger_cooldown
    }

    pub fn get_backwards_timer(&self) -> f64 {
        self.backwards_timer
    }

    /// reset drops the active behavior and all timers.
    pub fn reset(&mut self) {
        *self = BehaviorScheduler::default();
    }

    /// decay_timers counts down the cooldown (scaled by the speed multiplier) and the backwards
    /// run window (wall time).
    pub fn decay_timers(&mut self, dt: f64, speed_multiplier: f64) {
        if self.trigger_cooldown > 0.0 {
            self.trigger_cooldown -= dt * speed_multiplier;
        }
        if self.backwards_timer > 0.0 {
            self.backwards_timer -= dt;
        }
    }

    /// start_turn starts a turn animation if none is active and turn frames are available.
    pub fn start_turn(&mut self, direction: Direction, animations: &Animations) -> bool {
        if self.is_active() || AnimKind::Turn.frames(animations).is_empty() {
            return false;
        }
        self.active = ActiveBehavior::Turn {
            frame_idx: 0,
            start_direction: direction,
        };
        true
    }

    /// try_trigger possibly starts a new behavior. Nothing starts while a behavior is active, the
    /// cooldown is running or the rat is inside a corner. A single uniform draw decides between
    /// sniffing, grooming and turning when running forward, or turning back when running
    /// backwards after the backwards window expired.
    pub fn try_trigger<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        dt: f64,
        direction: Direction,
        segment: TrackSegment,
        animations: &Animations,
        pars: &BehaviorPars,
    ) -> Option<AnimKind> {
        if self.is_active() || segment.is_corner() || self.trigger_cooldown > 0.0 {
            return None;
        }

        let rand = rng.gen::<f64>();

        match direction {
            Direction::Backward => {
                if self.backwards_timer <= 0.0
                    && rand < pars.backwards_turn_chance * dt
                    && self.start_turn(direction, animations)
                {
                    return Some(AnimKind::Turn);
                }
                None
            }
            Direction::Forward => {
                let action_chance = pars.action_chance * dt;

                if rand < action_chance * SNIFF_SHARE {
                    if AnimKind::Sniff.frames(animations).is_empty() {
                        return None;
                    }
                    self.active = ActiveBehavior::Sniff {
                        frame_idx: 0,
                        elapsed: 0.0,
                        duration: rand_in_range(rng, pars.sniff_duration),
                    };
                    Some(AnimKind::Sniff)
                } else if rand < action_chance * GROOM_SHARE {
                    if AnimKind::Groom.frames(animations).is_empty() {
                        return None;
                    }
                    self.active = ActiveBehavior::Groom {
                        frame_idx: 0,
                        elapsed: 0.0,
                        duration: rand_in_range(rng, pars.groom_duration),
                    };
                    Some(AnimKind::Groom)
                } else if rand < action_chance * TURN_SHARE
                    && self.start_turn(direction, animations)
                {
                    Some(AnimKind::Turn)
                } else {
                    None
                }
            }
        }
    }

    /// advance moves the active behavior forward. Sniffing and grooming accumulate wall time dt;
    /// frames only move when frame_advanced is set. A finished turn flips the direction.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        dt: f64,
        frame_advanced: bool,
        direction: &mut Direction,
        animations: &Animations,
        pars: &BehaviorPars,
    ) -> BehaviorOutcome {
        let kind = match self.active.kind() {
            Some(kind) => kind,
            None => return BehaviorOutcome::Continues,
        };

        if let ActiveBehavior::Sniff { elapsed, .. } | ActiveBehavior::Groom { elapsed, .. } =
            &mut self.active
        {
            *elapsed += dt;
        }

        if !frame_advanced {
            return BehaviorOutcome::Continues;
        }

        let no_frames = kind.frames(animations).len();
        let frames_exhausted = match &mut self.active {
            ActiveBehavior::Sniff { frame_idx, .. }
            | ActiveBehavior::Groom { frame_idx, .. }
            | ActiveBehavior::Turn { frame_idx, .. } => {
                *frame_idx += 1;
                *frame_idx >= no_frames
            }
            ActiveBehavior::None => false,
        };

        if !frames_exhausted {
            return BehaviorOutcome::Continues;
        }

        match self.active {
            ActiveBehavior::Turn {
                start_direction, ..
            } => {
                // the turn ends facing away from where it started
                *direction = start_direction.flipped();
                if matches!(start_direction, Direction::Forward) {
                    self.backwards_timer = rand_in_range(rng, pars.backwards_time);
                }
                self.trigger_cooldown = match *direction {
                    Direction::Forward => pars.cooldown_after_turn_forward,
                    Direction::Backward => pars.cooldown_after_turn_backward,
                };
                self.active = ActiveBehavior::None;
                BehaviorOutcome::Turned(*direction)
            }
            ActiveBehavior::Sniff { elapsed, duration, .. }
            | ActiveBehavior::Groom { elapsed, duration, .. } => {
                if elapsed >= duration {
                    self.active = ActiveBehavior::None;
                    self.trigger_cooldown = rand_in_range(rng, pars.cooldown_after_action);
                    BehaviorOutcome::Finished(kind)
                } else {
                    // loop the frames until the duration is used up
                    if let ActiveBehavior::Sniff { frame_idx, .. }
                    | ActiveBehavior::Groom { frame_idx, .. } = &mut self.active
                    {
                        *frame_idx = 0;
                    }
                    BehaviorOutcome::Continues
                }
            }
            ActiveBehavior::None => BehaviorOutcome::Continues,
        }
    }
}

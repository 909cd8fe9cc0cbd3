use crate::core::behavior::{Animations, BehaviorPars};
use crate::core::music_cue::{MusicCue, MusicState};
use crate::core::rat::{draw_speed, FurColor, Rat, RatPars, TickContext};
use crate::core::state_handler::RatState;
use crate::core::track::{Track, TrackPars};
use crate::interfaces::render_interface::RaceState;
use crate::post::race_result::{RaceResult, RatResult};
use crate::pre::read_sim_pars::SimPars;
use helpers::general::{argsort, SortOrder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Distinct vest hues (deg) that are easy to tell apart.
pub const VEST_HUES: [f64; 9] = [0.0, 30.0, 60.0, 120.0, 180.0, 210.0, 270.0, 300.0, 330.0];

/// Fur color presets, `None` keeps the grey fur of the sprite sheet.
pub const FUR_COLORS: [Option<FurColor>; 13] = [
    None,
    Some(FurColor { hue: 0.0, sat: 0.1, light: 0.3, name: "black" }),
    Some(FurColor { hue: 0.0, sat: 0.0, light: 2.0, name: "white" }),
    Some(FurColor { hue: 40.0, sat: 0.3, light: 1.5, name: "cream" }),
    Some(FurColor { hue: 25.0, sat: 0.6, light: 0.8, name: "brown" }),
    Some(FurColor { hue: 30.0, sat: 0.4, light: 1.0, name: "tan" }),
    Some(FurColor { hue: 20.0, sat: 0.5, light: 0.6, name: "chocolate" }),
    Some(FurColor { hue: 0.0, sat: 0.0, light: 1.3, name: "light-gray" }),
    Some(FurColor { hue: 0.0, sat: 0.0, light: 0.7, name: "dark-gray" }),
    Some(FurColor { hue: 35.0, sat: 0.3, light: 1.2, name: "fawn" }),
    Some(FurColor { hue: 120.0, sat: 0.7, light: 0.9, name: "green" }),
    Some(FurColor { hue: 340.0, sat: 0.6, light: 1.3, name: "pink" }),
    Some(FurColor { hue: 280.0, sat: 0.7, light: 0.9, name: "purple" }),
];

/// The classic rat names.
pub const RAT_NAMES: [&str; 54] = [
    "Merkle's Mistake",
    "Rat O' War",
    "Crunchy In Milk",
    "Rocket Science",
    "Rats? In Berkeley?",
    "Pepe Le Fromage",
    "Ersatz Rats",
    "Nosfer-RAT-u",
    "Rodent Rambler",
    "Control Group",
    "Kentucky Blue Cheese",
    "Mister Wuggums",
    "Dime a Dozen",
    "Dog Eat Dog",
    "Mouse++",
    "Rat Came Back",
    "Better Than Cats",
    "Rat Tattooie",
    "Drag And Drop",
    "Flea Biscuit",
    "Mama's Good Gravy",
    "Feta Cheda",
    "Eeky Squeaky Heart",
    "Polysorbate-80",
    "FD&C Red #2",
    "Buttercup",
    "Son of Da Mouse",
    "Tall Tail",
    "Space Rat Spiff",
    "Big Wheel",
    "Whisper",
    "Pink Eye",
    "Habitrail Hipster",
    "Twelve Step",
    "Algernon",
    "Doug",
    "Nachismo",
    "Abort, Retry, Fail?",
    "Trurl",
    "The Nose",
    "Ten Fingered Freddy",
    "Little Elvis",
    "Works for Cheese",
    "Sampson's Pigtail",
    "E Ticket",
    "I'm With Stupid",
    "Boris Bait",
    "What, Me Scurry?",
    "Sec-Rat-ariat",
    "By A Whisker",
    "Hillary's Little Secret",
    "Flamin' Furball",
    "Dan Ratter",
    "Rat-a-tat",
];

/// (px) Maximum distance between a click and a racing rat to select it.
pub const CLICK_RADIUS: f64 = 50.0;

/// * `animation_fps` - (Hz) Frame rate of the sprite animations (in scaled time)
/// * `speed_multiplier` - Global factor applied to movement, cooldowns and the gate fade
/// * `gate_wait_time` - (ms) Time all rats must have waited at the gate before it opens
/// * `gate_fade_rate` - (1/ms) Gate opacity decrease per scaled ms
/// * `wait_offset` - (px) Distance in front of the gate at which the rats stop
/// * `exit_margin` - (px) Distance behind the right canvas border at which a rat is finished
/// * `laps_to_finish` - Number of laps every rat has to complete
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TimingPars {
    pub animation_fps: f64,
    pub speed_multiplier: f64,
    pub gate_wait_time: f64,
    pub gate_fade_rate: f64,
    pub wait_offset: f64,
    pub exit_margin: f64,
    pub laps_to_finish: u32,
}

impl Default for TimingPars {
    fn default() -> Self {
        TimingPars {
            animation_fps: 60.0,
            speed_multiplier: 0.125,
            gate_wait_time: 3000.0,
            gate_fade_rate: 0.002,
            wait_offset: 30.0,
            exit_margin: 100.0,
            laps_to_finish: 1,
        }
    }
}

/// * `no_rats` - Number of rats at the start
/// * `start_delay_step` - (ms, scaled) Start delay added per rat, i.e. rat i waits i * step
/// * `seed` - Seed of the random number generator, a random seed is used if not set
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RacePars {
    pub no_rats: u32,
    pub start_delay_step: f64,
    pub seed: Option<u64>,
}

impl Default for RacePars {
    fn default() -> Self {
        RacePars {
            no_rats: 3,
            start_delay_step: 500.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Visible,
    Fading,
    Hidden,
}

impl Default for GateState {
    fn default() -> Self {
        GateState::Visible
    }
}

/// Race level events raised during a simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RaceEvent {
    RaceStarted,
    GatesHidden,
    AllFinished,
}

#[derive(Debug, Clone)]
struct FinishEntry {
    name: String,
    lane: u32,
    racetime: f64,
}

#[derive(Debug)]
pub struct Race {
    pub cur_racetime: f64,
    pub track: Track,
    pub timing_pars: TimingPars,
    pub behavior_pars: BehaviorPars,
    pub rats_list: Vec<Rat>,
    track_pars: TrackPars,
    animations: Animations,
    gate_state: GateState,
    gate_opacity: f64,
    race_started: bool,
    all_finished_reported: bool,
    used_names: Vec<&'static str>,
    used_vest_hues: Vec<usize>,
    finish_log: Vec<FinishEntry>,
    music_cue: MusicCue,
    rng: StdRng,
}

impl Race {
    pub fn new(sim_pars: &SimPars, animations: Animations) -> Race {
        let rng = match sim_pars.race_pars.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut race = Race {
            cur_racetime: 0.0,
            track: Track::new(
                &sim_pars.track_pars,
                sim_pars.canvas_pars.width,
                sim_pars.canvas_pars.height,
            ),
            timing_pars: sim_pars.timing_pars.to_owned(),
            behavior_pars: sim_pars.behavior_pars.to_owned(),
            rats_list: Vec::with_capacity(sim_pars.race_pars.no_rats as usize),
            track_pars: sim_pars.track_pars.to_owned(),
            animations,
            gate_state: GateState::Visible,
            gate_opacity: 1.0,
            race_started: false,
            all_finished_reported: false,
            used_names: Vec::with_capacity(RAT_NAMES.len()),
            used_vest_hues: Vec::with_capacity(VEST_HUES.len()),
            finish_log: Vec::new(),
            music_cue: MusicCue::default(),
            rng,
        };

        // create rats with staggered start delays
        for i in 0..sim_pars.race_pars.no_rats {
            let lane = i % race.track.no_lanes.max(1);
            let rat = race.create_rat(lane, i as f64 * sim_pars.race_pars.start_delay_step);
            race.rats_list.push(rat);
        }

        race
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// simulate_timestep advances the race by dt ms of wall time and returns the race events that
    /// occurred in this step.
    pub fn simulate_timestep(&mut self, dt: f64) -> Vec<RaceEvent> {
        let mut events = Vec::new();

        // increment discretization variable
        self.cur_racetime += dt;

        // update gate fade
        if self.update_gate(dt) {
            events.push(RaceEvent::GatesHidden);
        }

        // check if all rats finished
        if self.all_finished() && self.race_started {
            if !self.all_finished_reported {
                info!(racetime = self.cur_racetime, "All rats finished");
                self.all_finished_reported = true;
                self.music_cue.on_all_finished();
                events.push(RaceEvent::AllFinished);
            }
        } else {
            self.all_finished_reported = false;
        }

        // check if all rats gathered at the gate
        if self.check_race_start() {
            events.push(RaceEvent::RaceStarted);
        }

        // update rats
        let ctx = TickContext {
            dt,
            speed_multiplier: self.timing_pars.speed_multiplier,
            frame_interval: 1000.0 / self.timing_pars.animation_fps,
            track: &self.track,
            gate_state: self.gate_state,
            animations: &self.animations,
            behavior_pars: &self.behavior_pars,
            wait_offset: self.timing_pars.wait_offset,
            exit_margin: self.timing_pars.exit_margin,
        };

        for rat in self.rats_list.iter_mut() {
            if let Some(new_state) = rat.update(&mut self.rng, &ctx) {
                debug!(
                    rat = rat.name(),
                    state = ?new_state,
                    racetime = self.cur_racetime,
                    "Rat changed state"
                );

                if new_state == RatState::Finished {
                    self.finish_log.push(FinishEntry {
                        name: rat.name().to_owned(),
                        lane: rat.lane(),
                        racetime: self.cur_racetime,
                    });
                }
            }
        }

        events
    }

    // ---------------------------------------------------------------------------------------------
    // GATE ----------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// update_gate lets the gate fade and returns true in the step in which it became hidden.
    fn update_gate(&mut self, dt: f64) -> bool {
        if !matches!(self.gate_state, GateState::Fading) {
            return false;
        }

        self.gate_opacity -= dt * self.timing_pars.speed_multiplier * self.timing_pars.gate_fade_rate;

        if self.gate_opacity <= 0.0 {
            self.gate_opacity = 0.0;
            self.gate_state = GateState::Hidden;
            self.music_cue.on_gates_hidden();
            info!(racetime = self.cur_racetime, "Gates hidden");
            return true;
        }
        false
    }

    /// check_race_start starts the gate fade once no rat is entering anymore, at least one rat is
    /// waiting and every waiting rat waited at least the gate wait time. Returns true if the race
    /// was started in this call.
    pub fn check_race_start(&mut self) -> bool {
        if self.race_started {
            return false;
        }

        let all_gathered = self
            .rats_list
            .iter()
            .all(|rat| !matches!(rat.state(), RatState::Entering));

        let min_wait = self
            .rats_list
            .iter()
            .filter(|rat| matches!(rat.state(), RatState::Waiting))
            .map(|rat| rat.sh.get_wait_timer())
            .fold(f64::INFINITY, f64::min);

        // min_wait stays infinite without waiting rats
        if !all_gathered || !min_wait.is_finite() || min_wait < self.timing_pars.gate_wait_time {
            return false;
        }

        self.race_started = true;
        self.gate_state = GateState::Fading;
        info!(racetime = self.cur_racetime, "Race started");
        true
    }

    pub fn get_gate_state(&self) -> GateState {
        self.gate_state
    }

    pub fn get_gate_opacity(&self) -> f64 {
        self.gate_opacity
    }

    pub fn is_race_started(&self) -> bool {
        self.race_started
    }

    pub fn gates_hidden(&self) -> bool {
        matches!(self.gate_state, GateState::Hidden)
    }

    /// all_finished returns true if every rat in the roster finished.
    pub fn all_finished(&self) -> bool {
        self.rats_list
            .iter()
            .all(|rat| matches!(rat.state(), RatState::Finished))
    }

    // ---------------------------------------------------------------------------------------------
    // ROSTER --------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn create_rat(&mut self, lane: u32, start_delay: f64) -> Rat {
        let vest_hue = self.draw_vest_hue();
        let fur_color = FUR_COLORS[self.rng.gen_range(0..FUR_COLORS.len())];
        let name = self.draw_name();
        let speed = draw_speed(
            &mut self.rng,
            self.behavior_pars.base_speed,
            self.behavior_pars.speed_variance,
        );

        Rat::new(
            &RatPars {
                name: name.to_owned(),
                lane,
                vest_hue,
                fur_color,
                start_delay,
            },
            speed,
            self.timing_pars.laps_to_finish,
        )
    }

    /// draw_name draws a name without replacement, all names become available again once every
    /// name was used.
    fn draw_name(&mut self) -> &'static str {
        if self.used_names.len() >= RAT_NAMES.len() {
            self.used_names.clear();
        }

        let available: Vec<&'static str> = RAT_NAMES
            .iter()
            .copied()
            .filter(|name| !self.used_names.contains(name))
            .collect();
        let name = available[self.rng.gen_range(0..available.len())];
        self.used_names.push(name);
        name
    }

    /// draw_vest_hue draws a vest hue without replacement, the palette is reset once exhausted.
    fn draw_vest_hue(&mut self) -> f64 {
        let available: Vec<usize> = (0..VEST_HUES.len())
            .filter(|idx| !self.used_vest_hues.contains(idx))
            .collect();

        let idx = if available.is_empty() {
            self.used_vest_hues.clear();
            self.rng.gen_range(0..VEST_HUES.len())
        } else {
            available[self.rng.gen_range(0..available.len())]
        };

        self.used_vest_hues.push(idx);
        VEST_HUES[idx]
    }

    /// add_rat appends a rat without start delay to the roster.
    pub fn add_rat(&mut self) {
        let lane = self.rats_list.len() as u32 % self.track.no_lanes.max(1);
        let rat = self.create_rat(lane, 0.0);
        info!(rat = rat.name(), lane, "Rat added");
        self.rats_list.push(rat);
    }

    /// remove_rat removes the most recently added rat as long as more than one rat remains. Its
    /// name becomes available again, its vest hue does not.
    pub fn remove_rat(&mut self) -> Option<String> {
        if self.rats_list.len() <= 1 {
            return None;
        }
        let removed = self.rats_list.pop()?;

        self.used_names.retain(|name| *name != removed.name());
        self.finish_log.retain(|entry| entry.name != removed.name());
        info!(rat = removed.name(), "Rat removed");
        Some(removed.name().to_owned())
    }

    /// set_base_speed draws new speeds for all rats in [base_speed, 1.5 * base_speed[.
    pub fn set_base_speed(&mut self, base_speed: f64) {
        for rat in self.rats_list.iter_mut() {
            rat.speed = draw_speed(&mut self.rng, base_speed, base_speed * 0.5);
        }
    }

    pub fn set_speed_multiplier(&mut self, speed_multiplier: f64) {
        if speed_multiplier >= 0.0 {
            self.timing_pars.speed_multiplier = speed_multiplier;
        }
    }

    pub fn set_animation_fps(&mut self, animation_fps: f64) {
        if animation_fps > 0.0 {
            self.timing_pars.animation_fps = animation_fps;
        }
    }

    /// resize recomputes the track geometry for a new canvas size.
    pub fn resize(&mut self, canvas_width: f64, canvas_height: f64) {
        self.track = Track::new(&self.track_pars, canvas_width, canvas_height);
    }

    pub fn get_animations(&self) -> &Animations {
        &self.animations
    }

    // ---------------------------------------------------------------------------------------------
    // INTERACTION ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// rat_at_position returns the index of the racing rat closest to the given screen position
    /// if it lies within the click radius.
    pub fn rat_at_position(&self, x: f64, y: f64) -> Option<usize> {
        let mut closest: Option<(usize, f64)> = None;

        for (idx, rat) in self.rats_list.iter().enumerate() {
            if !matches!(rat.state(), RatState::Racing) {
                continue;
            }
            let (rat_x, rat_y) = rat.get_screen_pos(&self.track);
            let dist = (x - rat_x).hypot(y - rat_y);

            if dist < CLICK_RADIUS && closest.map_or(true, |(_, closest_dist)| dist < closest_dist)
            {
                closest = Some((idx, dist));
            }
        }
        closest.map(|(idx, _)| idx)
    }

    /// trigger_turn makes the rat at the given roster index turn around.
    pub fn trigger_turn(&mut self, idx: usize) -> bool {
        match self.rats_list.get_mut(idx) {
            Some(rat) => rat.trigger_turn(&self.animations),
            None => false,
        }
    }

    pub fn toggle_music(&mut self) -> bool {
        let all_finished = self.all_finished();
        self.music_cue.toggle(self.race_started, all_finished)
    }

    pub fn on_music_clip_ended(&mut self) {
        self.music_cue.on_clip_ended()
    }

    pub fn get_music_state(&self) -> MusicState {
        self.music_cue.get_state()
    }

    // ---------------------------------------------------------------------------------------------
    // OUTPUT --------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// draw_order returns the roster indices sorted from back to front, i.e. by ascending screen
    /// y-coordinate.
    pub fn draw_order(&self) -> Vec<usize> {
        let screen_ys: Vec<f64> = self
            .rats_list
            .iter()
            .map(|rat| rat.get_screen_pos(&self.track).1)
            .collect();
        argsort(&screen_ys, SortOrder::Ascending)
    }

    /// get_race_state collects the render data of the current step.
    pub fn get_race_state(&self) -> RaceState {
        RaceState {
            rat_states: self
                .draw_order()
                .into_iter()
                .map(|idx| self.rats_list[idx].render_state(&self.track, &self.animations))
                .collect(),
            gate_state: self.gate_state,
            gate_opacity: self.gate_opacity,
            race_started: self.race_started,
            music_state: self.music_cue.get_state(),
            cur_racetime: self.cur_racetime,
            final_result: None,
        }
    }

    /// get_race_result returns the finish order so far together with the rats that did not
    /// finish yet.
    pub fn get_race_result(&self) -> RaceResult {
        let rat_results = self
            .finish_log
            .iter()
            .enumerate()
            .map(|(idx, entry)| RatResult {
                position: idx as u32 + 1,
                name: entry.name.to_owned(),
                lane: entry.lane,
                racetime: entry.racetime,
            })
            .collect();

        let unfinished = self
            .rats_list
            .iter()
            .filter(|rat| !matches!(rat.state(), RatState::Finished))
            .map(|rat| rat.name().to_owned())
            .collect();

        RaceResult {
            laps_to_finish: self.timing_pars.laps_to_finish,
            tot_racetime: self.cur_racetime,
            rat_results,
            unfinished,
        }
    }
}

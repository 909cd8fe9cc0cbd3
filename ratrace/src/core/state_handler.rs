use serde::Serialize;

/// Off-track lane position of a rat before it has entered the canvas.
pub const LANE_X_START: f64 = -100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RatState {
    Entering,
    Waiting,
    Racing,
    Exiting,
    Finished,
}

/// StateHandler tracks the lifecycle state of a rat and its progress, either along the straight
/// entry/exit lane (`lane_x`) or around the track (`track_pos`). Every transition is guarded by
/// the current state, calls in the wrong state are ignored.
#[derive(Debug, Clone)]
pub struct StateHandler {
    state: RatState,
    start_delay: f64,
    laps_to_finish: u32,

    // progress variables
    lane_x: f64,
    track_pos_cur: f64,
    wait_timer: f64,

    // race progress variables (signed, running backwards over the line takes a lap away)
    compl_lap_prev: i32,
    compl_lap_cur: i32,
}

impl StateHandler {
    pub fn new(start_delay: f64, laps_to_finish: u32) -> StateHandler {
        StateHandler {
            state: RatState::Entering,
            start_delay: start_delay.max(0.0),
            laps_to_finish: laps_to_finish.max(1),
            lane_x: LANE_X_START,
            track_pos_cur: 0.0,
            wait_timer: 0.0,
            compl_lap_prev: 0,
            compl_lap_cur: 0,
        }
    }

    pub fn get_state(&self) -> RatState {
        self.state
    }

    /// is_delayed returns true while the start delay has not run out yet.
    pub fn is_delayed(&self) -> bool {
        self.start_delay > 0.0
    }

    pub fn get_start_delay(&self) -> f64 {
        self.start_delay
    }

    /// count_down_start_delay decrements the remaining start delay.
    pub fn count_down_start_delay(&mut self, delta: f64) {
        self.start_delay -= delta;
    }

    pub fn get_lane_x(&self) -> f64 {
        self.lane_x
    }

    /// get_track_pos returns the current lap fraction in [0.0, 1.0[.
    pub fn get_track_pos(&self) -> f64 {
        self.track_pos_cur
    }

    pub fn get_wait_timer(&self) -> f64 {
        self.wait_timer
    }

    pub fn get_compl_lap(&self) -> i32 {
        self.compl_lap_cur
    }

    /// get_new_lap returns true if a lap was completed in the last progress update.
    pub fn get_new_lap(&self) -> bool {
        self.compl_lap_cur > self.compl_lap_prev
    }

    /// advance_lane_x moves the rat along the straight entry/exit lane while entering or
    /// exiting.
    pub fn advance_lane_x(&mut self, delta_x: f64) {
        if matches!(self.state, RatState::Entering | RatState::Exiting) {
            self.lane_x += delta_x;
        }
    }

    /// check_arrives_at_gate switches from entering to waiting as soon as the rat reaches the
    /// stop position in front of the gate.
    pub fn check_arrives_at_gate(&mut self, stop_x: f64) -> bool {
        if !matches!(self.state, RatState::Entering) || self.lane_x < stop_x {
            return false;
        }

        self.state = RatState::Waiting;
        self.lane_x = stop_x;
        self.wait_timer = 0.0;
        true
    }

    pub fn increment_wait_timer(&mut self, dt: f64) {
        if matches!(self.state, RatState::Waiting) {
            self.wait_timer += dt;
        }
    }

    /// act_racing starts the race. The track position is derived from the distance already
    /// covered behind the entry x-coordinate.
    pub fn act_racing(&mut self, entry_x: f64, perimeter: f64) -> bool {
        if !matches!(self.state, RatState::Waiting) {
            return false;
        }

        let track_pos = if perimeter > 0.0 {
            ((self.lane_x - entry_x) / perimeter).clamp(0.0, 1.0 - f64::EPSILON)
        } else {
            0.0
        };

        self.state = RatState::Racing;
        self.track_pos_cur = track_pos;
        self.compl_lap_prev = 0;
        self.compl_lap_cur = 0;
        true
    }

    /// update_race_prog moves the rat by delta_pos lap fractions. Crossing 1.0 completes a lap;
    /// once the required laps are completed the rat starts exiting at exit_x, otherwise the
    /// position wraps. Running backwards over the start line wraps as well and takes the lap
    /// away again. Returns true if the rat started exiting.
    pub fn update_race_prog(&mut self, delta_pos: f64, exit_x: f64) -> bool {
        if !matches!(self.state, RatState::Racing) {
            return false;
        }

        // update previous state
        self.compl_lap_prev = self.compl_lap_cur;

        // update current state
        self.track_pos_cur += delta_pos;

        // the previous position is always inside [0, 1[, so reaching 1.0 means the line was
        // crossed moving forward (normally coming from above 0.9)
        if self.track_pos_cur >= 1.0 {
            self.compl_lap_cur += 1;

            if self.compl_lap_cur >= self.laps_to_finish as i32 {
                self.state = RatState::Exiting;
                self.lane_x = exit_x;
                return true;
            }
            self.track_pos_cur -= self.track_pos_cur.floor();
        } else if self.track_pos_cur < 0.0 {
            self.compl_lap_cur -= 1;
            self.track_pos_cur += 1.0;
            if self.track_pos_cur < 0.0 {
                self.track_pos_cur -= self.track_pos_cur.floor();
            }
        }
        false
    }

    /// check_leaves_canvas finishes the rat once it has left the visible area while exiting.
    pub fn check_leaves_canvas(&mut self, finish_x: f64) -> bool {
        if !matches!(self.state, RatState::Exiting) || self.lane_x < finish_x {
            return false;
        }
        self.state = RatState::Finished;
        true
    }

    /// set_track_pos places a racing rat at a lap fraction in [0.0, 1.0[.
    #[cfg(test)]
    pub fn set_track_pos(&mut self, track_pos: f64) {
        if matches!(self.state, RatState::Racing) && (0.0..1.0).contains(&track_pos) {
            self.track_pos_cur = track_pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn racing_handler(laps_to_finish: u32, track_pos: f64) -> StateHandler {
        let mut sh = StateHandler::new(0.0, laps_to_finish);
        sh.advance_lane_x(500.0);
        assert!(sh.check_arrives_at_gate(320.0));
        assert!(sh.act_racing(230.0, 1000.0));
        sh.set_track_pos(track_pos);
        sh
    }

    #[test]
    fn entering_stops_at_the_gate() {
        let mut sh = StateHandler::new(0.0, 1);
        sh.advance_lane_x(200.0);
        assert!(!sh.check_arrives_at_gate(320.0));
        sh.advance_lane_x(500.0);
        assert!(sh.check_arrives_at_gate(320.0));
        assert_eq!(sh.get_state(), RatState::Waiting);
        assert_relative_eq!(sh.get_lane_x(), 320.0);
        assert_relative_eq!(sh.get_wait_timer(), 0.0);
    }

    #[test]
    fn racing_starts_from_lane_position() {
        let sh = racing_handler(1, 0.09);
        assert_eq!(sh.get_state(), RatState::Racing);
        assert_relative_eq!(sh.get_track_pos(), 0.09);
        assert_eq!(sh.get_compl_lap(), 0);

        let mut early = StateHandler::new(0.0, 1);
        early.advance_lane_x(150.0);
        assert!(early.check_arrives_at_gate(0.0));
        assert!(early.act_racing(230.0, 1000.0));
        assert_relative_eq!(early.get_track_pos(), 0.0);
    }

    #[test]
    fn lap_wraps_below_the_required_lap_count() {
        let mut sh = racing_handler(2, 0.95);
        assert!(!sh.update_race_prog(0.08, 770.0));
        assert_relative_eq!(sh.get_track_pos(), 0.03, epsilon = 1e-12);
        assert_eq!(sh.get_compl_lap(), 1);
        assert!(sh.get_new_lap());
        assert_eq!(sh.get_state(), RatState::Racing);
    }

    #[test]
    fn completing_the_last_lap_starts_exiting() {
        let mut sh = racing_handler(1, 0.95);
        assert!(sh.update_race_prog(0.08, 770.0));
        assert_eq!(sh.get_state(), RatState::Exiting);
        assert_relative_eq!(sh.get_lane_x(), 770.0);
        assert!(!sh.check_leaves_canvas(1100.0));
        sh.advance_lane_x(400.0);
        assert!(sh.check_leaves_canvas(1100.0));
        assert_eq!(sh.get_state(), RatState::Finished);
    }

    #[test]
    fn running_backwards_over_the_line_takes_the_lap_away() {
        let mut sh = racing_handler(1, 0.02);
        sh.update_race_prog(-0.05, 770.0);
        assert_eq!(sh.get_compl_lap(), -1);
        assert_relative_eq!(sh.get_track_pos(), 0.97, epsilon = 1e-12);

        // crossing forward again only restores the lap
        sh.update_race_prog(0.05, 770.0);
        assert_eq!(sh.get_compl_lap(), 0);
        assert_eq!(sh.get_state(), RatState::Racing);
        assert_relative_eq!(sh.get_track_pos(), 0.02, epsilon = 1e-12);
    }

    #[test]
    fn transitions_in_wrong_state_are_ignored() {
        let mut sh = StateHandler::new(0.0, 1);
        assert!(!sh.act_racing(0.0, 1000.0));
        assert!(!sh.update_race_prog(0.5, 0.0));
        assert!(!sh.check_leaves_canvas(-1000.0));
        sh.increment_wait_timer(100.0);
        assert_relative_eq!(sh.get_wait_timer(), 0.0);
        assert_eq!(sh.get_state(), RatState::Entering);
    }

    #[test]
    fn finished_is_terminal() {
        let mut sh = racing_handler(1, 0.95);
        sh.update_race_prog(0.1, 770.0);
        sh.advance_lane_x(1000.0);
        assert!(sh.check_leaves_canvas(1100.0));
        assert!(!sh.check_arrives_at_gate(0.0));
        assert!(!sh.act_racing(0.0, 1000.0));
        sh.advance_lane_x(-5000.0);
        assert_eq!(sh.get_state(), RatState::Finished);
    }
}

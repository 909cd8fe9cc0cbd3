use serde::Serialize;

/// Sequencing state of the race music: an intro while the rats gather at the gate, a loop while
/// they race and an ending once all of them finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicState {
    None,
    Intro,
    Loop,
    End,
    Finished,
}

impl Default for MusicState {
    fn default() -> Self {
        MusicState::None
    }
}

/// MusicCue tracks which music clip should be playing. It does not play anything itself, an
/// audio backend follows `get_state()` and reports finished clips via `on_clip_ended()`.
#[derive(Debug, Clone, Default)]
pub struct MusicCue {
    enabled: bool,
    state: MusicState,
}

impl MusicCue {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get_state(&self) -> MusicState {
        self.state
    }

    /// toggle switches the music on or off and returns the new enabled flag. Switching on picks
    /// the clip matching the current race phase.
    pub fn toggle(&mut self, race_started: bool, all_finished: bool) -> bool {
        self.enabled = !self.enabled;

        self.state = if !self.enabled {
            MusicState::None
        } else if all_finished {
            MusicState::Finished
        } else if race_started {
            MusicState::Loop
        } else {
            MusicState::Intro
        };
        self.enabled
    }

    pub fn on_gates_hidden(&mut self) {
        if self.enabled && self.state == MusicState::Intro {
            self.state = MusicState::Loop;
        }
    }

    pub fn on_all_finished(&mut self) {
        if self.enabled && self.state == MusicState::Loop {
            self.state = MusicState::End;
        }
    }

    /// on_clip_ended advances after a non-looping clip played to its end. The loop clip repeats
    /// and therefore never ends on its own.
    pub fn on_clip_ended(&mut self) {
        self.state = match self.state {
            MusicState::Intro if self.enabled => MusicState::Loop,
            MusicState::End => MusicState::Finished,
            state => state,
        };
    }
}

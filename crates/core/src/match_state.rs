//! Match bookkeeping owned by the outer play loop.

/// How a single game ended for the local side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Won,
    Lost,
    /// The local player asked to quit the process.
    Quit,
}

/// Pause requests from each side. The game is paused if either is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PauseState {
    pub local: bool,
    pub remote: bool,
}

impl PauseState {
    pub fn effective(&self) -> bool {
        self.local || self.remote
    }
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Negotiating,
    Playing,
    PausedLocal,
    PausedRemote,
    PausedBoth,
    Over,
}

impl SessionState {
    /// The in-game state implied by the pause flags.
    pub fn from_pause(pause: PauseState) -> Self {
        match (pause.local, pause.remote) {
            (false, false) => SessionState::Playing,
            (true, false) => SessionState::PausedLocal,
            (false, true) => SessionState::PausedRemote,
            (true, true) => SessionState::PausedBoth,
        }
    }
}

/// Won/lost and line counters for both players.
///
/// Lives for the whole process; only the per-game line counters are reset
/// when a new game starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchState {
    pub won: u32,
    pub lost: u32,
    pub my_lines: u32,
    pub my_total_lines: u32,
    pub opponent_lines: u32,
    pub opponent_total_lines: u32,
}

impl MatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_game(&mut self) {
        self.my_lines = 0;
        self.opponent_lines = 0;
    }

    pub fn add_my_lines(&mut self, lines: u32) {
        self.my_lines += lines;
        self.my_total_lines += lines;
    }

    pub fn add_opponent_lines(&mut self, lines: u32) {
        self.opponent_lines += lines;
        self.opponent_total_lines += lines;
    }

    /// Count a finished game. Quitting is neither a win nor a loss.
    pub fn record(&mut self, outcome: GameOutcome) {
        match outcome {
            GameOutcome::Won => self.won += 1,
            GameOutcome::Lost => self.lost += 1,
            GameOutcome::Quit => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_survive_new_game() {
        let mut m = MatchState::new();
        m.add_my_lines(3);
        m.add_opponent_lines(2);
        m.record(GameOutcome::Won);
        m.start_game();
        assert_eq!(m.my_lines, 0);
        assert_eq!(m.my_total_lines, 3);
        assert_eq!(m.opponent_total_lines, 2);
        assert_eq!(m.won, 1);
    }

    #[test]
    fn pause_is_either_side() {
        let p = PauseState {
            local: false,
            remote: true,
        };
        assert!(p.effective());
        assert_eq!(SessionState::from_pause(p), SessionState::PausedRemote);
        assert!(!PauseState::default().effective());
    }
}

//! One-second session countdown

use super::round::end_session;
use super::state::{GameEvent, GameState, SessionToken};

/// Interval between clock ticks in seconds
pub const CLOCK_PERIOD_SECS: f32 = 1.0;

/// Count down one second; ends the session when time runs out
///
/// Returns false (and changes nothing) if `token` is not the running session.
pub fn clock_tick(state: &mut GameState, token: SessionToken) -> bool {
    if !state.is_current_session(token) {
        log::debug!("Stale clock tick for session {} dropped", token.session);
        return false;
    }

    state.remaining_secs = state.remaining_secs.saturating_sub(1);
    state.emit(GameEvent::ClockTicked {
        remaining_secs: state.remaining_secs,
    });

    if state.remaining_secs == 0 {
        end_session(state);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::round::start_session;
    use crate::sim::state::Arena;

    #[test]
    fn test_counts_down_and_ends() {
        let settings = Settings {
            session_secs: 3,
            ..Default::default()
        };
        let mut state = GameState::new(5, settings);
        start_session(&mut state, Arena::default());
        let token = state.session_token();

        assert!(clock_tick(&mut state, token));
        assert!(clock_tick(&mut state, token));
        assert_eq!(state.remaining_secs, 1);
        assert!(state.active);

        assert!(clock_tick(&mut state, token));
        assert_eq!(state.remaining_secs, 0);
        assert!(!state.active);

        // Disarmed: further ticks change nothing
        assert!(!clock_tick(&mut state, token));
        assert_eq!(state.remaining_secs, 0);
    }

    #[test]
    fn test_old_session_token_ignored() {
        let mut state = GameState::new(5, Settings::default());
        start_session(&mut state, Arena::default());
        let old = state.session_token();
        start_session(&mut state, Arena::default());

        assert!(!clock_tick(&mut state, old));
        assert_eq!(state.remaining_secs, 60);
    }
}

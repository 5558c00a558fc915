//! Presentation contract
//!
//! The simulation never draws. Drivers drain `GameEvent`s after each core
//! call and hand them to `present`, which turns them into `Presenter` calls.
//! The presenter mirrors state; it never owns any.

use glam::Vec2;

use crate::sim::{Crab, CrabId, GameEvent, GameState, RoundFeedback, Scoreboard, SessionSummary};

/// Anything that can show a game: the DOM, a log, a test recorder
pub trait Presenter {
    /// Replace every displayed crab with this round's set
    fn render_crabs(&mut self, crabs: &[Crab]);

    /// Per-frame position/scale sync for one crab
    fn update_crab_transform(&mut self, id: CrabId, pos: Vec2, scale: f32);

    /// Win/lose styling; on a miss the true target is highlighted as well
    fn show_feedback(&mut self, feedback: &RoundFeedback);

    fn update_scoreboard(&mut self, board: &Scoreboard);

    /// Remove crabs and show the final result
    fn session_ended(&mut self, summary: &SessionSummary);
}

/// Route drained events to the presenter
///
/// The scoreboard is refreshed once after the batch since every event
/// implies a state change.
pub fn present<P: Presenter + ?Sized>(presenter: &mut P, state: &GameState, events: &[GameEvent]) {
    if events.is_empty() {
        return;
    }
    for event in events {
        match event {
            GameEvent::RoundStarted { round } => {
                // Only the latest round is on screen
                if state.round.as_ref().is_some_and(|r| r.number == *round) {
                    presenter.render_crabs(state.crabs());
                }
            }
            GameEvent::ClickResolved { feedback, .. } => presenter.show_feedback(feedback),
            GameEvent::SessionEnded(summary) => presenter.session_ended(summary),
            GameEvent::SessionStarted(_) | GameEvent::ClockTicked { .. } => {}
        }
    }
    presenter.update_scoreboard(&state.scoreboard());
}

/// Push every crab's current transform to the presenter
pub fn sync_transforms<P: Presenter + ?Sized>(presenter: &mut P, state: &GameState) {
    for crab in state.crabs() {
        presenter.update_crab_transform(crab.id, crab.pos, crab.scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::{Arena, resolve_click, start_session};

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Presenter for Recorder {
        fn render_crabs(&mut self, crabs: &[Crab]) {
            self.calls.push(format!("render {}", crabs.len()));
        }
        fn update_crab_transform(&mut self, id: CrabId, _pos: Vec2, _scale: f32) {
            self.calls.push(format!("move {}", id));
        }
        fn show_feedback(&mut self, feedback: &RoundFeedback) {
            self.calls.push(format!("feedback {}", feedback.correct));
        }
        fn update_scoreboard(&mut self, board: &Scoreboard) {
            self.calls.push(format!("score {}", board.score));
        }
        fn session_ended(&mut self, summary: &SessionSummary) {
            self.calls.push(format!("ended {}", summary.score));
        }
    }

    #[test]
    fn test_start_renders_round() {
        let mut state = GameState::new(2, Settings::default());
        let mut recorder = Recorder::default();
        start_session(&mut state, Arena::default());
        let events = state.drain_events();
        present(&mut recorder, &state, &events);
        assert_eq!(recorder.calls, vec!["render 4", "score 0"]);
    }

    #[test]
    fn test_click_shows_feedback() {
        let mut state = GameState::new(2, Settings::default());
        let mut recorder = Recorder::default();
        start_session(&mut state, Arena::default());
        state.drain_events();

        let target = state
            .round
            .as_ref()
            .and_then(|r| r.target())
            .map(|c| c.id)
            .expect("target");
        resolve_click(&mut state, target);
        let events = state.drain_events();
        present(&mut recorder, &state, &events);
        assert_eq!(recorder.calls, vec!["feedback true", "score 1"]);
    }

    #[test]
    fn test_sync_transforms_covers_every_crab() {
        let mut state = GameState::new(2, Settings::default());
        let mut recorder = Recorder::default();
        start_session(&mut state, Arena::default());
        sync_transforms(&mut recorder, &state);
        assert_eq!(recorder.calls.len(), 4);
        assert!(recorder.calls.iter().all(|c| c.starts_with("move ")));
    }

    #[test]
    fn test_no_events_no_calls() {
        let state = GameState::new(2, Settings::default());
        let mut recorder = Recorder::default();
        present(&mut recorder, &state, &[]);
        assert!(recorder.calls.is_empty());
    }
}

//! Headless timeline driving frames, the clock and settle continuations
//!
//! The browser front end uses real `requestAnimationFrame`, `setInterval`
//! and `setTimeout`. This is the deterministic stand-in used by tests and
//! the native binary: same events, same tokens, simulated time.

use super::clock::{CLOCK_PERIOD_SECS, clock_tick};
use crate::consts::HEADLESS_FRAME_DT;
use super::motion::tick;
use super::round::advance_round;
use super::state::{GameEvent, GameState, RoundToken, SessionToken};

/// Slack for comparing accumulated float times
const TIME_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
enum Continuation {
    Clock(SessionToken),
    NextRound(RoundToken),
}

/// Simulated event loop
#[derive(Debug, Clone)]
pub struct Timeline {
    now: f64,
    frame_dt: f32,
    clock: Option<(f64, SessionToken)>,
    pending: Vec<(f64, RoundToken)>,
}

impl Timeline {
    /// A non-positive or non-finite `frame_dt` falls back to 60 Hz
    pub fn new(frame_dt: f32) -> Self {
        let frame_dt = if frame_dt.is_finite() && frame_dt > 0.0 {
            frame_dt
        } else {
            log::warn!("Invalid frame step {}, using {}", frame_dt, HEADLESS_FRAME_DT);
            HEADLESS_FRAME_DT
        };
        Self {
            now: 0.0,
            frame_dt,
            clock: None,
            pending: Vec::new(),
        }
    }

    /// Simulated seconds since creation
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Settle continuations still waiting to fire
    pub fn pending_rounds(&self) -> usize {
        self.pending.len()
    }

    /// Drain the state's events and schedule whatever they ask for
    pub fn sync(&mut self, state: &mut GameState) -> Vec<GameEvent> {
        let events = state.drain_events();
        let settle = state.settings.settle_delay_secs() as f64;
        for event in &events {
            match *event {
                GameEvent::SessionStarted(token) => {
                    self.clock = Some((self.now + CLOCK_PERIOD_SECS as f64, token));
                }
                GameEvent::ClickResolved { next, .. } => {
                    self.pending.push((self.now + settle, next));
                }
                GameEvent::SessionEnded(_) => {
                    self.clock = None;
                }
                GameEvent::RoundStarted { .. } | GameEvent::ClockTicked { .. } => {}
            }
        }
        events
    }

    /// Earliest continuation due at or before `horizon`
    fn pop_due(&mut self, horizon: f64) -> Option<(f64, Continuation)> {
        let clock = self
            .clock
            .filter(|(at, _)| *at <= horizon + TIME_EPSILON)
            .map(|(at, token)| (at, Continuation::Clock(token)));
        let round = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, (at, _))| *at <= horizon + TIME_EPSILON)
            .min_by(|a, b| a.1.0.total_cmp(&b.1.0))
            .map(|(i, &(at, token))| (i, at, token));

        match (clock, round) {
            (Some((clock_at, c)), Some((i, round_at, token))) => {
                if round_at < clock_at {
                    self.pending.remove(i);
                    Some((round_at, Continuation::NextRound(token)))
                } else {
                    self.clock = None;
                    Some((clock_at, c))
                }
            }
            (Some((clock_at, c)), None) => {
                self.clock = None;
                Some((clock_at, c))
            }
            (None, Some((i, round_at, token))) => {
                self.pending.remove(i);
                Some((round_at, Continuation::NextRound(token)))
            }
            (None, None) => None,
        }
    }

    fn fire(&mut self, state: &mut GameState, at: f64, continuation: Continuation) {
        self.now = self.now.max(at);
        match continuation {
            Continuation::Clock(token) => {
                if clock_tick(state, token) {
                    self.clock = Some((at + CLOCK_PERIOD_SECS as f64, token));
                }
            }
            Continuation::NextRound(token) => {
                advance_round(state, token);
            }
        }
    }

    /// Run frames and due continuations for `seconds` of simulated time
    pub fn advance(&mut self, state: &mut GameState, seconds: f64) -> Vec<GameEvent> {
        let mut out = self.sync(state);
        let end = self.now + seconds;

        loop {
            let next_frame = self.now + self.frame_dt as f64;
            let horizon = next_frame.min(end);

            while let Some((at, continuation)) = self.pop_due(horizon) {
                self.fire(state, at, continuation);
                out.extend(self.sync(state));
            }

            if next_frame > end + TIME_EPSILON {
                self.now = end;
                break;
            }

            tick(state, self.frame_dt);
            self.now = next_frame;
            out.extend(self.sync(state));
        }

        out
    }
}

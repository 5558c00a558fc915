//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Scheduled work expressed as tokens, never as callbacks
//! - Entity lookup by ID, never by display position
//! - No rendering or platform dependencies

pub mod catalog;
pub mod clock;
pub mod motion;
pub mod round;
pub mod schedule;
pub mod state;

pub use catalog::{CATALOG, Species};
pub use clock::{CLOCK_PERIOD_SECS, clock_tick};
pub use motion::{MotionParams, step_crab, tick};
pub use round::{
    RoundParams, advance_round, end_session, generate_round, resolve_click, set_arena_bounds,
    set_hover, start_round, start_session,
};
pub use schedule::Timeline;
pub use state::{
    Arena, ClickOutcome, Crab, CrabId, GameEvent, GameState, HoverState, IgnoreReason, Round,
    RoundFeedback, RoundToken, ScoreTone, Scoreboard, SessionSummary, SessionToken,
};

//! Session state and core simulation types
//!
//! Everything the round manager, motion simulator and clock mutate lives in
//! `GameState`. There are no globals; drivers own the state and pass it in.

use std::collections::HashMap;
use std::fmt;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::catalog::{CATALOG, Species, target_species};
use crate::settings::{Settings, SettingsError};

/// Opaque crab identifier, unique for the lifetime of a `GameState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CrabId(pub u32);

impl fmt::Display for CrabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Playfield size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    /// Viewport width, used to pick the crab size
    pub viewport_width: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            viewport_width: width,
        }
    }

    pub fn with_viewport(mut self, viewport_width: f32) -> Self {
        self.viewport_width = viewport_width;
        self
    }

    /// Largest top-left corner a square of `size` can occupy (never negative)
    #[inline]
    pub fn max_corner(&self, size: f32) -> Vec2 {
        Vec2::new((self.width - size).max(0.0), (self.height - size).max(0.0))
    }

    /// Whether a square of `size` at `pos` lies fully inside
    pub fn contains(&self, pos: Vec2, size: f32) -> bool {
        let max = self.max_corner(size);
        pos.x >= 0.0 && pos.y >= 0.0 && pos.x <= max.x && pos.y <= max.y
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// A crab on screen
#[derive(Debug, Clone, Serialize)]
pub struct Crab {
    pub id: CrabId,
    pub species: &'static Species,
    pub is_target: bool,
    pub spines: u8,
    /// Edge length in pixels
    pub size: f32,
    /// Top-left corner
    pub pos: Vec2,
    /// Pixels per second
    pub vel: Vec2,
    /// Hover/press scale (1.0 at rest)
    pub scale: f32,
}

impl Crab {
    pub fn new(id: CrabId, species: &'static Species, size: f32, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            species,
            is_target: species.is_target,
            spines: species.spines,
            size,
            pos,
            vel,
            scale: 1.0,
        }
    }
}

/// Outcome of the click that resolved a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundFeedback {
    pub clicked: CrabId,
    /// The round's target, highlighted when the player missed it
    pub target: CrabId,
    pub correct: bool,
}

/// One round of crabs
#[derive(Debug, Clone, Serialize)]
pub struct Round {
    /// 1-based round number within the session
    pub number: u32,
    /// Crabs in display order
    crabs: Vec<Crab>,
    /// Set by the first valid click; blocks any further scoring
    pub resolved: bool,
    pub feedback: Option<RoundFeedback>,
    #[serde(skip)]
    index: HashMap<CrabId, usize>,
}

impl Round {
    pub fn new(number: u32, crabs: Vec<Crab>) -> Self {
        let index = crabs.iter().enumerate().map(|(i, c)| (c.id, i)).collect();
        Self {
            number,
            crabs,
            resolved: false,
            feedback: None,
            index,
        }
    }

    /// Crabs in display order
    pub fn crabs(&self) -> &[Crab] {
        &self.crabs
    }

    /// Mutable view for motion; the set itself is fixed for the round
    pub fn crabs_mut(&mut self) -> &mut [Crab] {
        &mut self.crabs
    }

    pub fn crab(&self, id: CrabId) -> Option<&Crab> {
        let crab = self.index.get(&id).and_then(|&i| self.crabs.get(i))?;
        (crab.id == id).then_some(crab)
    }

    pub fn crab_mut(&mut self, id: CrabId) -> Option<&mut Crab> {
        let crab = self.index.get(&id).and_then(|&i| self.crabs.get_mut(i))?;
        (crab.id == id).then_some(crab)
    }

    pub fn target(&self) -> Option<&Crab> {
        self.crabs.iter().find(|c| c.is_target)
    }
}

/// Identifies a session for clock ticks and frame callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionToken {
    pub session: u32,
}

/// Identifies a round for the settle-delay continuation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RoundToken {
    pub session: u32,
    pub round: u32,
}

/// Pointer interaction with a crab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverState {
    Idle,
    Hovered,
    Pressed,
}

/// Why a click did not score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No session running
    Inactive,
    /// The round was already decided by an earlier click
    AlreadyResolved,
    /// The id is not in the current round (stale or bogus click)
    UnknownCrab,
}

/// Result of `resolve_click`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Scored(RoundFeedback),
    Ignored(IgnoreReason),
}

/// Colour band for the score display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTone {
    Positive,
    Negative,
    Neutral,
}

/// Values shown in the HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scoreboard {
    pub score: i32,
    pub rounds: u32,
    pub remaining_secs: u32,
}

impl Scoreboard {
    pub fn tone(&self) -> ScoreTone {
        match self.score {
            s if s > 0 => ScoreTone::Positive,
            s if s < 0 => ScoreTone::Negative,
            _ => ScoreTone::Neutral,
        }
    }

    pub fn timer_text(&self) -> String {
        format!("{}s", self.remaining_secs)
    }

    /// Timer pulses during the last ten seconds
    pub fn timer_urgent(&self) -> bool {
        self.remaining_secs < 10
    }
}

/// Final result of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub score: i32,
    pub rounds: u32,
}

impl SessionSummary {
    pub fn restart_label(&self) -> String {
        format!("Play Again! ({} Rounds, Score: {})", self.rounds, self.score)
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TIME UP! Final Score: {} over {} rounds.",
            self.score, self.rounds
        )
    }
}

/// Notifications for drivers and presenters, drained after each call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Arm the clock and frame loop with this token
    SessionStarted(SessionToken),
    RoundStarted { round: u32 },
    /// Schedule `advance_round(next)` after the settle delay
    ClickResolved {
        feedback: RoundFeedback,
        next: RoundToken,
    },
    ClockTicked { remaining_secs: u32 },
    SessionEnded(SessionSummary),
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed the RNG was created from
    pub seed: u64,
    pub rng: Pcg32,
    pub settings: Settings,
    pub catalog: &'static [Species],
    pub arena: Arena,
    pub score: i32,
    /// Rounds started this session
    pub round_count: u32,
    pub remaining_secs: u32,
    pub active: bool,
    /// Bumped on every `start_session`
    pub session_id: u32,
    pub round: Option<Round>,
    events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create an idle game with the default catalog
    pub fn new(seed: u64, settings: Settings) -> Self {
        let remaining_secs = settings.session_secs;
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            settings,
            catalog: CATALOG,
            arena: Arena::default(),
            score: 0,
            round_count: 0,
            remaining_secs,
            active: false,
            session_id: 0,
            round: None,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Create an idle game with a custom catalog (must contain a target)
    pub fn with_catalog(
        seed: u64,
        settings: Settings,
        catalog: &'static [Species],
    ) -> Result<Self, SettingsError> {
        if target_species(catalog).is_none() {
            return Err(SettingsError::NoTargetSpecies);
        }
        let mut state = Self::new(seed, settings);
        state.catalog = catalog;
        Ok(state)
    }

    /// Allocate a new crab ID
    pub fn next_crab_id(&mut self) -> CrabId {
        CrabId(self.reserve_crab_ids(1))
    }

    /// Reserve `count` consecutive IDs, returning the first
    ///
    /// Saturates at `u32::MAX` rather than wrapping onto live IDs.
    pub fn reserve_crab_ids(&mut self, count: usize) -> u32 {
        let first = self.next_id;
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        self.next_id = self.next_id.saturating_add(count);
        first
    }

    pub fn session_token(&self) -> SessionToken {
        SessionToken {
            session: self.session_id,
        }
    }

    /// True if `token` names the running session
    pub fn is_current_session(&self, token: SessionToken) -> bool {
        self.active && token.session == self.session_id
    }

    pub fn crabs(&self) -> &[Crab] {
        self.round.as_ref().map(|r| r.crabs()).unwrap_or(&[])
    }

    pub fn scoreboard(&self) -> Scoreboard {
        Scoreboard {
            score: self.score,
            rounds: self.round_count,
            remaining_secs: self.remaining_secs,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            score: self.score,
            rounds: self.round_count,
        }
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

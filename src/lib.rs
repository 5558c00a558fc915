//! Crab Spotter - spot the European Green Crab among drifting native crabs
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion, rounds, clock, timeline)
//! - `presenter`: Contract between the simulation and whatever draws it
//! - `settings`: Data-driven tuning with validation
//! - `autoplay`: Bot player for the headless build

pub mod autoplay;
pub mod presenter;
pub mod settings;
pub mod sim;

pub use autoplay::Autoplay;
pub use presenter::{Presenter, present, sync_transforms};
pub use settings::{Settings, SettingsError};

/// Game configuration constants
pub mod consts {
    /// Session length in seconds
    pub const GAME_DURATION_SECS: u32 = 60;
    /// Crabs on screen per round (one target plus decoys)
    pub const CRABS_PER_ROUND: usize = 4;
    /// Pause after a click before the next round starts
    pub const SETTLE_DELAY_MS: u32 = 400;

    /// Per-tick multiplicative velocity damping
    pub const FRICTION: f32 = 0.999;
    /// Per-tick chance that a crab picks a new random velocity
    pub const WANDER_CHANCE: f32 = 0.005;
    /// Width of the random velocity range per axis (centered on zero)
    pub const VELOCITY_RANGE: f32 = 60.0;

    /// Crab scale while the pointer is over it
    pub const HOVER_SCALE: f32 = 1.25;
    /// Crab scale while pressed
    pub const PRESSED_SCALE: f32 = 0.85;

    /// Crab edge length on wide viewports (pixels)
    pub const CRAB_SIZE_LARGE: f32 = 100.0;
    /// Crab edge length on narrow viewports (pixels)
    pub const CRAB_SIZE_SMALL: f32 = 75.0;
    /// Viewports wider than this get large crabs
    pub const WIDE_VIEWPORT: f32 = 768.0;

    /// Largest frame delta fed to the motion simulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Frame step used by the headless timeline (60 Hz)
    pub const HEADLESS_FRAME_DT: f32 = 1.0 / 60.0;
}

//! Game tuning and preferences
//!
//! Defaults come from `crate::consts`. On the web an optional JSON blob can
//! override any subset of fields; nothing is written back.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors produced while loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("session_secs must be at least 1")]
    ZeroDuration,
    #[error("crabs_per_round must be at least 1")]
    ZeroCrabs,
    #[error("friction must be in (0, 1], got {0}")]
    Friction(f32),
    #[error("wander_chance must be in [0, 1], got {0}")]
    WanderChance(f32),
    #[error("{name} must be positive and finite, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("crab catalog has no target species")]
    NoTargetSpecies,
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Session ===
    /// Countdown length in seconds
    pub session_secs: u32,
    /// Crabs per round, target included
    pub crabs_per_round: usize,
    /// Delay between a resolved click and the next round
    pub settle_delay_ms: u32,

    // === Motion ===
    /// Velocity multiplier applied every tick
    pub friction: f32,
    /// Chance per tick that a crab re-rolls its velocity
    pub wander_chance: f32,
    /// Random velocity range per axis, centered on zero
    pub velocity_range: f32,

    // === Presentation ===
    pub hover_scale: f32,
    pub pressed_scale: f32,
    pub crab_size_large: f32,
    pub crab_size_small: f32,
    /// Viewports wider than this use `crab_size_large`
    pub wide_viewport: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_secs: GAME_DURATION_SECS,
            crabs_per_round: CRABS_PER_ROUND,
            settle_delay_ms: SETTLE_DELAY_MS,

            friction: FRICTION,
            wander_chance: WANDER_CHANCE,
            velocity_range: VELOCITY_RANGE,

            hover_scale: HOVER_SCALE,
            pressed_scale: PRESSED_SCALE,
            crab_size_large: CRAB_SIZE_LARGE,
            crab_size_small: CRAB_SIZE_SMALL,
            wide_viewport: WIDE_VIEWPORT,
        }
    }
}

impl Settings {
    /// Parse a (possibly partial) JSON object and validate it
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.session_secs == 0 {
            return Err(SettingsError::ZeroDuration);
        }
        if self.crabs_per_round == 0 {
            return Err(SettingsError::ZeroCrabs);
        }
        if !(self.friction > 0.0 && self.friction <= 1.0) {
            return Err(SettingsError::Friction(self.friction));
        }
        if !(0.0..=1.0).contains(&self.wander_chance) {
            return Err(SettingsError::WanderChance(self.wander_chance));
        }
        for (name, value) in [
            ("velocity_range", self.velocity_range),
            ("hover_scale", self.hover_scale),
            ("pressed_scale", self.pressed_scale),
            ("crab_size_large", self.crab_size_large),
            ("crab_size_small", self.crab_size_small),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError::NotPositive { name, value });
            }
        }
        Ok(())
    }

    /// Settle delay in seconds
    pub fn settle_delay_secs(&self) -> f32 {
        self.settle_delay_ms as f32 / 1000.0
    }

    /// Crab edge length for a viewport of the given width
    pub fn crab_size_for_viewport(&self, viewport_width: f32) -> f32 {
        if viewport_width > self.wide_viewport {
            self.crab_size_large
        } else {
            self.crab_size_small
        }
    }

    /// Load settings from the `data-settings` attribute of `#game-area` (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("game-area"))
            .and_then(|el| el.get_attribute("data-settings"));

        match json {
            Some(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from data-settings");
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring bad settings: {}", e);
                    Self::default()
                }
            },
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

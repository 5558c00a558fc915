//! Autoplay bot for demos and soak runs
//!
//! Waits a reaction delay after each new round, then clicks the target with
//! the configured accuracy or a random decoy otherwise.

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::sim::{CrabId, GameState};

#[derive(Debug, Clone)]
pub struct Autoplay {
    /// Seconds between a round appearing and the click
    pub reaction_secs: f64,
    /// Probability of picking the target, in [0, 1]
    pub accuracy: f64,
    rng: Pcg32,
    /// (round number, time first seen)
    seen: Option<(u32, f64)>,
}

impl Autoplay {
    pub fn new(seed: u64, reaction_secs: f64, accuracy: f64) -> Self {
        Self {
            reaction_secs: reaction_secs.max(0.0),
            accuracy: accuracy.clamp(0.0, 1.0),
            rng: Pcg32::seed_from_u64(seed),
            seen: None,
        }
    }

    /// Crab to click at time `now`, if the bot is ready to act
    pub fn choose(&mut self, state: &GameState, now: f64) -> Option<CrabId> {
        if !state.active {
            return None;
        }
        let round = state.round.as_ref().filter(|r| !r.resolved)?;

        let first_seen = match self.seen {
            Some((number, at)) if number == round.number => at,
            _ => {
                self.seen = Some((round.number, now));
                now
            }
        };
        if now - first_seen < self.reaction_secs {
            return None;
        }

        let target = round.target()?.id;
        if self.rng.random_bool(self.accuracy) {
            return Some(target);
        }
        let decoys: Vec<CrabId> = round
            .crabs()
            .iter()
            .filter(|c| !c.is_target)
            .map(|c| c.id)
            .collect();
        Some(decoys.choose(&mut self.rng).copied().unwrap_or(target))
    }
}

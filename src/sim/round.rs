//! Round lifecycle: session start/end, round generation, click resolution
//!
//! Scheduled work (the settle delay, the clock) never runs here. Instead the
//! functions emit `GameEvent`s carrying tokens, and the driver calls back with
//! those tokens. A token that no longer matches the running session or round
//! is ignored, so callbacks that fire after a restart are harmless.

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;

use super::catalog::{Species, decoy_species, target_species};
use super::state::{
    Arena, ClickOutcome, Crab, CrabId, GameEvent, GameState, HoverState, IgnoreReason, Round,
    RoundFeedback, RoundToken,
};

/// Inputs for generating one round's crabs
#[derive(Debug, Clone, Copy)]
pub struct RoundParams {
    pub arena: Arena,
    /// Crab edge length in pixels
    pub crab_size: f32,
    /// Crabs wanted, target included
    pub crabs_per_round: usize,
    pub velocity_range: f32,
    /// ID of the first crab; the rest follow consecutively
    pub first_id: u32,
}

/// Random velocity in `[-range/2, range/2)` per axis
pub fn random_velocity<R: Rng + ?Sized>(rng: &mut R, range: f32) -> Vec2 {
    Vec2::new(
        (rng.random::<f32>() - 0.5) * range,
        (rng.random::<f32>() - 0.5) * range,
    )
}

/// Random top-left corner that keeps a crab of `size` inside the arena
pub fn random_position<R: Rng + ?Sized>(rng: &mut R, arena: &Arena, size: f32) -> Vec2 {
    let max = arena.max_corner(size);
    Vec2::new(rng.random::<f32>() * max.x, rng.random::<f32>() * max.y)
}

/// Build a round's crabs: one target plus distinct decoys, shuffled
///
/// Pure over the RNG: the same seed and params give the same crabs. If the
/// catalog has fewer decoy species than requested the round is smaller; a
/// species never appears twice. Returns an empty list if the catalog has no
/// target species.
pub fn generate_round<R: Rng + ?Sized>(
    rng: &mut R,
    catalog: &'static [Species],
    params: &RoundParams,
) -> Vec<Crab> {
    let Some(target) = target_species(catalog) else {
        return Vec::new();
    };

    let mut next_id = params.first_id;
    let mut spawn = |rng: &mut R, species: &'static Species| {
        let id = CrabId(next_id);
        next_id += 1;
        let pos = random_position(rng, &params.arena, params.crab_size);
        let vel = random_velocity(rng, params.velocity_range);
        Crab::new(id, species, params.crab_size, pos, vel)
    };

    let mut crabs = Vec::with_capacity(params.crabs_per_round.min(catalog.len()));
    crabs.push(spawn(&mut *rng, target));

    let mut decoys = decoy_species(catalog);
    decoys.shuffle(rng);
    let decoy_count = params.crabs_per_round.saturating_sub(1).min(decoys.len());
    for &species in &decoys[..decoy_count] {
        crabs.push(spawn(&mut *rng, species));
    }

    // Display order must not leak which crab is the target
    crabs.shuffle(rng);
    crabs
}

/// Reset the session and begin round 1
pub fn start_session(state: &mut GameState, arena: Arena) {
    state.arena = arena;
    state.score = 0;
    state.round_count = 0;
    state.remaining_secs = state.settings.session_secs;
    state.active = true;
    state.session_id = state.session_id.wrapping_add(1);
    state.round = None;

    log::info!(
        "Session {} started: {}s, arena {}x{}",
        state.session_id,
        state.remaining_secs,
        arena.width,
        arena.height
    );

    let token = state.session_token();
    state.emit(GameEvent::SessionStarted(token));
    start_round(state);
}

/// Replace the current round with a freshly generated one
pub fn start_round(state: &mut GameState) {
    if !state.active {
        return;
    }

    state.round_count += 1;

    let crab_size = state
        .settings
        .crab_size_for_viewport(state.arena.viewport_width);
    // A species appears at most once per round
    let crabs_per_round = state.settings.crabs_per_round.min(state.catalog.len());
    let first_id = state.reserve_crab_ids(crabs_per_round);
    let params = RoundParams {
        arena: state.arena,
        crab_size,
        crabs_per_round,
        velocity_range: state.settings.velocity_range,
        first_id,
    };
    let crabs = generate_round(&mut state.rng, state.catalog, &params);

    log::debug!("Round {}: {} crabs", state.round_count, crabs.len());

    state.round = Some(Round::new(state.round_count, crabs));
    state.emit(GameEvent::RoundStarted {
        round: state.round_count,
    });
}

/// Score a click on `id`; only the first valid click in a round counts
pub fn resolve_click(state: &mut GameState, id: CrabId) -> ClickOutcome {
    if !state.active {
        return ClickOutcome::Ignored(IgnoreReason::Inactive);
    }
    let session = state.session_id;
    let Some(round) = state.round.as_mut() else {
        return ClickOutcome::Ignored(IgnoreReason::Inactive);
    };
    if round.resolved {
        log::debug!("Click on {} ignored: round {} already resolved", id, round.number);
        return ClickOutcome::Ignored(IgnoreReason::AlreadyResolved);
    }
    let Some(clicked) = round.crab(id) else {
        log::debug!("Click on unknown crab {} ignored", id);
        return ClickOutcome::Ignored(IgnoreReason::UnknownCrab);
    };

    let correct = clicked.is_target;
    let target = round.target().map(|c| c.id).unwrap_or(id);
    let feedback = RoundFeedback {
        clicked: id,
        target,
        correct,
    };
    round.resolved = true;
    round.feedback = Some(feedback);
    let next = RoundToken {
        session,
        round: round.number,
    };

    state.score += if correct { 1 } else { -1 };
    log::info!(
        "Round {} {}: score {}",
        next.round,
        if correct { "won" } else { "lost" },
        state.score
    );

    state.emit(GameEvent::ClickResolved { feedback, next });
    ClickOutcome::Scored(feedback)
}

/// Settle-delay continuation: start the next round if `token` is still current
pub fn advance_round(state: &mut GameState, token: RoundToken) -> bool {
    let current = state.active
        && token.session == state.session_id
        && state
            .round
            .as_ref()
            .is_some_and(|r| r.number == token.round && r.resolved);
    if !current {
        log::debug!("Stale round continuation {:?} dropped", token);
        return false;
    }
    start_round(state);
    true
}

/// Stop the session and report the final result
pub fn end_session(state: &mut GameState) {
    if !state.active {
        return;
    }
    state.active = false;
    state.round = None;

    let summary = state.summary();
    log::info!(
        "Session {} over: score {} in {} rounds",
        state.session_id,
        summary.score,
        summary.rounds
    );
    state.emit(GameEvent::SessionEnded(summary));
}

/// Resize the arena; crabs already placed are re-clamped on their next bounce
pub fn set_arena_bounds(state: &mut GameState, arena: Arena) {
    state.arena = arena;
}

/// Update a crab's scale from pointer state; unknown IDs are ignored
pub fn set_hover(state: &mut GameState, id: CrabId, hover: HoverState) {
    let scale = match hover {
        HoverState::Idle => 1.0,
        HoverState::Hovered => state.settings.hover_scale,
        HoverState::Pressed => state.settings.pressed_scale,
    };
    if let Some(crab) = state.round.as_mut().and_then(|r| r.crab_mut(id)) {
        crab.scale = scale;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::settings::Settings;
    use crate::sim::catalog::CATALOG;

    fn started(seed: u64) -> GameState {
        let mut state = GameState::new(seed, Settings::default());
        start_session(&mut state, Arena::new(800.0, 600.0).with_viewport(1024.0));
        state
    }

    fn target_id(state: &GameState) -> CrabId {
        state.round.as_ref().and_then(|r| r.target()).map(|c| c.id).expect("target")
    }

    fn decoy_id(state: &GameState) -> CrabId {
        state.crabs().iter().find(|c| !c.is_target).map(|c| c.id).expect("decoy")
    }

    fn params(crabs_per_round: usize) -> RoundParams {
        RoundParams {
            arena: Arena::new(800.0, 600.0),
            crab_size: 100.0,
            crabs_per_round,
            velocity_range: 60.0,
            first_id: 1,
        }
    }

    #[test]
    fn test_generate_round_shape() {
        let mut rng = Pcg32::seed_from_u64(42);
        let crabs = generate_round(&mut rng, CATALOG, &params(4));
        assert_eq!(crabs.len(), 4);
        assert_eq!(crabs.iter().filter(|c| c.is_target).count(), 1);

        let names: HashSet<_> = crabs.iter().map(|c| c.species.name).collect();
        assert_eq!(names.len(), 4);

        let ids: HashSet<_> = crabs.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 4);

        for crab in &crabs {
            assert!(crab.vel.x >= -30.0 && crab.vel.x < 30.0);
            assert!(crab.vel.y >= -30.0 && crab.vel.y < 30.0);
            assert!(Arena::new(800.0, 600.0).contains(crab.pos, crab.size));
        }
    }

    #[test]
    fn test_generate_round_shrinks_with_small_catalog() {
        static SMALL: &[Species] = &[
            Species {
                name: "European Green Crab (EGC)",
                is_target: true,
                spines: 5,
                image_url: "./img/egC.png",
                fallback_text: "EGC",
            },
            Species {
                name: "Kelp Crab",
                is_target: false,
                spines: 3,
                image_url: "./img/kc.png",
                fallback_text: "Kelp Crab",
            },
        ];
        let mut rng = Pcg32::seed_from_u64(7);
        let crabs = generate_round(&mut rng, SMALL, &params(4));
        assert_eq!(crabs.len(), 2);
        assert_eq!(crabs.iter().filter(|c| c.is_target).count(), 1);
    }

    #[test]
    fn test_generate_round_single_crab() {
        let mut rng = Pcg32::seed_from_u64(7);
        let crabs = generate_round(&mut rng, CATALOG, &params(1));
        assert_eq!(crabs.len(), 1);
        assert!(crabs[0].is_target);
    }

    #[test]
    fn test_generate_round_is_deterministic() {
        let a = generate_round(&mut Pcg32::seed_from_u64(9), CATALOG, &params(4));
        let b = generate_round(&mut Pcg32::seed_from_u64(9), CATALOG, &params(4));
        let key = |crabs: &[Crab]| {
            crabs
                .iter()
                .map(|c| (c.id, c.species.name, c.pos.to_array(), c.vel.to_array()))
                .collect::<Vec<_>>()
        };
        assert_eq!(key(&a), key(&b));
    }

    #[test]
    fn test_display_order_varies() {
        // Across seeds, the target should not always sit in the same slot
        let slots: HashSet<usize> = (0..32)
            .filter_map(|seed| {
                let crabs = generate_round(&mut Pcg32::seed_from_u64(seed), CATALOG, &params(4));
                crabs.iter().position(|c| c.is_target)
            })
            .collect();
        assert!(slots.len() > 1);
    }

    #[test]
    fn test_start_session_resets() {
        let mut state = started(1);
        state.score = 5;
        state.remaining_secs = 3;
        start_session(&mut state, Arena::new(800.0, 600.0));
        assert_eq!(state.score, 0);
        assert_eq!(state.round_count, 1);
        assert_eq!(state.remaining_secs, 60);
        assert!(state.active);
        assert_eq!(state.session_id, 2);
    }

    #[test]
    fn test_start_session_events() {
        let mut state = started(1);
        let events = state.drain_events();
        assert_eq!(
            events,
            vec![
                GameEvent::SessionStarted(state.session_token()),
                GameEvent::RoundStarted { round: 1 },
            ]
        );
    }

    #[test]
    fn test_start_round_noop_when_inactive() {
        let mut state = GameState::new(1, Settings::default());
        start_round(&mut state);
        assert_eq!(state.round_count, 0);
        assert!(state.round.is_none());
    }

    #[test]
    fn test_crab_size_follows_viewport() {
        let mut state = GameState::new(1, Settings::default());
        start_session(&mut state, Arena::new(700.0, 500.0).with_viewport(500.0));
        assert!(state.crabs().iter().all(|c| c.size == 75.0));
    }

    #[test]
    fn test_click_target_scores() {
        let mut state = started(3);
        let target = target_id(&state);
        let outcome = resolve_click(&mut state, target);
        assert!(matches!(outcome, ClickOutcome::Scored(f) if f.correct));
        assert_eq!(state.score, 1);
    }

    #[test]
    fn test_click_decoy_flags_target() {
        let mut state = started(3);
        let target = target_id(&state);
        let decoy = decoy_id(&state);
        let outcome = resolve_click(&mut state, decoy);
        assert_eq!(
            outcome,
            ClickOutcome::Scored(RoundFeedback {
                clicked: decoy,
                target,
                correct: false,
            })
        );
        assert_eq!(state.score, -1);
    }

    #[test]
    fn test_second_click_ignored() {
        let mut state = started(3);
        let target = target_id(&state);
        let decoy = decoy_id(&state);
        resolve_click(&mut state, target);
        let second = resolve_click(&mut state, decoy);
        assert_eq!(second, ClickOutcome::Ignored(IgnoreReason::AlreadyResolved));
        assert_eq!(state.score, 1);
    }

    #[test]
    fn test_unknown_click_does_not_latch() {
        let mut state = started(3);
        let outcome = resolve_click(&mut state, CrabId(9999));
        assert_eq!(outcome, ClickOutcome::Ignored(IgnoreReason::UnknownCrab));
        assert!(!state.round.as_ref().expect("round").resolved);

        let target = target_id(&state);
        assert!(matches!(resolve_click(&mut state, target), ClickOutcome::Scored(_)));
    }

    #[test]
    fn test_click_from_previous_round_ignored() {
        let mut state = started(3);
        let old = target_id(&state);
        resolve_click(&mut state, old);
        let token = RoundToken {
            session: state.session_id,
            round: 1,
        };
        assert!(advance_round(&mut state, token));
        assert_eq!(
            resolve_click(&mut state, old),
            ClickOutcome::Ignored(IgnoreReason::UnknownCrab)
        );
        assert_eq!(state.score, 1);
    }

    #[test]
    fn test_advance_round_requires_resolution_and_current_token() {
        let mut state = started(3);
        let token = RoundToken {
            session: state.session_id,
            round: 1,
        };
        // Not resolved yet
        assert!(!advance_round(&mut state, token));

        let target = target_id(&state);
        resolve_click(&mut state, target);
        let stale = RoundToken {
            session: state.session_id.wrapping_sub(1),
            round: 1,
        };
        assert!(!advance_round(&mut state, stale));
        assert!(advance_round(&mut state, token));
        assert_eq!(state.round_count, 2);
        // Same token again is now stale
        assert!(!advance_round(&mut state, token));
        assert_eq!(state.round_count, 2);
    }

    #[test]
    fn test_end_session() {
        let mut state = started(3);
        state.drain_events();
        end_session(&mut state);
        assert!(!state.active);
        assert!(state.round.is_none());
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::SessionEnded(state.summary())]
        );
        // Idempotent
        end_session(&mut state);
        assert!(state.drain_events().is_empty());
        assert_eq!(
            resolve_click(&mut state, CrabId(1)),
            ClickOutcome::Ignored(IgnoreReason::Inactive)
        );
    }

    #[test]
    fn test_oversized_round_request_is_clamped_to_catalog() {
        let settings = Settings {
            crabs_per_round: usize::MAX,
            ..Default::default()
        };
        let mut state = GameState::new(3, settings);
        start_session(&mut state, Arena::default());
        assert_eq!(state.crabs().len(), CATALOG.len());

        let target = target_id(&state);
        resolve_click(&mut state, target);
        let token = RoundToken {
            session: state.session_id,
            round: 1,
        };
        assert!(advance_round(&mut state, token));
        assert_eq!(state.crabs().len(), CATALOG.len());
        assert!(state.crabs().iter().all(|c| c.id.0 > target.0));
    }

    #[test]
    fn test_set_hover_scales() {
        let mut state = started(3);
        let id = target_id(&state);
        set_hover(&mut state, id, HoverState::Hovered);
        assert_eq!(state.round.as_ref().and_then(|r| r.crab(id)).map(|c| c.scale), Some(1.25));
        set_hover(&mut state, id, HoverState::Pressed);
        assert_eq!(state.round.as_ref().and_then(|r| r.crab(id)).map(|c| c.scale), Some(0.85));
        set_hover(&mut state, id, HoverState::Idle);
        assert_eq!(state.round.as_ref().and_then(|r| r.crab(id)).map(|c| c.scale), Some(1.0));
        set_hover(&mut state, CrabId(9999), HoverState::Hovered);
    }
}

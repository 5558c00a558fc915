//! Per-frame crab motion
//!
//! Integrate, bounce off the arena walls, occasionally wander, then damp.

use rand::Rng;

use super::round::random_velocity;
use super::state::{Arena, Crab, GameState};

/// Motion parameters for one step
#[derive(Debug, Clone, Copy)]
pub struct MotionParams {
    pub friction: f32,
    pub wander_chance: f32,
    pub velocity_range: f32,
}

/// Reflect one axis off `[0, max]`: flip velocity and clamp on contact
#[inline]
fn bounce_axis(pos: &mut f32, vel: &mut f32, max: f32) {
    if *pos < 0.0 {
        *vel = -*vel;
        *pos = 0.0;
    } else if *pos > max {
        *vel = -*vel;
        *pos = max;
    }
}

/// Advance a single crab by `dt` seconds
pub fn step_crab<R: Rng + ?Sized>(
    crab: &mut Crab,
    arena: &Arena,
    params: &MotionParams,
    rng: &mut R,
    dt: f32,
) {
    crab.pos += crab.vel * dt;

    let max = arena.max_corner(crab.size);
    bounce_axis(&mut crab.pos.x, &mut crab.vel.x, max.x);
    bounce_axis(&mut crab.pos.y, &mut crab.vel.y, max.y);

    if rng.random::<f32>() < params.wander_chance {
        crab.vel = random_velocity(rng, params.velocity_range);
    }

    crab.vel *= params.friction;
}

/// Advance every crab in the current round; does nothing when inactive
pub fn tick(state: &mut GameState, dt: f32) {
    if !state.active || dt < 0.0 {
        return;
    }
    let params = MotionParams {
        friction: state.settings.friction,
        wander_chance: state.settings.wander_chance,
        velocity_range: state.settings.velocity_range,
    };
    let arena = state.arena;
    let Some(round) = state.round.as_mut() else {
        return;
    };
    for crab in round.crabs_mut() {
        step_crab(crab, &arena, &params, &mut state.rng, dt);
    }
}

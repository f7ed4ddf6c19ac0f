//! Vortex: tangential swirl around the pointer with a mild inward pull

use glam::Vec2;

use super::{FieldContext, ForceField, SeedContext, clamp_speed, drag, palettes};
use crate::consts::DIST_EPSILON;
use crate::sim::body::Body;

const SWIRL_ACCEL: f32 = 900.0;
const PULL_ACCEL: f32 = 260.0;
/// Distance at which both forces drop to half strength
const FALLOFF: f32 = 220.0;
const DRAG: f32 = 0.8;
const MAX_SPEED: f32 = 700.0;
const SEED_SPIN: f32 = 80.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct VortexField;

/// Swirl plus pull toward `center`, scaled by `1 / (1 + d / falloff)`
pub(super) fn swirl_accel(pos: Vec2, center: Vec2, swirl: f32, pull: f32, falloff: f32) -> Vec2 {
    let offset = pos - center;
    let dist = offset.length();
    if dist <= DIST_EPSILON {
        return Vec2::ZERO;
    }
    let radial = offset / dist;
    let tangent = radial.perp();
    let atten = 1.0 / (1.0 + dist / falloff);
    (tangent * swirl - radial * pull) * atten
}

impl ForceField for VortexField {
    fn seed(&mut self, ctx: &mut SeedContext<'_>) -> Vec<Body> {
        let count = ctx.config.counts.vortex;
        let bounds = ctx.arena.bounds();
        let center = bounds.center();
        (0..count)
            .map(|_| {
                let radius = ctx.random_radius();
                let pos = ctx.random_point(&bounds, radius);
                let offset = pos - center;
                let vel = offset.perp().normalize_or_zero() * SEED_SPIN;
                let color = ctx.pick_color(&palettes::COOL);
                Body::new(ctx.next_id(), pos, radius).with_velocity(vel).with_color(color)
            })
            .collect()
    }

    fn apply(&self, body: &mut Body, ctx: &mut FieldContext<'_>, dt: f32) {
        let center = ctx.input.pointer().unwrap_or_else(|| ctx.arena.bounds().center());
        body.vel += swirl_accel(body.pos, center, SWIRL_ACCEL, PULL_ACCEL, FALLOFF) * dt;
        body.vel = clamp_speed(drag(body.vel, DRAG, dt), MAX_SPEED);
    }
}

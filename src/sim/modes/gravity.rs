//! Gravity well: bodies rain in from above and pile up on the floor

use glam::Vec2;
use rand::Rng;

use super::{FieldContext, ForceField, SeedContext, drag, palettes, random_span};
use crate::consts::{DIST_EPSILON, GRAVITY_ACCEL};
use crate::sim::body::Body;

/// Light air drag so tall piles do not keep sloshing
const AIR_DRAG: f32 = 0.05;
/// Exponent of the pointer repulsion falloff
const REPEL_FALLOFF_EXP: f32 = 1.5;
/// Spawn band above the arena, as a fraction of its height
const SPAWN_BAND: f32 = 0.5;
const MAX_SPAWN_BAND: f32 = 200.0;
const SPAWN_SPEED_MIN: f32 = 50.0;
const SPAWN_SPEED_MAX: f32 = 100.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct GravityField;

impl ForceField for GravityField {
    fn seed(&mut self, ctx: &mut SeedContext<'_>) -> Vec<Body> {
        let count = ctx.config.counts.gravity;
        let bounds = ctx.arena.bounds();
        let inner = ctx.arena.corner_radius.min(bounds.width() * 0.25);
        let (left, right) = (bounds.min.x + inner, bounds.max.x - inner);
        let band = (bounds.height() * SPAWN_BAND).min(MAX_SPAWN_BAND);

        // Stratified columns keep the initial fall from stacking into one tower
        let slot = (right - left) / count.max(1) as f32;
        let mut bodies = Vec::with_capacity(count);
        for i in 0..count {
            let radius = ctx.random_radius();
            let jitter = (slot * 0.5 - radius).max(0.0);
            let center = left + (i as f32 + 0.5) * slot;
            let x = center + random_span(ctx.rng, -jitter, jitter);
            let y = bounds.min.y - radius - random_span(ctx.rng, 0.0, band);
            let vy = ctx.rng.random_range(SPAWN_SPEED_MIN..SPAWN_SPEED_MAX);
            let id = ctx.next_id();
            let color = ctx.pick_color(&palettes::WARM);
            bodies.push(
                Body::new(id, Vec2::new(x, y), radius)
                    .with_velocity(Vec2::new(0.0, vy))
                    .with_color(color),
            );
        }
        bodies
    }

    fn apply(&self, body: &mut Body, ctx: &mut FieldContext<'_>, dt: f32) {
        if ctx.params.gravity > 0.0 {
            body.vel.y += GRAVITY_ACCEL * ctx.params.gravity * dt;
        }

        let pointer = ctx.input.pointer().filter(|_| ctx.params.repulsion);
        if let Some(pointer) = pointer {
            let delta = body.pos - pointer;
            let dist = delta.length();
            let reach = ctx.config.repel_radius;
            if dist < reach {
                let dir = if dist > DIST_EPSILON { delta / dist } else { Vec2::NEG_Y };
                let falloff = (1.0 - dist / reach).powf(REPEL_FALLOFF_EXP);
                body.vel += dir * ctx.config.repel_strength * falloff * dt;
            }
        }

        body.vel = drag(body.vel, AIR_DRAG, dt);
    }
}

//! Swarm: bodies chase the pointer while keeping their distance

use glam::Vec2;
use rand::Rng;

use super::{FieldContext, ForceField, SeedContext, clamp_speed, drag, palettes, random_span};
use crate::consts::DIST_EPSILON;
use crate::sim::body::Body;

const SEEK_ACCEL: f32 = 420.0;
/// Seek strength ramps up linearly out to this distance
const SEEK_RANGE: f32 = 300.0;
/// Extra personal space on top of the two radii
const SEPARATION_EXTRA: f32 = 14.0;
const SEPARATION_STRENGTH: f32 = 9000.0;
/// Floor on the separation distance to keep the 1/d falloff bounded
const MIN_SEPARATION_DIST: f32 = 4.0;
const JITTER_ACCEL: f32 = 260.0;
const DRAG: f32 = 1.2;
const MAX_SPEED: f32 = 360.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct SwarmField;

impl ForceField for SwarmField {
    fn seed(&mut self, ctx: &mut SeedContext<'_>) -> Vec<Body> {
        let count = ctx.config.counts.swarm;
        let bounds = ctx.arena.bounds();
        (0..count)
            .map(|_| {
                let radius = ctx.random_radius();
                let pos = ctx.random_point(&bounds, radius);
                let vel = Vec2::new(random_span(ctx.rng, -60.0, 60.0), random_span(ctx.rng, -60.0, 60.0));
                let color = ctx.pick_color(&palettes::COOL);
                Body::new(ctx.next_id(), pos, radius).with_velocity(vel).with_color(color)
            })
            .collect()
    }

    fn apply(&self, body: &mut Body, ctx: &mut FieldContext<'_>, dt: f32) {
        let target = ctx.input.pointer().unwrap_or_else(|| ctx.arena.bounds().center());
        let to_target = target - body.pos;
        let dist = to_target.length();
        if dist > DIST_EPSILON {
            let ramp = (dist / SEEK_RANGE).min(1.0);
            body.vel += to_target / dist * SEEK_ACCEL * ramp * dt;
        }

        let reach = body.radius + ctx.config.max_radius + SEPARATION_EXTRA;
        ctx.hash.query(body.pos, reach, ctx.neighbors);
        for &j in ctx.neighbors.iter() {
            let Some(peer) = ctx.peers.get(j) else { continue };
            if peer.id == body.id {
                continue;
            }
            let away = body.pos - peer.pos;
            let d = away.length();
            let personal = body.radius + peer.radius + SEPARATION_EXTRA;
            if d >= personal {
                continue;
            }
            let dir = if d > DIST_EPSILON {
                away / d
            } else if body.id < peer.id {
                Vec2::NEG_X
            } else {
                Vec2::X
            };
            body.vel += dir * SEPARATION_STRENGTH / d.max(MIN_SEPARATION_DIST) * dt;
        }

        let jitter = Vec2::new(ctx.rng.random::<f32>() - 0.5, ctx.rng.random::<f32>() - 0.5) * 2.0;
        body.vel += jitter * JITTER_ACCEL * dt;
        body.vel = clamp_speed(drag(body.vel, DRAG, dt), MAX_SPEED);
    }
}

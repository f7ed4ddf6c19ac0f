//! Magnetic: charged bodies attract and repel by inverse square

use glam::Vec2;

use super::{FieldContext, ForceField, SeedContext, clamp_speed, drag, palettes};
use crate::sim::body::{Body, BodyKind};

const STRENGTH: f32 = 4.0e6;
/// Peers beyond this distance are ignored
const RANGE: f32 = 260.0;
/// Distance floor that bounds the inverse-square spike
const MIN_DIST: f32 = 12.0;
const DRAG: f32 = 0.6;
const MAX_SPEED: f32 = 420.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct MagneticField;

/// Acceleration on a body of charge `q` at `pos` from a peer of charge `peer_q` at `peer_pos`
pub(super) fn charge_accel(pos: Vec2, q: f32, peer_pos: Vec2, peer_q: f32) -> Vec2 {
    let toward = peer_pos - pos;
    let dist = toward.length().max(MIN_DIST);
    // Opposite charges attract (positive), like charges repel
    let sign = -(q * peer_q);
    toward / dist * sign * STRENGTH / (dist * dist)
}

impl ForceField for MagneticField {
    fn seed(&mut self, ctx: &mut SeedContext<'_>) -> Vec<Body> {
        let count = ctx.config.counts.magnetic;
        let bounds = ctx.arena.bounds();
        (0..count)
            .map(|i| {
                let radius = ctx.random_radius();
                let pos = ctx.random_point(&bounds, radius);
                let (charge, color) = if i % 2 == 0 {
                    (1.0, palettes::POSITIVE)
                } else {
                    (-1.0, palettes::NEGATIVE)
                };
                Body::new(ctx.next_id(), pos, radius)
                    .with_kind(BodyKind::Charged { charge })
                    .with_color(color)
            })
            .collect()
    }

    fn apply(&self, body: &mut Body, ctx: &mut FieldContext<'_>, dt: f32) {
        let BodyKind::Charged { charge } = body.kind else {
            body.vel = drag(body.vel, DRAG, dt);
            return;
        };
        ctx.hash.query(body.pos, RANGE, ctx.neighbors);
        let mut accel = Vec2::ZERO;
        for &j in ctx.neighbors.iter() {
            let Some(peer) = ctx.peers.get(j) else { continue };
            if peer.id == body.id || peer.charge == 0.0 {
                continue;
            }
            if peer.pos.distance_squared(body.pos) > RANGE * RANGE {
                continue;
            }
            accel += charge_accel(body.pos, charge, peer.pos, peer.charge);
        }
        body.vel += accel * dt;
        body.vel = clamp_speed(drag(body.vel, DRAG, dt), MAX_SPEED);
    }
}

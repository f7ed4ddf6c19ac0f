//! Ping-pong: bodies shuttle sideways, the pointer is a solid paddle

use glam::Vec2;
use rand::Rng;

use super::{FieldContext, ForceField, SeedContext, palettes, random_span};
use crate::consts::DIST_EPSILON;
use crate::sim::body::{Body, BodyKind};

const TARGET_SPEED_MIN: f32 = 220.0;
const TARGET_SPEED_MAX: f32 = 380.0;
/// Radius of the pointer obstacle
const PADDLE_RADIUS: f32 = 48.0;
/// How fast horizontal speed pulls back to the target (1/s)
const RENORMALIZE_RATE: f32 = 1.5;
const VERTICAL_DAMPING: f32 = 0.4;
/// Below this horizontal speed the direction is picked from the id
const MIN_HORIZONTAL: f32 = 1.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct PingPongField;

impl ForceField for PingPongField {
    fn seed(&mut self, ctx: &mut SeedContext<'_>) -> Vec<Body> {
        let count = ctx.config.counts.ping_pong;
        let bounds = ctx.arena.bounds();
        (0..count)
            .map(|_| {
                let radius = ctx.random_radius();
                let pos = ctx.random_point(&bounds, radius);
                let target = ctx.rng.random_range(TARGET_SPEED_MIN..TARGET_SPEED_MAX);
                let dir = if ctx.rng.random::<bool>() { 1.0 } else { -1.0 };
                let vel = Vec2::new(dir * target, random_span(ctx.rng, -60.0, 60.0));
                let color = ctx.pick_color(&palettes::WARM);
                Body::new(ctx.next_id(), pos, radius)
                    .with_velocity(vel)
                    .with_kind(BodyKind::PingPong { target_speed: target })
                    .with_color(color)
            })
            .collect()
    }

    fn apply(&self, body: &mut Body, ctx: &mut FieldContext<'_>, dt: f32) {
        body.vel.y *= (-VERTICAL_DAMPING * dt).exp();

        if let Some(pointer) = ctx.input.pointer() {
            bounce_off_paddle(body, pointer);
        }

        let target = match body.kind {
            BodyKind::PingPong { target_speed } => target_speed,
            _ => TARGET_SPEED_MIN,
        };
        let sign = if body.vel.x.abs() >= MIN_HORIZONTAL {
            body.vel.x.signum()
        } else if body.id % 2 == 0 {
            1.0
        } else {
            -1.0
        };
        let blend = (RENORMALIZE_RATE * dt).min(1.0);
        body.vel.x += (sign * target - body.vel.x) * blend;
    }
}

/// Push the body out of the paddle and reflect its approach velocity
fn bounce_off_paddle(body: &mut Body, paddle: Vec2) {
    let offset = body.pos - paddle;
    let dist = offset.length();
    let min_dist = PADDLE_RADIUS + body.radius;
    if dist >= min_dist {
        return;
    }
    let normal = if dist > DIST_EPSILON { offset / dist } else { Vec2::NEG_Y };
    body.pos = paddle + normal * min_dist;
    let vn = body.vel.dot(normal);
    if vn < 0.0 {
        body.vel -= 2.0 * vn * normal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paddle_reflects_elastically() {
        let mut body = Body::new(0, Vec2::new(140.0, 100.0), 10.0).with_velocity(Vec2::new(-300.0, 0.0));
        bounce_off_paddle(&mut body, Vec2::new(100.0, 100.0));
        assert!((body.pos.x - 158.0).abs() < 1e-4);
        assert!((body.vel.x - 300.0).abs() < 1e-4);
        assert!((body.speed() - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_receding_body_keeps_velocity() {
        let mut body = Body::new(0, Vec2::new(140.0, 100.0), 10.0).with_velocity(Vec2::new(300.0, 0.0));
        bounce_off_paddle(&mut body, Vec2::new(100.0, 100.0));
        assert_eq!(body.vel, Vec2::new(300.0, 0.0));
    }
}

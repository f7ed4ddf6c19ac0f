//! Bubbles: buoyant bodies that wobble upward, pop near the top and are
//! recycled in place at the bottom

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::{FieldContext, ForceField, SeedContext, drag, palettes, random_span};
use crate::consts::DIST_EPSILON;
use crate::sim::body::{Body, BodyKind, mass_for_radius};
use crate::sim::boundary::Rect;
use crate::smoothstep;

const BUOYANCY: f32 = 220.0;
const DRAG: f32 = 1.6;
const RISE_SPEED_MIN: f32 = 60.0;
const RISE_SPEED_MAX: f32 = 140.0;
/// Wobble frequency range (Hz)
const WOBBLE_FREQ_MIN: f32 = 0.25;
const WOBBLE_FREQ_MAX: f32 = 0.6;
const WOBBLE_AMP_MIN: f32 = 40.0;
const WOBBLE_AMP_MAX: f32 = 90.0;
/// Soft obstacle around the cursor
const CURSOR_RADIUS: f32 = 60.0;
const CURSOR_PUSH: f32 = 2200.0;
const SPAWN_TIME: f32 = 0.6;
const DISSIPATE_TIME: f32 = 0.5;
/// Bubbles start popping once their top is this close to the arena top
const DISSIPATE_ZONE: f32 = 60.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct BubbleField;

fn random_bubble_kind(rng: &mut rand_pcg::Pcg32, spawn: f32) -> BodyKind {
    BodyKind::Bubble {
        wobble_phase: rng.random_range(0.0..TAU),
        wobble_freq: rng.random_range(WOBBLE_FREQ_MIN..WOBBLE_FREQ_MAX) * TAU,
        wobble_amp: rng.random_range(WOBBLE_AMP_MIN..WOBBLE_AMP_MAX),
        rise_speed: rng.random_range(RISE_SPEED_MIN..RISE_SPEED_MAX),
        spawn,
        dissipate: 0.0,
    }
}

/// Reset a popped bubble at the bottom with fresh properties, keeping its id
fn recycle(body: &mut Body, ctx: &mut FieldContext<'_>) {
    let bounds: Rect = ctx.arena.bounds();
    let (lo, hi) = (ctx.config.min_radius, ctx.config.max_radius);
    let base = random_span(ctx.rng, lo, hi.max(lo));
    body.base_radius = base;
    body.mass = mass_for_radius(base);
    body.set_radius(0.0);
    body.pos = Vec2::new(
        random_span(ctx.rng, bounds.min.x + base, bounds.max.x - base),
        bounds.max.y - base,
    );
    body.vel = Vec2::new(0.0, -ctx.rng.random::<f32>() * 20.0);
    body.angular_vel = 0.0;
    body.squash = 0.0;
    body.alpha = 0.0;
    body.kind = random_bubble_kind(ctx.rng, 0.0);
    body.color = palettes::WATER[ctx.rng.random_range(0..palettes::WATER.len())];
}

impl ForceField for BubbleField {
    fn seed(&mut self, ctx: &mut SeedContext<'_>) -> Vec<Body> {
        let count = ctx.config.counts.bubbles;
        let bounds = ctx.arena.bounds();
        (0..count)
            .map(|_| {
                let radius = ctx.random_radius();
                let pos = ctx.random_point(&bounds, radius);
                // Staggered spawn progress so the first frame is not uniform
                let spawn = ctx.rng.random::<f32>();
                let kind = random_bubble_kind(ctx.rng, spawn);
                let color = ctx.pick_color(&palettes::WATER);
                let mut body = Body::new(ctx.next_id(), pos, radius).with_kind(kind).with_color(color);
                body.set_radius(radius * smoothstep(spawn));
                body.alpha = smoothstep(spawn);
                body
            })
            .collect()
    }

    fn apply(&self, body: &mut Body, ctx: &mut FieldContext<'_>, dt: f32) {
        let BodyKind::Bubble {
            mut wobble_phase,
            wobble_freq,
            wobble_amp,
            rise_speed,
            mut spawn,
            mut dissipate,
        } = body.kind
        else {
            return;
        };

        wobble_phase = (wobble_phase + wobble_freq * dt) % TAU;
        body.vel.y -= BUOYANCY * dt;
        body.vel.x += wobble_phase.cos() * wobble_amp * dt;

        if let Some(pointer) = ctx.input.pointer() {
            let away = body.pos - pointer;
            let dist = away.length();
            let reach = CURSOR_RADIUS + body.radius;
            if dist < reach && dist > DIST_EPSILON {
                body.vel += away / dist * CURSOR_PUSH * (1.0 - dist / reach) * dt;
            }
        }

        body.vel = drag(body.vel, DRAG, dt);
        body.vel.y = body.vel.y.max(-rise_speed);

        spawn = (spawn + dt / SPAWN_TIME).min(1.0);
        let top = ctx.arena.bounds().min.y;
        if dissipate > 0.0 || body.pos.y - body.radius < top + DISSIPATE_ZONE {
            dissipate = (dissipate + dt / DISSIPATE_TIME).min(1.0);
        }

        if dissipate >= 1.0 {
            recycle(body, ctx);
            return;
        }

        let scale = smoothstep(spawn) * (1.0 - smoothstep(dissipate));
        body.set_radius(body.base_radius * scale);
        body.alpha = smoothstep(spawn) * (1.0 - dissipate);
        body.kind = BodyKind::Bubble {
            wobble_phase,
            wobble_freq,
            wobble_amp,
            rise_speed,
            spawn,
            dissipate,
        };
    }
}

//! Kaleidoscope: slow organic wander that fades in when the pointer goes
//! quiet, and a gentle swirl around the pointer while it moves

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;

use super::vortex::swirl_accel;
use super::{FieldContext, ForceField, FrameContext, SeedContext, drag, palettes};
use crate::heading_vector;
use crate::sim::body::{Body, BodyKind};
use crate::smoothstep;

/// Ball spacing while this mode is active
pub const SPACING_OVERRIDE: f32 = 3.0;
/// Pointer idle time before the wander starts blending in
const IDLE_DELAY: f32 = 1.5;
/// Blend change per second
const BLEND_RATE: f32 = 0.8;
const SWIRL_ACCEL: f32 = 600.0;
const PULL_ACCEL: f32 = 180.0;
const FALLOFF: f32 = 240.0;
const WANDER_FREQ: f32 = 0.35;
const WANDER_ACCEL: f32 = 140.0;
/// Spring toward the arena centre while idle (1/s²)
const CENTER_PULL: f32 = 0.6;
const MAX_SPEED: f32 = 240.0;
/// Fraction of the excess speed removed per frame
const SOFT_CLAMP: f32 = 0.15;
const DRAG: f32 = 0.9;

#[derive(Debug, Clone, Default)]
pub struct KaleidoscopeField {
    /// 0 = pointer-driven, 1 = fully idle
    idle_blend: f32,
}

impl KaleidoscopeField {
    pub fn idle_blend(&self) -> f32 {
        self.idle_blend
    }
}

impl ForceField for KaleidoscopeField {
    fn seed(&mut self, ctx: &mut SeedContext<'_>) -> Vec<Body> {
        self.idle_blend = 1.0;
        let count = ctx.config.counts.kaleidoscope;
        let bounds = ctx.arena.bounds();
        (0..count)
            .map(|_| {
                let radius = ctx.random_radius();
                let pos = ctx.random_point(&bounds, radius);
                let phase = ctx.rng.random_range(0.0..TAU);
                let color = ctx.pick_color(&palettes::COOL);
                Body::new(ctx.next_id(), pos, radius)
                    .with_kind(BodyKind::Drifter { phase })
                    .with_color(color)
            })
            .collect()
    }

    fn apply(&self, body: &mut Body, ctx: &mut FieldContext<'_>, dt: f32) {
        let idle = smoothstep(self.idle_blend);
        let active = 1.0 - idle;

        let pointer = ctx.input.pointer().filter(|_| active > 0.0);
        if let Some(pointer) = pointer {
            body.vel += swirl_accel(body.pos, pointer, SWIRL_ACCEL, PULL_ACCEL, FALLOFF) * active * dt;
        }

        if idle > 0.0 {
            let phase = match body.kind {
                BodyKind::Drifter { phase } => phase,
                _ => 0.0,
            };
            let t = ctx.time * WANDER_FREQ;
            let heading = phase + (t + phase).sin() * PI + (t * 0.37 + phase * 1.7).sin() * 0.5 * PI;
            body.vel += heading_vector(heading) * WANDER_ACCEL * idle * dt;
            let to_center = ctx.arena.bounds().center() - body.pos;
            body.vel += to_center * CENTER_PULL * idle * dt;
        }

        body.vel = drag(body.vel, DRAG, dt);
        let speed = body.speed();
        if speed > MAX_SPEED {
            body.vel *= 1.0 - SOFT_CLAMP * (1.0 - MAX_SPEED / speed);
        }
    }

    fn frame_update(&mut self, ctx: &FrameContext<'_>, dt: f32) {
        let target = if ctx.input.pointer_active && ctx.input.idle_secs < IDLE_DELAY {
            0.0
        } else {
            1.0
        };
        let step = BLEND_RATE * dt;
        self.idle_blend += (target - self.idle_blend).clamp(-step, step);
    }
}

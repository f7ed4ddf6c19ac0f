//! Water: heavy damping, ambient drift and expanding ripples

use std::f32::consts::TAU;

use glam::Vec2;

use super::{FieldContext, ForceField, FrameContext, SeedContext, drag, palettes, random_span};
use crate::consts::DIST_EPSILON;
use crate::sim::body::Body;

const DRAG: f32 = 2.5;
/// Weak downward pull so bodies slowly sink
const SINK_ACCEL: f32 = 60.0;
const DRIFT_ACCEL: f32 = 40.0;
const DRIFT_FREQ: f32 = 0.6;
const DRIFT_WAVELENGTH: f32 = 180.0;

const RIPPLE_SPEED: f32 = 260.0;
/// Half-width of the annulus a ripple pushes on
const RIPPLE_WIDTH: f32 = 36.0;
const RIPPLE_DECAY: f32 = 1.4;
const RIPPLE_MIN_STRENGTH: f32 = 5.0;
const MAX_RIPPLES: usize = 8;
/// Pointer-movement ripples are rate limited in time and distance
const RIPPLE_INTERVAL: f32 = 0.12;
const RIPPLE_SPACING: f32 = 40.0;
const RIPPLE_MOVE_STRENGTH: f32 = 900.0;
/// Pointer counts as moving while idle time is below this
const MOVING_IDLE_SECS: f32 = 0.1;

/// An expanding ring impulse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    pub origin: Vec2,
    pub radius: f32,
    pub strength: f32,
}

#[derive(Debug, Clone, Default)]
pub struct WaterField {
    ripples: Vec<Ripple>,
    since_spawn: f32,
    last_origin: Option<Vec2>,
}

impl WaterField {
    pub fn ripples(&self) -> &[Ripple] {
        &self.ripples
    }

    /// Start a ripple at `origin`, evicting the oldest when full
    pub fn spawn_ripple(&mut self, origin: Vec2, strength: f32) {
        if self.ripples.len() >= MAX_RIPPLES {
            self.ripples.remove(0);
        }
        log::debug!("Ripple at ({:.0}, {:.0}) strength {:.0}", origin.x, origin.y, strength);
        self.ripples.push(Ripple { origin, radius: 0.0, strength });
        self.since_spawn = 0.0;
        self.last_origin = Some(origin);
    }
}

impl ForceField for WaterField {
    fn seed(&mut self, ctx: &mut SeedContext<'_>) -> Vec<Body> {
        self.ripples.clear();
        self.since_spawn = 0.0;
        self.last_origin = None;

        let count = ctx.config.counts.water;
        let bounds = ctx.arena.bounds();
        (0..count)
            .map(|_| {
                let radius = ctx.random_radius();
                let pos = ctx.random_point(&bounds, radius);
                let vel = Vec2::new(random_span(ctx.rng, -20.0, 20.0), random_span(ctx.rng, -20.0, 20.0));
                let color = ctx.pick_color(&palettes::WATER);
                Body::new(ctx.next_id(), pos, radius).with_velocity(vel).with_color(color)
            })
            .collect()
    }

    fn apply(&self, body: &mut Body, ctx: &mut FieldContext<'_>, dt: f32) {
        body.vel.y += SINK_ACCEL * dt;

        let phase = ctx.time * DRIFT_FREQ * TAU + body.pos.y / DRIFT_WAVELENGTH * TAU;
        body.vel.x += phase.sin() * DRIFT_ACCEL * dt;
        body.vel.y += (phase + body.pos.x / DRIFT_WAVELENGTH).cos() * DRIFT_ACCEL * 0.5 * dt;

        for ripple in &self.ripples {
            let away = body.pos - ripple.origin;
            let dist = away.length();
            let band = (dist - ripple.radius).abs();
            if band >= RIPPLE_WIDTH || dist <= DIST_EPSILON {
                continue;
            }
            body.vel += away / dist * ripple.strength * (1.0 - band / RIPPLE_WIDTH) * dt;
        }

        body.vel = drag(body.vel, DRAG, dt);
    }

    fn frame_update(&mut self, ctx: &FrameContext<'_>, dt: f32) {
        let reach = ctx.arena.width.hypot(ctx.arena.height);
        let fade = (-RIPPLE_DECAY * dt).exp();
        for ripple in &mut self.ripples {
            ripple.radius += RIPPLE_SPEED * dt;
            ripple.strength *= fade;
        }
        self.ripples
            .retain(|r| r.strength > RIPPLE_MIN_STRENGTH && r.radius < reach);

        self.since_spawn += dt;
        let Some(pointer) = ctx.input.pointer() else {
            return;
        };
        let due = match self.last_origin {
            None => true,
            Some(last) => self.since_spawn >= RIPPLE_INTERVAL && last.distance(pointer) >= RIPPLE_SPACING,
        };
        if ctx.input.idle_secs < MOVING_IDLE_SECS && due {
            self.spawn_ripple(pointer, RIPPLE_MOVE_STRENGTH);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::WallConfig;
    use crate::sim::boundary::Arena;
    use crate::sim::tick::TickInput;

    #[test]
    fn test_ripples_expand_fade_and_expire() {
        let arena = Arena::new(800.0, 600.0, &WallConfig::default());
        let input = TickInput::default();
        let ctx = FrameContext { input: &input, arena: &arena, time: 0.0 };
        let mut water = WaterField::default();
        water.spawn_ripple(Vec2::new(400.0, 300.0), 900.0);
        water.frame_update(&ctx, 0.1);
        let r = water.ripples()[0];
        assert!((r.radius - RIPPLE_SPEED * 0.1).abs() < 1e-3);
        assert!(r.strength < 900.0);
        for _ in 0..100 {
            water.frame_update(&ctx, 0.1);
        }
        assert!(water.ripples().is_empty());
    }

    #[test]
    fn test_pointer_movement_is_rate_limited() {
        let arena = Arena::new(800.0, 600.0, &WallConfig::default());
        let mut water = WaterField::default();
        let mut input = TickInput { pointer: Vec2::new(100.0, 100.0), pointer_active: true, idle_secs: 0.0 };
        let dt = 1.0 / 60.0;
        for i in 0..6 {
            input.pointer.x = 100.0 + i as f32 * 50.0;
            let ctx = FrameContext { input: &input, arena: &arena, time: 0.0 };
            water.frame_update(&ctx, dt);
        }
        // First frame spawns immediately; the next needs RIPPLE_INTERVAL to pass
        assert_eq!(water.ripples().len(), 1);
    }

    #[test]
    fn test_ripple_cap_evicts_oldest() {
        let mut water = WaterField::default();
        for i in 0..(MAX_RIPPLES + 3) {
            water.spawn_ripple(Vec2::new(i as f32, 0.0), 100.0);
        }
        assert_eq!(water.ripples().len(), MAX_RIPPLES);
        assert_eq!(water.ripples()[0].origin.x, 3.0);
    }
}

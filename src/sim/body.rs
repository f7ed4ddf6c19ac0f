//! Body store: per-particle physical state

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{ANGULAR_DAMPING, BODY_DENSITY, MIN_MASS, MIN_RADIUS, SQUASH_DECAY};

/// Stable identifier for a body (survives recycling)
pub type BodyId = u32;

/// Mode-specific extension data
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum BodyKind {
    #[default]
    Plain,
    /// Magnetic mode: signed charge (+1 / -1)
    Charged { charge: f32 },
    /// Bubbles mode: wobble oscillator plus spawn/dissipate progress (0..1)
    Bubble {
        wobble_phase: f32,
        wobble_freq: f32,
        wobble_amp: f32,
        rise_speed: f32,
        spawn: f32,
        dissipate: f32,
    },
    /// Ping-pong mode: horizontal speed the body renormalizes toward
    PingPong { target_speed: f32 },
    /// Kaleidoscope mode: wander phase offset
    Drifter { phase: f32 },
}

/// A simulated circular particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Radius the body was seeded with
    pub base_radius: f32,
    /// Radius used for collision (differs from base while scaling in/out)
    pub radius: f32,
    pub mass: f32,
    /// Angular velocity (rad/s)
    pub angular_vel: f32,
    /// Accumulated rotation (radians, render only)
    pub rotation: f32,
    /// Squash amount 0..1 (render only)
    pub squash: f32,
    /// Direction of the squash axis (radians)
    pub squash_angle: f32,
    pub asleep: bool,
    /// Continuous resting time accumulated toward sleep
    pub sleep_timer: f32,
    pub color: [f32; 4],
    pub alpha: f32,
    pub kind: BodyKind,
}

impl Body {
    pub fn new(id: BodyId, pos: Vec2, radius: f32) -> Self {
        let radius = sanitize_radius(radius);
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            base_radius: radius,
            radius,
            mass: mass_for_radius(radius),
            angular_vel: 0.0,
            rotation: 0.0,
            squash: 0.0,
            squash_angle: 0.0,
            asleep: false,
            sleep_timer: 0.0,
            color: [1.0; 4],
            alpha: 1.0,
            kind: BodyKind::Plain,
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_kind(mut self, kind: BodyKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    /// Inverse mass, with mass clamped to a safe minimum
    #[inline]
    pub fn inv_mass(&self) -> f32 {
        1.0 / self.mass.max(MIN_MASS)
    }

    /// Set the collision radius (mass follows the base radius)
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = sanitize_radius(radius);
    }

    /// Wake the body and reset its rest timer
    #[inline]
    pub fn wake(&mut self) {
        self.asleep = false;
        self.sleep_timer = 0.0;
    }

    /// Put the body to sleep, zeroing all motion
    pub fn fall_asleep(&mut self) {
        self.asleep = true;
        self.vel = Vec2::ZERO;
        self.angular_vel = 0.0;
    }

    /// Advance position and rotation by `dt`, decaying squash and spin
    pub fn integrate(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.rotation = crate::normalize_angle(self.rotation + self.angular_vel * dt);
        self.angular_vel *= (-ANGULAR_DAMPING * dt).exp();
        self.decay_squash(dt);
    }

    /// Squash relaxes toward zero every tick
    pub fn decay_squash(&mut self, dt: f32) {
        self.squash *= (-SQUASH_DECAY * dt).exp();
        if self.squash < 1e-3 {
            self.squash = 0.0;
        }
    }

    /// Record an impact along `normal`; keeps the stronger squash
    pub fn apply_squash(&mut self, amount: f32, normal: Vec2) {
        if amount > self.squash {
            self.squash = amount;
            self.squash_angle = normal.y.atan2(normal.x);
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// Mass grows with area
#[inline]
pub fn mass_for_radius(radius: f32) -> f32 {
    (radius * radius * BODY_DENSITY).max(MIN_MASS)
}

#[inline]
fn sanitize_radius(radius: f32) -> f32 {
    if radius.is_finite() { radius.max(MIN_RADIUS) } else { MIN_RADIUS }
}

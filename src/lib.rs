//! Ballpit - a 2D ball physics playground
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bodies, collisions, rubber walls, modes, worms)
//! - `settings`: Data-driven configuration snapshot
//! - `audio`: Contact event dispatch to a collision sound sink
//! - `renderer`: Instance data for drawing the current frame

pub mod audio;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::SimConfig;
pub use sim::{ModeId, Simulation, TickInput};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame; leftover backlog is dropped
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Longest frame delta accepted from the host (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Downward acceleration at gravity multiplier 1.0 (px/s²)
    pub const GRAVITY_ACCEL: f32 = 1500.0;
    /// Mass per unit of squared radius
    pub const BODY_DENSITY: f32 = 0.01;
    /// Smallest radius a body may have after clamping
    pub const MIN_RADIUS: f32 = 1.0;
    /// Smallest mass a body may have after clamping
    pub const MIN_MASS: f32 = 0.001;
    /// Distances below this are treated as coincident
    pub const DIST_EPSILON: f32 = 1e-4;

    /// Normal speed mapped to impact 1.0 for contact events
    pub const IMPACT_REF_SPEED: f32 = 900.0;
    /// Per-second exponential decay of squash
    pub const SQUASH_DECAY: f32 = 12.0;
    /// Per-second exponential decay of angular velocity
    pub const ANGULAR_DAMPING: f32 = 1.5;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Hermite smoothstep of `x` clamped to [0, 1]
#[inline]
pub fn smoothstep(x: f32) -> f32 {
    let t = x.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Unit vector for an angle in radians
#[inline]
pub fn heading_vector(theta: f32) -> glam::Vec2 {
    glam::Vec2::new(theta.cos(), theta.sin())
}

//! Simulation configuration
//!
//! An immutable snapshot handed to the simulation at init and on every mode
//! switch. Loaded from JSON; out-of-range values are clamped, never rejected.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::MIN_RADIUS;
use crate::sim::ModeId;

/// Number of bodies (or organisms, for worms) seeded by each mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeCounts {
    pub gravity: usize,
    pub swarm: usize,
    pub water: usize,
    pub vortex: usize,
    pub ping_pong: usize,
    pub magnetic: usize,
    pub bubbles: usize,
    pub kaleidoscope: usize,
    pub worms: usize,
}

impl Default for ModeCounts {
    fn default() -> Self {
        Self {
            gravity: 150,
            swarm: 120,
            water: 100,
            vortex: 140,
            ping_pong: 24,
            magnetic: 80,
            bubbles: 60,
            kaleidoscope: 90,
            worms: 6,
        }
    }
}

impl ModeCounts {
    pub fn for_mode(&self, mode: ModeId) -> usize {
        match mode {
            ModeId::Gravity => self.gravity,
            ModeId::Swarm => self.swarm,
            ModeId::Water => self.water,
            ModeId::Vortex => self.vortex,
            ModeId::PingPong => self.ping_pong,
            ModeId::Magnetic => self.magnetic,
            ModeId::Bubbles => self.bubbles,
            ModeId::Kaleidoscope => self.kaleidoscope,
            ModeId::Worms => self.worms,
        }
    }
}

/// Arena geometry and rubber wall tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    /// Uniform inset shrinking the playable rectangle
    pub inset: f32,
    /// Radius of the rigid corner arcs
    pub corner_radius: f32,
    /// Segments per straight edge (ends are pinned)
    pub segments: usize,
    /// Spring constant pulling each segment back to rest
    pub stiffness: f32,
    /// Velocity damping of each segment
    pub damping: f32,
    /// Largest allowed deformation (px)
    pub max_deformation: f32,
    /// Gaussian spread of an impact, as a fraction of edge length
    pub impact_spread: f32,
    /// Segment velocity added by an impact of intensity 1.0
    pub impact_impulse: f32,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            inset: 4.0,
            corner_radius: 28.0,
            segments: 12,
            stiffness: 600.0,
            damping: 60.0,
            max_deformation: 18.0,
            impact_spread: 0.08,
            impact_impulse: 320.0,
        }
    }
}

/// Sleep/wake thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepConfig {
    /// Linear speed below which a body counts as resting (px/s)
    pub velocity_threshold: f32,
    /// Angular speed below which a body counts as resting (rad/s)
    pub angular_threshold: f32,
    /// Continuous rest required before sleeping (seconds)
    pub time_to_sleep: f32,
    /// Distance from the floor still counted as touching (px)
    pub floor_tolerance: f32,
    /// Pointer distance that wakes a sleeping body (px)
    pub wake_radius: f32,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: 15.0,
            angular_threshold: 0.5,
            time_to_sleep: 0.5,
            floor_tolerance: 1.0,
            wake_radius: 120.0,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Scales the gravity mode's downward acceleration
    pub gravity_multiplier: f32,
    /// Ball-ball restitution
    pub restitution: f32,
    /// Wall restitution for the rubber-wall boundary
    pub wall_restitution: f32,
    /// Normal speeds below this bounce with zero restitution (px/s)
    pub rest_velocity: f32,
    /// Tangential friction coefficient for contacts
    pub friction: f32,
    /// Extra gap kept between balls (px)
    pub ball_spacing: f32,
    /// Resolver iterations for the standard modes
    pub collision_iterations: u32,
    /// Fraction of penetration corrected per iteration
    pub correction_percent: f32,
    /// Penetration tolerated without correction (px)
    pub slop: f32,
    /// Smallest and largest seeded radius
    pub min_radius: f32,
    pub max_radius: f32,
    /// Pointer repulsion in gravity mode
    pub repel_radius: f32,
    pub repel_strength: f32,
    pub counts: ModeCounts,
    pub wall: WallConfig,
    pub sleep: SleepConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity_multiplier: 1.0,
            restitution: 0.69,
            wall_restitution: 0.5,
            rest_velocity: 40.0,
            friction: 0.05,
            ball_spacing: 0.0,
            collision_iterations: 8,
            correction_percent: 0.8,
            slop: 0.05,
            min_radius: 10.0,
            max_radius: 22.0,
            repel_radius: 140.0,
            repel_strength: 2600.0,
            counts: ModeCounts::default(),
            wall: WallConfig::default(),
            sleep: SleepConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse a (possibly partial) JSON config; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(|c| c.sanitized())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from a file, falling back to defaults on any failure
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Invalid config {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read config {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Clamp every value into a range the simulation can use
    pub fn sanitized(mut self) -> Self {
        self.gravity_multiplier = finite_or(self.gravity_multiplier, 1.0).max(0.0);
        self.restitution = finite_or(self.restitution, 0.69).clamp(0.0, 1.0);
        self.wall_restitution = finite_or(self.wall_restitution, 0.5).clamp(0.0, 1.0);
        self.rest_velocity = finite_or(self.rest_velocity, 40.0).max(0.0);
        self.friction = finite_or(self.friction, 0.05).clamp(0.0, 1.0);
        self.ball_spacing = finite_or(self.ball_spacing, 0.0).max(0.0);
        self.collision_iterations = self.collision_iterations.clamp(1, 32);
        self.correction_percent = finite_or(self.correction_percent, 0.8).clamp(0.0, 1.0);
        self.slop = finite_or(self.slop, 0.05).max(0.0);
        self.min_radius = finite_or(self.min_radius, 10.0).max(MIN_RADIUS);
        self.max_radius = finite_or(self.max_radius, 22.0).max(self.min_radius);
        self.repel_radius = finite_or(self.repel_radius, 140.0).max(0.0);
        self.repel_strength = finite_or(self.repel_strength, 2600.0).max(0.0);

        let wall = &mut self.wall;
        wall.inset = finite_or(wall.inset, 4.0).max(0.0);
        wall.corner_radius = finite_or(wall.corner_radius, 28.0).max(0.0);
        wall.segments = wall.segments.max(3);
        wall.stiffness = finite_or(wall.stiffness, 600.0).max(0.0);
        wall.damping = finite_or(wall.damping, 60.0).max(0.0);
        wall.max_deformation = finite_or(wall.max_deformation, 18.0).max(0.0);
        wall.impact_spread = finite_or(wall.impact_spread, 0.08).max(0.001);
        wall.impact_impulse = finite_or(wall.impact_impulse, 320.0).max(0.0);

        let sleep = &mut self.sleep;
        sleep.velocity_threshold = finite_or(sleep.velocity_threshold, 15.0).max(0.0);
        sleep.angular_threshold = finite_or(sleep.angular_threshold, 0.5).max(0.0);
        sleep.time_to_sleep = finite_or(sleep.time_to_sleep, 0.5).max(0.0);
        sleep.floor_tolerance = finite_or(sleep.floor_tolerance, 1.0).max(0.0);
        sleep.wake_radius = finite_or(sleep.wake_radius, 120.0).max(0.0);
        self
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

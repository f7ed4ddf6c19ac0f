//! Mode force-field library
//!
//! Each simulation mode is a variant of [`Mode`] carrying its own runtime
//! state. A variant seeds the body set, applies its force field per body,
//! runs once-per-frame extras and picks its resolver and boundary tuning.

mod bubbles;
mod gravity;
mod kaleidoscope;
mod magnetic;
mod pingpong;
mod swarm;
mod vortex;
mod water;

pub use bubbles::BubbleField;
pub use gravity::GravityField;
pub use kaleidoscope::KaleidoscopeField;
pub use magnetic::MagneticField;
pub use pingpong::PingPongField;
pub use swarm::SwarmField;
pub use vortex::VortexField;
pub use water::{Ripple, WaterField};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyId};
use super::boundary::{Arena, BoundaryPolicy, Rect};
use super::collision::SolverParams;
use super::spatial::SpatialHash;
use super::tick::TickInput;
use super::worms::WormWorld;
use crate::settings::SimConfig;

/// Mode identifiers, in menu order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ModeId {
    #[default]
    Gravity,
    Swarm,
    Water,
    Vortex,
    PingPong,
    Magnetic,
    Bubbles,
    Kaleidoscope,
    Worms,
}

impl ModeId {
    pub const ALL: [ModeId; 9] = [
        ModeId::Gravity,
        ModeId::Swarm,
        ModeId::Water,
        ModeId::Vortex,
        ModeId::PingPong,
        ModeId::Magnetic,
        ModeId::Bubbles,
        ModeId::Kaleidoscope,
        ModeId::Worms,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeId::Gravity => "gravity",
            ModeId::Swarm => "swarm",
            ModeId::Water => "water",
            ModeId::Vortex => "vortex",
            ModeId::PingPong => "ping-pong",
            ModeId::Magnetic => "magnetic",
            ModeId::Bubbles => "bubbles",
            ModeId::Kaleidoscope => "kaleidoscope",
            ModeId::Worms => "worms",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gravity" | "balls" => Some(ModeId::Gravity),
            "swarm" => Some(ModeId::Swarm),
            "water" => Some(ModeId::Water),
            "vortex" => Some(ModeId::Vortex),
            "ping-pong" | "pingpong" | "pong" => Some(ModeId::PingPong),
            "magnetic" | "magnets" => Some(ModeId::Magnetic),
            "bubbles" => Some(ModeId::Bubbles),
            "kaleidoscope" | "kaleido" => Some(ModeId::Kaleidoscope),
            "worms" => Some(ModeId::Worms),
            _ => None,
        }
    }
}

/// Physics switches owned by the active mode, reset on every switch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsParams {
    /// Gravity multiplier (0 disables gravity)
    pub gravity: f32,
    /// Pointer repulsion enabled
    pub repulsion: bool,
    /// Gap kept between ball surfaces
    pub spacing: f32,
}

impl PhysicsParams {
    pub fn for_mode(id: ModeId, config: &SimConfig, spacing: f32) -> Self {
        match id {
            ModeId::Gravity => Self {
                gravity: config.gravity_multiplier,
                repulsion: true,
                spacing,
            },
            ModeId::Kaleidoscope => Self {
                gravity: 0.0,
                repulsion: false,
                spacing: kaleidoscope::SPACING_OVERRIDE,
            },
            _ => Self {
                gravity: 0.0,
                repulsion: false,
                spacing,
            },
        }
    }
}

/// Snapshot of a neighbour, taken before forces mutate the body set
#[derive(Debug, Clone, Copy)]
pub struct Peer {
    pub id: BodyId,
    pub pos: Vec2,
    pub radius: f32,
    pub charge: f32,
}

impl Peer {
    pub fn of(body: &Body) -> Self {
        let charge = match body.kind {
            super::body::BodyKind::Charged { charge } => charge,
            _ => 0.0,
        };
        Self { id: body.id, pos: body.pos, radius: body.radius, charge }
    }
}

/// Everything a force field may read while updating one body
pub struct FieldContext<'a> {
    pub input: &'a TickInput,
    pub arena: &'a Arena,
    pub config: &'a SimConfig,
    pub params: &'a PhysicsParams,
    pub time: f32,
    pub rng: &'a mut Pcg32,
    /// Peer snapshot, indexed like the spatial hash
    pub peers: &'a [Peer],
    pub hash: &'a SpatialHash,
    pub neighbors: &'a mut Vec<usize>,
}

/// Inputs for the once-per-frame extras
pub struct FrameContext<'a> {
    pub input: &'a TickInput,
    pub arena: &'a Arena,
    pub time: f32,
}

/// Inputs for seeding a mode's body set
pub struct SeedContext<'a> {
    pub arena: &'a Arena,
    pub config: &'a SimConfig,
    pub rng: &'a mut Pcg32,
    pub next_id: &'a mut BodyId,
}

impl SeedContext<'_> {
    pub fn next_id(&mut self) -> BodyId {
        let id = *self.next_id;
        *self.next_id += 1;
        id
    }

    pub fn random_radius(&mut self) -> f32 {
        let (lo, hi) = (self.config.min_radius, self.config.max_radius);
        if hi > lo { self.rng.random_range(lo..hi) } else { lo }
    }

    /// Uniform point inside `rect`, keeping `margin` from the edges
    pub fn random_point(&mut self, rect: &Rect, margin: f32) -> Vec2 {
        Vec2::new(
            random_span(self.rng, rect.min.x + margin, rect.max.x - margin),
            random_span(self.rng, rect.min.y + margin, rect.max.y - margin),
        )
    }

    pub fn pick_color(&mut self, palette: &[[f32; 4]]) -> [f32; 4] {
        if palette.is_empty() {
            return [1.0; 4];
        }
        palette[self.rng.random_range(0..palette.len())]
    }
}

/// Uniform sample in [lo, hi), or the midpoint when the span is empty
pub fn random_span(rng: &mut Pcg32, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { 0.5 * (lo + hi) }
}

/// Scale `vel` down to `max_speed` if it exceeds it
#[inline]
pub fn clamp_speed(vel: Vec2, max_speed: f32) -> Vec2 {
    let speed_sq = vel.length_squared();
    if speed_sq > max_speed * max_speed {
        vel * (max_speed / speed_sq.sqrt())
    } else {
        vel
    }
}

/// Frame-rate independent linear drag
#[inline]
pub fn drag(vel: Vec2, rate: f32, dt: f32) -> Vec2 {
    vel * (-rate * dt).exp()
}

/// Behaviour every body-based mode supplies
pub trait ForceField {
    /// Build a fresh body set for this mode
    fn seed(&mut self, ctx: &mut SeedContext<'_>) -> Vec<Body>;

    /// Apply this mode's forces to one awake body
    fn apply(&self, body: &mut Body, ctx: &mut FieldContext<'_>, dt: f32);

    /// Once-per-frame extras, run with the rendered delta
    fn frame_update(&mut self, _ctx: &FrameContext<'_>, _dt: f32) {}
}

/// Body palettes
pub mod palettes {
    pub const WARM: [[f32; 4]; 5] = [
        [0.96, 0.42, 0.31, 1.0],
        [0.98, 0.70, 0.28, 1.0],
        [0.93, 0.33, 0.48, 1.0],
        [0.99, 0.85, 0.45, 1.0],
        [0.85, 0.25, 0.25, 1.0],
    ];
    pub const COOL: [[f32; 4]; 4] = [
        [0.30, 0.62, 0.95, 1.0],
        [0.35, 0.85, 0.85, 1.0],
        [0.55, 0.45, 0.95, 1.0],
        [0.80, 0.90, 1.00, 1.0],
    ];
    pub const WATER: [[f32; 4]; 3] = [
        [0.20, 0.55, 0.85, 1.0],
        [0.30, 0.75, 0.90, 1.0],
        [0.75, 0.92, 0.98, 1.0],
    ];
    pub const POSITIVE: [f32; 4] = [0.92, 0.30, 0.30, 1.0];
    pub const NEGATIVE: [f32; 4] = [0.75, 0.78, 0.85, 1.0];
}

/// The active mode and its runtime state
#[derive(Debug)]
pub enum Mode {
    Gravity(GravityField),
    Swarm(SwarmField),
    Water(WaterField),
    Vortex(VortexField),
    PingPong(PingPongField),
    Magnetic(MagneticField),
    Bubbles(BubbleField),
    Kaleidoscope(KaleidoscopeField),
    Worms(WormWorld),
}

macro_rules! with_field {
    ($mode:expr, $f:ident => $body:expr, worms => $worms:expr) => {
        match $mode {
            Mode::Gravity($f) => $body,
            Mode::Swarm($f) => $body,
            Mode::Water($f) => $body,
            Mode::Vortex($f) => $body,
            Mode::PingPong($f) => $body,
            Mode::Magnetic($f) => $body,
            Mode::Bubbles($f) => $body,
            Mode::Kaleidoscope($f) => $body,
            Mode::Worms(_) => $worms,
        }
    };
}

impl Mode {
    /// Fresh, unseeded state for `id`
    pub fn new(id: ModeId) -> Self {
        match id {
            ModeId::Gravity => Mode::Gravity(GravityField),
            ModeId::Swarm => Mode::Swarm(SwarmField),
            ModeId::Water => Mode::Water(WaterField::default()),
            ModeId::Vortex => Mode::Vortex(VortexField),
            ModeId::PingPong => Mode::PingPong(PingPongField),
            ModeId::Magnetic => Mode::Magnetic(MagneticField),
            ModeId::Bubbles => Mode::Bubbles(BubbleField),
            ModeId::Kaleidoscope => Mode::Kaleidoscope(KaleidoscopeField::default()),
            ModeId::Worms => Mode::Worms(WormWorld::default()),
        }
    }

    pub fn id(&self) -> ModeId {
        match self {
            Mode::Gravity(_) => ModeId::Gravity,
            Mode::Swarm(_) => ModeId::Swarm,
            Mode::Water(_) => ModeId::Water,
            Mode::Vortex(_) => ModeId::Vortex,
            Mode::PingPong(_) => ModeId::PingPong,
            Mode::Magnetic(_) => ModeId::Magnetic,
            Mode::Bubbles(_) => ModeId::Bubbles,
            Mode::Kaleidoscope(_) => ModeId::Kaleidoscope,
            Mode::Worms(_) => ModeId::Worms,
        }
    }

    /// Seed the body set (worms build their own segment buffers instead)
    pub fn seed(&mut self, ctx: &mut SeedContext<'_>) -> Vec<Body> {
        let count = ctx.config.counts.for_mode(self.id());
        with_field!(self, f => f.seed(ctx), worms => {
            if let Mode::Worms(world) = self {
                *world = WormWorld::spawn(count, &ctx.arena.bounds(), ctx.rng);
            }
            Vec::new()
        })
    }

    pub fn apply_forces(&self, body: &mut Body, ctx: &mut FieldContext<'_>, dt: f32) {
        with_field!(self, f => f.apply(body, ctx, dt), worms => {})
    }

    pub fn frame_update(&mut self, ctx: &FrameContext<'_>, dt: f32) {
        with_field!(self, f => f.frame_update(ctx, dt), worms => {})
    }

    /// Sleep bookkeeping only runs for the gravity well
    pub fn uses_sleep(&self) -> bool {
        matches!(self, Mode::Gravity(_))
    }

    /// Kaleidoscope and worms integrate once per render call
    pub fn uses_fixed_step(&self) -> bool {
        !matches!(self, Mode::Kaleidoscope(_) | Mode::Worms(_))
    }

    /// Swarm and magnetic forces read their neighbours
    pub fn needs_peers(&self) -> bool {
        matches!(self, Mode::Swarm(_) | Mode::Magnetic(_))
    }

    pub fn solver_params(&self, config: &SimConfig, params: &PhysicsParams) -> SolverParams {
        let base = SolverParams {
            iterations: config.collision_iterations,
            correction_percent: config.correction_percent,
            slop: config.slop,
            restitution: config.restitution,
            rest_velocity: config.rest_velocity,
            friction: config.friction,
            spacing: params.spacing,
            ..SolverParams::default()
        };
        match self {
            Mode::Gravity(_) | Mode::Vortex(_) => base,
            Mode::Swarm(_) | Mode::Water(_) | Mode::Magnetic(_) => SolverParams { iterations: 6, ..base },
            Mode::PingPong(_) => SolverParams {
                iterations: 6,
                restitution: 1.0,
                rest_velocity: 0.0,
                friction: 0.0,
                ..base
            },
            Mode::Bubbles(_) => SolverParams { iterations: 6, restitution: 0.3, ..base },
            Mode::Kaleidoscope(_) => SolverParams { iterations: 6, ..base }.soft(false),
            Mode::Worms(_) => SolverParams { iterations: 0, ..base },
        }
    }

    pub fn boundary_policy(&self, config: &SimConfig) -> BoundaryPolicy {
        let rubber = |restitution: f32, open_top: bool| BoundaryPolicy::RubberWalls { restitution, open_top };
        match self {
            Mode::Gravity(_) => rubber(config.wall_restitution, true),
            Mode::Swarm(_) | Mode::Vortex(_) | Mode::Magnetic(_) => rubber(config.wall_restitution, false),
            Mode::Water(_) => rubber(0.2, false),
            Mode::PingPong(_) => rubber(1.0, false),
            Mode::Bubbles(_) => rubber(0.3, true),
            Mode::Kaleidoscope(_) | Mode::Worms(_) => BoundaryPolicy::Simple { restitution: 0.3 },
        }
    }

    pub fn worms(&self) -> Option<&WormWorld> {
        match self {
            Mode::Worms(world) => Some(world),
            _ => None,
        }
    }

    pub fn worms_mut(&mut self) -> Option<&mut WormWorld> {
        match self {
            Mode::Worms(world) => Some(world),
            _ => None,
        }
    }

    pub fn water_mut(&mut self) -> Option<&mut WaterField> {
        match self {
            Mode::Water(water) => Some(water),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_id_round_trip() {
        for id in ModeId::ALL {
            assert_eq!(ModeId::from_str(id.as_str()), Some(id));
            assert_eq!(Mode::new(id).id(), id);
        }
        assert_eq!(ModeId::from_str("PONG"), Some(ModeId::PingPong));
        assert_eq!(ModeId::from_str("nope"), None);
    }

    #[test]
    fn test_only_gravity_sleeps_and_opens_top() {
        let config = SimConfig::default();
        for id in ModeId::ALL {
            let mode = Mode::new(id);
            assert_eq!(mode.uses_sleep(), id == ModeId::Gravity);
            let open = matches!(
                mode.boundary_policy(&config),
                BoundaryPolicy::RubberWalls { open_top: true, .. }
            );
            assert_eq!(open, matches!(id, ModeId::Gravity | ModeId::Bubbles));
        }
    }

    #[test]
    fn test_kaleidoscope_uses_soft_silent_solver() {
        let config = SimConfig::default();
        let mode = Mode::new(ModeId::Kaleidoscope);
        let params = PhysicsParams::for_mode(ModeId::Kaleidoscope, &config, 0.0);
        let solver = mode.solver_params(&config, &params);
        assert!(solver.max_correction.is_some());
        assert!(!solver.emit_contacts);
        assert!(!mode.uses_fixed_step());
        assert_eq!(solver.spacing, kaleidoscope::SPACING_OVERRIDE);
    }

    #[test]
    fn test_switch_tears_down_gravity_flags() {
        let config = SimConfig::default();
        let gravity = PhysicsParams::for_mode(ModeId::Gravity, &config, 0.0);
        assert!(gravity.repulsion && gravity.gravity > 0.0);
        let swarm = PhysicsParams::for_mode(ModeId::Swarm, &config, 0.0);
        assert!(!swarm.repulsion);
        assert_eq!(swarm.gravity, 0.0);
    }
}

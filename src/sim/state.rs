//! Simulation context
//!
//! Sole owner of all mutable simulation state: bodies, walls, the active
//! mode, scratch buffers and timing. The scheduler in `tick` is the single
//! writer; renderers and the sound dispatcher read between frames.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::body::{Body, BodyId};
use super::boundary::{Arena, BoundaryPolicy};
use super::collision::ContactEvent;
use super::modes::{Mode, ModeId, Peer, PhysicsParams, SeedContext};
use super::spatial::{CollisionPair, SpatialHash};
use super::wall::{Edge, RubberWalls};
use super::worms::WormWorld;
use crate::consts::DIST_EPSILON;
use crate::settings::SimConfig;

/// The whole simulation, passed by reference to every stage
#[derive(Debug)]
pub struct Simulation {
    /// Sanitized configuration snapshot
    pub(super) config: SimConfig,
    /// Seed the RNG was created from
    pub(super) seed: u64,
    pub(super) arena: Arena,
    pub(super) bodies: Vec<Body>,
    pub(super) walls: RubberWalls,
    pub(super) mode: Mode,
    pub(super) params: PhysicsParams,
    /// User ball spacing; modes with an override restore this on exit
    pub(super) spacing: f32,
    pub(super) rng: Pcg32,
    pub(super) hash: SpatialHash,
    pub(super) pairs: Vec<CollisionPair>,
    pub(super) peers: Vec<Peer>,
    pub(super) neighbors: Vec<usize>,
    /// Contact events produced since the start of the current frame
    pub(super) contacts: Vec<ContactEvent>,
    pub(super) accumulator: f32,
    /// Simulated seconds since the mode was seeded
    pub(super) time: f32,
    pub(super) time_ticks: u64,
    next_id: BodyId,
}

impl Simulation {
    /// Create a simulation in the default mode for a `width` x `height` surface
    pub fn new(config: SimConfig, seed: u64, width: f32, height: f32) -> Self {
        let config = config.sanitized();
        let arena = Arena::new(width, height, &config.wall);
        let walls = RubberWalls::new(&config.wall);
        let spacing = config.ball_spacing;
        let id = ModeId::default();
        let mut sim = Self {
            params: PhysicsParams::for_mode(id, &config, spacing),
            config,
            seed,
            arena,
            bodies: Vec::new(),
            walls,
            mode: Mode::new(id),
            spacing,
            rng: Pcg32::seed_from_u64(seed),
            hash: SpatialHash::new(),
            pairs: Vec::new(),
            peers: Vec::new(),
            neighbors: Vec::new(),
            contacts: Vec::new(),
            accumulator: 0.0,
            time: 0.0,
            time_ticks: 0,
            next_id: 1,
        };
        sim.reseed();
        sim
    }

    /// Tear down the current mode and seed `id` from scratch
    pub fn switch_mode(&mut self, id: ModeId) {
        let previous = self.mode.id();
        self.mode = Mode::new(id);
        self.params = PhysicsParams::for_mode(id, &self.config, self.spacing);
        self.reseed();
        log::info!(
            "Switched mode {} -> {} ({} bodies)",
            previous.as_str(),
            id.as_str(),
            self.bodies.len()
        );
    }

    fn reseed(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.pairs.clear();
        self.accumulator = 0.0;
        self.time = 0.0;
        self.time_ticks = 0;
        let mut ctx = SeedContext {
            arena: &self.arena,
            config: &self.config,
            rng: &mut self.rng,
            next_id: &mut self.next_id,
        };
        self.bodies = self.mode.seed(&mut ctx);
    }

    /// Rebuild the arena and walls for a new surface size
    pub fn resize(&mut self, width: f32, height: f32) {
        self.arena = Arena::new(width, height, &self.config.wall);
        self.walls = RubberWalls::new(&self.config.wall);
        self.accumulator = 0.0;
        if self.arena.is_degenerate() {
            log::debug!("Surface {width}x{height} too small, frames paused");
            return;
        }
        let bounds = self.arena.bounds();
        let open_top = matches!(
            self.mode.boundary_policy(&self.config),
            BoundaryPolicy::RubberWalls { open_top: true, .. }
        );
        for body in &mut self.bodies {
            let r = body.radius;
            let clamped = bounds.clamp_circle(body.pos, r);
            body.pos.x = clamped.x;
            body.pos.y = if open_top { body.pos.y.min(bounds.max.y - r) } else { clamped.y };
            body.wake();
        }
        log::debug!("Resized arena to {width}x{height}");
    }

    /// Click interaction: a ripple in water, a radial shove elsewhere.
    ///
    /// Returns the number of bodies pushed.
    pub fn poke(&mut self, pos: Vec2, strength: f32) -> usize {
        if let Some(water) = self.mode.water_mut() {
            water.spawn_ripple(pos, strength);
            return 0;
        }
        let reach = self.config.repel_radius;
        let mut pushed = 0;
        for body in &mut self.bodies {
            let away = body.pos - pos;
            let dist = away.length();
            if dist >= reach + body.radius {
                continue;
            }
            let dir = if dist > DIST_EPSILON { away / dist } else { Vec2::NEG_Y };
            let falloff = (1.0 - dist / (reach + body.radius)).max(0.0);
            body.wake();
            body.vel += dir * strength * falloff;
            pushed += 1;
        }
        pushed
    }

    /// Change the user ball spacing; deferred while a mode overrides it
    pub fn set_ball_spacing(&mut self, spacing: f32) {
        self.spacing = spacing.max(0.0);
        self.params = PhysicsParams::for_mode(self.mode.id(), &self.config, self.spacing);
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut Vec<Body> {
        &mut self.bodies
    }

    /// Rubber wall offset at `t` (0..1) along `edge`
    pub fn wall_offset(&self, edge: Edge, t: f32) -> f32 {
        self.walls.sample(edge, t)
    }

    pub fn walls(&self) -> &RubberWalls {
        &self.walls
    }

    pub fn walls_mut(&mut self) -> &mut RubberWalls {
        &mut self.walls
    }

    /// Contact events produced during the most recent frame
    pub fn contacts(&self) -> &[ContactEvent] {
        &self.contacts
    }

    pub fn drain_contacts(&mut self) -> std::vec::Drain<'_, ContactEvent> {
        self.contacts.drain(..)
    }

    pub fn worms(&self) -> Option<&WormWorld> {
        self.mode.worms()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn mode_id(&self) -> ModeId {
        self.mode.id()
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn asleep_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.asleep).count()
    }
}

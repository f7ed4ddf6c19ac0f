//! Fixed timestep scheduler
//!
//! `Simulation::advance` banks the rendered delta and spends it in whole
//! `SIM_DT` sub-steps; `tick` runs exactly one sub-step.

use glam::Vec2;

use super::boundary::{WallResponse, resolve_boundary};
use super::collision::resolve_ball_collisions;
use super::modes::{FieldContext, FrameContext, Peer};
use super::sleep::{update_sleep, wake_near};
use super::state::Simulation;
use crate::consts::*;

/// Latest pointer state, sampled once per frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Pointer position in arena coordinates
    pub pointer: Vec2,
    /// Pointer is over the surface
    pub pointer_active: bool,
    /// Seconds since the pointer last moved
    pub idle_secs: f32,
}

impl TickInput {
    /// Pointer position, if it is over the surface
    #[inline]
    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer_active.then_some(self.pointer)
    }
}

/// What one call to [`Simulation::advance`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Physics steps run (fixed sub-steps, or 1 for render-rate modes)
    pub substeps: u32,
    /// Backlog beyond the sub-step cap was thrown away
    pub backlog_dropped: bool,
    /// No usable surface; nothing ran
    pub skipped: bool,
}

impl Simulation {
    /// Advance by one rendered frame of `frame_dt` seconds
    pub fn advance(&mut self, input: &TickInput, frame_dt: f32) -> FrameReport {
        self.contacts.clear();
        if self.arena.is_degenerate() {
            return FrameReport { skipped: true, ..FrameReport::default() };
        }
        let dt = if frame_dt.is_finite() { frame_dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        let mut report = FrameReport::default();

        if self.mode.uses_fixed_step() {
            self.accumulator += dt;
            while self.accumulator >= SIM_DT && report.substeps < MAX_SUBSTEPS {
                tick(self, input, SIM_DT);
                self.accumulator -= SIM_DT;
                report.substeps += 1;
            }
            if self.accumulator >= SIM_DT {
                log::debug!("Dropping {:.1} ms of simulation backlog", self.accumulator * 1000.0);
                self.accumulator = 0.0;
                report.backlog_dropped = true;
            }
        } else if dt > 0.0 {
            // Render-rate modes integrate on the frame delta directly
            if self.mode.worms().is_some() {
                let bounds = self.arena.bounds();
                if let Some(world) = self.mode.worms_mut() {
                    world.step(input, &bounds, dt);
                }
                self.time += dt;
                self.time_ticks += 1;
            } else {
                tick(self, input, dt);
            }
            report.substeps = 1;
        }

        let ctx = FrameContext { input, arena: &self.arena, time: self.time };
        self.mode.frame_update(&ctx, dt);
        self.walls.update(dt);
        report
    }

    /// Forget banked time, e.g. when resuming after the host was inactive
    pub fn reset_timing(&mut self) {
        self.accumulator = 0.0;
    }
}

/// Run one physics step of `dt` seconds
pub fn tick(sim: &mut Simulation, input: &TickInput, dt: f32) {
    let sleeps = sim.mode.uses_sleep();

    // Wake pass
    if let Some(pointer) = input.pointer().filter(|_| sleeps) {
        wake_near(&mut sim.bodies, pointer, sim.config.sleep.wake_radius);
    }

    // Forces and integration
    sim.peers.clear();
    if sim.mode.needs_peers() {
        sim.peers.extend(sim.bodies.iter().map(Peer::of));
        sim.hash.rebuild(&sim.bodies, sim.params.spacing);
    }
    {
        let mut ctx = FieldContext {
            input,
            arena: &sim.arena,
            config: &sim.config,
            params: &sim.params,
            time: sim.time,
            rng: &mut sim.rng,
            peers: &sim.peers,
            hash: &sim.hash,
            neighbors: &mut sim.neighbors,
        };
        for body in &mut sim.bodies {
            if body.asleep {
                body.decay_squash(dt);
                continue;
            }
            sim.mode.apply_forces(body, &mut ctx, dt);
            body.integrate(dt);
        }
    }

    // Ball-ball collisions
    let solver = sim.mode.solver_params(&sim.config, &sim.params);
    resolve_ball_collisions(
        &mut sim.bodies,
        &mut sim.hash,
        &mut sim.pairs,
        &solver,
        sim.arena.width,
        &mut sim.contacts,
    );

    // Arena boundary
    let response = WallResponse {
        restitution: sim.config.wall_restitution,
        rest_velocity: solver.rest_velocity,
        friction: sim.config.friction,
    };
    let policy = sim.mode.boundary_policy(&sim.config);
    resolve_boundary(&mut sim.bodies, &sim.arena, policy, response, &mut sim.walls, &mut sim.contacts);

    if sleeps {
        for body in &mut sim.bodies {
            update_sleep(body, &sim.arena, &sim.config.sleep, dt);
        }
    }

    sim.time += dt;
    sim.time_ticks += 1;
}

/// Turns host timestamps (milliseconds) into frame deltas
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
    paused: bool,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call; the first frame after a start or
    /// resume reports one `SIM_DT`. Paused clocks report zero.
    pub fn delta(&mut self, now_ms: f64) -> f32 {
        if self.paused {
            return 0.0;
        }
        let dt = match self.last_ms {
            Some(prev) => ((now_ms - prev) / 1000.0) as f32,
            None => SIM_DT,
        };
        self.last_ms = Some(now_ms);
        dt.max(0.0)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
        self.last_ms = None;
    }
}

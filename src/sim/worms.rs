//! Worm locomotion solver
//!
//! Organisms are chains of circular segments stored structure-of-arrays,
//! with a per-organism range table. Each tick steers the head, integrates all
//! segments with Verlet, relaxes the chain constraints and separates
//! overlapping segments. Runs instead of the body pipeline in worms mode.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::boundary::Rect;
use super::tick::TickInput;
use crate::consts::{DIST_EPSILON, SQUASH_DECAY};
use crate::{heading_vector, normalize_angle};

/// Velocity retained per Verlet step
pub const AIR_DAMPING: f32 = 0.55;
pub const RELAX_PASSES: usize = 6;
/// Share of a constraint error taken by the leading segment
const HEAD_WEIGHT: f32 = 0.25;
/// Share taken by the following segment
const TAIL_WEIGHT: f32 = 0.75;
/// Peristaltic rest-length modulation
const CONTRACTION_AMP: f32 = 0.03;
/// Phase lag per segment of the contraction wave (radians)
const CONTRACTION_LAG: f32 = 0.9;
/// Largest stretch tolerated after relaxation, beyond the contraction wave
const MAX_STRETCH: f32 = 0.015;
/// Rest length as a multiple of the head radius
const REST_FACTOR: f32 = 1.1;

const SEGMENTS_MIN: usize = 8;
const SEGMENTS_MAX: usize = 14;
const HEAD_RADIUS_MIN: f32 = 9.0;
const HEAD_RADIUS_MAX: f32 = 13.0;
/// Tail radius relative to the head
const TAIL_TAPER: f32 = 0.55;

/// Gait pulses per second
const GAIT_FREQ: f32 = 1.6;
const BASE_SPEED: f32 = 55.0;
/// Speed envelope floor between gait pulses
const PULSE_FLOOR: f32 = 0.35;
/// Chance per second of a micro-pause
const PAUSE_CHANCE: f32 = 0.08;
const PAUSE_MIN: f32 = 0.3;
const PAUSE_MAX: f32 = 1.0;
const TURN_NOISE: f32 = 6.0;
const TURN_DAMPING: f32 = 2.5;
const MAX_TURN_RATE: f32 = 2.5;
const WALL_MARGIN: f32 = 80.0;
const WALL_STEER: f32 = 4.0;
const FLEE_RADIUS: f32 = 160.0;
const FLEE_STEER: f32 = 6.0;
/// Speed multiplier at maximum panic
const PANIC_BOOST: f32 = 1.8;
const SENSE_RADIUS: f32 = 70.0;
const AVOID_STEER: f32 = 3.0;
/// Sideways share of the head-avoidance direction
const DODGE: f32 = 0.5;
/// Speed lost per nearby head
const CROWD_SLOWDOWN: f32 = 0.3;
/// Fraction of a segment overlap removed per collision pass
const COLLISION_SOFTNESS: f32 = 0.5;

/// One organism: a contiguous range of segments, head first
#[derive(Debug, Clone)]
pub struct Organism {
    pub start: usize,
    pub len: usize,
    pub heading: f32,
    pub turn_rate: f32,
    /// Gait cycle position, in cycles
    pub gait_phase: f32,
    pub pause_timer: f32,
    pub rest_length: f32,
    rng: Pcg32,
}

impl Organism {
    #[inline]
    pub fn head(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }

    /// Rest length of link `k` (between segment k and k + 1) with the contraction wave
    #[inline]
    fn link_rest(&self, k: usize) -> f32 {
        let wave = (self.gait_phase * TAU - k as f32 * CONTRACTION_LAG).sin();
        self.rest_length * (1.0 + CONTRACTION_AMP * wave)
    }
}

/// Segment buffers and organism table
#[derive(Debug, Clone, Default)]
pub struct WormWorld {
    pos: Vec<Vec2>,
    prev: Vec<Vec2>,
    radius: Vec<f32>,
    squash: Vec<f32>,
    organisms: Vec<Organism>,
    heads: Vec<Vec2>,
    /// Organism index per segment, rebuilt for each collision pass
    owner: Vec<usize>,
}

impl WormWorld {
    /// Lay out `count` organisms inside `bounds`, each with its own RNG
    pub fn spawn(count: usize, bounds: &Rect, rng: &mut Pcg32) -> Self {
        let mut world = WormWorld::default();
        for _ in 0..count {
            let mut own = Pcg32::seed_from_u64(rng.random::<u64>());
            let len = own.random_range(SEGMENTS_MIN..=SEGMENTS_MAX);
            let head_radius = own.random_range(HEAD_RADIUS_MIN..HEAD_RADIUS_MAX);
            let rest_length = head_radius * REST_FACTOR;
            let heading = own.random_range(-PI..PI);
            let margin = WALL_MARGIN.min(bounds.width() * 0.5).min(bounds.height() * 0.5);
            let head = Vec2::new(
                super::modes::random_span(&mut own, bounds.min.x + margin, bounds.max.x - margin),
                super::modes::random_span(&mut own, bounds.min.y + margin, bounds.max.y - margin),
            );
            let back = -heading_vector(heading);
            let start = world.pos.len();
            for k in 0..len {
                let t = k as f32 / (len - 1).max(1) as f32;
                let p = bounds.clamp_circle(head + back * rest_length * k as f32, head_radius);
                world.pos.push(p);
                world.prev.push(p);
                world.radius.push(head_radius * (1.0 - (1.0 - TAIL_TAPER) * t));
                world.squash.push(0.0);
            }
            let gait_phase = own.random::<f32>();
            world.organisms.push(Organism {
                start,
                len,
                heading,
                turn_rate: 0.0,
                gait_phase,
                pause_timer: 0.0,
                rest_length,
                rng: own,
            });
        }
        log::info!("Spawned {} worms ({} segments)", world.organisms.len(), world.pos.len());
        world
    }

    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.pos
    }

    pub fn radii(&self) -> &[f32] {
        &self.radius
    }

    pub fn squash(&self) -> &[f32] {
        &self.squash
    }

    pub fn segment_count(&self) -> usize {
        self.pos.len()
    }

    /// Verlet-implied velocity of segment `i` (per step)
    #[inline]
    pub fn implied_velocity(&self, i: usize) -> Vec2 {
        self.pos[i] - self.prev[i]
    }

    /// Advance every organism by one render frame
    pub fn step(&mut self, input: &TickInput, bounds: &Rect, dt: f32) {
        if dt <= 0.0 || self.organisms.is_empty() {
            return;
        }
        self.steer(input, bounds, dt);
        self.integrate();
        self.relax(bounds);
        self.collide(dt);
        self.clamp_to(bounds);
    }

    fn steer(&mut self, input: &TickInput, bounds: &Rect, dt: f32) {
        self.heads.clear();
        self.heads.extend(self.organisms.iter().map(|o| self.pos[o.head()]));
        let pointer = input.pointer();

        for (index, org) in self.organisms.iter_mut().enumerate() {
            let head = self.pos[org.head()];
            org.gait_phase = (org.gait_phase + GAIT_FREQ * dt).fract();

            if org.pause_timer > 0.0 {
                org.pause_timer = (org.pause_timer - dt).max(0.0);
            } else if org.rng.random::<f32>() < PAUSE_CHANCE * dt {
                org.pause_timer = org.rng.random_range(PAUSE_MIN..PAUSE_MAX);
            }

            // Correlated random walk
            let noise = (org.rng.random::<f32>() * 2.0 - 1.0) * TURN_NOISE;
            let mut steer = noise - TURN_DAMPING * org.turn_rate;

            let wall = wall_push(head, bounds);
            if wall != Vec2::ZERO {
                let strength = wall.length().min(1.0);
                steer += turn_toward(org.heading, wall) * WALL_STEER * strength;
            }

            let mut panic = 0.0;
            if let Some(p) = pointer {
                let away = head - p;
                let d = away.length();
                if d < FLEE_RADIUS && d > DIST_EPSILON {
                    panic = 1.0 - d / FLEE_RADIUS;
                    steer += turn_toward(org.heading, away) * FLEE_STEER * panic;
                }
            }

            let facing = heading_vector(org.heading);
            let mut crowd = 0.0;
            for (other, &other_head) in self.heads.iter().enumerate() {
                if other == index {
                    continue;
                }
                let away = head - other_head;
                let d = away.length();
                if d >= SENSE_RADIUS || d <= DIST_EPSILON {
                    continue;
                }
                let closeness = 1.0 - d / SENSE_RADIUS;
                // Dodge to whichever side the other head is not on
                let side = if facing.perp_dot(away) >= 0.0 { 1.0 } else { -1.0 };
                let dodge = away / d + facing.perp() * side * DODGE;
                steer += turn_toward(org.heading, dodge) * AVOID_STEER * closeness;
                crowd += closeness;
            }

            org.turn_rate = (org.turn_rate + steer * dt).clamp(-MAX_TURN_RATE, MAX_TURN_RATE);
            org.heading = normalize_angle(org.heading + org.turn_rate * dt);

            if org.pause_timer > 0.0 && panic == 0.0 {
                continue;
            }
            let tri = 1.0 - (2.0 * org.gait_phase - 1.0).abs();
            let envelope = PULSE_FLOOR + (1.0 - PULSE_FLOOR) * tri;
            let modulation = (1.0 + panic * (PANIC_BOOST - 1.0)) / (1.0 + CROWD_SLOWDOWN * crowd);
            let speed = BASE_SPEED * envelope * modulation;
            self.pos[org.head()] += heading_vector(org.heading) * speed * dt;
        }
    }

    fn integrate(&mut self) {
        for (p, prev) in self.pos.iter_mut().zip(self.prev.iter_mut()) {
            let vel = (*p - *prev) * AIR_DAMPING;
            *prev = *p;
            *p += vel;
        }
    }

    /// Constraint relaxation followed by a stretch limit sweep
    pub fn relax(&mut self, bounds: &Rect) {
        for _ in 0..RELAX_PASSES {
            for org in &self.organisms {
                for k in 0..org.len.saturating_sub(1) {
                    let a = org.start + k;
                    let b = a + 1;
                    let delta = self.pos[b] - self.pos[a];
                    let dist = delta.length();
                    if dist <= DIST_EPSILON {
                        continue;
                    }
                    let err = dist - org.link_rest(k);
                    let dir = delta / dist;
                    self.pos[a] += dir * err * HEAD_WEIGHT;
                    self.pos[b] -= dir * err * TAIL_WEIGHT;
                }
            }
            self.clamp_to(bounds);
        }

        for org in &self.organisms {
            for k in 0..org.len.saturating_sub(1) {
                let a = org.start + k;
                let b = a + 1;
                let rest = org.link_rest(k);
                let delta = self.pos[b] - self.pos[a];
                let dist = delta.length();
                let dir = if dist > DIST_EPSILON { delta / dist } else { -heading_vector(org.heading) };
                let limited = dist.clamp(rest * (1.0 - MAX_STRETCH), rest * (1.0 + MAX_STRETCH));
                if limited != dist {
                    self.pos[b] = self.pos[a] + dir * limited;
                }
            }
        }
    }

    /// Soft all-pairs separation; neighbours in the same chain are skipped
    fn collide(&mut self, dt: f32) {
        let decay = (-SQUASH_DECAY * dt).exp();
        for s in &mut self.squash {
            *s *= decay;
            if *s < 1e-3 {
                *s = 0.0;
            }
        }

        self.owner.clear();
        self.owner.extend(
            self.organisms
                .iter()
                .enumerate()
                .flat_map(|(o, org)| std::iter::repeat_n(o, org.len)),
        );
        let n = self.pos.len();
        for i in 0..n {
            for j in (i + 1)..n {
                if self.owner[i] == self.owner[j] && j - i <= 1 {
                    continue;
                }
                let delta = self.pos[j] - self.pos[i];
                let min_dist = self.radius[i] + self.radius[j];
                let dist_sq = delta.length_squared();
                if dist_sq >= min_dist * min_dist {
                    continue;
                }
                let dist = dist_sq.sqrt();
                let normal = if dist > DIST_EPSILON { delta / dist } else { Vec2::X };
                let overlap = min_dist - dist;
                let push = normal * overlap * COLLISION_SOFTNESS * 0.5;
                self.pos[i] -= push;
                self.pos[j] += push;
                let intensity = (overlap / min_dist).min(1.0);
                self.squash[i] = self.squash[i].max(intensity);
                self.squash[j] = self.squash[j].max(intensity);
            }
        }
    }

    fn clamp_to(&mut self, bounds: &Rect) {
        for (p, &r) in self.pos.iter_mut().zip(self.radius.iter()) {
            *p = bounds.clamp_circle(*p, r);
        }
    }
}

/// Signed angle from `heading` toward the direction of `target`
#[inline]
fn turn_toward(heading: f32, target: Vec2) -> f32 {
    normalize_angle(target.y.atan2(target.x) - heading)
}

/// Inward push from any walls within the margin (each axis 0..1)
fn wall_push(p: Vec2, bounds: &Rect) -> Vec2 {
    let ramp = |d: f32| ((WALL_MARGIN - d) / WALL_MARGIN).clamp(0.0, 1.0);
    Vec2::new(
        ramp(p.x - bounds.min.x) - ramp(bounds.max.x - p.x),
        ramp(p.y - bounds.min.y) - ramp(bounds.max.y - p.y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bounds() -> Rect {
        Rect { min: Vec2::ZERO, max: Vec2::new(1000.0, 800.0) }
    }

    fn single_worm(len: usize, rest: f32) -> WormWorld {
        let mut world = WormWorld::default();
        for k in 0..len {
            let p = Vec2::new(500.0 - rest * k as f32, 400.0);
            world.pos.push(p);
            world.prev.push(p);
            world.radius.push(rest / REST_FACTOR);
            world.squash.push(0.0);
        }
        world.organisms.push(Organism {
            start: 0,
            len,
            heading: 0.0,
            turn_rate: 0.0,
            gait_phase: 0.0,
            pause_timer: 0.0,
            rest_length: rest,
            rng: Pcg32::seed_from_u64(0),
        });
        world
    }

    #[test]
    fn test_spawn_allocates_ranges_in_order() {
        let mut rng = Pcg32::seed_from_u64(4);
        let world = WormWorld::spawn(6, &bounds(), &mut rng);
        assert_eq!(world.organisms().len(), 6);
        let mut expected_start = 0;
        for org in world.organisms() {
            assert_eq!(org.start, expected_start);
            assert!((SEGMENTS_MIN..=SEGMENTS_MAX).contains(&org.len));
            expected_start += org.len;
        }
        assert_eq!(expected_start, world.segment_count());
        // Tail tapers
        let first = &world.organisms()[0];
        assert!(world.radii()[first.start] > world.radii()[first.start + first.len - 1]);
    }

    #[test]
    fn test_worms_stay_inside_bounds() {
        let mut rng = Pcg32::seed_from_u64(11);
        let b = bounds();
        let mut world = WormWorld::spawn(6, &b, &mut rng);
        let input = TickInput { pointer: Vec2::new(500.0, 400.0), pointer_active: true, idle_secs: 0.0 };
        for _ in 0..600 {
            world.step(&input, &b, 1.0 / 60.0);
        }
        for (p, &r) in world.positions().iter().zip(world.radii()) {
            assert!(p.is_finite());
            assert!(p.x >= b.min.x + r - 1e-3 && p.x <= b.max.x - r + 1e-3);
            assert!(p.y >= b.min.y + r - 1e-3 && p.y <= b.max.y - r + 1e-3);
        }
    }

    #[test]
    fn test_same_seed_same_worms() {
        let b = bounds();
        let input = TickInput::default();
        let run = || {
            let mut rng = Pcg32::seed_from_u64(21);
            let mut world = WormWorld::spawn(4, &b, &mut rng);
            for _ in 0..120 {
                world.step(&input, &b, 1.0 / 60.0);
            }
            world.positions().to_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_heads_flee_pointer() {
        let b = bounds();
        let mut world = single_worm(10, 12.0);
        // Head faces +x; pointer sits just off its +y flank
        let input = TickInput { pointer: Vec2::new(500.0, 440.0), pointer_active: true, idle_secs: 0.0 };
        for _ in 0..60 {
            world.step(&input, &b, 1.0 / 60.0);
        }
        let head = world.positions()[0];
        assert!(head.y < 390.0, "head at {head}");
        assert!(world.organisms()[0].heading < 0.0);
    }

    #[test]
    fn test_collision_scratch_is_reused() {
        let b = bounds();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut world = WormWorld::spawn(4, &b, &mut rng);
        let input = TickInput::default();
        world.step(&input, &b, 1.0 / 60.0);
        assert_eq!(world.owner.len(), world.segment_count());
        let buffer = world.owner.as_ptr();
        for _ in 0..30 {
            world.step(&input, &b, 1.0 / 60.0);
        }
        assert_eq!(world.owner.as_ptr(), buffer);
        let last = world.organisms().len() - 1;
        assert_eq!(world.owner[world.segment_count() - 1], last);
    }

    #[test]
    fn test_wall_push_points_inward() {
        let b = bounds();
        let push = wall_push(Vec2::new(10.0, 400.0), &b);
        assert!(push.x > 0.0);
        assert_eq!(push.y, 0.0);
        assert_eq!(wall_push(b.center(), &b), Vec2::ZERO);
    }

    proptest! {
        #[test]
        fn prop_relaxation_restores_rest_length(
            offsets in prop::collection::vec((-36.0f32..36.0, -36.0f32..36.0), 12)
        ) {
            let rest = 12.0;
            let mut world = single_worm(12, rest);
            for (p, (dx, dy)) in world.pos.iter_mut().zip(offsets) {
                *p += Vec2::new(dx, dy);
            }
            world.relax(&bounds());
            for w in world.positions().windows(2) {
                let d = w[0].distance(w[1]);
                prop_assert!((d - rest).abs() <= rest * 0.05, "link {} vs rest {}", d, rest);
            }
        }
    }
}

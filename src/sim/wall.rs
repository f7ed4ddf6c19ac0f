//! Rubber wall deformation field
//!
//! Each straight edge is a 1-D chain of spring-damper segments. Impacts kick
//! segment velocities with a Gaussian profile; every frame the segments relax
//! back to zero. Purely visual: collision uses the rigid inset boundary.

use serde::{Deserialize, Serialize};

use crate::settings::WallConfig;
use crate::smoothstep;

/// Largest internal integration step for the springs
const MAX_SPRING_STEP: f32 = 1.0 / 120.0;
/// Offsets and velocities below these snap to exactly zero
const SNAP_OFFSET: f32 = 0.01;
const SNAP_VELOCITY: f32 = 0.05;
/// Fraction of the edge over which impacts fade out toward a corner
const CORNER_FADE: f32 = 0.15;

/// Which straight edge of the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    #[inline]
    fn index(self) -> usize {
        match self {
            Edge::Top => 0,
            Edge::Right => 1,
            Edge::Bottom => 2,
            Edge::Left => 3,
        }
    }
}

/// Spring tuning shared by all edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringParams {
    pub stiffness: f32,
    pub damping: f32,
    pub max_deformation: f32,
    pub spread: f32,
    pub impulse: f32,
}

impl From<&WallConfig> for SpringParams {
    fn from(config: &WallConfig) -> Self {
        Self {
            stiffness: config.stiffness,
            damping: config.damping,
            max_deformation: config.max_deformation,
            spread: config.impact_spread,
            impulse: config.impact_impulse,
        }
    }
}

/// Deformation state of one edge; positive offsets bulge outward
#[derive(Debug, Clone)]
pub struct WallEdge {
    offsets: Vec<f32>,
    velocities: Vec<f32>,
}

impl WallEdge {
    pub fn new(segments: usize) -> Self {
        let n = segments.max(3);
        Self {
            offsets: vec![0.0; n],
            velocities: vec![0.0; n],
        }
    }

    pub fn offsets(&self) -> &[f32] {
        &self.offsets
    }

    #[inline]
    fn last(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Kick segments near `t` (0..1 along the edge) with `intensity` (0..1)
    pub fn register_impact(&mut self, t: f32, intensity: f32, params: &SpringParams) {
        let t = t.clamp(0.0, 1.0);
        let intensity = intensity.clamp(0.0, 1.0);
        let last = self.last();
        let two_sigma_sq = 2.0 * params.spread * params.spread;
        for i in 1..last {
            let seg_t = i as f32 / last as f32;
            let d = seg_t - t;
            let weight = (-(d * d) / two_sigma_sq).exp();
            let corner = smoothstep(seg_t.min(1.0 - seg_t) / CORNER_FADE);
            self.velocities[i] += params.impulse * intensity * weight * corner;
        }
    }

    /// Advance the springs by `dt`
    pub fn update(&mut self, dt: f32, params: &SpringParams) {
        if dt <= 0.0 {
            return;
        }
        let steps = (dt / MAX_SPRING_STEP).ceil().max(1.0) as u32;
        let h = dt / steps as f32;
        let last = self.last();
        for _ in 0..steps {
            for i in 1..last {
                let x = self.offsets[i];
                let v = self.velocities[i];
                let accel = -params.stiffness * x - params.damping * v;
                let mut v = v + accel * h;
                let mut x = x + v * h;
                if x.abs() > params.max_deformation {
                    x = x.clamp(-params.max_deformation, params.max_deformation);
                    v = 0.0;
                }
                if x.abs() < SNAP_OFFSET && v.abs() < SNAP_VELOCITY {
                    x = 0.0;
                    v = 0.0;
                }
                self.offsets[i] = x;
                self.velocities[i] = v;
            }
        }
        self.offsets[0] = 0.0;
        self.offsets[last] = 0.0;
        self.velocities[0] = 0.0;
        self.velocities[last] = 0.0;
    }

    /// Smoothstep-interpolated offset at `t` (0..1 along the edge)
    pub fn sample(&self, t: f32) -> f32 {
        let last = self.last();
        let f = t.clamp(0.0, 1.0) * last as f32;
        let i = (f.floor() as usize).min(last - 1);
        let s = smoothstep(f - i as f32);
        self.offsets[i] + (self.offsets[i + 1] - self.offsets[i]) * s
    }

    pub fn is_at_rest(&self) -> bool {
        self.offsets.iter().all(|&x| x == 0.0) && self.velocities.iter().all(|&v| v == 0.0)
    }
}

/// The four deformable edges of the arena
#[derive(Debug, Clone)]
pub struct RubberWalls {
    edges: [WallEdge; 4],
    pub params: SpringParams,
}

impl RubberWalls {
    pub fn new(config: &WallConfig) -> Self {
        let n = config.segments;
        Self {
            edges: [WallEdge::new(n), WallEdge::new(n), WallEdge::new(n), WallEdge::new(n)],
            params: SpringParams::from(config),
        }
    }

    pub fn edge(&self, edge: Edge) -> &WallEdge {
        &self.edges[edge.index()]
    }

    pub fn register_impact(&mut self, edge: Edge, t: f32, intensity: f32) {
        let params = self.params;
        self.edges[edge.index()].register_impact(t, intensity, &params);
    }

    pub fn update(&mut self, dt: f32) {
        let params = self.params;
        for edge in &mut self.edges {
            edge.update(dt, &params);
        }
    }

    pub fn sample(&self, edge: Edge, t: f32) -> f32 {
        self.edges[edge.index()].sample(t)
    }

    pub fn is_at_rest(&self) -> bool {
        self.edges.iter().all(WallEdge::is_at_rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SpringParams {
        SpringParams::from(&WallConfig::default())
    }

    #[test]
    fn test_end_segments_stay_pinned() {
        let p = params();
        let mut edge = WallEdge::new(12);
        edge.register_impact(0.0, 1.0, &p);
        edge.register_impact(1.0, 1.0, &p);
        for _ in 0..30 {
            edge.update(1.0 / 60.0, &p);
            assert_eq!(edge.offsets()[0], 0.0);
            assert_eq!(edge.offsets()[11], 0.0);
        }
    }

    #[test]
    fn test_impact_peaks_near_hit_point() {
        let p = params();
        let mut edge = WallEdge::new(12);
        edge.register_impact(0.5, 1.0, &p);
        edge.update(1.0 / 60.0, &p);
        let offsets = edge.offsets();
        let peak = offsets
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        assert!(peak == 5 || peak == 6, "peak at {peak}");
        assert!(offsets[1] < offsets[peak]);
    }

    #[test]
    fn test_single_impact_decays_monotonically_to_zero() {
        let p = params();
        let mut edge = WallEdge::new(12);
        edge.register_impact(0.4, 1.0, &p);

        let mut prev = vec![0.0_f32; 12];
        let mut peaked = vec![false; 12];
        let mut settled_at = None;
        for tick in 0..600 {
            edge.update(1.0 / 60.0, &p);
            for (i, &x) in edge.offsets().iter().enumerate() {
                assert!(x >= 0.0, "segment {i} overshot to {x}");
                assert!(x <= p.max_deformation);
                if x < prev[i] {
                    peaked[i] = true;
                } else if peaked[i] {
                    assert!(x <= prev[i], "segment {i} rose again at tick {tick}");
                }
                prev[i] = x;
            }
            if settled_at.is_none() && edge.is_at_rest() {
                settled_at = Some(tick);
            }
        }
        let settled_at = settled_at.expect("edge never came to rest");
        assert!(settled_at < 300, "took {settled_at} ticks");
        assert!(edge.offsets().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_sample_interpolates_between_segments() {
        let p = params();
        let mut edge = WallEdge::new(12);
        edge.register_impact(0.5, 0.6, &p);
        edge.update(1.0 / 60.0, &p);
        let a = edge.sample(5.0 / 11.0);
        let b = edge.sample(6.0 / 11.0);
        let mid = edge.sample(5.5 / 11.0);
        assert!((a - edge.offsets()[5]).abs() < 1e-5);
        assert!((b - edge.offsets()[6]).abs() < 1e-5);
        assert!(mid >= a.min(b) - 1e-5 && mid <= a.max(b) + 1e-5);
        assert_eq!(edge.sample(0.0), 0.0);
        assert_eq!(edge.sample(1.0), 0.0);
    }

    #[test]
    fn test_deformation_is_clamped() {
        let p = params();
        let mut edge = WallEdge::new(12);
        for _ in 0..20 {
            edge.register_impact(0.5, 1.0, &p);
        }
        edge.update(0.1, &p);
        assert!(edge.offsets().iter().all(|x| x.abs() <= p.max_deformation));
    }
}

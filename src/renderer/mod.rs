//! Render snapshot
//!
//! GPU-ready instance data for the current frame. The renderer only reads
//! state the last simulation frame produced.

pub mod instance;
pub mod shapes;

pub use instance::{BodyInstance, SegmentInstance, body_instances, segment_instances};
pub use shapes::wall_silhouette;

use glam::Vec2;

use crate::sim::Simulation;

/// Everything needed to draw one frame
#[derive(Debug, Clone, Default)]
pub struct FrameSnapshot {
    pub bodies: Vec<BodyInstance>,
    pub segments: Vec<SegmentInstance>,
    pub outline: Vec<Vec2>,
}

impl FrameSnapshot {
    pub fn capture(sim: &Simulation, samples_per_edge: usize) -> Self {
        Self {
            bodies: body_instances(sim.bodies()),
            segments: sim.worms().map(segment_instances).unwrap_or_default(),
            outline: wall_silhouette(sim.arena(), sim.walls(), samples_per_edge),
        }
    }
}

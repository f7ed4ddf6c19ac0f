//! Per-instance data for drawing bodies and worm segments

use bytemuck::{Pod, Zeroable};

use crate::sim::{Body, WormWorld};

/// Stretch per pixel of Verlet step displacement
const STRETCH_GAIN: f32 = 0.04;
const MAX_STRETCH: f32 = 0.35;
/// Across-axis shrink per unit of collision squash
const SEGMENT_SQUASH_GAIN: f32 = 0.3;
/// Aspect change at full body squash
const BODY_SQUASH_GAIN: f32 = 0.5;

/// One circle, squashed along `squash_angle`
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BodyInstance {
    pub center: [f32; 2],
    pub radius: f32,
    pub rotation: f32,
    /// Scale along and across the squash axis
    pub scale: [f32; 2],
    pub squash_angle: f32,
    pub color: [f32; 4],
}

impl BodyInstance {
    pub fn from_body(body: &Body) -> Self {
        let s = body.squash.clamp(0.0, 1.0) * BODY_SQUASH_GAIN;
        let mut color = body.color;
        color[3] *= body.alpha.clamp(0.0, 1.0);
        Self {
            center: body.pos.to_array(),
            radius: body.radius,
            rotation: body.rotation,
            scale: [1.0 - s, 1.0 + s * 0.5],
            squash_angle: body.squash_angle,
            color,
        }
    }
}

/// One worm segment, stretched along its direction of travel
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SegmentInstance {
    pub center: [f32; 2],
    pub radius: f32,
    /// Direction of travel (radians)
    pub angle: f32,
    /// Scale along and across the travel direction
    pub scale: [f32; 2],
    pub color: [f32; 4],
}

/// Instances for every visible body
pub fn body_instances(bodies: &[Body]) -> Vec<BodyInstance> {
    bodies
        .iter()
        .filter(|b| b.alpha > 0.0)
        .map(BodyInstance::from_body)
        .collect()
}

/// Instances for every worm segment, tail first so heads draw on top
pub fn segment_instances(world: &WormWorld) -> Vec<SegmentInstance> {
    let mut out = Vec::with_capacity(world.segment_count());
    for (o, org) in world.organisms().iter().enumerate() {
        let color = colors::WORMS[o % colors::WORMS.len()];
        for i in org.range().rev() {
            let vel = world.implied_velocity(i);
            let stretch = (vel.length() * STRETCH_GAIN).min(MAX_STRETCH);
            let squash = world.squash()[i] * SEGMENT_SQUASH_GAIN;
            // Keep area roughly constant
            let along = 1.0 + stretch;
            let across = (1.0 - squash) / along.sqrt();
            let angle = if vel.length_squared() > 1e-8 { vel.y.atan2(vel.x) } else { org.heading };
            out.push(SegmentInstance {
                center: world.positions()[i].to_array(),
                radius: world.radii()[i],
                angle,
                scale: [along, across],
                color,
            });
        }
    }
    out
}

/// Fixed colors
pub mod colors {
    pub const WORMS: [[f32; 4]; 4] = [
        [0.93, 0.55, 0.60, 1.0],
        [0.85, 0.65, 0.45, 1.0],
        [0.70, 0.50, 0.75, 1.0],
        [0.55, 0.75, 0.55, 1.0],
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::boundary::Rect;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_instances_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<BodyInstance>(), 11 * 4);
        assert_eq!(std::mem::size_of::<SegmentInstance>(), 10 * 4);
        let instances = [BodyInstance::default(); 3];
        let bytes: &[u8] = bytemuck::cast_slice(&instances);
        assert_eq!(bytes.len(), 3 * 44);
    }

    #[test]
    fn test_body_alpha_and_squash() {
        let mut body = Body::new(1, Vec2::new(5.0, 6.0), 10.0);
        body.alpha = 0.5;
        body.squash = 0.4;
        let inst = BodyInstance::from_body(&body);
        assert_eq!(inst.center, [5.0, 6.0]);
        assert_eq!(inst.color[3], 0.5);
        assert!(inst.scale[0] < 1.0 && inst.scale[1] > 1.0);

        body.alpha = 0.0;
        assert!(body_instances(std::slice::from_ref(&body)).is_empty());
    }

    #[test]
    fn test_resting_segments_are_round() {
        let bounds = Rect { min: Vec2::ZERO, max: Vec2::new(800.0, 600.0) };
        let mut rng = Pcg32::seed_from_u64(1);
        let world = WormWorld::spawn(2, &bounds, &mut rng);
        let instances = segment_instances(&world);
        assert_eq!(instances.len(), world.segment_count());
        assert!(instances.iter().all(|s| s.scale == [1.0, 1.0]));
    }
}

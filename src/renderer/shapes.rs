//! Outline generation for the rubber-wall arena

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;

use crate::sim::{Arena, Edge, RubberWalls};

/// Points per quarter-circle corner
const CORNER_SEGMENTS: usize = 8;

/// Closed polyline of the arena outline, clockwise from the top-left corner.
///
/// Straight edges are sampled `samples_per_edge` times and displaced outward
/// by the wall deformation; corners are rigid arcs.
pub fn wall_silhouette(arena: &Arena, walls: &RubberWalls, samples_per_edge: usize) -> Vec<Vec2> {
    if arena.is_degenerate() {
        return Vec::new();
    }
    let b = arena.bounds();
    let cr = arena.effective_corner_radius();
    let n = samples_per_edge.max(2);
    let mut out = Vec::with_capacity(4 * (n + CORNER_SEGMENTS));

    // Edge walk: (edge, start, end, outward normal)
    let edges = [
        (Edge::Top, Vec2::new(b.min.x + cr, b.min.y), Vec2::new(b.max.x - cr, b.min.y), Vec2::NEG_Y),
        (Edge::Right, Vec2::new(b.max.x, b.min.y + cr), Vec2::new(b.max.x, b.max.y - cr), Vec2::X),
        (Edge::Bottom, Vec2::new(b.max.x - cr, b.max.y), Vec2::new(b.min.x + cr, b.max.y), Vec2::Y),
        (Edge::Left, Vec2::new(b.min.x, b.max.y - cr), Vec2::new(b.min.x, b.min.y + cr), Vec2::NEG_X),
    ];
    // Arc after each edge: (centre, start angle)
    let arcs = [
        (Vec2::new(b.max.x - cr, b.min.y + cr), -FRAC_PI_2),
        (Vec2::new(b.max.x - cr, b.max.y - cr), 0.0),
        (Vec2::new(b.min.x + cr, b.max.y - cr), FRAC_PI_2),
        (Vec2::new(b.min.x + cr, b.min.y + cr), PI),
    ];

    for ((edge, start, end, outward), (center, angle0)) in edges.into_iter().zip(arcs) {
        for i in 0..n {
            let p = start.lerp(end, i as f32 / (n - 1) as f32);
            let t = edge_param(edge, p, arena);
            out.push(p + outward * walls.sample(edge, t));
        }
        for i in 1..CORNER_SEGMENTS {
            let a = angle0 + FRAC_PI_2 * i as f32 / CORNER_SEGMENTS as f32;
            out.push(center + Vec2::new(a.cos(), a.sin()) * cr);
        }
    }
    out
}

/// Position along `edge` (0..1) in the same convention the boundary uses
fn edge_param(edge: Edge, p: Vec2, arena: &Arena) -> f32 {
    let b = arena.bounds();
    match edge {
        Edge::Top | Edge::Bottom => (p.x - b.min.x) / b.width(),
        Edge::Left | Edge::Right => (p.y - b.min.y) / b.height(),
    }
}

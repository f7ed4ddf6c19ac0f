//! Arena boundary collision
//!
//! The arena is a rounded rectangle shrunk by a uniform inset. Straight edges
//! reflect bodies and feed impacts into the rubber walls; corners are rigid
//! arcs that reflect the same way but never deform.

use glam::Vec2;

use super::body::Body;
use super::collision::{ContactEvent, ContactKind, effective_restitution, impact_strength};
use super::wall::{Edge, RubberWalls};
use crate::consts::DIST_EPSILON;
use crate::settings::WallConfig;

/// Fraction of tangential wall slip converted into rolling spin per contact
const WALL_SPIN_GAIN: f32 = 0.5;
/// Squash reached by an impact of strength 1.0
const WALL_MAX_SQUASH: f32 = 0.4;
/// Penetration a sleeper may have before the wall counts as touching it
const SLEEPER_TOUCH_TOLERANCE: f32 = 0.01;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Clamp a circle of `radius` to stay inside
    pub fn clamp_circle(&self, p: Vec2, radius: f32) -> Vec2 {
        let lo = self.min + Vec2::splat(radius);
        let hi = (self.max - Vec2::splat(radius)).max(lo);
        p.clamp(lo, hi)
    }
}

/// Arena geometry in screen space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub inset: f32,
    pub corner_radius: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32, config: &WallConfig) -> Self {
        Self {
            width,
            height,
            inset: config.inset,
            corner_radius: config.corner_radius,
        }
    }

    /// No usable surface (e.g. mid-resize)
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 2.0 * self.inset + 1.0
            || self.height <= 2.0 * self.inset + 1.0
    }

    /// Playable rectangle after the inset
    pub fn bounds(&self) -> Rect {
        Rect {
            min: Vec2::splat(self.inset),
            max: Vec2::new(self.width - self.inset, self.height - self.inset),
        }
    }

    /// Y coordinate a body of `radius` rests at on the floor
    pub fn floor_y(&self, radius: f32) -> f32 {
        self.height - self.inset - radius
    }

    /// Corner radius limited to fit the playable rectangle
    pub fn effective_corner_radius(&self) -> f32 {
        let b = self.bounds();
        self.corner_radius.min(0.5 * b.width()).min(0.5 * b.height()).max(0.0)
    }
}

/// How a mode treats the arena edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryPolicy {
    /// Rounded rectangle with deforming edges
    RubberWalls {
        restitution: f32,
        /// Top edge and top corners let bodies through
        open_top: bool,
    },
    /// Plain inset rectangle: no corner arcs, no deformation, no contact events
    Simple { restitution: f32 },
}

/// Contact response parameters shared by edges and corners
#[derive(Debug, Clone, Copy)]
pub struct WallResponse {
    pub restitution: f32,
    pub rest_velocity: f32,
    pub friction: f32,
}

/// Resolve every body against the arena; wakes any sleeper that is touched
pub fn resolve_boundary(
    bodies: &mut [Body],
    arena: &Arena,
    policy: BoundaryPolicy,
    response: WallResponse,
    walls: &mut RubberWalls,
    events: &mut Vec<ContactEvent>,
) {
    match policy {
        BoundaryPolicy::RubberWalls { restitution, open_top } => {
            let response = WallResponse { restitution, ..response };
            for body in bodies.iter_mut() {
                resolve_rubber(body, arena, open_top, &response, walls, events);
            }
        }
        BoundaryPolicy::Simple { restitution } => {
            let response = WallResponse { restitution, ..response };
            let bounds = arena.bounds();
            for body in bodies.iter_mut() {
                resolve_simple(body, &bounds, &response);
            }
        }
    }
}

fn resolve_rubber(
    body: &mut Body,
    arena: &Arena,
    open_top: bool,
    response: &WallResponse,
    walls: &mut RubberWalls,
    events: &mut Vec<ContactEvent>,
) {
    let b = arena.bounds();
    let cr = arena.effective_corner_radius();
    let r = body.radius;
    // Rounding on the resting contact must not wake a sleeper every step
    let slack = if body.asleep { SLEEPER_TOUCH_TOLERANCE } else { 0.0 };

    // --- Corner arcs ---
    if cr > r {
        let in_left = body.pos.x < b.min.x + cr;
        let in_right = body.pos.x > b.max.x - cr;
        let in_top = body.pos.y < b.min.y + cr;
        let in_bottom = body.pos.y > b.max.y - cr;
        let corner = match (in_left, in_right, in_top, in_bottom) {
            (true, _, true, _) if !open_top => Some(Vec2::new(b.min.x + cr, b.min.y + cr)),
            (_, true, true, _) if !open_top => Some(Vec2::new(b.max.x - cr, b.min.y + cr)),
            (true, _, _, true) => Some(Vec2::new(b.min.x + cr, b.max.y - cr)),
            (_, true, _, true) => Some(Vec2::new(b.max.x - cr, b.max.y - cr)),
            _ => None,
        };
        if let Some(center) = corner {
            let offset = body.pos - center;
            let dist = offset.length();
            let limit = cr - r;
            if dist > limit + slack {
                let outward = if dist > DIST_EPSILON { offset / dist } else { Vec2::Y };
                body.pos = center + outward * limit;
                if body.asleep {
                    body.wake();
                }
                if let Some(vn) = reflect(body, -outward, response) {
                    let contact = center + outward * cr;
                    events.push(ContactEvent::new(ContactKind::Corner, body, vn, contact, arena.width));
                }
            }
            return;
        }
    }

    // --- Straight edges ---
    let span_x = b.width().max(DIST_EPSILON);
    let span_y = b.height().max(DIST_EPSILON);

    if body.pos.x - r < b.min.x - slack {
        body.pos.x = b.min.x + r;
        let t = (body.pos.y - b.min.y) / span_y;
        hit_edge(body, Edge::Left, Vec2::X, t, Vec2::new(b.min.x, body.pos.y), arena, response, walls, events);
    } else if body.pos.x + r > b.max.x + slack {
        body.pos.x = b.max.x - r;
        let t = (body.pos.y - b.min.y) / span_y;
        hit_edge(body, Edge::Right, -Vec2::X, t, Vec2::new(b.max.x, body.pos.y), arena, response, walls, events);
    }

    if body.pos.y + r > b.max.y + slack {
        body.pos.y = b.max.y - r;
        let t = (body.pos.x - b.min.x) / span_x;
        hit_edge(body, Edge::Bottom, -Vec2::Y, t, Vec2::new(body.pos.x, b.max.y), arena, response, walls, events);
    } else if !open_top && body.pos.y - r < b.min.y - slack {
        body.pos.y = b.min.y + r;
        let t = (body.pos.x - b.min.x) / span_x;
        hit_edge(body, Edge::Top, Vec2::Y, t, Vec2::new(body.pos.x, b.min.y), arena, response, walls, events);
    }
}

#[allow(clippy::too_many_arguments)]
fn hit_edge(
    body: &mut Body,
    edge: Edge,
    normal: Vec2,
    t: f32,
    contact: Vec2,
    arena: &Arena,
    response: &WallResponse,
    walls: &mut RubberWalls,
    events: &mut Vec<ContactEvent>,
) {
    if body.asleep {
        body.wake();
    }
    if let Some(vn) = reflect(body, normal, response) {
        walls.register_impact(edge, t, impact_strength(vn));
        events.push(ContactEvent::new(ContactKind::Wall, body, vn, contact, arena.width));
    }
}

/// Reflect the normal velocity component, apply friction, spin and squash.
///
/// `normal` points into the arena. Returns the incoming normal speed when
/// the contact was an impact rather than a resting touch.
fn reflect(body: &mut Body, normal: Vec2, response: &WallResponse) -> Option<f32> {
    let vn = body.vel.dot(normal);
    if vn >= 0.0 {
        return None;
    }
    let e = effective_restitution(vn, response.restitution, response.rest_velocity);
    body.vel -= normal * (vn * (1.0 + e));

    let tangent = Vec2::new(-normal.y, normal.x);
    let vt = body.vel.dot(tangent);
    body.vel -= tangent * (vt * response.friction);

    // Roll toward the spin matching the remaining slip
    let rolling = -vt / body.radius;
    body.angular_vel += (rolling - body.angular_vel) * WALL_SPIN_GAIN;

    let impact = impact_strength(vn);
    body.apply_squash(impact * WALL_MAX_SQUASH, normal);

    (vn.abs() >= response.rest_velocity).then_some(vn.abs())
}

fn resolve_simple(body: &mut Body, bounds: &Rect, response: &WallResponse) {
    let r = body.radius;
    let e = response.restitution;
    if body.pos.x - r < bounds.min.x {
        body.pos.x = bounds.min.x + r;
        body.vel.x = body.vel.x.abs() * e;
    } else if body.pos.x + r > bounds.max.x {
        body.pos.x = bounds.max.x - r;
        body.vel.x = -body.vel.x.abs() * e;
    }
    if body.pos.y - r < bounds.min.y {
        body.pos.y = bounds.min.y + r;
        body.vel.y = body.vel.y.abs() * e;
    } else if body.pos.y + r > bounds.max.y {
        body.pos.y = bounds.max.y - r;
        body.vel.y = -body.vel.y.abs() * e;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Arena, RubberWalls, WallResponse) {
        let config = WallConfig::default();
        let arena = Arena::new(800.0, 600.0, &config);
        let walls = RubberWalls::new(&config);
        let response = WallResponse { restitution: 0.5, rest_velocity: 40.0, friction: 0.05 };
        (arena, walls, response)
    }

    fn rubber(open_top: bool) -> BoundaryPolicy {
        BoundaryPolicy::RubberWalls { restitution: 0.5, open_top }
    }

    #[test]
    fn test_floor_bounce_reflects_and_deforms() {
        let (arena, mut walls, response) = setup();
        let mut bodies = vec![Body::new(1, Vec2::new(400.0, 592.0), 10.0).with_velocity(Vec2::new(0.0, 300.0))];
        let mut events = Vec::new();
        resolve_boundary(&mut bodies, &arena, rubber(false), response, &mut walls, &mut events);

        assert!((bodies[0].pos.y - arena.floor_y(10.0)).abs() < 1e-4);
        assert!((bodies[0].vel.y + 150.0).abs() < 1e-3);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ContactKind::Wall);
        walls.update(1.0 / 60.0);
        assert!(walls.sample(Edge::Bottom, 0.5) > 0.0);
    }

    #[test]
    fn test_resting_touch_is_silent() {
        let (arena, mut walls, response) = setup();
        let mut bodies = vec![Body::new(1, Vec2::new(400.0, 586.5), 10.0).with_velocity(Vec2::new(0.0, 12.5))];
        let mut events = Vec::new();
        resolve_boundary(&mut bodies, &arena, rubber(false), response, &mut walls, &mut events);
        assert_eq!(bodies[0].vel.y, 0.0);
        assert!(events.is_empty());
        assert!(walls.is_at_rest());
    }

    #[test]
    fn test_open_top_lets_bodies_in() {
        let (arena, mut walls, response) = setup();
        let mut bodies = vec![
            Body::new(1, Vec2::new(400.0, -50.0), 10.0).with_velocity(Vec2::new(0.0, 80.0)),
            Body::new(2, Vec2::new(10.0, -50.0), 10.0),
        ];
        let mut events = Vec::new();
        resolve_boundary(&mut bodies, &arena, rubber(true), response, &mut walls, &mut events);
        assert_eq!(bodies[0].pos.y, -50.0);
        // Side walls still apply above the arena
        assert_eq!(bodies[1].pos.x, arena.inset + 10.0);

        resolve_boundary(&mut bodies, &arena, rubber(false), response, &mut walls, &mut events);
        assert!(bodies[0].pos.y >= arena.inset + 10.0);
    }

    #[test]
    fn test_corner_is_rigid() {
        let (arena, mut walls, response) = setup();
        let mut bodies = vec![Body::new(1, Vec2::new(796.0, 596.0), 10.0).with_velocity(Vec2::new(200.0, 200.0))];
        let mut events = Vec::new();
        resolve_boundary(&mut bodies, &arena, rubber(false), response, &mut walls, &mut events);

        let b = arena.bounds();
        let center = Vec2::new(b.max.x - arena.corner_radius, b.max.y - arena.corner_radius);
        let dist = bodies[0].pos.distance(center);
        assert!(dist <= arena.corner_radius - 10.0 + 1e-3);
        assert!(bodies[0].vel.x < 0.0 && bodies[0].vel.y < 0.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ContactKind::Corner);
        walls.update(1.0 / 60.0);
        assert!(walls.is_at_rest());
    }

    #[test]
    fn test_wall_touch_wakes_sleeper() {
        let (arena, mut walls, response) = setup();
        let mut body = Body::new(1, Vec2::new(3.0, 300.0), 10.0);
        body.asleep = true;
        let mut bodies = vec![body];
        let mut events = Vec::new();
        resolve_boundary(&mut bodies, &arena, rubber(false), response, &mut walls, &mut events);
        assert!(!bodies[0].asleep);
    }

    #[test]
    fn test_resting_sleeper_stays_asleep() {
        let (arena, mut walls, response) = setup();
        let mut body = Body::new(1, Vec2::new(300.0, 0.0), 7.3);
        body.pos.y = arena.floor_y(body.radius);
        body.asleep = true;
        let mut bodies = vec![body];
        let mut events = Vec::new();
        resolve_boundary(&mut bodies, &arena, rubber(false), response, &mut walls, &mut events);
        assert!(bodies[0].asleep);
        assert!(events.is_empty());
    }

    #[test]
    fn test_simple_policy_has_no_side_effects() {
        let (arena, mut walls, response) = setup();
        let mut bodies = vec![Body::new(1, Vec2::new(795.0, 595.0), 10.0).with_velocity(Vec2::new(300.0, 300.0))];
        let mut events = Vec::new();
        let policy = BoundaryPolicy::Simple { restitution: 0.3 };
        resolve_boundary(&mut bodies, &arena, policy, response, &mut walls, &mut events);
        assert_eq!(bodies[0].pos, Vec2::new(786.0, 586.0));
        assert!((bodies[0].vel.x + 90.0).abs() < 1e-3);
        assert!(events.is_empty());
        assert!(walls.is_at_rest());
    }

    #[test]
    fn test_degenerate_arena() {
        let config = WallConfig::default();
        assert!(Arena::new(0.0, 600.0, &config).is_degenerate());
        assert!(!Arena::new(800.0, 600.0, &config).is_degenerate());
    }
}

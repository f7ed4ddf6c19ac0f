//! Ball-ball narrow-phase resolver
//!
//! Iterative positional correction plus restitution impulse, with rolling spin
//! and squash for the renderer. Sound is not triggered here: each physical
//! impact is reported once as a [`ContactEvent`] and dispatched elsewhere.

use glam::Vec2;

use super::body::{Body, BodyId};
use super::spatial::{CollisionPair, SpatialHash};
use crate::consts::{DIST_EPSILON, IMPACT_REF_SPEED};

/// What the body hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Ball,
    Wall,
    Corner,
}

/// One physical impact, reported at most once per pair per tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub kind: ContactKind,
    /// Radius of the sounding body (mean radius for ball pairs)
    pub radius: f32,
    /// Normalized impact strength 0..1
    pub impact: f32,
    /// Horizontal position normalized to the arena width, 0..1
    pub pan: f32,
    pub position: Vec2,
    pub body_id: Option<BodyId>,
}

impl ContactEvent {
    pub fn new(kind: ContactKind, body: &Body, normal_speed: f32, position: Vec2, width: f32) -> Self {
        Self {
            kind,
            radius: body.radius,
            impact: impact_strength(normal_speed),
            pan: normalized_pan(position.x, width),
            position,
            body_id: Some(body.id),
        }
    }
}

/// Map a normal speed to 0..1
#[inline]
pub fn impact_strength(normal_speed: f32) -> f32 {
    (normal_speed.abs() / IMPACT_REF_SPEED).clamp(0.0, 1.0)
}

#[inline]
pub fn normalized_pan(x: f32, width: f32) -> f32 {
    if width > 0.0 { (x / width).clamp(0.0, 1.0) } else { 0.5 }
}

/// Restitution with a rest threshold: slow contacts don't bounce
#[inline]
pub fn effective_restitution(normal_speed: f32, restitution: f32, rest_velocity: f32) -> f32 {
    if normal_speed.abs() < rest_velocity {
        0.0
    } else {
        restitution
    }
}

/// Resolver tuning, chosen per mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverParams {
    pub iterations: u32,
    /// Fraction of penetration beyond `slop` corrected per iteration
    pub correction_percent: f32,
    pub slop: f32,
    pub restitution: f32,
    pub rest_velocity: f32,
    pub friction: f32,
    /// Angular velocity gained per unit of tangential slip
    pub spin_gain: f32,
    pub max_squash: f32,
    /// Hard cap on per-pair correction (soft variant)
    pub max_correction: Option<f32>,
    /// Penetration-only passes after each full pass
    pub position_passes: u32,
    pub emit_contacts: bool,
    /// Gap kept between ball surfaces
    pub spacing: f32,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            iterations: 8,
            correction_percent: 0.8,
            slop: 0.05,
            restitution: 0.69,
            rest_velocity: 40.0,
            friction: 0.05,
            spin_gain: 0.35,
            max_squash: 0.35,
            max_correction: None,
            position_passes: 2,
            emit_contacts: true,
            spacing: 0.0,
        }
    }
}

impl SolverParams {
    /// Gentle variant: small corrections, no pops, optionally silent
    pub fn soft(self, emit_contacts: bool) -> Self {
        Self {
            correction_percent: 0.35,
            max_correction: Some(1.5),
            position_passes: 0,
            emit_contacts,
            ..self
        }
    }
}

/// Resolve ball-ball contacts for `params.iterations` iterations.
///
/// Each iteration is one full pass (correction, impulse, friction, spin)
/// followed by `params.position_passes` penetration-only passes. The
/// broad-phase is re-run before any pass that follows a positional
/// correction, so contacts created by the previous pass are resolved too.
/// Pairs are visited in descending overlap order. Contact events come from
/// the first pass only and are appended to `events`.
pub fn resolve_ball_collisions(
    bodies: &mut [Body],
    hash: &mut SpatialHash,
    pairs: &mut Vec<CollisionPair>,
    params: &SolverParams,
    arena_width: f32,
    events: &mut Vec<ContactEvent>,
) {
    let mut stale = true;
    for iteration in 0..params.iterations {
        let first = iteration == 0;
        for pass in 0..=params.position_passes {
            if stale {
                hash.rebuild(bodies, params.spacing);
                hash.collect_pairs(bodies, params.spacing, pairs);
                stale = false;
            }
            if pairs.is_empty() {
                return;
            }

            for pair in pairs.iter() {
                debug_assert!(pair.a < pair.b);
                let (lo, hi) = bodies.split_at_mut(pair.b);
                let a = &mut lo[pair.a];
                let b = &mut hi[0];

                if a.asleep && b.asleep {
                    continue;
                }
                if a.asleep {
                    a.wake();
                } else if b.asleep {
                    b.wake();
                }

                if pass == 0 {
                    let outcome = resolve_pair(a, b, params, first, arena_width);
                    stale |= outcome.moved;
                    if let Some(event) = outcome.event {
                        events.push(event);
                    }
                } else if let Some((normal, penetration)) = contact(a, b, params.spacing) {
                    stale |= correct(a, b, normal, penetration, params);
                }
            }
        }
    }
}

/// What resolving one pair did
#[derive(Debug, Default)]
struct PairOutcome {
    /// Positions changed, so the pair list is out of date
    moved: bool,
    event: Option<ContactEvent>,
}

/// Resolve one pair; reports a contact event on an impact in the first pass
fn resolve_pair(
    a: &mut Body,
    b: &mut Body,
    params: &SolverParams,
    first_iteration: bool,
    arena_width: f32,
) -> PairOutcome {
    let Some((normal, penetration)) = contact(a, b, params.spacing) else {
        return PairOutcome::default();
    };
    let moved = correct(a, b, normal, penetration, params);

    let inv_a = a.inv_mass();
    let inv_b = b.inv_mass();
    let inv_sum = inv_a + inv_b;

    // --- Velocity resolution ---
    let rel = b.vel - a.vel;
    let vn = rel.dot(normal);
    if vn >= 0.0 {
        return PairOutcome { moved, event: None };
    }

    let e = effective_restitution(vn, params.restitution, params.rest_velocity);
    let j = -(1.0 + e) * vn / inv_sum;
    a.vel -= normal * (j * inv_a);
    b.vel += normal * (j * inv_b);

    // --- Friction and spin ---
    let tangent = Vec2::new(-normal.y, normal.x);
    let vt = rel.dot(tangent);
    let max_friction = params.friction * j;
    let jt = (-vt / inv_sum).clamp(-max_friction, max_friction);
    a.vel -= tangent * (jt * inv_a);
    b.vel += tangent * (jt * inv_b);

    a.angular_vel += vt * params.spin_gain / a.radius;
    b.angular_vel -= vt * params.spin_gain / b.radius;

    // --- Squash (render only) ---
    let impact = impact_strength(vn);
    let squash = (impact * params.max_squash).min(params.max_squash);
    a.apply_squash(squash, normal);
    b.apply_squash(squash, normal);

    // --- Contact notification ---
    let is_impact = vn.abs() >= params.rest_velocity;
    let event = (first_iteration && params.emit_contacts && is_impact).then(|| {
        let contact = a.pos + normal * a.radius;
        ContactEvent {
            kind: ContactKind::Ball,
            radius: 0.5 * (a.radius + b.radius),
            impact,
            pan: normalized_pan(contact.x, arena_width),
            position: contact,
            body_id: Some(a.id),
        }
    });
    PairOutcome { moved, event }
}

/// Contact normal (from `a` to `b`) and penetration depth, if they overlap
fn contact(a: &Body, b: &Body, spacing: f32) -> Option<(Vec2, f32)> {
    let delta = b.pos - a.pos;
    let reach = a.radius + b.radius + spacing;
    let dist_sq = delta.length_squared();
    if dist_sq >= reach * reach {
        return None;
    }
    let dist = dist_sq.sqrt();
    let normal = if dist > DIST_EPSILON {
        delta / dist
    } else {
        // Coincident centres: direction derived from the ids
        let angle = (a.id.wrapping_mul(2654435761) ^ b.id) as f32 * 1e-3;
        Vec2::new(angle.cos(), angle.sin())
    };
    Some((normal, reach - dist.max(DIST_EPSILON)))
}

/// Push the pair apart by `percent` of the penetration beyond the slop.
///
/// Returns true when positions changed.
fn correct(a: &mut Body, b: &mut Body, normal: Vec2, penetration: f32, params: &SolverParams) -> bool {
    let mut correction = (penetration - params.slop).max(0.0) * params.correction_percent;
    if let Some(cap) = params.max_correction {
        correction = correction.min(cap);
    }
    if correction <= 0.0 {
        return false;
    }
    let inv_a = a.inv_mass();
    let inv_b = b.inv_mass();
    let push = normal * (correction / (inv_a + inv_b));
    a.pos -= push * inv_a;
    b.pos += push * inv_b;
    true
}

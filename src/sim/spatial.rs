//! Spatial hash broad-phase
//!
//! Buckets bodies into a uniform grid and emits overlapping candidate pairs,
//! worst penetration first. Rebuilt on every resolution pass.

use hashbrown::HashMap;

use super::body::Body;

type CellKey = (i32, i32);

/// An overlapping pair found by the broad-phase (`a < b`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionPair {
    pub a: usize,
    pub b: usize,
    /// Penetration depth including spacing (px)
    pub overlap: f32,
}

/// Uniform grid keyed by cell coordinates
#[derive(Debug, Default)]
pub struct SpatialHash {
    cell_size: f32,
    buckets: HashMap<CellKey, Vec<usize>>,
    /// Cells that received at least one body this rebuild
    occupied: Vec<CellKey>,
}

impl SpatialHash {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn key(&self, x: f32, y: f32) -> CellKey {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Re-bucket every body. Cell size covers the largest possible contact.
    pub fn rebuild(&mut self, bodies: &[Body], spacing: f32) {
        for key in &self.occupied {
            if let Some(bucket) = self.buckets.get_mut(key) {
                bucket.clear();
            }
        }
        self.occupied.clear();
        if self.buckets.len() > 4 * bodies.len() + 64 {
            self.buckets.clear();
        }

        let max_radius = bodies.iter().map(|b| b.radius).fold(0.0_f32, f32::max);
        self.cell_size = (2.0 * max_radius + spacing).max(1.0);

        for (i, body) in bodies.iter().enumerate() {
            if !body.pos.is_finite() {
                continue;
            }
            let key = self.key(body.pos.x, body.pos.y);
            let bucket = self.buckets.entry(key).or_default();
            if bucket.is_empty() {
                self.occupied.push(key);
            }
            bucket.push(i);
        }
    }

    /// Emit overlapping pairs sorted by descending overlap.
    ///
    /// Ties fall back to index order so the result never depends on bucket
    /// iteration order.
    pub fn collect_pairs(&self, bodies: &[Body], spacing: f32, out: &mut Vec<CollisionPair>) {
        out.clear();
        for &(cx, cy) in &self.occupied {
            let Some(cell) = self.buckets.get(&(cx, cy)) else {
                continue;
            };
            for &i in cell {
                let a = &bodies[i];
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let Some(neighbor) = self.buckets.get(&(cx + dx, cy + dy)) else {
                            continue;
                        };
                        for &j in neighbor {
                            if j <= i {
                                continue;
                            }
                            let b = &bodies[j];
                            let reach = a.radius + b.radius + spacing;
                            let dist_sq = a.pos.distance_squared(b.pos);
                            if dist_sq < reach * reach {
                                out.push(CollisionPair {
                                    a: i,
                                    b: j,
                                    overlap: reach - dist_sq.sqrt(),
                                });
                            }
                        }
                    }
                }
            }
        }
        out.sort_by(|p, q| {
            q.overlap
                .total_cmp(&p.overlap)
                .then(p.a.cmp(&q.a))
                .then(p.b.cmp(&q.b))
        });
    }

    /// Indices of bodies whose cell lies within `radius` of `center`
    pub fn query(&self, center: glam::Vec2, radius: f32, out: &mut Vec<usize>) {
        out.clear();
        if self.cell_size <= 0.0 {
            return;
        }
        let (x0, y0) = self.key(center.x - radius, center.y - radius);
        let (x1, y1) = self.key(center.x + radius, center.y + radius);
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                if let Some(bucket) = self.buckets.get(&(cx, cy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out.sort_unstable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    fn body(i: u32, x: f32, y: f32, r: f32) -> Body {
        Body::new(i, Vec2::new(x, y), r)
    }

    #[test]
    fn test_pairs_sorted_by_overlap() {
        let bodies = vec![
            body(0, 0.0, 0.0, 10.0),
            body(1, 18.0, 0.0, 10.0),  // overlap 2 with 0
            body(2, 100.0, 0.0, 10.0),
            body(3, 105.0, 0.0, 10.0), // overlap 15 with 2
            body(4, 300.0, 0.0, 10.0),
        ];
        let mut hash = SpatialHash::new();
        hash.rebuild(&bodies, 0.0);
        let mut pairs = Vec::new();
        hash.collect_pairs(&bodies, 0.0, &mut pairs);

        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].a, pairs[0].b), (2, 3));
        assert!((pairs[0].overlap - 15.0).abs() < 1e-4);
        assert_eq!((pairs[1].a, pairs[1].b), (0, 1));
    }

    #[test]
    fn test_spacing_extends_contact() {
        let bodies = vec![body(0, 0.0, 0.0, 10.0), body(1, 21.0, 0.0, 10.0)];
        let mut hash = SpatialHash::new();
        let mut pairs = Vec::new();

        hash.rebuild(&bodies, 0.0);
        hash.collect_pairs(&bodies, 0.0, &mut pairs);
        assert!(pairs.is_empty());

        hash.rebuild(&bodies, 3.0);
        hash.collect_pairs(&bodies, 3.0, &mut pairs);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_matches_brute_force() {
        let mut rng = Pcg32::seed_from_u64(7);
        let bodies: Vec<Body> = (0..200)
            .map(|i| {
                body(
                    i,
                    rng.random_range(0.0..400.0),
                    rng.random_range(-50.0..300.0),
                    rng.random_range(3.0..12.0),
                )
            })
            .collect();

        let mut hash = SpatialHash::new();
        hash.rebuild(&bodies, 1.5);
        let mut pairs = Vec::new();
        hash.collect_pairs(&bodies, 1.5, &mut pairs);

        let mut expected = 0;
        for i in 0..bodies.len() {
            for j in i + 1..bodies.len() {
                let reach = bodies[i].radius + bodies[j].radius + 1.5;
                if bodies[i].pos.distance_squared(bodies[j].pos) < reach * reach {
                    expected += 1;
                }
            }
        }
        assert_eq!(pairs.len(), expected);
        assert!(pairs.windows(2).all(|w| w[0].overlap >= w[1].overlap));
        assert!(pairs.iter().all(|p| p.a < p.b));
    }

    #[test]
    fn test_rebuild_reuses_buckets() {
        let mut bodies = vec![body(0, 0.0, 0.0, 5.0), body(1, 4.0, 0.0, 5.0)];
        let mut hash = SpatialHash::new();
        let mut pairs = Vec::new();
        hash.rebuild(&bodies, 0.0);
        hash.collect_pairs(&bodies, 0.0, &mut pairs);
        assert_eq!(pairs.len(), 1);

        bodies[1].pos = Vec2::new(500.0, 500.0);
        hash.rebuild(&bodies, 0.0);
        hash.collect_pairs(&bodies, 0.0, &mut pairs);
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_query_finds_nearby() {
        let bodies = vec![body(0, 0.0, 0.0, 5.0), body(1, 200.0, 0.0, 5.0)];
        let mut hash = SpatialHash::new();
        hash.rebuild(&bodies, 0.0);
        let mut found = Vec::new();
        hash.query(Vec2::new(2.0, 2.0), 10.0, &mut found);
        assert_eq!(found, vec![0]);
    }
}

//! Sweep-and-prune broadphase: finds candidate pairs whose AABBs
//! overlap, cheaply rejecting the rest before narrowphase SAT runs.
//!
//! Grounded on `original_source/engine/collision/detector.py`.

use crate::body::{can_collide, Body, BodyId};
use crate::world::World;

/// A candidate pair that passed the AABB overlap and collision-filter
/// tests; narrowphase still has to confirm actual intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub a: BodyId,
    pub b: BodyId,
}

fn should_test(a: &Body, b: &Body) -> bool {
    if a.is_static && b.is_static {
        return false;
    }
    if (a.is_static || a.is_sleeping) && (b.is_static || b.is_sleeping) {
        return false;
    }
    can_collide(&a.collision_filter, &b.collision_filter)
}

/// Returns every pair of bodies (by id) whose bounds overlap and whose
/// collision filters allow testing, using a sweep along the x axis to
/// cut down the naive O(n^2) comparison.
///
/// Static-vs-static and sleeping-vs-sleeping (or sleeping-vs-static)
/// pairs are skipped entirely, matching the reference engine's early
/// exits in `Detector.collisions`.
pub fn find_candidates(bodies: &[BodyId], world: &World) -> Vec<Candidate> {
    let mut sorted: Vec<BodyId> = bodies
        .iter()
        .copied()
        .filter(|id| world.bodies.contains_key(*id))
        .collect();
    sorted.sort_by(|&a, &b| {
        world.bodies[a]
            .bounds
            .min
            .x
            .partial_cmp(&world.bodies[b].bounds.min.x)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut candidates = Vec::new();
    for (i, &a_id) in sorted.iter().enumerate() {
        let a = &world.bodies[a_id];
        for &b_id in &sorted[i + 1..] {
            let b = &world.bodies[b_id];
            if b.bounds.min.x > a.bounds.max.x {
                // Every body further along the sweep starts even later.
                break;
            }
            if !should_test(a, b) {
                continue;
            }
            if a.bounds.overlaps(&b.bounds) {
                candidates.push(Candidate { a: a_id, b: b_id });
            }
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyOptions;
    use crate::geometry::Point;

    fn rect(w: f64, h: f64) -> Vec<Point> {
        vec![
            Point::new(-w / 2.0, -h / 2.0),
            Point::new(w / 2.0, -h / 2.0),
            Point::new(w / 2.0, h / 2.0),
            Point::new(-w / 2.0, h / 2.0),
        ]
    }

    #[test]
    fn overlapping_bodies_are_candidates() {
        let mut world = World::new();
        let a = world
            .create_body(BodyOptions {
                position: Point::new(0.0, 0.0),
                vertices: rect(20.0, 20.0),
                ..Default::default()
            })
            .unwrap();
        let b = world
            .create_body(BodyOptions {
                position: Point::new(10.0, 0.0),
                vertices: rect(20.0, 20.0),
                ..Default::default()
            })
            .unwrap();

        let candidates = find_candidates(&[a, b], &world);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn far_apart_bodies_are_not_candidates() {
        let mut world = World::new();
        let a = world
            .create_body(BodyOptions {
                position: Point::new(0.0, 0.0),
                vertices: rect(20.0, 20.0),
                ..Default::default()
            })
            .unwrap();
        let b = world
            .create_body(BodyOptions {
                position: Point::new(1000.0, 0.0),
                vertices: rect(20.0, 20.0),
                ..Default::default()
            })
            .unwrap();

        assert!(find_candidates(&[a, b], &world).is_empty());
    }

    #[test]
    fn two_static_bodies_are_never_candidates() {
        let mut world = World::new();
        let a = world
            .create_body(BodyOptions {
                position: Point::new(0.0, 0.0),
                vertices: rect(20.0, 20.0),
                is_static: true,
                ..Default::default()
            })
            .unwrap();
        let b = world
            .create_body(BodyOptions {
                position: Point::new(5.0, 0.0),
                vertices: rect(20.0, 20.0),
                is_static: true,
                ..Default::default()
            })
            .unwrap();

        assert!(find_candidates(&[a, b], &world).is_empty());
    }
}

//! Distance constraints: springs, ropes, and rigid links between two
//! bodies (or a body and a fixed world point).
//!
//! This is a force/Gauss-Seidel solve lifted directly from
//! `original_source/engine/constraint/constraint.py` (itself a
//! Matter.js `Constraint.js` port) — stiffness/damping/force, not an
//! XPBD compliance/lambda solve. `tversteeg-castle-game`'s own
//! `physics::constraint::distance` is XPBD and is deliberately not
//! reused for the algorithm.

use slotmap::new_key_type;

use crate::body::{Body, BodyId};
use crate::geometry::{self, Point};
use crate::world::World;

new_key_type! {
    /// Stable handle to a [`Constraint`] living in a [`World`].
    pub struct ConstraintId;
}

/// Smallest current length ever used in the solve, preventing a
/// division by zero when both endpoints coincide.
const MIN_LENGTH: f64 = 1e-6;
/// Constant multiplier on the torque term; kept as a named constant
/// (always 1) to mirror the reference engine's `_torque_dampen`.
const TORQUE_DAMPEN: f64 = 1.0;

/// Options accepted by [`World::create_constraint`].
#[derive(Debug, Clone)]
pub struct ConstraintOptions {
    /// First endpoint body; `None` anchors `point_a` to a fixed world
    /// point instead.
    pub body_a: Option<BodyId>,
    /// Local-space offset from `body_a`'s centroid, or a world point
    /// when `body_a` is `None`.
    pub point_a: Point,
    /// Second endpoint body; `None` anchors `point_b` to a fixed world
    /// point instead.
    pub body_b: Option<BodyId>,
    /// Local-space offset from `body_b`'s centroid, or a world point
    /// when `body_b` is `None`.
    pub point_b: Point,
    /// Rest length; if `None`, computed from the endpoints' initial
    /// separation at construction.
    pub length: Option<f64>,
    /// `0..=1`, how much of the length error is corrected per solve.
    pub stiffness: f64,
    /// `0..=1`, velocity damping applied alongside stiffness.
    pub damping: f64,
    /// Rotational stiffness applied when both endpoints are bodies.
    pub angular_stiffness: f64,
}

impl Default for ConstraintOptions {
    fn default() -> Self {
        Self {
            body_a: None,
            point_a: Point::zero(),
            body_b: None,
            point_b: Point::zero(),
            length: None,
            stiffness: 1.0,
            damping: 0.0,
            angular_stiffness: 0.0,
        }
    }
}

/// A distance constraint between two endpoints, each either a body
/// (plus local offset) or a fixed world point.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub id: ConstraintId,
    pub label: String,
    pub body_a: Option<BodyId>,
    pub point_a: Point,
    pub body_b: Option<BodyId>,
    pub point_b: Point,
    pub length: f64,
    pub stiffness: f64,
    pub damping: f64,
    pub angular_stiffness: f64,
    /// Snapshot of `body_a`'s angle at construction, used by the
    /// angular-stiffness term.
    pub angle_a: f64,
    /// Snapshot of `body_b`'s angle at construction.
    pub angle_b: f64,
}

fn world_point(body: Option<&Body>, local_point: Point) -> Point {
    match body {
        Some(body) => body.position + geometry::rotate(local_point, body.angle),
        None => local_point,
    }
}

impl Constraint {
    pub(crate) fn new(placeholder_id: ConstraintId, options: ConstraintOptions) -> Self {
        Self {
            id: placeholder_id,
            label: "Constraint".into(),
            body_a: options.body_a,
            point_a: options.point_a,
            body_b: options.body_b,
            point_b: options.point_b,
            length: options.length.unwrap_or(0.0),
            stiffness: options.stiffness,
            damping: options.damping,
            angular_stiffness: options.angular_stiffness,
            angle_a: 0.0,
            angle_b: 0.0,
        }
    }

    /// World-space position of endpoint A.
    pub fn point_a_world(&self, world: &World) -> Point {
        world_point(self.body_a.and_then(|id| world.bodies.get(id)), self.point_a)
    }

    /// World-space position of endpoint B.
    pub fn point_b_world(&self, world: &World) -> Point {
        world_point(self.body_b.and_then(|id| world.bodies.get(id)), self.point_b)
    }

    /// Current Euclidean distance between the two endpoints.
    pub fn current_length(&self, world: &World) -> f64 {
        (self.point_a_world(world) - self.point_b_world(world)).magnitude()
    }
}

/// Finalizes `length` for any constraint created without one (derived
/// from the endpoints' separation at construction time) and snapshots
/// each endpoint body's angle for the angular-stiffness term. Call once
/// right after insertion.
pub fn initialize(constraint_id: ConstraintId, world: &mut World) {
    let (point_a, point_b, angle_a, angle_b) = {
        let constraint = &world.constraints[constraint_id];
        (
            constraint.point_a_world(world),
            constraint.point_b_world(world),
            constraint
                .body_a
                .and_then(|id| world.bodies.get(id))
                .map(|b| b.angle)
                .unwrap_or(0.0),
            constraint
                .body_b
                .and_then(|id| world.bodies.get(id))
                .map(|b| b.angle)
                .unwrap_or(0.0),
        )
    };

    let constraint = &mut world.constraints[constraint_id];
    if constraint.length == 0.0 {
        constraint.length = (point_a - point_b).magnitude();
    }
    constraint.angle_a = angle_a;
    constraint.angle_b = angle_b;
}

/// Clears `constraint_impulse` on every body referenced by `ids` before
/// a fresh round of `solve`.
pub fn pre_solve_all(ids: &[ConstraintId], world: &mut World) {
    for &id in ids {
        let Some(constraint) = world.constraints.get(id) else {
            continue;
        };
        let (a, b) = (constraint.body_a, constraint.body_b);
        if let Some(a) = a {
            if let Some(body) = world.bodies.get_mut(a) {
                body.position_prev += body.constraint_impulse.linear;
                body.angle_prev += body.constraint_impulse.angle;
            }
        }
        if let Some(b) = b {
            if let Some(body) = world.bodies.get_mut(b) {
                body.position_prev += body.constraint_impulse.linear;
                body.angle_prev += body.constraint_impulse.angle;
            }
        }
    }
}

/// Runs `iterations` Gauss-Seidel sweeps over `ids`, solving constraints
/// between two static/fixed endpoints first each sweep for stability
/// (matching the reference engine's ordering), then the rest.
pub fn solve_all(ids: &[ConstraintId], world: &mut World, iterations: u32, time_scale: f64) {
    let (fixed, free): (Vec<ConstraintId>, Vec<ConstraintId>) = ids.iter().copied().partition(|&id| {
        world
            .constraints
            .get(id)
            .map(|c| is_effectively_static(c, world))
            .unwrap_or(false)
    });

    for _ in 0..iterations {
        for &id in &fixed {
            solve(id, world, time_scale);
        }
        for &id in &free {
            solve(id, world, time_scale);
        }
    }
}

fn is_effectively_static(constraint: &Constraint, world: &World) -> bool {
    let a_static = constraint
        .body_a
        .and_then(|id| world.bodies.get(id))
        .map(|b| b.is_static)
        .unwrap_or(true);
    let b_static = constraint
        .body_b
        .and_then(|id| world.bodies.get(id))
        .map(|b| b.is_static)
        .unwrap_or(true);
    a_static || b_static
}

/// Applies one Gauss-Seidel correction step to a single constraint:
/// a spring-like force proportional to length error (stiffness/damping,
/// not XPBD compliance), distributed between endpoints inversely
/// weighted by mass, plus the lever-arm torque that force naturally
/// imparts when it's applied away from a body's centroid.
pub fn solve(id: ConstraintId, world: &mut World, time_scale: f64) {
    let Some(constraint) = world.constraints.get(id).cloned() else {
        return;
    };

    let (point_a, point_b) = (
        constraint.point_a_world(world),
        constraint.point_b_world(world),
    );

    let delta = point_a - point_b;
    let current_length = delta.magnitude().max(MIN_LENGTH);

    let (inv_mass_a, inv_inertia_a) = constraint
        .body_a
        .and_then(|id| world.bodies.get(id))
        .map(|b| (b.inverse_mass, b.inverse_inertia))
        .unwrap_or((0.0, 0.0));
    let (inv_mass_b, inv_inertia_b) = constraint
        .body_b
        .and_then(|id| world.bodies.get(id))
        .map(|b| (b.inverse_mass, b.inverse_inertia))
        .unwrap_or((0.0, 0.0));

    let mass_total = inv_mass_a + inv_mass_b;
    let inertia_total = inv_inertia_a + inv_inertia_b;
    let resistance_total = mass_total + inertia_total;
    if resistance_total == 0.0 {
        return;
    }

    let difference = (current_length - constraint.length) / current_length;
    let is_rigid = constraint.stiffness >= 1.0 || constraint.length == 0.0;
    let stiffness = if is_rigid {
        constraint.stiffness * time_scale
    } else {
        constraint.stiffness * time_scale * time_scale
    };
    let damping = constraint.damping * time_scale;
    let force = delta * (difference * stiffness);

    // Anchor offsets relative to each body's (pre-solve) position, used
    // by the torque term below; captured before either body moves.
    let offset_a = constraint
        .body_a
        .and_then(|id| world.bodies.get(id))
        .map(|b| point_a - b.position);
    let offset_b = constraint
        .body_b
        .and_then(|id| world.bodies.get(id))
        .map(|b| point_b - b.position);

    let (normal, normal_velocity) = if damping > 0.0 {
        let normal = delta / current_length;
        let vel_a = constraint
            .body_a
            .and_then(|id| world.bodies.get(id))
            .map(|b| b.position - b.position_prev)
            .unwrap_or_default();
        let vel_b = constraint
            .body_b
            .and_then(|id| world.bodies.get(id))
            .map(|b| b.position - b.position_prev)
            .unwrap_or_default();
        (normal, normal.dot(vel_b - vel_a))
    } else {
        (Point::zero(), 0.0)
    };

    if let Some(a) = constraint.body_a {
        if let Some(body) = world.bodies.get_mut(a) {
            if !body.is_static && !body.is_sleeping {
                let share = if mass_total != 0.0 { inv_mass_a / mass_total } else { 0.0 };
                let move_delta = -force * share;

                body.constraint_impulse.linear += move_delta;
                body.position += move_delta;

                if damping > 0.0 {
                    body.position_prev -= normal * (damping * normal_velocity * share);
                }

                if let Some(offset) = offset_a {
                    let torque = (geometry::cross(offset, force) / resistance_total)
                        * TORQUE_DAMPEN
                        * inv_inertia_a
                        * (1.0 - constraint.angular_stiffness);
                    body.constraint_impulse.angle -= torque;
                    body.angle -= torque;
                }
            }
        }
    }
    if let Some(b) = constraint.body_b {
        if let Some(body) = world.bodies.get_mut(b) {
            if !body.is_static && !body.is_sleeping {
                let share = if mass_total != 0.0 { inv_mass_b / mass_total } else { 0.0 };
                let move_delta = force * share;

                body.constraint_impulse.linear += move_delta;
                body.position += move_delta;

                if damping > 0.0 {
                    body.position_prev += normal * (damping * normal_velocity * share);
                }

                if let Some(offset) = offset_b {
                    let torque = (geometry::cross(offset, force) / resistance_total)
                        * TORQUE_DAMPEN
                        * inv_inertia_b
                        * (1.0 - constraint.angular_stiffness);
                    body.constraint_impulse.angle += torque;
                    body.angle += torque;
                }
            }
        }
    }
}

/// Zeroes `constraint_impulse` on every body referenced by `ids`, run
/// once after the last `solve_all` sweep.
pub fn post_solve_all(ids: &[ConstraintId], world: &mut World) {
    for &id in ids {
        let Some(constraint) = world.constraints.get(id) else {
            continue;
        };
        for maybe_body in [constraint.body_a, constraint.body_b] {
            if let Some(body) = maybe_body.and_then(|id| world.bodies.get_mut(id)) {
                body.constraint_impulse = Default::default();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyOptions;

    fn rect(w: f64, h: f64) -> Vec<Point> {
        vec![
            Point::new(-w / 2.0, -h / 2.0),
            Point::new(w / 2.0, -h / 2.0),
            Point::new(w / 2.0, h / 2.0),
            Point::new(-w / 2.0, h / 2.0),
        ]
    }

    #[test]
    fn rest_length_defaults_to_initial_separation() {
        let mut world = World::new();
        let a = world
            .create_body(BodyOptions {
                position: Point::new(0.0, 0.0),
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();
        let b = world
            .create_body(BodyOptions {
                position: Point::new(100.0, 0.0),
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();

        let constraint_id = world
            .create_constraint(ConstraintOptions {
                body_a: Some(a),
                body_b: Some(b),
                ..Default::default()
            })
            .unwrap();
        initialize(constraint_id, &mut world);

        assert!((world.constraints[constraint_id].length - 100.0).abs() < 1e-9);
    }

    #[test]
    fn solving_pulls_bodies_toward_rest_length() {
        let mut world = World::new();
        let a = world
            .create_body(BodyOptions {
                position: Point::new(0.0, 0.0),
                vertices: rect(10.0, 10.0),
                is_static: true,
                ..Default::default()
            })
            .unwrap();
        let b = world
            .create_body(BodyOptions {
                position: Point::new(200.0, 0.0),
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();

        let constraint_id = world
            .create_constraint(ConstraintOptions {
                body_a: Some(a),
                body_b: Some(b),
                length: Some(100.0),
                stiffness: 1.0,
                ..Default::default()
            })
            .unwrap();
        initialize(constraint_id, &mut world);

        let start_distance = world.constraints[constraint_id].current_length(&world);
        solve_all(&[constraint_id], &mut world, 10, 1.0);
        let end_distance = world.constraints[constraint_id].current_length(&world);

        assert!(end_distance < start_distance);
    }

    #[test]
    fn constraint_between_two_static_bodies_does_not_move_anything() {
        let mut world = World::new();
        let a = world
            .create_body(BodyOptions {
                position: Point::new(0.0, 0.0),
                vertices: rect(10.0, 10.0),
                is_static: true,
                ..Default::default()
            })
            .unwrap();
        let b = world
            .create_body(BodyOptions {
                position: Point::new(50.0, 0.0),
                vertices: rect(10.0, 10.0),
                is_static: true,
                ..Default::default()
            })
            .unwrap();

        let constraint_id = world
            .create_constraint(ConstraintOptions {
                body_a: Some(a),
                body_b: Some(b),
                length: Some(200.0),
                ..Default::default()
            })
            .unwrap();
        initialize(constraint_id, &mut world);
        solve_all(&[constraint_id], &mut world, 5, 1.0);

        assert_eq!(world.bodies[a].position, Point::new(0.0, 0.0));
        assert_eq!(world.bodies[b].position, Point::new(50.0, 0.0));
    }

    #[test]
    fn off_center_anchor_imparts_torque() {
        let mut world = World::new();
        let b = world
            .create_body(BodyOptions {
                position: Point::new(0.0, 0.0),
                vertices: rect(20.0, 20.0),
                ..Default::default()
            })
            .unwrap();

        let constraint_id = world
            .create_constraint(ConstraintOptions {
                body_a: None,
                point_a: Point::new(0.0, -50.0),
                body_b: Some(b),
                point_b: Point::new(10.0, 0.0),
                length: Some(10.0),
                stiffness: 1.0,
                ..Default::default()
            })
            .unwrap();
        initialize(constraint_id, &mut world);
        solve_all(&[constraint_id], &mut world, 5, 1.0);

        assert_ne!(world.bodies[b].angle, 0.0);
    }
}

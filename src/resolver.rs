//! Turns tracked [`Pair`]s into position corrections and velocity
//! impulses: a small positional-projection pass to fix interpenetration
//! plus a sequential-impulse pass (with Coulomb friction) for the
//! actual bounce/slide response.
//!
//! Grounded on `original_source/engine/collision/resolver.py`, the
//! single most load-bearing file in the reference engine.

use crate::body::{Body, BodyId, Impulse};
use crate::geometry::{self, Point};
use crate::pair::{Pair, Pairs};
use crate::world::World;

/// Damping applied to the position-correction impulse each step so
/// corrections settle instead of oscillating.
const POSITION_DAMPEN: f64 = 0.9;
/// Carry-over factor applied to a body's stored position impulse
/// between steps (position warm-starting).
const POSITION_WARMING: f64 = 0.8;
/// Below this (negative, i.e. approaching) normal velocity a contact is
/// treated as resting rather than colliding, suppressing restitution
/// jitter.
const RESTING_THRESHOLD: f64 = 4.0;
/// Tangential speed below which static friction (rather than kinetic)
/// governs the contact.
const RESTING_THRESHOLD_TANGENT: f64 = 6.0;
/// Scales the normal force used to cap friction impulses.
const FRICTION_NORMAL_MULTIPLIER: f64 = 5.0;
/// The ratio of kinetic to static friction is always clamped into this
/// range before scaling the friction impulse; kept exactly as the
/// reference engine specifies rather than "fixed" to something
/// symmetric.
const FRICTION_NORMAL_FORCE_RANGE: (f64, f64) = (0.0, 1.0);

/// Increments `total_contacts` on both endpoints of every active,
/// non-sensor pair, so [`solve_position`] can fairly share the
/// correction across however many contacts a body currently has.
pub fn pre_solve_position(pairs: &Pairs, world: &mut World) {
    for pair in pairs.active_pairs() {
        let share = pair.contacts.len() as u32;
        if let Some(body) = world.bodies.get_mut(pair.body_a) {
            body.total_contacts += share;
        }
        if let Some(body) = world.bodies.get_mut(pair.body_b) {
            body.total_contacts += share;
        }
    }
}

/// Accumulates a position-correction impulse on each body proportional
/// to its share of the penetration depth, scaled by `delta` (so a
/// smaller step corrects proportionally less per tick).
pub fn solve_position(pairs: &mut Pairs, world: &mut World, delta: f64) {
    let time_scale = delta / crate::body::BASE_DELTA;

    for pair in pairs.active_pairs_mut() {
        let (impulse_a, impulse_b) = {
            let a = world.bodies.get(pair.body_a);
            let b = world.bodies.get(pair.body_b);
            (
                a.map(|b| b.position_impulse).unwrap_or_default(),
                b.map(|b| b.position_impulse).unwrap_or_default(),
            )
        };

        pair.separation = pair.normal.dot(
            impulse_b.linear + pair.normal * pair.depth - impulse_a.linear,
        );
    }

    let slop = 0.05;
    let pair_ids: Vec<_> = pairs.table.keys().copied().collect();
    for id in pair_ids {
        let (body_a, body_b, normal, separation, is_active, is_sensor) = {
            let pair = &pairs.table[&id];
            (
                pair.body_a,
                pair.body_b,
                pair.normal,
                pair.separation,
                pair.is_active,
                pair.is_sensor,
            )
        };
        if !is_active || is_sensor {
            continue;
        }

        let (a_static, b_static) = {
            let a = world.bodies.get(body_a).map(|b| b.is_static).unwrap_or(true);
            let b = world.bodies.get(body_b).map(|b| b.is_static).unwrap_or(true);
            (a, b)
        };

        let mut position_impulse = (separation - slop) * time_scale;
        if a_static || b_static {
            position_impulse *= 2.0;
        }

        if let Some(body) = world.bodies.get_mut(body_a) {
            if !body.is_static && !body.is_sleeping && body.total_contacts > 0 {
                let share = POSITION_DAMPEN / body.total_contacts as f64;
                body.position_impulse.linear += normal * position_impulse * share;
            }
        }
        if let Some(body) = world.bodies.get_mut(body_b) {
            if !body.is_static && !body.is_sleeping && body.total_contacts > 0 {
                let share = POSITION_DAMPEN / body.total_contacts as f64;
                body.position_impulse.linear -= normal * position_impulse * share;
            }
        }
    }
}

/// Applies each body's accumulated position impulse to its actual
/// geometry, resets `total_contacts`, and either clears or dampens
/// (warm-starts) the impulse for next step depending on whether it
/// opposes the body's current velocity.
pub fn post_solve_position(bodies: &[BodyId], world: &mut World) {
    for &id in bodies {
        let Some(body) = world.bodies.get_mut(id) else {
            continue;
        };
        body.total_contacts = 0;

        if body.position_impulse.linear == Point::zero() {
            continue;
        }

        let delta = body.position_impulse.linear;
        geometry::translate(&mut body.vertices, delta, 1.0);
        body.bounds.translate(delta);
        for part in &mut body.child_parts {
            geometry::translate(&mut part.vertices, delta, 1.0);
            part.bounds.translate(delta);
            part.position += delta;
        }
        body.position += delta;
        body.position_prev += delta;

        if delta.dot(body.velocity) < 0.0 {
            body.position_impulse = Impulse::default();
        } else {
            body.position_impulse.linear *= POSITION_WARMING;
        }
    }
}

/// Reapplies the previous step's converged contact impulses before
/// `solve_velocity` runs, so the solver starts near the converged
/// solution instead of from zero every step.
pub fn pre_solve_velocity(pairs: &Pairs, world: &mut World) {
    for pair in pairs.active_pairs() {
        let tangent = Point::new(-pair.normal.y, pair.normal.x);

        for contact in &pair.contacts {
            if contact.normal_impulse == 0.0 && contact.tangent_impulse == 0.0 {
                continue;
            }

            let impulse = pair.normal * contact.normal_impulse + tangent * contact.tangent_impulse;

            if let Some(body) = world.bodies.get_mut(pair.body_a) {
                if !body.is_static && !body.is_sleeping {
                    let offset = contact.point - body.position;
                    body.position_prev += impulse * body.inverse_mass;
                    body.angle_prev += body.inverse_inertia * geometry::cross(offset, impulse);
                }
            }
            if let Some(body) = world.bodies.get_mut(pair.body_b) {
                if !body.is_static && !body.is_sleeping {
                    let offset = contact.point - body.position;
                    body.position_prev -= impulse * body.inverse_mass;
                    body.angle_prev -= body.inverse_inertia * geometry::cross(offset, impulse);
                }
            }
        }
    }
}

fn velocity_at_point(body: &Body, point: Point) -> Point {
    let offset = point - body.position;
    let perp = Point::new(-offset.y, offset.x);
    body.velocity + perp * body.angular_velocity
}

/// The sequential-impulse pass: for each active contact, derives the
/// normal and tangential (Coulomb friction) impulse needed to prevent
/// interpenetrating velocity, clamps the accumulated impulses, and
/// applies them to both bodies' Verlet state.
pub fn solve_velocity(pairs: &mut Pairs, world: &mut World, delta: f64) {
    let time_scale = delta / crate::body::BASE_DELTA;
    let time_scale_sq = time_scale * time_scale;
    let resting_threshold = -RESTING_THRESHOLD * time_scale;
    let resting_threshold_tangent = RESTING_THRESHOLD_TANGENT * time_scale_sq;
    let friction_normal_multiplier = FRICTION_NORMAL_MULTIPLIER * time_scale_sq;

    let pair_ids: Vec<_> = pairs.table.keys().copied().collect();

    for id in pair_ids {
        let (body_a_id, body_b_id, normal, restitution, friction, is_active, is_sensor, contact_count) = {
            let pair = &pairs.table[&id];
            (
                pair.body_a,
                pair.body_b,
                pair.normal,
                restitution_of(pair, world),
                friction_of(pair, world),
                pair.is_active,
                pair.is_sensor,
                pair.contacts.len(),
            )
        };
        if !is_active || is_sensor || contact_count == 0 {
            continue;
        }

        let tangent = Point::new(-normal.y, normal.x);
        let contact_share = 1.0 / contact_count as f64;

        let (inv_mass_a, inv_mass_b) = {
            let a = world.bodies.get(body_a_id).map(|b| b.inverse_mass).unwrap_or(0.0);
            let b = world.bodies.get(body_b_id).map(|b| b.inverse_mass).unwrap_or(0.0);
            (a, b)
        };
        let inverse_mass_total = inv_mass_a + inv_mass_b;
        if inverse_mass_total == 0.0 {
            continue;
        }

        for contact_index in 0..contact_count {
            let point = pairs.table[&id].contacts[contact_index].point;

            let (vel_a, vel_b) = {
                let a = world.bodies.get(body_a_id);
                let b = world.bodies.get(body_b_id);
                (
                    a.map(|b| velocity_at_point(b, point)).unwrap_or_default(),
                    b.map(|b| velocity_at_point(b, point)).unwrap_or_default(),
                )
            };

            let relative_velocity = vel_a - vel_b;
            let normal_velocity = normal.dot(relative_velocity);
            let tangent_velocity = tangent.dot(relative_velocity);
            let tangent_speed = tangent_velocity.abs();
            let tangent_direction = tangent_velocity.signum();

            let contact = &mut pairs.table.get_mut(&id).unwrap().contacts[contact_index];

            let normal_impulse_old = contact.normal_impulse;
            let normal_bias = if normal_velocity < resting_threshold {
                0.0
            } else {
                restitution * normal_velocity
            };
            let raw_impulse = contact_share * inverse_mass_total.recip()
                * -(normal_velocity + normal_bias);
            contact.normal_impulse = (normal_impulse_old + raw_impulse * inverse_mass_total).max(0.0);
            let normal_impulse_delta = contact.normal_impulse - normal_impulse_old;

            let mut max_friction = f64::INFINITY;
            if tangent_speed > resting_threshold_tangent || tangent_speed == 0.0 {
                let clamped_friction = friction.clamp(FRICTION_NORMAL_FORCE_RANGE.0, FRICTION_NORMAL_FORCE_RANGE.1);
                max_friction = clamped_friction * friction_normal_multiplier * contact.normal_impulse;
            }

            let tangent_impulse_old = contact.tangent_impulse;
            let tangent_raw = contact_share * inverse_mass_total.recip() * -tangent_velocity;
            let mut tangent_impulse = tangent_impulse_old + tangent_raw * inverse_mass_total;
            if tangent_impulse.abs() > max_friction {
                tangent_impulse = max_friction * tangent_direction;
            }
            contact.tangent_impulse = tangent_impulse;
            let tangent_impulse_delta = contact.tangent_impulse - tangent_impulse_old;

            let impulse = normal * normal_impulse_delta + tangent * tangent_impulse_delta;

            if let Some(body) = world.bodies.get_mut(body_a_id) {
                if !body.is_static && !body.is_sleeping {
                    let offset = point - body.position;
                    body.position_prev -= impulse * body.inverse_mass;
                    body.angle_prev -= body.inverse_inertia * geometry::cross(offset, impulse);
                }
            }
            if let Some(body) = world.bodies.get_mut(body_b_id) {
                if !body.is_static && !body.is_sleeping {
                    let offset = point - body.position;
                    body.position_prev += impulse * body.inverse_mass;
                    body.angle_prev += body.inverse_inertia * geometry::cross(offset, impulse);
                }
            }
        }
    }
}

fn restitution_of(pair: &Pair, world: &World) -> f64 {
    let a = world.bodies.get(pair.body_a).map(|b| b.restitution).unwrap_or(0.0);
    let b = world.bodies.get(pair.body_b).map(|b| b.restitution).unwrap_or(0.0);
    a.max(b)
}

fn friction_of(pair: &Pair, world: &World) -> f64 {
    let a = world.bodies.get(pair.body_a).map(|b| b.friction).unwrap_or(0.0);
    let b = world.bodies.get(pair.body_b).map(|b| b.friction).unwrap_or(0.0);
    a.min(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyOptions;
    use crate::collision::narrowphase::collides;

    fn rect(w: f64, h: f64) -> Vec<Point> {
        vec![
            Point::new(-w / 2.0, -h / 2.0),
            Point::new(w / 2.0, -h / 2.0),
            Point::new(w / 2.0, h / 2.0),
            Point::new(-w / 2.0, h / 2.0),
        ]
    }

    #[test]
    fn resting_body_on_static_floor_does_not_sink_further_after_correction() {
        let mut world = World::new();
        let floor = world
            .create_body(BodyOptions {
                position: Point::new(0.0, 100.0),
                vertices: rect(200.0, 20.0),
                is_static: true,
                ..Default::default()
            })
            .unwrap();
        let body = world
            .create_body(BodyOptions {
                position: Point::new(0.0, 89.0),
                vertices: rect(20.0, 20.0),
                ..Default::default()
            })
            .unwrap();

        let collision = collides(floor, body, &world).expect("should overlap");
        let mut pairs = Pairs::new();
        pairs.update(&[collision], 0.0, |_| false);

        pre_solve_position(&pairs, &mut world);
        solve_position(&mut pairs, &mut world, crate::body::BASE_DELTA);
        post_solve_position(&[floor, body], &mut world);

        let separation_before = world.bodies[body].position.y;
        assert!(separation_before >= 89.0);
    }

    #[test]
    fn velocity_solve_reduces_approach_speed() {
        let mut world = World::new();
        let floor = world
            .create_body(BodyOptions {
                position: Point::new(0.0, 100.0),
                vertices: rect(200.0, 20.0),
                is_static: true,
                ..Default::default()
            })
            .unwrap();
        let body = world
            .create_body(BodyOptions {
                position: Point::new(0.0, 90.0),
                vertices: rect(20.0, 20.0),
                ..Default::default()
            })
            .unwrap();
        world.bodies[body].position_prev = world.bodies[body].position - Point::new(0.0, 5.0);
        world.bodies[body].velocity = Point::new(0.0, 5.0);

        let collision = collides(floor, body, &world).expect("should overlap");
        let mut pairs = Pairs::new();
        pairs.update(&[collision], 0.0, |_| false);

        let before = (world.bodies[body].position - world.bodies[body].position_prev).y;
        solve_velocity(&mut pairs, &mut world, crate::body::BASE_DELTA);
        let after = (world.bodies[body].position - world.bodies[body].position_prev).y;

        assert!(after <= before);
    }
}

//! Persistent contact cache: tracks each body-pair's collision across
//! steps so the resolver can warm-start impulses and emit
//! start/active/end lifecycle events.
//!
//! Grounded on `original_source/engine/collision/pairs.py`.

use std::collections::HashMap;

use arrayvec::ArrayVec;
use log::trace;
use slotmap::Key;

use crate::body::{BodyId, Impulse};
use crate::collision::Collision;
use crate::geometry::Point;

/// How long (in simulation milliseconds) an inactive pair is kept
/// around before being evicted, matching the reference engine's
/// `Pairs.update` eviction horizon.
const PAIR_MAX_INACTIVE_MS: f64 = 1000.0;

/// Canonical, order-independent identity for a body pair: the smaller
/// raw key always comes first so `(a, b)` and `(b, a)` collisions map
/// to the same cache entry.
pub type PairId = (u64, u64);

/// Produces the canonical id for two bodies, regardless of call order.
pub fn canonical_id(a: BodyId, b: BodyId) -> PairId {
    let raw_a = a.data().as_ffi();
    let raw_b = b.data().as_ffi();
    if raw_a <= raw_b {
        (raw_a, raw_b)
    } else {
        (raw_b, raw_a)
    }
}

/// One contact point tracked across steps, carrying the warm-started
/// impulses the resolver reapplies before solving.
#[derive(Debug, Clone, Copy, Default)]
pub struct Contact {
    pub point: Point,
    pub normal_impulse: f64,
    pub tangent_impulse: f64,
}

/// A persistent record of a body pair's collision state.
#[derive(Debug, Clone)]
pub struct Pair {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub contacts: ArrayVec<Contact, 2>,
    pub normal: Point,
    pub depth: f64,
    pub is_active: bool,
    pub is_sensor: bool,
    /// True only on the step this pair first became active; consumed
    /// by `collisionStart` event emission.
    pub is_first_contact: bool,
    /// Simulation timestamp of the most recent active step.
    pub timestamp_last_active: f64,
    /// Accumulated correction applied by the position solver, shared
    /// fairly across every pair a body participates in.
    pub position_impulse: Impulse,
    /// Separation used by the resolver for restitution bookkeeping.
    pub separation: f64,
}

/// The outcome of [`update`]: which pairs newly started, stayed active,
/// or ended this step, for event emission.
#[derive(Debug, Default)]
pub struct PairEvents {
    pub started: Vec<PairId>,
    pub active: Vec<PairId>,
    pub ended: Vec<PairId>,
}

/// Owns every tracked pair, keyed by canonical id.
#[derive(Debug, Default)]
pub struct Pairs {
    pub table: HashMap<PairId, Pair>,
}

impl Pairs {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Merges this step's `collisions` into the cache, producing
    /// lifecycle events, then evicts pairs that have been inactive for
    /// longer than [`PAIR_MAX_INACTIVE_MS`].
    pub fn update(&mut self, collisions: &[Collision], timestamp: f64, is_sensor: impl Fn(BodyId) -> bool) -> PairEvents {
        let mut events = PairEvents::default();
        let mut seen = std::collections::HashSet::new();

        for collision in collisions {
            let id = canonical_id(collision.body_a, collision.body_b);
            seen.insert(id);

            let sensor = is_sensor(collision.body_a) || is_sensor(collision.body_b);

            match self.table.get_mut(&id) {
                Some(pair) => {
                    pair.is_first_contact = !pair.is_active;
                    pair.is_active = true;
                    pair.normal = collision.normal;
                    pair.depth = collision.depth;
                    pair.timestamp_last_active = timestamp;

                    // Refresh every contact's tracked vertex from this
                    // step's supports, preserving normal_impulse/tangent_impulse
                    // (warm-starting) for indices that still exist.
                    for (i, support) in collision.supports.iter().enumerate() {
                        if let Some(contact) = pair.contacts.get_mut(i) {
                            contact.point = *support;
                        } else {
                            pair.contacts.push(Contact {
                                point: *support,
                                normal_impulse: 0.0,
                                tangent_impulse: 0.0,
                            });
                        }
                    }
                    pair.contacts.truncate(collision.supports.len());

                    if pair.is_first_contact {
                        events.started.push(id);
                        trace!("pair {:?} started", id);
                    } else {
                        events.active.push(id);
                    }
                }
                None => {
                    let mut contacts = ArrayVec::new();
                    for support in &collision.supports {
                        contacts.push(Contact {
                            point: *support,
                            normal_impulse: 0.0,
                            tangent_impulse: 0.0,
                        });
                    }
                    self.table.insert(
                        id,
                        Pair {
                            body_a: collision.body_a,
                            body_b: collision.body_b,
                            contacts,
                            normal: collision.normal,
                            depth: collision.depth,
                            is_active: true,
                            is_sensor: sensor,
                            is_first_contact: true,
                            timestamp_last_active: timestamp,
                            position_impulse: Impulse::default(),
                            separation: collision.depth,
                        },
                    );
                    events.started.push(id);
                    trace!("pair {:?} started", id);
                }
            }
        }

        let mut to_remove = Vec::new();
        for (&id, pair) in self.table.iter_mut() {
            if !seen.contains(&id) {
                if pair.is_active {
                    pair.is_active = false;
                    for contact in pair.contacts.iter_mut() {
                        contact.normal_impulse = 0.0;
                        contact.tangent_impulse = 0.0;
                    }
                    events.ended.push(id);
                    trace!("pair {:?} ended", id);
                }
                if timestamp - pair.timestamp_last_active > PAIR_MAX_INACTIVE_MS {
                    to_remove.push(id);
                }
            }
        }
        for id in to_remove {
            self.table.remove(&id);
            trace!("pair {:?} evicted", id);
        }

        events
    }

    /// Clears every tracked pair, as when the engine itself is reset.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn active_pairs(&self) -> impl Iterator<Item = &Pair> {
        self.table.values().filter(|p| p.is_active && !p.is_sensor)
    }

    pub fn active_pairs_mut(&mut self) -> impl Iterator<Item = &mut Pair> {
        self.table.values_mut().filter(|p| p.is_active && !p.is_sensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyOptions;
    use crate::world::World;

    fn rect(w: f64, h: f64) -> Vec<Point> {
        vec![
            Point::new(-w / 2.0, -h / 2.0),
            Point::new(w / 2.0, -h / 2.0),
            Point::new(w / 2.0, h / 2.0),
            Point::new(-w / 2.0, h / 2.0),
        ]
    }

    #[test]
    fn canonical_id_is_order_independent() {
        let mut world = World::new();
        let a = world
            .create_body(BodyOptions {
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();
        let b = world
            .create_body(BodyOptions {
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(canonical_id(a, b), canonical_id(b, a));
    }

    #[test]
    fn new_collision_emits_start_event() {
        let mut world = World::new();
        let a = world
            .create_body(BodyOptions {
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();
        let b = world
            .create_body(BodyOptions {
                position: Point::new(5.0, 0.0),
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();

        let collision = crate::collision::narrowphase::collides(a, b, &world).unwrap();
        let mut pairs = Pairs::new();
        let events = pairs.update(&[collision], 0.0, |_| false);

        assert_eq!(events.started.len(), 1);
        assert!(events.active.is_empty());
    }

    #[test]
    fn pair_not_seen_again_ends_then_is_evicted() {
        let mut world = World::new();
        let a = world
            .create_body(BodyOptions {
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();
        let b = world
            .create_body(BodyOptions {
                position: Point::new(5.0, 0.0),
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();

        let collision = crate::collision::narrowphase::collides(a, b, &world).unwrap();
        let mut pairs = Pairs::new();
        pairs.update(&[collision], 0.0, |_| false);

        let events = pairs.update(&[], 10.0, |_| false);
        assert_eq!(events.ended.len(), 1);
        assert_eq!(pairs.table.len(), 1);

        let events = pairs.update(&[], 2000.0, |_| false);
        assert!(events.ended.is_empty());
        assert!(pairs.table.is_empty());
    }

    #[test]
    fn persisting_pair_refreshes_contact_points_as_bodies_move() {
        let mut world = World::new();
        let a = world
            .create_body(BodyOptions {
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();
        let b = world
            .create_body(BodyOptions {
                position: Point::new(5.0, 0.0),
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();

        let collision = crate::collision::narrowphase::collides(a, b, &world).unwrap();
        let mut pairs = Pairs::new();
        pairs.update(&[collision], 0.0, |_| false);

        let id = canonical_id(a, b);
        pairs.table.get_mut(&id).unwrap().contacts[0].normal_impulse = 7.0;

        world.bodies[b].position.y += 1.0;
        let collision = crate::collision::narrowphase::collides(a, b, &world).unwrap();
        let expected_point = collision.supports[0];
        pairs.update(&[collision], 1.0, |_| false);

        let pair = &pairs.table[&id];
        assert_eq!(pair.contacts[0].point, expected_point);
        assert_eq!(pair.contacts[0].normal_impulse, 7.0);
    }

    #[test]
    fn ended_pair_has_its_contact_impulses_zeroed() {
        let mut world = World::new();
        let a = world
            .create_body(BodyOptions {
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();
        let b = world
            .create_body(BodyOptions {
                position: Point::new(5.0, 0.0),
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();

        let collision = crate::collision::narrowphase::collides(a, b, &world).unwrap();
        let mut pairs = Pairs::new();
        pairs.update(&[collision], 0.0, |_| false);

        let id = canonical_id(a, b);
        for contact in pairs.table.get_mut(&id).unwrap().contacts.iter_mut() {
            contact.normal_impulse = 3.0;
            contact.tangent_impulse = 2.0;
        }

        pairs.update(&[], 10.0, |_| false);

        let pair = &pairs.table[&id];
        assert!(pair
            .contacts
            .iter()
            .all(|c| c.normal_impulse == 0.0 && c.tangent_impulse == 0.0));
    }
}

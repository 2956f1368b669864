//! Top-level simulation loop: ties integration, constraint solving,
//! collision detection, and the two resolver passes together into the
//! single `update` call applications actually drive.
//!
//! Grounded on `original_source/engine/core/engine.py`'s `update`
//! (17-step orchestration); the `EngineConfig`/profiling-scope idiom
//! follows `tversteeg-castle-game`'s `physics::Settings` and
//! `physics::Physics::step`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::body::BASE_DELTA;
use crate::collision;
use crate::constraint;
use crate::events::{EngineEvent, Events};
use crate::pair::Pairs;
use crate::resolver;
use crate::sleeping;
use crate::world::World;

/// Tunable solver/physical parameters, the Rust analogue of the
/// reference engine's loose `options` dict passed to `Engine.create`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Position-projection solver sweeps per step.
    pub position_iterations: u32,
    /// Sequential-impulse velocity solver sweeps per step.
    pub velocity_iterations: u32,
    /// Gauss-Seidel constraint solver sweeps per step.
    pub constraint_iterations: u32,
    /// Whether bodies are allowed to sleep at all.
    pub enable_sleeping: bool,
    /// Gravity direction and magnitude before `gravity_scale`.
    pub gravity_x: f64,
    pub gravity_y: f64,
    /// Multiplies `gravity_x`/`gravity_y` before it's applied as a
    /// force; keeps the raw gravity vector in intuitive units.
    pub gravity_scale: f64,
    /// Global time dilation applied to the simulation clock.
    pub time_scale: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            position_iterations: 6,
            velocity_iterations: 4,
            constraint_iterations: 2,
            enable_sleeping: false,
            gravity_x: 0.0,
            gravity_y: 1.0,
            gravity_scale: 0.001,
            time_scale: 1.0,
        }
    }
}

/// Owns a [`World`], its persistent [`Pairs`] cache, its event
/// registry, and the clock/config driving `update`.
pub struct Engine {
    pub world: World,
    pub pairs: Pairs,
    pub events: Events,
    pub config: EngineConfig,
    timestamp: f64,
    last_delta: f64,
}

impl Engine {
    /// Builds an empty engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            world: World::new(),
            pairs: Pairs::new(),
            events: Events::new(),
            config,
            timestamp: 0.0,
            last_delta: 0.0,
        }
    }

    /// Current simulation timestamp in milliseconds.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Advances the simulation by `delta` milliseconds, or by
    /// [`BASE_DELTA`] if `delta` is `None`.
    pub fn update(&mut self, delta: Option<f64>) {
        puffin::profile_scope!("engine::update");

        let delta = delta.unwrap_or(BASE_DELTA);
        self.timestamp += delta * self.config.time_scale;

        self.events.trigger(EngineEvent::BeforeUpdate {
            timestamp: self.timestamp,
        });

        let bodies = self.world.all_bodies();
        let constraints = self.world.all_constraints();

        {
            puffin::profile_scope!("engine::apply_gravity");
            apply_gravity(&bodies, &mut self.world, &self.config);
        }

        {
            puffin::profile_scope!("engine::integrate_bodies");
            for &id in &bodies {
                if let Some(body) = self.world.bodies.get_mut(id) {
                    body.update(delta, self.last_delta);
                }
            }
        }

        let time_scale = delta / BASE_DELTA;

        {
            puffin::profile_scope!("engine::solve_constraints");
            constraint::pre_solve_all(&constraints, &mut self.world);
            constraint::solve_all(
                &constraints,
                &mut self.world,
                self.config.constraint_iterations,
                time_scale,
            );
            constraint::post_solve_all(&constraints, &mut self.world);
        }

        let collisions = {
            puffin::profile_scope!("engine::collision_detection");
            collision::collisions(&bodies, &self.world)
        };

        let pair_events = {
            puffin::profile_scope!("engine::update_pairs");
            let world = &self.world;
            self.pairs.update(&collisions, self.timestamp, |id| {
                world.bodies.get(id).map(|b| b.is_sensor).unwrap_or(false)
            })
        };

        if self.config.enable_sleeping {
            puffin::profile_scope!("engine::sleeping_after_collisions");
            sleeping::after_collisions(&self.pairs, &mut self.world);
        }

        if !pair_events.started.is_empty() {
            self.events.trigger(EngineEvent::CollisionStart {
                pairs: pair_events.started.clone(),
            });
        }

        {
            puffin::profile_scope!("engine::solve_position");
            resolver::pre_solve_position(&self.pairs, &mut self.world);
            for _ in 0..self.config.position_iterations {
                resolver::solve_position(&mut self.pairs, &mut self.world, delta);
            }
            resolver::post_solve_position(&bodies, &mut self.world);
        }

        {
            puffin::profile_scope!("engine::solve_velocity");
            resolver::pre_solve_velocity(&self.pairs, &mut self.world);
            for _ in 0..self.config.velocity_iterations {
                resolver::solve_velocity(&mut self.pairs, &mut self.world, delta);
            }
        }

        if self.config.enable_sleeping {
            puffin::profile_scope!("engine::sleeping_update");
            sleeping::update(&bodies, &mut self.world, delta);
        }

        if !pair_events.active.is_empty() {
            self.events.trigger(EngineEvent::CollisionActive {
                pairs: pair_events.active,
            });
        }
        if !pair_events.ended.is_empty() {
            self.events.trigger(EngineEvent::CollisionEnd {
                pairs: pair_events.ended,
            });
        }

        for &id in &bodies {
            if let Some(body) = self.world.bodies.get_mut(id) {
                body.update_velocities();
            }
        }
        clear_forces(&bodies, &mut self.world);

        self.events.trigger(EngineEvent::AfterUpdate {
            timestamp: self.timestamp,
        });
        self.last_delta = delta;
    }

    /// Moves every body and constraint from `other`'s world into this
    /// engine's world, leaving `other` empty.
    pub fn merge(&mut self, other: &mut World) {
        let bodies: Vec<_> = other.bodies.drain().collect();
        let constraints: Vec<_> = other.constraints.drain().collect();

        for (_, body) in bodies {
            let id = self.world.bodies.insert(body);
            self.world.bodies[id].id = id;
            self.world.composites[self.world.root].bodies.push(id);
        }
        for (_, constraint) in constraints {
            let id = self.world.constraints.insert(constraint);
            self.world.constraints[id].id = id;
            self.world.composites[self.world.root].constraints.push(id);
        }
        self.world.composites[self.world.root].set_modified(true);
    }

    /// Clears the pair cache and collision state without touching the
    /// world's bodies/constraints, matching the reference engine's
    /// `Engine.clear` (which intentionally leaves the world alone).
    pub fn clear(&mut self) {
        self.pairs.clear();
    }
}

fn apply_gravity(bodies: &[crate::body::BodyId], world: &mut World, config: &EngineConfig) {
    if config.gravity_scale == 0.0 {
        return;
    }
    for &id in bodies {
        let Some(body) = world.bodies.get_mut(id) else {
            continue;
        };
        if body.is_static || body.is_sleeping {
            continue;
        }
        body.force.x += body.mass * config.gravity_x * config.gravity_scale;
        body.force.y += body.mass * config.gravity_y * config.gravity_scale;
    }
}

fn clear_forces(bodies: &[crate::body::BodyId], world: &mut World) {
    for &id in bodies {
        if let Some(body) = world.bodies.get_mut(id) {
            body.force = crate::geometry::Point::zero();
            body.torque = 0.0;
        }
    }
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
    fn falling_body_comes_to_rest_on_a_static_floor() {
        let mut engine = Engine::new(EngineConfig::default());
        let floor = engine
            .world
            .create_body(BodyOptions {
                position: Point::new(0.0, 300.0),
                vertices: rect(400.0, 20.0),
                is_static: true,
                ..Default::default()
            })
            .unwrap();
        let body = engine
            .world
            .create_body(BodyOptions {
                position: Point::new(0.0, 0.0),
                vertices: rect(20.0, 20.0),
                restitution: 0.0,
                ..Default::default()
            })
            .unwrap();

        for _ in 0..300 {
            engine.update(Some(BASE_DELTA));
        }

        let floor_top = engine.world.bodies[floor].position.y - 10.0;
        let body_bottom = engine.world.bodies[body].position.y + 10.0;
        assert!((body_bottom - floor_top).abs() < 5.0);
    }

    #[test]
    fn clear_keeps_world_but_drops_pairs() {
        let mut engine = Engine::new(EngineConfig::default());
        engine
            .world
            .create_body(BodyOptions {
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();

        engine.update(Some(BASE_DELTA));
        engine.clear();

        assert_eq!(engine.world.all_bodies().len(), 1);
        assert!(engine.pairs.table.is_empty());
    }

    #[test]
    fn merge_moves_bodies_into_the_receiving_world() {
        let mut engine = Engine::new(EngineConfig::default());
        let mut other = World::new();
        other
            .create_body(BodyOptions {
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();

        engine.merge(&mut other);

        assert_eq!(engine.world.all_bodies().len(), 1);
        assert_eq!(other.all_bodies().len(), 0);
    }
}

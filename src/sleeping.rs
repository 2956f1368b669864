//! Puts slow-moving dynamic bodies to sleep so the solver can skip
//! them, and wakes them back up when a moving neighbor nudges them.
//!
//! Grounded on `original_source/engine/core/sleeping.py`.

use log::debug;

use crate::body::{Body, BodyId, BASE_DELTA};
use crate::pair::Pairs;
use crate::world::World;

/// Relative-motion ratio above which a sleeping body is woken by an
/// awake dynamic neighbor in [`after_collisions`].
const MOTION_WAKE_THRESHOLD: f64 = 0.18;
/// Motion EMA floor; bodies below this for `sleep_threshold` ticks fall
/// asleep.
const MOTION_SLEEP_THRESHOLD: f64 = 0.08;
/// Bias toward the larger of the old/new motion sample in the EMA,
/// so a single slow tick doesn't immediately erase a fast history.
const MIN_BIAS: f64 = 0.9;

/// Updates every body's motion EMA and sleep counter for one step of
/// `delta` milliseconds, putting bodies to sleep once their counter
/// exceeds their threshold.
pub fn update(bodies: &[BodyId], world: &mut World, delta: f64) {
    let time_factor = delta / BASE_DELTA;

    for &id in bodies {
        let Some(body) = world.bodies.get_mut(id) else {
            continue;
        };
        if body.is_static {
            continue;
        }

        let motion = body.speed * body.speed + body.angular_speed * body.angular_speed;

        if body.sleep_threshold > 0 && motion < MOTION_SLEEP_THRESHOLD {
            body.sleep_counter += 1;
            if (body.sleep_counter as f64) >= body.sleep_threshold as f64 * time_factor {
                set_sleeping(body, true);
            }
        } else if body.sleep_counter > 0 {
            body.sleep_counter -= 1;
        }

        body.motion = MIN_BIAS * body.motion.min(motion) + (1.0 - MIN_BIAS) * body.motion.max(motion);
    }
}

/// After a collision pass, wakes any sleeping body whose active
/// dynamic neighbor is moving significantly faster than it was when it
/// fell asleep.
pub fn after_collisions(pairs: &Pairs, world: &mut World) {
    for pair in pairs.active_pairs() {
        let (a_sleeping, b_sleeping) = {
            let a = world.bodies.get(pair.body_a);
            let b = world.bodies.get(pair.body_b);
            (
                a.map(|b| b.is_sleeping).unwrap_or(false),
                b.map(|b| b.is_sleeping).unwrap_or(false),
            )
        };

        if !a_sleeping && !b_sleeping {
            continue;
        }
        if a_sleeping && b_sleeping {
            continue;
        }

        let (sleeper_id, awake_id) = if a_sleeping {
            (pair.body_a, pair.body_b)
        } else {
            (pair.body_b, pair.body_a)
        };

        let (awake_is_static, awake_motion, sleeper_motion) = {
            let awake = match world.bodies.get(awake_id) {
                Some(b) => b,
                None => continue,
            };
            let sleeper = match world.bodies.get(sleeper_id) {
                Some(b) => b,
                None => continue,
            };
            (awake.is_static, awake.motion, sleeper.motion)
        };

        if awake_is_static {
            continue;
        }

        if awake_motion > sleeper_motion * MOTION_WAKE_THRESHOLD {
            if let Some(sleeper) = world.bodies.get_mut(sleeper_id) {
                set_sleeping(sleeper, false);
            }
        }
    }
}

/// Puts `body` to sleep or wakes it, resetting the Verlet state so the
/// transition itself doesn't register as motion.
pub fn set_sleeping(body: &mut Body, is_sleeping: bool) {
    if is_sleeping {
        body.is_sleeping = true;
        body.sleep_counter = body.sleep_threshold;

        body.position_prev = body.position;
        body.angle_prev = body.angle;
        body.speed = 0.0;
        body.angular_speed = 0.0;
        body.motion = 0.0;
        body.position_impulse = Default::default();

        debug!("body {:?} asleep", body.id);
    } else {
        body.is_sleeping = false;
        body.sleep_counter = 0;

        debug!("body {:?} awake", body.id);
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
    fn still_body_eventually_sleeps() {
        let mut world = World::new();
        let id = world
            .create_body(BodyOptions {
                vertices: rect(10.0, 10.0),
                sleep_threshold: 3,
                ..Default::default()
            })
            .unwrap();

        for _ in 0..5 {
            update(&[id], &mut world, BASE_DELTA);
        }

        assert!(world.bodies[id].is_sleeping);
    }

    #[test]
    fn zero_threshold_disables_sleeping() {
        let mut world = World::new();
        let id = world
            .create_body(BodyOptions {
                vertices: rect(10.0, 10.0),
                sleep_threshold: 0,
                ..Default::default()
            })
            .unwrap();

        for _ in 0..100 {
            update(&[id], &mut world, BASE_DELTA);
        }

        assert!(!world.bodies[id].is_sleeping);
    }

    #[test]
    fn set_sleeping_false_clears_counter() {
        let mut world = World::new();
        let id = world
            .create_body(BodyOptions {
                vertices: rect(10.0, 10.0),
                ..Default::default()
            })
            .unwrap();

        set_sleeping(&mut world.bodies[id], true);
        assert!(world.bodies[id].is_sleeping);

        set_sleeping(&mut world.bodies[id], false);
        assert!(!world.bodies[id].is_sleeping);
        assert_eq!(world.bodies[id].sleep_counter, 0);
    }
}

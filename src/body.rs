//! The integratable rigid entity.
//!
//! Ground truth for every formula here is `original_source/engine/body/body.py`
//! (a Matter.js `Body.js` port); the struct shape and doc-comment register
//! follow `tversteeg-castle-game`'s `physics::rigidbody::RigidBody`, the
//! closest plain-struct (non-ECS) body type in that codebase.

use slotmap::new_key_type;

use crate::error::{EngineError, Result};
use crate::geometry::{self, Bounds, Point, Vertex};

new_key_type! {
    /// Stable handle to a [`Body`] living in a [`crate::World`].
    pub struct BodyId;
}

/// Base simulation step used to rescale velocities/time-dependent
/// quantities to a frame-rate-independent unit, matching the engine's
/// default step.
pub const BASE_DELTA: f64 = 1000.0 / 60.0;

/// Empirical constant that makes the Verlet integration scheme rotate
/// rigid bodies like their continuous counterparts. Keep this exact
/// value to stay behaviourally compatible with the reference engine.
const INERTIA_SCALE: f64 = 4.0;

/// Bitfield-based collision filter. Two bodies in the same non-zero
/// `group` always (group > 0) or never (group < 0) collide, overriding
/// `category`/`mask`; otherwise they collide iff
/// `category_a & mask_b != 0 && category_b & mask_a != 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionFilter {
    /// Which category bit(s) this body belongs to.
    pub category: u32,
    /// Which categories this body is willing to collide with.
    pub mask: u32,
    /// Group override; 0 means "use category/mask".
    pub group: i32,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            category: 0x0001,
            mask: u32::MAX,
            group: 0,
        }
    }
}

/// Returns whether two filters should be tested for collision at all.
pub fn can_collide(a: &CollisionFilter, b: &CollisionFilter) -> bool {
    if a.group == b.group && a.group != 0 {
        return a.group > 0;
    }
    (a.category & b.mask) != 0 && (b.category & a.mask) != 0
}

/// One geometric part of a (possibly compound) body.
///
/// Non-compound bodies have an empty `child_parts` list and their
/// geometry lives directly on [`Body`]; [`Body`]'s own fields play the
/// role of Matter.js's `parts[0]` (the parent/self part), which keeps
/// `parts[0] is b` true by construction rather than by bookkeeping.
#[derive(Debug, Clone)]
pub struct Part {
    /// World-space vertices, clockwise, centroid at `position`.
    pub vertices: Vec<Vertex>,
    /// Deduplicated unit edge normals.
    pub axes: Vec<Point>,
    /// Tight AABB of `vertices`.
    pub bounds: Bounds,
    /// World-space centroid of this part.
    pub position: Point,
}

impl Part {
    fn from_points(points: &[Point]) -> Result<Self> {
        if points.len() < 3 {
            return Err(EngineError::InvalidGeometry {
                reason: "fewer than 3 vertices".into(),
            });
        }

        let mut vertices = geometry::vertices_from_points(points);
        let signed_area = geometry::area(&vertices, true);
        if signed_area.abs() < f64::EPSILON {
            return Err(EngineError::InvalidGeometry {
                reason: "zero-area polygon".into(),
            });
        }

        let centroid = geometry::centre(&vertices);
        geometry::translate(&mut vertices, -centroid, 1.0);
        let axes = geometry::axes_from_vertices(&vertices);
        let bounds = Bounds::from_vertices(&vertices);

        Ok(Self {
            vertices,
            axes,
            bounds,
            position: Point::zero(),
        })
    }

    fn recompute_bounds(&mut self, velocity: Option<Point>) {
        self.bounds.update(&self.vertices, velocity);
    }
}

/// Snapshot of material fields taken when a dynamic body becomes static,
/// used to restore exactly on `set_static(false)`.
#[derive(Debug, Clone, Copy)]
struct OriginalMaterial {
    restitution: f64,
    friction: f64,
    mass: f64,
    inertia: f64,
    density: f64,
    inverse_mass: f64,
    inverse_inertia: f64,
}

/// Warm-started per-step accumulators shared by the resolver and the
/// constraint solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct Impulse {
    /// Linear component.
    pub linear: Point,
    /// Angular component.
    pub angle: f64,
}

/// The central rigid-body entity.
///
/// Fields are grouped by concern (pose, material, lifecycle, compound
/// parts) rather than flattened, since that's how every setter below
/// touches them.
#[derive(Debug, Clone)]
pub struct Body {
    /// Assigned by the world at insertion time.
    pub id: BodyId,
    /// Purely diagnostic; not used by any algorithm.
    pub label: String,

    // --- pose (parent/self part geometry) ---
    /// World-space vertices of the parent part.
    pub vertices: Vec<Vertex>,
    /// Deduplicated unit edge normals of the parent part.
    pub axes: Vec<Point>,
    /// Tight AABB covering every part.
    pub bounds: Bounds,
    /// Centroid / pose position.
    pub position: Point,
    /// Orientation in radians.
    pub angle: f64,
    /// Position one step ago — the other half of the Verlet state.
    pub position_prev: Point,
    /// Angle one step ago.
    pub angle_prev: f64,

    // --- dynamics ---
    /// Force accumulator, zeroed every step after integration.
    pub force: Point,
    /// Torque accumulator, zeroed every step after integration.
    pub torque: f64,
    /// Total mass; `f64::INFINITY` for static bodies.
    pub mass: f64,
    /// `1 / mass`, pinned to 0 for static/sleeping bodies.
    pub inverse_mass: f64,
    /// Moment of inertia about the centroid.
    pub inertia: f64,
    /// `1 / inertia`, pinned to 0 for static/sleeping bodies.
    pub inverse_inertia: f64,
    /// Mass per unit area.
    pub density: f64,
    /// Polygon area (sum across parts).
    pub area: f64,

    // --- material ---
    /// Dynamic (kinetic) friction coefficient.
    pub friction: f64,
    /// Static friction coefficient.
    pub friction_static: f64,
    /// Coefficient of restitution (bounciness), `0..=1`.
    pub restitution: f64,
    /// Linear air drag applied every step.
    pub friction_air: f64,
    /// Penetration tolerance below which no position correction applies.
    pub slop: f64,
    /// Per-body time dilation factor used by `set/get_velocity`.
    pub time_scale: f64,

    // --- lifecycle ---
    /// Infinite mass/inertia, doesn't move, always rejected pairwise in
    /// the broadphase against other static/sleeping bodies.
    pub is_static: bool,
    /// Excluded from integration and (mostly) from waking other bodies.
    pub is_sleeping: bool,
    /// Detected for events but never resolved (no impulses applied).
    pub is_sensor: bool,
    /// Collision category/mask/group filter.
    pub collision_filter: CollisionFilter,

    // --- compound ---
    /// Additional parts beyond the parent (`parts[1..]` in Matter.js
    /// terms). Empty for simple bodies. Collision tests iterate these;
    /// the parent's own geometry above is never itself collision-tested
    /// when `child_parts` is non-empty (it is an aggregate bound holder
    /// only).
    pub child_parts: Vec<Part>,

    // --- warm-started accumulators ---
    /// Accumulated position correction from the resolver, reapplied and
    /// dampened each step.
    pub position_impulse: Impulse,
    /// Accumulated correction from the constraint solver.
    pub constraint_impulse: Impulse,
    /// Sum of `contact_count` across all active pairs this body is part
    /// of; used to fairly share position correction.
    pub total_contacts: u32,

    // --- sleeping ---
    /// Consecutive low-motion ticks; sleeps once this reaches
    /// `sleep_threshold`.
    pub sleep_counter: u32,
    /// How many consecutive low-motion ticks before sleeping; 0 disables
    /// sleeping for this body.
    pub sleep_threshold: u32,
    /// Biased exponential moving average of `speed^2 + angular_speed^2`.
    pub motion: f64,
    /// Reported linear speed (from [`Body::update_velocities`]).
    pub speed: f64,
    /// Reported angular speed.
    pub angular_speed: f64,
    /// Reported linear velocity, base-delta-normalized.
    pub velocity: Point,
    /// Reported angular velocity, base-delta-normalized.
    pub angular_velocity: f64,

    /// Set if constructed as an approximated circle; invalidated by
    /// non-uniform scaling, scaled by uniform scaling.
    pub circle_radius: Option<f64>,

    original: Option<OriginalMaterial>,
}

/// Options accepted by [`crate::World::create_body`].
#[derive(Debug, Clone)]
pub struct BodyOptions {
    /// Initial centroid position.
    pub position: Point,
    /// Initial orientation in radians.
    pub angle: f64,
    /// Clockwise polygon vertices, centred anywhere (re-centred on
    /// construction).
    pub vertices: Vec<Point>,
    /// Additional compound parts, each a clockwise vertex loop in the
    /// same coordinate space as `vertices`.
    pub parts: Vec<Vec<Point>>,
    /// Per-corner chamfer radii; empty disables chamfering.
    pub chamfer_radii: Vec<f64>,
    /// If set, overrides the density-derived mass.
    pub mass: Option<f64>,
    /// Mass per unit area, used when `mass` is unset.
    pub density: f64,
    pub friction: f64,
    pub friction_static: f64,
    pub friction_air: f64,
    pub restitution: f64,
    pub slop: f64,
    pub time_scale: f64,
    pub is_static: bool,
    pub is_sensor: bool,
    pub sleep_threshold: u32,
    pub collision_filter: CollisionFilter,
    /// Set by the shape factories when the vertices approximate a
    /// circle; left `None` for anything built by hand.
    pub circle_radius: Option<f64>,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            position: Point::zero(),
            angle: 0.0,
            vertices: Vec::new(),
            parts: Vec::new(),
            chamfer_radii: Vec::new(),
            mass: None,
            density: 0.001,
            friction: 0.1,
            friction_static: 0.5,
            friction_air: 0.01,
            restitution: 0.0,
            slop: 0.05,
            time_scale: 1.0,
            is_static: false,
            is_sensor: false,
            sleep_threshold: 60,
            collision_filter: CollisionFilter::default(),
            circle_radius: None,
        }
    }
}

impl Body {
    /// Constructs a body. `id` is a placeholder until the world inserts
    /// it into its arena and assigns the real key.
    pub(crate) fn new(placeholder_id: BodyId, options: BodyOptions) -> Result<Self> {
        let raw_points = if options.chamfer_radii.is_empty() {
            options.vertices.clone()
        } else {
            let v = geometry::vertices_from_points(&options.vertices);
            geometry::chamfer(&v, &options.chamfer_radii, None)
        };

        let mut parent_part = Part::from_points(&raw_points)?;
        let mut child_parts = Vec::with_capacity(options.parts.len());
        for points in &options.parts {
            child_parts.push(Part::from_points(points)?);
        }

        let mut body = Self {
            id: placeholder_id,
            label: "Body".into(),
            vertices: Vec::new(),
            axes: Vec::new(),
            bounds: Bounds::zero(),
            position: options.position,
            angle: 0.0,
            position_prev: options.position,
            angle_prev: 0.0,
            force: Point::zero(),
            torque: 0.0,
            mass: 0.0,
            inverse_mass: 0.0,
            inertia: 0.0,
            inverse_inertia: 0.0,
            density: options.density,
            area: 0.0,
            friction: options.friction,
            friction_static: options.friction_static,
            restitution: options.restitution,
            friction_air: options.friction_air,
            slop: options.slop,
            time_scale: options.time_scale,
            is_static: false,
            is_sleeping: false,
            is_sensor: options.is_sensor,
            collision_filter: options.collision_filter,
            child_parts: Vec::new(),
            position_impulse: Impulse::default(),
            constraint_impulse: Impulse::default(),
            total_contacts: 0,
            sleep_counter: 0,
            sleep_threshold: options.sleep_threshold,
            motion: 0.0,
            speed: 0.0,
            angular_speed: 0.0,
            velocity: Point::zero(),
            angular_velocity: 0.0,
            circle_radius: options.circle_radius,
            original: None,
        };

        // Translate the parent part to `position` and move it into the
        // body's own top-level fields (parts[0] is self).
        geometry::translate(&mut parent_part.vertices, options.position, 1.0);
        parent_part.recompute_bounds(None);
        parent_part.position = options.position;

        for part in &mut child_parts {
            let centroid = geometry::centre(&part.vertices);
            geometry::translate(&mut part.vertices, -centroid, 1.0);
            geometry::translate(&mut part.vertices, options.position + centroid, 1.0);
            part.position = options.position + centroid;
            part.recompute_bounds(None);
        }

        body.vertices = parent_part.vertices;
        body.axes = parent_part.axes;
        body.bounds = parent_part.bounds;
        body.child_parts = child_parts;

        if options.angle != 0.0 {
            body.rotate_in_place(options.angle);
        }
        body.refresh_bounds(None);

        body.set_density(options.density);
        if let Some(mass) = options.mass {
            body.set_mass(mass);
        }

        if options.is_static {
            body.set_static(true);
        }

        Ok(body)
    }

    /// Whether this body has any child parts (is a compound body).
    pub fn is_compound(&self) -> bool {
        !self.child_parts.is_empty()
    }

    fn rotate_in_place(&mut self, delta_angle: f64) {
        geometry::rotate_all(&mut self.vertices, delta_angle, self.position);
        geometry::rotate_axes(&mut self.axes, delta_angle);
        for part in &mut self.child_parts {
            geometry::rotate_all(&mut part.vertices, delta_angle, self.position);
            geometry::rotate_axes(&mut part.axes, delta_angle);
            part.position = geometry::rotate_about(part.position, delta_angle, self.position);
        }
        self.angle = geometry::normalize_angle(self.angle + delta_angle);
    }

    fn refresh_bounds(&mut self, velocity: Option<Point>) {
        self.bounds.update(&self.vertices, velocity);
        for part in &mut self.child_parts {
            part.recompute_bounds(velocity);
            self.bounds.min.x = self.bounds.min.x.min(part.bounds.min.x);
            self.bounds.min.y = self.bounds.min.y.min(part.bounds.min.y);
            self.bounds.max.x = self.bounds.max.x.max(part.bounds.max.x);
            self.bounds.max.y = self.bounds.max.y.max(part.bounds.max.y);
        }
    }

    /// Re-derives axes, area, density-implied mass, and inertia from the
    /// current vertex set, then re-centres so the centroid sits at the
    /// origin before translating back to `position`.
    pub fn set_vertices(&mut self, points: &[Point]) -> Result<()> {
        let mut vertices = geometry::vertices_from_points(points);
        if vertices.len() < 3 {
            return Err(EngineError::InvalidGeometry {
                reason: "fewer than 3 vertices".into(),
            });
        }
        let signed_area = geometry::area(&vertices, true);
        if signed_area.abs() < f64::EPSILON {
            return Err(EngineError::InvalidGeometry {
                reason: "zero-area polygon".into(),
            });
        }

        self.axes = geometry::axes_from_vertices(&vertices);
        self.area = geometry::area(&vertices, false);
        self.set_mass(self.density * self.area);

        let centroid = geometry::centre(&vertices);
        geometry::translate(&mut vertices, -centroid, 1.0);
        self.inertia = geometry::inertia(&vertices, self.mass) * INERTIA_SCALE;
        self.inverse_inertia = if self.is_static || self.is_sleeping {
            0.0
        } else {
            1.0 / self.inertia
        };

        geometry::translate(&mut vertices, self.position, 1.0);
        self.vertices = vertices;
        self.refresh_bounds(None);
        Ok(())
    }

    /// Sets mass directly, preserving the inertia/mass ratio ("moment")
    /// and reconstructing density from the new mass.
    pub fn set_mass(&mut self, mass: f64) {
        let moment = if self.mass > 0.0 {
            self.inertia / (self.mass / 6.0)
        } else {
            0.0
        };

        self.mass = mass;
        self.inverse_mass = if self.is_static || self.is_sleeping || mass == 0.0 {
            0.0
        } else {
            1.0 / mass
        };

        self.inertia = moment * (self.mass / 6.0);
        self.inverse_inertia = if self.is_static || self.is_sleeping || self.inertia == 0.0 {
            0.0
        } else {
            1.0 / self.inertia
        };

        self.density = if self.area > 0.0 {
            self.mass / self.area
        } else {
            self.density
        };
    }

    /// Sets density, rederiving mass (`density * area`) and inertia.
    pub fn set_density(&mut self, density: f64) {
        self.density = density;
        self.area = geometry::area(&self.vertices, false);
        self.mass = density * self.area;
        self.inverse_mass = if self.is_static || self.mass == 0.0 {
            0.0
        } else {
            1.0 / self.mass
        };

        let mut centred = self.vertices.clone();
        let centroid = geometry::centre(&centred);
        geometry::translate(&mut centred, -centroid, 1.0);
        self.inertia = geometry::inertia(&centred, self.mass) * INERTIA_SCALE;
        self.inverse_inertia = if self.is_static || self.inertia == 0.0 {
            0.0
        } else {
            1.0 / self.inertia
        };
    }

    /// Directly sets inertia (and its inverse), leaving mass untouched.
    pub fn set_inertia(&mut self, inertia: f64) {
        self.inertia = inertia;
        self.inverse_inertia = if self.is_static || self.is_sleeping || inertia == 0.0 {
            0.0
        } else {
            1.0 / inertia
        };
    }

    /// Freezes (`true`) or un-freezes (`false`) the body. Freezing
    /// snapshots material fields to restore exactly on unfreeze, clamps
    /// restitution to 0 and friction to 1, pins mass/inertia to
    /// infinity, and stops the Verlet state from registering the freeze
    /// as motion.
    pub fn set_static(&mut self, is_static: bool) {
        if is_static {
            self.original = Some(OriginalMaterial {
                restitution: self.restitution,
                friction: self.friction,
                mass: self.mass,
                inertia: self.inertia,
                density: self.density,
                inverse_mass: self.inverse_mass,
                inverse_inertia: self.inverse_inertia,
            });

            self.restitution = 0.0;
            self.friction = 1.0;
            self.mass = f64::INFINITY;
            self.inertia = f64::INFINITY;
            self.density = f64::INFINITY;
            self.inverse_mass = 0.0;
            self.inverse_inertia = 0.0;

            self.position_prev = self.position;
            self.angle_prev = self.angle;
            self.velocity = Point::zero();
            self.angular_velocity = 0.0;
            self.speed = 0.0;
            self.angular_speed = 0.0;
            self.motion = 0.0;

            self.is_static = true;
        } else if let Some(original) = self.original.take() {
            self.restitution = original.restitution;
            self.friction = original.friction;
            self.mass = original.mass;
            self.inertia = original.inertia;
            self.density = original.density;
            self.inverse_mass = original.inverse_mass;
            self.inverse_inertia = original.inverse_inertia;
            self.is_static = false;
        } else {
            self.is_static = false;
        }
    }

    /// Moves every part by `delta`. When `update_velocity` is false (the
    /// default Matter.js behaviour), `position_prev` shifts by the same
    /// delta so Verlet integration does not see this as motion; when
    /// true, velocity is set to `delta` instead.
    pub fn set_position(&mut self, position: Point, update_velocity: bool) {
        let delta = position - self.position;

        if update_velocity {
            self.position_prev = self.position;
            self.velocity = delta;
            self.speed = delta.magnitude();
        } else {
            self.position_prev += delta;
        }

        self.position = position;
        geometry::translate(&mut self.vertices, delta, 1.0);
        self.bounds.translate(delta);
        for part in &mut self.child_parts {
            part.position += delta;
            geometry::translate(&mut part.vertices, delta, 1.0);
            part.bounds.translate(delta);
        }
    }

    /// Rotates every part by a delta angle about the parent position.
    /// `update_velocity` controls whether `position_prev`/`angle_prev`
    /// track the rotation (no-velocity mode, the default) or whether
    /// `angle_prev` is simply assigned (velocity mode).
    pub fn set_angle(&mut self, angle: f64, update_velocity: bool) {
        let delta_angle = angle - self.angle;

        if update_velocity {
            self.angle_prev = self.angle;
            self.angular_velocity = delta_angle;
        }

        self.rotate_in_place(delta_angle);
        self.refresh_bounds(None);
    }

    /// Sets velocity by shifting `position_prev` so that the next
    /// integration step derives exactly `velocity`, rescaled from the
    /// base delta to this body's own `time_scale`.
    pub fn set_velocity(&mut self, velocity: Point) {
        self.position_prev = self.position - velocity;
        self.velocity = velocity;
        self.speed = velocity.magnitude();
    }

    /// Reads velocity normalized to the base delta.
    pub fn get_velocity(&self) -> Point {
        self.velocity
    }

    /// Sets angular velocity analogously to [`Body::set_velocity`].
    pub fn set_angular_velocity(&mut self, angular_velocity: f64) {
        self.angle_prev = self.angle - angular_velocity;
        self.angular_velocity = angular_velocity;
        self.angular_speed = angular_velocity.abs();
    }

    /// Reads angular velocity normalized to the base delta.
    pub fn get_angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    /// Translates the body without touching velocity (equivalent to
    /// `set_position(self.position + delta, false)`).
    pub fn translate(&mut self, delta: Point) {
        self.set_position(self.position + delta, false);
    }

    /// Rotates the body about its own centroid without touching
    /// angular velocity.
    pub fn rotate(&mut self, delta_angle: f64) {
        self.set_angle(self.angle + delta_angle, false);
    }

    /// Applies `force` at world-space `point`, accumulating torque
    /// `= (point - position) x force`.
    pub fn apply_force(&mut self, point: Point, force: Point) {
        self.force += force;
        let offset = point - self.position;
        self.torque += geometry::cross(offset, force);
    }

    /// Rescales every part's vertices about `point` (defaulting to the
    /// body's own position when integrating uniformly), recomputing
    /// axes/area/mass/inertia. Invalidates `circle_radius` on
    /// non-uniform scaling; scales it uniformly otherwise.
    pub fn scale(&mut self, scale_x: f64, scale_y: f64) {
        let point = self.position;
        geometry::scale(&mut self.vertices, scale_x, scale_y, Some(point));
        for part in &mut self.child_parts {
            geometry::scale(&mut part.vertices, scale_x, scale_y, Some(point));
        }

        self.axes = geometry::axes_from_vertices(&self.vertices);
        self.set_density(self.density);
        self.refresh_bounds(None);

        if (scale_x - scale_y).abs() > f64::EPSILON {
            self.circle_radius = None;
        } else if let Some(r) = self.circle_radius {
            self.circle_radius = Some(r * scale_x);
        }
    }

    /// Advances the body one Verlet step of `delta` milliseconds.
    ///
    /// Forms `time_correction = delta / previous_delta` and the air-drag
    /// factor `1 - friction_air * (delta / BASE_DELTA)`, then computes
    /// `velocity = (position - position_prev) * time_correction * drag +
    /// (force / mass) * delta^2` before advancing `position_prev` and
    /// `position`. Angular integration mirrors this with torque/inertia.
    pub fn update(&mut self, delta: f64, previous_delta: f64) {
        if self.is_static || self.is_sleeping {
            return;
        }

        let delta_scaled = delta * self.time_scale;
        let previous_delta_scaled = if previous_delta > 0.0 {
            previous_delta * self.time_scale
        } else {
            delta_scaled
        };
        let time_correction = delta_scaled / previous_delta_scaled.max(f64::EPSILON);
        let friction_air = 1.0 - self.friction_air * (delta_scaled / BASE_DELTA);

        let velocity = (self.position - self.position_prev) * time_correction * friction_air
            + (self.force * self.inverse_mass) * (delta_scaled * delta_scaled);

        let angular_velocity = (self.angle - self.angle_prev) * time_correction * friction_air
            + (self.torque * self.inverse_inertia) * (delta_scaled * delta_scaled);

        self.position_prev = self.position;
        self.angle_prev = self.angle;

        // Rotate about the pre-update centroid first, while the
        // vertices are still centred on it; translating first would
        // make `rotate_in_place` pivot on the wrong point.
        self.rotate_in_place(angular_velocity);

        self.position += velocity;
        geometry::translate(&mut self.vertices, velocity, 1.0);
        for part in &mut self.child_parts {
            geometry::translate(&mut part.vertices, velocity, 1.0);
            part.position += velocity;
        }

        self.refresh_bounds(Some(velocity));
    }

    /// Converts the raw per-step Verlet deltas into base-delta-
    /// normalized `velocity`/`angular_velocity`/`speed`/`angular_speed`,
    /// used only for reporting and sleeping decisions.
    pub fn update_velocities(&mut self) {
        self.velocity = self.position - self.position_prev;
        self.speed = self.velocity.magnitude();
        self.angular_velocity = geometry::normalize_angle(self.angle - self.angle_prev);
        self.angular_speed = self.angular_velocity.abs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(w: f64, h: f64) -> Vec<Point> {
        vec![
            Point::new(-w / 2.0, -h / 2.0),
            Point::new(w / 2.0, -h / 2.0),
            Point::new(w / 2.0, h / 2.0),
            Point::new(-w / 2.0, h / 2.0),
        ]
    }

    fn make_body(options: BodyOptions) -> Body {
        Body::new(BodyId::default(), options).expect("valid body")
    }

    #[test]
    fn construction_centres_vertices_on_position() {
        let body = make_body(BodyOptions {
            position: Point::new(100.0, 50.0),
            vertices: rect(40.0, 40.0),
            ..Default::default()
        });

        let centroid = geometry::centre(&body.vertices);
        assert!((centroid - body.position).magnitude() < 1e-9);
    }

    #[test]
    fn too_few_vertices_is_rejected() {
        let result = Body::new(
            BodyId::default(),
            BodyOptions {
                vertices: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(EngineError::InvalidGeometry { .. })));
    }

    #[test]
    fn set_static_then_restore_recovers_material_fields() {
        let mut body = make_body(BodyOptions {
            vertices: rect(40.0, 40.0),
            density: 0.002,
            ..Default::default()
        });

        let (mass, inertia, density) = (body.mass, body.inertia, body.density);

        body.set_static(true);
        assert_eq!(body.inverse_mass, 0.0);
        assert_eq!(body.friction, 1.0);

        body.set_static(false);
        assert!((body.mass - mass).abs() < 1e-9);
        assert!((body.inertia - inertia).abs() < 1e-9);
        assert!((body.density - density).abs() < 1e-9);
    }

    #[test]
    fn set_position_default_does_not_perturb_velocity() {
        let mut body = make_body(BodyOptions {
            vertices: rect(10.0, 10.0),
            ..Default::default()
        });

        body.position_prev = body.position;
        body.set_position(body.position + Point::new(5.0, 0.0), false);
        body.update_velocities();

        assert!(body.velocity.magnitude() < 1e-9);
    }

    #[test]
    fn gravity_like_force_moves_body_downward() {
        let mut body = make_body(BodyOptions {
            vertices: rect(40.0, 40.0),
            ..Default::default()
        });
        let start_y = body.position.y;

        body.force = Point::new(0.0, body.mass * 0.001);
        body.update(BASE_DELTA, BASE_DELTA);

        assert!(body.position.y > start_y);
    }

    #[test]
    fn static_body_does_not_integrate() {
        let mut body = make_body(BodyOptions {
            vertices: rect(40.0, 40.0),
            is_static: true,
            ..Default::default()
        });
        let start = body.position;

        body.force = Point::new(0.0, 10.0);
        body.update(BASE_DELTA, BASE_DELTA);

        assert_eq!(body.position, start);
    }

    #[test]
    fn collision_filter_group_override() {
        let a = CollisionFilter {
            category: 1,
            mask: 1,
            group: -1,
        };
        let b = CollisionFilter {
            category: 2,
            mask: 2,
            group: -1,
        };
        assert!(!can_collide(&a, &b));

        let positive_group = CollisionFilter { group: 1, ..a };
        let positive_group_b = CollisionFilter { group: 1, ..b };
        assert!(can_collide(&positive_group, &positive_group_b));
    }
}

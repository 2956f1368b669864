//! 2D vector, bounds, and polygon primitives.
//!
//! Everything here is pure geometry with no notion of a body, a world, or
//! time — it is the leaf of the pipeline described in the crate root
//! docs. Ground truth for the polygon formulas is Matter.js's
//! `Vertices`/`Bounds`/`Axes` modules (ported via `original_source`), not
//! any general-purpose computational-geometry reference, so the exact
//! constants and edge-case handling below intentionally match that
//! lineage rather than a textbook derivation.

use std::f64::consts::PI;

use vek::Vec2;

/// All geometry in this crate is double precision; `f32` accumulates too
/// much drift across a long-running simulation's thousands of steps.
pub type Point = Vec2<f64>;

/// 2D cross product (the z component of the 3D cross product of the two
/// vectors extended with z=0). Positive means `b` is counter-clockwise
/// from `a`.
#[inline]
pub fn cross(a: Point, b: Point) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Cross product of `b - a` and `c - a`, used by the convex-hull turn
/// predicate.
#[inline]
pub fn cross3(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Rotate a point about the origin by `angle` radians.
#[inline]
pub fn rotate(p: Point, angle: f64) -> Point {
    let (sin, cos) = angle.sin_cos();
    Point::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos)
}

/// Rotate `point` about `origin` by `angle` radians.
#[inline]
pub fn rotate_about(point: Point, angle: f64, origin: Point) -> Point {
    origin + rotate(point - origin, angle)
}

/// A single vertex of a body's polygon.
///
/// `owner` is a non-owning back-reference to the body the vertex belongs
/// to, kept only so narrowphase/resolver code can recover "which body is
/// this contact vertex on" without threading an extra parameter through
/// every call — the body is what owns the `Vec<Vertex>`, never the
/// reverse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// World-space position.
    pub point: Point,
    /// Position of this vertex within its polygon, `0..n-1` clockwise.
    pub index: usize,
    /// Whether this vertex sits on the seam between two parts of a
    /// compound body and should be skipped by some contact-selection
    /// heuristics. Unused by simple (non-compound) bodies.
    pub is_internal: bool,
}

impl Vertex {
    /// Build a fresh, non-internal vertex at `point` with the given
    /// polygon index.
    pub fn new(point: Point, index: usize) -> Self {
        Self {
            point,
            index,
            is_internal: false,
        }
    }
}

/// Builds vertices from a clockwise sequence of points.
pub fn vertices_from_points(points: &[Point]) -> Vec<Vertex> {
    points
        .iter()
        .enumerate()
        .map(|(i, &p)| Vertex::new(p, i))
        .collect()
}

/// Parses a path string of whitespace/comma separated `x y` pairs
/// (optionally prefixed with an `L`/`M` SVG-style marker per pair) into
/// vertices. Mirrors `Vertices.fromPath`.
pub fn vertices_from_path(path: &str) -> Vec<Vertex> {
    let mut points = Vec::new();
    let mut nums = path
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|tok| !tok.is_empty())
        .filter_map(|tok| tok.trim_start_matches(['L', 'l', 'M', 'm']).parse::<f64>().ok());

    while let (Some(x), Some(y)) = (nums.next(), nums.next()) {
        points.push(Point::new(x, y));
    }

    vertices_from_points(&points)
}

/// Signed or absolute polygon area via the shoelace formula.
///
/// `signed` preserves orientation sign, needed by [`centre`] to divide by
/// `6 * signed_area`.
pub fn area(vertices: &[Vertex], signed: bool) -> f64 {
    let n = vertices.len();
    let mut total = 0.0;
    let mut j = n - 1;

    for i in 0..n {
        total += (vertices[j].point.x - vertices[i].point.x)
            * (vertices[j].point.y + vertices[i].point.y);
        j = i;
    }

    if signed {
        total / 2.0
    } else {
        (total / 2.0).abs()
    }
}

/// Area-weighted centroid of a polygon.
pub fn centre(vertices: &[Vertex]) -> Point {
    let signed_area = area(vertices, true);
    let n = vertices.len();
    let mut c = Point::zero();

    for i in 0..n {
        let j = (i + 1) % n;
        let cr = cross(vertices[i].point, vertices[j].point);
        c += (vertices[i].point + vertices[j].point) * cr;
    }

    c / (6.0 * signed_area)
}

/// Arithmetic mean of the vertex positions (not the area-weighted
/// centroid — used only by `clockwise_sort`, matching Matter.js).
pub fn mean(vertices: &[Vertex]) -> Point {
    let mut m = Point::zero();
    for v in vertices {
        m += v.point;
    }
    m / vertices.len() as f64
}

/// Moment of inertia of a polygon of the given total `mass`, about its
/// own centroid. Not a generic textbook formula — the reference
/// engine's derivation includes an outer mass/6 scale that this crate
/// preserves verbatim for behavioral parity.
pub fn inertia(vertices: &[Vertex], mass: f64) -> f64 {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    let n = vertices.len();

    for i in 0..n {
        let j = (i + 1) % n;
        let vi = vertices[i].point;
        let vj = vertices[j].point;
        let cr = cross(vj, vi).abs();
        numerator += cr * (vj.dot(vj) + vj.dot(vi) + vi.dot(vi));
        denominator += cr;
    }

    if denominator == 0.0 {
        0.0
    } else {
        (mass / 6.0) * (numerator / denominator)
    }
}

/// Translates every vertex in-place by `delta` (scaled by `scalar`).
pub fn translate(vertices: &mut [Vertex], delta: Point, scalar: f64) {
    let shift = delta * scalar;
    for v in vertices.iter_mut() {
        v.point += shift;
    }
}

/// Rotates every vertex in-place by `angle` radians about `point`.
pub fn rotate_all(vertices: &mut [Vertex], angle: f64, point: Point) {
    if angle == 0.0 {
        return;
    }
    for v in vertices.iter_mut() {
        v.point = rotate_about(v.point, angle, point);
    }
}

/// Inside-test for a clockwise polygon. For every consecutive edge
/// `(v, next)`, any positive cross-like scalar means `point` is outside.
pub fn contains(vertices: &[Vertex], point: Point) -> bool {
    let mut prev = vertices[vertices.len() - 1].point;

    for v in vertices {
        let next = v.point;
        let scalar =
            (point.x - prev.x) * (next.y - prev.y) + (point.y - prev.y) * (prev.x - next.x);
        if scalar > 0.0 {
            return false;
        }
        prev = next;
    }

    true
}

/// Scales vertices in-place from `point` (defaults to the centroid when
/// `None`).
pub fn scale(vertices: &mut [Vertex], scale_x: f64, scale_y: f64, point: Option<Point>) {
    if scale_x == 1.0 && scale_y == 1.0 {
        return;
    }

    let point = point.unwrap_or_else(|| centre(vertices));

    for v in vertices.iter_mut() {
        let delta = v.point - point;
        v.point = Point::new(point.x + delta.x * scale_x, point.y + delta.y * scale_y);
    }
}

/// Sorts vertices clockwise around their mean, in-place, reassigning
/// `index` to match the new order.
pub fn clockwise_sort(vertices: &mut Vec<Vertex>) {
    let centre_pt = mean(vertices);
    vertices.sort_by(|a, b| {
        let angle_a = (a.point.y - centre_pt.y).atan2(a.point.x - centre_pt.x);
        let angle_b = (b.point.y - centre_pt.y).atan2(b.point.x - centre_pt.x);
        angle_a.partial_cmp(&angle_b).unwrap()
    });
    for (i, v) in vertices.iter_mut().enumerate() {
        v.index = i;
    }
}

/// Returns `Some(true)`/`Some(false)` if convexity is decidable, `None`
/// if the vertex count is too small (matches Matter.js, which likewise
/// refuses to answer for degenerate input).
pub fn is_convex(vertices: &[Vertex]) -> Option<bool> {
    let n = vertices.len();
    if n < 3 {
        return None;
    }

    let mut flag = 0u8;
    for i in 0..n {
        let j = (i + 1) % n;
        let k = (i + 2) % n;
        let z = (vertices[j].point.x - vertices[i].point.x)
            * (vertices[k].point.y - vertices[j].point.y)
            - (vertices[j].point.y - vertices[i].point.y)
                * (vertices[k].point.x - vertices[j].point.x);

        if z < 0.0 {
            flag |= 1;
        } else if z > 0.0 {
            flag |= 2;
        }

        if flag == 3 {
            return Some(false);
        }
    }

    if flag != 0 {
        Some(true)
    } else {
        None
    }
}

/// Convex hull of a set of points via Andrew's monotone chain, with
/// `cross3(a, b, c) <= 0` as the turn predicate.
pub fn hull(points: &[Point]) -> Vec<Point> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap().then(a.y.partial_cmp(&b.y).unwrap()));

    let mut lower: Vec<Point> = Vec::new();
    for &p in &sorted {
        while lower.len() >= 2 && cross3(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0
        {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point> = Vec::new();
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross3(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0
        {
            upper.pop();
        }
        upper.push(p);
    }

    upper.pop();
    lower.pop();

    upper.into_iter().chain(lower).collect()
}

/// Replaces each corner with a rounded chamfer arc. `radii` is consumed
/// per-corner with the last entry repeated for any extra corners; a
/// radius of 0 leaves that corner untouched. `quality` fixes the number
/// of arc segments per corner, or `None` to derive it from the radius
/// the way Matter.js does (`radius^0.32 * 1.75`, clamped to `[2, 14]`
/// and rounded up to even).
pub fn chamfer(vertices: &[Vertex], radii: &[f64], quality: Option<usize>) -> Vec<Point> {
    const QUALITY_MIN: usize = 2;
    const QUALITY_MAX: usize = 14;

    let n = vertices.len();
    let mut out = Vec::new();

    for i in 0..n {
        let prev = vertices[(i + n - 1) % n].point;
        let vertex = vertices[i].point;
        let next = vertices[(i + 1) % n].point;
        let radius = *radii.get(i).unwrap_or_else(|| radii.last().unwrap_or(&8.0));

        if radius == 0.0 {
            out.push(vertex);
            continue;
        }

        let prev_normal = (Point::new(vertex.y - prev.y, prev.x - vertex.x)).normalized();
        let next_normal = (Point::new(next.y - vertex.y, vertex.x - next.x)).normalized();

        let diagonal_radius = (2.0 * radius * radius).sqrt();
        let radius_vector = prev_normal * radius;
        let mid_normal = ((prev_normal + next_normal) * 0.5).normalized();
        let scaled_vertex = vertex - mid_normal * diagonal_radius;

        let precision = match quality {
            Some(q) => q,
            None => {
                let p = (radius.powf(0.32) * 1.75) as usize;
                p.clamp(QUALITY_MIN, QUALITY_MAX)
            }
        };
        let precision = if precision % 2 == 1 {
            precision + 1
        } else {
            precision
        };

        let alpha = prev_normal.dot(next_normal).clamp(-1.0, 1.0).acos();
        let theta = alpha / precision as f64;

        for j in 0..precision {
            out.push(rotate(radius_vector, theta * j as f64) + scaled_vertex);
        }
    }

    out
}

/// An axis-aligned bounding box. `min <= max` on both axes is the
/// invariant; [`Bounds::update`] always recomputes both from scratch so
/// this can never drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Lower-left corner.
    pub min: Point,
    /// Upper-right corner.
    pub max: Point,
}

impl Bounds {
    /// An empty bounds at the origin.
    pub fn zero() -> Self {
        Self {
            min: Point::zero(),
            max: Point::zero(),
        }
    }

    /// Builds bounds that tightly wrap `vertices`.
    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        let mut b = Self::zero();
        b.update(vertices, None);
        b
    }

    /// Recomputes `min`/`max` from `vertices`. If `velocity` is given,
    /// the box is extended along the sign of each component to cover the
    /// swept motion expected over the next step.
    pub fn update(&mut self, vertices: &[Vertex], velocity: Option<Point>) {
        self.min = Point::new(f64::INFINITY, f64::INFINITY);
        self.max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);

        for v in vertices {
            self.max.x = self.max.x.max(v.point.x);
            self.min.x = self.min.x.min(v.point.x);
            self.max.y = self.max.y.max(v.point.y);
            self.min.y = self.min.y.min(v.point.y);
        }

        if let Some(vel) = velocity {
            if vel.x > 0.0 {
                self.max.x += vel.x;
            } else {
                self.min.x += vel.x;
            }
            if vel.y > 0.0 {
                self.max.y += vel.y;
            } else {
                self.min.y += vel.y;
            }
        }
    }

    /// Whether `point` falls within the box, inclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Whether two boxes overlap (touching counts as overlapping).
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.max.y >= other.min.y
            && self.min.y <= other.max.y
    }

    /// Translates the box in-place by `delta`.
    pub fn translate(&mut self, delta: Point) {
        self.min += delta;
        self.max += delta;
    }

    /// Moves the box so `min` lands on `position`, preserving its size.
    pub fn shift(&mut self, position: Point) {
        let size = self.max - self.min;
        self.min = position;
        self.max = position + size;
    }
}

/// Computes the deduplicated set of unit edge normals for a polygon.
/// Two edges whose normals share a slope (parallel edges, including the
/// two opposite sides of a box) collapse to a single axis.
pub fn axes_from_vertices(vertices: &[Vertex]) -> Vec<Point> {
    let n = vertices.len();
    let mut by_gradient: Vec<(f64, Point)> = Vec::with_capacity(n);

    for i in 0..n {
        let j = (i + 1) % n;
        let edge = vertices[j].point - vertices[i].point;
        let normal = Point::new(edge.y, -edge.x).normalized();

        let gradient_key = if normal.x == 0.0 {
            if normal.y >= 0.0 {
                f64::INFINITY
            } else {
                f64::NEG_INFINITY
            }
        } else {
            normal.y / normal.x
        };

        if !by_gradient.iter().any(|(k, _)| *k == gradient_key) {
            by_gradient.push((gradient_key, normal));
        }
    }

    by_gradient.into_iter().map(|(_, n)| n).collect()
}

/// Rotates a set of axes in-place by `angle` radians.
pub fn rotate_axes(axes: &mut [Point], angle: f64) {
    if angle == 0.0 {
        return;
    }
    for axis in axes.iter_mut() {
        *axis = rotate(*axis, angle);
    }
}

/// Normalizes an angle to `(-pi, pi]`.
pub fn normalize_angle(mut angle: f64) -> f64 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Vec<Vertex> {
        vertices_from_points(&[
            Point::new(-size / 2.0, -size / 2.0),
            Point::new(size / 2.0, -size / 2.0),
            Point::new(size / 2.0, size / 2.0),
            Point::new(-size / 2.0, size / 2.0),
        ])
    }

    #[test]
    fn square_area_and_centroid() {
        let square = square(40.0);
        assert!((area(&square, false) - 1600.0).abs() < 1e-9);
        let c = centre(&square);
        assert!(c.x.abs() < 1e-9 && c.y.abs() < 1e-9);
    }

    #[test]
    fn square_contains_origin_not_far_point() {
        let square = square(40.0);
        assert!(contains(&square, Point::zero()));
        assert!(!contains(&square, Point::new(1000.0, 1000.0)));
    }

    #[test]
    fn axis_aligned_box_has_three_gradient_buckets() {
        // The two horizontal edges' normals are (0, -1) and (0, 1): since
        // normal.x == 0 they take the +-infinity branch and hash to
        // *distinct* keys (+inf vs -inf), they don't collapse into each
        // other the way the two vertical edges' normals (1, 0) and (-1, 0)
        // do (0.0 and -0.0 compare equal). So a box yields 3 axes, not 2.
        let square = square(40.0);
        let axes = axes_from_vertices(&square);
        assert_eq!(axes.len(), 3);
    }

    #[test]
    fn hull_of_square_plus_interior_point_drops_interior_point() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(5.0, 5.0),
        ];
        let h = hull(&pts);
        assert_eq!(h.len(), 4);
        assert!(!h.contains(&Point::new(5.0, 5.0)));
    }

    #[test]
    fn bounds_overlap() {
        let a = Bounds {
            min: Point::new(0.0, 0.0),
            max: Point::new(10.0, 10.0),
        };
        let b = Bounds {
            min: Point::new(5.0, 5.0),
            max: Point::new(15.0, 15.0),
        };
        let c = Bounds {
            min: Point::new(20.0, 20.0),
            max: Point::new(30.0, 30.0),
        };
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn inertia_is_positive_for_a_real_polygon() {
        let square = square(40.0);
        assert!(inertia(&square, 1.0) > 0.0);
    }
}

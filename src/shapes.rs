//! Convenience body-shape factories built on top of [`crate::body`].
//!
//! Grounded on `original_source/engine/factory/bodies.py`. The
//! grid/stack/pyramid/chain/mesh composite-layout helpers in that file
//! are scene-building conveniences rather than core physics and are
//! left out; everything that produces a single body's geometry is
//! kept.

use std::f64::consts::PI;

use crate::body::BodyOptions;
use crate::geometry::Point;

/// Builds axis-aligned rectangle vertices of the given size, centred on
/// the origin (the body constructor re-centres on its own position
/// anyway, but centring here keeps callers' `position` meaning "centre"
/// rather than "top-left corner", matching every other factory below).
pub fn rectangle_vertices(width: f64, height: f64) -> Vec<Point> {
    vec![
        Point::new(-width / 2.0, -height / 2.0),
        Point::new(width / 2.0, -height / 2.0),
        Point::new(width / 2.0, height / 2.0),
        Point::new(-width / 2.0, height / 2.0),
    ]
}

/// [`BodyOptions`] for a rectangle of size `width x height` centred at
/// `position`.
pub fn rectangle(position: Point, width: f64, height: f64) -> BodyOptions {
    BodyOptions {
        position,
        vertices: rectangle_vertices(width, height),
        ..Default::default()
    }
}

/// Builds a trapezoid's vertices: a flat bottom of `width`, a top
/// shrunk by `slope` on each side, `slope` clamped into `0.01..=0.99`.
pub fn trapezoid_vertices(width: f64, height: f64, slope: f64) -> Vec<Point> {
    let slope = slope.clamp(0.01, 0.99);
    let roof = (1.0 - slope * 2.0) * width;

    let x1 = width * slope;
    let x2 = x1 + roof;
    let x3 = x2 + width * slope;

    let mut vertices = vec![
        Point::new(0.0, 0.0),
        Point::new(x3, 0.0),
        Point::new(x2, height),
        Point::new(x1, height),
    ];

    if x1 < width * 0.5 {
        vertices[0] = Point::new(x1, 0.0);
        vertices.remove(3);
    }

    let centroid = Point::new(width / 2.0, height / 2.0);
    vertices.iter().map(|v| *v - centroid).collect()
}

/// [`BodyOptions`] for a trapezoid centred at `position`.
pub fn trapezoid(position: Point, width: f64, height: f64, slope: f64) -> BodyOptions {
    BodyOptions {
        position,
        vertices: trapezoid_vertices(width, height, slope),
        ..Default::default()
    }
}

/// Builds a regular polygon's vertices, `sides >= 3`, centred on the
/// origin with its first vertex offset by half a wedge angle (matching
/// the reference engine's orientation convention).
pub fn polygon_vertices(sides: usize, radius: f64) -> Vec<Point> {
    let sides = sides.max(3);
    let theta = 2.0 * PI / sides as f64;
    let offset = theta * 0.5;

    (0..sides)
        .map(|i| {
            let angle = offset + i as f64 * theta;
            Point::new(angle.cos() * radius, angle.sin() * radius)
        })
        .collect()
}

/// [`BodyOptions`] for a regular polygon centred at `position`.
pub fn polygon(position: Point, sides: usize, radius: f64) -> BodyOptions {
    BodyOptions {
        position,
        vertices: polygon_vertices(sides, radius),
        ..Default::default()
    }
}

/// [`BodyOptions`] for a circle, approximated by a polygon. Small
/// circles (`radius <= 10`) use as few as 10 sides; anything up to
/// `max_sides` (25 by default) scales the side count with the radius,
/// matching the reference engine's quality/cost tradeoff.
pub fn circle(position: Point, radius: f64, max_sides: Option<usize>) -> BodyOptions {
    let max_sides = max_sides.unwrap_or(25);
    let sides = (radius.round() as usize).clamp(10, max_sides);

    BodyOptions {
        circle_radius: Some(radius),
        ..polygon(position, sides, radius)
    }
}

/// [`BodyOptions`] from an explicit, already-convex vertex loop (no
/// convex decomposition is attempted — concave input should be built
/// as a compound body via `BodyOptions::parts` instead).
pub fn from_vertices(position: Point, vertices: Vec<Point>) -> BodyOptions {
    BodyOptions {
        position,
        vertices,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_has_four_vertices() {
        let vertices = rectangle_vertices(10.0, 20.0);
        assert_eq!(vertices.len(), 4);
    }

    #[test]
    fn polygon_clamps_sides_to_at_least_three() {
        let vertices = polygon_vertices(1, 10.0);
        assert_eq!(vertices.len(), 3);
    }

    #[test]
    fn small_circle_uses_minimum_sides() {
        let options = circle(Point::zero(), 2.0, None);
        assert_eq!(options.vertices.len(), 10);
    }

    #[test]
    fn large_circle_uses_max_sides() {
        let options = circle(Point::zero(), 100.0, None);
        assert_eq!(options.vertices.len(), 25);
    }

    #[test]
    fn trapezoid_drops_a_vertex_for_steep_slope() {
        let vertices = trapezoid_vertices(40.0, 20.0, 0.6);
        assert_eq!(vertices.len(), 3);
    }
}

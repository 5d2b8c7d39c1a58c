//! 2D geometric predicates and primitives.
//!
//! All predicates assume counter-clockwise (CCW) triangle orientation, which
//! the mesh maintains as an invariant for interior faces.
//!
//! # Robustness
//!
//! Predicates are evaluated in plain `f64` arithmetic with coordinates
//! translated to the query point before forming determinants, which removes
//! the dominant cancellation term. Inputs are geometric point sets (not
//! adversarial), so exact arithmetic is not used. The in-circle test uses a
//! strict inequality with a small tolerance: co-circular configurations count
//! as *legal*, the conventional Delaunay tie-break that guarantees the
//! legalization loop terminates on regular grids.

use nalgebra::Point2;

/// Tolerance for the in-circle determinant. Positive means strictly inside.
const INCIRCLE_EPS: f64 = 1e-10;

/// Twice the signed area of the triangle `(a, b, c)`.
///
/// Positive if the triangle is counter-clockwise, negative if clockwise,
/// zero if degenerate.
#[inline]
pub fn orient(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Check that `(a, b, c)` is strictly counter-clockwise.
#[inline]
pub fn is_ccw(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> bool {
    orient(a, b, c) > 0.0
}

/// Signed area of the triangle `(a, b, c)`.
#[inline]
pub fn area(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    0.5 * orient(a, b, c)
}

/// In-circle determinant: positive if `p` lies strictly inside the circle
/// through the CCW triangle `(a, b, c)`.
///
/// Coordinates are taken relative to `p`, which improves precision.
pub fn incircle(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>, p: Point2<f64>) -> f64 {
    let adx = a.x - p.x;
    let ady = a.y - p.y;
    let bdx = b.x - p.x;
    let bdy = b.y - p.y;
    let cdx = c.x - p.x;
    let cdy = c.y - p.y;

    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    adx * (bdy * clift - cdy * blift) - ady * (bdx * clift - cdx * blift)
        + alift * (bdx * cdy - cdx * bdy)
}

/// Check whether `p` lies strictly inside the circumcircle of the triangle
/// `(a, b, c)`. The triangle may have either orientation.
pub fn in_circumcircle(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>, p: Point2<f64>) -> bool {
    // The determinant sign flips with orientation; normalize to CCW.
    let det = if orient(a, b, c) >= 0.0 {
        incircle(a, b, c, p)
    } else {
        incircle(a, c, b, p)
    };
    det > INCIRCLE_EPS
}

/// Check whether `p` lies inside or on the CCW triangle `(a, b, c)`, with an
/// epsilon tolerance so that points exactly on an edge test as contained in
/// both adjacent triangles.
pub fn point_in_triangle(
    a: Point2<f64>,
    b: Point2<f64>,
    c: Point2<f64>,
    p: Point2<f64>,
    eps: f64,
) -> bool {
    orient(a, b, p) >= -eps && orient(b, c, p) >= -eps && orient(c, a, p) >= -eps
}

/// Squared distance from `p` to the segment `(a, b)`.
pub fn dist_sq_to_segment(a: Point2<f64>, b: Point2<f64>, p: Point2<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (p - a).norm_squared();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    let proj = a + ab * t;
    (p - proj).norm_squared()
}

/// Check whether `p` lies on the segment `(a, b)` within `eps`, excluding a
/// neighborhood of the endpoints (endpoint coincidence is a separate case).
pub fn on_segment(a: Point2<f64>, b: Point2<f64>, p: Point2<f64>, eps: f64) -> bool {
    if (p - a).norm_squared() <= eps * eps || (p - b).norm_squared() <= eps * eps {
        return false;
    }
    dist_sq_to_segment(a, b, p) <= eps * eps
}

/// Circumcenter of the triangle `(a, b, c)`, or `None` if the points are
/// (near-)collinear.
pub fn circumcenter(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> Option<Point2<f64>> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-12 {
        return None;
    }
    let ux = ((a.x * a.x + a.y * a.y) * (b.y - c.y)
        + (b.x * b.x + b.y * b.y) * (c.y - a.y)
        + (c.x * c.x + c.y * c.y) * (a.y - b.y))
        / d;
    let uy = ((a.x * a.x + a.y * a.y) * (c.x - b.x)
        + (b.x * b.x + b.y * b.y) * (a.x - c.x)
        + (c.x * c.x + c.y * c.y) * (b.x - a.x))
        / d;
    Some(Point2::new(ux, uy))
}

/// Midpoint of the segment `(a, b)`.
#[inline]
pub fn midpoint(a: Point2<f64>, b: Point2<f64>) -> Point2<f64> {
    Point2::from((a.coords + b.coords) * 0.5)
}

/// Check whether `q` stays on the same side of the chord `(n1, n2)` as `p`.
///
/// Used by the boundary projection: a vertex between its two boundary
/// neighbors must not cross the chord they span, or the boundary loop would
/// self-intersect.
pub fn same_side_of_chord(
    n1: Point2<f64>,
    n2: Point2<f64>,
    p: Point2<f64>,
    q: Point2<f64>,
) -> bool {
    orient(n1, n2, p) * orient(n1, n2, q) >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orient_signs() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(0.0, 1.0);
        assert!(orient(a, b, c) > 0.0);
        assert!(orient(a, c, b) < 0.0);
        assert_eq!(orient(a, b, Point2::new(2.0, 0.0)), 0.0);
    }

    #[test]
    fn test_incircle_inside_outside() {
        // Unit circle through these three points.
        let a = Point2::new(1.0, 0.0);
        let b = Point2::new(0.0, 1.0);
        let c = Point2::new(-1.0, 0.0);

        assert!(in_circumcircle(a, b, c, Point2::new(0.0, 0.0)));
        assert!(!in_circumcircle(a, b, c, Point2::new(2.0, 0.0)));
        // On the circle: legal (strict test).
        assert!(!in_circumcircle(a, b, c, Point2::new(0.0, -1.0)));
    }

    #[test]
    fn test_incircle_orientation_independent() {
        let a = Point2::new(1.0, 0.0);
        let b = Point2::new(0.0, 1.0);
        let c = Point2::new(-1.0, 0.0);
        let p = Point2::new(0.1, 0.1);
        assert!(in_circumcircle(a, b, c, p));
        assert!(in_circumcircle(a, c, b, p));
    }

    #[test]
    fn test_point_in_triangle() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(0.0, 1.0);
        assert!(point_in_triangle(a, b, c, Point2::new(0.25, 0.25), 1e-12));
        assert!(!point_in_triangle(a, b, c, Point2::new(1.0, 1.0), 1e-12));
        // On an edge counts as contained.
        assert!(point_in_triangle(a, b, c, Point2::new(0.5, 0.0), 1e-12));
    }

    #[test]
    fn test_on_segment() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        assert!(on_segment(a, b, Point2::new(0.5, 0.0), 1e-9));
        assert!(!on_segment(a, b, Point2::new(0.5, 0.1), 1e-9));
        // Endpoints are excluded.
        assert!(!on_segment(a, b, Point2::new(0.0, 0.0), 1e-9));
    }

    #[test]
    fn test_circumcenter() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 0.0);
        let c = Point2::new(1.0, 1.0);
        let cc = circumcenter(a, b, c).unwrap();
        let r0 = (cc - a).norm();
        let r1 = (cc - b).norm();
        let r2 = (cc - c).norm();
        assert!((r0 - r1).abs() < 1e-12);
        assert!((r1 - r2).abs() < 1e-12);

        // Collinear points have no circumcenter.
        assert!(circumcenter(a, b, Point2::new(3.0, 0.0)).is_none());
    }

    #[test]
    fn test_dist_to_segment() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        assert!((dist_sq_to_segment(a, b, Point2::new(0.5, 2.0)) - 4.0).abs() < 1e-12);
        // Beyond the endpoint the distance is to the endpoint.
        assert!((dist_sq_to_segment(a, b, Point2::new(2.0, 0.0)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_same_side_of_chord() {
        let n1 = Point2::new(0.0, 0.0);
        let n2 = Point2::new(1.0, 0.0);
        let p = Point2::new(0.5, 0.5);
        assert!(same_side_of_chord(n1, n2, p, Point2::new(0.5, 0.1)));
        assert!(!same_side_of_chord(n1, n2, p, Point2::new(0.5, -0.1)));
    }
}

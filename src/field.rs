//! Signed distance and edge-length fields.
//!
//! A meshing domain is described by a [`DistanceFunction`]: negative inside
//! the feasible region, zero on its boundary, positive outside. Domains are
//! composed with min/max boolean operations, e.g. a rectangle minus a disc:
//!
//! ```
//! use tessera::field::{DistanceFunction, Disc, Rect, Subtract};
//! use nalgebra::Point2;
//!
//! let domain = Subtract(
//!     Rect::new(Point2::new(0.0, 0.0), Point2::new(2.0, 1.0)),
//!     Disc::new(Point2::new(1.0, 0.5), 0.25),
//! );
//! assert!(domain.distance(Point2::new(0.1, 0.1)) < 0.0); // inside
//! assert!(domain.distance(Point2::new(1.0, 0.5)) > 0.0); // inside the hole
//! ```
//!
//! An [`EdgeLengthFunction`] gives the *relative* desired edge length at a
//! point; the generator rescales it globally each step, so only the ratio
//! between regions matters. Both fields are supplied once and are immutable
//! for the duration of a run.

use nalgebra::Point2;

/// A signed distance function over the plane.
///
/// Negative inside the feasible domain, zero on the boundary, positive
/// outside. Does not need to be an exact distance away from the boundary,
/// but the gradient near the zero level-set should have magnitude close to
/// one for the boundary projection to converge quickly.
pub trait DistanceFunction: Sync {
    /// Evaluate the field at `p`.
    fn distance(&self, p: Point2<f64>) -> f64;

    /// Check whether `p` is inside the domain (distance <= 0).
    fn contains(&self, p: Point2<f64>) -> bool {
        self.distance(p) <= 0.0
    }
}

impl<F> DistanceFunction for F
where
    F: Fn(Point2<f64>) -> f64 + Sync,
{
    fn distance(&self, p: Point2<f64>) -> f64 {
        self(p)
    }
}

/// A relative desired-edge-length field, strictly positive everywhere.
pub trait EdgeLengthFunction: Sync {
    /// Evaluate the relative desired edge length at `p`.
    fn edge_length(&self, p: Point2<f64>) -> f64;
}

impl<F> EdgeLengthFunction for F
where
    F: Fn(Point2<f64>) -> f64 + Sync,
{
    fn edge_length(&self, p: Point2<f64>) -> f64 {
        self(p)
    }
}

/// The uniform edge-length field: 1.0 everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uniform;

impl EdgeLengthFunction for Uniform {
    fn edge_length(&self, _p: Point2<f64>) -> f64 {
        1.0
    }
}

/// An edge-length field that grows with distance from the domain boundary,
/// so that triangles are finest along boundaries and obstacles.
///
/// `edge_length(p) = 1 + factor * |distance(p)|`, capped at `max`.
#[derive(Debug, Clone)]
pub struct DistanceGraded<D> {
    distance: D,
    factor: f64,
    max: f64,
}

impl<D: DistanceFunction> DistanceGraded<D> {
    /// Create a graded field over `distance` with the given growth factor
    /// and maximum relative length.
    pub fn new(distance: D, factor: f64, max: f64) -> Self {
        Self {
            distance,
            factor,
            max,
        }
    }
}

impl<D: DistanceFunction> EdgeLengthFunction for DistanceGraded<D> {
    fn edge_length(&self, p: Point2<f64>) -> f64 {
        (1.0 + self.factor * self.distance.distance(p).abs()).min(self.max)
    }
}

/// Axis-aligned rectangle domain; negative inside.
#[derive(Debug, Clone, Copy)]
pub struct Rect {
    /// Lower-left corner.
    pub min: Point2<f64>,
    /// Upper-right corner.
    pub max: Point2<f64>,
}

impl Rect {
    /// Create a rectangle from its lower-left and upper-right corners.
    pub fn new(min: Point2<f64>, max: Point2<f64>) -> Self {
        Self { min, max }
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// The four corners in CCW order starting at the lower-left.
    pub fn corners(&self) -> [Point2<f64>; 4] {
        [
            self.min,
            Point2::new(self.max.x, self.min.y),
            self.max,
            Point2::new(self.min.x, self.max.y),
        ]
    }
}

impl DistanceFunction for Rect {
    fn distance(&self, p: Point2<f64>) -> f64 {
        let qx = (self.min.x - p.x).max(p.x - self.max.x);
        let qy = (self.min.y - p.y).max(p.y - self.max.y);
        if qx <= 0.0 && qy <= 0.0 {
            qx.max(qy)
        } else {
            (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt()
        }
    }
}

/// Disc domain; negative inside.
#[derive(Debug, Clone, Copy)]
pub struct Disc {
    /// Center of the disc.
    pub center: Point2<f64>,
    /// Radius of the disc.
    pub radius: f64,
}

impl Disc {
    /// Create a disc from its center and radius.
    pub fn new(center: Point2<f64>, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl DistanceFunction for Disc {
    fn distance(&self, p: Point2<f64>) -> f64 {
        (p - self.center).norm() - self.radius
    }
}

/// Convex polygon domain given by CCW vertices; negative inside.
///
/// For non-convex outlines compose discs, rectangles, and half-planes with
/// [`Union`] and [`Subtract`] instead.
#[derive(Debug, Clone)]
pub struct ConvexPolygon {
    vertices: Vec<Point2<f64>>,
}

impl ConvexPolygon {
    /// Create a polygon from CCW-ordered vertices. Needs at least 3.
    pub fn new(vertices: Vec<Point2<f64>>) -> Self {
        debug_assert!(vertices.len() >= 3);
        Self { vertices }
    }
}

impl DistanceFunction for ConvexPolygon {
    fn distance(&self, p: Point2<f64>) -> f64 {
        // Max over the signed distances to the edge lines; exact inside a
        // convex polygon, a lower bound outside (still sign-correct).
        let mut d = f64::NEG_INFINITY;
        let n = self.vertices.len();
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let e = b - a;
            let len = e.norm();
            if len == 0.0 {
                continue;
            }
            // Outward normal of a CCW edge points right of the edge vector.
            let signed = ((p.x - a.x) * e.y - (p.y - a.y) * e.x) / len;
            d = d.max(signed);
        }
        d
    }
}

/// Union of two domains: `min(a, b)`.
#[derive(Debug, Clone, Copy)]
pub struct Union<A, B>(pub A, pub B);

impl<A: DistanceFunction, B: DistanceFunction> DistanceFunction for Union<A, B> {
    fn distance(&self, p: Point2<f64>) -> f64 {
        self.0.distance(p).min(self.1.distance(p))
    }
}

/// Difference of two domains, `a` minus `b`: `max(a, -b)`.
#[derive(Debug, Clone, Copy)]
pub struct Subtract<A, B>(pub A, pub B);

impl<A: DistanceFunction, B: DistanceFunction> DistanceFunction for Subtract<A, B> {
    fn distance(&self, p: Point2<f64>) -> f64 {
        self.0.distance(p).max(-self.1.distance(p))
    }
}

/// Intersection of two domains: `max(a, b)`.
#[derive(Debug, Clone, Copy)]
pub struct Intersect<A, B>(pub A, pub B);

impl<A: DistanceFunction, B: DistanceFunction> DistanceFunction for Intersect<A, B> {
    fn distance(&self, p: Point2<f64>) -> f64 {
        self.0.distance(p).max(self.1.distance(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_distance() {
        let r = Rect::new(Point2::new(0.0, 0.0), Point2::new(2.0, 1.0));
        assert!(r.distance(Point2::new(1.0, 0.5)) < 0.0);
        assert!((r.distance(Point2::new(1.0, 0.5)) + 0.5).abs() < 1e-12);
        assert!((r.distance(Point2::new(3.0, 0.5)) - 1.0).abs() < 1e-12);
        assert!(r.distance(Point2::new(0.0, 0.5)).abs() < 1e-12);
        // Outside a corner, the distance is diagonal.
        let d = r.distance(Point2::new(3.0, 2.0));
        assert!((d - 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_disc_distance() {
        let c = Disc::new(Point2::new(0.0, 0.0), 1.0);
        assert!((c.distance(Point2::new(0.0, 0.0)) + 1.0).abs() < 1e-12);
        assert!(c.distance(Point2::new(1.0, 0.0)).abs() < 1e-12);
        assert!((c.distance(Point2::new(2.0, 0.0)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_subtract() {
        let domain = Subtract(
            Rect::new(Point2::new(0.0, 0.0), Point2::new(2.0, 2.0)),
            Disc::new(Point2::new(1.0, 1.0), 0.5),
        );
        assert!(domain.distance(Point2::new(1.0, 1.0)) > 0.0);
        assert!(domain.distance(Point2::new(0.1, 0.1)) < 0.0);
        assert!(domain.contains(Point2::new(0.1, 0.1)));
    }

    #[test]
    fn test_union() {
        let domain = Union(
            Disc::new(Point2::new(0.0, 0.0), 1.0),
            Disc::new(Point2::new(3.0, 0.0), 1.0),
        );
        assert!(domain.distance(Point2::new(0.0, 0.0)) < 0.0);
        assert!(domain.distance(Point2::new(3.0, 0.0)) < 0.0);
        assert!(domain.distance(Point2::new(1.5, 0.0)) > 0.0);
    }

    #[test]
    fn test_convex_polygon() {
        // Unit square as a polygon.
        let poly = ConvexPolygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]);
        assert!(poly.distance(Point2::new(0.5, 0.5)) < 0.0);
        assert!(poly.distance(Point2::new(1.5, 0.5)) > 0.0);
        assert!(poly.distance(Point2::new(1.0, 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_closure_as_distance() {
        let f = |p: Point2<f64>| p.x; // half-plane x <= 0
        assert!(f.distance(Point2::new(-1.0, 0.0)) < 0.0);
        assert!(!f.contains(Point2::new(1.0, 0.0)));
    }

    #[test]
    fn test_graded_edge_length() {
        let domain = Rect::new(Point2::new(0.0, 0.0), Point2::new(10.0, 10.0));
        let field = DistanceGraded::new(domain, 0.5, 3.0);
        let near = field.edge_length(Point2::new(0.1, 5.0));
        let far = field.edge_length(Point2::new(5.0, 5.0));
        assert!(near < far);
        assert!(far <= 3.0);
    }
}

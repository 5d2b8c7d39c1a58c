//! Triangle quality measures.
//!
//! Quality is `q = 4*sqrt(3)*A / (l1^2 + l2^2 + l3^2)`: 1 for an
//! equilateral triangle, approaching 0 as the triangle degenerates.

use nalgebra::Point2;

use crate::geometry;
use crate::mesh::{FaceId, Mesh};

/// Quality of the triangle `(a, b, c)`. Degenerate or inverted triangles
/// report 0.
pub fn triangle_quality(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    let area = geometry::area(a, b, c);
    if area <= 0.0 {
        return 0.0;
    }
    let l2 = (b - a).norm_squared() + (c - b).norm_squared() + (a - c).norm_squared();
    if l2 <= 0.0 {
        return 0.0;
    }
    4.0 * 3.0_f64.sqrt() * area / l2
}

/// Quality of an interior face.
pub fn face_quality(mesh: &Mesh, f: FaceId) -> f64 {
    let [a, b, c] = mesh.face_positions(f);
    triangle_quality(a, b, c)
}

/// Mean quality over all interior faces, or 0 for an empty mesh.
pub fn mean_quality(mesh: &Mesh) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for f in mesh.interior_face_ids() {
        sum += face_quality(mesh, f);
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Minimum quality over all interior faces, or 0 for an empty mesh.
pub fn min_quality(mesh: &Mesh) -> f64 {
    mesh.interior_face_ids()
        .map(|f| face_quality(mesh, f))
        .fold(None, |acc: Option<f64>, q| {
            Some(acc.map_or(q, |a| a.min(q)))
        })
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equilateral_quality_is_one() {
        let q = triangle_quality(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 3.0_f64.sqrt() / 2.0),
        );
        assert!((q - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_quality_is_zero() {
        let q = triangle_quality(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        );
        assert_eq!(q, 0.0);
    }

    #[test]
    fn test_sliver_quality_is_low() {
        let q = triangle_quality(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 0.01),
        );
        assert!(q > 0.0 && q < 0.1);
    }

    #[test]
    fn test_mesh_aggregates() {
        let (mesh, _) =
            Mesh::bounding_square(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        let mean = mean_quality(&mesh);
        let min = min_quality(&mesh);
        // Two congruent right isoceles triangles.
        assert!((mean - min).abs() < 1e-12);
        assert!(min > 0.5 && min < 1.0);
    }

    #[test]
    fn test_empty_mesh_aggregates_are_zero() {
        let mesh = Mesh::new();
        assert_eq!(mean_quality(&mesh), 0.0);
        assert_eq!(min_quality(&mesh), 0.0);
    }
}

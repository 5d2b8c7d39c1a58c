//! Incremental Delaunay triangulation.
//!
//! Points are inserted one at a time into an initial two-triangle bounding
//! square. Each insertion locates the containing face through the history
//! DAG, splits a face or an edge, and restores the Delaunay property with
//! an explicit worklist of edge flips (Lawson legalization). [`Triangulation::finish`]
//! removes the artificial bounding structure, leaving the convex hull of
//! the inserted points.

use log::{debug, trace, warn};
use nalgebra::Point2;

use crate::error::{MeshError, Result};
use crate::geometry;
use crate::mesh::{FaceId, HalfEdgeId, Mesh, VertexId};

use super::locate::PointLocator;

/// Bounding square margin as a fraction of the input diagonal.
const BOUNDS_MARGIN: f64 = 0.1;

/// Duplicate-vertex tolerance as a fraction of the input diagonal.
const DUPLICATE_TOLERANCE: f64 = 1e-9;

/// On-edge classification tolerance for insertion.
const ON_EDGE_EPS: f64 = 1e-12;

/// An incremental Delaunay triangulation over a bounded rectangle.
#[derive(Debug, Clone)]
pub struct Triangulation {
    mesh: Mesh,
    locator: PointLocator,
    corners: [VertexId; 4],
    bounds: (Point2<f64>, Point2<f64>),
    eps: f64,
    finished: bool,
}

impl Triangulation {
    /// Create an empty triangulation able to hold points inside
    /// `[min, max]`. The initial mesh is a two-triangle square expanded by
    /// a margin, with four artificial fixed corner vertices that
    /// [`Triangulation::finish`] removes.
    pub fn new(min: Point2<f64>, max: Point2<f64>) -> Result<Self> {
        if !(min.x < max.x && min.y < max.y) {
            return Err(MeshError::invalid_param(
                "bounds",
                format!("{min} .. {max}"),
                "min must be strictly below max in both coordinates",
            ));
        }
        let diag = (max - min).norm();
        let margin = BOUNDS_MARGIN * diag;
        let offset = nalgebra::Vector2::new(margin, margin);
        let (mesh, corners) = Mesh::bounding_square(min - offset, max + offset);

        let mut tri = Self {
            mesh,
            locator: PointLocator::new(),
            corners,
            bounds: (min, max),
            eps: DUPLICATE_TOLERANCE * diag,
            finished: false,
        };
        for c in corners {
            tri.mesh.vertex_mut(c).fixed = true;
        }
        for f in tri.mesh.interior_face_ids().collect::<Vec<_>>() {
            tri.locator.record_root(&tri.mesh, f);
        }
        Ok(tri)
    }

    /// Triangulate a point set: bounding box, insertion, and finish.
    pub fn from_points(points: &[Point2<f64>]) -> Result<Self> {
        let first = points.first().ok_or(MeshError::EmptyMesh)?;
        let mut min = *first;
        let mut max = *first;
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        // Degenerate extents still need a proper rectangle.
        let pad = 0.5 * ((max - min).norm()).max(1.0);
        if max.x - min.x <= 0.0 {
            min.x -= pad;
            max.x += pad;
        }
        if max.y - min.y <= 0.0 {
            min.y -= pad;
            max.y += pad;
        }

        let mut tri = Self::new(min, max)?;
        for &p in points {
            tri.insert(p)?;
        }
        tri.finish()?;
        Ok(tri)
    }

    /// The underlying mesh.
    #[inline]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Mutable access to the underlying mesh. Any structural change or
    /// vertex movement invalidates the point locator, so it is marked stale
    /// and rebuilt lazily on the next query.
    #[inline]
    pub fn mesh_mut(&mut self) -> &mut Mesh {
        self.locator.mark_stale();
        &mut self.mesh
    }

    /// Consume the triangulation, returning the mesh.
    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }

    /// Iterate over the corner positions of all interior triangles.
    pub fn triangles(&self) -> impl Iterator<Item = [Point2<f64>; 3]> + '_ {
        self.mesh
            .interior_face_ids()
            .map(move |f| self.mesh.face_positions(f))
    }

    /// Find the interior face containing `p`, if any.
    pub fn locate(&mut self, p: Point2<f64>) -> Option<FaceId> {
        if self.locator.is_stale() {
            self.locator.rebuild(&self.mesh);
        }
        self.locator.locate(&self.mesh, p)
    }

    /// Insert a point, returning its vertex.
    ///
    /// A point within tolerance of an existing vertex is not inserted; the
    /// existing vertex is returned. A point on an existing edge splits that
    /// edge. Points outside the triangulated region are an error.
    pub fn insert(&mut self, p: Point2<f64>) -> Result<VertexId> {
        if self.locator.is_stale() {
            self.locator.rebuild(&self.mesh);
        }
        let face = self.locator.locate(&self.mesh, p).ok_or_else(|| {
            MeshError::invalid_param("point", p, "outside the triangulation bounds")
        })?;

        // Duplicate?
        for v in self.mesh.face_triangle(face) {
            if (self.mesh.position(v) - p).norm_squared() < self.eps * self.eps {
                debug!("skipping duplicate point {p} at existing vertex {v:?}");
                return Ok(v);
            }
        }

        // On an edge of the located face?
        let on_edge = self
            .mesh
            .face_halfedges(face)
            .find(|&he| {
                geometry::on_segment(
                    self.mesh.position(self.mesh.origin(he)),
                    self.mesh.position(self.mesh.dest(he)),
                    p,
                    ON_EDGE_EPS,
                )
            });

        let (v, new_faces) = match on_edge {
            Some(he) => {
                let mut old = vec![self.mesh.face_of(he)];
                let rf = self.mesh.face_of(self.mesh.twin(he));
                if self.mesh.is_interior(rf) {
                    old.push(rf);
                }
                let split = self.mesh.split_edge(he, p);
                self.locator.record_replace(&self.mesh, &old, &split.faces);
                (split.vertex, split.faces)
            }
            None => {
                let (v, faces) = self.mesh.split_face(face, p);
                self.locator.record_replace(&self.mesh, &[face], &faces);
                (v, faces.to_vec())
            }
        };

        // Legalize the edges facing the new vertex.
        let worklist: Vec<HalfEdgeId> = new_faces
            .iter()
            .flat_map(|&f| self.mesh.face_halfedges(f))
            .filter(|&he| self.mesh.origin(he) != v && self.mesh.dest(he) != v)
            .collect();
        self.legalize_edges(worklist);

        Ok(v)
    }

    /// Restore the Delaunay property across the whole mesh.
    pub fn legalize_all(&mut self) {
        let worklist: Vec<HalfEdgeId> = self
            .mesh
            .edge_ids()
            .filter(|&he| self.mesh.is_interior_edge(he))
            .collect();
        self.legalize_edges(worklist);
    }

    /// Lawson flip loop over an explicit worklist.
    fn legalize_edges(&mut self, mut stack: Vec<HalfEdgeId>) {
        // Strict in-circle plus this cap rule out flip cycles on ties.
        let max_flips = 8 * self.mesh.num_halfedges().max(64);
        let mut flips = 0usize;

        while let Some(he) = stack.pop() {
            if !self.mesh.is_halfedge_alive(he) || !self.mesh.is_interior_edge(he) {
                continue;
            }
            let t = self.mesh.twin(he);
            let a = self.mesh.position(self.mesh.origin(he));
            let b = self.mesh.position(self.mesh.dest(he));
            let c = self.mesh.position(self.mesh.origin(self.mesh.prev(he)));
            let d = self.mesh.position(self.mesh.origin(self.mesh.prev(t)));

            if !geometry::in_circumcircle(a, b, c, d) {
                continue;
            }
            if !self.mesh.is_flip_ok(he) {
                trace!("illegal edge {he:?} cannot be flipped, skipping");
                continue;
            }

            let f1 = self.mesh.face_of(he);
            let f2 = self.mesh.face_of(t);
            let outer = [
                self.mesh.next(he),
                self.mesh.prev(he),
                self.mesh.next(t),
                self.mesh.prev(t),
            ];
            self.mesh.flip(he);
            self.locator.record_replace(&self.mesh, &[f1, f2], &[f1, f2]);
            stack.extend(outer);

            flips += 1;
            if flips >= max_flips {
                warn!("legalization stopped after {flips} flips");
                break;
            }
        }
    }

    /// Remove the artificial bounding structure: every face incident to a
    /// corner vertex is absorbed into the border, leaving the convex hull
    /// of the inserted points.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        let corners = self.corners;
        let touches_corner = move |m: &Mesh, f: FaceId| {
            m.face_triangle(f).iter().any(|v| corners.contains(v))
        };
        self.mesh.shrink_border(touches_corner)?;
        debug_assert!(corners.iter().all(|&c| !self.mesh.is_vertex_alive(c)));
        self.finished = true;
        Ok(())
    }

    /// Whether [`Triangulation::finish`] has run.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Rebuild the triangulation from the current vertex positions. Used as
    /// a recovery path when external vertex movement has broken the
    /// Delaunay property beyond what flips can repair.
    ///
    /// All vertex IDs change; `fixed` flags are preserved.
    pub fn recompute(&mut self) -> Result<()> {
        let old_corners = self.corners;
        let points: Vec<(Point2<f64>, bool)> = self
            .mesh
            .vertex_ids()
            .filter(|v| self.finished || !old_corners.contains(v))
            .map(|v| {
                let vert = self.mesh.vertex(v);
                (vert.position, vert.fixed)
            })
            .collect();
        debug!("recomputing triangulation over {} vertices", points.len());

        let (min, max) = self.bounds;
        let mut fresh = Self::new(min, max)?;
        for &(p, fixed) in &points {
            let v = fresh.insert(p)?;
            if fixed {
                fresh.mesh.vertex_mut(v).fixed = true;
            }
        }
        *self = fresh;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Every interior edge must be locally Delaunay: the apex of the
    /// opposite triangle lies on or outside the circumcircle.
    fn is_delaunay(mesh: &Mesh) -> bool {
        mesh.edge_ids()
            .filter(|&he| mesh.is_interior_edge(he))
            .all(|he| {
                let t = mesh.twin(he);
                let a = mesh.position(mesh.origin(he));
                let b = mesh.position(mesh.dest(he));
                let c = mesh.position(mesh.origin(mesh.prev(he)));
                let d = mesh.position(mesh.origin(mesh.prev(t)));
                !geometry::in_circumcircle(a, b, c, d)
            })
    }

    fn unit_square() -> Triangulation {
        Triangulation::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_bounds() {
        let r = Triangulation::new(Point2::new(1.0, 0.0), Point2::new(0.0, 1.0));
        assert!(matches!(r, Err(MeshError::InvalidParameter { .. })));
    }

    #[test]
    fn test_insert_single_point() {
        let mut tri = unit_square();
        let v = tri.insert(Point2::new(0.5, 0.5)).unwrap();
        assert_eq!(tri.mesh().position(v), Point2::new(0.5, 0.5));
        assert!(tri.mesh().is_valid());
        assert!(is_delaunay(tri.mesh()));
    }

    #[test]
    fn test_insert_duplicate_returns_existing() {
        let mut tri = unit_square();
        let v1 = tri.insert(Point2::new(0.3, 0.4)).unwrap();
        let before = tri.mesh().num_vertices();
        let v2 = tri.insert(Point2::new(0.3, 0.4)).unwrap();
        assert_eq!(v1, v2);
        assert_eq!(tri.mesh().num_vertices(), before);
    }

    #[test]
    fn test_insert_outside_bounds_fails() {
        let mut tri = unit_square();
        let r = tri.insert(Point2::new(10.0, 10.0));
        assert!(matches!(r, Err(MeshError::InvalidParameter { .. })));
    }

    #[test]
    fn test_locate_after_insert() {
        let mut tri = unit_square();
        let mut rng = StdRng::seed_from_u64(7);
        let points: Vec<Point2<f64>> = (0..50)
            .map(|_| Point2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
            .collect();
        for &p in &points {
            tri.insert(p).unwrap();
        }
        for &p in &points {
            let f = tri.locate(p).expect("inserted point must be locatable");
            let [a, b, c] = tri.mesh().face_positions(f);
            assert!(geometry::point_in_triangle(a, b, c, p, 1e-9));
        }
    }

    #[test]
    fn test_random_insertion_is_delaunay_and_valid() {
        let mut tri = unit_square();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let p = Point2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
            tri.insert(p).unwrap();
        }
        assert!(tri.mesh().is_valid());
        assert!(is_delaunay(tri.mesh()));
        for f in tri.mesh().interior_face_ids() {
            assert!(tri.mesh().face_area(f) > 0.0);
        }
    }

    #[test]
    fn test_collinear_points_produce_no_degenerate_faces() {
        let mut tri = unit_square();
        // All on the horizontal midline, inserted left to right so later
        // points land exactly on existing edges.
        for i in 0..=10 {
            let x = i as f64 / 10.0;
            tri.insert(Point2::new(x, 0.5)).unwrap();
        }
        assert!(tri.mesh().is_valid());
        for f in tri.mesh().interior_face_ids() {
            assert!(tri.mesh().face_area(f) > 0.0);
        }
    }

    #[test]
    fn test_finish_removes_corners() {
        let mut tri = unit_square();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..30 {
            let p = Point2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
            tri.insert(p).unwrap();
        }
        tri.finish().unwrap();

        let mesh = tri.mesh();
        assert!(mesh.is_valid());
        assert!(is_delaunay(mesh));
        // All remaining vertices lie inside the original bounds.
        for v in mesh.vertex_ids() {
            let p = mesh.position(v);
            assert!((0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y));
        }
        // Euler characteristic of a disk-like mesh with the border face.
        let euler =
            mesh.num_vertices() as i64 - mesh.num_edges() as i64 + mesh.num_faces() as i64;
        assert_eq!(euler, 2);
    }

    #[test]
    fn test_from_points_grid() {
        let mut points = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                points.push(Point2::new(i as f64, j as f64));
            }
        }
        let tri = Triangulation::from_points(&points).unwrap();
        assert_eq!(tri.mesh().num_vertices(), 25);
        assert!(tri.is_finished());
        assert!(is_delaunay(tri.mesh()));
    }

    #[test]
    fn test_recompute_preserves_positions_and_fixed() {
        let mut tri = unit_square();
        let v = tri.insert(Point2::new(0.25, 0.25)).unwrap();
        tri.mesh_mut().vertex_mut(v).fixed = true;
        tri.insert(Point2::new(0.75, 0.75)).unwrap();

        tri.recompute().unwrap();
        assert!(tri.mesh().is_valid());
        assert!(is_delaunay(tri.mesh()));
        let fixed: Vec<Point2<f64>> = tri
            .mesh()
            .vertex_ids()
            .filter(|&v| tri.mesh().vertex(v).fixed && !tri.mesh().is_boundary_vertex(v))
            .map(|v| tri.mesh().position(v))
            .collect();
        assert_eq!(fixed, vec![Point2::new(0.25, 0.25)]);
    }
}

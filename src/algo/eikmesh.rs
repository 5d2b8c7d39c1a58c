//! EikMesh force-relaxation mesh generation.
//!
//! Starting from a uniform triangulation of the bounding rectangle (or a
//! supplied coarse base mesh), the generator iteratively moves vertices
//! under spring-like edge forces toward a target edge-length field, keeps
//! the triangulation Delaunay by flipping, projects boundary vertices back
//! onto the zero level-set of the signed distance function, and repairs the
//! boundary by collapsing conflicted vertices and splitting overlong edges.
//!
//! ```no_run
//! use tessera::algo::{EikMesh, EikMeshOptions};
//! use tessera::field::{Disc, Rect, Subtract, Uniform};
//! use nalgebra::Point2;
//!
//! let bounds = Rect::new(Point2::new(0.0, 0.0), Point2::new(2.0, 1.0));
//! let domain = Subtract(bounds, Disc::new(Point2::new(1.0, 0.5), 0.25));
//! let options = EikMeshOptions::new(0.05);
//! let mesh = EikMesh::new(domain, Uniform, bounds, &[], options)
//!     .unwrap()
//!     .generate()
//!     .unwrap();
//! ```

use std::collections::HashMap;

use log::{debug, trace, warn};
use nalgebra::{Point2, Vector2};
use rayon::prelude::*;

use crate::error::{MeshError, Result};
use crate::field::{DistanceFunction, EdgeLengthFunction, Rect};
use crate::geometry;
use crate::mesh::{FaceId, HalfEdgeId, Mesh, VertexId};
use crate::triangulation::Triangulation;

use super::quality;

/// Relative finite-difference step for the distance gradient.
const GRADIENT_STEP: f64 = 1e-4;

/// Upper bound on longest-edge bisection passes when refining a base mesh.
const MAX_REFINE_PASSES: usize = 24;

/// Options for the EikMesh generator.
#[derive(Debug, Clone)]
pub struct EikMeshOptions {
    /// Absolute base edge length; the edge-length field scales relative to
    /// this.
    pub initial_edge_len: f64,
    /// Explicit Euler step size for the force integration.
    pub delta_t: f64,
    /// Step cap for the relaxation loop.
    pub max_steps: usize,
    /// Mean triangle quality at which relaxation stops early.
    pub quality_threshold: f64,
    /// Border triangles below this quality are flood-removed or have their
    /// longest boundary edge split.
    pub min_border_quality: f64,
    /// A degree-3 boundary vertex collapses when its net force is below
    /// this fraction of its accumulated absolute force.
    pub collapse_force_ratio: f64,
    /// Whether to parallelize the force and edge-length passes.
    pub parallel: bool,
}

impl EikMeshOptions {
    /// Create options with the given base edge length and defaults for
    /// everything else.
    pub fn new(initial_edge_len: f64) -> Self {
        Self {
            initial_edge_len,
            delta_t: 0.2,
            max_steps: 200,
            quality_threshold: 0.95,
            min_border_quality: 0.2,
            collapse_force_ratio: 0.3,
            parallel: true,
        }
    }

    /// Set the Euler step size.
    pub fn with_delta_t(mut self, delta_t: f64) -> Self {
        self.delta_t = delta_t;
        self
    }

    /// Set the step cap.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the stopping mean quality.
    pub fn with_quality_threshold(mut self, quality_threshold: f64) -> Self {
        self.quality_threshold = quality_threshold;
        self
    }

    /// Set the minimum acceptable border triangle quality.
    pub fn with_min_border_quality(mut self, min_border_quality: f64) -> Self {
        self.min_border_quality = min_border_quality;
        self
    }

    /// Set the collapse trigger ratio.
    pub fn with_collapse_force_ratio(mut self, collapse_force_ratio: f64) -> Self {
        self.collapse_force_ratio = collapse_force_ratio;
        self
    }

    /// Disable parallel passes.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.initial_edge_len > 0.0) {
            return Err(MeshError::invalid_param(
                "initial_edge_len",
                self.initial_edge_len,
                "must be positive",
            ));
        }
        if !(self.delta_t > 0.0 && self.delta_t <= 1.0) {
            return Err(MeshError::invalid_param(
                "delta_t",
                self.delta_t,
                "must be in (0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return Err(MeshError::invalid_param(
                "quality_threshold",
                self.quality_threshold,
                "must be in [0, 1]",
            ));
        }
        if !(0.0..1.0).contains(&self.min_border_quality) {
            return Err(MeshError::invalid_param(
                "min_border_quality",
                self.min_border_quality,
                "must be in [0, 1)",
            ));
        }
        Ok(())
    }
}

/// The EikMesh generator: owns a triangulation and relaxes it against a
/// signed distance function and an edge-length field.
pub struct EikMesh<D, E> {
    distance: D,
    edge_length: E,
    options: EikMeshOptions,
    tri: Triangulation,
    anchors: Vec<Point2<f64>>,
    anchor_of: HashMap<VertexId, Point2<f64>>,
    fixed_base: bool,
    deps: f64,
    steps: usize,
}

impl<D, E> EikMesh<D, E>
where
    D: DistanceFunction,
    E: EdgeLengthFunction,
{
    /// Build a generator from scratch: a hexagonal point lattice over
    /// `bounds` is triangulated, the border is shrunk to the domain, and
    /// obstacle interiors are carved into holes.
    ///
    /// `anchors` are points (typically sharp obstacle corners) that attract
    /// their vertex directly; each is inserted as a vertex of the initial
    /// triangulation.
    pub fn new(
        distance: D,
        edge_length: E,
        bounds: Rect,
        anchors: &[Point2<f64>],
        options: EikMeshOptions,
    ) -> Result<Self> {
        options.validate()?;
        let h0 = options.initial_edge_len;

        let points = hex_lattice(&bounds, h0, &distance);
        if points.is_empty() && anchors.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        debug!(
            "seeding {} lattice points and {} anchors at h0={h0}",
            points.len(),
            anchors.len()
        );

        let mut tri = Triangulation::new(bounds.min, bounds.max)?;
        for &p in &points {
            tri.insert(p)?;
        }
        let mut anchor_of = HashMap::with_capacity(anchors.len());
        for &a in anchors {
            let v = tri.insert(a)?;
            anchor_of.insert(v, a);
        }
        tri.finish()?;

        let mut gen = Self {
            distance,
            edge_length,
            deps: GRADIENT_STEP * h0,
            options,
            tri,
            anchors: anchors.to_vec(),
            anchor_of,
            fixed_base: false,
            steps: 0,
        };
        gen.carve()?;
        Ok(gen)
    }

    /// Build a generator over an existing coarse triangulation instead of a
    /// fresh lattice. The base mesh is refined by longest-edge bisection
    /// until every edge satisfies the edge-length field, and all border
    /// vertices are fixed in place.
    pub fn from_base(
        distance: D,
        edge_length: E,
        base: Triangulation,
        options: EikMeshOptions,
    ) -> Result<Self> {
        options.validate()?;
        if base.mesh().num_interior_faces() == 0 {
            return Err(MeshError::EmptyMesh);
        }

        let mut gen = Self {
            deps: GRADIENT_STEP * options.initial_edge_len,
            distance,
            edge_length,
            options,
            tri: base,
            anchors: Vec::new(),
            anchor_of: HashMap::new(),
            fixed_base: true,
            steps: 0,
        };
        for v in gen.tri.mesh().boundary_vertices() {
            gen.tri.mesh_mut().vertex_mut(v).fixed = true;
        }
        gen.refine_base();
        Ok(gen)
    }

    /// The current mesh.
    #[inline]
    pub fn mesh(&self) -> &Mesh {
        self.tri.mesh()
    }

    /// The owned triangulation.
    #[inline]
    pub fn triangulation(&self) -> &Triangulation {
        &self.tri
    }

    /// Mean triangle quality of the current mesh.
    pub fn quality(&self) -> f64 {
        quality::mean_quality(self.tri.mesh())
    }

    /// Number of relaxation steps taken so far.
    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Run relaxation until the quality threshold or the step cap is
    /// reached, then finalize: faces outside the domain are flood-removed
    /// and storage is compacted.
    pub fn generate(mut self) -> Result<Mesh> {
        while self.steps < self.options.max_steps
            && self.quality() < self.options.quality_threshold
        {
            self.improve()?;
        }
        debug!(
            "relaxation done after {} steps, mean quality {:.4}",
            self.steps,
            self.quality()
        );
        self.finalize()
    }

    /// Run a single relaxation step.
    ///
    /// A step that would require an ambiguous topology change is abandoned
    /// with a warning; the mesh is untouched by the failed part and the
    /// next step recovers.
    pub fn improve(&mut self) -> Result<()> {
        self.steps += 1;

        if !self.fixed_base {
            match self.remove_bad_border_faces() {
                Ok(()) => {}
                Err(MeshError::IllegalMesh { details }) => {
                    warn!("abandoning step {}: {details}", self.steps);
                    self.reset_accumulators();
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
            self.project(false);
        }

        if self.tri.mesh().is_healthy() {
            self.tri.legalize_all();
        } else {
            self.recover()?;
        }

        let scaling = self.scaling_factor();
        self.apply_forces(scaling);
        self.integrate();
        self.project(true);
        self.repair();
        self.reset_accumulators();
        Ok(())
    }

    // ==================== Loop Pieces ====================

    /// Flood-remove degenerate or low-quality faces reachable from the
    /// border.
    fn remove_bad_border_faces(&mut self) -> Result<()> {
        let min_quality = self.options.min_border_quality;
        self.tri.mesh_mut().shrink_border(move |m, f| {
            m.face_area(f) <= 0.0 || quality::face_quality(m, f) < min_quality
        })?;
        self.prune_anchors();
        Ok(())
    }

    /// Drop anchor entries whose vertex died in a merge. Must run before
    /// anything allocates, or a recycled ID would inherit the anchor pull.
    fn prune_anchors(&mut self) {
        let mesh = self.tri.mesh();
        self.anchor_of.retain(|&v, _| mesh.is_vertex_alive(v));
    }

    /// Full recompute of the triangulation from current vertex positions,
    /// followed by re-carving. Recovery path when vertex movement has left
    /// the mesh with inverted faces.
    fn recover(&mut self) -> Result<()> {
        warn!(
            "mesh unhealthy at step {}; recomputing triangulation",
            self.steps
        );
        self.tri.recompute()?;
        self.tri.finish()?;
        self.carve()?;
        self.remap_anchors();
        Ok(())
    }

    /// Remove everything outside the domain: shrink the border over
    /// outside faces, then carve interior outside islands into holes.
    fn carve(&mut self) -> Result<()> {
        self.tri
            .mesh_mut()
            .shrink_border(|m, f| self.distance.distance(m.face_centroid(f)) > 0.0)?;

        // Grow existing holes first, so an outside region bordering a hole
        // is absorbed into it instead of colliding with a fresh seed.
        let holes: Vec<FaceId> = {
            let mesh = self.tri.mesh();
            mesh.face_ids().filter(|&f| mesh.is_hole(f)).collect()
        };
        for h in holes {
            self.tri
                .mesh_mut()
                .merge_region(h, |m, f| self.distance.distance(m.face_centroid(f)) > 0.0)?;
        }

        loop {
            let mesh = self.tri.mesh();
            let seed = mesh.interior_face_ids().find(|&f| {
                self.distance.distance(mesh.face_centroid(f)) > 0.0
                    && mesh
                        .face_halfedges(f)
                        .all(|he| mesh.is_interior(mesh.face_of(mesh.twin(he))))
            });
            let Some(seed) = seed else { break };
            self.tri
                .mesh_mut()
                .create_hole(seed, |m, f| self.distance.distance(m.face_centroid(f)) > 0.0)?;
        }
        self.prune_anchors();
        Ok(())
    }

    /// Global factor converting the relative edge-length field into
    /// absolute targets: `sqrt(sum(len^2) / sum(desired^2))` over all
    /// edges, which conserves total mesh extent as vertices move.
    fn scaling_factor(&self) -> f64 {
        let mesh = self.tri.mesh();
        let edges: Vec<HalfEdgeId> = mesh.edge_ids().collect();
        let term = |&he: &HalfEdgeId| {
            let len = mesh.edge_length(he);
            let desired = self.edge_length.edge_length(mesh.edge_midpoint(he));
            (len * len, desired * desired)
        };
        let (sum_len, sum_desired) = if self.options.parallel {
            edges
                .par_iter()
                .map(term)
                .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1))
        } else {
            edges
                .iter()
                .map(term)
                .fold((0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1))
        };
        if sum_desired > 0.0 {
            (sum_len / sum_desired).sqrt()
        } else {
            1.0
        }
    }

    /// Accumulate per-vertex forces. Edges shorter than their target push
    /// their endpoints apart; overlong edges exert nothing. Anchored
    /// vertices are instead pulled straight toward their anchor.
    fn apply_forces(&mut self, scaling: f64) {
        let mesh = self.tri.mesh();
        let verts: Vec<VertexId> = mesh.vertex_ids().collect();

        let compute = |&v: &VertexId| -> (Vector2<f64>, f64) {
            let vert = mesh.vertex(v);
            if vert.fixed {
                return (Vector2::zeros(), 0.0);
            }
            if let Some(&anchor) = self.anchor_of.get(&v) {
                let pull = anchor - vert.position;
                return (pull, pull.norm());
            }
            let p = vert.position;
            let mut force = Vector2::zeros();
            let mut abs = 0.0;
            for he in mesh.vertex_halfedges(v) {
                let q = mesh.position(mesh.dest(he));
                let d = p - q;
                let len = d.norm();
                if len <= 0.0 {
                    continue;
                }
                let desired =
                    scaling * self.edge_length.edge_length(geometry::midpoint(p, q));
                let f = (desired - len).max(0.0);
                force += d * (f / len);
                abs += f;
            }
            (force, abs)
        };

        let results: Vec<(Vector2<f64>, f64)> = if self.options.parallel {
            verts.par_iter().map(compute).collect()
        } else {
            verts.iter().map(compute).collect()
        };

        let mesh = self.tri.mesh_mut();
        for (v, (force, abs)) in verts.into_iter().zip(results) {
            let vert = mesh.vertex_mut(v);
            vert.velocity += force;
            vert.abs_force += abs;
        }
    }

    /// Explicit Euler position update for all movable vertices.
    fn integrate(&mut self) {
        let dt = self.options.delta_t;
        let mesh = self.tri.mesh_mut();
        let verts: Vec<VertexId> = mesh.vertex_ids().collect();
        for v in verts {
            let vert = mesh.vertex_mut(v);
            if !vert.fixed {
                vert.position += vert.velocity * dt;
            }
        }
    }

    /// Project vertices back onto (or into) the domain along the distance
    /// gradient. Boundary vertices are always projected; interior vertices
    /// only when `include_interior` and they drifted outside.
    ///
    /// An inward-to-boundary projection is skipped when it would cross the
    /// chord of the vertex's two boundary neighbors, which would let the
    /// boundary loop fold over itself.
    fn project(&mut self, include_interior: bool) {
        let verts: Vec<VertexId> = self.tri.mesh().vertex_ids().collect();
        for v in verts {
            let mesh = self.tri.mesh();
            let vert = mesh.vertex(v);
            if vert.fixed {
                continue;
            }
            let p = vert.position;
            let d = self.distance.distance(p);
            let boundary = mesh.is_boundary_vertex(v);
            if !boundary && !(include_interior && d > 0.0) {
                continue;
            }
            let Some(grad) = self.gradient(p) else {
                trace!("vanishing distance gradient at {p}, skipping projection");
                continue;
            };
            let q = p - grad * d;

            if boundary && d < 0.0 {
                if let Some((n1, n2)) = mesh.boundary_neighbors(v) {
                    let (pn1, pn2) = (mesh.position(n1), mesh.position(n2));
                    if !geometry::same_side_of_chord(pn1, pn2, p, q) {
                        continue;
                    }
                }
            }
            self.tri.mesh_mut().set_position(v, q);
        }
    }

    /// Normalized central-difference gradient of the distance function.
    fn gradient(&self, p: Point2<f64>) -> Option<Vector2<f64>> {
        let h = self.deps;
        let dx = self.distance.distance(Point2::new(p.x + h, p.y))
            - self.distance.distance(Point2::new(p.x - h, p.y));
        let dy = self.distance.distance(Point2::new(p.x, p.y + h))
            - self.distance.distance(Point2::new(p.x, p.y - h));
        let g = Vector2::new(dx, dy) / (2.0 * h);
        let norm = g.norm();
        if norm < 1e-12 {
            None
        } else {
            Some(g / norm)
        }
    }

    /// Boundary repair: collapse degree-3 boundary vertices stuck under
    /// conflicting forces, and split the longest boundary edge of
    /// low-quality border triangles.
    fn repair(&mut self) {
        let ratio = self.options.collapse_force_ratio;
        let candidates: Vec<VertexId> = {
            let mesh = self.tri.mesh();
            mesh.vertex_ids()
                .filter(|&v| {
                    let vert = mesh.vertex(v);
                    !vert.fixed
                        && !self.anchor_of.contains_key(&v)
                        && vert.abs_force > 0.0
                        && vert.velocity.norm() <= ratio * vert.abs_force
                        && mesh.valence(v) == 3
                        && mesh.is_boundary_vertex(v)
                })
                .collect()
        };
        for v in candidates {
            if let Err(e) = self.tri.mesh_mut().collapse_boundary_vertex(v) {
                trace!("skipping boundary collapse: {e}");
            }
        }

        let splits: Vec<HalfEdgeId> = {
            let mesh = self.tri.mesh();
            let mut result = Vec::new();
            for f in mesh.interior_face_ids() {
                if quality::face_quality(mesh, f) >= self.options.min_border_quality {
                    continue;
                }
                let mut longest = HalfEdgeId::invalid();
                let mut best = 0.0;
                for he in mesh.face_halfedges(f) {
                    let len = mesh.edge_length(he);
                    if len > best {
                        best = len;
                        longest = he;
                    }
                }
                if !longest.is_valid() || !mesh.is_boundary_edge(longest) {
                    continue;
                }
                let target = self.options.initial_edge_len
                    * self.edge_length.edge_length(mesh.edge_midpoint(longest));
                if best > target {
                    result.push(longest);
                }
            }
            result
        };
        for he in splits {
            let mid = self.tri.mesh().edge_midpoint(he);
            self.tri.mesh_mut().split_edge(he, mid);
        }
    }

    fn reset_accumulators(&mut self) {
        let mesh = self.tri.mesh_mut();
        let verts: Vec<VertexId> = mesh.vertex_ids().collect();
        for v in verts {
            let vert = mesh.vertex_mut(v);
            vert.velocity = Vector2::zeros();
            vert.abs_force = 0.0;
        }
    }

    /// Re-associate anchor points with their nearest vertices after a full
    /// recompute invalidated all vertex IDs.
    fn remap_anchors(&mut self) {
        let mesh = self.tri.mesh();
        let h0 = self.options.initial_edge_len;
        let mut pairs = Vec::with_capacity(self.anchors.len());
        for &a in &self.anchors {
            let mut best = VertexId::invalid();
            let mut best_dist = f64::INFINITY;
            for v in mesh.vertex_ids() {
                let dist = (mesh.position(v) - a).norm();
                if dist < best_dist {
                    best_dist = dist;
                    best = v;
                }
            }
            if best.is_valid() && best_dist < h0 {
                pairs.push((best, a));
            } else {
                warn!("anchor {a} lost after recompute");
            }
        }
        self.anchor_of = pairs.into_iter().collect();
    }

    /// Longest-edge bisection of a supplied base mesh until every edge
    /// meets the edge-length field.
    fn refine_base(&mut self) {
        let h0 = self.options.initial_edge_len;
        for _ in 0..MAX_REFINE_PASSES {
            let to_split: Vec<HalfEdgeId> = {
                let mesh = self.tri.mesh();
                mesh.edge_ids()
                    .filter(|&he| {
                        let len = mesh.edge_length(he);
                        let target =
                            h0 * self.edge_length.edge_length(mesh.edge_midpoint(he));
                        if len <= target {
                            return false;
                        }
                        // Only the longest edge of an incident face splits.
                        let is_longest = |f: FaceId| {
                            mesh.face_halfedges(f)
                                .all(|o| mesh.edge_length(o) <= len + 1e-12)
                        };
                        let f1 = mesh.face_of(he);
                        let f2 = mesh.face_of(mesh.twin(he));
                        (mesh.is_interior(f1) && is_longest(f1))
                            || (mesh.is_interior(f2) && is_longest(f2))
                    })
                    .collect()
            };
            if to_split.is_empty() {
                break;
            }
            debug!("refining base mesh: splitting {} edges", to_split.len());
            for he in to_split {
                let boundary = self.tri.mesh().is_boundary_edge(he);
                let mid = self.tri.mesh().edge_midpoint(he);
                let split = self.tri.mesh_mut().split_edge(he, mid);
                if boundary {
                    self.tri.mesh_mut().vertex_mut(split.vertex).fixed = true;
                }
            }
            self.tri.legalize_all();
        }
    }

    /// Finalize: drop faces outside the domain, settle the boundary onto
    /// the zero level-set, and garbage-collect.
    fn finalize(mut self) -> Result<Mesh> {
        self.tri.legalize_all();
        // Carving classifies faces by centroid; the boundary must be settled
        // on the level-set before that decision.
        for _ in 0..3 {
            self.project(false);
        }
        if !self.fixed_base {
            match self.remove_bad_border_faces() {
                Ok(()) => {}
                Err(MeshError::IllegalMesh { details }) => {
                    warn!("final border cleanup blocked: {details}; recomputing");
                    self.recover()?;
                }
                Err(e) => return Err(e),
            }
        }
        match self.carve() {
            Ok(()) => {}
            Err(MeshError::IllegalMesh { details }) => {
                warn!("final carve blocked: {details}; recomputing");
                self.recover()?;
            }
            Err(e) => return Err(e),
        }
        // Second round: settle the cycles the carve newly exposed.
        for _ in 0..3 {
            self.project(false);
        }
        let mut mesh = self.tri.into_mesh();
        mesh.compact();
        debug!(
            "generated mesh: {} vertices, {} triangles",
            mesh.num_vertices(),
            mesh.num_interior_faces()
        );
        Ok(mesh)
    }
}

/// Hexagonal point lattice over `bounds`, filtered to the domain interior.
/// Rows are spaced `h0 * sqrt(3)/2` apart with odd rows offset by `h0/2`,
/// so the initial triangulation is already near-equilateral.
fn hex_lattice<D: DistanceFunction>(bounds: &Rect, h0: f64, distance: &D) -> Vec<Point2<f64>> {
    let row_height = h0 * 3.0_f64.sqrt() / 2.0;
    let mut points = Vec::new();
    let mut y = bounds.min.y;
    let mut row = 0usize;
    while y <= bounds.max.y + 1e-12 {
        let offset = if row % 2 == 1 { h0 / 2.0 } else { 0.0 };
        let mut x = bounds.min.x + offset;
        while x <= bounds.max.x + 1e-12 {
            let p = Point2::new(x, y);
            if distance.contains(p) {
                points.push(p);
            }
            x += h0;
        }
        y += row_height;
        row += 1;
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Disc, Subtract, Uniform};
    use crate::mesh::FaceKind;

    fn unit_bounds() -> Rect {
        Rect::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0))
    }

    fn aspect_ratio(mesh: &Mesh, f: FaceId) -> f64 {
        let [a, b, c] = mesh.face_positions(f);
        let lens = [(b - a).norm(), (c - b).norm(), (a - c).norm()];
        let min = lens.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = lens.iter().cloned().fold(0.0, f64::max);
        min / max
    }

    #[test]
    fn test_options_builder() {
        let o = EikMeshOptions::new(0.1)
            .with_delta_t(0.1)
            .with_max_steps(50)
            .with_quality_threshold(0.9)
            .with_min_border_quality(0.15)
            .with_collapse_force_ratio(0.25)
            .sequential();
        assert_eq!(o.initial_edge_len, 0.1);
        assert_eq!(o.delta_t, 0.1);
        assert_eq!(o.max_steps, 50);
        assert_eq!(o.min_border_quality, 0.15);
        assert_eq!(o.collapse_force_ratio, 0.25);
        assert!(!o.parallel);
    }

    #[test]
    fn test_options_validation() {
        let bounds = unit_bounds();
        let r = EikMesh::new(bounds, Uniform, bounds, &[], EikMeshOptions::new(-1.0));
        assert!(matches!(r, Err(MeshError::InvalidParameter { .. })));
        let r = EikMesh::new(
            bounds,
            Uniform,
            bounds,
            &[],
            EikMeshOptions::new(0.1).with_delta_t(0.0),
        );
        assert!(matches!(r, Err(MeshError::InvalidParameter { .. })));
    }

    #[test]
    fn test_initial_mesh_covers_domain() {
        let bounds = unit_bounds();
        let gen = EikMesh::new(
            bounds,
            Uniform,
            bounds,
            &[],
            EikMeshOptions::new(0.1).sequential(),
        )
        .unwrap();
        let mesh = gen.mesh();
        assert!(mesh.is_valid());
        assert!(mesh.num_interior_faces() > 100);
        for f in mesh.interior_face_ids() {
            assert!(mesh.face_area(f) > 0.0);
        }
    }

    #[test]
    fn test_single_step_keeps_mesh_valid() {
        let bounds = unit_bounds();
        let mut gen = EikMesh::new(
            bounds,
            Uniform,
            bounds,
            &[],
            EikMeshOptions::new(0.1).sequential(),
        )
        .unwrap();
        gen.improve().unwrap();
        assert_eq!(gen.steps(), 1);
        assert!(gen.mesh().is_valid());
    }

    // Scenario: unit square, uniform edge length. The result should be a
    // near-uniform high-quality mesh whose triangle count matches the
    // equilateral packing estimate.
    #[test]
    fn test_generate_unit_square() {
        let bounds = unit_bounds();
        let h0 = 0.1;
        let mesh = EikMesh::new(bounds, Uniform, bounds, &[], EikMeshOptions::new(h0))
            .unwrap()
            .generate()
            .unwrap();

        assert!(mesh.is_valid());

        // Triangle count within 10% of area / (sqrt(3)/4 * h0^2).
        let expected = 1.0 / (3.0_f64.sqrt() / 4.0 * h0 * h0);
        let count = mesh.num_interior_faces() as f64;
        assert!(
            (count - expected).abs() <= 0.1 * expected,
            "triangle count {count} outside 10% of {expected}"
        );

        // No sliver triangles.
        for f in mesh.interior_face_ids() {
            assert!(
                aspect_ratio(&mesh, f) >= 0.5,
                "aspect ratio below 0.5 on face {f:?}"
            );
        }

        // Boundary vertices sit on the zero level-set.
        for v in mesh.boundary_vertices() {
            let d = bounds.distance(mesh.position(v));
            assert!(d.abs() <= 0.02 * h0, "boundary vertex off level-set: {d}");
        }
    }

    // Scenario: rectangle minus a disc. The disc must come out as a hole
    // face whose boundary approximates the circle.
    #[test]
    fn test_generate_disc_hole() {
        let bounds = unit_bounds();
        let disc = Disc::new(Point2::new(0.5, 0.5), 0.2);
        let domain = Subtract(bounds, disc);
        let h0 = 0.08;
        let mesh = EikMesh::new(domain, Uniform, bounds, &[], EikMeshOptions::new(h0))
            .unwrap()
            .generate()
            .unwrap();

        assert!(mesh.is_valid());

        let holes: Vec<FaceId> = mesh
            .face_ids()
            .filter(|&f| mesh.face(f).kind == FaceKind::Hole)
            .collect();
        assert_eq!(holes.len(), 1, "expected exactly one hole face");

        // Hole boundary vertices lie on the circle.
        for v in mesh.face_vertices(holes[0]) {
            let r = (mesh.position(v) - disc.center).norm();
            assert!(
                (r - disc.radius).abs() <= 0.1 * h0,
                "hole vertex at radius {r}, expected {}",
                disc.radius
            );
        }

        // Euler characteristic counting border and hole faces: V - E + F = 2.
        let euler = mesh.num_vertices() as i64 - mesh.num_edges() as i64
            + mesh.num_faces() as i64;
        assert_eq!(euler, 2);

        // No triangle survives inside the disc.
        for f in mesh.interior_face_ids() {
            assert!(domain.distance(mesh.face_centroid(f)) <= 0.0);
        }
    }

    #[test]
    fn test_anchor_dropped_with_its_vertex() {
        // The anchor sits outside the domain, so carving removes its
        // vertex. The anchor map must drop the dead ID immediately;
        // otherwise a later allocation could recycle it and an unrelated
        // vertex would inherit the anchor pull.
        let bounds = unit_bounds();
        let disc = Disc::new(Point2::new(0.5, 0.5), 0.3);
        let anchor = Point2::new(0.9, 0.9);
        let mut gen = EikMesh::new(
            disc,
            Uniform,
            bounds,
            &[anchor],
            EikMeshOptions::new(0.1).sequential(),
        )
        .unwrap();
        assert!(gen.anchor_of.is_empty());

        for _ in 0..3 {
            gen.improve().unwrap();
        }
        assert!(gen.anchor_of.is_empty());
        let mesh = gen.mesh();
        assert!(mesh.is_valid());
        // Nothing got pulled toward the discarded anchor.
        for v in mesh.vertex_ids() {
            assert!((mesh.position(v) - anchor).norm() > 0.2);
        }
    }

    #[test]
    fn test_anchor_vertex_stays_pinned() {
        let bounds = unit_bounds();
        let anchor = Point2::new(0.53, 0.47);
        let mut gen = EikMesh::new(
            bounds,
            Uniform,
            bounds,
            &[anchor],
            EikMeshOptions::new(0.1).with_max_steps(30).sequential(),
        )
        .unwrap();
        for _ in 0..30 {
            gen.improve().unwrap();
        }
        let mesh = gen.mesh();
        let held = mesh
            .vertex_ids()
            .any(|v| (mesh.position(v) - anchor).norm() < 1e-3);
        assert!(held, "no vertex remained at the anchor point");
    }

    #[test]
    fn test_from_base_refines_and_fixes_border() {
        let mut points = Vec::new();
        for i in 0..3 {
            for j in 0..3 {
                points.push(Point2::new(i as f64 * 0.5, j as f64 * 0.5));
            }
        }
        let base = Triangulation::from_points(&points).unwrap();
        let bounds = unit_bounds();
        let mut gen = EikMesh::from_base(
            bounds,
            Uniform,
            base,
            EikMeshOptions::new(0.25).sequential(),
        )
        .unwrap();

        // All edges meet the target length after bisection.
        let mesh = gen.mesh();
        for he in mesh.edge_ids() {
            assert!(mesh.edge_length(he) <= 0.25 + 1e-9);
        }
        // Border vertices are fixed and stay put under relaxation.
        let border_before: Vec<Point2<f64>> = {
            let mut b: Vec<_> = gen
                .mesh()
                .boundary_vertices()
                .iter()
                .map(|&v| gen.mesh().position(v))
                .collect();
            b.sort_by(|a, b| (a.x, a.y).partial_cmp(&(b.x, b.y)).unwrap());
            b
        };
        for _ in 0..5 {
            gen.improve().unwrap();
        }
        let border_after: Vec<Point2<f64>> = {
            let mut b: Vec<_> = gen
                .mesh()
                .boundary_vertices()
                .iter()
                .map(|&v| gen.mesh().position(v))
                .collect();
            b.sort_by(|a, b| (a.x, a.y).partial_cmp(&(b.x, b.y)).unwrap());
            b
        };
        assert_eq!(border_before, border_after);
        assert!(gen.mesh().is_valid());
    }
}

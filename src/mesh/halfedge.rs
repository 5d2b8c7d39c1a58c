//! Half-edge mesh data structure for planar triangulations.
//!
//! This module provides a half-edge (doubly-connected edge list)
//! representation for 2D triangle meshes. The structure enables O(1)
//! adjacency queries and is the foundation for the triangulation and
//! relaxation algorithms.
//!
//! # Structure
//!
//! - Each edge is split into two **half-edges** pointing in opposite
//!   directions
//! - Each half-edge knows its **twin** (opposite half-edge), **next** /
//!   **prev** (around the face), **origin vertex**, and **incident face**
//! - Each vertex stores one outgoing half-edge
//! - Each face stores one half-edge on its cycle
//!
//! # Boundary Handling
//!
//! Every half-edge belongs to a face. The unbounded exterior is represented
//! by a single *border* face, and excluded interior regions by *hole* faces
//! (see [`FaceKind`]). Border and hole face cycles may have any length >= 3;
//! interior faces are always triangles with counter-clockwise orientation.
//!
//! # Storage
//!
//! Vertices, half-edges, and faces live in dense arrays indexed by stable
//! integer handles. Destroyed elements are marked dead and recycled through
//! free lists; [`Mesh::compact`] relabels live indices and reclaims storage.

use nalgebra::{Point2, Vector2};

use super::index::{FaceId, HalfEdgeId, VertexId};
use crate::geometry;

/// Classification of a mesh face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceKind {
    /// An ordinary triangular face inside the meshed region.
    Interior,
    /// The single unbounded face surrounding the whole mesh.
    Border,
    /// An interior region excluded from the meshed area.
    Hole,
}

/// A vertex in the half-edge mesh.
///
/// Besides its position, a vertex carries the per-step relaxation state: a
/// force accumulator, the accumulated absolute force magnitude, and a
/// `fixed` flag marking vertices that must not move (domain corners and
/// user-supplied anchors).
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 2D position of this vertex.
    pub position: Point2<f64>,
    /// Force accumulator, used only during relaxation.
    pub velocity: Vector2<f64>,
    /// Accumulated absolute force magnitude, used only during relaxation.
    pub abs_force: f64,
    /// Whether this vertex is pinned in place.
    pub fixed: bool,
    /// One outgoing half-edge from this vertex.
    pub halfedge: HalfEdgeId,
    pub(crate) alive: bool,
}

impl Vertex {
    /// Create a new movable vertex at the given position.
    pub fn new(position: Point2<f64>) -> Self {
        Self {
            position,
            velocity: Vector2::zeros(),
            abs_force: 0.0,
            fixed: false,
            halfedge: HalfEdgeId::invalid(),
            alive: true,
        }
    }
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge {
    /// The vertex this half-edge originates from.
    pub origin: VertexId,
    /// The opposite half-edge (pointing in the reverse direction).
    pub twin: HalfEdgeId,
    /// The next half-edge around the face (counter-clockwise for interior
    /// faces).
    pub next: HalfEdgeId,
    /// The previous half-edge around the face.
    pub prev: HalfEdgeId,
    /// The face this half-edge belongs to.
    pub face: FaceId,
    pub(crate) alive: bool,
}

impl HalfEdge {
    pub(crate) fn new() -> Self {
        Self {
            origin: VertexId::invalid(),
            twin: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
            alive: true,
        }
    }
}

/// A face in the half-edge mesh.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    /// One half-edge on the cycle of this face.
    pub halfedge: HalfEdgeId,
    /// Whether this face is interior, the border, or a hole.
    pub kind: FaceKind,
    pub(crate) alive: bool,
}

impl Face {
    pub(crate) fn new(halfedge: HalfEdgeId, kind: FaceKind) -> Self {
        Self {
            halfedge,
            kind,
            alive: true,
        }
    }
}

/// A half-edge mesh for planar triangulations.
///
/// Stores vertices, half-edges, and faces with full connectivity, enabling
/// O(1) adjacency queries and in-place structural mutation (split, flip,
/// collapse, flood merge; see the methods defined in `mesh::ops`).
#[derive(Debug, Clone)]
pub struct Mesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) halfedges: Vec<HalfEdge>,
    pub(crate) faces: Vec<Face>,

    pub(crate) free_vertices: Vec<VertexId>,
    pub(crate) free_halfedges: Vec<HalfEdgeId>,
    pub(crate) free_faces: Vec<FaceId>,

    pub(crate) border: FaceId,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            halfedges: Vec::new(),
            faces: Vec::new(),
            free_vertices: Vec::new(),
            free_halfedges: Vec::new(),
            free_faces: Vec::new(),
            border: FaceId::invalid(),
        }
    }

    // ==================== Allocation ====================

    /// Add a new vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point2<f64>) -> VertexId {
        if let Some(id) = self.free_vertices.pop() {
            self.vertices[id.index()] = Vertex::new(position);
            id
        } else {
            let id = VertexId::new(self.vertices.len());
            self.vertices.push(Vertex::new(position));
            id
        }
    }

    pub(crate) fn alloc_halfedge(&mut self) -> HalfEdgeId {
        if let Some(id) = self.free_halfedges.pop() {
            self.halfedges[id.index()] = HalfEdge::new();
            id
        } else {
            let id = HalfEdgeId::new(self.halfedges.len());
            self.halfedges.push(HalfEdge::new());
            id
        }
    }

    pub(crate) fn alloc_face(&mut self, halfedge: HalfEdgeId, kind: FaceKind) -> FaceId {
        if let Some(id) = self.free_faces.pop() {
            self.faces[id.index()] = Face::new(halfedge, kind);
            id
        } else {
            let id = FaceId::new(self.faces.len());
            self.faces.push(Face::new(halfedge, kind));
            id
        }
    }

    /// Release a vertex. The caller must have rewired all references.
    pub(crate) fn destroy_vertex(&mut self, v: VertexId) {
        debug_assert!(self.vertices[v.index()].alive);
        self.vertices[v.index()].alive = false;
        self.free_vertices.push(v);
    }

    /// Release a single half-edge. The caller must have rewired all
    /// surviving `next`/`prev`/`twin` references.
    pub(crate) fn destroy_halfedge(&mut self, he: HalfEdgeId) {
        debug_assert!(self.halfedges[he.index()].alive);
        self.halfedges[he.index()].alive = false;
        self.free_halfedges.push(he);
    }

    /// Release a face. The caller must have rewired all references.
    pub(crate) fn destroy_face(&mut self, f: FaceId) {
        debug_assert!(self.faces[f.index()].alive);
        self.faces[f.index()].alive = false;
        self.free_faces.push(f);
    }

    // ==================== Accessors ====================

    /// Get the number of live vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() - self.free_vertices.len()
    }

    /// Get the number of live half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len() - self.free_halfedges.len()
    }

    /// Get the number of live undirected edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.num_halfedges() / 2
    }

    /// Get the number of live faces (interior, border, and holes).
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len() - self.free_faces.len()
    }

    /// Get the number of live interior faces.
    pub fn num_interior_faces(&self) -> usize {
        self.face_ids()
            .filter(|&f| self.face(f).kind == FaceKind::Interior)
            .count()
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        debug_assert!(self.vertices[id.index()].alive, "access to dead {id:?}");
        &self.vertices[id.index()]
    }

    /// Get a mutable vertex by ID.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        debug_assert!(self.vertices[id.index()].alive, "access to dead {id:?}");
        &mut self.vertices[id.index()]
    }

    /// Get a half-edge by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId) -> &HalfEdge {
        debug_assert!(self.halfedges[id.index()].alive, "access to dead {id:?}");
        &self.halfedges[id.index()]
    }

    /// Get a mutable half-edge by ID.
    #[inline]
    pub fn halfedge_mut(&mut self, id: HalfEdgeId) -> &mut HalfEdge {
        debug_assert!(self.halfedges[id.index()].alive, "access to dead {id:?}");
        &mut self.halfedges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId) -> &Face {
        debug_assert!(self.faces[id.index()].alive, "access to dead {id:?}");
        &self.faces[id.index()]
    }

    /// Get a mutable face by ID.
    #[inline]
    pub fn face_mut(&mut self, id: FaceId) -> &mut Face {
        debug_assert!(self.faces[id.index()].alive, "access to dead {id:?}");
        &mut self.faces[id.index()]
    }

    /// Check whether a vertex ID refers to a live vertex.
    #[inline]
    pub fn is_vertex_alive(&self, id: VertexId) -> bool {
        id.is_valid() && id.index() < self.vertices.len() && self.vertices[id.index()].alive
    }

    /// Check whether a half-edge ID refers to a live half-edge.
    #[inline]
    pub fn is_halfedge_alive(&self, id: HalfEdgeId) -> bool {
        id.is_valid() && id.index() < self.halfedges.len() && self.halfedges[id.index()].alive
    }

    /// Check whether a face ID refers to a live face.
    #[inline]
    pub fn is_face_alive(&self, id: FaceId) -> bool {
        id.is_valid() && id.index() < self.faces.len() && self.faces[id.index()].alive
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> Point2<f64> {
        self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId, pos: Point2<f64>) {
        self.vertex_mut(v).position = pos;
    }

    /// The single border face of the mesh.
    #[inline]
    pub fn border(&self) -> FaceId {
        self.border
    }

    // ==================== Topology Queries ====================

    /// Get the twin (opposite) half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).twin
    }

    /// Get the next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).next
    }

    /// Get the previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).prev
    }

    /// Get the origin vertex of a half-edge.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId) -> VertexId {
        self.halfedge(he).origin
    }

    /// Get the destination vertex of a half-edge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId) -> VertexId {
        self.origin(self.twin(he))
    }

    /// Get the face of a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId) -> FaceId {
        self.halfedge(he).face
    }

    /// Check if a face is an ordinary interior face.
    #[inline]
    pub fn is_interior(&self, f: FaceId) -> bool {
        self.face(f).kind == FaceKind::Interior
    }

    /// Check if a face is the border face.
    #[inline]
    pub fn is_border(&self, f: FaceId) -> bool {
        self.face(f).kind == FaceKind::Border
    }

    /// Check if a face is a hole face.
    #[inline]
    pub fn is_hole(&self, f: FaceId) -> bool {
        self.face(f).kind == FaceKind::Hole
    }

    /// Check if a half-edge lies on the border or a hole cycle.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId) -> bool {
        !self.is_interior(self.face_of(he))
    }

    /// Check if an edge (either of its half-edges) is a boundary edge.
    #[inline]
    pub fn is_boundary_edge(&self, he: HalfEdgeId) -> bool {
        self.is_boundary_halfedge(he) || self.is_boundary_halfedge(self.twin(he))
    }

    /// Check if an edge is interior: both incident faces are triangles.
    #[inline]
    pub fn is_interior_edge(&self, he: HalfEdgeId) -> bool {
        self.is_interior(self.face_of(he)) && self.is_interior(self.face_of(self.twin(he)))
    }

    /// Check if a vertex lies on the border or a hole cycle.
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        self.vertex_halfedges(v)
            .any(|he| self.is_boundary_edge(he))
    }

    /// Compute the valence (degree) of a vertex.
    pub fn valence(&self, v: VertexId) -> usize {
        self.vertex_halfedges(v).count()
    }

    /// Find the half-edge from `a` to `b`, if the edge exists.
    pub fn find_halfedge(&self, a: VertexId, b: VertexId) -> Option<HalfEdgeId> {
        self.vertex_halfedges(a).find(|&he| self.dest(he) == b)
    }

    // ==================== Iteration ====================

    /// Iterate over all live vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.alive)
            .map(|(i, _)| VertexId::new(i))
    }

    /// Iterate over all live half-edge IDs.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId> + '_ {
        self.halfedges
            .iter()
            .enumerate()
            .filter(|(_, he)| he.alive)
            .map(|(i, _)| HalfEdgeId::new(i))
    }

    /// Iterate over all live undirected edges, yielding one half-edge per
    /// edge (the one with the smaller index).
    pub fn edge_ids(&self) -> impl Iterator<Item = HalfEdgeId> + '_ {
        self.halfedge_ids()
            .filter(|&he| he.index() < self.twin(he).index())
    }

    /// Iterate over all live face IDs (interior, border, and holes).
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.alive)
            .map(|(i, _)| FaceId::new(i))
    }

    /// Iterate over all live interior face IDs.
    pub fn interior_face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.face_ids().filter(|&f| self.is_interior(f))
    }

    /// Iterate over half-edges going out of a vertex.
    pub fn vertex_halfedges(&self, v: VertexId) -> VertexHalfEdgeIter<'_> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// Iterate over vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// Iterate over interior faces adjacent to a vertex.
    pub fn vertex_faces(&self, v: VertexId) -> impl Iterator<Item = FaceId> + '_ {
        self.vertex_halfedges(v)
            .map(|he| self.face_of(he))
            .filter(|&f| self.is_interior(f))
    }

    /// Iterate over half-edges around a face.
    pub fn face_halfedges(&self, f: FaceId) -> FaceHalfEdgeIter<'_> {
        FaceHalfEdgeIter::new(self, f)
    }

    /// Iterate over vertices of a face in cycle order.
    pub fn face_vertices(&self, f: FaceId) -> impl Iterator<Item = VertexId> + '_ {
        self.face_halfedges(f).map(|he| self.origin(he))
    }

    /// Get the three vertices of a triangular interior face.
    pub fn face_triangle(&self, f: FaceId) -> [VertexId; 3] {
        debug_assert!(self.is_interior(f));
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        debug_assert_eq!(self.next(he2), he0, "interior face is not a triangle");
        [self.origin(he0), self.origin(he1), self.origin(he2)]
    }

    /// Get the positions of the three vertices of a triangular face.
    pub fn face_positions(&self, f: FaceId) -> [Point2<f64>; 3] {
        let [v0, v1, v2] = self.face_triangle(f);
        [self.position(v0), self.position(v1), self.position(v2)]
    }

    /// Collect the vertices on the border cycle and all hole cycles.
    pub fn boundary_vertices(&self) -> Vec<VertexId> {
        let mut result = Vec::new();
        for f in self.face_ids() {
            if !self.is_interior(f) {
                result.extend(self.face_vertices(f));
            }
        }
        result
    }

    /// For a boundary vertex, its two neighbors along the boundary cycle,
    /// or `None` if the vertex is not on a boundary.
    pub fn boundary_neighbors(&self, v: VertexId) -> Option<(VertexId, VertexId)> {
        for he in self.vertex_halfedges(v) {
            if self.is_boundary_halfedge(he) {
                // he: v -> next along the cycle; prev(he) ends at v.
                return Some((self.origin(self.prev(he)), self.dest(he)));
            }
        }
        None
    }

    // ==================== Geometry ====================

    /// Compute the signed area of an interior face (positive for CCW).
    pub fn face_area(&self, f: FaceId) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        geometry::area(p0, p1, p2)
    }

    /// Compute the centroid of an interior face.
    pub fn face_centroid(&self, f: FaceId) -> Point2<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        Point2::from((p0.coords + p1.coords + p2.coords) / 3.0)
    }

    /// Compute the length of an edge.
    pub fn edge_length(&self, he: HalfEdgeId) -> f64 {
        (self.position(self.dest(he)) - self.position(self.origin(he))).norm()
    }

    /// Compute the midpoint of an edge.
    pub fn edge_midpoint(&self, he: HalfEdgeId) -> Point2<f64> {
        geometry::midpoint(self.position(self.origin(he)), self.position(self.dest(he)))
    }

    /// Compute the bounding box of all live vertices, or `None` for an
    /// empty mesh.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let mut it = self.vertex_ids();
        let first = it.next()?;
        let mut min = self.position(first);
        let mut max = min;
        for v in it {
            let p = self.position(v);
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }

    // ==================== Validation ====================

    /// Check if the mesh is valid: all connectivity is consistent and every
    /// face cycle has length >= 3.
    pub fn is_valid(&self) -> bool {
        for v in self.vertex_ids() {
            let he = self.vertex(v).halfedge;
            if !self.is_halfedge_alive(he) || self.origin(he) != v {
                return false;
            }
        }

        for he in self.halfedge_ids() {
            let e = self.halfedge(he);
            if !self.is_halfedge_alive(e.twin) || self.twin(e.twin) != he {
                return false;
            }
            if !self.is_halfedge_alive(e.next) || self.prev(e.next) != he {
                return false;
            }
            if !self.is_halfedge_alive(e.prev) || self.next(e.prev) != he {
                return false;
            }
            if !self.is_vertex_alive(e.origin) || !self.is_face_alive(e.face) {
                return false;
            }
            // A half-edge and its twin bound different faces except inside
            // degenerate 2-cycles, which are never valid.
            if e.twin == he {
                return false;
            }
        }

        for f in self.face_ids() {
            let start = self.face(f).halfedge;
            if !self.is_halfedge_alive(start) {
                return false;
            }
            let mut len = 0usize;
            let mut he = start;
            loop {
                if self.face_of(he) != f {
                    return false;
                }
                len += 1;
                if len > self.halfedges.len() {
                    return false; // broken cycle
                }
                he = self.next(he);
                if he == start {
                    break;
                }
            }
            if len < 3 {
                return false;
            }
            if self.is_interior(f) && len != 3 {
                return false;
            }
        }

        true
    }

    /// Cheap health check used by the relaxation loop: connectivity is valid
    /// and all interior faces are CCW triangles with positive area.
    pub fn is_healthy(&self) -> bool {
        if !self.is_valid() {
            return false;
        }
        self.interior_face_ids().all(|f| self.face_area(f) > 0.0)
    }

    // ==================== Compaction ====================

    /// Garbage-collect dead elements, relabeling live indices.
    ///
    /// All previously obtained IDs are invalidated.
    pub fn compact(&mut self) {
        let mut vmap = vec![VertexId::invalid(); self.vertices.len()];
        let mut hmap = vec![HalfEdgeId::invalid(); self.halfedges.len()];
        let mut fmap = vec![FaceId::invalid(); self.faces.len()];

        let mut vertices = Vec::with_capacity(self.num_vertices());
        for (i, v) in self.vertices.iter().enumerate() {
            if v.alive {
                vmap[i] = VertexId::new(vertices.len());
                vertices.push(v.clone());
            }
        }
        let mut halfedges = Vec::with_capacity(self.num_halfedges());
        for (i, he) in self.halfedges.iter().enumerate() {
            if he.alive {
                hmap[i] = HalfEdgeId::new(halfedges.len());
                halfedges.push(*he);
            }
        }
        let mut faces = Vec::with_capacity(self.num_faces());
        for (i, f) in self.faces.iter().enumerate() {
            if f.alive {
                fmap[i] = FaceId::new(faces.len());
                faces.push(*f);
            }
        }

        for v in &mut vertices {
            v.halfedge = hmap[v.halfedge.index()];
        }
        for he in &mut halfedges {
            he.origin = vmap[he.origin.index()];
            he.twin = hmap[he.twin.index()];
            he.next = hmap[he.next.index()];
            he.prev = hmap[he.prev.index()];
            he.face = fmap[he.face.index()];
        }
        for f in &mut faces {
            f.halfedge = hmap[f.halfedge.index()];
        }

        self.border = fmap[self.border.index()];
        self.vertices = vertices;
        self.halfedges = halfedges;
        self.faces = faces;
        self.free_vertices.clear();
        self.free_halfedges.clear();
        self.free_faces.clear();
    }
}

/// Iterator over half-edges going out of a vertex.
pub struct VertexHalfEdgeIter<'a> {
    mesh: &'a Mesh,
    start: HalfEdgeId,
    current: HalfEdgeId,
    done: bool,
}

impl<'a> VertexHalfEdgeIter<'a> {
    fn new(mesh: &'a Mesh, v: VertexId) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a> Iterator for VertexHalfEdgeIter<'a> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        // If he goes v -> w, then twin(he) goes w -> v, and next(twin(he))
        // is the next outgoing half-edge from v.
        self.current = self.mesh.next(self.mesh.twin(self.current));

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

/// Iterator over half-edges around a face.
pub struct FaceHalfEdgeIter<'a> {
    mesh: &'a Mesh,
    start: HalfEdgeId,
    current: HalfEdgeId,
    done: bool,
}

impl<'a> FaceHalfEdgeIter<'a> {
    fn new(mesh: &'a Mesh, f: FaceId) -> Self {
        let start = mesh.face(f).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a> Iterator for FaceHalfEdgeIter<'a> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next(self.current);

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mesh() {
        let mesh = Mesh::new();
        assert_eq!(mesh.num_vertices(), 0);
        assert_eq!(mesh.num_halfedges(), 0);
        assert_eq!(mesh.num_faces(), 0);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_add_vertex() {
        let mut mesh = Mesh::new();
        let v0 = mesh.add_vertex(Point2::new(0.0, 0.0));
        let v1 = mesh.add_vertex(Point2::new(1.0, 0.0));

        assert_eq!(mesh.num_vertices(), 2);
        assert_eq!(v0.index(), 0);
        assert_eq!(v1.index(), 1);
        assert!(!mesh.vertex(v0).fixed);
    }

    #[test]
    fn test_vertex_free_list_reuse() {
        let mut mesh = Mesh::new();
        let v0 = mesh.add_vertex(Point2::new(0.0, 0.0));
        let _v1 = mesh.add_vertex(Point2::new(1.0, 0.0));
        mesh.destroy_vertex(v0);
        assert_eq!(mesh.num_vertices(), 1);

        let v2 = mesh.add_vertex(Point2::new(2.0, 0.0));
        assert_eq!(v2, v0); // slot recycled
        assert_eq!(mesh.num_vertices(), 2);
        assert_eq!(mesh.position(v2), Point2::new(2.0, 0.0));
    }
}

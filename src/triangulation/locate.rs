//! History-DAG point location for incremental triangulation.
//!
//! Every structural change to the triangulation (face split, edge split,
//! edge flip) is recorded as a node replacement in a DAG: the old faces
//! become parents of the faces that replaced them. Locating a point walks
//! from the roots down through children whose triangle contains the point,
//! giving expected O(log n) queries for random insertion orders.
//!
//! Nodes snapshot the triangle *positions* at record time, so the DAG stays
//! usable even though face IDs are recycled. If the mesh is mutated behind
//! the locator's back (vertex smoothing, flips outside the triangulation)
//! the locator must be marked stale and rebuilt.

use log::{debug, trace};
use nalgebra::Point2;

use crate::geometry;
use crate::mesh::{FaceId, Mesh};

/// Containment slack for walking the DAG. A point on a shared edge may be
/// claimed by either adjacent triangle.
const CONTAIN_EPS: f64 = 1e-12;

const NO_NODE: u32 = u32::MAX;

#[derive(Debug, Clone)]
struct Node {
    face: FaceId,
    tri: [Point2<f64>; 3],
    children: Vec<u32>,
}

/// Point locator backed by a history DAG of face replacements.
#[derive(Debug, Clone, Default)]
pub struct PointLocator {
    nodes: Vec<Node>,
    roots: Vec<u32>,
    /// Current leaf node for each face slot, indexed by face index.
    face_node: Vec<u32>,
    stale: bool,
}

impl PointLocator {
    /// Empty locator with no recorded faces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the DAG no longer reflects the mesh and must be rebuilt
    /// before the next query.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Mark the DAG as out of sync with the mesh.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    fn push_leaf(&mut self, mesh: &Mesh, face: FaceId) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(Node {
            face,
            tri: mesh.face_positions(face),
            children: Vec::new(),
        });
        if self.face_node.len() <= face.index() {
            self.face_node.resize(face.index() + 1, NO_NODE);
        }
        self.face_node[face.index()] = id;
        id
    }

    /// Register a face that exists before any recorded replacement (the
    /// initial triangles of the triangulation).
    pub fn record_root(&mut self, mesh: &Mesh, face: FaceId) {
        if self.stale {
            return;
        }
        let id = self.push_leaf(mesh, face);
        self.roots.push(id);
    }

    /// Record that `old` faces were replaced by `new` faces (split or flip).
    /// A face ID may appear in both lists when the operation reuses it.
    pub fn record_replace(&mut self, mesh: &Mesh, old: &[FaceId], new: &[FaceId]) {
        if self.stale {
            return;
        }
        let parents: Vec<u32> = old
            .iter()
            .map(|f| {
                debug_assert!(self.face_node.get(f.index()).copied() != Some(NO_NODE));
                self.face_node[f.index()]
            })
            .collect();
        for &f in new {
            let child = self.push_leaf(mesh, f);
            for &p in &parents {
                self.nodes[p as usize].children.push(child);
            }
        }
    }

    /// Discard the DAG and rebuild it flat: every live interior face
    /// becomes a root. Queries degrade to O(n) until enough history
    /// accumulates again.
    pub fn rebuild(&mut self, mesh: &Mesh) {
        debug!(
            "rebuilding point locator over {} faces",
            mesh.num_interior_faces()
        );
        self.nodes.clear();
        self.roots.clear();
        self.face_node.clear();
        self.stale = false;
        for f in mesh.interior_face_ids() {
            let id = self.push_leaf(mesh, f);
            self.roots.push(id);
        }
    }

    /// Locate the interior face containing `p`, or `None` if `p` lies
    /// outside every root triangle. Points on a shared edge may resolve to
    /// either adjacent face.
    ///
    /// The locator must not be stale.
    pub fn locate(&self, mesh: &Mesh, p: Point2<f64>) -> Option<FaceId> {
        debug_assert!(!self.stale, "locate on a stale point locator");

        let mut current = self
            .roots
            .iter()
            .copied()
            .find(|&n| self.contains(n, p))?;

        loop {
            let node = &self.nodes[current as usize];
            if node.children.is_empty() {
                // A leaf snapshot can be outdated if its face slot was
                // recycled; the face_node table is authoritative.
                if self.face_node[node.face.index()] == current && mesh.is_face_alive(node.face) {
                    return Some(node.face);
                }
                trace!("locator leaf for {:?} is outdated", node.face);
                return None;
            }
            match node
                .children
                .iter()
                .copied()
                .find(|&c| self.contains(c, p))
            {
                Some(c) => current = c,
                // Numerical slack can strand a point between children.
                None => return None,
            }
        }
    }

    #[inline]
    fn contains(&self, node: u32, p: Point2<f64>) -> bool {
        let t = &self.nodes[node as usize].tri;
        geometry::point_in_triangle(t[0], t[1], t[2], p, CONTAIN_EPS)
    }
}

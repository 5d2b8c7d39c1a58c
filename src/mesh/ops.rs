//! Structural mesh operations: splits, flips, collapses, and flood merges.
//!
//! All operations keep the mesh manifold and keep interior faces as CCW
//! triangles. Operations that can fail validate their preconditions and
//! return an error *before* mutating anything, so the mesh is never left in
//! a broken state.

use std::collections::{HashMap, HashSet, VecDeque};

use nalgebra::Point2;

use super::halfedge::{FaceKind, Mesh};
use super::index::{FaceId, HalfEdgeId, VertexId};
use crate::error::{MeshError, Result};
use crate::geometry;

/// Result of splitting an edge with a new vertex.
#[derive(Debug)]
pub struct EdgeSplit {
    /// The newly inserted vertex.
    pub vertex: VertexId,
    /// Half-edge from the original origin to the new vertex.
    pub he_in: HalfEdgeId,
    /// Half-edge from the new vertex to the original destination.
    pub he_out: HalfEdgeId,
    /// Interior faces incident to the new vertex (4 for an interior edge,
    /// 2 for a boundary edge).
    pub faces: Vec<FaceId>,
}

impl Mesh {
    /// Build a two-triangle mesh covering the axis-aligned rectangle
    /// `[min, max]`, with a border face around it. Returns the mesh and the
    /// corner vertices in CCW order starting from `min`.
    pub(crate) fn bounding_square(min: Point2<f64>, max: Point2<f64>) -> (Mesh, [VertexId; 4]) {
        let mut mesh = Mesh::new();
        let c0 = mesh.add_vertex(min);
        let c1 = mesh.add_vertex(Point2::new(max.x, min.y));
        let c2 = mesh.add_vertex(max);
        let c3 = mesh.add_vertex(Point2::new(min.x, max.y));

        // Interior triangles (c0,c1,c2) and (c0,c2,c3).
        let a0 = mesh.alloc_halfedge(); // c0 -> c1
        let a1 = mesh.alloc_halfedge(); // c1 -> c2
        let a2 = mesh.alloc_halfedge(); // c2 -> c0
        let b0 = mesh.alloc_halfedge(); // c0 -> c2
        let b1 = mesh.alloc_halfedge(); // c2 -> c3
        let b2 = mesh.alloc_halfedge(); // c3 -> c0

        // Border cycle, clockwise around the square.
        let d0 = mesh.alloc_halfedge(); // c1 -> c0
        let d1 = mesh.alloc_halfedge(); // c0 -> c3
        let d2 = mesh.alloc_halfedge(); // c3 -> c2
        let d3 = mesh.alloc_halfedge(); // c2 -> c1

        let fa = mesh.alloc_face(a0, FaceKind::Interior);
        let fb = mesh.alloc_face(b0, FaceKind::Interior);
        let border = mesh.alloc_face(d0, FaceKind::Border);
        mesh.border = border;

        let wire = |mesh: &mut Mesh,
                    he: HalfEdgeId,
                    origin: VertexId,
                    twin: HalfEdgeId,
                    next: HalfEdgeId,
                    prev: HalfEdgeId,
                    face: FaceId| {
            let e = mesh.halfedge_mut(he);
            e.origin = origin;
            e.twin = twin;
            e.next = next;
            e.prev = prev;
            e.face = face;
        };

        wire(&mut mesh, a0, c0, d0, a1, a2, fa);
        wire(&mut mesh, a1, c1, d3, a2, a0, fa);
        wire(&mut mesh, a2, c2, b0, a0, a1, fa);
        wire(&mut mesh, b0, c0, a2, b1, b2, fb);
        wire(&mut mesh, b1, c2, d2, b2, b0, fb);
        wire(&mut mesh, b2, c3, d1, b0, b1, fb);
        wire(&mut mesh, d0, c1, a0, d1, d3, border);
        wire(&mut mesh, d1, c0, b2, d2, d0, border);
        wire(&mut mesh, d2, c3, b1, d3, d1, border);
        wire(&mut mesh, d3, c2, a1, d0, d2, border);

        mesh.vertex_mut(c0).halfedge = a0;
        mesh.vertex_mut(c1).halfedge = a1;
        mesh.vertex_mut(c2).halfedge = a2;
        mesh.vertex_mut(c3).halfedge = b2;

        debug_assert!(mesh.is_valid());
        (mesh, [c0, c1, c2, c3])
    }

    // ==================== Split ====================

    /// Split the edge `he` with a new vertex at `position`.
    ///
    /// Each incident interior face is split into two triangles; a boundary
    /// face on either side simply has its cycle lengthened by one.
    pub fn split_edge(&mut self, he: HalfEdgeId, position: Point2<f64>) -> EdgeSplit {
        let e = he;
        let t = self.twin(e);
        let b = self.dest(e);
        let fl = self.face_of(e);
        let fr = self.face_of(t);
        let nl = self.next(e);
        let pl = self.prev(e);
        let nr = self.next(t);
        let pr = self.prev(t);

        let v = self.add_vertex(position);
        let e1 = self.alloc_halfedge(); // v -> b, left side
        let t1 = self.alloc_halfedge(); // v -> a, right side

        // e stays a->v, t stays b->v.
        self.halfedge_mut(e).twin = t1;
        self.halfedge_mut(t).twin = e1;
        {
            let h = self.halfedge_mut(e1);
            h.origin = v;
            h.twin = t;
        }
        {
            let h = self.halfedge_mut(t1);
            h.origin = v;
            h.twin = e;
        }
        self.vertex_mut(v).halfedge = e1;

        let mut faces = Vec::with_capacity(2);

        // Left side.
        if self.is_interior(fl) {
            let c = self.origin(pl);
            let s0 = self.alloc_halfedge(); // v -> c
            let s1 = self.alloc_halfedge(); // c -> v
            let fl2 = self.alloc_face(e1, FaceKind::Interior);
            self.face_mut(fl).halfedge = e;

            self.link(fl, &[(e, None), (s0, Some(v)), (pl, None)]);
            self.link(fl2, &[(e1, None), (nl, None), (s1, Some(c))]);
            self.halfedge_mut(s0).twin = s1;
            self.halfedge_mut(s1).twin = s0;

            faces.push(fl);
            faces.push(fl2);
        } else {
            // Lengthen the boundary cycle: a->v, v->b.
            self.halfedge_mut(e1).face = fl;
            self.halfedge_mut(e).next = e1;
            self.halfedge_mut(e1).prev = e;
            self.halfedge_mut(e1).next = nl;
            self.halfedge_mut(nl).prev = e1;
        }

        // Right side.
        if self.is_interior(fr) {
            let d = self.origin(pr);
            let r0 = self.alloc_halfedge(); // v -> d
            let r1 = self.alloc_halfedge(); // d -> v
            let fr2 = self.alloc_face(t1, FaceKind::Interior);
            self.face_mut(fr).halfedge = t;

            self.link(fr, &[(t, None), (r0, Some(v)), (pr, None)]);
            self.link(fr2, &[(t1, None), (nr, None), (r1, Some(d))]);
            self.halfedge_mut(r0).twin = r1;
            self.halfedge_mut(r1).twin = r0;

            faces.push(fr);
            faces.push(fr2);
        } else {
            self.halfedge_mut(t1).face = fr;
            self.halfedge_mut(t).next = t1;
            self.halfedge_mut(t1).prev = t;
            self.halfedge_mut(t1).next = nr;
            self.halfedge_mut(nr).prev = t1;
        }

        debug_assert_eq!(self.dest(e1), b);

        EdgeSplit {
            vertex: v,
            he_in: e,
            he_out: e1,
            faces,
        }
    }

    /// Split an interior face into three triangles around a new vertex at
    /// `position`. Returns the new vertex and the three resulting faces
    /// (the first reuses the original face ID).
    pub fn split_face(&mut self, f: FaceId, position: Point2<f64>) -> (VertexId, [FaceId; 3]) {
        debug_assert!(self.is_interior(f));
        let e0 = self.face(f).halfedge; // a -> b
        let e1 = self.next(e0); // b -> c
        let e2 = self.next(e1); // c -> a
        let a = self.origin(e0);
        let b = self.origin(e1);
        let c = self.origin(e2);

        let v = self.add_vertex(position);
        let hbv = self.alloc_halfedge(); // b -> v
        let hvb = self.alloc_halfedge(); // v -> b
        let hcv = self.alloc_halfedge(); // c -> v
        let hvc = self.alloc_halfedge(); // v -> c
        let hav = self.alloc_halfedge(); // a -> v
        let hva = self.alloc_halfedge(); // v -> a

        for (h, o, t) in [
            (hbv, b, hvb),
            (hvb, v, hbv),
            (hcv, c, hvc),
            (hvc, v, hcv),
            (hav, a, hva),
            (hva, v, hav),
        ] {
            let e = self.halfedge_mut(h);
            e.origin = o;
            e.twin = t;
        }

        let f1 = self.alloc_face(e1, FaceKind::Interior);
        let f2 = self.alloc_face(e2, FaceKind::Interior);
        self.face_mut(f).halfedge = e0;

        self.link(f, &[(e0, None), (hbv, None), (hva, None)]);
        self.link(f1, &[(e1, None), (hcv, None), (hvb, None)]);
        self.link(f2, &[(e2, None), (hav, None), (hvc, None)]);

        self.vertex_mut(v).halfedge = hva;

        (v, [f, f1, f2])
    }

    /// Set a face's cycle: `hes` in order, each with an optional origin
    /// override. Fixes next, prev, and face pointers.
    fn link(&mut self, f: FaceId, hes: &[(HalfEdgeId, Option<VertexId>)]) {
        let n = hes.len();
        for (i, &(he, origin)) in hes.iter().enumerate() {
            let next = hes[(i + 1) % n].0;
            let prev = hes[(i + n - 1) % n].0;
            let e = self.halfedge_mut(he);
            e.next = next;
            e.prev = prev;
            e.face = f;
            if let Some(o) = origin {
                e.origin = o;
            }
        }
    }

    // ==================== Flip ====================

    /// Check whether the edge `he` may be flipped: both incident faces are
    /// interior triangles, the replacement edge does not already exist, and
    /// both resulting triangles would have positive area.
    pub fn is_flip_ok(&self, he: HalfEdgeId) -> bool {
        if !self.is_interior_edge(he) {
            return false;
        }
        let t = self.twin(he);
        let a = self.origin(he);
        let b = self.origin(t);
        let c = self.origin(self.prev(he));
        let d = self.origin(self.prev(t));

        if c == d {
            return false;
        }
        // Flipping would create a second c-d edge.
        if self.find_halfedge(c, d).is_some() {
            return false;
        }

        let (pa, pb) = (self.position(a), self.position(b));
        let (pc, pd) = (self.position(c), self.position(d));
        geometry::is_ccw(pd, pc, pa) && geometry::is_ccw(pc, pd, pb)
    }

    /// Flip the interior edge `he`: the shared edge a-b of triangles
    /// (a,b,c) and (b,a,d) is replaced by c-d, giving (d,c,a) and (c,d,b).
    ///
    /// The caller must ensure [`Mesh::is_flip_ok`]. Flipping twice restores
    /// the original configuration.
    pub fn flip(&mut self, he: HalfEdgeId) {
        debug_assert!(self.is_flip_ok(he));

        let e = he;
        let t = self.twin(e);
        let a = self.origin(e);
        let b = self.origin(t);
        let n1 = self.next(e); // b -> c
        let p1 = self.prev(e); // c -> a
        let n2 = self.next(t); // a -> d
        let p2 = self.prev(t); // d -> b
        let c = self.origin(p1);
        let d = self.origin(p2);
        let f1 = self.face_of(e);
        let f2 = self.face_of(t);

        // e becomes d -> c, t becomes c -> d.
        self.halfedge_mut(e).origin = d;
        self.halfedge_mut(t).origin = c;

        self.link(f1, &[(e, None), (p1, None), (n2, None)]);
        self.link(f2, &[(t, None), (p2, None), (n1, None)]);
        self.face_mut(f1).halfedge = e;
        self.face_mut(f2).halfedge = t;

        // a and b may have referenced the rotated half-edges.
        if self.vertex(a).halfedge == e {
            self.vertex_mut(a).halfedge = n2;
        }
        if self.vertex(b).halfedge == t {
            self.vertex_mut(b).halfedge = n1;
        }
    }

    // ==================== Collapse ====================

    /// Remove a degree-3 boundary vertex, merging its two incident interior
    /// triangles into one.
    ///
    /// Fails without mutating if `v` is not a boundary vertex of valence 3
    /// or if the merged triangle would be inverted.
    pub fn collapse_boundary_vertex(&mut self, v: VertexId) -> Result<()> {
        let out: Vec<HalfEdgeId> = self.vertex_halfedges(v).collect();
        if out.len() != 3 {
            return Err(MeshError::InvalidState(format!(
                "cannot collapse {v:?}: valence {} != 3",
                out.len()
            )));
        }
        let b_out = match out.iter().find(|&&he| self.is_boundary_halfedge(he)) {
            Some(&he) => he,
            None => {
                return Err(MeshError::InvalidState(format!(
                    "cannot collapse {v:?}: not a boundary vertex"
                )))
            }
        };

        let boundary = self.face_of(b_out);
        let b_in = self.prev(b_out); // n1 -> v
        let n1 = self.origin(b_in);
        let n2 = self.dest(b_out);

        let h_vn1 = self.twin(b_in); // v -> n1, interior face f1
        let h_n2v = self.twin(b_out); // n2 -> v, interior face f2
        let f1 = self.face_of(h_vn1);
        let f2 = self.face_of(h_n2v);
        if !self.is_interior(f1) || !self.is_interior(f2) || f1 == f2 {
            return Err(MeshError::InvalidState(format!(
                "cannot collapse {v:?}: incident faces are not two triangles"
            )));
        }

        // f1 = (v, n1, m): h_vn1, h_n1m, h_mv. f2 = (n2, v, m): h_n2v,
        // h_vm, h_mn2.
        let h_n1m = self.next(h_vn1);
        let h_mv = self.next(h_n1m);
        let h_vm = self.next(h_n2v);
        let h_mn2 = self.next(h_vm);
        let m = self.origin(h_mv);
        debug_assert_eq!(self.dest(h_vm), m);

        // The merged triangle is (n2, n1, m) and must stay CCW.
        let area = geometry::area(self.position(n2), self.position(n1), self.position(m));
        if area <= 0.0 {
            return Err(MeshError::InvalidState(format!(
                "cannot collapse {v:?}: merged triangle would be inverted"
            )));
        }

        let after = self.next(b_out);

        // Reuse b_in as the new boundary half-edge n1 -> n2 and h_n2v as
        // its twin n2 -> n1; merge f2 into f1.
        self.halfedge_mut(b_in).next = after;
        self.halfedge_mut(after).prev = b_in;
        self.halfedge_mut(b_in).twin = h_n2v;
        self.halfedge_mut(h_n2v).twin = b_in;

        self.link(f1, &[(h_n2v, Some(n2)), (h_n1m, None), (h_mn2, None)]);
        self.face_mut(f1).halfedge = h_n2v;

        if self.vertex(m).halfedge == h_mv {
            self.vertex_mut(m).halfedge = h_mn2;
        }
        if self.vertex(n2).halfedge == h_n2v {
            // Origin unchanged, but keep the reference fresh anyway.
            self.vertex_mut(n2).halfedge = h_n2v;
        }
        if self.face(boundary).halfedge == b_out {
            self.face_mut(boundary).halfedge = b_in;
        }

        self.destroy_halfedge(h_vn1);
        self.destroy_halfedge(b_out);
        self.destroy_halfedge(h_vm);
        self.destroy_halfedge(h_mv);
        self.destroy_face(f2);
        self.destroy_vertex(v);

        Ok(())
    }

    // ==================== Flood Merge ====================

    /// Grow the border or hole face `region` by absorbing every interior
    /// face reachable from it through faces satisfying `pred`.
    ///
    /// Fails without mutating when the merge would produce an invalid mesh:
    /// the absorbed region touches a different boundary face, the resulting
    /// cycle would pinch at a vertex, or the merge would consume the entire
    /// mesh.
    pub fn merge_region<P>(&mut self, region: FaceId, pred: P) -> Result<()>
    where
        P: Fn(&Mesh, FaceId) -> bool,
    {
        debug_assert!(!self.is_interior(region));

        // Phase 1: flood-fill the set of faces to absorb.
        let mut absorbed: HashSet<FaceId> = HashSet::new();
        let mut queue: VecDeque<FaceId> = VecDeque::new();

        for he in self.face_halfedges(region).collect::<Vec<_>>() {
            let nb = self.face_of(self.twin(he));
            if self.is_interior(nb) && pred(self, nb) && absorbed.insert(nb) {
                queue.push_back(nb);
            }
        }
        while let Some(f) = queue.pop_front() {
            for he in self.face_halfedges(f).collect::<Vec<_>>() {
                let nb = self.face_of(self.twin(he));
                if nb == region || absorbed.contains(&nb) {
                    continue;
                }
                if !self.is_interior(nb) {
                    return Err(MeshError::illegal(format!(
                        "merging into {region:?} would touch boundary face {nb:?}"
                    )));
                }
                if pred(self, nb) {
                    absorbed.insert(nb);
                    queue.push_back(nb);
                }
            }
        }
        if absorbed.is_empty() {
            return Ok(());
        }

        let in_region = |f: FaceId| -> bool { f == region || absorbed.contains(&f) };

        // Phase 2: the surviving cycle and each half-edge's successor on it.
        let mut cycle: Vec<HalfEdgeId> = Vec::new();
        for f in absorbed.iter().copied().chain(std::iter::once(region)) {
            for he in self.face_halfedges(f) {
                if !in_region(self.face_of(self.twin(he))) {
                    cycle.push(he);
                }
            }
        }
        if cycle.is_empty() {
            return Err(MeshError::illegal(format!(
                "merging into {region:?} would consume the entire mesh"
            )));
        }
        let cycle_set: HashSet<HalfEdgeId> = cycle.iter().copied().collect();

        let mut succ: HashMap<HalfEdgeId, HalfEdgeId> = HashMap::with_capacity(cycle.len());
        for &he in &cycle {
            let mut s = self.next(he);
            while !cycle_set.contains(&s) {
                debug_assert!(in_region(self.face_of(s)));
                s = self.next(self.twin(s));
            }
            succ.insert(he, s);
        }

        // Phase 3: validate before mutating. The cycle must be one simple
        // loop with no repeated vertices.
        let start = cycle[0];
        let mut origins: HashSet<VertexId> = HashSet::with_capacity(cycle.len());
        let mut he = start;
        let mut visited = 0usize;
        loop {
            if !origins.insert(self.origin(he)) {
                return Err(MeshError::illegal(format!(
                    "merging into {region:?} would pinch at vertex {:?}",
                    self.origin(he)
                )));
            }
            visited += 1;
            he = succ[&he];
            if he == start {
                break;
            }
        }
        if visited != cycle.len() {
            return Err(MeshError::illegal(format!(
                "merging into {region:?} would split the boundary into loops"
            )));
        }

        // Phase 4: rewire. Half-edges interior to the merged region die,
        // along with vertices not on the cycle.
        let mut dead_vertices: HashSet<VertexId> = HashSet::new();
        let mut dead_halfedges: Vec<HalfEdgeId> = Vec::new();
        for f in absorbed.iter().copied().chain(std::iter::once(region)) {
            for he in self.face_halfedges(f) {
                if in_region(self.face_of(self.twin(he))) {
                    dead_halfedges.push(he);
                    dead_vertices.insert(self.origin(he));
                }
            }
        }
        for &he in &cycle {
            dead_vertices.remove(&self.origin(he));
        }

        for &he in &cycle {
            let s = succ[&he];
            self.halfedge_mut(he).face = region;
            self.halfedge_mut(he).next = s;
            self.halfedge_mut(s).prev = he;
            let v = self.origin(he);
            self.vertex_mut(v).halfedge = he;
        }
        self.face_mut(region).halfedge = start;

        for he in dead_halfedges {
            self.destroy_halfedge(he);
        }
        for v in dead_vertices {
            self.destroy_vertex(v);
        }
        for f in absorbed {
            self.destroy_face(f);
        }

        Ok(())
    }

    /// Turn the interior face `seed` into a hole and grow it over every
    /// connected interior face satisfying `pred`.
    ///
    /// Fails without mutating if the hole would touch the border or another
    /// hole, or if growing it would break the mesh.
    pub fn create_hole<P>(&mut self, seed: FaceId, pred: P) -> Result<FaceId>
    where
        P: Fn(&Mesh, FaceId) -> bool,
    {
        debug_assert!(self.is_interior(seed));
        for he in self.face_halfedges(seed).collect::<Vec<_>>() {
            let nb = self.face_of(self.twin(he));
            if !self.is_interior(nb) {
                return Err(MeshError::illegal(format!(
                    "hole at {seed:?} would touch boundary face {nb:?}"
                )));
            }
        }

        self.face_mut(seed).kind = FaceKind::Hole;
        match self.merge_region(seed, pred) {
            Ok(()) => Ok(seed),
            Err(e) => {
                self.face_mut(seed).kind = FaceKind::Interior;
                Err(e)
            }
        }
    }

    /// Grow the border face over every connected interior face satisfying
    /// `pred`.
    pub fn shrink_border<P>(&mut self, pred: P) -> Result<()>
    where
        P: Fn(&Mesh, FaceId) -> bool,
    {
        let border = self.border;
        self.merge_region(border, pred)
    }
}

//! # Tessera
//!
//! A 2D triangle meshing library: a mutable half-edge mesh, an incremental
//! Delaunay triangulation with history-DAG point location, and an EikMesh
//! force-relaxation generator that produces high-quality meshes of domains
//! described by signed distance functions.
//!
//! ## Features
//!
//! - **Half-edge data structure**: O(1) adjacency queries with type-safe
//!   indices, explicit border and hole faces, in-place splits/flips/collapses
//! - **Incremental Delaunay triangulation**: expected O(log n) point
//!   location, worklist-based legalization, robust to duplicate and
//!   on-edge insertions
//! - **EikMesh generation**: force relaxation against a signed distance
//!   function and an edge-length field, with boundary projection, hole
//!   carving, and topology repair
//!
//! ## Quick Start
//!
//! ```
//! use tessera::prelude::*;
//! use nalgebra::Point2;
//!
//! // Triangulate a point set.
//! let points = vec![
//!     Point2::new(0.0, 0.0),
//!     Point2::new(1.0, 0.0),
//!     Point2::new(1.0, 1.0),
//!     Point2::new(0.0, 1.0),
//!     Point2::new(0.5, 0.5),
//! ];
//! let tri = Triangulation::from_points(&points).unwrap();
//! assert_eq!(tri.mesh().num_interior_faces(), 4);
//!
//! for [a, b, c] in tri.triangles() {
//!     println!("triangle {a} {b} {c}");
//! }
//! ```
//!
//! ## Mesh Generation
//!
//! ```no_run
//! use tessera::prelude::*;
//! use nalgebra::Point2;
//!
//! // A 2x1 corridor with a circular obstacle, meshed at edge length 0.05.
//! let bounds = Rect::new(Point2::new(0.0, 0.0), Point2::new(2.0, 1.0));
//! let domain = Subtract(bounds, Disc::new(Point2::new(1.0, 0.5), 0.25));
//!
//! let mesh = EikMesh::new(domain, Uniform, bounds, &[], EikMeshOptions::new(0.05))
//!     .unwrap()
//!     .generate()
//!     .unwrap();
//!
//! println!("vertices: {}", mesh.num_vertices());
//! println!("triangles: {}", mesh.num_interior_faces());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod field;
pub mod geometry;
pub mod mesh;
pub mod triangulation;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{EikMesh, EikMeshOptions};
    pub use crate::error::{MeshError, Result};
    pub use crate::field::{
        Disc, DistanceFunction, EdgeLengthFunction, Rect, Subtract, Uniform, Union,
    };
    pub use crate::mesh::{
        Face, FaceId, FaceKind, HalfEdge, HalfEdgeId, Mesh, Vertex, VertexId,
    };
    pub use crate::triangulation::Triangulation;
}

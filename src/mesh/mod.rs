//! Half-edge mesh data structure and structural operations.

pub mod halfedge;
pub mod index;
pub mod ops;

pub use halfedge::{Face, FaceKind, HalfEdge, Mesh, Vertex};
pub use index::{FaceId, HalfEdgeId, VertexId};
pub use ops::EdgeSplit;

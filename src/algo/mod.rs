//! Meshing algorithms built on the half-edge mesh.

pub mod eikmesh;
pub mod quality;

pub use eikmesh::{EikMesh, EikMeshOptions};

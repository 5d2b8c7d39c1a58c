//! Incremental Delaunay triangulation with history-DAG point location.

pub mod delaunay;
pub mod locate;

pub use delaunay::Triangulation;
pub use locate::PointLocator;

//! Node mesh construction, seam stitching and caching

pub mod vertex;
pub mod geometry;
pub mod seams;
pub mod cache;

pub use vertex::TerrainVertex;
pub use geometry::GeometryBuilder;
pub use seams::{SeamIndexCatalog, SIDE_BOTTOM, SIDE_LEFT, SIDE_RIGHT, SIDE_TOP};
pub use cache::{MeshCache, NodeMesh};

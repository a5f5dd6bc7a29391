//! Quadtree hierarchy and per-frame LOD selection

pub mod node;
pub mod tree;
pub mod collect;

pub use node::{ChildPos, MeshState, Node, Side, NO_NODE};
pub use tree::Quadtree;

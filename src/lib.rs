//! Terraquad - adaptive quadtree terrain LOD engine for large heightfields

pub mod core;
pub mod math;
pub mod heightfield;
pub mod mesh;
pub mod quadtree;
pub mod render;
pub mod terrain;

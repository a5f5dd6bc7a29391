//! Mathematical utilities and data structures

pub mod rect;
pub mod aabb;
pub mod frustum;

pub use rect::Rect;
pub use aabb::Aabb;
pub use frustum::{Frustum, Plane};

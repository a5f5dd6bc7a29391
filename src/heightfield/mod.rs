//! Height sample sources
//!
//! A terrain composites one or more height layers. Every source answers
//! samples over a square grid region at a given stride, using
//! [`INVALID_HEIGHT`] for cells outside its data.

pub mod source;
pub mod raw_file;
pub mod memory;

pub use source::{HeightSource, INVALID_HEIGHT};
pub use raw_file::{HeightFormat, RawHeightFile};
pub use memory::MemoryHeightSource;

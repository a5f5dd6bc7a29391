//! Height source sampling contract

use crate::core::types::Result;

/// Sentinel for "no data here"
///
/// Flows through layer compositing and normal estimation untouched, so a
/// source never needs to invent values outside its footprint.
pub const INVALID_HEIGHT: f32 = f32::MIN;

/// A square grid of height samples
///
/// Heightmaps are `2^n + 1` samples per side. Samples are normalized (the
/// terrain applies its own height scale) and laid out row-major, rows running
/// from the top border downward.
pub trait HeightSource {
    /// Side length of the square heightmap
    fn width(&self) -> u32;

    /// Fill `out` with `width * width` samples of the square region whose
    /// top-left grid corner is `(left, top)`, taking every `step`-th grid
    /// point. Cells outside the heightmap get [`INVALID_HEIGHT`].
    ///
    /// Returns an error only when the backing data cannot be read at all;
    /// out-of-bounds access is not an error.
    fn sample(
        &mut self,
        left: i32,
        top: i32,
        step: i32,
        width: usize,
        out: &mut [f32],
    ) -> Result<()>;
}

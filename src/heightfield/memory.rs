//! In-memory height source

use crate::core::error::Error;
use crate::core::types::Result;
use super::source::{HeightSource, INVALID_HEIGHT};

/// Height source backed by an in-memory grid
///
/// Useful for procedurally generated layers and for tests. Follows the same
/// sampling contract as the file-backed source: samples outside the grid
/// resolve to [`INVALID_HEIGHT`].
pub struct MemoryHeightSource {
    width: u32,
    data: Vec<f32>,
}

impl MemoryHeightSource {
    /// Create from row-major samples; `width` must be 2^n + 1
    pub fn new(width: u32, data: Vec<f32>) -> Result<Self> {
        if width < 2 || !(width - 1).is_power_of_two() {
            return Err(Error::HeightSource(format!(
                "heightmap side {} is not 2^n+1",
                width
            )));
        }
        if data.len() != (width * width) as usize {
            return Err(Error::HeightSource(format!(
                "expected {} samples, got {}",
                width * width,
                data.len()
            )));
        }
        Ok(Self { width, data })
    }

    /// Create a map of constant height
    pub fn flat(width: u32, height: f32) -> Result<Self> {
        Self::new(width, vec![height; (width * width) as usize])
    }

    /// Create from a height function of grid coordinates (x, z)
    pub fn from_fn<F: Fn(u32, u32) -> f32>(width: u32, f: F) -> Result<Self> {
        let mut data = Vec::with_capacity((width * width) as usize);
        for z in 0..width {
            for x in 0..width {
                data.push(f(x, z));
            }
        }
        Self::new(width, data)
    }
}

impl HeightSource for MemoryHeightSource {
    fn width(&self) -> u32 {
        self.width
    }

    fn sample(
        &mut self,
        left: i32,
        top: i32,
        step: i32,
        width: usize,
        out: &mut [f32],
    ) -> Result<()> {
        assert!(out.len() >= width * width);
        debug_assert!(step >= 1);

        let hm_width = self.width as i64;
        let mut cur = 0;
        for r in 0..width {
            let z = top as i64 + r as i64 * step as i64;
            for c in 0..width {
                let x = left as i64 + c as i64 * step as i64;
                out[cur] = if z >= 0 && z < hm_width && x >= 0 && x < hm_width {
                    self.data[(z * hm_width + x) as usize]
                } else {
                    INVALID_HEIGHT
                };
                cur += 1;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_width() {
        assert!(MemoryHeightSource::flat(6, 0.0).is_err());
        assert!(MemoryHeightSource::flat(0, 0.0).is_err());
    }

    #[test]
    fn test_rejects_wrong_sample_count() {
        assert!(MemoryHeightSource::new(5, vec![0.0; 24]).is_err());
    }

    #[test]
    fn test_sample_matches_grid() {
        let mut src = MemoryHeightSource::from_fn(5, |x, z| (z * 5 + x) as f32).unwrap();
        let mut out = vec![0.0; 9];
        src.sample(1, 2, 1, 3, &mut out).unwrap();
        assert_eq!(&out[..3], &[11.0, 12.0, 13.0]);
        assert_eq!(&out[3..6], &[16.0, 17.0, 18.0]);
    }

    #[test]
    fn test_padding_ring_is_invalid() {
        let mut src = MemoryHeightSource::flat(5, 1.0).unwrap();
        let mut out = vec![0.0; 49];
        src.sample(-1, -1, 1, 7, &mut out).unwrap();
        assert_eq!(out[0], INVALID_HEIGHT);
        assert_eq!(out[6], INVALID_HEIGHT);
        assert_eq!(out[48], INVALID_HEIGHT);
        assert_eq!(out[7 + 1], 1.0); // (0, 0) of the map
    }
}

//! Raw heightmap file source
//!
//! Reads headerless row-major heightmaps: 16-bit unsigned normalized or
//! 32-bit float little-endian. The map must be square with a `2^n + 1` side;
//! the side length is inferred from the file size.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::core::error::Error;
use crate::core::types::Result;
use super::source::{HeightSource, INVALID_HEIGHT};

/// Sample encoding of a raw heightmap file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeightFormat {
    /// Unsigned 16-bit, normalized to [0, 1]
    Raw16,
    /// 32-bit float, used as-is
    RawF32,
}

impl HeightFormat {
    fn bytes_per_sample(self) -> usize {
        match self {
            HeightFormat::Raw16 => 2,
            HeightFormat::RawF32 => 4,
        }
    }
}

/// Height source backed by a raw heightmap file
pub struct RawHeightFile {
    file: File,
    format: HeightFormat,
    width: u32,
    /// Reusable row read buffer
    row_buf: Vec<u8>,
}

impl RawHeightFile {
    /// Open a raw heightmap file
    ///
    /// The side length is inferred from the file size and must be a square
    /// `2^n + 1` map of at least `min_width` samples per side.
    pub fn open<P: AsRef<Path>>(path: P, format: HeightFormat, min_width: u32) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let len = file.metadata()?.len();

        let bps = format.bytes_per_sample() as u64;
        let width = ((len / bps) as f64).sqrt().round() as u64;
        if width * width * bps != len {
            return Err(Error::HeightSource(format!(
                "{}: file size {} is not a square {:?} map",
                path.as_ref().display(),
                len,
                format
            )));
        }
        if width < 2 || !(width - 1).is_power_of_two() || width < min_width as u64 {
            return Err(Error::HeightSource(format!(
                "{}: heightmap side {} is not 2^n+1 or is below the minimum {}",
                path.as_ref().display(),
                width,
                min_width
            )));
        }

        Ok(Self {
            file,
            format,
            width: width as u32,
            row_buf: Vec::new(),
        })
    }

    /// Read `count` samples of row `z` starting at column `x` into the row
    /// buffer. Caller guarantees the span is in bounds.
    fn read_span(&mut self, x: i64, z: i64, count: usize) -> Result<&[u8]> {
        let bps = self.format.bytes_per_sample();
        let pitch = self.width as i64 * bps as i64;
        let offset = z * pitch + x * bps as i64;

        let bytes = count * bps;
        if self.row_buf.len() < bytes {
            self.row_buf.resize(bytes, 0);
        }

        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.read_exact(&mut self.row_buf[..bytes])?;
        Ok(&self.row_buf[..bytes])
    }
}

impl HeightSource for RawHeightFile {
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
        let format = self.format;
        let bps = format.bytes_per_sample();

        // Contiguous rows can be read in one pass
        let fast_row = step == 1 && left >= 0 && left as i64 + width as i64 <= hm_width;

        let mut cur = 0;
        for r in 0..width {
            let z = top as i64 + r as i64 * step as i64;

            if z < 0 || z >= hm_width {
                out[cur..cur + width].fill(INVALID_HEIGHT);
                cur += width;
            } else if fast_row {
                let row = self.read_span(left as i64, z, width)?;
                for c in 0..width {
                    out[cur + c] = decode_sample(format, &row[c * bps..(c + 1) * bps]);
                }
                cur += width;
            } else {
                let mut x = left as i64;
                for _ in 0..width {
                    if x >= 0 && x < hm_width {
                        let span = self.read_span(x, z, 1)?;
                        out[cur] = decode_sample(format, span);
                    } else {
                        out[cur] = INVALID_HEIGHT;
                    }
                    cur += 1;
                    x += step as i64;
                }
            }
        }

        Ok(())
    }
}

fn decode_sample(format: HeightFormat, bytes: &[u8]) -> f32 {
    match format {
        HeightFormat::Raw16 => {
            u16::from_le_bytes([bytes[0], bytes[1]]) as f32 * (1.0 / 65535.0)
        }
        HeightFormat::RawF32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

//! Node mesh construction from height layers
//!
//! Builds a node's local-space vertex buffer by sampling the height layers
//! one ring wider than the node footprint, so border normals are computed
//! from real neighbor data instead of guesses. Layers composite in
//! registration order: layer 0 supplies the base height, later layers
//! overwrite only where they have valid data.

use crate::core::types::{Result, Vec3};
use crate::heightfield::{HeightSource, INVALID_HEIGHT};
use super::vertex::TerrainVertex;

/// Reusable scratch buffers for the padded working mesh
///
/// All nodes share one inborn-LOD vertex count, so in practice these are
/// allocated once and reused for every build.
#[derive(Default)]
struct Scratch {
    /// Vertex count per padded row; 0 until first use
    width: usize,
    /// Composited heights of the padded grid
    heights: Vec<f32>,
    /// Raw heights of the layer currently being composited
    layer_heights: Vec<f32>,
    /// Padded working vertices (positions and normals)
    verts: Vec<TerrainVertex>,
}

/// Builds node meshes by sampling and compositing height layers
pub struct GeometryBuilder {
    layers: Vec<Box<dyn HeightSource>>,
    scratch: Scratch,
}

impl GeometryBuilder {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            scratch: Scratch::default(),
        }
    }

    /// Register a height layer. Later layers override earlier ones where
    /// they report valid data.
    pub fn add_layer(&mut self, layer: Box<dyn HeightSource>) {
        self.layers.push(layer);
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Side length of the first registered layer's heightmap
    pub fn heightmap_width(&self) -> Option<u32> {
        self.layers.first().map(|l| l.width())
    }

    /// Build the mesh for a node footprint
    ///
    /// `left`, `top`: heightmap grid coords of the node's top-left corner.
    /// `step`: grids between two sampled points. `width`: vertices per
    /// row/column of the output. `out` must hold `width * width` vertices.
    ///
    /// Returns the (min, max) height of the produced vertices.
    pub fn build_node_mesh(
        &mut self,
        left: i32,
        top: i32,
        step: i32,
        width: usize,
        grid_size: i32,
        height_scale: f32,
        out: &mut [TerrainVertex],
    ) -> Result<(f32, f32)> {
        assert!(out.len() >= width * width);

        // One extra ring on every side for border normals
        let padded = width + 2;
        self.ensure_scratch(padded);
        self.sample_heights(left - step, top - step, step, padded, height_scale)?;

        let step_size = (step * grid_size) as f32;

        // Positions on the padded grid
        let mut cur = 0;
        for r in 0..padded {
            let z = -(r as f32) * step_size;
            for c in 0..padded {
                self.scratch.verts[cur].pos = [c as f32 * step_size, self.scratch.heights[cur], z];
                cur += 1;
            }
        }

        // Normals for the interior of the padded grid
        for r in 1..padded - 1 {
            for c in 1..padded - 1 {
                let center = r * padded + c;
                let stencil = [
                    self.scratch.verts[center].pos[1],
                    self.scratch.verts[center - 1].pos[1],
                    self.scratch.verts[center - padded].pos[1],
                    self.scratch.verts[center + 1].pos[1],
                    self.scratch.verts[center + padded].pos[1],
                ];
                let n = normal_from_stencil(&stencil, step_size);
                self.scratch.verts[center].normal = [n.x, n.y, n.z];
            }
        }

        // Copy the interior into the caller's buffer, re-based to the node's
        // true local-space offset (undoing the one-step padding shift)
        let off_x = (left * grid_size) as f32 - step_size;
        let off_z = -(top * grid_size) as f32 + step_size;
        let inv_width = 1.0 / (width as f32 - 1.0);

        let mut min_y = f32::MAX;
        let mut max_y = f32::MIN;
        let mut dst = 0;
        for r in 1..padded - 1 {
            let mut src = r * padded + 1;
            let v = (r - 1) as f32 * inv_width;

            for c in 1..padded - 1 {
                let sp = self.scratch.verts[src].pos;
                let y = sp[1];
                out[dst] = TerrainVertex {
                    pos: [sp[0] + off_x, y, sp[2] + off_z],
                    normal: self.scratch.verts[src].normal,
                    uv: [(c - 1) as f32 * inv_width, v],
                };

                if y < min_y {
                    min_y = y;
                }
                if y > max_y {
                    max_y = y;
                }

                src += 1;
                dst += 1;
            }
        }

        debug_assert_eq!(dst, width * width);

        Ok((min_y, max_y))
    }

    /// Composite all layers into the scratch height buffer
    fn sample_heights(
        &mut self,
        left: i32,
        top: i32,
        step: i32,
        width: usize,
        height_scale: f32,
    ) -> Result<()> {
        let count = width * width;

        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.sample(left, top, step, width, &mut self.scratch.layer_heights)?;

            if i == 0 {
                // Base layer
                for j in 0..count {
                    let h = self.scratch.layer_heights[j];
                    self.scratch.heights[j] = if h != INVALID_HEIGHT {
                        h * height_scale
                    } else {
                        INVALID_HEIGHT
                    };
                }
            } else {
                // Higher layers punch through lower ones where valid
                for j in 0..count {
                    let h = self.scratch.layer_heights[j];
                    if h != INVALID_HEIGHT {
                        self.scratch.heights[j] = h * height_scale;
                    }
                }
            }
        }

        Ok(())
    }

    /// Size scratch buffers for a padded width; reallocates only on change
    fn ensure_scratch(&mut self, width: usize) {
        if self.scratch.width == width {
            return;
        }

        let count = width * width;
        self.scratch.width = width;
        self.scratch.heights = vec![0.0; count];
        self.scratch.layer_heights = vec![0.0; count];
        self.scratch.verts = vec![TerrainVertex::default(); count];
    }
}

impl Default for GeometryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Normal from the 4-neighbor height stencil [center, left, top, right, bottom]
///
/// An invalid neighbor is replaced by the center height and the corresponding
/// difference doubled, compensating for the halved baseline.
fn normal_from_stencil(h: &[f32; 5], step_size: f32) -> Vec3 {
    let center = h[0];
    let left = if h[1] == INVALID_HEIGHT { center } else { h[1] };
    let top = if h[2] == INVALID_HEIGHT { center } else { h[2] };
    let right = if h[3] == INVALID_HEIGHT { center } else { h[3] };
    let bottom = if h[4] == INVALID_HEIGHT { center } else { h[4] };

    let mut dx = left - right;
    if h[1] == INVALID_HEIGHT || h[3] == INVALID_HEIGHT {
        dx *= 2.0;
    }

    let mut dz = bottom - top;
    if h[2] == INVALID_HEIGHT || h[4] == INVALID_HEIGHT {
        dz *= 2.0;
    }

    Vec3::new(dx, step_size * 2.0, dz).normalize()
}

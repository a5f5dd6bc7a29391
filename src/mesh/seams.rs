//! Precomputed seam-stitching index buffers
//!
//! A node rendering next to a coarser neighbor would leave T-junction cracks
//! along the shared border: the fine side owns mid-edge vertices the coarse
//! side never touches. Instead of moving vertices, every border case gets its
//! own triangle index list: on a seam border, each pair of boundary vertices
//! is bridged by one triangle whose apex is the shared coarse-side vertex,
//! which removes the mid-edge vertex from the triangulation. The vertex
//! buffer itself never changes.
//!
//! Two families are precomputed once:
//! - inborn: a node rendering its own mesh, 9 canonical seam cases
//!   (no seam, 4 single borders, 4 corner pairs);
//! - grade-up: a node borrowing one quadrant of its parent's mesh, the same
//!   9 cases for each of the 4 child quadrants, indexing into the parent's
//!   vertex buffer.
//!
//! Interior cells use an alternating diagonal pattern so adjacent cells'
//! diagonals flip orientation, which avoids ridging artifacts on the
//! regular grid.

use crate::core::error::Error;
use crate::core::types::Result;
use crate::quadtree::node::ChildPos;

/// Border flag: left side faces a coarser neighbor
pub const SIDE_LEFT: u8 = 0x01;
/// Border flag: top side faces a coarser neighbor
pub const SIDE_TOP: u8 = 0x02;
/// Border flag: right side faces a coarser neighbor
pub const SIDE_RIGHT: u8 = 0x04;
/// Border flag: bottom side faces a coarser neighbor
pub const SIDE_BOTTOM: u8 = 0x08;

/// Canonical seam cases, in catalog order
const CASE_COUNT: usize = 9;

/// Maps a raw 4-bit side mask to its canonical case, -1 for combinations
/// the LOD traversal can never produce (opposite or triple borders).
const MASK_TO_CASE: [i8; 16] = [
    0,  // no seam
    1,  // L
    2,  // T
    5,  // L|T
    3,  // R
    -1, // L|R
    6,  // R|T
    -1, // L|T|R
    4,  // B
    7,  // L|B
    -1, // T|B
    -1, // L|T|B
    8,  // R|B
    -1, // L|R|B
    -1, // T|R|B
    -1, // all
];

/// The side masks of the 9 canonical cases, in catalog order
const CASE_MASKS: [u8; CASE_COUNT] = [
    0,
    SIDE_LEFT,
    SIDE_TOP,
    SIDE_RIGHT,
    SIDE_BOTTOM,
    SIDE_LEFT | SIDE_TOP,
    SIDE_RIGHT | SIDE_TOP,
    SIDE_LEFT | SIDE_BOTTOM,
    SIDE_RIGHT | SIDE_BOTTOM,
];

/// All seam index buffers for one node mesh resolution
pub struct SeamIndexCatalog {
    /// Buffers for nodes rendering their own mesh
    inborn: Vec<Vec<u32>>,
    /// Buffers for grade-up rendering, per child quadrant
    grade_up: [Vec<Vec<u32>>; 4],
    leaf_grid_size: u32,
}

impl SeamIndexCatalog {
    /// Precompute every seam buffer for meshes of `leaf_grid_size` cells
    /// per side.
    ///
    /// The size must be a power of two in (2, 256); the upper bound keeps
    /// the buffers friendly to 16-bit indices should a backend want them.
    pub fn new(leaf_grid_size: u32) -> Result<Self> {
        if leaf_grid_size <= 2 || leaf_grid_size >= 256 || !leaf_grid_size.is_power_of_two() {
            return Err(Error::Config(format!(
                "leaf_grid_size must be a power of two in (2, 256), got {}",
                leaf_grid_size
            )));
        }

        let grid_width = leaf_grid_size as i32;
        let vert_pitch = grid_width + 1;

        let inborn = CASE_MASKS
            .iter()
            .map(|&mask| create_index_buffer(grid_width, vert_pitch, 0, mask))
            .collect();

        // A grade-up mesh covers one quadrant of the parent's vertex buffer
        let half = grid_width / 2;
        debug_assert!(half > 0);
        let quadrant_base = [0, half, half * vert_pitch, half * vert_pitch + half];

        let grade_up = quadrant_base.map(|base| {
            CASE_MASKS
                .iter()
                .map(|&mask| create_index_buffer(half, vert_pitch, base, mask))
                .collect()
        });

        Ok(Self {
            inborn,
            grade_up,
            leaf_grid_size,
        })
    }

    /// Cells per side the catalog was built for
    pub fn leaf_grid_size(&self) -> u32 {
        self.leaf_grid_size
    }

    /// Look up the index buffer for a side mask
    ///
    /// `child_pos` selects the grade-up family (a node borrowing that
    /// quadrant of its parent's mesh); `None` selects the inborn family.
    ///
    /// # Panics
    ///
    /// Panics on a side mask the LOD traversal cannot produce; reaching one
    /// means the hierarchy math is broken.
    pub fn index_buffer(&self, side_mask: u8, child_pos: Option<ChildPos>) -> &[u32] {
        let case = MASK_TO_CASE[(side_mask & 0x0f) as usize];
        assert!(case >= 0, "unreachable side mask {:#06b}", side_mask);

        match child_pos {
            Some(pos) => &self.grade_up[pos as usize][case as usize],
            None => &self.inborn[case as usize],
        }
    }
}

/// Build one triangle index list for a `grid_width` x `grid_width` block of
/// cells whose top-left vertex has index `lt_base` in a vertex buffer with
/// `vert_pitch` vertices per row.
fn create_index_buffer(grid_width: i32, vert_pitch: i32, lt_base: i32, side_mask: u8) -> Vec<u32> {
    let max_indices = (grid_width * grid_width * 6) as usize;
    let mut indices: Vec<u32> = Vec::with_capacity(max_indices);

    // Interior cells first; the outermost cell ring belongs to the borders
    let center_cells = grid_width - 2;
    let mut row_start = lt_base + vert_pitch + 1;
    for r in 0..center_cells {
        let mut lt = row_start;

        for c in 0..center_cells {
            if (r & 1) == (c & 1) {
                // Diagonal from left-top to right-bottom
                push_tri(&mut indices, lt, lt + 1, lt + vert_pitch + 1);
                push_tri(&mut indices, lt, lt + vert_pitch + 1, lt + vert_pitch);
            } else {
                // Diagonal flipped
                push_tri(&mut indices, lt, lt + 1, lt + vert_pitch);
                push_tri(&mut indices, lt + 1, lt + vert_pitch + 1, lt + vert_pitch);
            }

            lt += 1;
        }

        row_start += vert_pitch;
    }

    // Each border walks its edge in its own frame: x_step runs along the
    // edge, z_step points one row inward. Winding stays consistent because
    // the frames rotate with the border.
    let top_left = lt_base;
    let bottom_left = lt_base + grid_width * vert_pitch;
    let top_right = lt_base + grid_width;
    let bottom_right = bottom_left + grid_width;

    fill_border(&mut indices, grid_width, top_left, 1, vert_pitch, side_mask & SIDE_TOP != 0);
    fill_border(&mut indices, grid_width, bottom_left, -vert_pitch, 1, side_mask & SIDE_LEFT != 0);
    fill_border(&mut indices, grid_width, top_right, vert_pitch, -1, side_mask & SIDE_RIGHT != 0);
    fill_border(&mut indices, grid_width, bottom_right, -1, -vert_pitch, side_mask & SIDE_BOTTOM != 0);

    debug_assert!(indices.len() <= max_indices);

    indices
}

/// Fill triangles for one border of the block
///
/// `start` is the vertex where the border's walk begins; `x_step` advances
/// along the edge, `z_step` points one row toward the interior.
fn fill_border(
    indices: &mut Vec<u32>,
    grid_width: i32,
    start: i32,
    x_step: i32,
    z_step: i32,
    grade_up: bool,
) {
    let half = grid_width >> 1;

    let mut base = start;
    if grade_up {
        // Seam border: bridge each pair of edge vertices with one triangle
        // whose apex is the shared coarse-side vertex two steps along, so the
        // mid-edge vertex drops out of the triangulation.
        for _ in 0..half {
            push_tri(indices, base, base + x_step * 2, base + z_step + x_step);
            base += x_step * 2;
        }
    } else {
        // Full-resolution border
        for _ in 0..half {
            push_tri(indices, base, base + x_step, base + z_step + x_step);
            push_tri(indices, base + x_step, base + x_step * 2, base + z_step + x_step);
            base += x_step * 2;
        }
    }

    // Inner fan row connecting the border strip to the interior
    base = start + x_step * 2;
    for _ in 0..half - 1 {
        push_tri(indices, base, base + z_step, base + z_step - x_step);
        push_tri(indices, base, base + z_step + x_step, base + z_step);
        base += x_step * 2;
    }
}

fn push_tri(indices: &mut Vec<u32>, a: i32, b: i32, c: i32) {
    debug_assert!(a >= 0 && b >= 0 && c >= 0);
    indices.push(a as u32);
    indices.push(b as u32);
    indices.push(c as u32);
}

//! Renderer seam
//!
//! The engine produces draw records; what happens to them is the backend's
//! business. A record borrows the mesh's vertex buffer and the shared seam
//! index buffer for exactly the duration of the callback, so a GPU backend
//! can upload or bind without copies and a headless consumer can just take
//! the counts.

use crate::core::types::Mat4;
use crate::math::{Aabb, Frustum};
use crate::mesh::TerrainVertex;

/// One node's draw data for the current frame
///
/// `vertices` is the node's (or, for grade-up draws, its parent's) vertex
/// buffer; `indices` is the shared seam index buffer selected for this
/// frame's neighbour grades.
pub struct DrawRecord<'a> {
    pub node_index: u32,
    /// Resolved LOD grade of the drawn area
    pub area_lod: i8,
    /// World-space bounds with the mesh's real height range
    pub aabb: Aabb,
    pub vertices: &'a [TerrainVertex],
    pub indices: &'a [u32],
}

/// Backend receiving the frame's draw records
pub trait TerrainRenderer {
    fn push_draw_data(&mut self, record: DrawRecord<'_>);
}

/// Culling volume for a camera, in world space
pub fn frustum_from_camera(view: &Mat4, projection: &Mat4) -> Frustum {
    Frustum::from_view_projection(&(*projection * *view))
}

/// Retained metadata of one emitted draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub node_index: u32,
    pub area_lod: i8,
    pub aabb: Aabb,
    pub vertex_count: u32,
    pub index_count: u32,
}

/// Renderer that retains draw metadata instead of drawing
///
/// The built-in consumer for headless use and tests; rebuild it (or `clear`
/// it) each frame.
#[derive(Debug, Default)]
pub struct DrawList {
    calls: Vec<DrawCall>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Total indices across all draws, a rough triangle budget for the frame
    pub fn total_index_count(&self) -> u64 {
        self.calls.iter().map(|c| c.index_count as u64).sum()
    }
}

impl TerrainRenderer for DrawList {
    fn push_draw_data(&mut self, record: DrawRecord<'_>) {
        self.calls.push(DrawCall {
            node_index: record.node_index,
            area_lod: record.area_lod,
            aabb: record.aabb,
            vertex_count: record.vertices.len() as u32,
            index_count: record.indices.len() as u32,
        });
    }
}

/// Debug tint per LOD grade, cycling for grades past the table
pub fn lod_debug_color(area_lod: i8) -> [f32; 4] {
    const COLORS: [[f32; 4]; 6] = [
        [1.0, 1.0, 1.0, 1.0],
        [0.2, 0.8, 0.2, 1.0],
        [0.2, 0.4, 0.9, 1.0],
        [0.9, 0.9, 0.2, 1.0],
        [0.9, 0.4, 0.2, 1.0],
        [0.9, 0.2, 0.8, 1.0],
    ];
    COLORS[(area_lod.max(0) as usize) % COLORS.len()]
}

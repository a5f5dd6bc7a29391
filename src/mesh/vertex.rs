//! Terrain vertex layout

use bytemuck::{Pod, Zeroable};

/// One terrain mesh vertex, laid out for direct GPU upload
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Vertex stride in bytes
pub const VERTEX_STRIDE: usize = std::mem::size_of::<TerrainVertex>();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride() {
        assert_eq!(VERTEX_STRIDE, 32);
    }

    #[test]
    fn test_pod_cast() {
        let verts = [TerrainVertex::default(); 4];
        let bytes: &[u8] = bytemuck::cast_slice(&verts);
        assert_eq!(bytes.len(), 4 * VERTEX_STRIDE);
    }
}

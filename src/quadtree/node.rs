//! Quadtree node record
//!
//! A grand terrain (32K x 32K grids) has over a million nodes, so the record
//! stays compact: plain integer indices into the node arena instead of
//! pointers, and small field types throughout. Static fields are written
//! once at build time; the per-frame fields are overwritten by every LOD
//! update.

use crate::core::types::Vec2;
use crate::math::Rect;

/// Sentinel index for "no node"
pub const NO_NODE: u32 = u32::MAX;

/// Position of a child node within its parent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ChildPos {
    LeftTop = 0,
    RightTop = 1,
    LeftBottom = 2,
    RightBottom = 3,
}

impl ChildPos {
    pub const ALL: [ChildPos; 4] = [
        ChildPos::LeftTop,
        ChildPos::RightTop,
        ChildPos::LeftBottom,
        ChildPos::RightBottom,
    ];

    pub fn from_index(i: usize) -> Option<ChildPos> {
        Self::ALL.get(i).copied()
    }
}

/// Sides of a node, also the order of the neighbour array
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Side {
    Left = 0,
    Top = 1,
    Right = 2,
    Bottom = 3,
}

/// The mesh state a node should have, recomputed from scratch every LOD
/// update
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MeshState {
    /// No mesh needed; any loaded mesh may be dropped
    #[default]
    ToUnload,
    /// Render the node's own inborn-LOD mesh
    LoadInborn,
    /// Keep the mesh loaded so children can borrow quadrants of it
    LoadForChild,
    /// Render using a quadrant of the parent's mesh
    GradeUp,
}

/// One quadtree cell
#[derive(Clone, Copy, Debug)]
pub struct Node {
    /// This node's index in the arena
    pub index: u32,
    /// Parent index, NO_NODE for the root
    pub parent: u32,
    /// Child indices in [`ChildPos`] order, NO_NODE on leaves
    pub children: [u32; 4],
    /// Same-depth neighbour indices in [`Side`] order, NO_NODE at terrain
    /// edges
    pub neighbour: [u32; 4],
    /// Left border of the node's area in heightmap grids
    pub area_left: i32,
    /// Top border of the node's area in heightmap grids
    pub area_top: i32,
    /// Side length of the square node area in heightmap grids
    pub area_size: u32,
    /// Grids between two adjacent mesh vertices; set only on drawable nodes
    pub grid_step: u16,
    /// Position in the parent, -1 for the root
    pub child_pos: i8,
    /// Inborn LOD grade; -1 means this node never has a mesh of its own,
    /// leaves are always grade 0
    pub inborn_lod: i8,

    // Per-frame fields
    /// Update counter value of the last LOD pass that visited this node
    pub update_cnt: u32,
    /// Mesh state decided by the last LOD pass
    pub mesh_state: MeshState,
    /// Node lies beyond the view distance
    pub out_of_range: bool,
    /// LOD grade actually in effect; may be inherited from an ancestor, -1
    /// when unresolved
    pub area_lod: i8,
}

impl Node {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            parent: NO_NODE,
            children: [NO_NODE; 4],
            neighbour: [NO_NODE; 4],
            area_left: 0,
            area_top: 0,
            area_size: 0,
            grid_step: 0,
            child_pos: -1,
            inborn_lod: -1,
            update_cnt: 0,
            mesh_state: MeshState::ToUnload,
            out_of_range: true,
            area_lod: -1,
        }
    }

    /// A node is a leaf iff its inborn grade is 0
    pub fn is_leaf(&self) -> bool {
        self.inborn_lod == 0
    }

    pub fn child_pos(&self) -> Option<ChildPos> {
        if self.child_pos >= 0 {
            ChildPos::from_index(self.child_pos as usize)
        } else {
            None
        }
    }

    /// Node footprint in terrain local space
    ///
    /// x grows right from the left border; z runs negative from the top
    /// border downward, so the rect's max.y is the top edge.
    pub fn local_area(&self, grid_size: i32) -> Rect {
        let left = (self.area_left * grid_size) as f32;
        let top = (-self.area_top * grid_size) as f32;
        let size = (self.area_size as i32 * grid_size) as f32;
        Rect::new(
            Vec2::new(left, top - size),
            Vec2::new(left + size, top),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_inert() {
        let node = Node::new(5);
        assert_eq!(node.index, 5);
        assert_eq!(node.parent, NO_NODE);
        assert!(!node.is_leaf());
        assert_eq!(node.child_pos(), None);
        assert_eq!(node.mesh_state, MeshState::ToUnload);
    }

    #[test]
    fn test_local_area_orientation() {
        let mut node = Node::new(0);
        node.area_left = 8;
        node.area_top = 16;
        node.area_size = 4;

        let rc = node.local_area(2);
        assert_eq!(rc.min.x, 16.0);
        assert_eq!(rc.max.x, 24.0);
        assert_eq!(rc.max.y, -32.0); // top edge
        assert_eq!(rc.min.y, -40.0); // bottom edge
    }

    #[test]
    fn test_child_pos_round_trip() {
        for (i, pos) in ChildPos::ALL.iter().enumerate() {
            assert_eq!(ChildPos::from_index(i), Some(*pos));
        }
        assert_eq!(ChildPos::from_index(4), None);
    }
}

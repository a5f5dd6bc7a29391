//! Quadtree construction and per-frame LOD selection
//!
//! The whole hierarchy lives in one flat node arena sized exactly from the
//! closed-form node count, allocated once and never resized. Static fields
//! (areas, parent/child/neighbour links, inborn grades) are written at build
//! time; `update_lod` rewrites only the per-frame fields.

use crate::core::config::TerrainConfig;
use crate::core::error::Error;
use crate::core::types::{Result, Vec3};
use crate::mesh::MeshCache;
use super::node::{ChildPos, MeshState, Node, Side, NO_NODE};

/// Hard cap on LOD grades; 32 grades would already cover absurd terrain
/// sizes
const MAX_LOD_GRADES: usize = 32;

/// Quadtree over a square heightmap
pub struct Quadtree {
    nodes: Vec<Node>,
    hm_size: u32,

    /// Distance threshold per LOD grade; index 0 is negative infinity
    lod_dists: Vec<f32>,
    update_cnt: u32,
    update_center: Vec3,
}

impl Quadtree {
    /// Build the full hierarchy for a heightmap of `hm_size` samples per
    /// side
    pub fn new(config: &TerrainConfig, hm_size: u32) -> Result<Self> {
        config.validate()?;

        if hm_size < 2 || !(hm_size - 1).is_power_of_two() {
            return Err(Error::Config(format!(
                "heightmap size must be 2^n+1, got {}",
                hm_size
            )));
        }
        if hm_size - 1 < config.leaf_grid_size {
            return Err(Error::Config(format!(
                "heightmap of {} grids is smaller than one leaf ({})",
                hm_size - 1,
                config.leaf_grid_size
            )));
        }

        let node_count = node_count_for(hm_size, config.leaf_grid_size);
        if node_count > u32::MAX as u64 {
            return Err(Error::Config(format!(
                "terrain would need {} nodes",
                node_count
            )));
        }

        let mut tree = Self {
            nodes: (0..node_count as u32).map(Node::new).collect(),
            hm_size,
            lod_dists: Vec::new(),
            update_cnt: 0,
            update_center: Vec3::ZERO,
        };

        // Root covers the whole heightmap
        tree.nodes[0].area_left = 0;
        tree.nodes[0].area_top = 0;
        tree.nodes[0].area_size = hm_size - 1;

        let mut next_free: u32 = 1;
        tree.build_node(0, -1, &mut next_free, config);

        if next_free as u64 != node_count {
            // The subdivision produced a different node count than the
            // closed form; the hierarchy math is broken
            debug_assert_eq!(next_free as u64, node_count);
            return Err(Error::Internal(format!(
                "built {} nodes, expected {}",
                next_free, node_count
            )));
        }

        tree.build_neighbours(0);

        Ok(tree)
    }

    /// Heightmap samples per side this tree was built for
    pub fn heightmap_size(&self) -> u32 {
        self.hm_size
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, index: u32) -> &Node {
        &self.nodes[index as usize]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Value of the update counter written to nodes visited by the last
    /// `update_lod` pass
    pub fn update_count(&self) -> u32 {
        self.update_cnt
    }

    /// Subdivide a node, then assign its inborn grade bottom-up
    fn build_node(&mut self, index: usize, child_pos: i8, next_free: &mut u32, config: &TerrainConfig) {
        self.nodes[index].child_pos = child_pos;

        let area_left = self.nodes[index].area_left;
        let area_top = self.nodes[index].area_top;
        let area_size = self.nodes[index].area_size;

        if area_size <= config.leaf_grid_size {
            // Power-of-two subdivision lands exactly on the leaf size
            debug_assert_eq!(area_size, config.leaf_grid_size);
            self.nodes[index].inborn_lod = 0;
            self.nodes[index].grid_step = 1;
            return;
        }

        let half = area_size / 2;

        // Split into 4 children: bit 0 selects the right half, bit 1 the
        // bottom half
        for i in 0..4 {
            let child_index = *next_free;
            *next_free += 1;

            let child = &mut self.nodes[child_index as usize];
            child.parent = index as u32;
            child.area_left = area_left + if i & 0x01 != 0 { half as i32 } else { 0 };
            child.area_top = area_top + if i & 0x02 != 0 { half as i32 } else { 0 };
            child.area_size = half;

            self.nodes[index].children[i] = child_index;
        }

        let children = self.nodes[index].children;
        for (i, &child) in children.iter().enumerate() {
            self.build_node(child as usize, i as i8, next_free, config);
        }

        // Nodes small enough to be drawn whole get a mesh grade one above
        // their children (all four share the same grade by construction)
        if area_size <= config.max_drawn_node_grid_size {
            let child_lod = self.nodes[children[0] as usize].inborn_lod;
            let node = &mut self.nodes[index];
            node.inborn_lod = child_lod + 1;
            node.grid_step = 1u16 << node.inborn_lod;
            debug_assert_eq!(config.leaf_grid_size, area_size / node.grid_step as u32);
        }
    }

    /// Resolve one neighbour slot through the parent: the neighbour is the
    /// matching child of the parent's neighbour on that side, or NO_NODE at
    /// a terrain edge.
    fn parent_neighbour_child(&self, parent: &Node, side: Side, child: ChildPos) -> u32 {
        let parent_nbr = parent.neighbour[side as usize];
        if parent_nbr != NO_NODE {
            self.nodes[parent_nbr as usize].children[child as usize]
        } else {
            NO_NODE
        }
    }

    /// Link same-depth neighbours, depth-first
    ///
    /// Each quadrant takes two of its four neighbours directly from
    /// siblings and two through the parent's same-side neighbour's
    /// diagonally opposite child.
    fn build_neighbours(&mut self, index: usize) {
        let node = self.nodes[index];

        if node.parent != NO_NODE {
            let parent = self.nodes[node.parent as usize];
            let sibling = |pos: ChildPos| parent.children[pos as usize];

            use ChildPos::*;
            use Side::*;

            let links = match node.child_pos().expect("non-root node without child_pos") {
                LeftTop => [
                    self.parent_neighbour_child(&parent, Left, RightTop),
                    self.parent_neighbour_child(&parent, Top, LeftBottom),
                    sibling(RightTop),
                    sibling(LeftBottom),
                ],
                RightTop => [
                    sibling(LeftTop),
                    self.parent_neighbour_child(&parent, Top, RightBottom),
                    self.parent_neighbour_child(&parent, Right, LeftTop),
                    sibling(RightBottom),
                ],
                LeftBottom => [
                    self.parent_neighbour_child(&parent, Left, RightBottom),
                    sibling(LeftTop),
                    sibling(RightBottom),
                    self.parent_neighbour_child(&parent, Bottom, LeftTop),
                ],
                RightBottom => [
                    sibling(LeftBottom),
                    sibling(RightTop),
                    self.parent_neighbour_child(&parent, Right, LeftBottom),
                    self.parent_neighbour_child(&parent, Bottom, RightTop),
                ],
            };

            self.nodes[index].neighbour = links;
        }

        if !node.is_leaf() {
            for child in self.nodes[index].children {
                self.build_neighbours(child as usize);
            }
        }
    }

    /// Recompute the LOD grade distance table
    ///
    /// `dist[0]` is negative infinity so grade 0 always matches; each
    /// further grade multiplies the base distance by the configured ratio.
    /// The drawable size is capped at the root's area so every reachable
    /// grade maps onto a node that exists.
    fn rebuild_lod_dists(&mut self, config: &TerrainConfig) {
        self.lod_dists.clear();
        self.lod_dists.push(f32::MIN);

        let mut size = config.leaf_grid_size;
        let max = config.max_drawn_node_grid_size.min(self.hm_size - 1);
        let mut dist = config.lod_base_dist;
        while size < max {
            debug_assert!(self.lod_dists.len() < MAX_LOD_GRADES);
            self.lod_dists.push(dist);
            size <<= 1;
            dist *= config.lod_ratio;
        }
    }

    /// Number of distinct LOD grades after the last `update_lod`
    pub fn lod_grade_count(&self) -> usize {
        self.lod_dists.len()
    }

    /// Update the LOD state of every node for a view center given in the
    /// terrain's local space
    ///
    /// Nodes resolving to a drawable state request their mesh from the
    /// cache (building it synchronously on a miss).
    pub fn update_lod(&mut self, center: Vec3, config: &TerrainConfig, meshes: &mut MeshCache) {
        self.update_cnt = self.update_cnt.wrapping_add(1);
        self.rebuild_lod_dists(config);
        self.update_center = center;

        self.update_node(0, -1, config, meshes);
    }

    fn update_node(&mut self, index: usize, inherited_lod: i8, config: &TerrainConfig, meshes: &mut MeshCache) {
        self.nodes[index].update_cnt = self.update_cnt;
        self.nodes[index].area_lod = inherited_lod;
        self.nodes[index].out_of_range = false;

        let node = self.nodes[index];
        let rc = node.local_area(config.grid_size);

        // Signed distance from the view center to the footprint's nearest
        // edge on the dominant axis; negative when the center is over the
        // footprint
        let dist_x = ((rc.min.x + rc.max.x) * 0.5 - self.update_center.x).abs() - rc.width() * 0.5;
        let dist_z = ((rc.min.y + rc.max.y) * 0.5 - self.update_center.z).abs() - rc.height() * 0.5;
        let check_dist = dist_x.max(dist_z);

        if check_dist > config.view_distance {
            self.nodes[index].out_of_range = true;

            // Stop descending only when this node AND its parent are out of
            // range; requiring both keeps nodes sitting right on the view
            // distance border from flashing
            if node.parent != NO_NODE && self.nodes[node.parent as usize].out_of_range {
                self.nodes[index].mesh_state = MeshState::ToUnload;
                return;
            }
        }

        if node.inborn_lod < 0 {
            // Too big to draw whole; only its children can render
            self.nodes[index].mesh_state = MeshState::ToUnload;
            debug_assert!(!node.is_leaf());

            for child in node.children {
                self.update_node(child as usize, inherited_lod, config, meshes);
            }
        } else if inherited_lod >= 0 {
            // An ancestor's mesh covers this area. Children are not visited:
            // nothing below changes, but this node's own area_lod must stay
            // resolved because its neighbours read it for seam selection.
            self.nodes[index].mesh_state = MeshState::ToUnload;
        } else {
            // Find the coarsest grade whose threshold this distance exceeds
            let mut grade: i8 = 0;
            for g in (0..self.lod_dists.len()).rev() {
                if check_dist > self.lod_dists[g] {
                    grade = g as i8;
                    break;
                }
            }

            if grade < node.inborn_lod {
                // Some of the area needs finer detail; children decide for
                // themselves
                self.nodes[index].mesh_state = MeshState::ToUnload;
                debug_assert!(!node.is_leaf());

                for child in node.children {
                    self.update_node(child as usize, -1, config, meshes);
                }

                // If only part of this node is in the finer area, children
                // on the far side may need this node's mesh for grade-up
                // rendering
                let grade_up_child = node
                    .children
                    .iter()
                    .any(|&c| self.nodes[c as usize].mesh_state == MeshState::GradeUp);
                if grade_up_child {
                    self.nodes[index].mesh_state = MeshState::LoadForChild;
                }
            } else if grade == node.inborn_lod {
                self.nodes[index].mesh_state = MeshState::LoadInborn;
                self.nodes[index].area_lod = node.inborn_lod;

                if !node.is_leaf() {
                    for child in node.children {
                        self.update_node(child as usize, node.inborn_lod, config, meshes);
                    }
                }
            } else if node.parent != NO_NODE
                && grade == self.nodes[node.parent as usize].inborn_lod
            {
                // Too fine for this grade; borrow a quadrant of the
                // parent's mesh
                let area_lod = self.nodes[node.parent as usize].inborn_lod;
                self.nodes[index].mesh_state = MeshState::GradeUp;
                self.nodes[index].area_lod = area_lod;

                if !node.is_leaf() {
                    for child in node.children {
                        self.update_node(child as usize, area_lod, config, meshes);
                    }
                }
            } else {
                debug_assert!(false, "unreachable LOD grade {} for node {}", grade, index);
                log::error!(
                    "node {}: LOD grade {} matches neither inborn {} nor parent",
                    index,
                    grade,
                    node.inborn_lod
                );
                self.nodes[index].mesh_state = MeshState::ToUnload;
            }
        }

        // Stream the mesh in while the state wants it rendered
        let state = self.nodes[index].mesh_state;
        if state == MeshState::LoadInborn || state == MeshState::LoadForChild {
            meshes.request(&self.nodes[index], config);
        }
    }
}

/// Closed-form node count for a heightmap: one root plus four times more
/// nodes per level until the level's area reaches the leaf size
fn node_count_for(hm_size: u32, leaf_grid_size: u32) -> u64 {
    let mut grids = hm_size - 1;
    let mut count: u64 = 1;
    let mut level = 0;
    while grids > leaf_grid_size {
        count += 4u64 << (level * 2);
        grids >>= 1;
        level += 1;
    }
    count
}

//! Render collection
//!
//! Walks the tree after an LOD pass and emits one draw record per node that
//! resolved to a drawable state and survives frustum culling. Seam index
//! buffers are chosen here: a side needs stitching when the same-depth
//! neighbour on that side resolved to a coarser grade this frame.

use crate::core::config::TerrainConfig;
use crate::math::{Aabb, Frustum};
use crate::mesh::{MeshCache, SeamIndexCatalog};
use crate::render::{DrawRecord, TerrainRenderer};
use super::node::{MeshState, NO_NODE};
use super::tree::Quadtree;

/// Vertical slab used to cull nodes whose mesh has not been built yet; real
/// height bounds replace it once the mesh is available
const UNKNOWN_HEIGHT_BOUND: f32 = 10_000.0;

impl Quadtree {
    /// Emit draw records for the current LOD state
    ///
    /// `offset` is the terrain's world-space origin; the frustum is in
    /// world space.
    pub fn collect_render_nodes(
        &self,
        frustum: &Frustum,
        offset: crate::core::types::Vec3,
        config: &TerrainConfig,
        catalog: &SeamIndexCatalog,
        meshes: &MeshCache,
        renderer: &mut dyn TerrainRenderer,
    ) {
        self.collect_node(0, frustum, offset, config, catalog, meshes, renderer);
    }

    #[allow(clippy::too_many_arguments)]
    fn collect_node(
        &self,
        index: usize,
        frustum: &Frustum,
        offset: crate::core::types::Vec3,
        config: &TerrainConfig,
        catalog: &SeamIndexCatalog,
        meshes: &MeshCache,
        renderer: &mut dyn TerrainRenderer,
    ) {
        let node = self.node(index as u32);

        // Skip subtrees the last LOD pass never reached
        if node.update_cnt != self.update_count() {
            return;
        }

        // First cull with unknown height bounds; the footprint is exact but
        // the vertical extent is a generous slab
        let rc = node.local_area(config.grid_size);
        let slab = Aabb::new(
            crate::core::types::Vec3::new(
                rc.min.x + offset.x,
                -UNKNOWN_HEIGHT_BOUND,
                rc.min.y + offset.z,
            ),
            crate::core::types::Vec3::new(
                rc.max.x + offset.x,
                UNKNOWN_HEIGHT_BOUND,
                rc.max.y + offset.z,
            ),
        );
        if !frustum.intersects_aabb(&slab) {
            return;
        }

        if matches!(node.mesh_state, MeshState::LoadInborn | MeshState::GradeUp) {
            // A side needs a seam when the neighbour at the same depth was
            // resolved this frame to a coarser grade
            let mut side_mask = 0u8;
            for side in 0..4 {
                let nbr = node.neighbour[side];
                if nbr == NO_NODE {
                    continue;
                }
                let nbr_node = self.node(nbr);
                if nbr_node.update_cnt == self.update_count() && nbr_node.area_lod > node.area_lod
                {
                    side_mask |= 1 << side;
                }
            }

            let (mesh, indices) = match node.mesh_state {
                MeshState::LoadInborn => (
                    meshes.get(node.index),
                    catalog.index_buffer(side_mask, None),
                ),
                MeshState::GradeUp => {
                    debug_assert_ne!(node.parent, NO_NODE);
                    (
                        meshes.get(node.parent),
                        catalog.index_buffer(side_mask, node.child_pos()),
                    )
                }
                _ => unreachable!(),
            };

            match mesh {
                Some(mesh) => {
                    // Re-cull with the mesh's real height bounds
                    let aabb = Aabb::new(
                        crate::core::types::Vec3::new(
                            slab.min.x,
                            mesh.aabb.min.y + offset.y,
                            slab.min.z,
                        ),
                        crate::core::types::Vec3::new(
                            slab.max.x,
                            mesh.aabb.max.y + offset.y,
                            slab.max.z,
                        ),
                    );
                    if !frustum.intersects_aabb(&aabb) {
                        return;
                    }

                    renderer.push_draw_data(DrawRecord {
                        node_index: node.index,
                        area_lod: node.area_lod,
                        aabb,
                        vertices: &mesh.vertices,
                        indices,
                    });
                }
                None => {
                    // A failed build leaves a hole this frame; the next LOD
                    // pass retries the request
                    log::warn!("node {}: no mesh available to draw", node.index);
                }
            }
        }

        if !node.is_leaf() {
            for child in node.children {
                self.collect_node(
                    child as usize,
                    frustum,
                    offset,
                    config,
                    catalog,
                    meshes,
                    renderer,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TerrainConfig;
    use crate::core::types::{Mat4, Vec3};
    use crate::heightfield::MemoryHeightSource;
    use crate::mesh::GeometryBuilder;
    use crate::quadtree::node::MeshState;
    use crate::render::DrawList;
    use std::time::Duration;

    const HM_SIZE: u32 = 17;

    fn config() -> TerrainConfig {
        TerrainConfig {
            leaf_grid_size: 4,
            max_drawn_node_grid_size: 16,
            lod_base_dist: 5.0,
            lod_ratio: 3.0,
            ..Default::default()
        }
    }

    fn cache() -> MeshCache {
        let mut builder = GeometryBuilder::new();
        builder.add_layer(Box::new(MemoryHeightSource::flat(HM_SIZE, 0.5).unwrap()));
        MeshCache::with_timing(builder, Duration::from_secs(60), Duration::ZERO)
    }

    /// Frustum wide enough to accept the whole test terrain
    fn accept_all() -> Frustum {
        let proj = Mat4::orthographic_rh(-1e6, 1e6, -1e6, 1e6, -1e6, 1e6);
        Frustum::from_view_projection(&proj)
    }

    fn find_index(tree: &Quadtree, left: i32, top: i32, size: u32) -> u32 {
        tree.nodes()
            .iter()
            .find(|n| n.area_left == left && n.area_top == top && n.area_size == size)
            .map(|n| n.index)
            .expect("no node with that footprint")
    }

    /// 16x16 terrain with the viewer just past the top-left corner: the
    /// corner stays fine, the far quadrants coarsen, grade-up bridges the
    /// boundary.
    fn mixed_grade_scene() -> (Quadtree, MeshCache, TerrainConfig, SeamIndexCatalog) {
        let cfg = config();
        let mut tree = Quadtree::new(&cfg, HM_SIZE).unwrap();
        let mut meshes = cache();
        let catalog = SeamIndexCatalog::new(cfg.leaf_grid_size).unwrap();

        tree.update_lod(Vec3::new(2.0, 0.0, 2.0), &cfg, &mut meshes);
        (tree, meshes, cfg, catalog)
    }

    #[test]
    fn test_scene_state_layout() {
        let (tree, _, _, _) = mixed_grade_scene();

        // Top-left leaf at full detail
        let corner = tree.node(find_index(&tree, 0, 0, 4));
        assert_eq!(corner.mesh_state, MeshState::LoadInborn);
        assert_eq!(corner.area_lod, 0);

        // The leaf below it is one grade too fine and borrows its parent
        let bridge = tree.node(find_index(&tree, 0, 4, 4));
        assert_eq!(bridge.mesh_state, MeshState::GradeUp);
        assert_eq!(bridge.area_lod, 1);

        // Its parent keeps a mesh loaded for the borrow
        let parent = tree.node(find_index(&tree, 0, 0, 8));
        assert_eq!(parent.mesh_state, MeshState::LoadForChild);

        // The other quadrants render whole at grade 1
        for (left, top) in [(8, 0), (0, 8), (8, 8)] {
            let quadrant = tree.node(find_index(&tree, left, top, 8));
            assert_eq!(quadrant.mesh_state, MeshState::LoadInborn);
            assert_eq!(quadrant.area_lod, 1);
        }
    }

    #[test]
    fn test_collect_emits_drawable_nodes_only() {
        let (tree, meshes, cfg, catalog) = mixed_grade_scene();
        let mut list = DrawList::new();
        tree.collect_render_nodes(&accept_all(), Vec3::ZERO, &cfg, &catalog, &meshes, &mut list);

        assert!(!list.is_empty());
        for call in list.calls() {
            let node = tree.node(call.node_index);
            assert!(matches!(
                node.mesh_state,
                MeshState::LoadInborn | MeshState::GradeUp
            ));
        }

        // No node is drawn twice
        let mut seen: Vec<u32> = list.calls().iter().map(|c| c.node_index).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), list.len());
    }

    #[test]
    fn test_fine_side_gets_the_seam() {
        let (tree, meshes, cfg, catalog) = mixed_grade_scene();
        let mut list = DrawList::new();
        tree.collect_render_nodes(&accept_all(), Vec3::ZERO, &cfg, &catalog, &meshes, &mut list);

        // Full leaf: 4x4 cells, 2 triangles each
        let full = 4 * 4 * 2 * 3;

        // The corner leaf's bottom neighbour resolved coarser, so its draw
        // uses the bottom-seam buffer: 2 of its 4 border cell pairs collapse
        // from two triangles to one
        let corner = find_index(&tree, 0, 0, 4);
        let call = list
            .calls()
            .iter()
            .find(|c| c.node_index == corner)
            .expect("corner leaf not drawn");
        assert_eq!(call.index_count, full - 6);

        // The leaf right of it seams on both right and bottom
        let inner = find_index(&tree, 4, 0, 4);
        let call = list
            .calls()
            .iter()
            .find(|c| c.node_index == inner)
            .expect("inner leaf not drawn");
        assert_eq!(call.index_count, full - 12);
    }

    #[test]
    fn test_coarse_side_draws_unstitched() {
        let (tree, meshes, cfg, catalog) = mixed_grade_scene();
        let mut list = DrawList::new();
        tree.collect_render_nodes(&accept_all(), Vec3::ZERO, &cfg, &catalog, &meshes, &mut list);

        // A coarse quadrant bordering finer leaves renders its full grid;
        // the finer side does the stitching
        let quadrant = find_index(&tree, 8, 0, 8);
        let call = list
            .calls()
            .iter()
            .find(|c| c.node_index == quadrant)
            .expect("quadrant not drawn");
        assert_eq!(call.index_count, 4 * 4 * 2 * 3);
        assert_eq!(call.area_lod, 1);
    }

    #[test]
    fn test_grade_up_draws_parent_quadrant() {
        let (tree, meshes, cfg, catalog) = mixed_grade_scene();
        let mut list = DrawList::new();
        tree.collect_render_nodes(&accept_all(), Vec3::ZERO, &cfg, &catalog, &meshes, &mut list);

        // The bridge leaf draws a quadrant of its parent's mesh: half the
        // grid per axis, full triangulation within the quadrant
        let bridge = find_index(&tree, 0, 4, 4);
        let call = list
            .calls()
            .iter()
            .find(|c| c.node_index == bridge)
            .expect("bridge leaf not drawn");
        assert_eq!(call.index_count, 2 * 2 * 2 * 3);
        assert_eq!(call.area_lod, 1);

        // Its vertices come from the parent's mesh
        let parent = tree.node(find_index(&tree, 0, 0, 8));
        let parent_mesh = meshes.get(parent.index).unwrap();
        assert_eq!(call.vertex_count as usize, parent_mesh.vertices.len());
    }

    #[test]
    fn test_rejecting_frustum_emits_nothing() {
        let (tree, meshes, cfg, catalog) = mixed_grade_scene();

        // Orthographic box far away from the terrain
        let proj = Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, 0.1, 10.0)
            * Mat4::from_translation(Vec3::new(-100_000.0, 0.0, 0.0));
        let frustum = Frustum::from_view_projection(&proj);

        let mut list = DrawList::new();
        tree.collect_render_nodes(&frustum, Vec3::ZERO, &cfg, &catalog, &meshes, &mut list);
        assert!(list.is_empty());
    }

    #[test]
    fn test_stale_subtrees_are_skipped() {
        let cfg = config();
        let mut tree = Quadtree::new(&cfg, HM_SIZE).unwrap();
        let mut meshes = cache();
        let catalog = SeamIndexCatalog::new(cfg.leaf_grid_size).unwrap();

        // Far viewer: root renders alone, children inherit, grandchildren
        // are stale
        tree.update_lod(Vec3::new(10_000.0, 0.0, 0.0), &cfg, &mut meshes);

        let mut list = DrawList::new();
        tree.collect_render_nodes(&accept_all(), Vec3::ZERO, &cfg, &catalog, &meshes, &mut list);

        assert_eq!(list.len(), 1);
        assert_eq!(list.calls()[0].node_index, 0);
        // Root draws the whole terrain with no seams
        assert_eq!(list.calls()[0].index_count, 4 * 4 * 2 * 3);
    }

    #[test]
    fn test_world_offset_shifts_draw_bounds() {
        let (tree, meshes, cfg, catalog) = mixed_grade_scene();
        let offset = Vec3::new(1000.0, 25.0, -2000.0);

        let mut list = DrawList::new();
        tree.collect_render_nodes(&accept_all(), offset, &cfg, &catalog, &meshes, &mut list);

        for call in list.calls() {
            assert!(call.aabb.min.x >= 1000.0);
            assert!(call.aabb.max.x <= 1000.0 + 16.0);
            // Flat map at 0.5, scaled by height_scale, plus the y offset
            let expected_y = 0.5 * cfg.height_scale + 25.0;
            assert!((call.aabb.min.y - expected_y).abs() < 1e-3);
            assert!(call.aabb.min.z >= -2016.0);
            assert!(call.aabb.max.z <= -2000.0);
        }
    }
}

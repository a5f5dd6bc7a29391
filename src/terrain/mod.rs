//! Terrain facade
//!
//! Owns the whole pipeline for one terrain: height layers feeding a
//! geometry builder, the mesh cache, the seam catalog and the quadtree.
//! Callers drive it with two calls per frame: `update` with the viewer's
//! world position, then `collect` with the camera frustum and a renderer.

use std::path::Path;

use crate::core::config::TerrainConfig;
use crate::core::error::Error;
use crate::core::types::{Result, Vec3};
use crate::math::Frustum;
use crate::heightfield::{HeightFormat, HeightSource, RawHeightFile};
use crate::mesh::{GeometryBuilder, MeshCache, SeamIndexCatalog};
use crate::quadtree::Quadtree;
use crate::render::TerrainRenderer;

/// Largest node footprint in grids still drawn for far vistas
const VISTA_MAX_GRID: u32 = 128;

pub struct Terrain {
    config: TerrainConfig,
    /// World-space position of the terrain's top-left corner
    position: Vec3,
    vista_lod: i8,
    catalog: SeamIndexCatalog,
    meshes: MeshCache,
    tree: Quadtree,
}

impl Terrain {
    /// Build a terrain from height layers
    ///
    /// The first layer sets the heightmap size; later layers overlay it and
    /// may be smaller. `position` places the terrain's top-left corner in
    /// world space.
    pub fn new(
        config: TerrainConfig,
        layers: Vec<Box<dyn HeightSource>>,
        position: Vec3,
    ) -> Result<Self> {
        config.validate()?;

        let mut builder = GeometryBuilder::new();
        for layer in layers {
            builder.add_layer(layer);
        }
        let hm_size = builder
            .heightmap_width()
            .ok_or_else(|| Error::Config("terrain needs at least one height layer".into()))?;

        let catalog = SeamIndexCatalog::new(config.leaf_grid_size)?;
        let tree = Quadtree::new(&config, hm_size)?;
        let meshes = MeshCache::new(builder);

        let vista_lod = vista_lod_for(&config);
        log::info!(
            "terrain ready: {0}x{0} grids, {1} nodes, vista LOD {2}",
            hm_size - 1,
            tree.node_count(),
            vista_lod
        );

        Ok(Self {
            config,
            position,
            vista_lod,
            catalog,
            meshes,
            tree,
        })
    }

    /// Build a terrain from a raw heightmap file as the single base layer
    pub fn from_raw_file(
        config: TerrainConfig,
        path: impl AsRef<Path>,
        format: HeightFormat,
        position: Vec3,
    ) -> Result<Self> {
        let min_width = config.vertex_width();
        let file = RawHeightFile::open(path, format, min_width as u32)?;
        Self::new(config, vec![Box::new(file)], position)
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Heightmap samples per side
    pub fn heightmap_size(&self) -> u32 {
        self.tree.heightmap_size()
    }

    /// Number of LOD grades small enough to serve as far-vista detail
    pub fn vista_lod(&self) -> i8 {
        self.vista_lod
    }

    pub fn quadtree(&self) -> &Quadtree {
        &self.tree
    }

    pub fn mesh_cache(&self) -> &MeshCache {
        &self.meshes
    }

    /// Advance one frame: evict idle meshes, then resolve LOD states for a
    /// viewer at `world_center` (typically the camera position).
    pub fn update(&mut self, world_center: Vec3) {
        self.meshes.sweep();

        let local_center = world_center - self.position;
        self.tree.update_lod(local_center, &self.config, &mut self.meshes);
    }

    /// Emit draw records for the state resolved by the last `update`
    pub fn collect(&self, frustum: &Frustum, renderer: &mut dyn TerrainRenderer) {
        self.tree.collect_render_nodes(
            frustum,
            self.position,
            &self.config,
            &self.catalog,
            &self.meshes,
            renderer,
        );
    }
}

/// Count the LOD grades whose node footprint stays within the vista limit
fn vista_lod_for(config: &TerrainConfig) -> i8 {
    let mut vista = 0i8;
    let mut size = config.leaf_grid_size;
    while size <= config.max_drawn_node_grid_size {
        if size > VISTA_MAX_GRID {
            break;
        }
        vista += 1;
        size <<= 1;
    }
    vista
}

//! Time-windowed cache of built node meshes
//!
//! Meshes are built lazily on first request and kept while the LOD traversal
//! keeps touching them. A periodic sweep evicts meshes that went unrequested
//! for the TTL; capacity is implicitly bounded by how many distinct nodes the
//! traversal requests within that window.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::core::config::TerrainConfig;
use crate::core::types::{Result, Vec3};
use crate::math::Aabb;
use crate::quadtree::node::Node;
use super::geometry::GeometryBuilder;
use super::vertex::TerrainVertex;

/// Built geometry for one quadtree node
pub struct NodeMesh {
    /// Index of the quadtree node this mesh belongs to
    pub node_index: u32,
    /// Mesh bounds in terrain local space
    pub aabb: Aabb,
    /// Vertex heights, kept for reuse (collision queries, paging)
    pub heights: Vec<f32>,
    /// Vertex buffer, ready for GPU upload
    pub vertices: Vec<TerrainVertex>,
    /// Last time the LOD traversal requested this mesh
    last_used: Instant,
}

/// Cache of node meshes keyed by node index
pub struct MeshCache {
    builder: GeometryBuilder,
    meshes: HashMap<u32, NodeMesh>,
    /// Meshes unrequested for this long get evicted
    ttl: Duration,
    /// Minimum time between eviction sweeps
    sweep_interval: Duration,
    last_sweep: Instant,
}

impl MeshCache {
    /// Default time-to-live for unrequested meshes
    pub const DEFAULT_TTL: Duration = Duration::from_secs(30);
    /// Default housekeeping interval
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

    pub fn new(builder: GeometryBuilder) -> Self {
        Self::with_timing(builder, Self::DEFAULT_TTL, Self::DEFAULT_SWEEP_INTERVAL)
    }

    /// Create a cache with explicit eviction timing (tests use tiny values)
    pub fn with_timing(builder: GeometryBuilder, ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            builder,
            meshes: HashMap::with_capacity(256),
            ttl,
            sweep_interval,
            last_sweep: Instant::now(),
        }
    }

    /// Access the geometry builder (e.g. to register height layers)
    pub fn builder_mut(&mut self) -> &mut GeometryBuilder {
        &mut self.builder
    }

    pub fn builder(&self) -> &GeometryBuilder {
        &self.builder
    }

    /// Number of cached meshes
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Get a node's mesh without side effects
    pub fn get(&self, node_index: u32) -> Option<&NodeMesh> {
        self.meshes.get(&node_index)
    }

    /// Ensure a usable mesh exists for a node
    ///
    /// A cache hit refreshes the mesh's freshness timestamp. A miss builds
    /// the mesh synchronously; a failed build is logged and leaves the node
    /// without a mesh for this frame (the next request retries).
    pub fn request(&mut self, node: &Node, config: &TerrainConfig) -> bool {
        if let Some(mesh) = self.meshes.get_mut(&node.index) {
            mesh.last_used = Instant::now();
            return true;
        }

        match self.build_node_mesh(node, config) {
            Ok(mesh) => {
                self.meshes.insert(node.index, mesh);
                true
            }
            Err(e) => {
                log::warn!("failed to build mesh for node {}: {}", node.index, e);
                false
            }
        }
    }

    /// Evict meshes whose TTL expired; rate-limited to the sweep interval
    pub fn sweep(&mut self) {
        if self.last_sweep.elapsed() < self.sweep_interval {
            return;
        }
        self.last_sweep = Instant::now();

        let ttl = self.ttl;
        let before = self.meshes.len();
        self.meshes.retain(|_, mesh| mesh.last_used.elapsed() <= ttl);

        let evicted = before - self.meshes.len();
        if evicted > 0 {
            log::debug!("evicted {} stale node meshes", evicted);
        }
    }

    /// Drop all cached meshes
    pub fn clear(&mut self) {
        self.meshes.clear();
    }

    fn build_node_mesh(&mut self, node: &Node, config: &TerrainConfig) -> Result<NodeMesh> {
        let width = config.vertex_width();
        let count = width * width;
        let mut vertices = vec![TerrainVertex::default(); count];

        let (min_y, max_y) = self.builder.build_node_mesh(
            node.area_left,
            node.area_top,
            node.grid_step as i32,
            width,
            config.grid_size,
            config.height_scale,
            &mut vertices,
        )?;

        let heights = vertices.iter().map(|v| v.pos[1]).collect();

        let rc = node.local_area(config.grid_size);
        let aabb = Aabb::new(
            Vec3::new(rc.min.x, min_y, rc.min.y),
            Vec3::new(rc.max.x, max_y, rc.max.y),
        );

        Ok(NodeMesh {
            node_index: node.index,
            aabb,
            heights,
            vertices,
            last_used: Instant::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightfield::MemoryHeightSource;

    fn test_config() -> TerrainConfig {
        TerrainConfig {
            leaf_grid_size: 4,
            max_drawn_node_grid_size: 8,
            ..Default::default()
        }
    }

    fn test_cache(ttl_ms: u64) -> MeshCache {
        let mut builder = GeometryBuilder::new();
        builder.add_layer(Box::new(MemoryHeightSource::flat(9, 0.5).unwrap()));
        MeshCache::with_timing(
            builder,
            Duration::from_millis(ttl_ms),
            Duration::ZERO,
        )
    }

    fn leaf_node(index: u32, left: i32, top: i32) -> Node {
        let mut node = Node::new(index);
        node.area_left = left;
        node.area_top = top;
        node.area_size = 4;
        node.inborn_lod = 0;
        node.grid_step = 1;
        node
    }

    #[test]
    fn test_request_builds_once() {
        let config = test_config();
        let mut cache = test_cache(10_000);
        let node = leaf_node(3, 0, 0);

        assert!(cache.get(3).is_none());
        assert!(cache.request(&node, &config));
        assert_eq!(cache.len(), 1);

        let mesh = cache.get(3).unwrap();
        assert_eq!(mesh.node_index, 3);
        assert_eq!(mesh.vertices.len(), 25);
        assert_eq!(mesh.heights.len(), 25);

        // Repeat request is a touch, not a rebuild
        assert!(cache.request(&node, &config));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_mesh_aabb_covers_footprint() {
        let config = test_config();
        let mut cache = test_cache(10_000);
        let node = leaf_node(0, 4, 4);
        cache.request(&node, &config);

        let aabb = cache.get(0).unwrap().aabb;
        assert_eq!(aabb.min.x, 4.0);
        assert_eq!(aabb.max.x, 8.0);
        assert_eq!(aabb.max.z, -4.0);
        assert_eq!(aabb.min.z, -8.0);
        // Flat map at 0.5, default height scale
        let expected = 0.5 * config.height_scale;
        assert!((aabb.min.y - expected).abs() < 1e-3);
        assert!((aabb.max.y - expected).abs() < 1e-3);
    }

    #[test]
    fn test_sweep_evicts_stale_meshes() {
        let config = test_config();
        let mut cache = test_cache(20);
        cache.request(&leaf_node(1, 0, 0), &config);
        cache.request(&leaf_node(2, 4, 0), &config);
        assert_eq!(cache.len(), 2);

        std::thread::sleep(Duration::from_millis(40));
        cache.sweep();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_touch_refreshes_ttl() {
        let config = test_config();
        let mut cache = test_cache(60);
        let node = leaf_node(1, 0, 0);
        cache.request(&node, &config);

        std::thread::sleep(Duration::from_millis(40));
        cache.request(&node, &config); // touch
        std::thread::sleep(Duration::from_millis(40));
        cache.sweep();

        // 80ms since build but only 40ms since last touch
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_build_leaves_no_mesh() {
        let config = test_config();
        // No layers registered: builder samples nothing and heights stay
        // invalid, but a build error needs a failing source
        let mut builder = GeometryBuilder::new();
        builder.add_layer(Box::new(FailingSource));
        let mut cache = MeshCache::with_timing(builder, Duration::from_secs(1), Duration::ZERO);

        assert!(!cache.request(&leaf_node(7, 0, 0), &config));
        assert!(cache.get(7).is_none());
        assert!(cache.is_empty());
    }

    struct FailingSource;

    impl crate::heightfield::HeightSource for FailingSource {
        fn width(&self) -> u32 {
            9
        }

        fn sample(
            &mut self,
            _left: i32,
            _top: i32,
            _step: i32,
            _width: usize,
            _out: &mut [f32],
        ) -> crate::core::types::Result<()> {
            Err(crate::core::Error::HeightSource("backing store gone".into()))
        }
    }
}

//! Terrain configuration
//!
//! All tunables that shape the quadtree hierarchy and the LOD selection
//! distances. The hierarchy math is only sound for power-of-two sizes, so
//! `validate` must pass before anything is built from a config.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::Error;
use crate::core::types::Result;

/// Tunables for a quadtree terrain
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Grids per side of a quadtree leaf. Power of two, > 2.
    pub leaf_grid_size: u32,
    /// Grids per side of the biggest drawable node. Power of two, > leaf.
    pub max_drawn_node_grid_size: u32,
    /// Size of one grid cell in world units. Integer keeps the area math exact.
    pub grid_size: i32,
    /// Distance at which LOD grade 0 ends
    pub lod_base_dist: f32,
    /// Ratio between consecutive LOD grade distances
    pub lod_ratio: f32,
    /// Nodes farther than this from the view center are culled
    pub view_distance: f32,
    /// Scale applied to normalized height samples
    pub height_scale: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            leaf_grid_size: 32,
            max_drawn_node_grid_size: 512,
            grid_size: 1,
            lod_base_dist: 35.0,
            lod_ratio: 3.0,
            view_distance: 2000.0,
            height_scale: 2625.0,
        }
    }
}

impl TerrainConfig {
    /// Load a configuration from a JSON file and validate it
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the config describes a buildable hierarchy
    ///
    /// Errors here are fatal: a quadtree built from an invalid config would
    /// have broken neighbor and LOD math, not degraded output.
    pub fn validate(&self) -> Result<()> {
        if self.leaf_grid_size <= 2 || !self.leaf_grid_size.is_power_of_two() {
            return Err(Error::Config(format!(
                "leaf_grid_size must be a power of two > 2, got {}",
                self.leaf_grid_size
            )));
        }
        if self.max_drawn_node_grid_size <= self.leaf_grid_size
            || !self.max_drawn_node_grid_size.is_power_of_two()
        {
            return Err(Error::Config(format!(
                "max_drawn_node_grid_size must be a power of two > leaf_grid_size, got {}",
                self.max_drawn_node_grid_size
            )));
        }
        if self.grid_size < 1 {
            return Err(Error::Config(format!(
                "grid_size must be >= 1, got {}",
                self.grid_size
            )));
        }
        if self.lod_base_dist <= 0.0 {
            return Err(Error::Config(format!(
                "lod_base_dist must be positive, got {}",
                self.lod_base_dist
            )));
        }
        if self.lod_ratio <= 1.0 {
            return Err(Error::Config(format!(
                "lod_ratio must be > 1, got {}",
                self.lod_ratio
            )));
        }
        if self.view_distance <= 0.0 {
            return Err(Error::Config(format!(
                "view_distance must be positive, got {}",
                self.view_distance
            )));
        }
        Ok(())
    }

    /// Vertex count per row/column of a node's mesh
    pub fn vertex_width(&self) -> usize {
        self.leaf_grid_size as usize + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TerrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_non_power_of_two_leaf_rejected() {
        let config = TerrainConfig {
            leaf_grid_size: 24,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tiny_leaf_rejected() {
        let config = TerrainConfig {
            leaf_grid_size: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_drawn_must_exceed_leaf() {
        let config = TerrainConfig {
            leaf_grid_size: 32,
            max_drawn_node_grid_size: 32,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_lod_ratio_rejected() {
        let config = TerrainConfig {
            lod_ratio: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = TerrainConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        let parsed: TerrainConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.leaf_grid_size, config.leaf_grid_size);
        assert_eq!(parsed.view_distance, config.view_distance);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed: TerrainConfig = serde_json::from_str(r#"{"view_distance": 500.0}"#).unwrap();
        assert_eq!(parsed.view_distance, 500.0);
        assert_eq!(parsed.leaf_grid_size, 32);
    }

    #[test]
    fn test_vertex_width() {
        assert_eq!(TerrainConfig::default().vertex_width(), 33);
    }
}

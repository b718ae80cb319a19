use crate::error::ConfigError;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Placement engine settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct DungeonConfig {
    /// Generation stops once this many rooms are placed.
    pub target_room_count: usize,
    pub seed: u64,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        DungeonConfig {
            target_room_count: 100,
            seed: 0,
        }
    }
}

/// Occupancy grid and navigation graph settings. Distances other than `cell_size` are in cells.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct NavConfig {
    /// World units per grid cell.
    pub cell_size: f32,
    /// Cells per grid side. Cell `(0, 0)` sits in the middle.
    pub grid_size: usize,
    /// A platform run gets a node every this many cells.
    pub platform_node_spacing: usize,
    pub link_radius: f32,
    pub max_link_dx: i32,
    /// Vertical reach of an edge, up or down.
    pub max_link_dy: i32,
}

impl NavConfig {
    pub fn grid_bias(&self) -> i32 {
        (self.grid_size / 2) as i32
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        NavConfig {
            cell_size: 1000.0,
            grid_size: 500,
            platform_node_spacing: 10,
            link_radius: 500.0,
            max_link_dx: 20,
            max_link_dy: 20,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    pub dungeon: DungeonConfig,
    pub nav: NavConfig,
}

impl Config {
    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        ron::de::from_str(s).map_err(|e| ConfigError::Ron {
            message: e.to_string(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_ron_str(&text)
    }
}

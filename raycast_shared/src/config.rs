//! Configuration.
//!
//! Loads host configuration from JSON strings/files.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaycastConfig {
    /// Fixed tick rate of the host loop.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
    /// Crossings farther than this are not reported.
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,
    /// Scene file loaded at startup.
    #[serde(default)]
    pub scene_path: Option<String>,
}

fn default_tick_hz() -> u32 {
    20
}

fn default_max_distance() -> f64 {
    128.0
}

impl Default for RaycastConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            max_distance: default_max_distance(),
            scene_path: None,
        }
    }
}

impl RaycastConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse config {}", path.display()))
    }
}

//! Scene files.
//!
//! A scene is a JSON list of named groups, each holding entity descriptions:
//!
//! ```json
//! { "groups": [ { "name": "statues", "entities": [
//!     { "kind": "block_display", "position": [0, 64, 0],
//!       "display": { "scale": [2, 2, 2] } }
//! ] } ] }
//! ```

use std::path::Path;

use anyhow::Context;
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::ecs::{BoundingBox, DisplayMeta, EntityId, EntityKind, Position, ScaleAttribute, World};

/// One entity in a scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntity {
    pub kind: EntityKind,
    pub position: DVec3,
    #[serde(default)]
    pub display: Option<DisplayMeta>,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
    #[serde(default)]
    pub scale: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneGroup {
    pub name: String,
    pub entities: Vec<SceneEntity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    pub groups: Vec<SceneGroup>,
}

impl SceneFile {
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read scene {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse scene {}", path.display()))
    }

    /// Spawns every entity into `world`, returning `(group name, entity ids)`.
    pub fn spawn(&self, world: &mut World) -> Vec<(String, Vec<EntityId>)> {
        self.groups
            .iter()
            .map(|g| {
                let ids = g.entities.iter().map(|e| spawn_entity(world, e)).collect();
                (g.name.clone(), ids)
            })
            .collect()
    }
}

/// Spawns one described entity. Display kinds always get display metadata.
pub fn spawn_entity(world: &mut World, e: &SceneEntity) -> EntityId {
    let id = world.spawn();
    world.insert(id, e.kind);
    world.insert(id, Position(e.position));
    match e.kind {
        EntityKind::ItemDisplay | EntityKind::BlockDisplay => {
            world.insert(id, e.display.unwrap_or_default());
        }
        EntityKind::Living | EntityKind::Other => {
            world.insert(id, e.bounding_box.unwrap_or(BoundingBox::standing(0.6, 1.8)));
            if let Some(scale) = e.scale {
                world.insert(id, ScaleAttribute(scale));
            }
        }
    }
    id
}

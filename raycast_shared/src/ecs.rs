//! Entity/component store for the host server.
//!
//! Typed component storages keyed by entity id. Storages are `BTreeMap`s so
//! iteration order is stable across runs.

use std::{
    any::{Any, TypeId},
    collections::{BTreeMap, HashMap},
};

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Opaque entity id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Component store.
#[derive(Default)]
pub struct World {
    next_id: u64,
    storages: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl World {
    /// Creates a new entity.
    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    fn storage<T: 'static + Send + Sync>(&self) -> Option<&BTreeMap<EntityId, T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<BTreeMap<EntityId, T>>())
    }

    /// Inserts/replaces a component for an entity.
    pub fn insert<T: 'static + Send + Sync>(&mut self, entity: EntityId, component: T) {
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(BTreeMap::<EntityId, T>::new()));
        if let Some(storage) = storage.downcast_mut::<BTreeMap<EntityId, T>>() {
            storage.insert(entity, component);
        }
    }

    pub fn get<T: 'static + Send + Sync>(&self, entity: EntityId) -> Option<&T> {
        self.storage::<T>().and_then(|s| s.get(&entity))
    }

    pub fn get_mut<T: 'static + Send + Sync>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut::<BTreeMap<EntityId, T>>())
            .and_then(|storage| storage.get_mut(&entity))
    }

    /// Iterates entities with a given component, in id order.
    pub fn iter<T: 'static + Send + Sync>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.storage::<T>()
            .into_iter()
            .flat_map(|storage| storage.iter().map(|(k, v)| (*k, v)))
    }

    /// Number of spawned entities (including ones without components).
    pub fn spawned(&self) -> u64 {
        self.next_id
    }
}

/// World position of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position(pub DVec3);

/// What the host thinks an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ItemDisplay,
    BlockDisplay,
    Living,
    Other,
}

impl std::str::FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "item" | "item_display" => Ok(EntityKind::ItemDisplay),
            "block" | "block_display" => Ok(EntityKind::BlockDisplay),
            "living" => Ok(EntityKind::Living),
            "other" => Ok(EntityKind::Other),
            _ => anyhow::bail!("unknown entity kind: {s}"),
        }
    }
}

/// Display entity transformation metadata. Rotations are `[x, y, z, w]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayMeta {
    #[serde(default)]
    pub translation: DVec3,
    #[serde(default = "unit_scale")]
    pub scale: DVec3,
    #[serde(default = "identity_rotation")]
    pub left_rotation: [f32; 4],
    #[serde(default = "identity_rotation")]
    pub right_rotation: [f32; 4],
}

fn unit_scale() -> DVec3 {
    DVec3::ONE
}

fn identity_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl Default for DisplayMeta {
    fn default() -> Self {
        Self {
            translation: DVec3::ZERO,
            scale: unit_scale(),
            left_rotation: identity_rotation(),
            right_rotation: identity_rotation(),
        }
    }
}

/// Entity bounding box relative to its position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub relative_min: DVec3,
    pub relative_max: DVec3,
}

impl BoundingBox {
    /// Box of the given width and height standing on the entity position.
    pub fn standing(width: f64, height: f64) -> Self {
        let half = width * 0.5;
        Self {
            relative_min: DVec3::new(-half, 0.0, -half),
            relative_max: DVec3::new(half, height, half),
        }
    }
}

/// Scale attribute of living entities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleAttribute(pub f64);

impl Default for ScaleAttribute {
    fn default() -> Self {
        Self(1.0)
    }
}

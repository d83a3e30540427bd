//! Hitboxes read from host entities.

use glam::{DQuat, DVec3};

use crate::{
    ecs::{BoundingBox, DisplayMeta, EntityId, EntityKind, Position, ScaleAttribute, World},
    hitbox::{HitBox, HitBoxType},
    math::quat_from_xyzw,
};

/// Snapshot of an entity's hitbox-relevant components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityHitBox {
    id: EntityId,
    kind: EntityKind,
    hitbox_type: HitBoxType,
    position: DVec3,
    meta: Option<DisplayMeta>,
    bounding_box: Option<BoundingBox>,
    scale_attribute: Option<ScaleAttribute>,
}

impl EntityHitBox {
    /// Reads an entity. `None` when it has no position.
    ///
    /// Entities without an `EntityKind` are treated as `Other`.
    pub fn from_world(world: &World, id: EntityId) -> Option<Self> {
        let position = world.get::<Position>(id)?.0;
        let kind = world
            .get::<EntityKind>(id)
            .copied()
            .unwrap_or(EntityKind::Other);
        Some(Self {
            id,
            kind,
            hitbox_type: hitbox_type_for(kind),
            position,
            meta: world.get::<DisplayMeta>(id).copied(),
            bounding_box: world.get::<BoundingBox>(id).copied(),
            scale_attribute: world.get::<ScaleAttribute>(id).copied(),
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    fn meta(&self) -> DisplayMeta {
        self.meta.unwrap_or_default()
    }
}

/// Item displays are centered boxes, block displays corner-anchored, the rest axis-aligned.
pub fn hitbox_type_for(kind: EntityKind) -> HitBoxType {
    match kind {
        EntityKind::ItemDisplay => HitBoxType::ItemDisplayNone,
        EntityKind::BlockDisplay => HitBoxType::BlockDisplay,
        EntityKind::Living | EntityKind::Other => HitBoxType::Aabb,
    }
}

impl HitBox for EntityHitBox {
    fn position(&self) -> DVec3 {
        match self.hitbox_type {
            HitBoxType::Aabb => self.position,
            _ => self.position + self.meta().translation,
        }
    }

    fn left_rotation(&self) -> DQuat {
        quat_from_xyzw(self.meta().left_rotation)
    }

    fn scale(&self) -> DVec3 {
        match (self.hitbox_type, self.kind) {
            (HitBoxType::Aabb, EntityKind::Living) => {
                DVec3::splat(self.scale_attribute.unwrap_or_default().0)
            }
            (HitBoxType::Aabb, _) => DVec3::ONE,
            _ => self.meta().scale,
        }
    }

    fn right_rotation(&self) -> DQuat {
        quat_from_xyzw(self.meta().right_rotation)
    }

    fn hitbox_type(&self) -> HitBoxType {
        self.hitbox_type
    }

    fn aabb_min(&self) -> Option<DVec3> {
        self.bounding_box.map(|b| b.relative_min + self.position)
    }

    fn aabb_max(&self) -> Option<DVec3> {
        self.bounding_box.map(|b| b.relative_max + self.position)
    }
}

/// Hitboxes of the given entities, skipping ones without a position.
pub fn collect_hitboxes<'a, I>(world: &World, ids: I) -> Vec<EntityHitBox>
where
    I: IntoIterator<Item = &'a EntityId>,
{
    ids.into_iter()
        .filter_map(|id| EntityHitBox::from_world(world, *id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(world: &mut World, kind: EntityKind, pos: DVec3) -> EntityId {
        let id = world.spawn();
        world.insert(id, kind);
        world.insert(id, Position(pos));
        id
    }

    #[test]
    fn kinds_map_to_shapes() {
        assert_eq!(hitbox_type_for(EntityKind::ItemDisplay), HitBoxType::ItemDisplayNone);
        assert_eq!(hitbox_type_for(EntityKind::BlockDisplay), HitBoxType::BlockDisplay);
        assert_eq!(hitbox_type_for(EntityKind::Living), HitBoxType::Aabb);
        assert_eq!(hitbox_type_for(EntityKind::Other), HitBoxType::Aabb);
    }

    #[test]
    fn display_position_adds_translation() {
        let mut world = World::default();
        let id = spawn(&mut world, EntityKind::BlockDisplay, DVec3::new(1.0, 0.0, 0.0));
        world.insert(
            id,
            DisplayMeta {
                translation: DVec3::new(0.0, 2.0, 0.0),
                scale: DVec3::splat(3.0),
                ..Default::default()
            },
        );
        let hb = EntityHitBox::from_world(&world, id).unwrap();
        assert_eq!(hb.position(), DVec3::new(1.0, 2.0, 0.0));
        assert_eq!(hb.scale(), DVec3::splat(3.0));
    }

    #[test]
    fn living_scale_comes_from_attribute() {
        let mut world = World::default();
        let id = spawn(&mut world, EntityKind::Living, DVec3::ZERO);
        world.insert(id, ScaleAttribute(2.5));
        world.insert(id, DisplayMeta::default());
        let hb = EntityHitBox::from_world(&world, id).unwrap();
        assert_eq!(hb.scale(), DVec3::splat(2.5));

        let other = spawn(&mut world, EntityKind::Other, DVec3::ZERO);
        assert_eq!(EntityHitBox::from_world(&world, other).unwrap().scale(), DVec3::ONE);
    }

    #[test]
    fn aabb_corners_follow_position() {
        let mut world = World::default();
        let id = spawn(&mut world, EntityKind::Living, DVec3::new(10.0, 64.0, 10.0));
        world.insert(id, BoundingBox::standing(0.6, 1.8));
        let hb = EntityHitBox::from_world(&world, id).unwrap();
        assert_eq!(hb.position(), DVec3::new(10.0, 64.0, 10.0));
        assert_eq!(hb.aabb_min(), Some(DVec3::new(9.7, 64.0, 9.7)));
        assert_eq!(hb.aabb_max(), Some(DVec3::new(10.3, 65.8, 10.3)));
    }

    #[test]
    fn rotations_read_xyzw_metadata() {
        let mut world = World::default();
        let id = spawn(&mut world, EntityKind::ItemDisplay, DVec3::ZERO);
        let half = std::f32::consts::FRAC_1_SQRT_2;
        world.insert(
            id,
            DisplayMeta {
                left_rotation: [0.0, 0.0, half, half],
                ..Default::default()
            },
        );
        let hb = EntityHitBox::from_world(&world, id).unwrap();
        let turned = hb.left_rotation() * DVec3::X;
        assert!((turned - DVec3::Y).length() < 1e-6);
        assert_eq!(hb.right_rotation(), DQuat::IDENTITY);
    }

    #[test]
    fn entity_without_position_is_skipped() {
        let mut world = World::default();
        let ghost = world.spawn();
        world.insert(ghost, EntityKind::Living);
        let real = spawn(&mut world, EntityKind::Living, DVec3::ZERO);
        let hitboxes = collect_hitboxes(&world, &[ghost, real]);
        assert_eq!(hitboxes.len(), 1);
        assert_eq!(hitboxes[0].id(), real);
    }
}

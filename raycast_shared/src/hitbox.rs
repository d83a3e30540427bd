//! Hitbox shapes.
//!
//! A hitbox is one of:
//! - `BlockDisplay`: a parallelepiped spanned by the transformed unit basis,
//!   anchored at its lower corner (how block displays render).
//! - `ItemDisplayNone`: a parallelepiped spanned by the transformed half basis,
//!   centered on the position (item displays with no transform mode).
//! - `Aabb`: an axis-aligned box given by world-space corners.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::math::{transform_basis, HALF_BASIS, UNIT_BASIS};

/// Shape selector for a hitbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HitBoxType {
    BlockDisplay,
    #[default]
    ItemDisplayNone,
    Aabb,
}

/// Anything a ray can be cast against.
pub trait HitBox {
    fn position(&self) -> DVec3;

    fn left_rotation(&self) -> DQuat;

    fn scale(&self) -> DVec3;

    fn right_rotation(&self) -> DQuat;

    fn hitbox_type(&self) -> HitBoxType {
        HitBoxType::ItemDisplayNone
    }

    /// World-space minimum corner. Only `Aabb` hitboxes return one.
    fn aabb_min(&self) -> Option<DVec3> {
        None
    }

    /// World-space maximum corner. Only `Aabb` hitboxes return one.
    fn aabb_max(&self) -> Option<DVec3> {
        None
    }
}

impl<H: HitBox + ?Sized> HitBox for &H {
    fn position(&self) -> DVec3 {
        (**self).position()
    }

    fn left_rotation(&self) -> DQuat {
        (**self).left_rotation()
    }

    fn scale(&self) -> DVec3 {
        (**self).scale()
    }

    fn right_rotation(&self) -> DQuat {
        (**self).right_rotation()
    }

    fn hitbox_type(&self) -> HitBoxType {
        (**self).hitbox_type()
    }

    fn aabb_min(&self) -> Option<DVec3> {
        (**self).aabb_min()
    }

    fn aabb_max(&self) -> Option<DVec3> {
        (**self).aabb_max()
    }
}

/// Edges of a display hitbox after left rotation, scale and right rotation.
pub fn display_edges<H: HitBox + ?Sized>(hitbox: &H) -> [DVec3; 3] {
    let basis = match hitbox.hitbox_type() {
        HitBoxType::BlockDisplay => UNIT_BASIS,
        _ => HALF_BASIS,
    };
    transform_basis(
        basis,
        hitbox.left_rotation(),
        hitbox.scale(),
        hitbox.right_rotation(),
    )
}

/// Component-wise ordered AABB corners, if the hitbox has them.
pub fn aabb_bounds<H: HitBox + ?Sized>(hitbox: &H) -> Option<(DVec3, DVec3)> {
    let a = hitbox.aabb_min()?;
    let b = hitbox.aabb_max()?;
    Some((a.min(b), a.max(b)))
}

/// The eight world-space corners of a hitbox.
pub fn hitbox_corners<H: HitBox + ?Sized>(hitbox: &H) -> Option<[DVec3; 8]> {
    let (anchor, [a, b, c], lo) = match hitbox.hitbox_type() {
        HitBoxType::Aabb => {
            let (min, max) = aabb_bounds(hitbox)?;
            let d = max - min;
            (min, [DVec3::new(d.x, 0.0, 0.0), DVec3::new(0.0, d.y, 0.0), DVec3::new(0.0, 0.0, d.z)], 0.0)
        }
        HitBoxType::BlockDisplay => (hitbox.position(), display_edges(hitbox), 0.0),
        HitBoxType::ItemDisplayNone => (hitbox.position(), display_edges(hitbox), -1.0),
    };

    let mut out = [DVec3::ZERO; 8];
    for (i, corner) in out.iter_mut().enumerate() {
        let pick = |bit: usize| if i & bit != 0 { 1.0 } else { lo };
        *corner = anchor + a * pick(1) + b * pick(2) + c * pick(4);
    }
    Some(out)
}

/// Plain-value hitbox for hosts that keep their own geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticHitBox {
    pub kind: HitBoxType,
    pub position: DVec3,
    #[serde(default = "default_scale")]
    pub scale: DVec3,
    #[serde(default)]
    pub left_rotation: DQuat,
    #[serde(default)]
    pub right_rotation: DQuat,
    #[serde(default)]
    pub aabb: Option<(DVec3, DVec3)>,
}

fn default_scale() -> DVec3 {
    DVec3::ONE
}

impl StaticHitBox {
    /// Unit block display anchored at `corner`.
    pub fn block(corner: DVec3) -> Self {
        Self {
            kind: HitBoxType::BlockDisplay,
            position: corner,
            scale: DVec3::ONE,
            left_rotation: DQuat::IDENTITY,
            right_rotation: DQuat::IDENTITY,
            aabb: None,
        }
    }

    /// Unit item display centered on `center`.
    pub fn item(center: DVec3) -> Self {
        Self {
            kind: HitBoxType::ItemDisplayNone,
            ..Self::block(center)
        }
    }

    pub fn aabb(min: DVec3, max: DVec3) -> Self {
        Self {
            kind: HitBoxType::Aabb,
            aabb: Some((min, max)),
            ..Self::block((min + max) * 0.5)
        }
    }

    pub fn with_scale(mut self, scale: DVec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotations(mut self, left: DQuat, right: DQuat) -> Self {
        self.left_rotation = left;
        self.right_rotation = right;
        self
    }
}

impl HitBox for StaticHitBox {
    fn position(&self) -> DVec3 {
        self.position
    }

    fn left_rotation(&self) -> DQuat {
        self.left_rotation
    }

    fn scale(&self) -> DVec3 {
        self.scale
    }

    fn right_rotation(&self) -> DQuat {
        self.right_rotation
    }

    fn hitbox_type(&self) -> HitBoxType {
        self.kind
    }

    fn aabb_min(&self) -> Option<DVec3> {
        self.aabb.map(|(min, _)| min)
    }

    fn aabb_max(&self) -> Option<DVec3> {
        self.aabb.map(|(_, max)| max)
    }
}

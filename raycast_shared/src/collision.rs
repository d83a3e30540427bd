//! Ray crossings of individual hitboxes.

use std::fmt;

use crate::{
    group::HitBoxGroup,
    math::{Ray, VecRel},
};

/// One crossing of a hitbox surface: either where the ray enters or where it leaves.
pub struct Collision<'g, G: HitBoxGroup + ?Sized> {
    group: &'g G,
    index: usize,
    entry: VecRel,
    exit: VecRel,
    is_entry: bool,
}

impl<'g, G: HitBoxGroup + ?Sized> Clone for Collision<'g, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'g, G: HitBoxGroup + ?Sized> Copy for Collision<'g, G> {}

impl<'g, G: HitBoxGroup + ?Sized> fmt::Debug for Collision<'g, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collision")
            .field("index", &self.index)
            .field("entry", &self.entry)
            .field("exit", &self.exit)
            .field("is_entry", &self.is_entry)
            .finish()
    }
}

impl<'g, G: HitBoxGroup + ?Sized> Collision<'g, G> {
    pub fn group(&self) -> &'g G {
        self.group
    }

    pub fn hitbox(&self) -> &'g G::HitBox {
        &self.group.hitboxes()[self.index]
    }

    /// Position of the hitbox inside its group.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn entry(&self) -> VecRel {
        self.entry
    }

    pub fn exit(&self) -> VecRel {
        self.exit
    }

    pub fn is_entry(&self) -> bool {
        self.is_entry
    }

    /// The crossing point this collision stands for.
    pub fn point(&self) -> VecRel {
        if self.is_entry {
            self.entry
        } else {
            self.exit
        }
    }

    pub fn distance(&self) -> f64 {
        self.point().distance
    }
}

/// Turns a raw intersection interval into an entry/exit pair.
///
/// Returns `None` when the whole interval is behind the ray origin. When the
/// origin is inside the hitbox the entry point is the origin itself.
pub fn to_collisions<'g, G: HitBoxGroup + ?Sized>(
    group: &'g G,
    index: usize,
    ray: &Ray,
    (t_enter, t_exit): (f64, f64),
) -> Option<[Collision<'g, G>; 2]> {
    if t_exit < 0.0 {
        return None;
    }
    let entry = if t_enter < 0.0 {
        VecRel::origin(ray.origin())
    } else {
        VecRel::along(ray, t_enter)
    };
    let exit = VecRel::along(ray, t_exit);
    let make = |is_entry| Collision {
        group,
        index,
        entry,
        exit,
        is_entry,
    };
    Some([make(true), make(false)])
}

/// Inserts keeping ascending distance; equal distances keep insertion order.
pub fn sorted_insert<'g, G: HitBoxGroup + ?Sized>(
    list: &mut Vec<Collision<'g, G>>,
    collision: Collision<'g, G>,
) {
    let d = collision.distance();
    let at = list.partition_point(|c| c.distance() <= d);
    list.insert(at, collision);
}

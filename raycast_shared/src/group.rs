//! Hitbox groups and per-group ray casts.
//!
//! A group is culled by its bounding sphere first. Hitboxes inside are only
//! intersected when the caller asks for collisions, and only once.
//!
//! Rays never cast backward: a group entirely behind the origin is rejected.

use std::{cell::OnceCell, cmp::Ordering};

use glam::DVec3;
use tracing::trace;

use crate::{
    collision::{sorted_insert, to_collisions, Collision},
    hitbox::{hitbox_corners, HitBox},
    intersect::intersect_hitbox,
    math::Ray,
};

/// A set of hitboxes enclosed by a sphere.
///
/// Every hitbox must lie inside the sphere; casts rely on it for culling.
pub trait HitBoxGroup {
    type HitBox: HitBox;

    fn center(&self) -> DVec3;

    fn radius(&self) -> f64;

    fn hitboxes(&self) -> &[Self::HitBox];
}

/// Group that owns its hitboxes and derives its sphere from their corners.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedGroup<H> {
    hitboxes: Vec<H>,
    center: DVec3,
    radius: f64,
}

impl<H: HitBox> BoundedGroup<H> {
    pub fn new(hitboxes: Vec<H>) -> Self {
        let mut group = Self {
            hitboxes,
            center: DVec3::ZERO,
            radius: 0.0,
        };
        group.recompute_bounds();
        group
    }

    pub fn push(&mut self, hitbox: H) {
        self.hitboxes.push(hitbox);
        self.recompute_bounds();
    }

    /// Replaces all hitboxes (e.g. after entities moved).
    pub fn replace(&mut self, hitboxes: Vec<H>) {
        self.hitboxes = hitboxes;
        self.recompute_bounds();
    }

    pub fn len(&self) -> usize {
        self.hitboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hitboxes.is_empty()
    }

    /// Center is the midpoint of the corners' bounding box, radius reaches the farthest corner.
    pub fn recompute_bounds(&mut self) {
        let corners: Vec<DVec3> = self
            .hitboxes
            .iter()
            .filter_map(|h| hitbox_corners(h))
            .flatten()
            .collect();
        if corners.is_empty() {
            self.center = DVec3::ZERO;
            self.radius = 0.0;
            return;
        }
        let (min, max) = corners.iter().fold(
            (DVec3::splat(f64::INFINITY), DVec3::splat(f64::NEG_INFINITY)),
            |(lo, hi), c| (lo.min(*c), hi.max(*c)),
        );
        let center = (min + max) * 0.5;
        self.center = center;
        self.radius = corners
            .iter()
            .map(|c| c.distance(center))
            .fold(0.0, f64::max);
    }
}

impl<H: HitBox> HitBoxGroup for BoundedGroup<H> {
    type HitBox = H;

    fn center(&self) -> DVec3 {
        self.center
    }

    fn radius(&self) -> f64 {
        self.radius
    }

    fn hitboxes(&self) -> &[H] {
        &self.hitboxes
    }
}

/// A ray cast against one group.
pub struct RayCastHitBoxGroup<'g, G: HitBoxGroup + ?Sized> {
    group: &'g G,
    ray: Ray,
    inlet: f64,
    outlet: f64,
    collisions: OnceCell<Vec<Collision<'g, G>>>,
}

impl<'g, G: HitBoxGroup + ?Sized> RayCastHitBoxGroup<'g, G> {
    /// Returns `None` when the ray misses the group's sphere or the sphere is
    /// entirely behind the origin.
    pub fn create_group(group: &'g G, ray: Ray) -> Option<Self> {
        let d = ray.origin() - group.center();
        let r = group.radius();
        let c = d.length_squared() - r * r;
        let half_b = d.dot(ray.dir());
        let disc = half_b * half_b - c;
        if disc < 0.0 {
            trace!(center = ?group.center(), radius = r, "ray misses group sphere");
            return None;
        }
        let sqrt = disc.sqrt();
        if sqrt < half_b {
            trace!(center = ?group.center(), radius = r, "group sphere behind ray");
            return None;
        }
        Some(Self {
            group,
            ray,
            inlet: -half_b - sqrt,
            outlet: -half_b + sqrt,
            collisions: OnceCell::new(),
        })
    }

    pub fn group(&self) -> &'g G {
        self.group
    }

    pub fn ray(&self) -> &Ray {
        &self.ray
    }

    /// Distance where the ray enters the group sphere. Negative when the origin is inside.
    pub fn inlet(&self) -> f64 {
        self.inlet
    }

    /// Distance where the ray leaves the group sphere.
    pub fn outlet(&self) -> f64 {
        self.outlet
    }

    /// All crossings in ascending distance. Computed on first use.
    pub fn collisions(&self) -> &[Collision<'g, G>] {
        self.collisions
            .get_or_init(|| compute_collisions(self.group, &self.ray))
    }

    /// Consumes the cast, returning its crossings.
    pub fn into_collisions(self) -> Vec<Collision<'g, G>> {
        let Self {
            group,
            ray,
            collisions,
            ..
        } = self;
        collisions
            .into_inner()
            .unwrap_or_else(|| compute_collisions(group, &ray))
    }

    /// Distance of the first crossing, if any hitbox is hit.
    pub fn actual_inlet(&self) -> Option<f64> {
        self.collisions().first().map(Collision::distance)
    }

    /// Distance of the last crossing, if any hitbox is hit.
    pub fn actual_outlet(&self) -> Option<f64> {
        self.collisions().last().map(Collision::distance)
    }

    pub fn cursor(&self) -> CollisionCursor<'_, 'g, G> {
        CollisionCursor::new(self.collisions())
    }
}

fn compute_collisions<'g, G: HitBoxGroup + ?Sized>(group: &'g G, ray: &Ray) -> Vec<Collision<'g, G>> {
    let mut list = Vec::new();
    for (index, hitbox) in group.hitboxes().iter().enumerate() {
        let Some(interval) = intersect_hitbox(ray, hitbox) else {
            continue;
        };
        if let Some(pair) = to_collisions(group, index, ray, interval) {
            for c in pair {
                sorted_insert(&mut list, c);
            }
        }
    }
    list
}

impl<'g, G: HitBoxGroup + ?Sized> PartialEq for RayCastHitBoxGroup<'g, G> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<'g, G: HitBoxGroup + ?Sized> Eq for RayCastHitBoxGroup<'g, G> {}

impl<'g, G: HitBoxGroup + ?Sized> PartialOrd for RayCastHitBoxGroup<'g, G> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Groups order by inlet distance.
impl<'g, G: HitBoxGroup + ?Sized> Ord for RayCastHitBoxGroup<'g, G> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inlet.total_cmp(&other.inlet)
    }
}

/// Cursor over a group's crossings.
///
/// Starts before the first crossing. `distance()` is `-1` before the first
/// `advance()` and `f64::MAX` once past the end.
pub struct CollisionCursor<'a, 'g, G: HitBoxGroup + ?Sized> {
    collisions: &'a [Collision<'g, G>],
    index: isize,
}

impl<'a, 'g, G: HitBoxGroup + ?Sized> CollisionCursor<'a, 'g, G> {
    pub fn new(collisions: &'a [Collision<'g, G>]) -> Self {
        Self {
            collisions,
            index: -1,
        }
    }

    pub fn distance(&self) -> f64 {
        if self.index < 0 {
            -1.0
        } else {
            self.current().map_or(f64::MAX, |c| c.distance())
        }
    }

    pub fn current(&self) -> Option<Collision<'g, G>> {
        usize::try_from(self.index)
            .ok()
            .and_then(|i| self.collisions.get(i))
            .copied()
    }

    pub fn has_current(&self) -> bool {
        self.current().is_some()
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.collisions.len() as isize
    }

    /// Moves to the next crossing. Past the end the cursor stays put and returns `None`.
    pub fn advance(&mut self) -> Option<Collision<'g, G>> {
        if !self.has_next() {
            if self.index < self.collisions.len() as isize {
                self.index = self.collisions.len() as isize;
            }
            return None;
        }
        self.index += 1;
        self.current()
    }
}

impl<'a, 'g, G: HitBoxGroup + ?Sized> Iterator for CollisionCursor<'a, 'g, G> {
    type Item = Collision<'g, G>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

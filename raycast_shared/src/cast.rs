//! Ray casts across many groups.
//!
//! Groups are visited in inlet order and a group's hitboxes are only
//! intersected once the next pending crossing is at least as far as the
//! group's inlet. Far groups are never evaluated if iteration stops early.

use std::{collections::VecDeque, iter::Peekable, vec::IntoIter};

use tracing::debug;

use crate::{
    collision::Collision,
    group::{HitBoxGroup, RayCastHitBoxGroup},
    math::Ray,
};

/// Lazily merged crossings of every group a ray passes through.
pub struct MultiGroupCast<'g, G: HitBoxGroup + ?Sized> {
    pending: VecDeque<RayCastHitBoxGroup<'g, G>>,
    active: Vec<Peekable<IntoIter<Collision<'g, G>>>>,
    max_distance: f64,
    evaluated: usize,
}

impl<'g, G: HitBoxGroup + ?Sized> MultiGroupCast<'g, G> {
    pub fn new<I>(groups: I, ray: Ray) -> Self
    where
        I: IntoIterator<Item = &'g G>,
    {
        let mut casts: Vec<_> = groups
            .into_iter()
            .filter_map(|g| RayCastHitBoxGroup::create_group(g, ray))
            .collect();
        casts.sort();
        Self {
            pending: casts.into(),
            active: Vec::new(),
            max_distance: f64::INFINITY,
            evaluated: 0,
        }
    }

    /// Stops iteration at the first crossing farther than `max_distance`.
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Groups whose sphere the ray hits and that are not evaluated yet.
    pub fn pending_groups(&self) -> usize {
        self.pending.len()
    }

    /// Groups whose hitboxes have been intersected so far.
    pub fn evaluated_groups(&self) -> usize {
        self.evaluated
    }

    fn nearest_active(&mut self) -> Option<(usize, f64)> {
        self.active
            .iter_mut()
            .enumerate()
            .filter_map(|(i, it)| it.peek().map(|c| (i, c.distance())))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn activate_front(&mut self) -> bool {
        let Some(cast) = self.pending.pop_front() else {
            return false;
        };
        if cast.inlet() > self.max_distance {
            self.pending.clear();
            return false;
        }
        let inlet = cast.inlet();
        let outlet = cast.outlet();
        let collisions = cast.into_collisions();
        debug!(inlet, outlet, collisions = collisions.len(), "evaluated hitbox group");
        self.evaluated += 1;
        if !collisions.is_empty() {
            self.active.push(collisions.into_iter().peekable());
        }
        true
    }
}

impl<'g, G: HitBoxGroup + ?Sized> Iterator for MultiGroupCast<'g, G> {
    type Item = Collision<'g, G>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let nearest = self.nearest_active();
            let must_activate = match (self.pending.front(), nearest) {
                (Some(group), Some((_, d))) => group.inlet() <= d,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if must_activate && self.activate_front() {
                continue;
            }

            let (i, d) = self.nearest_active()?;
            if d > self.max_distance {
                self.active.clear();
                self.pending.clear();
                return None;
            }
            let next = self.active[i].next();
            if self.active[i].peek().is_none() {
                self.active.remove(i);
            }
            return next;
        }
    }
}

/// First entry crossing along the ray within `max_distance`.
pub fn first_hit<'g, G, I>(groups: I, ray: Ray, max_distance: f64) -> Option<Collision<'g, G>>
where
    G: HitBoxGroup + ?Sized + 'g,
    I: IntoIterator<Item = &'g G>,
{
    MultiGroupCast::new(groups, ray)
        .with_max_distance(max_distance)
        .find(Collision::is_entry)
}

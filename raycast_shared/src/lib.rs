//! `raycast_shared`
//!
//! Ray casting against entity hitboxes.
//!
//! Design goals:
//! - Report every entry and exit crossing, ordered by distance.
//! - Cull whole groups by bounding sphere; intersect hitboxes lazily.
//! - Keep the host entity model (`ecs`, `entity`) separate from the geometry.
//! - No `unsafe`.

pub mod cast;
pub mod collision;
pub mod config;
pub mod console;
pub mod ecs;
pub mod entity;
pub mod group;
pub mod hitbox;
pub mod intersect;
pub mod math;
pub mod scene;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::cast::*;
    pub use crate::collision::Collision;
    pub use crate::group::*;
    pub use crate::hitbox::*;
    pub use crate::math::*;
}

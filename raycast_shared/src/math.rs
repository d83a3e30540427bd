//! Math types.
//!
//! Geometry is double precision (`glam::DVec3`/`DQuat`). Host metadata stores
//! rotations as `f32` quaternions; they are widened here.

use std::fmt;

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Edges of a unit block, anchored at its lower corner.
pub const UNIT_BASIS: [DVec3; 3] = [DVec3::X, DVec3::Y, DVec3::Z];

/// Half edges of a unit item, measured from its center.
pub const HALF_BASIS: [DVec3; 3] = [
    DVec3::new(0.5, 0.0, 0.0),
    DVec3::new(0.0, 0.5, 0.0),
    DVec3::new(0.0, 0.0, 0.5),
];

/// Errors produced when building a ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayCastError {
    ZeroDirection,
    NonFinite,
}

impl fmt::Display for RayCastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RayCastError::ZeroDirection => write!(f, "ray direction has zero length"),
            RayCastError::NonFinite => write!(f, "ray origin or direction is not finite"),
        }
    }
}

impl std::error::Error for RayCastError {}

/// Half-line with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    origin: DVec3,
    dir: DVec3,
}

impl Ray {
    /// Builds a ray, normalizing `dir`.
    pub fn new(origin: DVec3, dir: DVec3) -> Result<Self, RayCastError> {
        if !origin.is_finite() || !dir.is_finite() {
            return Err(RayCastError::NonFinite);
        }
        // Pre-scale by the largest component so the length neither overflows nor underflows.
        let largest = dir.abs().max_element();
        if largest == 0.0 {
            return Err(RayCastError::ZeroDirection);
        }
        Ok(Self {
            origin,
            dir: (dir / largest).normalize(),
        })
    }

    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    /// Unit direction.
    pub fn dir(&self) -> DVec3 {
        self.dir
    }

    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.dir * t
    }
}

/// A point on a ray together with its distance from the ray origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VecRel {
    pub pos: DVec3,
    pub distance: f64,
}

impl VecRel {
    /// The ray origin itself (distance 0).
    pub fn origin(origin: DVec3) -> Self {
        Self {
            pos: origin,
            distance: 0.0,
        }
    }

    pub fn along(ray: &Ray, t: f64) -> Self {
        Self {
            pos: ray.at(t),
            distance: t,
        }
    }
}

/// Converts display metadata rotation (`[x, y, z, w]`) to a unit quaternion.
///
/// A zero quaternion (unset metadata) maps to identity.
pub fn quat_from_xyzw(q: [f32; 4]) -> DQuat {
    let raw = DQuat::from_xyzw(q[0] as f64, q[1] as f64, q[2] as f64, q[3] as f64);
    if raw.length_squared() == 0.0 {
        DQuat::IDENTITY
    } else {
        raw.normalize()
    }
}

/// Applies `right`, then component-wise `scale`, then `left` to every basis vector.
pub fn transform_basis(basis: [DVec3; 3], left: DQuat, scale: DVec3, right: DQuat) -> [DVec3; 3] {
    basis.map(|v| left * ((right * v) * scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_normalizes_direction() {
        let ray = Ray::new(DVec3::ZERO, DVec3::new(0.0, 0.0, 5.0)).unwrap();
        assert_eq!(ray.dir(), DVec3::Z);
        assert_eq!(ray.at(2.0), DVec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn ray_rejects_degenerate_input() {
        assert_eq!(Ray::new(DVec3::ZERO, DVec3::ZERO), Err(RayCastError::ZeroDirection));
        assert_eq!(
            Ray::new(DVec3::new(f64::NAN, 0.0, 0.0), DVec3::X),
            Err(RayCastError::NonFinite)
        );
    }

    #[test]
    fn ray_normalizes_extreme_magnitudes() {
        for dir in [DVec3::new(1e200, 0.0, 0.0), DVec3::new(1e200, -1e200, 1e200), DVec3::new(1e-170, 0.0, 0.0)] {
            let ray = Ray::new(DVec3::ZERO, dir).unwrap();
            assert!((ray.dir().length() - 1.0).abs() < 1e-12, "{:?}", ray.dir());
            assert!(ray.dir().dot(dir.signum()) > 0.0);
        }
        let ray = Ray::new(DVec3::ZERO, DVec3::new(1e200, 0.0, 0.0)).unwrap();
        assert_eq!(ray.dir(), DVec3::X);
        assert!(ray.at(3.0).is_finite());
    }

    #[test]
    fn zero_quaternion_is_identity() {
        assert_eq!(quat_from_xyzw([0.0; 4]), DQuat::IDENTITY);
    }

    #[test]
    fn basis_scales_after_right_rotation() {
        // Quarter turn about Z maps X to Y; scale then stretches Y.
        let right = DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2);
        let out = transform_basis(UNIT_BASIS, DQuat::IDENTITY, DVec3::new(1.0, 3.0, 1.0), right);
        assert!((out[0] - DVec3::new(0.0, 3.0, 0.0)).length() < 1e-9);
    }
}

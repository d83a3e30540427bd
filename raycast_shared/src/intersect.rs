//! Ray/shape intersection.
//!
//! All functions return the raw parametric interval `(t_enter, t_exit)` along
//! the ray; either end may be negative. Callers decide what "behind" means.

use glam::{DMat3, DVec3};

use crate::{
    hitbox::{aabb_bounds, display_edges, HitBox, HitBoxType},
    math::Ray,
};

/// Edge matrices whose determinant is below this fraction of the product of
/// their edge lengths are treated as flat. Independent of the display's size.
pub const DEGENERATE_RATIO: f64 = 1e-12;

/// Slab test against the box `[min, max]`.
pub fn slab_intersection(origin: DVec3, dir: DVec3, min: DVec3, max: DVec3) -> Option<(f64, f64)> {
    let mut tmin = f64::NEG_INFINITY;
    let mut tmax = f64::INFINITY;

    for axis in 0..3 {
        let (o, d) = (origin[axis], dir[axis]);
        if d == 0.0 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let mut t1 = (min[axis] - o) / d;
        let mut t2 = (max[axis] - o) / d;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        tmin = tmin.max(t1);
        tmax = tmax.min(t2);
        if tmin > tmax {
            return None;
        }
    }

    Some((tmin, tmax))
}

/// Maps the ray into the frame spanned by `edges` anchored at `anchor`.
fn to_local(ray: &Ray, edges: [DVec3; 3], anchor: DVec3) -> Option<(DVec3, DVec3)> {
    let m = DMat3::from_cols(edges[0], edges[1], edges[2]);
    let volume: f64 = edges.iter().map(|e| e.length()).product();
    if volume == 0.0 || !volume.is_finite() || m.determinant().abs() < DEGENERATE_RATIO * volume {
        return None;
    }
    let inv = m.inverse();
    Some((inv * (ray.origin() - anchor), inv * ray.dir()))
}

/// Parallelepiped `{corner + u*e0 + v*e1 + w*e2 | u, v, w in [0, 1]}`.
pub fn parallelepiped_corner_intersection(
    ray: &Ray,
    edges: [DVec3; 3],
    corner: DVec3,
) -> Option<(f64, f64)> {
    let (o, d) = to_local(ray, edges, corner)?;
    slab_intersection(o, d, DVec3::ZERO, DVec3::ONE)
}

/// Parallelepiped `{center + u*h0 + v*h1 + w*h2 | u, v, w in [-1, 1]}`.
pub fn parallelepiped_center_intersection(
    ray: &Ray,
    half_edges: [DVec3; 3],
    center: DVec3,
) -> Option<(f64, f64)> {
    let (o, d) = to_local(ray, half_edges, center)?;
    slab_intersection(o, d, DVec3::NEG_ONE, DVec3::ONE)
}

/// Intersects a ray with any hitbox shape.
pub fn intersect_hitbox<H: HitBox + ?Sized>(ray: &Ray, hitbox: &H) -> Option<(f64, f64)> {
    match hitbox.hitbox_type() {
        HitBoxType::BlockDisplay => {
            parallelepiped_corner_intersection(ray, display_edges(hitbox), hitbox.position())
        }
        HitBoxType::ItemDisplayNone => {
            parallelepiped_center_intersection(ray, display_edges(hitbox), hitbox.position())
        }
        HitBoxType::Aabb => {
            let (min, max) = aabb_bounds(hitbox)?;
            slab_intersection(ray.origin(), ray.dir(), min, max)
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::DQuat;

    use super::*;
    use crate::hitbox::StaticHitBox;

    fn ray(o: [f64; 3], d: [f64; 3]) -> Ray {
        Ray::new(DVec3::from_array(o), DVec3::from_array(d)).unwrap()
    }

    fn approx(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn slab_axis_parallel_outside_misses() {
        let r = ray([0.0, 2.0, -5.0], [0.0, 0.0, 1.0]);
        assert_eq!(slab_intersection(r.origin(), r.dir(), DVec3::ZERO, DVec3::ONE), None);
    }

    #[test]
    fn slab_reports_negative_entry_from_inside() {
        let r = ray([0.5, 0.5, 0.5], [1.0, 0.0, 0.0]);
        let hit = slab_intersection(r.origin(), r.dir(), DVec3::ZERO, DVec3::ONE).unwrap();
        assert!(approx(hit, (-0.5, 0.5)));
    }

    #[test]
    fn block_display_is_anchored_at_corner() {
        let hb = StaticHitBox::block(DVec3::new(0.0, 0.0, 5.0));
        let r = ray([0.5, 0.5, 0.0], [0.0, 0.0, 1.0]);
        assert!(approx(intersect_hitbox(&r, &hb).unwrap(), (5.0, 6.0)));
    }

    #[test]
    fn item_display_is_centered() {
        let hb = StaticHitBox::item(DVec3::new(0.0, 0.0, 5.0));
        let r = ray([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
        assert!(approx(intersect_hitbox(&r, &hb).unwrap(), (4.5, 5.5)));
    }

    #[test]
    fn scaled_and_rotated_block() {
        // Block scaled 2x along X, then turned a quarter around Y: X edge now points to -Z.
        let hb = StaticHitBox::block(DVec3::new(0.0, 0.0, 10.0))
            .with_scale(DVec3::new(2.0, 1.0, 1.0))
            .with_rotations(DQuat::from_rotation_y(std::f64::consts::FRAC_PI_2), DQuat::IDENTITY);
        let r = ray([0.5, 0.5, 0.0], [0.0, 0.0, 1.0]);
        assert!(approx(intersect_hitbox(&r, &hb).unwrap(), (8.0, 10.0)));
    }

    #[test]
    fn zero_scale_misses() {
        let hb = StaticHitBox::item(DVec3::ZERO).with_scale(DVec3::new(1.0, 0.0, 1.0));
        let r = ray([0.0, 0.0, -3.0], [0.0, 0.0, 1.0]);
        assert_eq!(intersect_hitbox(&r, &hb), None);
    }

    #[test]
    fn tiny_item_still_hits() {
        let hb = StaticHitBox::item(DVec3::ZERO).with_scale(DVec3::splat(1e-4));
        let r = ray([0.0, 0.0, -1.0], [0.0, 0.0, 1.0]);
        let (t_in, t_out) = intersect_hitbox(&r, &hb).unwrap();
        assert!((t_in - (1.0 - 5e-5)).abs() < 1e-12);
        assert!((t_out - (1.0 + 5e-5)).abs() < 1e-12);
    }

    #[test]
    fn flattened_rotated_block_misses() {
        // Zero depth: rotation does not give it volume.
        let hb = StaticHitBox::block(DVec3::ZERO)
            .with_scale(DVec3::new(1.0, 1.0, 0.0))
            .with_rotations(DQuat::from_rotation_x(0.3), DQuat::IDENTITY);
        let r = ray([0.5, 0.5, -3.0], [0.0, 0.0, 1.0]);
        assert_eq!(intersect_hitbox(&r, &hb), None);
    }

    #[test]
    fn aabb_without_corners_misses() {
        let mut hb = StaticHitBox::aabb(DVec3::ZERO, DVec3::ONE);
        hb.aabb = None;
        let r = ray([0.5, 0.5, -3.0], [0.0, 0.0, 1.0]);
        assert_eq!(intersect_hitbox(&r, &hb), None);
    }
}

//! Scene probe.
//!
//! Loads a scene file and sweeps a fan of rays across it, printing the first
//! entry crossing of each ray and how many groups had to be evaluated.
//!
//! Usage:
//!   scene_probe <scene.json> [x y z] [rays]

use anyhow::Context;
use glam::DVec3;
use raycast_shared::{
    cast::MultiGroupCast,
    ecs::World,
    entity::{collect_hitboxes, EntityHitBox},
    group::BoundedGroup,
    math::Ray,
    scene::SceneFile,
};
use tracing::info;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let path = args.get(1).context("usage: scene_probe <scene.json> [x y z] [rays]")?;
    let origin = match args.get(2..5) {
        Some([x, y, z]) => DVec3::new(x.parse()?, y.parse()?, z.parse()?),
        _ => DVec3::ZERO,
    };
    let rays: u32 = args.get(5).map(|s| s.parse()).transpose()?.unwrap_or(32);

    let scene = SceneFile::load(path)?;
    let mut world = World::default();
    let named = scene.spawn(&mut world);
    let groups: Vec<(String, BoundedGroup<EntityHitBox>)> = named
        .into_iter()
        .map(|(name, ids)| (name, BoundedGroup::new(collect_hitboxes(&world, &ids))))
        .collect();
    info!(scene = %path, groups = groups.len(), %origin, rays, "Probing scene");

    let mut hit_count = 0;
    for i in 0..rays {
        let yaw = std::f64::consts::TAU * i as f64 / rays.max(1) as f64;
        let ray = Ray::new(origin, DVec3::new(yaw.sin(), 0.0, yaw.cos()))?;
        let mut cast = MultiGroupCast::new(groups.iter().map(|(_, g)| g), ray);
        let first = cast.find(|c| c.is_entry());
        match first {
            Some(c) => {
                hit_count += 1;
                let name = groups
                    .iter()
                    .find(|(_, g)| std::ptr::eq(g, c.group()))
                    .map_or("?", |(n, _)| n.as_str());
                println!(
                    "yaw {:6.1}: {} entity {} at {:.3} (groups evaluated: {})",
                    yaw.to_degrees(),
                    name,
                    c.hitbox().id().0,
                    c.distance(),
                    cast.evaluated_groups()
                );
            }
            None => println!("yaw {:6.1}: no hit", yaw.to_degrees()),
        }
    }

    println!("{hit_count}/{rays} rays hit");
    Ok(())
}

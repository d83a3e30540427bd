//! Scene-driven casts through the host.

use std::path::PathBuf;

use glam::DVec3;
use raycast_server::RaycastServer;
use raycast_shared::config::RaycastConfig;
use tokio::sync::mpsc;

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn plaza() -> anyhow::Result<RaycastServer> {
    RaycastServer::new(RaycastConfig {
        scene_path: Some(fixture("plaza.json")),
        ..Default::default()
    })
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn scene_groups_are_loaded() -> anyhow::Result<()> {
    let server = plaza()?;
    assert_eq!(server.group("statues").map(|g| g.members().len()), Some(2));
    assert_eq!(server.group("guards").map(|g| g.members().len()), Some(2));
    Ok(())
}

#[test]
fn cast_crosses_groups_in_order() -> anyhow::Result<()> {
    let server = plaza()?;
    let hits = server.cast(DVec3::new(1.0, 65.0, 0.0), DVec3::Z)?;

    let seen: Vec<(&str, bool)> = hits.iter().map(|h| (h.group.as_str(), h.is_entry)).collect();
    assert_eq!(
        seen,
        vec![
            ("statues", true),
            ("statues", false),
            ("guards", true),
            ("guards", false),
            ("guards", true),
            ("guards", false),
        ]
    );
    let expected = [10.0, 11.0, 19.7, 20.3, 24.7, 25.3];
    for (hit, d) in hits.iter().zip(expected) {
        assert!(close(hit.distance, d), "{} != {}", hit.distance, d);
    }
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    Ok(())
}

#[test]
fn translated_item_is_hit_at_offset() -> anyhow::Result<()> {
    let server = plaza()?;
    // Item at (4, 65, 10) translated up by 0.5: spans y 65.0..66.0.
    let hits = server.cast(DVec3::new(4.0, 65.9, 0.0), DVec3::Z)?;
    assert_eq!(hits.len(), 2);
    assert!(close(hits[0].distance, 9.5));
    assert!(close(hits[1].distance, 10.5));

    let miss = server.cast(DVec3::new(4.0, 64.9, 0.0), DVec3::Z)?;
    assert!(miss.is_empty());
    Ok(())
}

#[test]
fn cast_from_inside_starts_at_origin() -> anyhow::Result<()> {
    let server = plaza()?;
    let hits = server.cast(DVec3::new(1.0, 65.0, 10.5), DVec3::Z)?;
    assert!(hits[0].is_entry);
    assert_eq!(hits[0].distance, 0.0);
    assert_eq!(hits[0].point, DVec3::new(1.0, 65.0, 10.5));
    assert!(close(hits[1].distance, 0.5));
    Ok(())
}

#[test]
fn nothing_behind_the_origin() -> anyhow::Result<()> {
    let server = plaza()?;
    let hits = server.cast(DVec3::new(1.0, 65.0, 30.0), DVec3::Z)?;
    assert!(hits.is_empty());
    Ok(())
}

#[tokio::test]
async fn console_channel_drives_the_host() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();

    let mut server = plaza()?;
    let (tx, rx) = mpsc::channel(8);
    server.set_console_input(rx);

    tx.send("move 2 1 64 40".to_string()).await?;
    tx.send("set rc_max_distance 30".to_string()).await?;
    server.step();

    // Guard 2 moved out of range; guard 3 still answers at 24.7.
    let hits = server.cast(DVec3::new(1.0, 65.0, 0.0), DVec3::Z)?;
    let guards: Vec<f64> = hits
        .iter()
        .filter(|h| h.group == "guards")
        .map(|h| h.distance)
        .collect();
    assert_eq!(guards.len(), 2);
    assert!(close(guards[0], 24.7));

    tx.send("quit".to_string()).await?;
    server.step();
    assert!(server.should_quit());
    Ok(())
}

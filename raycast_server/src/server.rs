//! Server implementation.
//!
//! A headless host in the shape of a game server plugin: it owns entities,
//! sorts them into named hitbox groups and answers raycast queries issued on
//! the console. It supports:
//! - Scene loading (JSON)
//! - Console commands (spawn, move, group, cast, load, status, quit)
//! - Group bounds refresh once per tick for groups whose entities changed
//!
//! Determinism notes:
//! - Groups and entities iterate in name/id order.
//! - Casts read a per-tick snapshot of entity hitboxes.

use std::{collections::BTreeMap, path::Path, time::Duration};

use anyhow::{bail, Context};
use glam::DVec3;
use raycast_shared::{
    cast::MultiGroupCast,
    collision::Collision,
    config::RaycastConfig,
    console::{parse_command_line, Console, CvarFlags, CvarValue},
    ecs::{DisplayMeta, EntityId, EntityKind, Position, World},
    entity::{collect_hitboxes, EntityHitBox},
    group::{BoundedGroup, HitBoxGroup},
    math::Ray,
    scene::{spawn_entity, SceneEntity, SceneFile},
};
use tokio::{sync::mpsc, time::Instant};
use tracing::{debug, info, warn};

/// A named group of entities with a hitbox snapshot.
pub struct EntityGroup {
    name: String,
    members: Vec<EntityId>,
    bounds: BoundedGroup<EntityHitBox>,
}

impl EntityGroup {
    fn new(name: String, members: Vec<EntityId>, world: &World) -> Self {
        let bounds = BoundedGroup::new(collect_hitboxes(world, &members));
        Self {
            name,
            members,
            bounds,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[EntityId] {
        &self.members
    }

    /// Re-reads member hitboxes; returns true if anything changed.
    fn refresh(&mut self, world: &World) -> bool {
        let current = collect_hitboxes(world, &self.members);
        if current.as_slice() == self.bounds.hitboxes() {
            return false;
        }
        self.bounds.replace(current);
        true
    }
}

impl HitBoxGroup for EntityGroup {
    type HitBox = EntityHitBox;

    fn center(&self) -> DVec3 {
        self.bounds.center()
    }

    fn radius(&self) -> f64 {
        self.bounds.radius()
    }

    fn hitboxes(&self) -> &[EntityHitBox] {
        self.bounds.hitboxes()
    }
}

/// One reported crossing.
#[derive(Debug, Clone, PartialEq)]
pub struct CastHit {
    pub group: String,
    pub entity: EntityId,
    pub is_entry: bool,
    pub distance: f64,
    pub point: DVec3,
}

impl std::fmt::Display for CastHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} group={} entity={} d={:.3} at ({:.3}, {:.3}, {:.3})",
            if self.is_entry { "enter" } else { "exit" },
            self.group,
            self.entity.0,
            self.distance,
            self.point.x,
            self.point.y,
            self.point.z
        )
    }
}

/// Raycast host.
pub struct RaycastServer {
    pub cfg: RaycastConfig,
    pub console: Console,
    world: World,
    groups: BTreeMap<String, EntityGroup>,
    tick: u64,
    quit: bool,

    /// Channel for console commands from stdin.
    console_rx: Option<mpsc::Receiver<String>>,
}

impl RaycastServer {
    /// Creates a server, loading the configured scene if any.
    pub fn new(cfg: RaycastConfig) -> anyhow::Result<Self> {
        let mut console = Console::new();
        Self::register_cvars(&mut console, &cfg);

        let mut server = Self {
            cfg,
            console,
            world: World::default(),
            groups: BTreeMap::new(),
            tick: 0,
            quit: false,
            console_rx: None,
        };
        if let Some(path) = server.cfg.scene_path.clone() {
            server.load_scene(&path)?;
        }
        Ok(server)
    }

    fn register_cvars(console: &mut Console, cfg: &RaycastConfig) {
        console.register_cvar(
            "rc_max_distance",
            CvarValue::Float(cfg.max_distance),
            "Crossings beyond this distance are not reported",
            CvarFlags::ARCHIVE,
        );
        console.register_cvar(
            "rc_first_only",
            CvarValue::Bool(false),
            "Report only the first entry crossing",
            CvarFlags::NONE,
        );
        console.register_cvar(
            "sv_tickrate",
            CvarValue::Int(cfg.tick_hz as i64),
            "Host tick rate",
            CvarFlags::ARCHIVE | CvarFlags::READ_ONLY,
        );
    }

    /// Sets the console input receiver.
    pub fn set_console_input(&mut self, rx: mpsc::Receiver<String>) {
        self.console_rx = Some(rx);
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn group(&self, name: &str) -> Option<&EntityGroup> {
        self.groups.get(name)
    }

    /// True once `quit` was executed.
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Spawns an entity with the components its kind needs.
    pub fn spawn(&mut self, kind: EntityKind, position: DVec3, scale: Option<f64>) -> EntityId {
        let display = DisplayMeta {
            scale: DVec3::splat(scale.unwrap_or(1.0)),
            ..Default::default()
        };
        let id = spawn_entity(
            &mut self.world,
            &SceneEntity {
                kind,
                position,
                display: Some(display),
                bounding_box: None,
                scale,
            },
        );
        debug!(id = ?id, ?kind, %position, "Spawned entity");
        id
    }

    /// Moves an entity. Groups pick the change up on the next step.
    pub fn move_entity(&mut self, id: EntityId, position: DVec3) -> anyhow::Result<()> {
        let pos = self
            .world
            .get_mut::<Position>(id)
            .with_context(|| format!("entity {} has no position", id.0))?;
        pos.0 = position;
        Ok(())
    }

    /// Defines (or redefines) a named group.
    pub fn define_group(&mut self, name: &str, members: Vec<EntityId>) -> anyhow::Result<()> {
        if let Some(missing) = members
            .iter()
            .find(|id| self.world.get::<Position>(**id).is_none())
        {
            bail!("entity {} does not exist", missing.0);
        }
        let group = EntityGroup::new(name.to_string(), members, &self.world);
        info!(
            group = %name,
            members = group.members.len(),
            radius = group.radius(),
            "Group defined"
        );
        self.groups.insert(name.to_string(), group);
        Ok(())
    }

    /// Loads a scene file, adding its entities and groups.
    pub fn load_scene<P: AsRef<Path>>(&mut self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let scene = SceneFile::load(path)?;
        let groups = scene.spawn(&mut self.world);
        info!(scene = %path.display(), groups = groups.len(), "Scene loaded");
        for (name, ids) in groups {
            self.define_group(&name, ids)?;
        }
        Ok(())
    }

    /// Casts a ray through every group, honoring the distance and first-hit cvars.
    pub fn cast(&self, origin: DVec3, dir: DVec3) -> anyhow::Result<Vec<CastHit>> {
        let ray = Ray::new(origin, dir)?;
        let max_distance = self.console.float("rc_max_distance", self.cfg.max_distance);
        let cast = MultiGroupCast::new(self.groups.values(), ray).with_max_distance(max_distance);

        let to_hit = |c: Collision<'_, EntityGroup>| CastHit {
            group: c.group().name().to_string(),
            entity: c.hitbox().id(),
            is_entry: c.is_entry(),
            distance: c.distance(),
            point: c.point().pos,
        };

        let hits: Vec<CastHit> = if self.console.flag("rc_first_only") {
            cast.filter(|c| c.is_entry()).take(1).map(to_hit).collect()
        } else {
            cast.map(to_hit).collect()
        };
        debug!(%origin, dir = %ray.dir(), hits = hits.len(), "Cast");
        Ok(hits)
    }

    /// Re-reads hitboxes of every group; returns how many groups changed.
    pub fn refresh_groups(&mut self) -> usize {
        let mut changed = 0;
        for group in self.groups.values_mut() {
            if group.refresh(&self.world) {
                debug!(group = %group.name, radius = group.radius(), "Group bounds refreshed");
                changed += 1;
            }
        }
        changed
    }

    /// Runs the server for a number of ticks.
    pub async fn run_for_ticks(&mut self, ticks: u32) -> anyhow::Result<()> {
        let dt = Duration::from_secs_f64(1.0 / self.cfg.tick_hz.max(1) as f64);
        let mut next = Instant::now();

        for _ in 0..ticks {
            next += dt;
            self.step();
            tokio::time::sleep_until(next).await;
        }
        Ok(())
    }

    /// Executes one tick: console input, then group refresh.
    pub fn step(&mut self) {
        self.process_console_commands();
        self.refresh_groups();
        self.tick += 1;
    }

    fn process_console_commands(&mut self) {
        let lines: Vec<String> = match self.console_rx {
            Some(ref mut rx) => std::iter::from_fn(|| rx.try_recv().ok()).collect(),
            None => Vec::new(),
        };

        for line in lines {
            match self.exec_console(&line) {
                Ok(out) => {
                    for l in out {
                        println!("{}", l);
                    }
                }
                Err(e) => warn!(command = %line, error = %format!("{e:#}"), "Console command failed"),
            }
        }
    }

    /// Executes a console command.
    pub fn exec_console(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        self.console.remember(line);
        let tokens = parse_command_line(line.trim());
        let args: Vec<&str> = tokens.iter().map(String::as_str).collect();

        match args.as_slice() {
            [] => Ok(Vec::new()),
            ["spawn", kind, rest @ ..] if rest.len() == 3 || rest.len() == 4 => {
                let kind: EntityKind = kind.parse()?;
                let pos = parse_vec3(&rest[..3])?;
                let scale = rest.get(3).map(|s| s.parse::<f64>()).transpose().context("scale")?;
                let id = self.spawn(kind, pos, scale);
                Ok(vec![format!("Spawned entity {}", id.0)])
            }
            ["spawn", ..] => Ok(vec!["Usage: spawn <item|block|living|other> x y z [scale]".to_string()]),
            ["move", id, x, y, z] => {
                let id = EntityId(id.parse().context("entity id")?);
                self.move_entity(id, parse_vec3(&[*x, *y, *z])?)?;
                Ok(vec![format!("Moved entity {}", id.0)])
            }
            ["move", ..] => Ok(vec!["Usage: move <id> x y z".to_string()]),
            ["group", name, ids @ ..] if !ids.is_empty() => {
                let members = ids
                    .iter()
                    .map(|s| s.parse().map(EntityId).context("entity id"))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                self.define_group(name, members)?;
                let g = &self.groups[*name];
                Ok(vec![format!(
                    "Group '{}' has {} hitboxes, radius {:.3}",
                    name,
                    g.hitboxes().len(),
                    g.radius()
                )])
            }
            ["group", ..] => Ok(vec!["Usage: group <name> <id...>".to_string()]),
            ["cast", rest @ ..] if rest.len() == 6 => {
                let origin = parse_vec3(&rest[..3])?;
                let dir = parse_vec3(&rest[3..])?;
                let hits = self.cast(origin, dir)?;
                if hits.is_empty() {
                    return Ok(vec!["No hits".to_string()]);
                }
                Ok(hits.iter().map(CastHit::to_string).collect())
            }
            ["cast", ..] => Ok(vec!["Usage: cast x y z dx dy dz".to_string()]),
            ["load", path] => match self.load_scene(path) {
                Ok(()) => Ok(vec![format!("Scene '{}' loaded", path)]),
                Err(e) => Ok(vec![format!("Failed to load scene: {:#}", e)]),
            },
            ["status"] => {
                let mut out = vec![
                    format!("Tick: {}", self.tick),
                    format!("Entities: {}", self.world.spawned()),
                    format!("Groups: {}", self.groups.len()),
                ];
                for g in self.groups.values() {
                    out.push(format!(
                        "  {}: members={} center={} radius={:.3}",
                        g.name,
                        g.members.len(),
                        g.center(),
                        g.radius()
                    ));
                }
                Ok(out)
            }
            ["quit" | "exit"] => {
                info!("Server shutting down");
                self.quit = true;
                Ok(Vec::new())
            }
            _ => self.console.exec_builtin(line),
        }
    }
}

fn parse_vec3(parts: &[&str]) -> anyhow::Result<DVec3> {
    let [x, y, z] = parts else {
        bail!("expected 3 coordinates, got {}", parts.len());
    };
    let f = |s: &str| s.parse::<f64>().with_context(|| format!("bad coordinate '{}'", s));
    Ok(DVec3::new(f(x)?, f(y)?, f(z)?))
}

//! Simulated arena.
//!
//! A ring of creatures around the player with a few walls in between. The
//! player turns in place, the reticle follows whatever creature is straight
//! ahead, and creatures take damage, heal, die and respawn on a seeded
//! schedule.

use std::f64::consts::TAU;

use glam::DVec3;
use healthbar_client::{Aabb, EntityInfo, EntityKind, Health, PlayerView, SimWorld, WorldView};
use healthbar_common::EntityId;
use healthbar_render::Camera;
use tracing::{debug, trace};

/// Creatures spawned around the player.
const CREATURES: u64 = 24;

/// Other players wandering among the creatures.
const PLAYERS: u64 = 2;

/// Player turn rate in radians per second.
const TURN_RATE: f64 = 0.6;

/// Reticle reach in blocks.
const TARGET_REACH: f64 = 5.0;

/// Chance per creature per second of taking a hit.
const HIT_RATE: f64 = 0.25;

/// Chance per creature per second of healing.
const HEAL_RATE: f64 = 0.1;

/// Seconds a dead creature stays gone before respawning.
const RESPAWN_DELAY: f64 = 3.0;

/// Eye height of the local player.
const EYE_HEIGHT: f64 = 1.6;

const PLAYER_ID: EntityId = EntityId::from_raw(1);

/// World, camera and event schedule of one run.
pub struct Scenario {
    world: SimWorld,
    camera: Camera,
    rng: fastrand::Rng,
    yaw: f64,
    now: f64,
    respawns: Vec<(f64, EntityInfo)>,
}

impl Scenario {
    /// Builds the arena from `seed`.
    pub fn new(seed: u64, viewport: (u32, u32)) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut world = SimWorld::new();

        world.set_player(PlayerView {
            entity_id: PLAYER_ID,
            position: DVec3::ZERO,
            yaw: 0.0,
            target: None,
        });

        for i in 0..CREATURES + PLAYERS {
            let angle = i as f64 / (CREATURES + PLAYERS) as f64 * TAU;
            let radius = 3.0 + rng.f64() * 12.0;
            let position = DVec3::new(angle.sin() * radius, rng.f64() * 2.0 - 1.0, angle.cos() * radius);
            let max_health = 10.0 + rng.f32() * 40.0;

            let mut entity = EntityInfo::creature(i + 2, position, max_health).with_height(0.8 + rng.f32() * 1.4);
            if i >= CREATURES {
                entity = entity.with_kind(EntityKind::Player).with_height(1.8);
            }
            world.spawn(entity);
        }

        // A few walls half-way out so some bars lose line of sight
        for i in 0..4 {
            let angle = f64::from(i) * TAU / 4.0 + 0.4;
            let center = DVec3::new(angle.sin() * 6.0, 0.0, angle.cos() * 6.0);
            world.add_obstacle(Aabb::new(
                center - DVec3::new(1.0, 0.0, 1.0),
                center + DVec3::new(1.0, 3.0, 1.0),
            ));
        }

        debug!(
            "Arena built: {} entities, seed {seed}",
            world.entities().len()
        );

        Self {
            world,
            camera: Camera::new(viewport.0, viewport.1),
            rng,
            yaw: 0.0,
            now: 0.0,
            respawns: Vec::new(),
        }
    }

    /// The simulated world.
    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    /// Camera following the player's view.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Advances the arena by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.now += dt;
        self.yaw = (self.yaw + TURN_RATE * dt) % TAU;

        if let Some(player) = self.world.player_mut() {
            player.yaw = self.yaw;
        }
        self.camera
            .look(DVec3::new(0.0, EYE_HEIGHT, 0.0), self.yaw as f32, 0.0);

        self.update_target();
        self.apply_events(dt);
        self.respawn_due();
    }

    fn update_target(&mut self) {
        let forward = DVec3::new(self.yaw.sin(), 0.0, self.yaw.cos());
        let target = self
            .world
            .entities()
            .iter()
            .filter(|e| e.alive && e.kind == EntityKind::Creature)
            .filter_map(|e| {
                let to = e.position - DVec3::new(0.0, EYE_HEIGHT, 0.0);
                let dist = to.length();
                let cos = to.normalize_or_zero().dot(forward);
                (dist <= TARGET_REACH && cos > 0.97).then_some((e.id, dist))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id);
        self.world.set_target(target);
    }

    fn apply_events(&mut self, dt: f64) {
        let ids: Vec<EntityId> = self
            .world
            .entities()
            .iter()
            .filter(|e| e.health.is_some())
            .map(|e| e.id)
            .collect();

        for id in ids {
            let Some(entity) = self.world.entity(id) else {
                continue;
            };
            let Some(health) = entity.health else {
                continue;
            };

            if self.rng.f64() < HIT_RATE * dt {
                let damage = 2.0 + self.rng.f32() * 8.0;
                let current = (health.current - damage).max(0.0);
                trace!("Entity {id} hit for {damage:.1}");
                self.world.set_health(id, current);

                if current <= 0.0 {
                    debug!("Entity {id} died");
                    let mut respawned = entity;
                    respawned.health = Some(Health::new(health.max, health.max));
                    self.respawns.push((self.now + RESPAWN_DELAY, respawned));
                    self.world.despawn(id);
                }
            } else if self.rng.f64() < HEAL_RATE * dt {
                let heal = 1.0 + self.rng.f32() * 4.0;
                self.world.set_health(id, (health.current + heal).min(health.max));
            }
        }
    }

    fn respawn_due(&mut self) {
        let now = self.now;
        let (due, pending): (Vec<_>, Vec<_>) = self.respawns.drain(..).partition(|(at, _)| *at <= now);
        self.respawns = pending;
        for (_, entity) in due {
            trace!("Entity {} respawned", entity.id);
            self.world.spawn(entity);
        }
    }
}

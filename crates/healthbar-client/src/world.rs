//! World collaborator contract.
//!
//! The overlay never owns world entities. It sees them through
//! [`WorldView`], which hands out [`EntityInfo`] value snapshots keyed by
//! [`EntityId`]; a bar state keeps only the id and re-resolves it every
//! frame.
//!
//! [`SimWorld`] is a small in-memory implementation used by tests and the
//! headless simulator.

use std::cell::Cell;

use glam::DVec3;
use healthbar_common::EntityId;

/// Broad category of a world entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Another player
    Player,
    /// Living agent (mob, animal, NPC)
    Creature,
    /// Anything else (item drops, projectiles, block entities)
    Object,
}

/// Read-only health attribute of an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    /// Current health points
    pub current: f32,
    /// Maximum health points
    pub max: f32,
}

impl Health {
    /// Creates a health attribute.
    #[must_use]
    pub const fn new(current: f32, max: f32) -> Self {
        Self { current, max }
    }

    /// Health fraction in `[0, 1]`; max is floored at 1.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        healthbar_common::clamp01(self.current / self.max.max(1.0))
    }
}

/// Value snapshot of a world entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    /// Stable id
    pub id: EntityId,
    /// Entity category
    pub kind: EntityKind,
    /// Liveness flag
    pub alive: bool,
    /// Feet position in world space
    pub position: DVec3,
    /// Collision box height
    pub collision_height: f32,
    /// Selection box height, when it differs from the collision box
    pub selection_height: Option<f32>,
    /// Horizontal offset of the current collision box from its origin box
    pub collision_x_offset: f32,
    /// Health attribute, absent for entities without one
    pub health: Option<Health>,
}

impl EntityInfo {
    /// Live creature with full health.
    #[must_use]
    pub fn creature(id: u64, position: DVec3, max_health: f32) -> Self {
        Self {
            id: EntityId::from_raw(id),
            kind: EntityKind::Creature,
            alive: true,
            position,
            collision_height: 1.0,
            selection_height: None,
            collision_x_offset: 0.0,
            health: Some(Health::new(max_health, max_health)),
        }
    }

    /// Sets the entity kind.
    #[must_use]
    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the health attribute.
    #[must_use]
    pub fn with_health(mut self, health: Option<Health>) -> Self {
        self.health = health;
        self
    }

    /// Sets the collision box height.
    #[must_use]
    pub fn with_height(mut self, height: f32) -> Self {
        self.collision_height = height;
        self
    }

    /// Height used to place rays and bar anchors above the entity.
    #[must_use]
    pub fn height_ref(&self) -> f32 {
        self.selection_height.unwrap_or(self.collision_height)
    }
}

/// The local player as seen by the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    /// Player entity id (never gets a bar of its own)
    pub entity_id: EntityId,
    /// Feet position
    pub position: DVec3,
    /// Camera yaw in radians; forward is `(sin yaw, 0, cos yaw)`
    pub yaw: f64,
    /// Entity under the reticle
    pub target: Option<EntityId>,
}

/// World queries the overlay needs from the host.
pub trait WorldView {
    /// The local player, if spawned.
    fn local_player(&self) -> Option<PlayerView>;

    /// Resolves an entity id. `None` once the entity has left the world.
    fn entity(&self, id: EntityId) -> Option<EntityInfo>;

    /// Entities inside the box of the given half-extents around `center`.
    fn entities_in_box(&self, center: DVec3, horizontal_range: f64, vertical_range: f64) -> Vec<EntityInfo>;

    /// True if solid geometry blocks the segment `from → to`.
    fn raycast_blocked(&self, from: DVec3, to: DVec3) -> bool;
}

/// Axis-aligned solid block used as an occluder by [`SimWorld`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: DVec3,
    /// Maximum corner
    pub max: DVec3,
}

impl Aabb {
    /// Creates a box from two corners.
    #[must_use]
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Slab test against the segment `from → to`.
    #[must_use]
    pub fn intersects_segment(&self, from: DVec3, to: DVec3) -> bool {
        let dir = to - from;
        let mut t_min = 0.0_f64;
        let mut t_max = 1.0_f64;

        for axis in 0..3 {
            let (o, d) = (from[axis], dir[axis]);
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() < 1e-12 {
                if o < lo || o > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (mut t0, mut t1) = ((lo - o) * inv, (hi - o) * inv);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return false;
            }
        }
        true
    }
}

/// In-memory world for tests and the headless simulator.
#[derive(Debug, Default)]
pub struct SimWorld {
    entities: Vec<EntityInfo>,
    obstacles: Vec<Aabb>,
    player: Option<PlayerView>,
    raycasts: Cell<usize>,
}

impl SimWorld {
    /// Creates an empty world without a player.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Places the local player.
    pub fn set_player(&mut self, player: PlayerView) {
        self.player = Some(player);
    }

    /// Mutable access to the local player.
    pub fn player_mut(&mut self) -> Option<&mut PlayerView> {
        self.player.as_mut()
    }

    /// Sets or clears the reticle target.
    pub fn set_target(&mut self, target: Option<EntityId>) {
        if let Some(player) = &mut self.player {
            player.target = target;
        }
    }

    /// Adds an entity, replacing any entity with the same id.
    pub fn spawn(&mut self, entity: EntityInfo) {
        self.despawn(entity.id);
        self.entities.push(entity);
    }

    /// Removes an entity.
    pub fn despawn(&mut self, id: EntityId) {
        self.entities.retain(|e| e.id != id);
    }

    /// Mutable access to an entity.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut EntityInfo> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Sets an entity's current health, if it has a health attribute.
    pub fn set_health(&mut self, id: EntityId, current: f32) {
        if let Some(health) = self.entity_mut(id).and_then(|e| e.health.as_mut()) {
            health.current = current;
        }
    }

    /// Adds a solid occluder.
    pub fn add_obstacle(&mut self, aabb: Aabb) {
        self.obstacles.push(aabb);
    }

    /// All entities, in spawn order.
    #[must_use]
    pub fn entities(&self) -> &[EntityInfo] {
        &self.entities
    }

    /// Number of raycasts performed so far.
    #[must_use]
    pub fn raycast_count(&self) -> usize {
        self.raycasts.get()
    }
}

impl WorldView for SimWorld {
    fn local_player(&self) -> Option<PlayerView> {
        self.player
    }

    fn entity(&self, id: EntityId) -> Option<EntityInfo> {
        self.entities.iter().find(|e| e.id == id).cloned()
    }

    fn entities_in_box(&self, center: DVec3, horizontal_range: f64, vertical_range: f64) -> Vec<EntityInfo> {
        self.entities
            .iter()
            .filter(|e| {
                let d = e.position - center;
                d.x.abs() <= horizontal_range && d.z.abs() <= horizontal_range && d.y.abs() <= vertical_range
            })
            .cloned()
            .collect()
    }

    fn raycast_blocked(&self, from: DVec3, to: DVec3) -> bool {
        self.raycasts.set(self.raycasts.get() + 1);
        self.obstacles.iter().any(|o| o.intersects_segment(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_fraction_floors_max() {
        assert_eq!(Health::new(0.5, 0.0).fraction(), 0.5);
        assert_eq!(Health::new(150.0, 100.0).fraction(), 1.0);
        assert_eq!(Health::new(-5.0, 100.0).fraction(), 0.0);
    }

    #[test]
    fn test_height_ref_prefers_selection_box() {
        let mut e = EntityInfo::creature(1, DVec3::ZERO, 10.0).with_height(1.8);
        assert_eq!(e.height_ref(), 1.8);
        e.selection_height = Some(2.2);
        assert_eq!(e.height_ref(), 2.2);
    }

    #[test]
    fn test_aabb_segment() {
        let wall = Aabb::new(DVec3::new(4.0, 0.0, -5.0), DVec3::new(5.0, 3.0, 5.0));
        assert!(wall.intersects_segment(DVec3::new(0.0, 1.0, 0.0), DVec3::new(10.0, 1.0, 0.0)));
        assert!(!wall.intersects_segment(DVec3::new(0.0, 1.0, 0.0), DVec3::new(3.0, 1.0, 0.0)));
        assert!(!wall.intersects_segment(DVec3::new(0.0, 5.0, 0.0), DVec3::new(10.0, 5.0, 0.0)));
    }

    #[test]
    fn test_entities_in_box_bounds() {
        let mut world = SimWorld::new();
        world.spawn(EntityInfo::creature(1, DVec3::new(3.0, 0.0, 3.0), 10.0));
        world.spawn(EntityInfo::creature(2, DVec3::new(20.0, 0.0, 0.0), 10.0));
        world.spawn(EntityInfo::creature(3, DVec3::new(0.0, 30.0, 0.0), 10.0));

        let found = world.entities_in_box(DVec3::ZERO, 14.0, 14.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, EntityId::from_raw(1));
    }

    #[test]
    fn test_raycast_counts_calls() {
        let world = SimWorld::new();
        assert!(!world.raycast_blocked(DVec3::ZERO, DVec3::X));
        assert_eq!(world.raycast_count(), 1);
    }
}

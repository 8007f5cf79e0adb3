//! Line-of-sight service.
//!
//! One ray from the player's eye to a point near the top of the target.
//! Raycasts are the most expensive step in the pipeline, so callers throttle
//! them (see [`BarRegistry::refresh_visibility`]).
//!
//! [`BarRegistry::refresh_visibility`]: crate::state::BarRegistry::refresh_visibility

use glam::DVec3;

use crate::world::{EntityInfo, WorldView};

/// Eye height above the player's feet.
pub const EYE_HEIGHT: f64 = 1.6;

/// Fraction of the target's height reference aimed at.
pub const TARGET_HEIGHT_FRACTION: f64 = 0.9;

/// Visibility oracle between the local player and a target.
pub trait LineOfSight {
    /// True if nothing solid lies between the player's eye and the target.
    fn has_line_of_sight(&self, target: &EntityInfo) -> bool;
}

/// [`LineOfSight`] backed by [`WorldView::raycast_blocked`].
#[derive(Debug, Clone, Copy)]
pub struct RaycastLineOfSight<'w, W: ?Sized> {
    world: &'w W,
}

impl<'w, W: WorldView + ?Sized> RaycastLineOfSight<'w, W> {
    /// Wraps a world view.
    pub fn new(world: &'w W) -> Self {
        Self { world }
    }

    /// Ray endpoints for a target, or `None` without a local player.
    pub fn ray_for(&self, target: &EntityInfo) -> Option<(DVec3, DVec3)> {
        let player = self.world.local_player()?;
        let from = player.position + DVec3::Y * EYE_HEIGHT;
        let to = target.position + DVec3::Y * (TARGET_HEIGHT_FRACTION * f64::from(target.height_ref()));
        Some((from, to))
    }
}

impl<W: WorldView + ?Sized> LineOfSight for RaycastLineOfSight<'_, W> {
    fn has_line_of_sight(&self, target: &EntityInfo) -> bool {
        match self.ray_for(target) {
            Some((from, to)) => !self.world.raycast_blocked(from, to),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Aabb, PlayerView, SimWorld};
    use healthbar_common::EntityId;

    fn world() -> SimWorld {
        let mut world = SimWorld::new();
        world.set_player(PlayerView {
            entity_id: EntityId::from_raw(1000),
            position: DVec3::ZERO,
            yaw: 0.0,
            target: None,
        });
        world
    }

    #[test]
    fn test_clear_line() {
        let world = world();
        let target = EntityInfo::creature(1, DVec3::new(0.0, 0.0, 8.0), 10.0);
        assert!(RaycastLineOfSight::new(&world).has_line_of_sight(&target));
        assert_eq!(world.raycast_count(), 1);
    }

    #[test]
    fn test_wall_blocks() {
        let mut world = world();
        world.add_obstacle(Aabb::new(DVec3::new(-2.0, 0.0, 4.0), DVec3::new(2.0, 3.0, 5.0)));
        let target = EntityInfo::creature(1, DVec3::new(0.0, 0.0, 8.0), 10.0);
        assert!(!RaycastLineOfSight::new(&world).has_line_of_sight(&target));
    }

    #[test]
    fn test_low_wall_below_ray() {
        let mut world = world();
        // Ray runs from y=1.6 to y=1.62; a 1 m wall does not block it
        world.add_obstacle(Aabb::new(DVec3::new(-2.0, 0.0, 4.0), DVec3::new(2.0, 1.0, 5.0)));
        let target = EntityInfo::creature(1, DVec3::new(0.0, 0.0, 8.0), 10.0).with_height(1.8);
        assert!(RaycastLineOfSight::new(&world).has_line_of_sight(&target));
    }

    #[test]
    fn test_ray_aims_at_height_reference() {
        let world = world();
        let mut target = EntityInfo::creature(1, DVec3::new(0.0, 2.0, 8.0), 10.0).with_height(2.0);
        target.selection_height = Some(3.0);
        let (from, to) = RaycastLineOfSight::new(&world).ray_for(&target).expect("player");
        assert_eq!(from, DVec3::new(0.0, 1.6, 0.0));
        assert!((to.y - (2.0 + 0.9 * 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_no_player_means_not_visible() {
        let world = SimWorld::new();
        let target = EntityInfo::creature(1, DVec3::new(0.0, 0.0, 8.0), 10.0);
        assert!(!RaycastLineOfSight::new(&world).has_line_of_sight(&target));
        assert_eq!(world.raycast_count(), 0);
    }
}

//! # Healthbar Client
//!
//! Client-side logic of the overhead health bar overlay.
//!
//! This crate decides which entities carry a bar and tracks each bar's
//! lifecycle:
//! - World collaborator contract and an in-memory world
//! - Eligibility and horizontal FOV filtering
//! - Target-only and around selection strategies
//! - Throttled line-of-sight checks
//! - Bar states (fade, displayed health, removal) in a registry keyed by id
//! - The tick-rate update loop tying them together

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod filter;
pub mod los;
pub mod selection;
pub mod state;
pub mod system;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::filter::*;
    pub use crate::los::*;
    pub use crate::selection::*;
    pub use crate::state::*;
    pub use crate::system::*;
    pub use crate::world::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use healthbar_common::{ConfigProvider, EntityId, HealthBarConfig};
    use std::sync::Arc;

    #[test]
    fn test_pipeline_tracks_nearby_creatures() {
        let mut world = SimWorld::new();
        world.set_player(PlayerView {
            entity_id: EntityId::from_raw(1),
            position: DVec3::ZERO,
            yaw: 0.0,
            target: None,
        });
        for i in 2..12 {
            world.spawn(EntityInfo::creature(i, DVec3::new(0.0, 0.0, i as f64), 20.0));
        }

        let provider = Arc::new(ConfigProvider::new(HealthBarConfig::default()));
        let mut client = HealthBarClient::new(provider);
        client.tick(SCAN_INTERVAL, &world);

        // Default cap is 7, the closest ones win
        assert_eq!(client.registry().len(), 7);
        assert!(client.registry().get(EntityId::from_raw(2)).is_some());
        assert!(client.registry().get(EntityId::from_raw(11)).is_none());
    }
}

//! # Healthbar Common
//!
//! Common types, utilities, and shared abstractions for the overhead health
//! bar overlay.
//!
//! This crate provides foundational types used by the client and render
//! crates:
//! - ID types (EntityId)
//! - Colors and health-threshold color selection inputs
//! - Small float helpers (clamp01, lerp, swapped-bound clamping)
//! - Deterministic per-entity jitter
//! - Configuration model, immutable snapshots and the change-notifying provider
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod color;
pub mod config;
pub mod error;
pub mod ids;
pub mod jitter;
pub mod math;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::color::*;
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::jitter::*;
    pub use crate::math::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_roundtrip() {
        let id = EntityId::from_raw(42);
        assert_eq!(id.raw(), 42);
        assert!(id.is_valid());
        assert!(!EntityId::NULL.is_valid());
    }

    #[test]
    fn test_default_snapshot_is_enabled() {
        let snapshot = ConfigSnapshot::default();
        assert!(snapshot.enabled);
        assert_eq!(snapshot.theme_id, "basic");
    }

    #[test]
    fn test_jitter_is_stable_across_calls() {
        let id = EntityId::from_raw(1234);
        assert_eq!(jitter01(id), jitter01(id));
    }
}

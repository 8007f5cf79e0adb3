//! Eligibility and horizontal field-of-view predicates.

use glam::DVec3;
use healthbar_common::ConfigSnapshot;

use crate::world::{EntityInfo, EntityKind};

/// Horizontal distance below which an entity counts as in view.
const FOV_NEAR_EPSILON: f64 = 0.01;

/// Whether an entity may carry a bar.
///
/// False for absent or dead entities, players when `show_on_player` is off,
/// non-agent objects, and anything without a health attribute.
#[must_use]
pub fn is_eligible(entity: Option<&EntityInfo>, cfg: &ConfigSnapshot) -> bool {
    let Some(entity) = entity else {
        return false;
    };
    if !entity.alive {
        return false;
    }
    match entity.kind {
        EntityKind::Player if !cfg.show_on_player => return false,
        EntityKind::Object => return false,
        _ => {}
    }
    entity.health.is_some()
}

/// Cosine of half the horizontal FOV, given in degrees.
#[must_use]
pub fn cos_half_fov(fov_degrees: f32) -> f64 {
    (f64::from(fov_degrees).to_radians() * 0.5).cos()
}

/// Horizontal unit forward vector for a camera yaw.
#[must_use]
pub fn forward_from_yaw(yaw: f64) -> DVec3 {
    DVec3::new(yaw.sin(), 0.0, yaw.cos()).normalize_or_zero()
}

/// Squared distance on the horizontal (XZ) plane.
#[inline]
#[must_use]
pub fn horizontal_distance_sq(a: DVec3, b: DVec3) -> f64 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    dx * dx + dz * dz
}

/// Whether `entity_pos` lies inside the horizontal view cone.
///
/// Vertical offset is ignored. Entities (almost) directly above or below the
/// player are always in view.
#[must_use]
pub fn is_in_fov(player_pos: DVec3, entity_pos: DVec3, forward: DVec3, cos_half_fov: f64) -> bool {
    let dx = entity_pos.x - player_pos.x;
    let dz = entity_pos.z - player_pos.z;
    let len = dx.hypot(dz);
    if len < FOV_NEAR_EPSILON {
        return true;
    }

    let dot = ((dx * forward.x + dz * forward.z) / len).clamp(-1.0, 1.0);
    dot >= cos_half_fov
}

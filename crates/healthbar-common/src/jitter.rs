//! Deterministic per-entity jitter.
//!
//! Periodic per-entity work (line-of-sight checks) is offset by a value
//! derived from the entity id so that entities spawned together do not all
//! raycast on the same tick. The value is a pure function of the id: no
//! global random state, same result every run.

use crate::ids::EntityId;

/// Pseudo-random value in `[0, 1)` derived from an entity id.
///
/// One xorshift32 round over the low 32 bits of the id, keeping 16 bits of
/// the result.
#[inline]
#[must_use]
pub fn jitter01(id: EntityId) -> f32 {
    let mut x = id.raw() as u32;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    (x & 0xFFFF) as f32 / 65536.0
}

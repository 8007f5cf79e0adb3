//! Float helpers shared by the animation and layout code.

/// Opacity at or below which a bar counts as fully faded.
pub const FADED_EPSILON: f32 = 0.001;

/// Clamps to `[0, 1]`. NaN maps to 0.
#[inline]
#[must_use]
pub fn clamp01(v: f32) -> f32 {
    if v >= 1.0 {
        1.0
    } else if v > 0.0 {
        v
    } else {
        0.0
    }
}

/// Linear interpolation from `a` to `b`.
#[inline]
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamps `v` between two bounds given in either order.
///
/// A config with `min > max` is accepted and the bounds are swapped rather
/// than rejected.
#[inline]
#[must_use]
pub fn clamp_unordered(v: f32, a: f32, b: f32) -> f32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    v.max(lo).min(hi)
}

//! Bar themes.
//!
//! A theme turns one [`BarRenderData`] into draw calls. Two themes exist:
//! the flat [`BasicTheme`] and the texture-atlas [`TiledTheme`]. They form a
//! closed set dispatched through [`Theme`].

pub mod basic;
pub mod definition;
pub mod registry;
pub mod tiled;

pub use basic::BasicTheme;
pub use definition::{ThemeDefinition, TileSet};
pub use registry::{normalize_theme_id, ThemeRegistry};
pub use tiled::{FillPlan, TiledLayout, TiledTheme};

use healthbar_common::{ConfigSnapshot, EntityId, HealthBarResult, Rgba};

use crate::backend::{Rect, RenderBackend};
use crate::text::DigitFont;

/// Everything a theme needs to draw one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarRenderData {
    /// Entity the bar belongs to
    pub entity: EntityId,
    /// Current health points
    pub current_health: f32,
    /// Maximum health points, at least 1
    pub max_health: f32,
    /// Raw health fraction in `[0, 1]`
    pub health_fraction: f32,
    /// Displayed (eased) health fraction in `[0, 1]`
    pub shown_fraction: f32,
    /// Bar rectangle in screen pixels
    pub rect: Rect,
    /// Distance scale applied to the configured bar size
    pub scale: f32,
    /// Opacity in `[0, 1]`
    pub opacity: f32,
    /// Whether the entity is the reticle target
    pub is_target: bool,
}

impl BarRenderData {
    /// Integer health percent used for color thresholds.
    #[must_use]
    pub fn health_percent(&self) -> i32 {
        health_percent(self.current_health, self.max_health)
    }

    /// Fill color for this bar with its opacity applied.
    #[must_use]
    pub fn fill_color(&self, cfg: &ConfigSnapshot) -> Rgba {
        cfg.health_color(self.health_percent()).with_alpha(self.opacity)
    }
}

/// `current × 100 / max` truncated, clamped to `0..=100`; max floored at 1.
#[must_use]
pub fn health_percent(current: f32, max: f32) -> i32 {
    (current * 100.0 / max.max(1.0)).clamp(0.0, 100.0) as i32
}

/// Shared, read-only inputs of one frame.
#[derive(Debug, Clone, Copy)]
pub struct ThemeRenderContext<'a> {
    /// Config snapshot of this frame
    pub config: &'a ConfigSnapshot,
    /// Digit font for the health text
    pub digits: &'a DigitFont,
    /// UI scale factor
    pub gui_scale: f32,
}

impl ThemeRenderContext<'_> {
    /// Draws the `current/max` text inside `area` when enabled.
    pub fn draw_health_text<B: RenderBackend + ?Sized>(&self, backend: &mut B, data: &BarRenderData, area: Rect) {
        if self.config.show_hp_text {
            self.digits.draw_health(
                backend,
                data.current_health,
                data.max_health,
                area,
                data.opacity,
                self.gui_scale,
            );
        }
    }
}

/// Interface shared by all themes.
pub trait BarTheme {
    /// Lower-case theme id.
    fn id(&self) -> &str;

    /// Creates GPU resources; idempotent.
    fn ensure_resources<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> HealthBarResult<()>;

    /// Draws one bar.
    fn render<B: RenderBackend + ?Sized>(&mut self, data: &BarRenderData, ctx: &ThemeRenderContext<'_>, backend: &mut B);

    /// Frees GPU resources.
    fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B);
}

/// Closed set of themes.
#[derive(Debug)]
pub enum Theme {
    /// Flat colored bar
    Basic(BasicTheme),
    /// Texture atlas bar
    Tiled(TiledTheme),
}

impl BarTheme for Theme {
    fn id(&self) -> &str {
        match self {
            Self::Basic(t) => t.id(),
            Self::Tiled(t) => t.id(),
        }
    }

    fn ensure_resources<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> HealthBarResult<()> {
        match self {
            Self::Basic(t) => t.ensure_resources(backend),
            Self::Tiled(t) => t.ensure_resources(backend),
        }
    }

    fn render<B: RenderBackend + ?Sized>(&mut self, data: &BarRenderData, ctx: &ThemeRenderContext<'_>, backend: &mut B) {
        match self {
            Self::Basic(t) => t.render(data, ctx, backend),
            Self::Tiled(t) => t.render(data, ctx, backend),
        }
    }

    fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        match self {
            Self::Basic(t) => t.release(backend),
            Self::Tiled(t) => t.release(backend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(current: f32, max: f32) -> BarRenderData {
        BarRenderData {
            entity: EntityId::from_raw(1),
            current_health: current,
            max_health: max,
            health_fraction: current / max,
            shown_fraction: current / max,
            rect: Rect::new(0.0, 0.0, 66.0, 7.0),
            scale: 1.0,
            opacity: 0.5,
            is_target: false,
        }
    }

    #[test]
    fn test_health_percent_clamps() {
        assert_eq!(health_percent(150.0, 100.0), 100);
        assert_eq!(health_percent(-1.0, 100.0), 0);
        assert_eq!(health_percent(0.5, 0.0), 50);
        assert_eq!(health_percent(7.0, 20.0), 35);
        assert_eq!(health_percent(60.0, 100.0), 60);
        assert_eq!(health_percent(25.0, 100.0), 25);
    }

    #[test]
    fn test_color_scenario() {
        let cfg = ConfigSnapshot::default();
        assert_eq!(data(80.0, 100.0).fill_color(&cfg), cfg.full_health_color.with_alpha(0.5));
        assert_eq!(data(55.0, 100.0).fill_color(&cfg), cfg.mid_health_color.with_alpha(0.5));
        assert_eq!(data(20.0, 100.0).fill_color(&cfg), cfg.low_health_color.with_alpha(0.5));
        // Thresholds are inclusive
        assert_eq!(data(60.0, 100.0).fill_color(&cfg), cfg.mid_health_color.with_alpha(0.5));
        assert_eq!(data(25.0, 100.0).fill_color(&cfg), cfg.low_health_color.with_alpha(0.5));
        assert_eq!(data(61.0, 100.0).fill_color(&cfg), cfg.full_health_color.with_alpha(0.5));
    }
}

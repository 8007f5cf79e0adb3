//! Frame-rate batch renderer.
//!
//! Once per frame every tracked bar whose entity is still alive gets its
//! opacity and displayed health advanced, is projected above the entity's
//! head, sized by distance, and handed to the active theme.

use glam::{DVec3, Vec3};
use healthbar_client::{BarRegistry, Health, HealthBarClient, WorldView};
use healthbar_common::{clamp_unordered, ConfigSnapshot, FADED_EPSILON};
use tracing::{debug, trace};

use crate::assets::AssetSource;
use crate::backend::{Rect, RenderBackend};
use crate::camera::ScreenProjector;
use crate::text::DigitFont;
use crate::theme::{normalize_theme_id, BarRenderData, BarTheme, ThemeRegistry, ThemeRenderContext};

/// Depth at which bars are drawn at their maximum scale.
pub const BASE_SCALE_DIVIDER: f32 = 4.0;

/// Health reported for entities without a health attribute.
const NO_HEALTH: Health = Health::new(0.0, 1.0);

/// What one frame drew, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Bars handed to the theme
    pub drawn: usize,
    /// Bars skipped because their anchor is behind the camera
    pub behind_camera: usize,
    /// Bars skipped because they are invisible and fully faded
    pub faded: usize,
}

/// Screen placement of one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarPlacement {
    /// Bar rectangle, top-left origin
    pub rect: Rect,
    /// Size scale applied to the configured bar size
    pub scale: f32,
    /// Scale applied to the vertical offset
    pub offset_scale: f32,
}

impl BarPlacement {
    /// Places a bar above a projected anchor `(x, y, depth)`.
    ///
    /// Returns `None` when the anchor is behind the camera.
    #[must_use]
    pub fn compute(screen: Vec3, cfg: &ConfigSnapshot) -> Option<Self> {
        if screen.z < 0.0 {
            return None;
        }

        let dist_scale = BASE_SCALE_DIVIDER / screen.z.max(1.0);
        let scale = clamp_unordered(
            dist_scale * cfg.max_scale / BASE_SCALE_DIVIDER,
            cfg.min_scale,
            cfg.max_scale,
        );
        let offset_scale = clamp_unordered(
            dist_scale * cfg.max_offset_scale / BASE_SCALE_DIVIDER,
            cfg.min_offset_scale,
            cfg.max_offset_scale,
        );

        let w = scale * cfg.bar_width;
        let h = scale * cfg.bar_height;
        let x = screen.x - w * 0.5;
        let y = screen.y - h - cfg.vertical_offset * offset_scale;

        Some(Self {
            rect: Rect::new(x, y, w, h),
            scale,
            offset_scale,
        })
    }
}

/// Draws the bars tracked by a [`BarRegistry`].
#[derive(Debug)]
pub struct HealthBarRenderer {
    themes: ThemeRegistry,
    digits: DigitFont,
    current_theme: String,
    gui_scale: f32,
}

impl HealthBarRenderer {
    /// Creates a renderer loading theme documents from `assets`.
    pub fn new(assets: impl AssetSource + 'static) -> Self {
        Self {
            themes: ThemeRegistry::new(assets),
            digits: DigitFont::new(),
            current_theme: String::new(),
            gui_scale: 1.0,
        }
    }

    /// Sets the UI scale factor used for outlines and digits.
    pub fn set_gui_scale(&mut self, gui_scale: f32) {
        self.gui_scale = gui_scale.max(0.0);
    }

    /// UI scale factor.
    #[must_use]
    pub fn gui_scale(&self) -> f32 {
        self.gui_scale
    }

    /// Forces the theme to be resolved again on the next frame. Themes that
    /// failed to load are retried.
    pub fn invalidate_theme(&mut self) {
        self.current_theme.clear();
        self.themes.forget_failures();
    }

    /// Id of the theme resolved last frame, empty before the first frame.
    #[must_use]
    pub fn current_theme(&self) -> &str {
        &self.current_theme
    }

    /// Draws one frame of bars from `registry`.
    pub fn render_frame<W, P, B>(
        &mut self,
        dt: f32,
        registry: &mut BarRegistry,
        world: &W,
        projector: &P,
        backend: &mut B,
        cfg: &ConfigSnapshot,
    ) -> FrameStats
    where
        W: WorldView + ?Sized,
        P: ScreenProjector + ?Sized,
        B: RenderBackend + ?Sized,
    {
        let mut stats = FrameStats::default();
        if !cfg.enabled {
            return stats;
        }

        let theme_id = normalize_theme_id(&cfg.theme_id);
        if theme_id != self.current_theme {
            debug!("Resolving theme '{theme_id}'");
            self.current_theme = theme_id;
        }
        if cfg.show_hp_text {
            self.digits.ensure(backend);
        }

        let theme = self.themes.get_or_create(&self.current_theme, backend);
        let ctx = ThemeRenderContext {
            config: cfg,
            digits: &self.digits,
            gui_scale: self.gui_scale,
        };

        for state in registry.iter_mut() {
            // Bars of gone or dead entities keep fading so the client can drop them
            let opacity = state.advance_opacity(dt, cfg.fade_in_seconds, cfg.fade_out_seconds);
            let Some(entity) = world.entity(state.entity()).filter(|e| e.alive) else {
                continue;
            };

            if opacity <= FADED_EPSILON && !state.visible_this_frame() {
                stats.faded += 1;
                continue;
            }

            let health = entity.health.unwrap_or(NO_HEALTH);
            let raw = health.fraction();
            let shown = state.advance_shown_health(raw, dt);

            let anchor = entity.position
                + DVec3::new(
                    f64::from(entity.collision_x_offset),
                    f64::from(entity.height_ref()),
                    0.0,
                );
            let Some(placement) = BarPlacement::compute(projector.project_to_screen(anchor), cfg) else {
                stats.behind_camera += 1;
                continue;
            };

            let data = BarRenderData {
                entity: entity.id,
                current_health: health.current,
                max_health: health.max.max(1.0),
                health_fraction: raw,
                shown_fraction: shown,
                rect: placement.rect,
                scale: placement.scale,
                opacity,
                is_target: state.is_target(),
            };
            theme.render(&data, &ctx, backend);
            stats.drawn += 1;
        }

        trace!(
            "Frame drew {} bars ({} behind camera, {} faded)",
            stats.drawn,
            stats.behind_camera,
            stats.faded
        );
        stats
    }

    /// Draws one frame for `client`, picking up its pending theme
    /// invalidation and current config.
    pub fn render_client<W, P, B>(
        &mut self,
        dt: f32,
        client: &mut HealthBarClient,
        world: &W,
        projector: &P,
        backend: &mut B,
    ) -> FrameStats
    where
        W: WorldView + ?Sized,
        P: ScreenProjector + ?Sized,
        B: RenderBackend + ?Sized,
    {
        if client.take_theme_invalidation() {
            self.invalidate_theme();
        }
        let cfg = client.config().snapshot();
        self.render_frame(dt, client.registry_mut(), world, projector, backend, &cfg)
    }

    /// Frees every theme and the digit atlas.
    pub fn dispose<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        self.themes.dispose(backend);
        self.digits.release(backend);
        self.current_theme.clear();
    }
}

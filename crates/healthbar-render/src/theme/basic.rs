//! Flat theme: outline, translucent background, centered colored fill.

use healthbar_common::{HealthBarResult, Rgba, BASIC_THEME_ID};

use super::{BarRenderData, BarTheme, ThemeRenderContext};
use crate::backend::{DrawCall, MeshId, QuadMesh, Rect, RenderBackend, Topology};

/// Outline thickness in UI pixels.
const BORDER_PX: f32 = 1.0;

/// Background alpha before opacity.
const BACKGROUND_ALPHA: f32 = 0.6;

/// Untextured bar drawn from two unit meshes.
#[derive(Debug, Default)]
pub struct BasicTheme {
    border: Option<MeshId>,
    quad: Option<MeshId>,
}

impl BasicTheme {
    /// Creates the theme without GPU resources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BarTheme for BasicTheme {
    fn id(&self) -> &str {
        BASIC_THEME_ID
    }

    fn ensure_resources<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> HealthBarResult<()> {
        if self.border.is_none() {
            self.border = Some(backend.upload_mesh(&QuadMesh::unit(), Topology::LineLoop));
        }
        if self.quad.is_none() {
            self.quad = Some(backend.upload_mesh(&QuadMesh::unit(), Topology::Triangles));
        }
        Ok(())
    }

    fn render<B: RenderBackend + ?Sized>(&mut self, data: &BarRenderData, ctx: &ThemeRenderContext<'_>, backend: &mut B) {
        if self.ensure_resources(backend).is_err() {
            return;
        }
        let (Some(border), Some(quad)) = (self.border, self.quad) else {
            return;
        };

        let rect = data.rect;
        let bp = BORDER_PX * ctx.gui_scale;

        backend.draw(&DrawCall {
            mesh: border,
            texture: None,
            rect: rect.inflate(bp),
            color: ctx.config.frame_color.with_alpha(data.opacity),
        });

        backend.draw(&DrawCall {
            mesh: quad,
            texture: None,
            rect,
            color: Rgba::BLACK.with_alpha(BACKGROUND_ALPHA * data.opacity),
        });

        let fill_w = data.shown_fraction * rect.w;
        backend.draw(&DrawCall {
            mesh: quad,
            texture: None,
            rect: Rect::new(rect.x + (rect.w - fill_w) * 0.5, rect.y, fill_w, rect.h),
            color: data.fill_color(ctx.config),
        });

        ctx.draw_health_text(backend, data, rect);
    }

    fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(mesh) = self.border.take() {
            backend.delete_mesh(mesh);
        }
        if let Some(mesh) = self.quad.take() {
            backend.delete_mesh(mesh);
        }
    }
}

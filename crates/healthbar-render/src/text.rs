//! Bitmap digit font for the `current/max` health overlay.
//!
//! The atlas is a single row of 11 glyphs, `0123456789/`, each 6×8 pixels.

use healthbar_common::Rgba;
use tracing::warn;

use crate::backend::{DrawCall, MeshId, QuadMesh, Rect, RenderBackend, TextureId, Topology};

/// Glyph width in atlas pixels.
pub const GLYPH_W: f32 = 6.0;

/// Glyph height in atlas pixels.
pub const GLYPH_H: f32 = 8.0;

/// Glyphs in atlas order.
pub const GLYPH_MAP: &str = "0123456789/";

/// Number of glyphs in the atlas.
pub const GLYPH_COUNT: usize = 11;

/// Default atlas texture path.
pub const DIGITS_TEXTURE: &str = "textures/gui/digits.png";

const MIN_TEXT_HEIGHT: f32 = 10.0;
const MAX_TEXT_HEIGHT: f32 = 18.0;
const TEXT_HEIGHT_FILL: f32 = 0.85;
const MIN_GLYPH_SCALE: f32 = 0.5;
const MAX_GLYPH_SCALE: f32 = 4.0;
const SHADOW_LEVEL: f32 = 0.55;
const MIN_TEXT_OPACITY: f32 = 0.01;

/// Atlas index of a character.
#[must_use]
pub fn glyph_index(c: char) -> Option<usize> {
    match c {
        '/' => Some(10),
        '0'..='9' => Some(c as usize - '0' as usize),
        _ => None,
    }
}

/// `ceil(current)/ceil(max)` with current floored at 0 and max at 1.
#[must_use]
pub fn format_health(current: f32, max: f32) -> String {
    let current = (current.ceil() as i32).max(0);
    let max = (max.ceil() as i32).max(1);
    format!("{current}/{max}")
}

/// Placement of a health string inside a bar area.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitLayout {
    /// Text to draw
    pub text: String,
    /// Left edge of the first glyph (rounded)
    pub x: f32,
    /// Top edge (rounded)
    pub y: f32,
    /// Scaled glyph width
    pub glyph_w: f32,
    /// Scaled glyph height
    pub glyph_h: f32,
}

impl DigitLayout {
    /// Fits the health text into `area`, or `None` if it would not be legible
    /// or would not fit.
    #[must_use]
    pub fn fit(current: f32, max: f32, area: Rect, gui_scale: f32) -> Option<Self> {
        let text = format_health(current, max);

        let margin = gui_scale.max(1.0);
        let avail_w = area.w - 2.0 * margin;
        let avail_h = area.h - 2.0 * margin;
        if avail_w <= 0.0 || avail_h <= 0.0 {
            return None;
        }

        let desired_h = avail_h * TEXT_HEIGHT_FILL;
        if desired_h < MIN_TEXT_HEIGHT * gui_scale {
            return None;
        }
        let target_h = desired_h.min(MAX_TEXT_HEIGHT * gui_scale);

        let glyph_scale = (target_h / GLYPH_H).clamp(MIN_GLYPH_SCALE, MAX_GLYPH_SCALE);
        let glyph_h = GLYPH_H * glyph_scale;
        if glyph_h > avail_h {
            return None;
        }

        let glyph_w = GLYPH_W * glyph_scale;
        let total_w = glyph_w * text.len() as f32;
        if total_w > avail_w {
            return None;
        }

        Some(Self {
            x: (area.x + (area.w - total_w) * 0.5).round(),
            y: (area.y + (area.h - glyph_h) * 0.5).round(),
            glyph_w,
            glyph_h,
            text,
        })
    }
}

/// GPU resources of the digit atlas.
#[derive(Debug, Default)]
pub struct DigitFont {
    texture: Option<TextureId>,
    glyphs: Vec<MeshId>,
    attempted: bool,
}

impl DigitFont {
    /// Creates an unloaded font.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the atlas is loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.texture.is_some()
    }

    /// Loads the atlas and glyph meshes once. A missing atlas disables the
    /// text overlay with a warning.
    pub fn ensure<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        if self.attempted {
            return;
        }
        self.attempted = true;

        let texture = match backend.load_texture(DIGITS_TEXTURE) {
            Ok(t) => t,
            Err(e) => {
                warn!("Health text disabled: {e}");
                return;
            }
        };

        let atlas_w = GLYPH_W * GLYPH_COUNT as f32;
        self.glyphs = (0..GLYPH_COUNT)
            .map(|i| {
                let u0 = i as f32 * GLYPH_W / atlas_w;
                let u1 = (i + 1) as f32 * GLYPH_W / atlas_w;
                backend.upload_mesh(&QuadMesh::textured(u0, 0.0, u1, 1.0), Topology::Triangles)
            })
            .collect();
        self.texture = Some(texture);
    }

    /// Draws `current/max` centered in `area`: a grey shadow pass offset by
    /// one pixel, then the main pass.
    pub fn draw_health<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        current: f32,
        max: f32,
        area: Rect,
        opacity: f32,
        gui_scale: f32,
    ) {
        if opacity <= MIN_TEXT_OPACITY {
            return;
        }
        let Some(texture) = self.texture else {
            return;
        };
        let Some(layout) = DigitLayout::fit(current, max, area, gui_scale) else {
            return;
        };

        self.draw_run(backend, texture, &layout, 1.0, Rgba::splat(opacity * SHADOW_LEVEL));
        self.draw_run(backend, texture, &layout, 0.0, Rgba::splat(opacity));
    }

    fn draw_run<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        texture: TextureId,
        layout: &DigitLayout,
        offset: f32,
        color: Rgba,
    ) {
        let mut x = layout.x + offset;
        for c in layout.text.chars() {
            if let Some(mesh) = glyph_index(c).and_then(|i| self.glyphs.get(i)) {
                backend.draw(&DrawCall {
                    mesh: *mesh,
                    texture: Some(texture),
                    rect: Rect::new(x, layout.y + offset, layout.glyph_w, layout.glyph_h),
                    color,
                });
            }
            x += layout.glyph_w;
        }
    }

    /// Frees the atlas and glyph meshes.
    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        for mesh in self.glyphs.drain(..) {
            backend.delete_mesh(mesh);
        }
        if let Some(texture) = self.texture.take() {
            backend.delete_texture(texture);
        }
        self.attempted = false;
    }
}

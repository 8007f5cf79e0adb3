//! Texture-atlas theme.
//!
//! The bar is assembled from square tiles: a background row, a fill made of
//! whole tiles plus one cut tile, a frame row on top, and an optional heart
//! icon to the left. Layout math lives in [`TiledLayout`] and [`FillPlan`] so
//! it can be checked without a backend.

use healthbar_common::{HealthBarResult, Rgba};
use tracing::debug;

use super::definition::{pick, ThemeDefinition};
use super::{BarRenderData, BarTheme, ThemeRenderContext};
use crate::backend::{DrawCall, MeshId, QuadMesh, Rect, RenderBackend, TextureId, Topology};

/// Repeated middle tiles needed to reach `bar_width` (in atlas units),
/// clamped to the definition's bounds.
#[must_use]
pub fn mid_tiles(def: &ThemeDefinition, fixed_tiles: u32, bar_width: f32) -> u32 {
    let t = def.tile.max(1) as f32;
    let base = def.bar_start_offset as f32 + fixed_tiles as f32 * t;
    let desired = bar_width.max(base + def.min_mid_tiles as f32 * t);
    let mid = ((desired - base) / t).ceil().max(0.0) as u32;
    // An upper bound below the lower one is raised to it
    mid.clamp(def.min_mid_tiles, def.max_mid_tiles.max(def.min_mid_tiles))
}

/// Screen placement of every part of a tiled bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiledLayout {
    /// Repeated middle tiles per row
    pub mid_tiles: u32,
    /// Fixed tiles per row (2 or 4)
    pub fixed_tiles: u32,
    /// On-screen tile edge
    pub tile_px: f32,
    /// Left edge of the heart icon
    pub heart_x: f32,
    /// Frame/background rows
    pub bar: Rect,
    /// Fill area inside the rows
    pub inner: Rect,
    /// Filled width of the inner area
    pub fill_w: f32,
}

impl TiledLayout {
    /// Lays the bar out centered on `rect` and bottom-aligned with it.
    #[must_use]
    pub fn compute(
        def: &ThemeDefinition,
        fixed_tiles: u32,
        bar_width: f32,
        rect: Rect,
        scale: f32,
        shown_fraction: f32,
    ) -> Self {
        let t = def.tile.max(1) as f32;
        let mid = mid_tiles(def, fixed_tiles, bar_width);
        let row_units = (fixed_tiles + mid) as f32 * t;

        let mut tile_px = t * scale;
        let total_w = (def.bar_start_offset as f32 + row_units) * scale;
        let x = rect.center_x() - total_w * 0.5;
        let y = rect.bottom() - tile_px;

        let mut heart_x = x;
        let mut bar = Rect::new(x + def.bar_start_offset as f32 * scale, y, row_units * scale, tile_px);

        let pad = def.inner_pad as f32 * scale;
        let mut inner = Rect::new(
            bar.x + pad,
            bar.y + pad,
            (bar.w - 2.0 * pad).max(0.0),
            (bar.h - 2.0 * pad).max(0.0),
        );
        let mut fill_w = inner.w * shown_fraction;

        if def.pixel_snap {
            heart_x = heart_x.round();
            bar = snap(bar);
            inner = snap(inner);
            fill_w = fill_w.round();
            tile_px = tile_px.round();
        }

        Self {
            mid_tiles: mid,
            fixed_tiles,
            tile_px,
            heart_x,
            bar,
            inner,
            fill_w,
        }
    }
}

fn snap(r: Rect) -> Rect {
    Rect::new(r.x.round(), r.y.round(), r.w.round(), r.h.round())
}

/// Split of a fill width into whole tiles and one cut tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillPlan {
    /// Whole fill tiles
    pub whole_tiles: u32,
    /// On-screen width of one fill tile
    pub tile_w: f32,
    /// Leftover on-screen width after the whole tiles
    pub remainder: f32,
    /// Cut width in atlas pixels, `0..tile`; 0 draws nothing
    pub cut: u32,
}

impl FillPlan {
    /// Plans a fill of `fill_w` screen pixels with tiles `tile_w` wide.
    #[must_use]
    pub fn compute(fill_w: f32, tile_w: f32, tile: u32) -> Self {
        if tile_w <= 0.0 || fill_w <= 0.0 {
            return Self {
                whole_tiles: 0,
                tile_w,
                remainder: 0.0,
                cut: 0,
            };
        }

        let whole_tiles = (fill_w / tile_w) as u32;
        let remainder = fill_w - whole_tiles as f32 * tile_w;
        let cut = ((remainder / tile_w) * tile as f32).round().max(0.0) as u32;

        Self {
            whole_tiles,
            tile_w,
            remainder,
            cut: cut.min(tile.saturating_sub(1)),
        }
    }
}

/// Unit quad sampling `cut_width` atlas pixels of tile `index`.
///
/// The sampled rectangle is inset by `uvInsetPx` to avoid bleeding, except
/// for cuts of 2 px or less, and falls back to exact tile edges if the inset
/// leaves nothing.
#[must_use]
pub fn tile_quad(def: &ThemeDefinition, index: u32, cut_width: u32) -> QuadMesh {
    let tile = def.tile.max(1);
    let cut = cut_width.clamp(1, tile) as f32;
    let x = (index * tile) as f32;
    let tex_w = def.tex_w.max(1) as f32;
    let tex_h = def.tex_h.max(1) as f32;

    let inset = if cut <= 2.0 { 0.0 } else { def.uv_inset_px };
    let u0 = (x + inset) / tex_w;
    let u1 = (x + cut - inset) / tex_w;
    let v0 = inset / tex_h;
    let v1 = (tile as f32 - inset) / tex_h;

    if u1 > u0 {
        QuadMesh::textured(u0, v0, u1, v1)
    } else {
        QuadMesh::textured(x / tex_w, 0.0, (x + cut) / tex_w, 1.0)
    }
}

/// Meshes of one tiled row.
#[derive(Debug, Clone)]
enum RowMeshes {
    Three {
        left: MeshId,
        mid: MeshId,
        right: MeshId,
    },
    Five {
        left_outer: MeshId,
        left_inner: MeshId,
        mid: MeshId,
        right_inner: MeshId,
        right_outer: MeshId,
    },
}

impl RowMeshes {
    fn draw<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        texture: TextureId,
        x: f32,
        y: f32,
        tile_px: f32,
        mid_tiles: u32,
        color: Rgba,
    ) {
        let (head, mid, tail) = match *self {
            Self::Three { left, mid, right } => ([Some(left), None], mid, [Some(right), None]),
            Self::Five {
                left_outer,
                left_inner,
                mid,
                right_inner,
                right_outer,
            } => (
                [Some(left_outer), Some(left_inner)],
                mid,
                [Some(right_inner), Some(right_outer)],
            ),
        };

        let mut cx = x;
        let meshes = head
            .into_iter()
            .flatten()
            .chain(std::iter::repeat(mid).take(mid_tiles as usize))
            .chain(tail.into_iter().flatten());
        for mesh in meshes {
            backend.draw(&DrawCall {
                mesh,
                texture: Some(texture),
                rect: Rect::new(cx, y, tile_px, tile_px),
                color,
            });
            cx += tile_px;
        }
    }

    fn meshes(&self) -> Vec<MeshId> {
        match self {
            Self::Three { left, mid, right } => vec![*left, *mid, *right],
            Self::Five {
                left_outer,
                left_inner,
                mid,
                right_inner,
                right_outer,
            } => vec![*left_outer, *left_inner, *mid, *right_inner, *right_outer],
        }
    }
}

#[derive(Debug, Clone)]
struct TiledResources {
    texture: TextureId,
    frame: RowMeshes,
    background: RowMeshes,
    fill_full: MeshId,
    /// Indexed by cut width; slot 0 is unused.
    fill_cuts: Vec<Option<MeshId>>,
    heart: Option<MeshId>,
}

/// Theme drawn from a [`ThemeDefinition`] atlas.
#[derive(Debug)]
pub struct TiledTheme {
    id: String,
    def: ThemeDefinition,
    resources: Option<TiledResources>,
}

impl TiledTheme {
    /// Creates the theme without GPU resources.
    #[must_use]
    pub fn new(id: impl Into<String>, def: ThemeDefinition) -> Self {
        Self {
            id: id.into(),
            def,
            resources: None,
        }
    }

    /// Theme document.
    #[must_use]
    pub fn definition(&self) -> &ThemeDefinition {
        &self.def
    }

    /// Whether GPU resources exist.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.resources.is_some()
    }

    /// Layout of a bar for this theme.
    #[must_use]
    pub fn layout(&self, data: &BarRenderData, bar_width: f32) -> TiledLayout {
        TiledLayout::compute(
            &self.def,
            self.def.fixed_tiles(),
            bar_width,
            data.rect,
            data.scale,
            data.shown_fraction,
        )
    }

    fn upload_tile<B: RenderBackend + ?Sized>(&self, backend: &mut B, index: i32, cut: u32) -> MeshId {
        let index = self.def.clamp_tile_index(index, &self.id);
        backend.upload_mesh(&tile_quad(&self.def, index, cut), Topology::Triangles)
    }

    fn upload_row<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        five_slice: bool,
        [left, mid, right]: [i32; 3],
        [left_outer, left_inner, right_inner, right_outer]: [Option<i32>; 4],
    ) -> RowMeshes {
        let tile = self.def.tile;
        if five_slice {
            RowMeshes::Five {
                left_outer: self.upload_tile(backend, pick(left_outer, left), tile),
                left_inner: self.upload_tile(backend, pick(left_inner, left), tile),
                mid: self.upload_tile(backend, mid, tile),
                right_inner: self.upload_tile(backend, pick(right_inner, right), tile),
                right_outer: self.upload_tile(backend, pick(right_outer, right), tile),
            }
        } else {
            RowMeshes::Three {
                left: self.upload_tile(backend, left, tile),
                mid: self.upload_tile(backend, mid, tile),
                right: self.upload_tile(backend, right, tile),
            }
        }
    }
}

impl BarTheme for TiledTheme {
    fn id(&self) -> &str {
        &self.id
    }

    fn ensure_resources<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> HealthBarResult<()> {
        if self.resources.is_some() {
            return Ok(());
        }

        let texture = backend.load_texture(&self.def.texture)?;
        let tiles = &self.def.tiles;
        let tile = self.def.tile;

        let frame = self.upload_row(
            backend,
            tiles.has_five_slice_frame(),
            [tiles.frame_left, tiles.frame_mid, tiles.frame_right],
            [
                tiles.frame_left_outer,
                tiles.frame_left_inner,
                tiles.frame_right_inner,
                tiles.frame_right_outer,
            ],
        );
        let background = self.upload_row(
            backend,
            tiles.has_five_slice_bg(),
            [tiles.bg_left, tiles.bg_mid, tiles.bg_right],
            [
                tiles.bg_left_outer,
                tiles.bg_left_inner,
                tiles.bg_right_inner,
                tiles.bg_right_outer,
            ],
        );

        let fill_full = self.upload_tile(backend, tiles.fill, tile);
        let fill_cuts = (0..tile)
            .map(|cut| (cut > 0).then(|| self.upload_tile(backend, tiles.fill, cut)))
            .collect();
        let heart = tiles
            .has_heart
            .then(|| self.upload_tile(backend, tiles.heart, tile));

        debug!("Tiled theme '{}' loaded from {}", self.id, self.def.texture);
        self.resources = Some(TiledResources {
            texture,
            frame,
            background,
            fill_full,
            fill_cuts,
            heart,
        });
        Ok(())
    }

    fn render<B: RenderBackend + ?Sized>(&mut self, data: &BarRenderData, ctx: &ThemeRenderContext<'_>, backend: &mut B) {
        if self.ensure_resources(backend).is_err() {
            return;
        }
        let layout = self.layout(data, ctx.config.bar_width);
        let Some(res) = &self.resources else {
            return;
        };

        let white = Rgba::WHITE.with_alpha(data.opacity);
        let bar = layout.bar;

        res.background
            .draw(backend, res.texture, bar.x, bar.y, layout.tile_px, layout.mid_tiles, white);

        let inner = layout.inner;
        if layout.fill_w > 0.5 && inner.h > 0.5 {
            let color = data.fill_color(ctx.config);
            let mut tile_w = self.def.tile as f32 * data.scale;
            if self.def.pixel_snap {
                tile_w = tile_w.round();
            }

            let plan = FillPlan::compute(layout.fill_w, tile_w, self.def.tile);
            let mut fx = inner.x;
            for _ in 0..plan.whole_tiles {
                backend.draw(&DrawCall {
                    mesh: res.fill_full,
                    texture: Some(res.texture),
                    rect: Rect::new(fx, inner.y, plan.tile_w, inner.h),
                    color,
                });
                fx += plan.tile_w;
            }

            if let Some(Some(mesh)) = res.fill_cuts.get(plan.cut as usize) {
                backend.draw(&DrawCall {
                    mesh: *mesh,
                    texture: Some(res.texture),
                    rect: Rect::new(fx, inner.y, plan.remainder, inner.h),
                    color,
                });
            }
        }

        res.frame
            .draw(backend, res.texture, bar.x, bar.y, layout.tile_px, layout.mid_tiles, white);

        if let Some(heart) = res.heart {
            backend.draw(&DrawCall {
                mesh: heart,
                texture: Some(res.texture),
                rect: Rect::new(layout.heart_x, bar.y, layout.tile_px, layout.tile_px),
                color: white,
            });
        }

        ctx.draw_health_text(backend, data, inner);
    }

    fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        let Some(res) = self.resources.take() else {
            return;
        };

        let meshes = res
            .frame
            .meshes()
            .into_iter()
            .chain(res.background.meshes())
            .chain(std::iter::once(res.fill_full))
            .chain(res.fill_cuts.into_iter().flatten())
            .chain(res.heart);
        for mesh in meshes {
            backend.delete_mesh(mesh);
        }
        backend.delete_texture(res.texture);
    }
}

//! Tiled theme documents.
//!
//! A theme is a JSON document (camelCase keys) naming one texture atlas laid
//! out as a single row of square tiles, plus the tile indices of each bar
//! part. Everything except `texture` has a default.

use healthbar_common::ThemeError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Tile indices of each bar part inside the atlas row.
///
/// The optional `*Outer`/`*Inner` indices switch a row from 3-slice
/// (left, mid, right) to 5-slice (left outer, left inner, mid, right inner,
/// right outer). Missing 5-slice parts fall back to the matching 3-slice one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TileSet {
    /// Frame left cap
    pub frame_left: i32,
    /// Frame middle (repeated)
    pub frame_mid: i32,
    /// Frame right cap
    pub frame_right: i32,
    /// Background left cap
    pub bg_left: i32,
    /// Background middle (repeated)
    pub bg_mid: i32,
    /// Background right cap
    pub bg_right: i32,

    /// Frame 5-slice left outer
    pub frame_left_outer: Option<i32>,
    /// Frame 5-slice left inner
    pub frame_left_inner: Option<i32>,
    /// Frame 5-slice right inner
    pub frame_right_inner: Option<i32>,
    /// Frame 5-slice right outer
    pub frame_right_outer: Option<i32>,

    /// Background 5-slice left outer
    pub bg_left_outer: Option<i32>,
    /// Background 5-slice left inner
    pub bg_left_inner: Option<i32>,
    /// Background 5-slice right inner
    pub bg_right_inner: Option<i32>,
    /// Background 5-slice right outer
    pub bg_right_outer: Option<i32>,

    /// Fill tile, tinted by health color
    pub fill: i32,
    /// Heart icon left of the bar
    pub heart: i32,
    /// Whether the heart is drawn
    pub has_heart: bool,
}

impl Default for TileSet {
    fn default() -> Self {
        Self {
            frame_left: 0,
            frame_mid: 1,
            frame_right: 2,
            bg_left: 3,
            bg_mid: 4,
            bg_right: 5,
            frame_left_outer: None,
            frame_left_inner: None,
            frame_right_inner: None,
            frame_right_outer: None,
            bg_left_outer: None,
            bg_left_inner: None,
            bg_right_inner: None,
            bg_right_outer: None,
            fill: 6,
            heart: 7,
            has_heart: true,
        }
    }
}

fn declared(index: Option<i32>) -> bool {
    index.is_some_and(|i| i >= 0)
}

/// Preferred index if declared and non-negative, else the fallback.
#[must_use]
pub fn pick(preferred: Option<i32>, fallback: i32) -> i32 {
    preferred.filter(|i| *i >= 0).unwrap_or(fallback)
}

impl TileSet {
    /// Any 5-slice frame index declared.
    #[must_use]
    pub fn has_five_slice_frame(&self) -> bool {
        [
            self.frame_left_outer,
            self.frame_left_inner,
            self.frame_right_inner,
            self.frame_right_outer,
        ]
        .into_iter()
        .any(declared)
    }

    /// Any 5-slice background index declared.
    #[must_use]
    pub fn has_five_slice_bg(&self) -> bool {
        [
            self.bg_left_outer,
            self.bg_left_inner,
            self.bg_right_inner,
            self.bg_right_outer,
        ]
        .into_iter()
        .any(declared)
    }
}

/// Parsed tiled theme document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeDefinition {
    /// Atlas texture path
    pub texture: String,
    /// Tile edge in atlas pixels
    pub tile: u32,
    /// Atlas width in pixels
    pub tex_w: u32,
    /// Atlas height in pixels
    pub tex_h: u32,
    /// Horizontal space reserved for the heart, in atlas pixels
    pub bar_start_offset: u32,
    /// Inset of the fill area inside the bar, in atlas pixels
    pub inner_pad: u32,
    /// Minimum repeated middle tiles
    pub min_mid_tiles: u32,
    /// Maximum repeated middle tiles
    pub max_mid_tiles: u32,
    /// UV inset against bleeding from neighbouring tiles, in atlas pixels
    pub uv_inset_px: f32,
    /// Round positions and sizes to whole screen pixels
    pub pixel_snap: bool,
    /// Tile indices
    pub tiles: TileSet,
}

impl Default for ThemeDefinition {
    fn default() -> Self {
        Self {
            texture: String::new(),
            tile: 32,
            tex_w: 256,
            tex_h: 32,
            bar_start_offset: 24,
            inner_pad: 6,
            min_mid_tiles: 2,
            max_mid_tiles: 16,
            uv_inset_px: 0.5,
            pixel_snap: true,
            tiles: TileSet::default(),
        }
    }
}

impl ThemeDefinition {
    /// Parses a theme document. A missing or blank `texture` is an error.
    pub fn from_json(json: &str) -> Result<Self, ThemeError> {
        let mut def: Self = serde_json::from_str(json)?;
        if def.texture.trim().is_empty() {
            return Err(ThemeError::MissingTexture);
        }
        def.tile = def.tile.max(1);
        def.tex_h = def.tex_h.max(1);
        def.max_mid_tiles = def.max_mid_tiles.max(def.min_mid_tiles);
        Ok(def)
    }

    /// Number of tiles in the atlas row.
    #[must_use]
    pub fn tiles_across(&self) -> u32 {
        self.tex_w / self.tile.max(1)
    }

    /// Fixed (non-repeating) tiles of the bar: 4 with a 5-slice frame, else 2.
    #[must_use]
    pub fn fixed_tiles(&self) -> u32 {
        if self.tiles.has_five_slice_frame() {
            4
        } else {
            2
        }
    }

    /// Clamps a tile index into the atlas, warning when it was out of range.
    #[must_use]
    pub fn clamp_tile_index(&self, index: i32, theme_id: &str) -> u32 {
        let max = self.tiles_across().saturating_sub(1);
        match u32::try_from(index) {
            Ok(i) if i <= max => i,
            _ => {
                warn!(
                    "Theme '{theme_id}' tile index {index} is out of range \
                     (texW={}, tile={}, maxIndex={max}), clamping",
                    self.tex_w, self.tile
                );
                if index < 0 {
                    0
                } else {
                    max
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_document_takes_defaults() {
        let def = ThemeDefinition::from_json(r#"{ "texture": "textures/gui/bar.png" }"#).expect("parse");
        assert_eq!(def.tile, 32);
        assert_eq!(def.tex_w, 256);
        assert_eq!(def.bar_start_offset, 24);
        assert_eq!(def.inner_pad, 6);
        assert_eq!((def.min_mid_tiles, def.max_mid_tiles), (2, 16));
        assert!(def.pixel_snap);
        assert_eq!(def.tiles, TileSet::default());
        assert_eq!(def.fixed_tiles(), 2);
    }

    #[test]
    fn test_missing_or_blank_texture_fails() {
        assert!(matches!(ThemeDefinition::from_json("{}"), Err(ThemeError::MissingTexture)));
        assert!(matches!(
            ThemeDefinition::from_json(r#"{ "texture": "  " }"#),
            Err(ThemeError::MissingTexture)
        ));
        assert!(matches!(ThemeDefinition::from_json("{ not json"), Err(ThemeError::Parse(_))));
    }

    #[test]
    fn test_five_slice_detection() {
        let def = ThemeDefinition::from_json(
            r#"{ "texture": "t.png", "tiles": { "frameLeftOuter": 8, "bgRightInner": -1 } }"#,
        )
        .expect("parse");
        assert!(def.tiles.has_five_slice_frame());
        assert!(!def.tiles.has_five_slice_bg());
        assert_eq!(def.fixed_tiles(), 4);
        assert_eq!(pick(def.tiles.frame_left_outer, def.tiles.frame_left), 8);
        assert_eq!(pick(def.tiles.frame_left_inner, def.tiles.frame_left), 0);
        assert_eq!(pick(def.tiles.bg_right_inner, def.tiles.bg_right), 5);
    }

    #[test]
    fn test_clamp_tile_index() {
        let def = ThemeDefinition::from_json(r#"{ "texture": "t.png", "texW": 128 }"#).expect("parse");
        assert_eq!(def.tiles_across(), 4);
        assert_eq!(def.clamp_tile_index(2, "t"), 2);
        assert_eq!(def.clamp_tile_index(9, "t"), 3);
        assert_eq!(def.clamp_tile_index(-2, "t"), 0);
    }
}

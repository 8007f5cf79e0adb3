//! Theme lookup and caching.
//!
//! Tiled themes are loaded lazily from `config/themes/{id}.json` (or
//! `config/themes/{id}`) the first time their id is requested. Any failure
//! falls back to the basic theme with a warning, and the failure is
//! remembered so the document is not re-read every frame.

use std::collections::HashSet;

use ahash::{AHashMap, AHashSet};
use healthbar_common::{HealthBarResult, ThemeError, BASIC_THEME_ID};
use tracing::{debug, warn};

use super::{BarTheme, BasicTheme, Theme, ThemeDefinition, TiledTheme};
use crate::assets::AssetSource;
use crate::backend::RenderBackend;

/// Trims and lower-cases a theme id; blank ids select the basic theme.
#[must_use]
pub fn normalize_theme_id(id: &str) -> String {
    let id = id.trim();
    if id.is_empty() {
        BASIC_THEME_ID.to_string()
    } else {
        id.to_lowercase()
    }
}

/// Cache of loaded themes keyed by normalized id.
pub struct ThemeRegistry {
    assets: Box<dyn AssetSource>,
    themes: AHashMap<String, Theme>,
    failed: AHashSet<String>,
}

impl std::fmt::Debug for ThemeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeRegistry")
            .field("themes", &self.themes.keys().collect::<Vec<_>>())
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl ThemeRegistry {
    /// Creates a registry reading theme documents from `assets`.
    pub fn new(assets: impl AssetSource + 'static) -> Self {
        let mut themes = AHashMap::new();
        themes.insert(BASIC_THEME_ID.to_string(), Theme::Basic(BasicTheme::new()));
        Self {
            assets: Box::new(assets),
            themes,
            failed: AHashSet::new(),
        }
    }

    /// Theme for `id` with its resources ensured, or the basic theme if it
    /// cannot be loaded.
    pub fn get_or_create<B: RenderBackend + ?Sized>(&mut self, id: &str, backend: &mut B) -> &mut Theme {
        let id = normalize_theme_id(id);

        if !self.themes.contains_key(&id) && !self.failed.contains(&id) {
            match self.load_tiled(&id, backend) {
                Ok(theme) => {
                    self.themes.insert(id.clone(), Theme::Tiled(theme));
                }
                Err(e) => {
                    warn!("Failed to load theme '{id}': {e}, using basic");
                    self.failed.insert(id.clone());
                }
            }
        }

        let key = if self.themes.contains_key(&id) {
            id
        } else {
            BASIC_THEME_ID.to_string()
        };
        let theme = self
            .themes
            .entry(key)
            .or_insert_with(|| Theme::Basic(BasicTheme::new()));

        if let Err(e) = theme.ensure_resources(backend) {
            warn!("Theme '{}' resources unavailable: {e}", theme.id());
        }
        theme
    }

    fn load_tiled<B: RenderBackend + ?Sized>(&self, id: &str, backend: &mut B) -> HealthBarResult<TiledTheme> {
        let candidates = [format!("config/themes/{id}.json"), format!("config/themes/{id}")];
        let (path, json) = candidates
            .iter()
            .find_map(|path| self.assets.read_text(path).map(|json| (path, json)))
            .filter(|(_, json)| !json.trim().is_empty())
            .ok_or_else(|| ThemeError::NotFound(id.to_string()))?;

        debug!("Loading tiled theme '{id}' from {path}");
        let def = ThemeDefinition::from_json(&json)?;
        let mut theme = TiledTheme::new(id, def);
        theme.ensure_resources(backend)?;
        Ok(theme)
    }

    /// Whether a theme id resolves to a loaded tiled theme.
    #[must_use]
    pub fn is_loaded(&self, id: &str) -> bool {
        self.themes.contains_key(&normalize_theme_id(id))
    }

    /// Ids whose load failed and which resolve to the basic theme.
    #[must_use]
    pub fn failed_ids(&self) -> HashSet<&str> {
        self.failed.iter().map(String::as_str).collect()
    }

    /// Forgets failed loads so they are retried.
    pub fn forget_failures(&mut self) {
        self.failed.clear();
    }

    /// Frees every theme's resources and empties the cache.
    pub fn dispose<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        for theme in self.themes.values_mut() {
            theme.release(backend);
        }
        self.themes.clear();
        self.failed.clear();
        self.themes
            .insert(BASIC_THEME_ID.to_string(), Theme::Basic(BasicTheme::new()));
    }
}

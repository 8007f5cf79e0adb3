//! Overlay configuration.
//!
//! Three layers:
//! - [`HealthBarConfig`]: the editable, serializable settings document.
//! - [`ConfigSnapshot`]: an immutable, validated copy taken on every change.
//!   Hot-path code only ever reads a snapshot, so an edit made mid-frame
//!   cannot produce torn reads.
//! - [`ConfigProvider`]: owns the live snapshot, swaps it atomically and
//!   broadcasts [`ConfigChanged`] to subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::color::Rgba;
use crate::error::ConfigError;

/// Built-in theme id, always available.
pub const BASIC_THEME_ID: &str = "basic";

/// Id of the bundled tiled theme selected by the legacy numeric setting `1`.
pub const PIXEL_THEME_ID: &str = "pixel";

/// Lower bound for fade durations, keeps `dt / fade` finite.
pub const MIN_FADE_SECONDS: f32 = 0.001;

const DEFAULT_FULL_COLOR: &str = "#44FF44";
const DEFAULT_MID_COLOR: &str = "#FFCC00";
const DEFAULT_LOW_COLOR: &str = "#FF4444";
const DEFAULT_FRAME_COLOR: &str = "#CCCCCC";

/// Theme selection as stored in the settings document.
///
/// Older settings files store a numeric index (`0` basic, `1` pixel); newer
/// ones store the theme id directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeSelector {
    /// Legacy numeric selector
    Index(u32),
    /// Theme id
    Named(String),
}

impl ThemeSelector {
    /// Normalized theme id: trimmed, lower-case, `basic` when blank.
    #[must_use]
    pub fn theme_id(&self) -> String {
        match self {
            Self::Index(1) => PIXEL_THEME_ID.to_string(),
            Self::Index(_) => BASIC_THEME_ID.to_string(),
            Self::Named(name) => {
                let id = name.trim().to_ascii_lowercase();
                if id.is_empty() {
                    BASIC_THEME_ID.to_string()
                } else {
                    id
                }
            }
        }
    }
}

impl Default for ThemeSelector {
    fn default() -> Self {
        Self::Named(BASIC_THEME_ID.to_string())
    }
}

/// Editable overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthBarConfig {
    // === General ===
    /// Master switch; when off every bar fades out and is dropped
    pub enabled: bool,
    /// Only show a bar for the entity under the reticle
    pub target_only: bool,
    /// Half-extent of the query box around the player, in blocks
    pub display_range: u32,
    /// Show bars above other players
    pub show_on_player: bool,
    /// Horizontal field of view used to cull candidates, in degrees
    pub horizontal_fov: f32,
    /// Draw `current/max` digits over the bar
    pub show_hp_text: bool,
    /// Hard cap on bars selected per pass
    pub max_bars_displayed: i32,
    /// Reserve a slot for the reticle target in around mode
    pub always_show_target_in_around: bool,
    /// Theme id or legacy numeric selector
    pub theme: ThemeSelector,

    // === Size & position ===
    /// Bar width in GUI units at scale 1
    pub bar_width: i32,
    /// Bar height in GUI units at scale 1
    pub bar_height: i32,
    /// Smallest bar scale (far away)
    pub min_scale: f32,
    /// Largest bar scale (close up)
    pub max_scale: f32,
    /// Vertical gap between the entity anchor and the bar at offset scale 1
    pub vertical_offset: i32,
    /// Smallest vertical offset scale
    pub min_offset_scale: f32,
    /// Largest vertical offset scale
    pub max_offset_scale: f32,

    // === Animations ===
    /// Seconds for a bar to fade in completely
    pub fade_in_speed: f32,
    /// Seconds for a bar to fade out completely
    pub fade_out_speed: f32,

    // === Colors ===
    /// Fill color above the mid threshold
    pub full_health_color: String,
    /// Fill color between low and mid thresholds
    pub mid_health_color: String,
    /// Fill color at or below the low threshold
    pub low_health_color: String,
    /// Outline color of the basic theme
    pub frame_color: String,

    // === Thresholds ===
    /// Health percent at or below which the mid color is used
    pub mid_health_threshold: i32,
    /// Health percent at or below which the low color is used
    pub low_health_threshold: i32,
}

impl Default for HealthBarConfig {
    fn default() -> Self {
        Self {
            // General
            enabled: true,
            target_only: false,
            display_range: 14,
            show_on_player: true,
            horizontal_fov: 60.0,
            show_hp_text: true,
            max_bars_displayed: 7,
            always_show_target_in_around: true,
            theme: ThemeSelector::default(),

            // Size & position
            bar_width: 66,
            bar_height: 7,
            min_scale: 1.0,
            max_scale: 8.0,
            vertical_offset: 22,
            min_offset_scale: 0.3,
            max_offset_scale: 3.5,

            // Animations
            fade_in_speed: 0.3,
            fade_out_speed: 0.5,

            // Colors
            full_health_color: DEFAULT_FULL_COLOR.to_string(),
            mid_health_color: DEFAULT_MID_COLOR.to_string(),
            low_health_color: DEFAULT_LOW_COLOR.to_string(),
            frame_color: DEFAULT_FRAME_COLOR.to_string(),

            // Thresholds
            mid_health_threshold: 60,
            low_health_threshold: 25,
        }
    }
}

impl HealthBarConfig {
    /// Parses a TOML settings document. Missing fields take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Parses a JSON settings document. Missing fields take defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Takes an immutable, validated snapshot of these settings.
    #[must_use]
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::from_config(self)
    }
}

/// Immutable copy of the settings, validated for hot-path use.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSnapshot {
    /// Master switch
    pub enabled: bool,
    /// Reticle-target-only mode
    pub target_only: bool,
    /// Half-extent of the query box, in blocks
    pub display_range: f64,
    /// Show bars above other players
    pub show_on_player: bool,
    /// Horizontal FOV in degrees
    pub horizontal_fov_deg: f32,
    /// Draw digits over the bar
    pub show_hp_text: bool,
    /// Hard cap on selected bars
    pub max_bars_displayed: i32,
    /// Reserve a slot for the reticle target
    pub always_show_target_in_around: bool,
    /// Normalized theme id
    pub theme_id: String,
    /// Bar width at scale 1
    pub bar_width: f32,
    /// Bar height at scale 1
    pub bar_height: f32,
    /// Smallest bar scale
    pub min_scale: f32,
    /// Largest bar scale
    pub max_scale: f32,
    /// Vertical offset at offset scale 1
    pub vertical_offset: f32,
    /// Smallest offset scale
    pub min_offset_scale: f32,
    /// Largest offset scale
    pub max_offset_scale: f32,
    /// Fade-in duration, at least [`MIN_FADE_SECONDS`]
    pub fade_in_seconds: f32,
    /// Fade-out duration, at least [`MIN_FADE_SECONDS`]
    pub fade_out_seconds: f32,
    /// Fill color above the mid threshold
    pub full_health_color: Rgba,
    /// Fill color between thresholds
    pub mid_health_color: Rgba,
    /// Fill color at or below the low threshold
    pub low_health_color: Rgba,
    /// Basic theme outline color
    pub frame_color: Rgba,
    /// Mid threshold, integer percent
    pub mid_health_threshold: i32,
    /// Low threshold, integer percent
    pub low_health_threshold: i32,
}

impl ConfigSnapshot {
    /// Builds a snapshot, replacing unparseable colors with their defaults.
    #[must_use]
    pub fn from_config(cfg: &HealthBarConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            target_only: cfg.target_only,
            display_range: f64::from(cfg.display_range),
            show_on_player: cfg.show_on_player,
            horizontal_fov_deg: cfg.horizontal_fov,
            show_hp_text: cfg.show_hp_text,
            max_bars_displayed: cfg.max_bars_displayed,
            always_show_target_in_around: cfg.always_show_target_in_around,
            theme_id: cfg.theme.theme_id(),
            bar_width: cfg.bar_width as f32,
            bar_height: cfg.bar_height as f32,
            min_scale: cfg.min_scale,
            max_scale: cfg.max_scale,
            vertical_offset: cfg.vertical_offset as f32,
            min_offset_scale: cfg.min_offset_scale,
            max_offset_scale: cfg.max_offset_scale,
            fade_in_seconds: cfg.fade_in_speed.max(MIN_FADE_SECONDS),
            fade_out_seconds: cfg.fade_out_speed.max(MIN_FADE_SECONDS),
            full_health_color: parse_color_or("full_health_color", &cfg.full_health_color, DEFAULT_FULL_COLOR),
            mid_health_color: parse_color_or("mid_health_color", &cfg.mid_health_color, DEFAULT_MID_COLOR),
            low_health_color: parse_color_or("low_health_color", &cfg.low_health_color, DEFAULT_LOW_COLOR),
            frame_color: parse_color_or("frame_color", &cfg.frame_color, DEFAULT_FRAME_COLOR),
            mid_health_threshold: cfg.mid_health_threshold,
            low_health_threshold: cfg.low_health_threshold,
        }
    }

    /// Fill color for an integer health percent.
    ///
    /// `≤ low` selects the low color, `≤ mid` the mid color, anything above
    /// the full color. Both themes use this rule.
    #[must_use]
    pub fn health_color(&self, percent: i32) -> Rgba {
        if percent <= self.low_health_threshold {
            self.low_health_color
        } else if percent <= self.mid_health_threshold {
            self.mid_health_color
        } else {
            self.full_health_color
        }
    }
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        HealthBarConfig::default().snapshot()
    }
}

fn parse_color_or(field: &str, value: &str, fallback: &str) -> Rgba {
    match Rgba::from_hex(value) {
        Ok(color) => color,
        Err(e) => {
            warn!("Config field '{field}': {e}, using {fallback}");
            Rgba::from_hex(fallback).unwrap_or(Rgba::WHITE)
        }
    }
}

/// Notification that a new snapshot has been published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigChanged {
    /// Monotonic snapshot generation
    pub generation: u64,
}

/// Owner of the live configuration.
///
/// Readers grab the current `Arc<ConfigSnapshot>` and keep it for the rest of
/// the frame. Writers edit the settings document through [`update`] or
/// [`replace`], which publish a fresh snapshot and notify every subscriber.
///
/// [`update`]: ConfigProvider::update
/// [`replace`]: ConfigProvider::replace
#[derive(Debug)]
pub struct ConfigProvider {
    config: RwLock<HealthBarConfig>,
    snapshot: RwLock<Arc<ConfigSnapshot>>,
    subscribers: Mutex<Vec<Sender<ConfigChanged>>>,
    generation: AtomicU64,
}

impl Default for ConfigProvider {
    fn default() -> Self {
        Self::new(HealthBarConfig::default())
    }
}

impl ConfigProvider {
    /// Creates a provider publishing a snapshot of `config`.
    #[must_use]
    pub fn new(config: HealthBarConfig) -> Self {
        let snapshot = Arc::new(config.snapshot());
        Self {
            config: RwLock::new(config),
            snapshot: RwLock::new(snapshot),
            subscribers: Mutex::new(Vec::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Copy of the editable settings.
    #[must_use]
    pub fn config(&self) -> HealthBarConfig {
        self.config.read().clone()
    }

    /// Generation of the current snapshot; bumps on every change.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Registers a new change subscriber.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<ConfigChanged> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Replaces the whole settings document and publishes it.
    pub fn replace(&self, config: HealthBarConfig) {
        *self.config.write() = config;
        self.publish();
    }

    /// Edits the settings document in place and publishes the result.
    pub fn update(&self, edit: impl FnOnce(&mut HealthBarConfig)) {
        {
            let mut config = self.config.write();
            edit(&mut *config);
        }
        self.publish();
    }

    fn publish(&self) {
        let snapshot = Arc::new(self.config.read().snapshot());
        *self.snapshot.write() = snapshot;

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let event = ConfigChanged { generation };

        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event).is_ok());
        debug!(
            "Published config snapshot {generation} to {} subscribers",
            subscribers.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let cfg = HealthBarConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.display_range, 14);
        assert_eq!(cfg.max_bars_displayed, 7);
        assert_eq!(cfg.mid_health_threshold, 60);
        assert_eq!(cfg.low_health_threshold, 25);
    }

    #[test]
    fn test_snapshot_clamps_fade_times() {
        let cfg = HealthBarConfig {
            fade_in_speed: 0.0,
            fade_out_speed: -3.0,
            ..Default::default()
        };
        let snap = cfg.snapshot();
        assert_eq!(snap.fade_in_seconds, MIN_FADE_SECONDS);
        assert_eq!(snap.fade_out_seconds, MIN_FADE_SECONDS);
    }

    #[test]
    fn test_snapshot_bad_color_falls_back() {
        let cfg = HealthBarConfig {
            low_health_color: "not a color".to_string(),
            ..Default::default()
        };
        let snap = cfg.snapshot();
        assert_eq!(snap.low_health_color, Rgba::from_hex(DEFAULT_LOW_COLOR).expect("default"));
    }

    #[test]
    fn test_theme_selector_normalization() {
        assert_eq!(ThemeSelector::Index(0).theme_id(), "basic");
        assert_eq!(ThemeSelector::Index(1).theme_id(), "pixel");
        assert_eq!(ThemeSelector::Named("  Pixel ".into()).theme_id(), "pixel");
        assert_eq!(ThemeSelector::Named("   ".into()).theme_id(), "basic");
    }

    #[test]
    fn test_legacy_numeric_theme_in_json() {
        let cfg = HealthBarConfig::from_json_str(r#"{ "theme": 1, "bar_width": 90 }"#)
            .expect("valid json");
        assert_eq!(cfg.snapshot().theme_id, "pixel");
        assert_eq!(cfg.bar_width, 90);
        assert!(cfg.enabled);
    }

    #[test]
    fn test_toml_partial_document() {
        let cfg = HealthBarConfig::from_toml_str("target_only = true\ntheme = \"pixel\"\n")
            .expect("valid toml");
        assert!(cfg.target_only);
        assert_eq!(cfg.snapshot().theme_id, "pixel");
        assert_eq!(cfg.max_bars_displayed, 7);
    }

    #[test]
    fn test_health_color_thresholds() {
        let snap = ConfigSnapshot::default();
        assert_eq!(snap.health_color(80), snap.full_health_color);
        assert_eq!(snap.health_color(61), snap.full_health_color);
        assert_eq!(snap.health_color(60), snap.mid_health_color);
        assert_eq!(snap.health_color(55), snap.mid_health_color);
        assert_eq!(snap.health_color(26), snap.mid_health_color);
        assert_eq!(snap.health_color(25), snap.low_health_color);
        assert_eq!(snap.health_color(0), snap.low_health_color);
    }

    #[test]
    fn test_provider_swaps_snapshot_and_notifies() {
        let provider = ConfigProvider::default();
        let rx = provider.subscribe();
        let before = provider.snapshot();

        provider.update(|cfg| cfg.max_bars_displayed = 3);

        assert_eq!(before.max_bars_displayed, 7);
        assert_eq!(provider.snapshot().max_bars_displayed, 3);
        assert_eq!(rx.try_recv(), Ok(ConfigChanged { generation: 1 }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_provider_prunes_dropped_subscribers() {
        let provider = ConfigProvider::default();
        let rx = provider.subscribe();
        drop(provider.subscribe());

        provider.replace(HealthBarConfig::default());
        provider.replace(HealthBarConfig::default());

        assert_eq!(provider.subscribers.lock().len(), 1);
        assert_eq!(rx.try_iter().count(), 2);
        assert_eq!(provider.generation(), 2);
    }
}

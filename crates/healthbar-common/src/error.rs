//! Error types for the health bar overlay.
//!
//! None of these cross the per-frame entry points: load failures are turned
//! into fallbacks where they happen and only surface as log lines.

use thiserror::Error;

/// Top-level error type for health bar operations.
#[derive(Debug, Error)]
pub enum HealthBarError {
    /// Theme loading errors
    #[error("Theme error: {0}")]
    Theme(#[from] ThemeError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while loading a tiled theme.
#[derive(Debug, Error)]
pub enum ThemeError {
    /// No theme document exists for the id
    #[error("Theme '{0}' not found")]
    NotFound(String),

    /// Theme document is not valid JSON for the definition schema
    #[error("Invalid theme document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Theme document did not name a texture
    #[error("Theme JSON must define 'texture'")]
    MissingTexture,

    /// The backend could not load the theme texture
    #[error("Failed to load texture '{path}': {reason}")]
    Texture {
        /// Texture path from the theme document
        path: String,
        /// Backend-provided reason
        reason: String,
    },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A color string could not be parsed
    #[error("Invalid color '{0}', expected #RRGGBB or #AARRGGBB")]
    InvalidColor(String),

    /// TOML config document failed to parse
    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON config document failed to parse
    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for health bar operations.
pub type HealthBarResult<T> = Result<T, HealthBarError>;

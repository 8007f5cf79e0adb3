//! Read-only text asset lookup for theme documents.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use tracing::debug;

/// Source of text assets addressed by forward-slash relative paths.
pub trait AssetSource {
    /// Contents of the asset, or `None` if it does not exist or is unreadable.
    fn read_text(&self, path: &str) -> Option<String>;
}

/// Assets read from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    /// Serves assets below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Asset root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirAssets {
    fn read_text(&self, path: &str) -> Option<String> {
        let full = path
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part));

        match std::fs::read_to_string(&full) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                debug!("Failed to read asset {}: {e}", full.display());
                None
            }
        }
    }
}

/// Assets held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    files: AHashMap<String, String>,
}

impl MemoryAssets {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an asset.
    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }
}

impl AssetSource for MemoryAssets {
    fn read_text(&self, path: &str) -> Option<String> {
        self.files.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_assets_reads_nested_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let themes = dir.path().join("config").join("themes");
        std::fs::create_dir_all(&themes).expect("mkdir");
        std::fs::write(themes.join("pixel.json"), "{\"texture\":\"a.png\"}").expect("write");

        let assets = DirAssets::new(dir.path());
        assert_eq!(
            assets.read_text("config/themes/pixel.json").as_deref(),
            Some("{\"texture\":\"a.png\"}")
        );
        assert!(assets.read_text("config/themes/missing.json").is_none());
    }

    #[test]
    fn test_memory_assets() {
        let assets = MemoryAssets::new().with("a/b.json", "{}");
        assert_eq!(assets.read_text("a/b.json").as_deref(), Some("{}"));
        assert!(assets.read_text("a/c.json").is_none());
    }
}

//! # Healthbar Render
//!
//! Screen-space rendering of the overhead health bars.
//!
//! This crate turns the bar states tracked by `healthbar-client` into draw
//! calls:
//! - Perspective camera and world-to-screen projection
//! - Backend contract for textures, quad meshes and draws, plus a recording
//!   backend for headless runs
//! - Asset sources for theme documents
//! - Basic and texture-atlas tiled themes with a lazy theme registry
//! - Digit overlay for `current/max` health text
//! - The per-frame batch renderer

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod assets;
pub mod backend;
pub mod camera;
pub mod renderer;
pub mod text;
pub mod theme;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::assets::*;
    pub use crate::backend::*;
    pub use crate::camera::*;
    pub use crate::renderer::*;
    pub use crate::text::*;
    pub use crate::theme::{
        health_percent, normalize_theme_id, BarRenderData, BarTheme, BasicTheme, Theme, ThemeDefinition,
        ThemeRegistry, ThemeRenderContext, TileSet, TiledTheme,
    };
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use healthbar_client::{EntityInfo, HealthBarClient, PlayerView, SimWorld};
    use healthbar_common::{ConfigProvider, EntityId, HealthBarConfig};
    use std::sync::Arc;

    #[test]
    fn test_camera_pipeline_draws_bar_above_entity() {
        let mut world = SimWorld::new();
        world.set_player(PlayerView {
            entity_id: EntityId::from_raw(1),
            position: DVec3::ZERO,
            yaw: 0.0,
            target: None,
        });
        world.spawn(EntityInfo::creature(7, DVec3::new(0.0, 0.0, 6.0), 10.0).with_height(2.0));

        let provider = Arc::new(ConfigProvider::new(HealthBarConfig::default()));
        let mut client = HealthBarClient::new(provider);
        client.tick(0.2, &world);

        let mut camera = Camera::new(800, 600);
        camera.look(DVec3::new(0.0, 1.6, 0.0), 0.0, 0.0);

        let mut renderer = HealthBarRenderer::new(MemoryAssets::new());
        let mut backend = RecordingBackend::new();
        let stats = renderer.render_client(0.1, &mut client, &world, &camera, &mut backend);
        assert_eq!(stats.drawn, 1);

        // Background quad of the basic theme sits centered above screen middle
        let background = backend.draws()[1];
        assert!((background.rect.center_x() - 400.0).abs() < 0.5);
        assert!(background.rect.bottom() < 300.0);

        renderer.dispose(&mut backend);
        assert_eq!(backend.live_meshes(), 0);
        assert_eq!(backend.live_textures(), 0);
    }
}

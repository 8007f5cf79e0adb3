//! # Healthbar Sim
//!
//! Headless driver for the overhead health bar overlay.
//!
//! Runs the client tick and the frame renderer against an in-memory arena
//! with a recording backend, and logs what the overlay did once per
//! simulated second.
//!
//! Usage: `healthbar-sim [config.toml] [frames] [seed]`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod scenario;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use healthbar_client::HealthBarClient;
use healthbar_common::{ConfigProvider, HealthBarConfig};
use healthbar_render::{DirAssets, HealthBarRenderer, RecordingBackend};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::scenario::Scenario;

/// Frames simulated per second.
const FRAME_RATE: u32 = 60;

/// Seconds between client ticks (the host's game tick).
const TICK_INTERVAL: f32 = 0.05;

const DEFAULT_FRAMES: u32 = 600;
const DEFAULT_SEED: u64 = 0x5EED;
const VIEWPORT: (u32, u32) = (1280, 720);

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("healthbar=info".parse()?))
        .init();

    info!("Healthbar sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => load_config(Path::new(&path)),
        None => HealthBarConfig::default(),
    };
    let frames = match args.next() {
        Some(s) => s.parse().with_context(|| format!("Invalid frame count '{s}'"))?,
        None => DEFAULT_FRAMES,
    };
    let seed = match args.next() {
        Some(s) => s.parse().with_context(|| format!("Invalid seed '{s}'"))?,
        None => DEFAULT_SEED,
    };

    run(config, frames, seed);

    info!("Healthbar sim shutdown complete");
    Ok(())
}

/// Loads a TOML settings file, falling back to defaults if it is unusable.
fn load_config(path: &Path) -> HealthBarConfig {
    if !path.exists() {
        info!("Config file not found, using defaults");
        return HealthBarConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match HealthBarConfig::from_toml_str(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                HealthBarConfig::default()
            },
        },
        Err(e) => {
            warn!("Failed to read config file: {e}");
            HealthBarConfig::default()
        },
    }
}

/// Totals collected over one reporting window.
#[derive(Debug, Default)]
struct WindowStats {
    frames: u32,
    drawn: usize,
    draw_calls: usize,
    behind_camera: usize,
    raycasts: usize,
    removed: usize,
}

fn run(config: HealthBarConfig, frames: u32, seed: u64) {
    let provider = Arc::new(ConfigProvider::new(config));
    let mut client = HealthBarClient::new(Arc::clone(&provider));
    let mut renderer = HealthBarRenderer::new(DirAssets::new("assets"));
    let mut backend = RecordingBackend::new();
    let mut scenario = Scenario::new(seed, VIEWPORT);

    let dt = 1.0 / FRAME_RATE as f32;
    let mut tick_acc = 0.0_f32;
    let mut window = WindowStats::default();

    info!(
        "Simulating {frames} frames at {FRAME_RATE} fps, seed {seed}, theme '{}'",
        provider.snapshot().theme_id
    );

    for frame in 1..=frames {
        scenario.step(f64::from(dt));

        tick_acc += dt;
        while tick_acc >= TICK_INTERVAL {
            tick_acc -= TICK_INTERVAL;
            let tick = client.tick(TICK_INTERVAL, scenario.world());
            window.raycasts += tick.raycasts;
            window.removed += tick.removed;
        }

        let stats = renderer.render_client(dt, &mut client, scenario.world(), scenario.camera(), &mut backend);
        window.frames += 1;
        window.drawn += stats.drawn;
        window.draw_calls += backend.take_draws().len();
        window.behind_camera += stats.behind_camera;

        // Halfway through, toggle the digits the way a settings screen would
        if frame == frames / 2 {
            provider.update(|c| c.show_hp_text = !c.show_hp_text);
        }

        if frame % FRAME_RATE == 0 || frame == frames {
            info!(
                "t={:.1}s tracked={} bars/frame={:.1} draws={} raycasts={} removed={} behind={}",
                client.now(),
                client.registry().len(),
                window.drawn as f32 / window.frames.max(1) as f32,
                window.draw_calls,
                window.raycasts,
                window.removed,
                window.behind_camera,
            );
            window = WindowStats::default();
        }
    }

    info!(
        "Done: {} draw calls, {} live meshes, {} live textures",
        backend.total_draws(),
        backend.live_meshes(),
        backend.live_textures()
    );
    renderer.dispose(&mut backend);
    if backend.live_meshes() > 0 || backend.live_textures() > 0 {
        warn!(
            "Resources leaked after dispose: {} meshes, {} textures",
            backend.live_meshes(),
            backend.live_textures()
        );
    }
}

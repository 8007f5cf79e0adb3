//! Client-side update loop.
//!
//! [`HealthBarClient::tick`] runs at game-tick rate: it reacts to config
//! changes, periodically re-runs entity selection, refreshes line of sight
//! under a raycast budget, and drops faded states. Opacity and displayed
//! health are advanced by the renderer at frame rate; the client only does it
//! itself while the overlay is disabled and nothing is drawn.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use healthbar_common::{ConfigChanged, ConfigProvider, ConfigSnapshot};
use tracing::{debug, trace};

use crate::los::RaycastLineOfSight;
use crate::selection::{SelectionContext, SelectionMode, SelectionStrategy, Strategy};
use crate::state::BarRegistry;
use crate::world::{EntityInfo, WorldView};

/// Seconds between selection passes.
pub const SCAN_INTERVAL: f32 = 0.12;

/// What one tick did, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Entities chosen by a selection pass, if one ran
    pub selected: Option<usize>,
    /// Line-of-sight raycasts performed
    pub raycasts: usize,
    /// States removed after fading out
    pub removed: usize,
    /// States tracked after the tick
    pub tracked: usize,
}

/// Owner of the bar-state registry and the selection machinery.
#[derive(Debug)]
pub struct HealthBarClient {
    config: Arc<ConfigProvider>,
    changes: Receiver<ConfigChanged>,
    registry: BarRegistry,
    strategy: Strategy,
    selected: Vec<EntityInfo>,
    scan_acc: f32,
    now: f64,
    theme_dirty: bool,
}

impl HealthBarClient {
    /// Creates a client subscribed to `config`.
    #[must_use]
    pub fn new(config: Arc<ConfigProvider>) -> Self {
        let changes = config.subscribe();
        let mode = SelectionMode::for_config(&config.snapshot());
        Self {
            config,
            changes,
            registry: BarRegistry::new(),
            strategy: Strategy::for_mode(mode),
            selected: Vec::with_capacity(32),
            scan_acc: 0.0,
            now: 0.0,
            theme_dirty: false,
        }
    }

    /// Advances the client by `dt` seconds.
    pub fn tick<W: WorldView + ?Sized>(&mut self, dt: f32, world: &W) -> TickStats {
        self.now += f64::from(dt);

        if self.drain_changes() {
            // Re-select on the next check and let the renderer reload its theme
            self.scan_acc = SCAN_INTERVAL;
            self.theme_dirty = true;
        }

        let cfg = self.config.snapshot();
        let mut stats = TickStats::default();

        if !cfg.enabled {
            self.registry.fade_all_out();
            self.registry
                .advance_opacity(dt, cfg.fade_in_seconds, cfg.fade_out_seconds);
            stats.removed = self.registry.remove_faded();
            stats.tracked = self.registry.len();
            return stats;
        }

        self.scan_acc += dt;
        if self.scan_acc >= SCAN_INTERVAL {
            self.scan_acc = 0.0;
            stats.selected = self.select_entities(&cfg, world);
        }

        let los = RaycastLineOfSight::new(world);
        stats.raycasts = self
            .registry
            .refresh_visibility(world, &los, self.now, cfg.target_only);
        stats.removed = self.registry.remove_faded();
        stats.tracked = self.registry.len();
        stats
    }

    fn drain_changes(&mut self) -> bool {
        let mut changed = false;
        for event in self.changes.try_iter() {
            trace!("Config generation {} observed", event.generation);
            changed = true;
        }
        changed
    }

    fn select_entities<W: WorldView + ?Sized>(&mut self, cfg: &ConfigSnapshot, world: &W) -> Option<usize> {
        let ctx = SelectionContext::from_world(world, cfg)?;

        let mode = SelectionMode::for_config(cfg);
        if self.strategy.mode() != mode {
            debug!("Selection mode switched to {mode:?}");
            self.strategy = Strategy::for_mode(mode);
        }

        self.strategy.select(&ctx, world, &mut self.selected);
        let target = ctx.eligible_target().map(|t| t.id);
        self.registry
            .apply_selection(&self.selected, target, self.now, cfg.target_only);
        Some(self.selected.len())
    }

    /// Bar states, for the renderer.
    #[must_use]
    pub fn registry(&self) -> &BarRegistry {
        &self.registry
    }

    /// Mutable bar states, for the renderer.
    pub fn registry_mut(&mut self) -> &mut BarRegistry {
        &mut self.registry
    }

    /// Returns and clears the pending theme invalidation.
    pub fn take_theme_invalidation(&mut self) -> bool {
        std::mem::take(&mut self.theme_dirty)
    }

    /// Shared config provider.
    #[must_use]
    pub fn config(&self) -> &Arc<ConfigProvider> {
        &self.config
    }

    /// Client clock in seconds.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Drops every tracked state.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.selected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{PlayerView, SimWorld};
    use glam::DVec3;
    use healthbar_common::{EntityId, HealthBarConfig};

    fn world(n: u64, target: Option<u64>) -> SimWorld {
        let mut world = SimWorld::new();
        world.set_player(PlayerView {
            entity_id: EntityId::from_raw(1000),
            position: DVec3::ZERO,
            yaw: 0.0,
            target: target.map(EntityId::from_raw),
        });
        for i in 1..=n {
            world.spawn(EntityInfo::creature(i, DVec3::new(0.0, 0.0, i as f64 + 1.0), 10.0));
        }
        world
    }

    fn client(config: HealthBarConfig) -> HealthBarClient {
        HealthBarClient::new(Arc::new(ConfigProvider::new(config)))
    }

    /// Stands in for the renderer's per-frame opacity step.
    fn fade(client: &mut HealthBarClient, dt: f32) {
        let cfg = client.config().snapshot();
        client
            .registry_mut()
            .advance_opacity(dt, cfg.fade_in_seconds, cfg.fade_out_seconds);
    }

    #[test]
    fn test_selection_runs_on_scan_interval() {
        let world = world(3, None);
        let mut client = client(HealthBarConfig::default());

        let stats = client.tick(0.05, &world);
        assert_eq!(stats.selected, None);
        assert!(client.registry().is_empty());

        let stats = client.tick(0.08, &world);
        assert_eq!(stats.selected, Some(3));
        assert_eq!(client.registry().len(), 3);
    }

    #[test]
    fn test_no_player_skips_selection() {
        let world = world(3, None);
        let mut client = client(HealthBarConfig::default());
        client.tick(0.2, &SimWorld::new());
        assert!(client.registry().is_empty());

        client.tick(0.2, &world);
        assert_eq!(client.registry().len(), 3);
    }

    #[test]
    fn test_raycasts_are_budgeted() {
        let world = world(7, None);
        let mut client = client(HealthBarConfig::default());
        client.tick(0.13, &world);
        let stats = client.tick(0.2, &world);
        assert!(stats.raycasts <= crate::state::MAX_RAYCASTS_PER_TICK);
    }

    #[test]
    fn test_target_only_without_target_empties_registry() {
        let mut world = world(4, None);
        let mut client = client(HealthBarConfig::default());
        client.tick(0.13, &world);
        client.tick(0.02, &world);
        fade(&mut client, 1.0);
        assert_eq!(client.registry().len(), 4);

        client.config().update(|c| c.target_only = true);
        world.set_target(None);

        for _ in 0..5 {
            client.tick(SCAN_INTERVAL, &world);
            fade(&mut client, SCAN_INTERVAL);
        }
        client.tick(0.01, &world);
        assert!(client.registry().is_empty());
    }

    #[test]
    fn test_target_only_tracks_target() {
        let world = world(4, Some(3));
        let mut client = client(HealthBarConfig {
            target_only: true,
            ..HealthBarConfig::default()
        });
        client.tick(0.13, &world);
        assert_eq!(client.registry().len(), 1);
        let st = client.registry().get(EntityId::from_raw(3)).expect("state");
        assert!(st.is_target());
        assert!(st.visible_this_frame());
    }

    #[test]
    fn test_config_change_forces_rescan_and_theme_reload() {
        let world = world(2, None);
        let mut client = client(HealthBarConfig::default());
        assert!(!client.take_theme_invalidation());

        client.config().update(|c| c.theme = healthbar_common::ThemeSelector::Named("pixel".into()));
        let stats = client.tick(0.001, &world);
        assert_eq!(stats.selected, Some(2));
        assert!(client.take_theme_invalidation());
        assert!(!client.take_theme_invalidation());
    }

    #[test]
    fn test_disabled_fades_out_and_cleans_up() {
        let world = world(3, None);
        let mut client = client(HealthBarConfig::default());
        client.tick(0.13, &world);
        fade(&mut client, 1.0);
        assert_eq!(client.registry().len(), 3);

        client.config().update(|c| c.enabled = false);
        let stats = client.tick(0.25, &world);
        assert_eq!(stats.selected, None);
        assert_eq!(client.registry().len(), 3);
        assert!(client.registry().iter().all(|st| st.marked_dead()));

        let stats = client.tick(0.25, &world);
        assert_eq!(stats.removed, 3);
        assert!(client.registry().is_empty());
    }
}

//! Selection strategies: which entities should carry a bar right now.
//!
//! Two strategies share one interface:
//! - **Target-only**: the entity under the reticle, if eligible.
//! - **Around**: nearby entities inside the horizontal FOV, closest first,
//!   under a hard cap.

use glam::DVec3;
use healthbar_common::{ConfigSnapshot, EntityId};

use crate::filter::{cos_half_fov, forward_from_yaw, horizontal_distance_sq, is_eligible, is_in_fov};
use crate::world::{EntityInfo, WorldView};

/// Inputs of one selection pass. Immutable for the duration of the pass.
#[derive(Debug, Clone)]
pub struct SelectionContext<'a> {
    /// Local player entity id
    pub player_id: EntityId,
    /// Local player feet position
    pub player_pos: DVec3,
    /// Horizontal unit forward vector
    pub forward: DVec3,
    /// Cosine of half the horizontal FOV
    pub cos_half_fov: f64,
    /// Entity under the reticle, resolved
    pub target: Option<EntityInfo>,
    /// Config snapshot for this pass
    pub config: &'a ConfigSnapshot,
}

impl<'a> SelectionContext<'a> {
    /// Builds a context from the world. `None` without a local player.
    pub fn from_world<W: WorldView + ?Sized>(world: &W, config: &'a ConfigSnapshot) -> Option<Self> {
        let player = world.local_player()?;
        Some(Self {
            player_id: player.entity_id,
            player_pos: player.position,
            forward: forward_from_yaw(player.yaw),
            cos_half_fov: cos_half_fov(config.horizontal_fov_deg),
            target: player.target.and_then(|id| world.entity(id)),
            config,
        })
    }

    /// The reticle target, if it may carry a bar.
    #[must_use]
    pub fn eligible_target(&self) -> Option<&EntityInfo> {
        self.target
            .as_ref()
            .filter(|t| is_eligible(Some(t), self.config))
    }
}

/// Strategy interface. Implementations clear `out` and fill it in priority
/// order.
pub trait SelectionStrategy {
    /// Runs one selection pass.
    fn select<W: WorldView + ?Sized>(&mut self, ctx: &SelectionContext<'_>, world: &W, out: &mut Vec<EntityInfo>);
}

/// Selects only the reticle target.
#[derive(Debug, Default)]
pub struct TargetOnlyStrategy;

impl SelectionStrategy for TargetOnlyStrategy {
    fn select<W: WorldView + ?Sized>(&mut self, ctx: &SelectionContext<'_>, _world: &W, out: &mut Vec<EntityInfo>) {
        out.clear();
        if let Some(target) = ctx.eligible_target() {
            out.push(target.clone());
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    entity: EntityInfo,
    dist_sq: f64,
}

/// Selects the closest eligible entities in view, up to `max_bars_displayed`.
///
/// Candidates are kept in a buffer sorted by horizontal distance that never
/// grows past the remaining capacity. Once it is full, an entity that cannot
/// beat the farthest kept candidate is rejected before the eligibility and
/// FOV checks run. Ties keep query order.
#[derive(Debug, Default)]
pub struct AroundStrategy {
    candidates: Vec<Candidate>,
}

impl AroundStrategy {
    /// Creates the strategy with an empty candidate buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn collect<W: WorldView + ?Sized>(
        &mut self,
        ctx: &SelectionContext<'_>,
        world: &W,
        exclude: Option<EntityId>,
        limit: usize,
    ) {
        self.candidates.clear();

        let range = ctx.config.display_range;
        for entity in world.entities_in_box(ctx.player_pos, range, range) {
            if entity.id == ctx.player_id || Some(entity.id) == exclude {
                continue;
            }

            let dist_sq = horizontal_distance_sq(ctx.player_pos, entity.position);
            let full = self.candidates.len() >= limit;
            if full && self.candidates.last().is_some_and(|worst| dist_sq >= worst.dist_sq) {
                continue;
            }

            if !is_eligible(Some(&entity), ctx.config)
                || !is_in_fov(ctx.player_pos, entity.position, ctx.forward, ctx.cos_half_fov)
            {
                continue;
            }

            let at = self.candidates.partition_point(|c| c.dist_sq <= dist_sq);
            self.candidates.insert(at, Candidate { entity, dist_sq });
            self.candidates.truncate(limit);
        }
    }
}

impl SelectionStrategy for AroundStrategy {
    fn select<W: WorldView + ?Sized>(&mut self, ctx: &SelectionContext<'_>, world: &W, out: &mut Vec<EntityInfo>) {
        out.clear();

        let cap = usize::try_from(ctx.config.max_bars_displayed).unwrap_or(0);
        if cap == 0 {
            return;
        }

        let reserved = if ctx.config.always_show_target_in_around {
            ctx.eligible_target()
        } else {
            None
        };
        if let Some(target) = reserved {
            out.push(target.clone());
        }

        let remaining = cap - out.len();
        if remaining == 0 {
            return;
        }

        self.collect(ctx, world, reserved.map(|t| t.id), remaining);
        out.extend(self.candidates.drain(..).map(|c| c.entity));
    }
}

/// Selection mode chosen by the config snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Reticle target only
    TargetOnly,
    /// Nearby entities
    Around,
}

impl SelectionMode {
    /// Mode for a config snapshot.
    #[must_use]
    pub fn for_config(cfg: &ConfigSnapshot) -> Self {
        if cfg.target_only {
            Self::TargetOnly
        } else {
            Self::Around
        }
    }
}

/// Closed set of strategies, dispatched through [`SelectionStrategy`].
#[derive(Debug)]
pub enum Strategy {
    /// Target-only strategy
    TargetOnly(TargetOnlyStrategy),
    /// Around strategy
    Around(AroundStrategy),
}

impl Strategy {
    /// Fresh strategy for a mode.
    #[must_use]
    pub fn for_mode(mode: SelectionMode) -> Self {
        match mode {
            SelectionMode::TargetOnly => Self::TargetOnly(TargetOnlyStrategy),
            SelectionMode::Around => Self::Around(AroundStrategy::new()),
        }
    }

    /// Mode implemented by this strategy.
    #[must_use]
    pub fn mode(&self) -> SelectionMode {
        match self {
            Self::TargetOnly(_) => SelectionMode::TargetOnly,
            Self::Around(_) => SelectionMode::Around,
        }
    }
}

impl SelectionStrategy for Strategy {
    fn select<W: WorldView + ?Sized>(&mut self, ctx: &SelectionContext<'_>, world: &W, out: &mut Vec<EntityInfo>) {
        match self {
            Self::TargetOnly(s) => s.select(ctx, world, out),
            Self::Around(s) => s.select(ctx, world, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{PlayerView, SimWorld};
    use proptest::prelude::*;
    use super::Strategy;

    fn world_with_player(target: Option<u64>) -> SimWorld {
        let mut world = SimWorld::new();
        world.set_player(PlayerView {
            entity_id: EntityId::from_raw(1000),
            position: DVec3::ZERO,
            yaw: 0.0,
            target: target.map(EntityId::from_raw),
        });
        world
    }

    fn ids(out: &[EntityInfo]) -> Vec<u64> {
        out.iter().map(|e| e.id.raw()).collect()
    }

    fn cfg(max: i32, always_target: bool) -> ConfigSnapshot {
        ConfigSnapshot {
            max_bars_displayed: max,
            always_show_target_in_around: always_target,
            ..ConfigSnapshot::default()
        }
    }

    #[test]
    fn test_target_only_returns_eligible_target() {
        let mut world = world_with_player(Some(5));
        world.spawn(EntityInfo::creature(5, DVec3::new(0.0, 0.0, 3.0), 20.0));
        world.spawn(EntityInfo::creature(6, DVec3::new(0.0, 0.0, 2.0), 20.0));
        let config = cfg(7, true);
        let ctx = SelectionContext::from_world(&world, &config).expect("player");

        let mut out = Vec::new();
        TargetOnlyStrategy.select(&ctx, &world, &mut out);
        assert_eq!(ids(&out), vec![5]);
    }

    #[test]
    fn test_target_only_skips_ineligible_target() {
        let mut world = world_with_player(Some(5));
        world.spawn(EntityInfo::creature(5, DVec3::new(0.0, 0.0, 3.0), 20.0).with_health(None));
        let config = cfg(7, true);
        let ctx = SelectionContext::from_world(&world, &config).expect("player");

        let mut out = vec![EntityInfo::creature(9, DVec3::ZERO, 1.0)];
        TargetOnlyStrategy.select(&ctx, &world, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_no_player_no_context() {
        let world = SimWorld::new();
        let config = cfg(7, true);
        assert!(SelectionContext::from_world(&world, &config).is_none());
    }

    #[test]
    fn test_around_ranks_by_horizontal_distance() {
        let mut world = world_with_player(None);
        world.spawn(EntityInfo::creature(1, DVec3::new(0.0, 0.0, 9.0), 10.0));
        world.spawn(EntityInfo::creature(2, DVec3::new(0.0, 8.0, 2.0), 10.0));
        world.spawn(EntityInfo::creature(3, DVec3::new(0.5, 0.0, 5.0), 10.0));
        world.spawn(EntityInfo::creature(4, DVec3::new(0.0, 0.0, -3.0), 10.0));
        let config = cfg(7, true);
        let ctx = SelectionContext::from_world(&world, &config).expect("player");

        let mut out = Vec::new();
        AroundStrategy::new().select(&ctx, &world, &mut out);
        // 4 is behind the player
        assert_eq!(ids(&out), vec![2, 3, 1]);
    }

    #[test]
    fn test_around_excludes_self() {
        let mut world = world_with_player(None);
        world.spawn(EntityInfo::creature(1000, DVec3::new(0.0, 0.0, 1.0), 10.0));
        world.spawn(EntityInfo::creature(1, DVec3::new(0.0, 0.0, 2.0), 10.0));
        let config = cfg(7, true);
        let ctx = SelectionContext::from_world(&world, &config).expect("player");

        let mut out = Vec::new();
        AroundStrategy::new().select(&ctx, &world, &mut out);
        assert_eq!(ids(&out), vec![1]);
    }

    #[test]
    fn test_around_reserves_target_slot() {
        // Target is far and outside the FOV, still reserved first
        let mut world = world_with_player(Some(9));
        world.spawn(EntityInfo::creature(9, DVec3::new(0.0, 0.0, -12.0), 10.0));
        for i in 1..=5 {
            world.spawn(EntityInfo::creature(i, DVec3::new(0.0, 0.0, i as f64), 10.0));
        }
        let config = cfg(3, true);
        let ctx = SelectionContext::from_world(&world, &config).expect("player");

        let mut out = Vec::new();
        AroundStrategy::new().select(&ctx, &world, &mut out);
        assert_eq!(ids(&out), vec![9, 1, 2]);
    }

    #[test]
    fn test_around_without_reservation_ranks_target_normally() {
        let mut world = world_with_player(Some(3));
        for i in 1..=5 {
            world.spawn(EntityInfo::creature(i, DVec3::new(0.0, 0.0, i as f64), 10.0));
        }
        let config = cfg(2, false);
        let ctx = SelectionContext::from_world(&world, &config).expect("player");

        let mut out = Vec::new();
        AroundStrategy::new().select(&ctx, &world, &mut out);
        assert_eq!(ids(&out), vec![1, 2]);
    }

    #[test]
    fn test_around_cap_zero_or_negative() {
        let mut world = world_with_player(Some(1));
        world.spawn(EntityInfo::creature(1, DVec3::new(0.0, 0.0, 1.0), 10.0));
        for max in [0, -4] {
            let config = cfg(max, true);
            let ctx = SelectionContext::from_world(&world, &config).expect("player");
            let mut out = Vec::new();
            AroundStrategy::new().select(&ctx, &world, &mut out);
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_around_cap_filled_by_target() {
        let mut world = world_with_player(Some(1));
        world.spawn(EntityInfo::creature(1, DVec3::new(0.0, 0.0, 4.0), 10.0));
        world.spawn(EntityInfo::creature(2, DVec3::new(0.0, 0.0, 1.0), 10.0));
        let config = cfg(1, true);
        let ctx = SelectionContext::from_world(&world, &config).expect("player");

        let mut out = Vec::new();
        AroundStrategy::new().select(&ctx, &world, &mut out);
        assert_eq!(ids(&out), vec![1]);
    }

    #[test]
    fn test_around_ties_keep_query_order() {
        let mut world = world_with_player(None);
        world.spawn(EntityInfo::creature(7, DVec3::new(1.0, 0.0, 4.0), 10.0));
        world.spawn(EntityInfo::creature(3, DVec3::new(-1.0, 0.0, 4.0), 10.0));
        world.spawn(EntityInfo::creature(5, DVec3::new(1.0, 2.0, 4.0), 10.0));
        let config = cfg(2, true);
        let ctx = SelectionContext::from_world(&world, &config).expect("player");

        let mut out = Vec::new();
        AroundStrategy::new().select(&ctx, &world, &mut out);
        assert_eq!(ids(&out), vec![7, 3]);
    }

    #[test]
    fn test_strategy_enum_dispatch() {
        let mut world = world_with_player(Some(2));
        world.spawn(EntityInfo::creature(1, DVec3::new(0.0, 0.0, 1.0), 10.0));
        world.spawn(EntityInfo::creature(2, DVec3::new(0.0, 0.0, 6.0), 10.0));
        let config = cfg(7, false);
        let ctx = SelectionContext::from_world(&world, &config).expect("player");

        let mut out = Vec::new();
        let mut strategy = Strategy::for_mode(SelectionMode::TargetOnly);
        strategy.select(&ctx, &world, &mut out);
        assert_eq!(ids(&out), vec![2]);

        let mut strategy = Strategy::for_mode(SelectionMode::Around);
        assert_eq!(strategy.mode(), SelectionMode::Around);
        strategy.select(&ctx, &world, &mut out);
        assert_eq!(ids(&out), vec![1, 2]);
    }

    proptest! {
        #[test]
        fn test_around_never_exceeds_cap(
            positions in proptest::collection::vec((-14.0f64..14.0, -14.0f64..14.0), 0..40),
            max in 0i32..10,
            always_target in any::<bool>(),
            target_index in 0usize..40,
        ) {
            let target = (target_index < positions.len()).then(|| target_index as u64 + 1);
            let mut world = world_with_player(target);
            for (i, (x, z)) in positions.iter().enumerate() {
                world.spawn(EntityInfo::creature(i as u64 + 1, DVec3::new(*x, 0.0, *z), 10.0));
            }
            let config = cfg(max, always_target);
            let ctx = SelectionContext::from_world(&world, &config).expect("player");

            let mut out = Vec::new();
            AroundStrategy::new().select(&ctx, &world, &mut out);
            prop_assert!(out.len() <= max as usize);

            // After the reserved slot, output is ascending by distance and no
            // unchosen in-view entity is strictly closer than the farthest
            // chosen one.
            let skip = usize::from(always_target && target.is_some() && max > 0);
            let ranked: Vec<f64> = out[skip..]
                .iter()
                .map(|e| horizontal_distance_sq(DVec3::ZERO, e.position))
                .collect();
            prop_assert!(ranked.windows(2).all(|w| w[0] <= w[1]));

            if out.len() == max as usize && !ranked.is_empty() {
                let worst = ranked[ranked.len() - 1];
                let chosen = ids(&out);
                for e in world.entities() {
                    let d = horizontal_distance_sq(DVec3::ZERO, e.position);
                    let in_view = is_in_fov(DVec3::ZERO, e.position, ctx.forward, ctx.cos_half_fov);
                    prop_assert!(!(in_view && d < worst && !chosen.contains(&e.id.raw())));
                }
            }
        }
    }
}

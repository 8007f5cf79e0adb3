//! Per-entity bar state and its registry.
//!
//! The registry owns exactly one [`BarState`] per tracked entity id. States
//! are created by a selection pass, kept alive while selected, and removed
//! only once they are marked dead and fully faded out.

use std::collections::HashMap;

use ahash::RandomState;
use healthbar_common::{clamp01, jitter01, lerp, EntityId, FADED_EPSILON};
use tracing::trace;

use crate::los::LineOfSight;
use crate::world::{EntityInfo, WorldView};

/// Base interval between line-of-sight checks of one entity (seconds).
pub const LOS_BASE_INTERVAL: f64 = 0.32;

/// Amplitude of the per-entity jitter added to [`LOS_BASE_INTERVAL`].
pub const LOS_JITTER: f64 = 0.12;

/// Amplitude of the jitter applied to a new state's first check.
pub const LOS_INITIAL_SPREAD: f64 = 0.1;

/// Global raycast budget of one visibility pass.
pub const MAX_RAYCASTS_PER_TICK: usize = 3;

/// Easing speed of the displayed health fraction on damage.
pub const FILL_LERP_SPEED: f32 = 6.0;

// Fixed seeds keep iteration (and therefore draw) order stable across runs.
const MAP_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// Animation and visibility state of one entity's bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarState {
    entity: EntityId,
    desired_visible: bool,
    has_line_of_sight: bool,
    next_los_check_at: f64,
    visible_this_frame: bool,
    is_target: bool,
    opacity: f32,
    shown_health_fraction: f32,
    first_show: bool,
    marked_dead: bool,
}

impl BarState {
    /// Fresh, fully transparent state.
    #[must_use]
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            desired_visible: false,
            has_line_of_sight: true,
            next_los_check_at: 0.0,
            visible_this_frame: false,
            is_target: false,
            opacity: 0.0,
            shown_health_fraction: 1.0,
            first_show: true,
            marked_dead: false,
        }
    }

    /// Tracked entity.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Selected by the last selection pass.
    #[must_use]
    pub fn desired_visible(&self) -> bool {
        self.desired_visible
    }

    /// Result of the last line-of-sight check.
    #[must_use]
    pub fn has_line_of_sight(&self) -> bool {
        self.has_line_of_sight
    }

    /// Clock time of the next line-of-sight check.
    #[must_use]
    pub fn next_los_check_at(&self) -> f64 {
        self.next_los_check_at
    }

    /// Should fade in this frame.
    #[must_use]
    pub fn visible_this_frame(&self) -> bool {
        self.visible_this_frame
    }

    /// Is the reticle target.
    #[must_use]
    pub fn is_target(&self) -> bool {
        self.is_target
    }

    /// Current opacity in `[0, 1]`.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Displayed health fraction in `[0, 1]`.
    #[must_use]
    pub fn shown_health_fraction(&self) -> f32 {
        self.shown_health_fraction
    }

    /// Waiting for the first displayed health sample.
    #[must_use]
    pub fn first_show(&self) -> bool {
        self.first_show
    }

    /// Scheduled for removal once faded.
    #[must_use]
    pub fn marked_dead(&self) -> bool {
        self.marked_dead
    }

    /// Fully transparent.
    #[must_use]
    pub fn is_faded(&self) -> bool {
        self.opacity <= FADED_EPSILON
    }

    /// Whether the registry may drop this state.
    #[must_use]
    pub fn is_removable(&self) -> bool {
        self.marked_dead && self.is_faded()
    }

    /// Steps opacity toward 1 when visible this frame, toward 0 otherwise.
    ///
    /// Fade durations are full-range times in seconds and must be positive.
    pub fn advance_opacity(&mut self, dt: f32, fade_in: f32, fade_out: f32) -> f32 {
        let step = if self.visible_this_frame {
            dt / fade_in
        } else {
            -dt / fade_out
        };
        self.opacity = clamp01(self.opacity + step);
        self.opacity
    }

    /// Feeds the raw health fraction into the displayed one.
    ///
    /// The first sample snaps. Damage eases down at [`FILL_LERP_SPEED`];
    /// heals and unchanged values snap.
    pub fn advance_shown_health(&mut self, raw: f32, dt: f32) -> f32 {
        let raw = clamp01(raw);
        if self.first_show {
            self.shown_health_fraction = raw;
            self.first_show = false;
        } else if raw < self.shown_health_fraction {
            let t = clamp01(dt * FILL_LERP_SPEED);
            self.shown_health_fraction = lerp(self.shown_health_fraction, raw, t);
        } else {
            self.shown_health_fraction = raw;
        }
        self.shown_health_fraction
    }

    fn hide_and_kill(&mut self) {
        self.desired_visible = false;
        self.visible_this_frame = false;
        self.marked_dead = true;
    }
}

/// All bar states, keyed by entity id.
#[derive(Debug, Clone)]
pub struct BarRegistry {
    states: HashMap<EntityId, BarState, RandomState>,
}

impl Default for BarRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BarRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        let [k0, k1, k2, k3] = MAP_SEEDS;
        Self {
            states: HashMap::with_capacity_and_hasher(256, RandomState::with_seeds(k0, k1, k2, k3)),
        }
    }

    /// Clears the per-pass flags of every state.
    pub fn begin_selection(&mut self) {
        for st in self.states.values_mut() {
            st.desired_visible = false;
            st.is_target = false;
        }
    }

    /// Applies the result of a selection pass.
    ///
    /// Selected entities get (or keep) a state marked desired; every other
    /// state is marked dead and starts fading out. `target` is the eligible
    /// reticle target, if any.
    pub fn apply_selection(&mut self, selected: &[EntityInfo], target: Option<EntityId>, now: f64, target_only: bool) {
        self.begin_selection();

        for entity in selected {
            let id = entity.id;
            let initial_check = now + f64::from(jitter01(id)) * LOS_INITIAL_SPREAD;
            let st = self.states.entry(id).or_insert_with(|| {
                trace!("Tracking bar for entity {id}");
                let mut st = BarState::new(id);
                st.next_los_check_at = initial_check;
                st
            });

            st.desired_visible = true;
            st.is_target = target == Some(id);
            if !target_only && st.next_los_check_at <= 0.0 {
                st.next_los_check_at = initial_check;
            }
        }

        for st in self.states.values_mut() {
            st.marked_dead = !st.desired_visible;
        }
    }

    /// Per-frame visibility pass.
    ///
    /// States whose entity left the world (or died) are hidden and marked
    /// dead, so they fade out and are removed once transparent. In target-only mode line
    /// of sight is assumed; otherwise at most [`MAX_RAYCASTS_PER_TICK`] due
    /// checks run and are rescheduled with per-entity jitter. Returns the
    /// number of raycasts performed.
    pub fn refresh_visibility<W, L>(&mut self, world: &W, los: &L, now: f64, target_only: bool) -> usize
    where
        W: WorldView + ?Sized,
        L: LineOfSight + ?Sized,
    {
        let mut budget = MAX_RAYCASTS_PER_TICK;

        for st in self.states.values_mut() {
            let entity = match world.entity(st.entity) {
                Some(e) if e.alive => e,
                _ => {
                    if !st.marked_dead {
                        trace!("Entity {} is gone, fading its bar out", st.entity);
                    }
                    st.hide_and_kill();
                    continue;
                }
            };

            if target_only {
                st.has_line_of_sight = true;
            } else if st.desired_visible && now >= st.next_los_check_at && budget > 0 {
                budget -= 1;
                st.has_line_of_sight = los.has_line_of_sight(&entity);
                st.next_los_check_at = now + LOS_BASE_INTERVAL + f64::from(jitter01(st.entity)) * LOS_JITTER;
            }

            st.visible_this_frame = st.desired_visible && st.has_line_of_sight;
        }

        MAX_RAYCASTS_PER_TICK - budget
    }

    /// Hides every bar and schedules it for removal.
    pub fn fade_all_out(&mut self) {
        for st in self.states.values_mut() {
            st.hide_and_kill();
        }
    }

    /// Steps every bar's opacity toward its visibility target.
    pub fn advance_opacity(&mut self, dt: f32, fade_in: f32, fade_out: f32) {
        for st in self.states.values_mut() {
            st.advance_opacity(dt, fade_in, fade_out);
        }
    }

    /// Drops every dead, fully faded state. Returns how many were removed.
    pub fn remove_faded(&mut self) -> usize {
        let before = self.states.len();
        self.states.retain(|id, st| {
            let keep = !st.is_removable();
            if !keep {
                trace!("Removing bar for entity {id}");
            }
            keep
        });
        before - self.states.len()
    }

    /// Drops every state.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Number of tracked entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// No tracked entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// State of one entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&BarState> {
        self.states.get(&id)
    }

    /// Iterates all states.
    pub fn iter(&self) -> impl Iterator<Item = &BarState> {
        self.states.values()
    }

    /// Iterates all states mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BarState> {
        self.states.values_mut()
    }
}

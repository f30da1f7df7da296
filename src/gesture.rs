//! Maps a live swipe onto the state adjustment and picks where it settles.
//!
//! # How a swipe becomes a state change
//!
//! 1. **`begin`** records a [`SwipeAnchor`]: how many pixels of travel make
//!    one full state step, which states the swipe may settle in, the value
//!    at the start and the state to return to if the swipe is abandoned.
//!    The adjustment's running transition (if any) is cancelled.
//! 2. **Each `progress`** adds the raw pixel delta to an accumulator,
//!    converts it to state units and writes the clamped result straight to
//!    the adjustment.  No snapping happens while the finger is down.
//! 3. **`end`** picks a settle state:
//!    - travel below [`GestureConfig::dead_zone`] returns to the cancel
//!      target;
//!    - a release slower than [`GestureConfig::flick_velocity`] settles in
//!      the nearest snap point;
//!    - a faster flick settles in the next snap point in the direction of
//!      travel, even if the nearest one is behind.
//!
//!    The adjustment then animates there with a duration derived from the
//!    remaining distance and the release velocity.

use crate::adjustment::StateAdjustment;
use crate::animator::{CompletionCallback, TransitionError, TransitionParams};
use crate::easing::Easing;
use crate::state::ControlsState;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Tuning knobs for swipe tracking and release.
///
/// Distances are in state units (one unit = one state step), velocities in
/// state units per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Invert the swipe direction (natural swiping: swipe up → next state
    /// when deltas grow downward).  Default: `true`.
    pub invert: bool,
    /// Travel below which a release returns to the cancel target.
    /// Default: `0.05`.
    pub dead_zone: f64,
    /// Release speed above which the direction of travel wins over the
    /// nearest state.  Default: `0.4`.
    pub flick_velocity: f64,
    /// Scale applied to `distance / velocity` for the settle duration.
    /// Default: `3.0`.
    pub duration_multiplier: f64,
    /// Shortest settle animation (ms).  Default: `100`.
    pub min_duration_ms: u64,
    /// Longest settle animation, also used for a zero-velocity release (ms).
    /// Default: `400`.
    pub max_duration_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            invert: true,
            dead_zone: 0.05,
            flick_velocity: 0.4,
            duration_multiplier: 3.0,
            min_duration_ms: 100,
            max_duration_ms: 400,
        }
    }
}

/// Gesture protocol violations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GestureError {
    #[error("no gesture in progress")]
    NotActive,
    #[error("a gesture is already in progress")]
    AlreadyActive,
    #[error("gesture needs at least one snap point")]
    NoSnapPoints,
    #[error("base distance must be positive and finite, got {0}")]
    InvalidBaseDistance(f64),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Where a swipe starts and what it may settle in.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeAnchor {
    /// Pixels of travel per state step.
    pub base_distance: f64,
    /// States the swipe may settle in.
    pub snap_points: Vec<ControlsState>,
    /// Adjustment value when the swipe started.
    pub current_value: f64,
    /// State to return to when the swipe is abandoned.
    pub cancel_target: ControlsState,
}

/// How a swipe is released.
pub struct Release {
    /// Release velocity in pixels per second, same axis as the deltas.
    pub velocity: f64,
    /// Settle here instead of choosing from velocity and position.
    pub target: Option<ControlsState>,
    pub easing: Easing,
    on_complete: Option<CompletionCallback>,
}

impl Release {
    /// Release with `velocity`, letting the controller choose the state.
    pub fn with_velocity(velocity: f64, easing: Easing) -> Self {
        Self {
            velocity,
            target: None,
            easing,
            on_complete: None,
        }
    }

    /// Release toward an explicit state.
    pub fn to_target(target: ControlsState, easing: Easing) -> Self {
        Self {
            velocity: 0.0,
            target: Some(target),
            easing,
            on_complete: None,
        }
    }

    /// Attach a callback fired when the settle animation completes.
    pub fn on_complete(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

/// Where a released swipe is settling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureOutcome {
    pub target: ControlsState,
    pub duration: Duration,
}

#[derive(Debug)]
struct ActiveSwipe {
    anchor_value: f64,
    base_distance: f64,
    snap_points: Vec<ControlsState>,
    cancel_target: ControlsState,
    /// Accumulated raw delta in pixels.
    travel: f64,
}

impl ActiveSwipe {
    fn bounds(&self) -> (f64, f64) {
        let lo = self.snap_points.first().map_or(0.0, |s| s.value());
        let hi = self.snap_points.last().map_or(0.0, |s| s.value());
        (lo, hi)
    }
}

/// Tracks one swipe at a time against a [`StateAdjustment`].
#[derive(Debug, Default)]
pub struct GestureController {
    config: GestureConfig,
    active: Option<ActiveSwipe>,
}

impl GestureController {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Stop tracking without touching the adjustment.  Used when a discrete
    /// command takes over mid-swipe.  Returns whether a swipe was active.
    pub fn reset(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// Start tracking a swipe.  Cancels any transition on `adjustment`.
    pub fn begin(
        &mut self,
        adjustment: &mut StateAdjustment,
        anchor: SwipeAnchor,
    ) -> Result<(), GestureError> {
        if self.active.is_some() {
            return Err(GestureError::AlreadyActive);
        }
        if !(anchor.base_distance.is_finite() && anchor.base_distance > 0.0) {
            return Err(GestureError::InvalidBaseDistance(anchor.base_distance));
        }
        let mut snap_points = anchor.snap_points;
        snap_points.sort();
        snap_points.dedup();
        if snap_points.is_empty() {
            return Err(GestureError::NoSnapPoints);
        }

        debug!(
            "gesture begin at {:.3} (cancel → {}, base {:.0}px)",
            anchor.current_value, anchor.cancel_target, anchor.base_distance
        );
        adjustment.begin_gesture();
        adjustment.set_gesture_value(anchor.current_value);
        self.active = Some(ActiveSwipe {
            anchor_value: adjustment.value(),
            base_distance: anchor.base_distance,
            snap_points,
            cancel_target: anchor.cancel_target,
            travel: 0.0,
        });
        Ok(())
    }

    /// Feed an incremental raw delta (pixels).  Returns the new value.
    pub fn progress(
        &mut self,
        adjustment: &mut StateAdjustment,
        raw_delta: f64,
    ) -> Result<f64, GestureError> {
        let swipe = self.active.as_mut().ok_or(GestureError::NotActive)?;
        if raw_delta.is_finite() {
            swipe.travel += raw_delta;
        }
        let (lo, hi) = swipe.bounds();
        let value = swipe_value(
            swipe.anchor_value,
            swipe.travel,
            swipe.base_distance,
            self.config.invert,
        )
        .clamp(lo, hi);
        adjustment.set_gesture_value(value);
        Ok(adjustment.value())
    }

    /// Release the swipe and start the settle transition.
    pub fn end(
        &mut self,
        adjustment: &mut StateAdjustment,
        release: Release,
        now: Instant,
    ) -> Result<GestureOutcome, GestureError> {
        let swipe = self.active.take().ok_or(GestureError::NotActive)?;
        let value = adjustment.value();
        let velocity = oriented(release.velocity, self.config.invert) / swipe.base_distance;
        let velocity = if velocity.is_finite() { velocity } else { 0.0 };

        let target = match release.target {
            Some(target) => target,
            None => choose_target(
                value,
                swipe.anchor_value,
                velocity,
                &swipe.snap_points,
                swipe.cancel_target,
                &self.config,
            ),
        };
        let duration = settle_duration(value, target.value(), velocity, &self.config);

        debug!(
            "gesture end at {:.3} (v={:.2}/s) → {} in {}ms",
            value,
            velocity,
            target,
            duration.as_millis()
        );

        let mut params = TransitionParams::to_state(target, duration, release.easing)?;
        if let Some(cb) = release.on_complete {
            params = params.on_complete(cb);
        }
        adjustment.end_gesture(params, now);
        Ok(GestureOutcome { target, duration })
    }

    /// Abandon the swipe, settling back on its cancel target.
    pub fn cancel(
        &mut self,
        adjustment: &mut StateAdjustment,
        easing: Easing,
        now: Instant,
    ) -> Result<GestureOutcome, GestureError> {
        let target = self
            .active
            .as_ref()
            .map(|s| s.cancel_target)
            .ok_or(GestureError::NotActive)?;
        self.end(adjustment, Release::to_target(target, easing), now)
    }
}

fn oriented(raw: f64, invert: bool) -> f64 {
    if invert {
        -raw
    } else {
        raw
    }
}

/// Adjustment value for `travel` pixels from `anchor`.
pub(crate) fn swipe_value(anchor: f64, travel: f64, base_distance: f64, invert: bool) -> f64 {
    anchor + oriented(travel, invert) / base_distance
}

/// Pick the settle state for a release at `value` with `velocity`
/// (state units per second, positive toward higher states).
///
/// `snap_points` must be sorted and non-empty.
pub(crate) fn choose_target(
    value: f64,
    anchor: f64,
    velocity: f64,
    snap_points: &[ControlsState],
    cancel_target: ControlsState,
    config: &GestureConfig,
) -> ControlsState {
    if (value - anchor).abs() < config.dead_zone {
        return cancel_target;
    }

    let nearest = || {
        snap_points
            .iter()
            .copied()
            .min_by(|a, b| {
                let da = (a.value() - value).abs();
                let db = (b.value() - value).abs();
                // Ties go to the higher state.
                da.partial_cmp(&db)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.cmp(a))
            })
            .unwrap_or(cancel_target)
    };

    if velocity.abs() < config.flick_velocity {
        return nearest();
    }

    let directed = if velocity > 0.0 {
        snap_points.iter().copied().find(|s| s.value() > value)
    } else {
        snap_points.iter().rev().copied().find(|s| s.value() < value)
    };
    directed.unwrap_or_else(nearest)
}

/// Settle duration: remaining distance over release speed, scaled and
/// clamped.  A zero-velocity release takes the maximum.
pub(crate) fn settle_duration(
    value: f64,
    target: f64,
    velocity: f64,
    config: &GestureConfig,
) -> Duration {
    let min = config.min_duration_ms.max(1);
    let max = config.max_duration_ms.max(min);
    let ms = if velocity.abs() > f64::EPSILON {
        (target - value).abs() / velocity.abs() * 1000.0 * config.duration_multiplier
    } else {
        max as f64
    };
    let ms = if ms.is_finite() { ms.round() as u64 } else { max };
    Duration::from_millis(ms.clamp(min, max))
}

//  Tests

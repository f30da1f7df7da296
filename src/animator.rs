//! Timed, eased transitions of a scalar.
//!
//! [`TransitionAnimator`] is a small state machine:
//!
//! ```text
//! Idle ──start──▶ Running ──tick (f == 1)──▶ Completed
//!                    │
//!                    └──start / cancel──▶ Cancelled
//! ```
//!
//! Starting a transition while one is running cancels the old one (its
//! completion callback is dropped, never called) and begins the new one from
//! the *current* value, so a redirected transition continues from where the
//! old one was instead of snapping back.
//!
//! The animator does not read a clock.  Every call takes `now`, which makes
//! the frame scheduler the single source of time.

use crate::easing::Easing;
use crate::geometry::lerp;
use crate::state::ControlsState;
use std::fmt;
use std::time::{Duration, Instant};

/// Callback fired once when a transition runs to completion.
pub type CompletionCallback = Box<dyn FnOnce()>;

/// Rejected transition parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("transition target must be finite, got {0}")]
    NonFiniteTarget(f64),
    #[error("transition duration must be positive")]
    NonPositiveDuration,
}

/// A validated request to animate toward a target.
pub struct TransitionParams {
    target: f64,
    duration: Duration,
    easing: Easing,
    on_complete: Option<CompletionCallback>,
}

impl TransitionParams {
    /// Validate and build parameters for a transition to `target`.
    pub fn new(target: f64, duration: Duration, easing: Easing) -> Result<Self, TransitionError> {
        if !target.is_finite() {
            return Err(TransitionError::NonFiniteTarget(target));
        }
        if duration.is_zero() {
            return Err(TransitionError::NonPositiveDuration);
        }
        Ok(Self {
            target,
            duration,
            easing,
            on_complete: None,
        })
    }

    /// Parameters for a transition that settles in `state`.
    pub fn to_state(
        state: ControlsState,
        duration: Duration,
        easing: Easing,
    ) -> Result<Self, TransitionError> {
        Self::new(state.value(), duration, easing)
    }

    /// Attach a completion callback.
    pub fn on_complete(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Clamp the target into `[lower, upper]`.
    pub(crate) fn clamp_target(&mut self, lower: f64, upper: f64) {
        self.target = self.target.clamp(lower, upper);
    }
}

impl fmt::Debug for TransitionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionParams")
            .field("target", &self.target)
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// A pending completion callback handed back by [`TransitionAnimator::tick`].
///
/// The owner of the animated value stores the final value first and then
/// calls [`fire`](Completion::fire), so the callback observes the settled
/// state.
#[must_use = "a completion does nothing unless fired"]
pub struct Completion(Option<CompletionCallback>);

impl Completion {
    /// Run the callback, if any.
    pub fn fire(self) {
        if let Some(cb) = self.0 {
            cb();
        }
    }

    /// Whether a callback is attached.
    pub fn has_callback(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Completion({})", if self.0.is_some() { "callback" } else { "none" })
    }
}

/// Observable phase of a [`TransitionAnimator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorPhase {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Result of advancing the animator by one frame.
#[derive(Debug)]
pub enum Tick {
    /// Nothing is running.
    Idle,
    /// Still running; the value to display this frame.
    Running { value: f64, fraction: f64 },
    /// Reached the end this frame.  `value` is exactly the target.
    Completed { value: f64, completion: Completion },
}

struct Running {
    start_value: f64,
    target_value: f64,
    start_time: Instant,
    duration: Duration,
    easing: Easing,
    on_complete: Option<CompletionCallback>,
}

impl Running {
    /// Elapsed fraction `f` in `[0, 1]`.
    fn fraction(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.start_time);
        if elapsed >= self.duration {
            return 1.0;
        }
        (elapsed.as_nanos() as f64 / self.duration.as_nanos() as f64).clamp(0.0, 1.0)
    }

    fn value_at(&self, fraction: f64) -> f64 {
        lerp(self.start_value, self.target_value, self.easing.apply(fraction))
    }
}

enum Phase {
    Idle,
    Running(Running),
    Completed,
    Cancelled,
}

/// Drives a scalar from its current value toward a target over time.
pub struct TransitionAnimator {
    phase: Phase,
}

impl Default for TransitionAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionAnimator {
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    pub fn phase(&self) -> AnimatorPhase {
        match self.phase {
            Phase::Idle => AnimatorPhase::Idle,
            Phase::Running(_) => AnimatorPhase::Running,
            Phase::Completed => AnimatorPhase::Completed,
            Phase::Cancelled => AnimatorPhase::Cancelled,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    /// `(start, target)` of the running transition.
    pub fn interval(&self) -> Option<(f64, f64)> {
        match &self.phase {
            Phase::Running(r) => Some((r.start_value, r.target_value)),
            _ => None,
        }
    }

    /// Target of the running transition.
    pub fn target(&self) -> Option<f64> {
        self.interval().map(|(_, target)| target)
    }

    /// Start a transition from `current_value`.
    ///
    /// A running transition is cancelled first.  Returns `true` if one was.
    pub fn start(&mut self, current_value: f64, params: TransitionParams, now: Instant) -> bool {
        let cancelled = self.cancel();
        self.phase = Phase::Running(Running {
            start_value: current_value,
            target_value: params.target,
            start_time: now,
            duration: params.duration,
            easing: params.easing,
            on_complete: params.on_complete,
        });
        cancelled
    }

    /// Cancel the running transition without firing its callback.
    ///
    /// Returns `true` if a transition was running.
    pub fn cancel(&mut self) -> bool {
        if self.is_running() {
            // Dropping the phase drops the callback unfired.
            self.phase = Phase::Cancelled;
            true
        } else {
            false
        }
    }

    /// The value the running transition would show at `now`, without
    /// advancing the state machine.
    pub fn sample(&self, now: Instant) -> Option<f64> {
        match &self.phase {
            Phase::Running(r) => {
                let f = r.fraction(now);
                Some(if f >= 1.0 { r.target_value } else { r.value_at(f) })
            }
            _ => None,
        }
    }

    /// Advance to `now`.
    pub fn tick(&mut self, now: Instant) -> Tick {
        let (fraction, value) = match &self.phase {
            Phase::Running(r) => {
                let f = r.fraction(now);
                (f, r.value_at(f))
            }
            _ => return Tick::Idle,
        };

        if fraction < 1.0 {
            return Tick::Running { value, fraction };
        }

        match std::mem::replace(&mut self.phase, Phase::Completed) {
            Phase::Running(r) => Tick::Completed {
                value: r.target_value,
                completion: Completion(r.on_complete),
            },
            other => {
                self.phase = other;
                Tick::Idle
            }
        }
    }
}

impl fmt::Debug for TransitionAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("TransitionAnimator");
        d.field("phase", &self.phase());
        if let Phase::Running(r) = &self.phase {
            d.field("start_value", &r.start_value)
                .field("target_value", &r.target_value)
                .field("duration", &r.duration)
                .field("easing", &r.easing);
        }
        d.finish()
    }
}

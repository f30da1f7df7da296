//! The continuous scalar that drives the overview controls.
//!
//! [`StateAdjustment`] holds a clamped `value` whose integral points are the
//! [`ControlsState`] ordinals.  The value is moved either by an eased
//! transition (owned [`TransitionAnimator`]) or by a live gesture, never by
//! both at once: beginning a gesture cancels the transition and beginning a
//! transition ends the gesture.
//!
//! [`resolve`] turns the adjustment into a [`TransitionDescriptor`], the
//! `(initial, final, progress)` triple every dependent computation is
//! interpolated with.
//!
//! # Change notification
//!
//! The adjustment has a single subscriber slot: an
//! [`mpsc::Sender<ValueChanged>`](std::sync::mpsc::Sender) attached with
//! [`connect`](StateAdjustment::connect).  Every mutation that actually
//! changes `value` sends one event.  The owner drains them once per frame, so
//! many mutations within a frame still produce one layout pass.

use crate::animator::{TransitionAnimator, TransitionParams, Tick};
use crate::state::ControlsState;
use log::debug;
use std::sync::mpsc;
use std::time::Instant;

/// Sent to the subscriber after `value` changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueChanged {
    pub value: f64,
}

/// Normalised view of where the adjustment is between canonical states.
///
/// Derived on demand, never stored as source of truth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionDescriptor {
    /// A transition or a gesture is driving the value.
    pub transitioning: bool,
    /// The raw scalar.
    pub value: f64,
    /// `value` rounded to the nearest state.
    pub current_state: ControlsState,
    pub initial_state: ControlsState,
    pub final_state: ControlsState,
    /// Position between `initial_state` and `final_state`, in `[0, 1]`.
    pub progress: f64,
}

impl TransitionDescriptor {
    /// Descriptor for a value at rest.
    pub fn settled(value: f64) -> Self {
        let state = ControlsState::from_value(value);
        Self {
            transitioning: false,
            value,
            current_state: state,
            initial_state: state,
            final_state: state,
            progress: 1.0,
        }
    }
}

/// Compute the descriptor for `value`.
///
/// `interval` is the `(start, target)` of the active transition.  While
/// moving down the initial bound is rounded up and the final bound down; while
/// moving up (or holding still) the reverse, so the pair always brackets the
/// travelled range and `progress` is well defined at integral boundaries.
pub fn resolve(
    value: f64,
    interval: Option<(f64, f64)>,
    gesture_in_progress: bool,
) -> TransitionDescriptor {
    if interval.is_none() && !gesture_in_progress {
        return TransitionDescriptor::settled(value);
    }

    let (start, target) = interval.unwrap_or((value, value));
    let (initial, final_) = if start > target {
        (start.ceil(), target.floor())
    } else {
        (start.floor(), target.ceil())
    };

    let length = (final_ - initial).abs();
    let progress = if length > 0.0 {
        ((value - initial) / length).abs().clamp(0.0, 1.0)
    } else {
        1.0
    };

    TransitionDescriptor {
        transitioning: true,
        value,
        current_state: ControlsState::from_value(value),
        initial_state: ControlsState::from_integral(initial),
        final_state: ControlsState::from_integral(final_),
        progress,
    }
}

/// A clamped scalar with an optional running transition and gesture flag.
#[derive(Debug)]
pub struct StateAdjustment {
    value: f64,
    lower: f64,
    upper: f64,
    animator: TransitionAnimator,
    gesture_in_progress: bool,
    notify: Option<mpsc::Sender<ValueChanged>>,
}

impl StateAdjustment {
    /// An adjustment spanning every [`ControlsState`], resting at `initial`.
    pub fn new(initial: ControlsState) -> Self {
        Self::with_range(ControlsState::MIN.value(), ControlsState::MAX.value(), initial.value())
    }

    /// An adjustment over an arbitrary `[lower, upper]` range.
    ///
    /// Used for auxiliary animated scalars (search fade, thumbnail
    /// expansion).  `value` is clamped into the range.
    pub fn with_range(lower: f64, upper: f64, value: f64) -> Self {
        let (lower, upper) = if lower <= upper { (lower, upper) } else { (upper, lower) };
        let value = if value.is_nan() { lower } else { value.clamp(lower, upper) };
        Self {
            value,
            lower,
            upper,
            animator: TransitionAnimator::new(),
            gesture_in_progress: false,
            notify: None,
        }
    }

    /// Attach the change subscriber, replacing any previous one.
    pub fn connect(&mut self, tx: mpsc::Sender<ValueChanged>) {
        self.notify = Some(tx);
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn gesture_in_progress(&self) -> bool {
        self.gesture_in_progress
    }

    /// Whether an eased transition is running.
    pub fn is_transitioning(&self) -> bool {
        self.animator.is_running()
    }

    /// Target of the running transition.
    pub fn transition_target(&self) -> Option<f64> {
        self.animator.target()
    }

    /// The resolver applied to this adjustment.
    pub fn transition_params(&self) -> TransitionDescriptor {
        resolve(self.value, self.animator.interval(), self.gesture_in_progress)
    }

    /// Set the value directly, cancelling any running transition.
    ///
    /// Out-of-range values are clamped; NaN is ignored.  Returns whether the
    /// value changed.
    pub fn set_value(&mut self, value: f64) -> bool {
        self.animator.cancel();
        self.store(value)
    }

    /// Start an eased transition toward `params.target()` (clamped).
    ///
    /// Cancels any running transition (its callback never fires) and ends a
    /// live gesture.  The transition starts from the current value.
    pub fn begin_transition(&mut self, mut params: TransitionParams, now: Instant) {
        params.clamp_target(self.lower, self.upper);
        self.gesture_in_progress = false;
        let target = params.target();
        if self.animator.start(self.value, params, now) {
            debug!("transition redirected at {:.3} toward {:.3}", self.value, target);
        }
    }

    /// Cancel the running transition.  Returns whether one was running.
    pub fn remove_transition(&mut self) -> bool {
        self.animator.cancel()
    }

    /// Advance the running transition to `now`.
    ///
    /// On completion the value is set exactly to the target, the subscriber
    /// is notified and then the completion callback fires.  Returns the
    /// target when a transition completed during this call.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        match self.animator.tick(now) {
            Tick::Idle => None,
            Tick::Running { value, .. } => {
                self.store(value);
                None
            }
            Tick::Completed { value, completion } => {
                self.store(value);
                completion.fire();
                Some(value)
            }
        }
    }

    /// Hand control of the value to a live gesture.
    pub fn begin_gesture(&mut self) {
        self.animator.cancel();
        self.gesture_in_progress = true;
    }

    /// Update the value from gesture tracking.  Clamped; no snapping.
    pub fn set_gesture_value(&mut self, value: f64) -> bool {
        self.store(value)
    }

    /// Drop the gesture flag without starting a transition; the value stays
    /// where the gesture left it.  Returns whether a gesture was live.
    pub fn cancel_gesture(&mut self) -> bool {
        std::mem::replace(&mut self.gesture_in_progress, false)
    }

    /// End the live gesture and immediately start the settle transition.
    pub fn end_gesture(&mut self, params: TransitionParams, now: Instant) {
        self.gesture_in_progress = false;
        self.begin_transition(params, now);
    }

    fn store(&mut self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        let value = value.clamp(self.lower, self.upper);
        if value == self.value {
            return false;
        }
        self.value = value;
        if let Some(tx) = &self.notify {
            let _ = tx.send(ValueChanged { value });
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn to(state: ControlsState, duration: u64) -> TransitionParams {
        TransitionParams::to_state(state, ms(duration), Easing::Linear).unwrap()
    }

    proptest! {
        #[test]
        fn settled_descriptor_rounds_value(value in 0.0f64..=2.0) {
            let d = resolve(value, None, false);
            let expected = ControlsState::from_value(value);
            prop_assert!(!d.transitioning);
            prop_assert_eq!(d.current_state, expected);
            prop_assert_eq!(d.initial_state, expected);
            prop_assert_eq!(d.final_state, expected);
            prop_assert_eq!(d.progress, 1.0);
        }

        #[test]
        fn progress_stays_in_unit_range(
            value in 0.0f64..=2.0,
            start in 0.0f64..=2.0,
            target in 0.0f64..=2.0,
        ) {
            let d = resolve(value, Some((start, target)), false);
            prop_assert!(d.transitioning);
            prop_assert!((0.0..=1.0).contains(&d.progress));
        }
    }

    #[test]
    fn settled_half_rounds_up() {
        let d = resolve(1.5, None, false);
        assert_eq!(d.current_state, ControlsState::AppGrid);
        assert_eq!(d.initial_state, ControlsState::AppGrid);
    }

    #[test]
    fn upward_transition_floors_initial_and_ceils_final() {
        let d = resolve(1.25, Some((0.5, 2.0)), false);
        assert_eq!(d.initial_state, ControlsState::Hidden);
        assert_eq!(d.final_state, ControlsState::AppGrid);
        assert_eq!(d.progress, 0.625);
    }

    #[test]
    fn downward_transition_ceils_initial_and_floors_final() {
        let d = resolve(1.5, Some((1.5, 0.0)), false);
        assert_eq!(d.initial_state, ControlsState::AppGrid);
        assert_eq!(d.final_state, ControlsState::Hidden);
        assert_eq!(d.progress, 0.25);
    }

    /// Integral endpoints round to themselves in either direction, so a
    /// transition that starts exactly on a state is never attributed to a
    /// neighbouring one.
    #[test]
    fn integral_boundaries_do_not_misclassify() {
        let up = resolve(1.0, Some((1.0, 2.0)), false);
        assert_eq!((up.initial_state, up.final_state), (ControlsState::WindowPicker, ControlsState::AppGrid));
        assert_eq!(up.progress, 0.0);

        let down = resolve(1.0, Some((1.0, 0.0)), false);
        assert_eq!((down.initial_state, down.final_state), (ControlsState::WindowPicker, ControlsState::Hidden));
        assert_eq!(down.progress, 0.0);

        let arrived = resolve(0.0, Some((1.0, 0.0)), false);
        assert_eq!(arrived.progress, 1.0);
    }

    #[test]
    fn gesture_at_rest_is_still_transitioning() {
        let d = resolve(1.0, None, true);
        assert!(d.transitioning);
        assert_eq!(d.initial_state, ControlsState::WindowPicker);
        assert_eq!(d.final_state, ControlsState::WindowPicker);
        assert_eq!(d.progress, 1.0);
    }

    #[test]
    fn gesture_between_states_brackets_value() {
        let d = resolve(1.25, None, true);
        assert_eq!(d.initial_state, ControlsState::WindowPicker);
        assert_eq!(d.final_state, ControlsState::AppGrid);
        assert_eq!(d.progress, 0.25);
    }

    #[test]
    fn set_value_clamps_and_ignores_nan() {
        let mut adj = StateAdjustment::new(ControlsState::WindowPicker);
        adj.set_value(5.0);
        assert_eq!(adj.value(), 2.0);
        adj.set_value(-1.0);
        assert_eq!(adj.value(), 0.0);
        assert!(!adj.set_value(f64::NAN));
        assert_eq!(adj.value(), 0.0);
    }

    #[test]
    fn notifies_only_on_change() {
        let (tx, rx) = mpsc::channel();
        let mut adj = StateAdjustment::new(ControlsState::Hidden);
        adj.connect(tx);
        adj.set_value(1.0);
        adj.set_value(1.0);
        adj.set_value(7.0);
        let events: Vec<ValueChanged> = rx.try_iter().collect();
        assert_eq!(events, vec![ValueChanged { value: 1.0 }, ValueChanged { value: 2.0 }]);
    }

    #[test]
    fn transition_to_grid_samples_midpoint() {
        let t0 = Instant::now();
        let mut adj = StateAdjustment::new(ControlsState::Hidden);
        adj.begin_transition(to(ControlsState::AppGrid, 300), t0);
        adj.tick(t0 + ms(150));
        let d = adj.transition_params();
        assert_eq!(adj.value(), 1.0);
        assert_eq!(d.progress, 0.5);
        assert!(d.transitioning);
    }

    #[test]
    fn transition_completes_exactly_and_fires_once() {
        let t0 = Instant::now();
        let fired = Rc::new(Cell::new(0));
        let seen = Rc::new(Cell::new(-1.0));
        let mut adj = StateAdjustment::new(ControlsState::Hidden);
        let params = TransitionParams::to_state(ControlsState::AppGrid, ms(300), Easing::EaseOutQuad)
            .unwrap()
            .on_complete({
                let fired = fired.clone();
                move || fired.set(fired.get() + 1)
            });
        adj.begin_transition(params, t0);
        adj.tick(t0 + ms(100));
        seen.set(adj.value());
        assert_eq!(adj.tick(t0 + ms(300)), Some(2.0));
        assert_eq!(adj.value(), 2.0);
        assert_eq!(adj.tick(t0 + ms(310)), None);
        assert_eq!(fired.get(), 1);
        assert!(seen.get() > 0.0 && seen.get() < 2.0);
        assert!(!adj.transition_params().transitioning);
    }

    #[test]
    fn transition_target_is_clamped() {
        let t0 = Instant::now();
        let mut adj = StateAdjustment::new(ControlsState::Hidden);
        adj.begin_transition(TransitionParams::new(9.0, ms(100), Easing::Linear).unwrap(), t0);
        assert_eq!(adj.transition_target(), Some(2.0));
    }

    #[test]
    fn redirect_mid_flight_is_continuous() {
        let t0 = Instant::now();
        let mut adj = StateAdjustment::new(ControlsState::Hidden);
        adj.begin_transition(to(ControlsState::WindowPicker, 200), t0);
        adj.tick(t0 + ms(100));
        let before = adj.value();
        assert_eq!(before, 0.5);

        adj.begin_transition(to(ControlsState::AppGrid, 200), t0 + ms(100));
        assert_eq!(adj.value(), before);
        adj.tick(t0 + ms(100));
        assert_eq!(adj.value(), before);
        adj.tick(t0 + ms(200));
        assert_eq!(adj.value(), 1.25);
    }

    #[test]
    fn gesture_cancels_transition_and_vice_versa() {
        let t0 = Instant::now();
        let fired = Rc::new(Cell::new(false));
        let mut adj = StateAdjustment::new(ControlsState::Hidden);
        let params = to(ControlsState::AppGrid, 200).on_complete({
            let fired = fired.clone();
            move || fired.set(true)
        });
        adj.begin_transition(params, t0);
        adj.tick(t0 + ms(50));

        adj.begin_gesture();
        assert!(adj.gesture_in_progress());
        assert!(!adj.is_transitioning());
        adj.set_gesture_value(1.3);
        adj.tick(t0 + ms(500));
        assert_eq!(adj.value(), 1.3);
        assert!(!fired.get());

        adj.end_gesture(to(ControlsState::WindowPicker, 100), t0 + ms(500));
        assert!(!adj.gesture_in_progress());
        assert!(adj.is_transitioning());
        adj.tick(t0 + ms(600));
        assert_eq!(adj.value(), 1.0);
    }

    #[test]
    fn set_value_cancels_transition() {
        let t0 = Instant::now();
        let mut adj = StateAdjustment::new(ControlsState::Hidden);
        adj.begin_transition(to(ControlsState::AppGrid, 200), t0);
        adj.set_value(1.0);
        assert!(!adj.is_transitioning());
        assert_eq!(adj.tick(t0 + ms(300)), None);
        assert_eq!(adj.value(), 1.0);
    }

    #[test]
    fn custom_range_adjustment() {
        let mut fade = StateAdjustment::with_range(1.0, 0.0, 3.0);
        assert_eq!((fade.lower(), fade.upper()), (0.0, 1.0));
        assert_eq!(fade.value(), 1.0);
        fade.set_value(-2.0);
        assert_eq!(fade.value(), 0.0);
    }
}

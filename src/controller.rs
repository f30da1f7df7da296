//! The orchestrator that ties the state adjustment, layout cache, gesture
//! tracking and dependent views together.
//!
//! [`OverviewControls`] reacts to [`Command`]s by driving the
//! [`StateAdjustment`] and, once per frame, turns the adjustment into one
//! [`TransitionDescriptor`] and pushes boxes and float parameters to every
//! attached [`DependentView`].
//!
//! ```text
//!   Command ──► handle() ──► StateAdjustment ──(ValueChanged)──┐
//!                  │                                            │
//!                  └──► search fade / thumbnails expand         │
//!                                                               ▼
//!   frame(now): tick ─► drain ─► rebuild LayoutCache? ─► one descriptor
//!                                                               │
//!                               ┌───────────────┬───────────────┼──────────────┐
//!                               ▼               ▼               ▼              ▼
//!                          workspaces       app grid       thumbnails    search results
//! ```
//!
//! Views never see the adjustment.  Every pass pushes only the setters
//! whose value changed since the previous pass.

use crate::adjustment::{StateAdjustment, TransitionDescriptor, ValueChanged};
use crate::animator::{TransitionError, TransitionParams};
use crate::command::{Command, ShiftDirection};
use crate::config::{AnimationConfig, Config};
use crate::easing::Easing;
use crate::geometry::{lerp, GeometryBox};
use crate::gesture::{GestureController, GestureError, Release, SwipeAnchor};
use crate::layout::{ChildRequests, LayoutCache, LayoutError, LayoutMetrics, LayoutSlot};
use crate::state::ControlsState;
use crate::traits::DependentView;
use log::{debug, info};
use std::fmt;
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Possible errors from the controller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlsError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Gesture(#[from] GestureError),
}

/// The dependent views the controller knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    Workspaces,
    AppGrid,
    Thumbnails,
    SearchResults,
}

impl ViewId {
    pub const ALL: [ViewId; 4] = [
        ViewId::Workspaces,
        ViewId::AppGrid,
        ViewId::Thumbnails,
        ViewId::SearchResults,
    ];

    fn index(self) -> usize {
        match self {
            ViewId::Workspaces => 0,
            ViewId::AppGrid => 1,
            ViewId::Thumbnails => 2,
            ViewId::SearchResults => 3,
        }
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewId::Workspaces => write!(f, "workspaces"),
            ViewId::AppGrid => write!(f, "app-grid"),
            ViewId::Thumbnails => write!(f, "thumbnails"),
            ViewId::SearchResults => write!(f, "search-results"),
        }
    }
}

/// Everything pushed to one view in one layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParams {
    pub geometry: GeometryBox,
    pub opacity: f64,
    pub scale: f64,
    pub translation_y: f64,
    pub fit_mode: f64,
    pub visible: bool,
}

impl ViewParams {
    fn new(geometry: GeometryBox, opacity: f64, visible: bool) -> Self {
        Self {
            geometry,
            opacity,
            scale: 1.0,
            translation_y: 0.0,
            fit_mode: 0.0,
            visible,
        }
    }
}

/// Workspaces fit mode: one workspace (`0.0`) or all of them (`1.0`).
fn fit_mode(state: ControlsState) -> f64 {
    match state {
        ControlsState::AppGrid => 1.0,
        ControlsState::Hidden | ControlsState::WindowPicker => 0.0,
    }
}

/// Thumbnails strip `(opacity, scale, translation_y)` when settled in
/// `state`.
fn thumbnails_params(state: ControlsState, strip_height: f64) -> (f64, f64, f64) {
    match state {
        ControlsState::AppGrid => (0.0, 0.5, strip_height / 2.0),
        ControlsState::Hidden | ControlsState::WindowPicker => (1.0, 1.0, 0.0),
    }
}

struct Attached<V> {
    id: ViewId,
    view: V,
    last: Option<ViewParams>,
}

impl<V: DependentView> Attached<V> {
    /// Push the setters whose value differs from the last pass.  Returns
    /// the number of calls made.
    fn push(&mut self, next: ViewParams) -> usize {
        let prev = self.last.replace(next);
        let mut calls = 0;
        if prev.map(|p| p.geometry) != Some(next.geometry) {
            self.view.set_geometry(next.geometry);
            calls += 1;
        }
        if prev.map(|p| p.opacity) != Some(next.opacity) {
            self.view.set_opacity(next.opacity);
            calls += 1;
        }
        if prev.map(|p| p.scale) != Some(next.scale) {
            self.view.set_scale(next.scale);
            calls += 1;
        }
        if prev.map(|p| p.translation_y) != Some(next.translation_y) {
            self.view.set_translation_y(next.translation_y);
            calls += 1;
        }
        if prev.map(|p| p.fit_mode) != Some(next.fit_mode) {
            self.view.set_fit_mode(next.fit_mode);
            calls += 1;
        }
        if prev.map(|p| p.visible) != Some(next.visible) {
            self.view.set_visible(next.visible);
            calls += 1;
        }
        calls
    }
}

/// Orchestrates the overview controls.
///
/// Generic over the [`DependentView`] type so tests can attach recorders
/// and the daemon can attach boxed trait objects.
///
/// # Typical usage
///
/// ```ignore
/// let mut controls = OverviewControls::new(&Config::default());
/// controls.attach(ViewId::Workspaces, view);
/// controls.handle(Command::Resize { container, requests }, Instant::now())?;
/// controls.handle(Command::Show(ControlsState::WindowPicker), Instant::now())?;
/// loop {
///     controls.frame(Instant::now())?;
/// }
/// ```
pub struct OverviewControls<V: DependentView> {
    animation: AnimationConfig,
    adjustment: StateAdjustment,
    changes: mpsc::Receiver<ValueChanged>,
    search_fade: StateAdjustment,
    expand: StateAdjustment,
    layout: LayoutCache,
    gesture: GestureController,
    views: Vec<Attached<V>>,
    current: Option<[ViewParams; 4]>,
    container: Option<GeometryBox>,
    requests: ChildRequests,
    search_active: bool,
    thumbnails_shown: bool,
    metrics_dirty: bool,
    needs_layout: bool,
}

impl<V: DependentView> OverviewControls<V> {
    /// Create controls resting at [`ControlsState::Hidden`] with the
    /// thumbnails strip expanded and search inactive.
    ///
    /// Nothing is laid out until the first
    /// [`Resize`](Command::Resize) provides a container.
    pub fn new(config: &Config) -> Self {
        let (tx, changes) = mpsc::channel();
        let mut adjustment = StateAdjustment::new(ControlsState::Hidden);
        adjustment.connect(tx);

        Self {
            animation: config.animation.clone(),
            adjustment,
            changes,
            search_fade: StateAdjustment::with_range(0.0, 1.0, 0.0),
            expand: StateAdjustment::with_range(0.0, 1.0, 1.0),
            layout: LayoutCache::new(config.layout.clone()),
            gesture: GestureController::new(config.gestures.clone()),
            views: Vec::new(),
            current: None,
            container: None,
            requests: ChildRequests::default(),
            search_active: false,
            thumbnails_shown: true,
            metrics_dirty: false,
            needs_layout: true,
        }
    }

    /// Attach a dependent view, replacing any view already attached as `id`.
    ///
    /// The view receives every parameter on the next layout pass.
    pub fn attach(&mut self, id: ViewId, view: V) {
        self.views.retain(|a| a.id != id);
        self.views.push(Attached {
            id,
            view,
            last: None,
        });
        self.needs_layout = true;
    }

    /// Detach and return the view attached as `id`.
    pub fn detach(&mut self, id: ViewId) -> Option<V> {
        let pos = self.views.iter().position(|a| a.id == id)?;
        Some(self.views.remove(pos).view)
    }

    /// The raw state value.
    pub fn value(&self) -> f64 {
        self.adjustment.value()
    }

    /// The canonical state nearest to the current value.
    pub fn state(&self) -> ControlsState {
        ControlsState::from_value(self.adjustment.value())
    }

    pub fn transition_params(&self) -> TransitionDescriptor {
        self.adjustment.transition_params()
    }

    /// Whether the controls are on screen: anything but settled at
    /// [`ControlsState::Hidden`].
    pub fn is_shown(&self) -> bool {
        Self::shown(&self.adjustment.transition_params())
    }

    pub fn search_active(&self) -> bool {
        self.search_active
    }

    pub fn thumbnails_shown(&self) -> bool {
        self.thumbnails_shown
    }

    pub fn gesture_active(&self) -> bool {
        self.gesture.is_active()
    }

    pub fn layout(&self) -> &LayoutCache {
        &self.layout
    }

    /// Parameters computed for `id` in the last layout pass.
    pub fn view_params(&self, id: ViewId) -> Option<ViewParams> {
        self.current.map(|c| c[id.index()])
    }

    fn shown(d: &TransitionDescriptor) -> bool {
        d.transitioning || d.current_state != ControlsState::Hidden
    }

    /// Process a single [`Command`] at time `now`.
    ///
    /// Commands only mutate state; views are updated by the next
    /// [`frame`](Self::frame).
    pub fn handle(&mut self, cmd: Command, now: Instant) -> Result<(), ControlsError> {
        match cmd {
            Command::AnimateTo(state) => {
                info!("animate to {}", state);
                self.animate_to(state, now)?;
            }

            Command::Shift(dir) => {
                let d = self.adjustment.transition_params();
                let target = match dir {
                    ShiftDirection::Up => d.final_state.next(),
                    ShiftDirection::Down => d.final_state.prev(),
                };
                if target.value() == self.adjustment.value() {
                    debug!("shift {}: already at {}", dir, target);
                    return Ok(());
                }
                info!("shift {} → {}", dir, target);
                self.animate_to(target, now)?;
            }

            Command::ToggleAppGrid => {
                let d = self.adjustment.transition_params();
                if !Self::shown(&d) {
                    info!("toggle app grid: show into {}", ControlsState::AppGrid);
                    self.show(ControlsState::AppGrid, now)?;
                } else {
                    let target = if d.final_state == ControlsState::AppGrid {
                        ControlsState::WindowPicker
                    } else {
                        ControlsState::AppGrid
                    };
                    info!("toggle app grid → {}", target);
                    self.animate_to(target, now)?;
                }
            }

            Command::Show(state) => {
                info!("show {}", state);
                self.show(state, now)?;
            }

            Command::Hide => {
                info!("hide");
                self.animate_to(ControlsState::Hidden, now)?;
            }

            Command::SetSearchActive(active) => {
                if active != self.search_active {
                    info!("search {}", if active { "active" } else { "inactive" });
                    self.search_active = active;
                    self.needs_layout = true;
                    let target = if active { 1.0 } else { 0.0 };
                    ease_aux(
                        &mut self.search_fade,
                        target,
                        self.animation.search_fade(),
                        self.animation.easing,
                        now,
                    )?;
                }
            }

            Command::SetThumbnailsShown(shown) => {
                if shown != self.thumbnails_shown {
                    info!("thumbnails {}", if shown { "shown" } else { "collapsed" });
                    self.thumbnails_shown = shown;
                    self.metrics_dirty = true;
                    let target = if shown { 1.0 } else { 0.0 };
                    ease_aux(
                        &mut self.expand,
                        target,
                        self.animation.duration(),
                        self.animation.easing,
                        now,
                    )?;
                }
            }

            //  Swipe gestures

            Command::GestureBegin { base_distance } => {
                let base_distance = base_distance
                    .or_else(|| self.container.map(|c| c.height))
                    .unwrap_or(0.0);
                let value = self.adjustment.value();
                let cancel_target = self
                    .adjustment
                    .transition_target()
                    .map(ControlsState::from_value)
                    .unwrap_or_else(|| ControlsState::from_value(value));
                self.gesture.begin(
                    &mut self.adjustment,
                    SwipeAnchor {
                        base_distance,
                        snap_points: ControlsState::ALL.to_vec(),
                        current_value: value,
                        cancel_target,
                    },
                )?;
                self.needs_layout = true;
            }

            Command::GestureUpdate { delta } => {
                let value = self.gesture.progress(&mut self.adjustment, delta)?;
                debug!("gesture update {:+.1} → {:.3}", delta, value);
            }

            Command::GestureEnd { velocity } => {
                let outcome = self.gesture.end(
                    &mut self.adjustment,
                    Release::with_velocity(velocity, self.animation.gesture_easing),
                    now,
                )?;
                info!("gesture settles in {}", outcome.target);
            }

            Command::GestureCancel => {
                let outcome =
                    self.gesture
                        .cancel(&mut self.adjustment, self.animation.gesture_easing, now)?;
                info!("gesture cancelled, back to {}", outcome.target);
            }

            //  Metrics

            Command::Resize {
                container,
                requests,
            } => {
                if !container.is_valid() {
                    return Err(LayoutError::InvalidContainer(container).into());
                }
                debug!(
                    "resize {:.0}x{:.0}+{:.0}+{:.0}",
                    container.width, container.height, container.x, container.y
                );
                self.container = Some(container);
                self.requests = requests;
                self.metrics_dirty = true;
            }
        }
        Ok(())
    }

    /// Advance animations to `now` and run at most one layout pass.
    ///
    /// Returns whether a layout pass ran.
    pub fn frame(&mut self, now: Instant) -> Result<bool, ControlsError> {
        let fade = self.search_fade.value();
        self.search_fade.tick(now);
        if self.search_fade.value() != fade {
            self.needs_layout = true;
        }

        let expand = self.expand.value();
        self.expand.tick(now);
        if self.expand.value() != expand {
            self.metrics_dirty = true;
        }

        self.adjustment.tick(now);
        if self.changes.try_iter().count() > 0 {
            self.needs_layout = true;
        }

        if self.metrics_dirty {
            if let Some(container) = self.container {
                let metrics = LayoutMetrics::from_requests(
                    &container,
                    &self.requests,
                    self.expand.value(),
                    self.layout.config(),
                );
                self.layout.rebuild(container, metrics)?;
                self.metrics_dirty = false;
                debug!("layout rebuilt (expand {:.2})", metrics.expand_fraction);
                self.needs_layout = true;
            }
        }

        if !self.needs_layout || !self.layout.is_built() {
            return Ok(false);
        }
        self.needs_layout = false;
        self.layout_pass()?;
        Ok(true)
    }

    //  Transitions

    fn show(&mut self, state: ControlsState, now: Instant) -> Result<(), ControlsError> {
        self.take_over_gesture();
        if !Self::shown(&self.adjustment.transition_params()) {
            self.adjustment.set_value(ControlsState::Hidden.value());
        }
        self.animate_to(state, now)
    }

    fn animate_to(&mut self, state: ControlsState, now: Instant) -> Result<(), ControlsError> {
        self.take_over_gesture();
        let duration = self.animation.duration();
        if duration.is_zero() {
            self.adjustment.set_value(state.value());
        } else {
            let params = TransitionParams::to_state(state, duration, self.animation.easing)?;
            self.adjustment.begin_transition(params, now);
        }
        Ok(())
    }

    fn take_over_gesture(&mut self) {
        if self.gesture.reset() {
            self.adjustment.cancel_gesture();
            debug!("swipe superseded by a discrete command");
        }
    }

    //  Layout pass

    fn layout_pass(&mut self) -> Result<(), ControlsError> {
        let d = self.adjustment.transition_params();
        let params = self.derive(&d)?;

        let mut calls = 0;
        for attached in &mut self.views {
            calls += attached.push(params[attached.id.index()]);
        }
        self.current = Some(params);
        debug!(
            "layout pass {} → {} @ {:.3} ({} view calls)",
            d.initial_state, d.final_state, d.progress, calls
        );
        Ok(())
    }

    /// Parameters for every view from one descriptor.
    fn derive(&self, d: &TransitionDescriptor) -> Result<[ViewParams; 4], ControlsError> {
        let (from, to, progress) = (d.initial_state, d.final_state, d.progress);
        let shown = Self::shown(d);
        let fade = self.search_fade.value();
        let fixed = self.layout.fixed()?;

        let mut workspaces = ViewParams::new(
            self.layout.interpolate(from, to, progress)?,
            1.0 - fade,
            shown && fade < 1.0,
        );
        workspaces.fit_mode = lerp(fit_mode(from), fit_mode(to), progress);

        let app_grid = ViewParams::new(
            self.layout
                .interpolate_slot(LayoutSlot::AppGrid, from, to, progress)?,
            1.0 - fade,
            shown && fade < 1.0,
        );

        let strip = fixed.thumbnails.height;
        let (o0, s0, t0) = thumbnails_params(from, strip);
        let (o1, s1, t1) = thumbnails_params(to, strip);
        let opacity = lerp(o0, o1, progress);
        let thumbnails = ViewParams {
            geometry: fixed.thumbnails,
            opacity: if self.search_active { 0.0 } else { opacity },
            scale: lerp(s0, s1, progress),
            translation_y: lerp(t0, t1, progress),
            fit_mode: 0.0,
            visible: shown && self.thumbnails_shown && !self.search_active && opacity != 0.0,
        };

        let search_results = ViewParams::new(fixed.search_results, fade, shown && fade > 0.0);

        Ok([workspaces, app_grid, thumbnails, search_results])
    }
}

/// Move an auxiliary `[0, 1]` adjustment to `target`; a zero duration
/// jumps.
fn ease_aux(
    adjustment: &mut StateAdjustment,
    target: f64,
    duration: Duration,
    easing: Easing,
    now: Instant,
) -> Result<(), TransitionError> {
    if duration.is_zero() {
        adjustment.set_value(target);
    } else {
        adjustment.begin_transition(TransitionParams::new(target, duration, easing)?, now);
    }
    Ok(())
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::GestureConfig;
    use crate::layout::LayoutConfig;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Geometry(GeometryBox),
        Opacity(f64),
        Scale(f64),
        Visible(bool),
        Translation(f64),
        FitMode(f64),
    }

    /// Record-keeping view; clones share one log.
    #[derive(Debug, Clone, Default)]
    struct Recorder {
        calls: Rc<RefCell<Vec<Call>>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<Call> {
            self.calls.borrow_mut().drain(..).collect()
        }

        fn last_visible(&self) -> Option<bool> {
            self.calls.borrow().iter().rev().find_map(|c| match c {
                Call::Visible(v) => Some(*v),
                _ => None,
            })
        }
    }

    impl DependentView for Recorder {
        fn set_geometry(&mut self, geometry: GeometryBox) {
            self.calls.borrow_mut().push(Call::Geometry(geometry));
        }
        fn set_opacity(&mut self, opacity: f64) {
            self.calls.borrow_mut().push(Call::Opacity(opacity));
        }
        fn set_scale(&mut self, scale: f64) {
            self.calls.borrow_mut().push(Call::Scale(scale));
        }
        fn set_visible(&mut self, visible: bool) {
            self.calls.borrow_mut().push(Call::Visible(visible));
        }
        fn set_translation_y(&mut self, translation: f64) {
            self.calls.borrow_mut().push(Call::Translation(translation));
        }
        fn set_fit_mode(&mut self, fit_mode: f64) {
            self.calls.borrow_mut().push(Call::FitMode(fit_mode));
        }
    }

    fn config() -> Config {
        Config {
            animation: AnimationConfig {
                duration_ms: 300,
                easing: Easing::Linear,
                gesture_easing: Easing::Linear,
                search_fade_ms: 0,
            },
            gestures: GestureConfig {
                invert: false,
                ..GestureConfig::default()
            },
            layout: LayoutConfig {
                spacing: 10.0,
                ..LayoutConfig::default()
            },
        }
    }

    fn resize() -> Command {
        Command::Resize {
            container: GeometryBox::new(0.0, 0.0, 1000.0, 800.0),
            requests: ChildRequests {
                search_height: 40.0,
                dash_height: 100.0,
                thumbnails_height: 80.0,
            },
        }
    }

    struct Harness {
        controls: OverviewControls<Recorder>,
        views: [Recorder; 4],
        t0: Instant,
    }

    impl Harness {
        fn new() -> Self {
            let mut controls = OverviewControls::new(&config());
            let views: [Recorder; 4] = Default::default();
            for id in ViewId::ALL {
                controls.attach(id, views[id.index()].clone());
            }
            let t0 = Instant::now();
            controls.handle(resize(), t0).unwrap();
            assert!(controls.frame(t0).unwrap());
            Self { controls, views, t0 }
        }

        fn at(&self, ms: u64) -> Instant {
            self.t0 + Duration::from_millis(ms)
        }

        fn view(&self, id: ViewId) -> &Recorder {
            &self.views[id.index()]
        }

        fn params(&self, id: ViewId) -> ViewParams {
            self.controls.view_params(id).unwrap()
        }

        fn clear(&self) {
            for v in &self.views {
                v.take();
            }
        }
    }

    #[test]
    fn nothing_is_laid_out_before_resize() {
        let mut controls: OverviewControls<Recorder> = OverviewControls::new(&config());
        let view = Recorder::default();
        controls.attach(ViewId::Workspaces, view.clone());
        let now = Instant::now();
        controls.handle(Command::Show(ControlsState::WindowPicker), now).unwrap();
        assert!(!controls.frame(now).unwrap());
        assert!(view.take().is_empty());
        assert!(controls.view_params(ViewId::Workspaces).is_none());
    }

    #[test]
    fn first_pass_pushes_everything_once() {
        let h = Harness::new();
        let calls = h.view(ViewId::Workspaces).take();
        assert_eq!(calls.len(), 6);
        assert!(calls.contains(&Call::Geometry(GeometryBox::new(0.0, 0.0, 1000.0, 800.0))));
        assert!(calls.contains(&Call::Visible(false)));
        assert_eq!(h.view(ViewId::Thumbnails).take().len(), 6);
    }

    #[test]
    fn unchanged_frame_pushes_nothing() {
        let mut h = Harness::new();
        h.clear();
        assert!(!h.controls.frame(h.at(16)).unwrap());
        for v in &h.views {
            assert!(v.take().is_empty());
        }
    }

    #[test]
    fn show_animates_and_interpolates_geometry() {
        let mut h = Harness::new();
        h.controls
            .handle(Command::Show(ControlsState::WindowPicker), h.at(0))
            .unwrap();
        assert!(h.controls.frame(h.at(150)).unwrap());

        let d = h.controls.transition_params();
        assert!(d.transitioning);
        assert_eq!(d.initial_state, ControlsState::Hidden);
        assert_eq!(d.final_state, ControlsState::WindowPicker);
        assert_eq!(d.progress, 0.5);
        assert_eq!(h.controls.value(), 0.5);

        let expected = h
            .controls
            .layout()
            .interpolate(ControlsState::Hidden, ControlsState::WindowPicker, 0.5)
            .unwrap();
        assert_eq!(h.params(ViewId::Workspaces).geometry, expected);
        assert_eq!(h.view(ViewId::Workspaces).last_visible(), Some(true));

        h.controls.frame(h.at(300)).unwrap();
        assert_eq!(h.controls.value(), 1.0);
        assert!(!h.controls.transition_params().transitioning);
        assert_eq!(
            h.params(ViewId::Workspaces).geometry,
            h.controls.layout().get(ControlsState::WindowPicker).unwrap()
        );
    }

    #[test]
    fn only_changed_setters_are_called() {
        let mut h = Harness::new();
        h.controls
            .handle(Command::AnimateTo(ControlsState::WindowPicker), h.at(0))
            .unwrap();
        h.controls.frame(h.at(300)).unwrap();
        h.clear();

        h.controls.handle(Command::SetSearchActive(true), h.at(400)).unwrap();
        assert!(h.controls.frame(h.at(400)).unwrap());
        assert_eq!(
            h.view(ViewId::Workspaces).take(),
            vec![Call::Opacity(0.0), Call::Visible(false)]
        );
        assert_eq!(
            h.view(ViewId::SearchResults).take(),
            vec![Call::Opacity(1.0), Call::Visible(true)]
        );
        assert_eq!(
            h.view(ViewId::Thumbnails).take(),
            vec![Call::Opacity(0.0), Call::Visible(false)]
        );
    }

    #[test]
    fn settling_hidden_hides_everything() {
        let mut h = Harness::new();
        h.controls
            .handle(Command::Show(ControlsState::AppGrid), h.at(0))
            .unwrap();
        h.controls.frame(h.at(300)).unwrap();
        assert!(h.controls.is_shown());
        assert_eq!(h.view(ViewId::AppGrid).last_visible(), Some(true));

        h.controls.handle(Command::Hide, h.at(300)).unwrap();
        h.controls.frame(h.at(450)).unwrap();
        assert!(h.controls.is_shown());
        h.controls.frame(h.at(600)).unwrap();
        assert!(!h.controls.is_shown());
        for id in ViewId::ALL {
            assert!(!h.params(id).visible, "{} still visible", id);
        }
        assert_eq!(h.view(ViewId::AppGrid).last_visible(), Some(false));
    }

    #[test]
    fn thumbnails_fade_toward_app_grid() {
        let mut h = Harness::new();
        h.controls
            .handle(Command::Show(ControlsState::WindowPicker), h.at(0))
            .unwrap();
        h.controls.frame(h.at(300)).unwrap();
        let p = h.params(ViewId::Thumbnails);
        assert_eq!((p.opacity, p.scale, p.translation_y), (1.0, 1.0, 0.0));
        assert!(p.visible);

        h.controls.handle(Command::AnimateTo(ControlsState::AppGrid), h.at(300)).unwrap();
        h.controls.frame(h.at(450)).unwrap();
        let p = h.params(ViewId::Thumbnails);
        assert_eq!(p.opacity, 0.5);
        assert_eq!(p.scale, 0.75);
        assert_eq!(p.translation_y, 20.0);
        assert_eq!(h.params(ViewId::Workspaces).fit_mode, 0.5);

        h.controls.frame(h.at(600)).unwrap();
        let p = h.params(ViewId::Thumbnails);
        assert_eq!((p.opacity, p.scale, p.translation_y), (0.0, 0.5, 40.0));
        assert!(!p.visible);
        assert_eq!(h.params(ViewId::Workspaces).fit_mode, 1.0);
    }

    #[test]
    fn collapsing_thumbnails_rebuilds_layout() {
        let mut h = Harness::new();
        assert_eq!(
            h.controls.layout().get(ControlsState::WindowPicker).unwrap().y,
            40.0 + 10.0 + 80.0 + 10.0
        );
        h.controls.handle(Command::SetThumbnailsShown(false), h.at(0)).unwrap();
        h.controls.frame(h.at(150)).unwrap();
        let mid = h.controls.layout().metrics().unwrap();
        assert_eq!(mid.expand_fraction, 0.5);
        assert_eq!(mid.thumbnails_height, 40.0);

        h.controls.frame(h.at(300)).unwrap();
        assert_eq!(h.controls.layout().get(ControlsState::WindowPicker).unwrap().y, 50.0);
        assert!(!h.params(ViewId::Thumbnails).visible);
    }

    #[test]
    fn shift_moves_one_state_and_stops_at_the_ends() {
        let mut h = Harness::new();
        h.controls.handle(Command::Shift(ShiftDirection::Up), h.at(0)).unwrap();
        assert_eq!(h.controls.transition_params().final_state, ControlsState::WindowPicker);
        h.controls.frame(h.at(300)).unwrap();

        h.controls.handle(Command::Shift(ShiftDirection::Up), h.at(300)).unwrap();
        h.controls.frame(h.at(600)).unwrap();
        assert_eq!(h.controls.state(), ControlsState::AppGrid);

        h.controls.handle(Command::Shift(ShiftDirection::Up), h.at(600)).unwrap();
        assert!(!h.controls.transition_params().transitioning);
        assert_eq!(h.controls.value(), 2.0);

        h.controls.handle(Command::Shift(ShiftDirection::Down), h.at(600)).unwrap();
        assert_eq!(h.controls.transition_params().final_state, ControlsState::WindowPicker);
    }

    #[test]
    fn shift_counts_from_the_final_state() {
        let mut h = Harness::new();
        h.controls.handle(Command::Show(ControlsState::WindowPicker), h.at(0)).unwrap();
        h.controls.frame(h.at(100)).unwrap();
        h.controls.handle(Command::Shift(ShiftDirection::Up), h.at(100)).unwrap();
        let d = h.controls.transition_params();
        assert_eq!(d.final_state, ControlsState::AppGrid);
        assert!(h.controls.value() > 0.0 && h.controls.value() < 1.0);
    }

    #[test]
    fn shift_reverses_a_transition_before_the_midpoint() {
        let mut h = Harness::new();
        h.controls.handle(Command::Show(ControlsState::WindowPicker), h.at(0)).unwrap();
        h.controls.frame(h.at(90)).unwrap();
        assert!((h.controls.value() - 0.3).abs() < 1e-9);
        h.controls.handle(Command::Shift(ShiftDirection::Down), h.at(90)).unwrap();
        assert_eq!(h.controls.transition_params().final_state, ControlsState::Hidden);

        let mut h = Harness::new();
        h.controls.handle(Command::AnimateTo(ControlsState::AppGrid), h.at(0)).unwrap();
        h.controls.frame(h.at(600)).unwrap();
        assert_eq!(h.controls.value(), 2.0);
        h.controls.handle(Command::AnimateTo(ControlsState::WindowPicker), h.at(600)).unwrap();
        h.controls.frame(h.at(690)).unwrap();
        assert!((h.controls.value() - 1.7).abs() < 1e-9);
        h.controls.handle(Command::Shift(ShiftDirection::Up), h.at(690)).unwrap();
        assert_eq!(h.controls.transition_params().final_state, ControlsState::AppGrid);
    }

    #[test]
    fn show_while_shown_keeps_the_value() {
        let mut h = Harness::new();
        h.controls.handle(Command::Show(ControlsState::AppGrid), h.at(0)).unwrap();
        h.controls.frame(h.at(300)).unwrap();
        assert_eq!(h.controls.value(), 2.0);

        h.controls.handle(Command::Show(ControlsState::AppGrid), h.at(300)).unwrap();
        assert_eq!(h.controls.value(), 2.0);

        h.controls.handle(Command::Show(ControlsState::WindowPicker), h.at(300)).unwrap();
        assert_eq!(h.controls.value(), 2.0);
        h.controls.frame(h.at(450)).unwrap();
        assert!((h.controls.value() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn failed_rebuild_is_retried_next_frame() {
        let mut cfg = config();
        cfg.layout.spacing = -10.0;
        let mut controls: OverviewControls<Recorder> = OverviewControls::new(&cfg);
        let now = Instant::now();
        controls.handle(resize(), now).unwrap();
        for _ in 0..2 {
            assert!(matches!(
                controls.frame(now),
                Err(ControlsError::Layout(LayoutError::InvalidMetrics(_)))
            ));
        }
        assert!(!controls.layout().is_built());
    }

    #[test]
    fn toggle_app_grid() {
        let mut h = Harness::new();
        h.controls.handle(Command::ToggleAppGrid, h.at(0)).unwrap();
        assert_eq!(h.controls.transition_params().final_state, ControlsState::AppGrid);
        h.controls.frame(h.at(300)).unwrap();
        assert_eq!(h.controls.value(), 2.0);

        h.controls.handle(Command::ToggleAppGrid, h.at(300)).unwrap();
        h.controls.frame(h.at(600)).unwrap();
        assert_eq!(h.controls.value(), 1.0);

        h.controls.handle(Command::ToggleAppGrid, h.at(600)).unwrap();
        assert_eq!(h.controls.transition_params().final_state, ControlsState::AppGrid);
    }

    #[test]
    fn zero_duration_jumps() {
        let mut cfg = config();
        cfg.animation.duration_ms = 0;
        let mut controls: OverviewControls<Recorder> = OverviewControls::new(&cfg);
        let now = Instant::now();
        controls.handle(resize(), now).unwrap();
        controls.handle(Command::AnimateTo(ControlsState::AppGrid), now).unwrap();
        assert_eq!(controls.value(), 2.0);
        assert!(controls.frame(now).unwrap());
        assert_eq!(
            controls.view_params(ViewId::Workspaces).unwrap().geometry,
            controls.layout().get(ControlsState::AppGrid).unwrap()
        );
    }

    #[test]
    fn swipe_settles_on_flick_direction() {
        let mut h = Harness::new();
        h.controls.handle(Command::Show(ControlsState::WindowPicker), h.at(0)).unwrap();
        h.controls.frame(h.at(300)).unwrap();

        h.controls
            .handle(Command::GestureBegin { base_distance: Some(1000.0) }, h.at(300))
            .unwrap();
        assert!(h.controls.gesture_active());
        h.controls.handle(Command::GestureUpdate { delta: 200.0 }, h.at(310)).unwrap();
        assert!(h.controls.frame(h.at(316)).unwrap());
        assert_eq!(h.controls.value(), 1.2);
        assert!(h.controls.transition_params().transitioning);

        h.controls.handle(Command::GestureEnd { velocity: 2000.0 }, h.at(320)).unwrap();
        assert!(!h.controls.gesture_active());
        h.controls.frame(h.at(2000)).unwrap();
        assert_eq!(h.controls.value(), 2.0);
        assert!(!h.controls.transition_params().transitioning);
    }

    #[test]
    fn swipe_uses_container_height_by_default() {
        let mut h = Harness::new();
        h.controls.handle(Command::GestureBegin { base_distance: None }, h.at(0)).unwrap();
        h.controls.handle(Command::GestureUpdate { delta: 400.0 }, h.at(10)).unwrap();
        assert_eq!(h.controls.value(), 0.5);
    }

    #[test]
    fn gesture_begin_mid_transition_cancels_to_its_target() {
        let mut h = Harness::new();
        h.controls.handle(Command::Show(ControlsState::WindowPicker), h.at(0)).unwrap();
        h.controls.frame(h.at(150)).unwrap();
        h.controls
            .handle(Command::GestureBegin { base_distance: Some(1000.0) }, h.at(150))
            .unwrap();
        h.controls.handle(Command::GestureUpdate { delta: -100.0 }, h.at(160)).unwrap();
        h.controls.handle(Command::GestureCancel, h.at(170)).unwrap();
        h.controls.frame(h.at(2000)).unwrap();
        assert_eq!(h.controls.value(), 1.0);
    }

    #[test]
    fn gesture_commands_require_begin() {
        let mut h = Harness::new();
        assert_eq!(
            h.controls.handle(Command::GestureUpdate { delta: 1.0 }, h.at(0)),
            Err(ControlsError::Gesture(GestureError::NotActive))
        );
        assert_eq!(
            h.controls.handle(Command::GestureEnd { velocity: 0.0 }, h.at(0)),
            Err(ControlsError::Gesture(GestureError::NotActive))
        );
    }

    #[test]
    fn discrete_command_takes_over_a_swipe() {
        let mut h = Harness::new();
        h.controls
            .handle(Command::GestureBegin { base_distance: Some(1000.0) }, h.at(0))
            .unwrap();
        h.controls.handle(Command::GestureUpdate { delta: 300.0 }, h.at(10)).unwrap();
        h.controls.handle(Command::AnimateTo(ControlsState::AppGrid), h.at(20)).unwrap();
        assert!(!h.controls.gesture_active());
        h.controls.frame(h.at(320)).unwrap();
        assert_eq!(h.controls.value(), 2.0);
        assert!(!h.controls.transition_params().transitioning);
    }

    #[test]
    fn invalid_resize_is_rejected() {
        let mut h = Harness::new();
        let bad = GeometryBox::new(0.0, 0.0, f64::NAN, 10.0);
        let err = h
            .controls
            .handle(
                Command::Resize {
                    container: bad,
                    requests: ChildRequests::default(),
                },
                h.at(0),
            )
            .unwrap_err();
        assert!(matches!(err, ControlsError::Layout(LayoutError::InvalidContainer(_))));
        assert_eq!(
            h.controls.layout().container(),
            Some(GeometryBox::new(0.0, 0.0, 1000.0, 800.0))
        );
    }

    #[test]
    fn resize_rebuilds_before_next_pass() {
        let mut h = Harness::new();
        h.clear();
        h.controls
            .handle(
                Command::Resize {
                    container: GeometryBox::new(0.0, 0.0, 1000.0, 600.0),
                    requests: ChildRequests {
                        search_height: 40.0,
                        dash_height: 100.0,
                        thumbnails_height: 80.0,
                    },
                },
                h.at(0),
            )
            .unwrap();
        assert!(h.controls.frame(h.at(16)).unwrap());
        assert_eq!(
            h.view(ViewId::Workspaces).take(),
            vec![Call::Geometry(GeometryBox::new(0.0, 0.0, 1000.0, 600.0))]
        );
    }

    #[test]
    fn reattached_view_gets_full_state() {
        let mut h = Harness::new();
        let fresh = Recorder::default();
        let old = h.controls.detach(ViewId::AppGrid);
        assert!(old.is_some());
        h.controls.attach(ViewId::AppGrid, fresh.clone());
        assert!(h.controls.frame(h.at(16)).unwrap());
        assert_eq!(fresh.take().len(), 6);
    }
}

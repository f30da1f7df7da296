//! Per-state geometry for the overview's children.
//!
//! [`LayoutCache::rebuild`] computes, for every [`ControlsState`], the box
//! each state-dependent child occupies when the controls are fully settled
//! in that state, plus the boxes of the children whose geometry does not
//! depend on the state at all.  Boxes are pure functions of the container
//! box and the [`LayoutMetrics`]; they never depend on the current
//! transition.
//!
//! ```text
//! ┌──────────────── container ────────────────┐
//! │ search entry                               │  search_height
//! │ ─ spacing ─                                │
//! │ thumbnails strip                           │  thumbnails_height
//! │ ─ spacing × expand_fraction ─              │
//! │ workspaces (window picker)                 │
//! │ ─ spacing ─                                │
//! │ dash                                       │  dash_height
//! └────────────────────────────────────────────┘
//! ```
//!
//! During a transition the controller interpolates two cached boxes with the
//! descriptor's progress; nothing is recomputed until the metrics change.

use crate::geometry::GeometryBox;
use crate::state::ControlsState;
use serde::{Deserialize, Serialize};

/// Layout errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// A box was queried before the first [`LayoutCache::rebuild`].
    #[error("layout cache queried before rebuild")]
    NotBuilt,
    #[error("invalid container box: {0:?}")]
    InvalidContainer(GeometryBox),
    #[error("invalid layout metrics: {0:?}")]
    InvalidMetrics(LayoutMetrics),
}

/// Ratios and spacing that shape the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Gap between stacked children, in pixels.  Default: `12.0`.
    pub spacing: f64,
    /// Height of the workspaces strip in the app grid, as a fraction of the
    /// container height.  Default: `0.15`.
    pub small_workspace_ratio: f64,
    /// Upper bound on the dash height, as a fraction of the container
    /// height.  Default: `0.15`.
    pub dash_max_height_ratio: f64,
    /// Upper bound on the thumbnails strip height, as a fraction of the
    /// container height.  Default: `0.1`.
    pub max_thumbnail_scale: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            spacing: 12.0,
            small_workspace_ratio: 0.15,
            dash_max_height_ratio: 0.15,
            max_thumbnail_scale: 0.1,
        }
    }
}

/// Preferred heights reported by the fixed children.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChildRequests {
    pub search_height: f64,
    pub dash_height: f64,
    pub thumbnails_height: f64,
}

/// Effective fixed-component heights the per-state formulas use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub search_height: f64,
    pub dash_height: f64,
    pub thumbnails_height: f64,
    pub spacing: f64,
    /// How far the thumbnails strip is expanded, `0.0` to `1.0`.
    pub expand_fraction: f64,
}

impl LayoutMetrics {
    /// Derive effective metrics from the children's preferred heights.
    ///
    /// The dash is capped at `dash_max_height_ratio` of the container
    /// height; the thumbnails strip is scaled by `expand_fraction` and capped
    /// at `max_thumbnail_scale` of the container height.
    pub fn from_requests(
        container: &GeometryBox,
        requests: &ChildRequests,
        expand_fraction: f64,
        config: &LayoutConfig,
    ) -> Self {
        let height = container.height;
        let expand_fraction = expand_fraction.clamp(0.0, 1.0);
        let max_dash = (height * config.dash_max_height_ratio).round();
        let thumbnails = (requests.thumbnails_height * expand_fraction)
            .min(height * config.max_thumbnail_scale);
        Self {
            search_height: requests.search_height.max(0.0),
            dash_height: requests.dash_height.min(max_dash).max(0.0),
            thumbnails_height: thumbnails.max(0.0),
            spacing: config.spacing,
            expand_fraction,
        }
    }

    fn is_valid(&self) -> bool {
        [
            self.search_height,
            self.dash_height,
            self.thumbnails_height,
            self.spacing,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
            && (0.0..=1.0).contains(&self.expand_fraction)
    }
}

/// A child whose box depends on the controls state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutSlot {
    /// The workspaces display.
    Workspaces,
    /// The application grid.
    AppGrid,
}

/// Boxes of the children that do not move with the controls state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedBoxes {
    pub search_entry: GeometryBox,
    pub dash: GeometryBox,
    pub thumbnails: GeometryBox,
    pub search_results: GeometryBox,
}

#[derive(Debug, Clone, Copy)]
struct StateBoxes {
    workspaces: GeometryBox,
    app_grid: GeometryBox,
}

#[derive(Debug, Clone)]
struct Built {
    container: GeometryBox,
    metrics: LayoutMetrics,
    states: [StateBoxes; 3],
    fixed: FixedBoxes,
}

/// Cache of settled-state boxes, rebuilt as a whole on every metric change.
#[derive(Debug, Clone)]
pub struct LayoutCache {
    config: LayoutConfig,
    built: Option<Built>,
}

impl LayoutCache {
    /// An empty cache.  Every query fails until [`rebuild`](Self::rebuild).
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            built: None,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// Drop every cached box.
    pub fn invalidate(&mut self) {
        self.built = None;
    }

    /// Container box of the last rebuild.
    pub fn container(&self) -> Option<GeometryBox> {
        self.built.as_ref().map(|b| b.container)
    }

    /// Metrics of the last rebuild.
    pub fn metrics(&self) -> Option<LayoutMetrics> {
        self.built.as_ref().map(|b| b.metrics)
    }

    /// Recompute every state's boxes for `container` and `metrics`.
    ///
    /// All entries are computed before any is stored, so a failed rebuild
    /// leaves the previous cache untouched.
    pub fn rebuild(
        &mut self,
        container: GeometryBox,
        metrics: LayoutMetrics,
    ) -> Result<(), LayoutError> {
        if !container.is_valid() {
            return Err(LayoutError::InvalidContainer(container));
        }
        if !metrics.is_valid() {
            return Err(LayoutError::InvalidMetrics(metrics));
        }

        let grid_workspaces = self.workspaces_box(ControlsState::AppGrid, &container, &metrics);
        let states = ControlsState::ALL.map(|state| StateBoxes {
            workspaces: self.workspaces_box(state, &container, &metrics),
            app_grid: Self::app_grid_box(state, &container, &metrics, &grid_workspaces),
        });
        let fixed = Self::fixed_boxes(&container, &metrics);

        self.built = Some(Built {
            container,
            metrics,
            states,
            fixed,
        });
        Ok(())
    }

    /// The workspaces box for `state`.
    pub fn get(&self, state: ControlsState) -> Result<GeometryBox, LayoutError> {
        self.slot_box(LayoutSlot::Workspaces, state)
    }

    /// The box of `slot` for `state`.
    pub fn slot_box(&self, slot: LayoutSlot, state: ControlsState) -> Result<GeometryBox, LayoutError> {
        let built = self.built.as_ref().ok_or(LayoutError::NotBuilt)?;
        let boxes = &built.states[state.index()];
        Ok(match slot {
            LayoutSlot::Workspaces => boxes.workspaces,
            LayoutSlot::AppGrid => boxes.app_grid,
        })
    }

    /// Interpolate the workspaces box between two states.
    pub fn interpolate(
        &self,
        a: ControlsState,
        b: ControlsState,
        progress: f64,
    ) -> Result<GeometryBox, LayoutError> {
        self.interpolate_slot(LayoutSlot::Workspaces, a, b, progress)
    }

    /// Interpolate `slot` between two states.
    ///
    /// When `a == b` the cached box is returned unchanged whatever
    /// `progress` is.  Otherwise `progress` is clamped to `[0, 1]`.
    pub fn interpolate_slot(
        &self,
        slot: LayoutSlot,
        a: ControlsState,
        b: ControlsState,
        progress: f64,
    ) -> Result<GeometryBox, LayoutError> {
        let from = self.slot_box(slot, a)?;
        if a == b {
            return Ok(from);
        }
        let to = self.slot_box(slot, b)?;
        let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        Ok(from.interpolate(&to, progress))
    }

    /// Boxes of the state-independent children.
    pub fn fixed(&self) -> Result<FixedBoxes, LayoutError> {
        self.built
            .as_ref()
            .map(|b| b.fixed)
            .ok_or(LayoutError::NotBuilt)
    }

    //  Formulas

    fn workspaces_box(
        &self,
        state: ControlsState,
        container: &GeometryBox,
        m: &LayoutMetrics,
    ) -> GeometryBox {
        let GeometryBox { x, y, width, height } = *container;
        match state {
            ControlsState::Hidden => *container,
            ControlsState::WindowPicker => {
                let top = m.search_height + m.spacing + m.thumbnails_height + m.spacing * m.expand_fraction;
                GeometryBox::new(
                    x,
                    y + top,
                    width,
                    (height - m.dash_height - m.spacing - top).max(0.0),
                )
            }
            ControlsState::AppGrid => GeometryBox::new(
                x,
                y + m.search_height + m.spacing,
                width,
                (height * self.config.small_workspace_ratio).round(),
            ),
        }
    }

    fn app_grid_box(
        state: ControlsState,
        container: &GeometryBox,
        m: &LayoutMetrics,
        grid_workspaces: &GeometryBox,
    ) -> GeometryBox {
        let GeometryBox { x, y, width, height } = *container;
        let top = match state {
            // Parked just below the container, sliding up into view.
            ControlsState::Hidden | ControlsState::WindowPicker => container.y2(),
            ControlsState::AppGrid => y + m.search_height + m.spacing + grid_workspaces.height,
        };
        let h = height
            - m.search_height
            - m.spacing
            - grid_workspaces.height
            - m.spacing
            - m.dash_height;
        GeometryBox::new(x, top, width, h.max(0.0))
    }

    fn fixed_boxes(container: &GeometryBox, m: &LayoutMetrics) -> FixedBoxes {
        let GeometryBox { x, y, width, height } = *container;
        let below_search = y + m.search_height + m.spacing;
        let available = height - m.search_height - m.spacing - m.dash_height - m.spacing;
        FixedBoxes {
            search_entry: GeometryBox::new(x, y, width, m.search_height),
            dash: GeometryBox::new(x, y + height - m.dash_height, width, m.dash_height),
            thumbnails: GeometryBox::new(x, below_search, width, m.thumbnails_height),
            search_results: GeometryBox::new(x, below_search, width, available.max(0.0)),
        }
    }
}

//! Commands understood by the overview controls.
//!
//! [`Command`] is the whole vocabulary of the input and metrics boundaries:
//! discrete keybinding actions, the four gesture phases and resize
//! notifications.  It is serde-deserialisable so the IPC listener can accept
//! it as newline-delimited JSON:
//!
//! ```text
//! "ToggleAppGrid"
//! {"AnimateTo":"app-grid"}
//! {"Shift":"down"}
//! {"GestureUpdate":{"delta":-42.5}}
//! {"Resize":{"container":{"x":0,"y":0,"width":1920,"height":1080},
//!            "requests":{"search_height":40,"dash_height":96,"thumbnails_height":120}}}
//! ```

use crate::geometry::GeometryBox;
use crate::layout::ChildRequests;
use crate::state::ControlsState;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Direction for a one-step shift through the canonical states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ShiftDirection {
    /// Toward `AppGrid`.
    Up,
    /// Toward `Hidden`.
    Down,
}

impl fmt::Display for ShiftDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftDirection::Up => write!(f, "up"),
            ShiftDirection::Down => write!(f, "down"),
        }
    }
}

/// Parse a shift direction (case-insensitive; "up"/"next", "down"/"prev").
fn parse_shift(s: &str) -> Option<ShiftDirection> {
    match s.trim().to_lowercase().as_str() {
        "up" | "next" | "+" => Some(ShiftDirection::Up),
        "down" | "prev" | "previous" | "-" => Some(ShiftDirection::Down),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for ShiftDirection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_shift(&s).ok_or_else(|| DeError::custom(format!("invalid shift direction: {:?}", s)))
    }
}

/// Every action the overview controls can perform.
///
/// Produced by [`CommandSource`](crate::traits::CommandSource)
/// implementations and consumed by
/// [`OverviewControls::handle`](crate::controller::OverviewControls::handle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Animate to a canonical state with the configured duration.
    AnimateTo(ControlsState),

    /// Move one state from where the controls are heading.
    Shift(ShiftDirection),

    /// Flip between window picker and app grid; from hidden, open the grid.
    ToggleAppGrid,

    /// Make the controls visible and animate in from hidden.
    Show(ControlsState),

    /// Animate to hidden; the controls become invisible once settled.
    Hide,

    /// Fade the search results in (`true`) or out.
    SetSearchActive(bool),

    /// Expand (`true`) or collapse the workspace thumbnails strip.
    SetThumbnailsShown(bool),

    //  Swipe gestures

    /// Fingers down.  The swipe distance for one state step is the
    /// container height unless `base_distance` is given.
    GestureBegin {
        #[serde(default)]
        base_distance: Option<f64>,
    },

    /// Incremental raw movement in pixels.
    GestureUpdate { delta: f64 },

    /// Fingers lifted with the given velocity (pixels per second).
    GestureEnd {
        #[serde(default)]
        velocity: f64,
    },

    /// Swipe abandoned; settle back where it started.
    GestureCancel,

    //  Metrics

    /// The container box or a child's preferred height changed.
    Resize {
        container: GeometryBox,
        requests: ChildRequests,
    },
}

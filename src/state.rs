//! The canonical states the overview controls can settle in.
//!
//! States are ordered: [`Hidden`](ControlsState::Hidden) <
//! [`WindowPicker`](ControlsState::WindowPicker) <
//! [`AppGrid`](ControlsState::AppGrid).  Their ordinal doubles as the value
//! the [`StateAdjustment`](crate::adjustment::StateAdjustment) rests at when
//! fully settled, so interpolation between states is plain scalar math.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One of the fully-settled overview modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ControlsState {
    /// Overview closed, desktop visible.
    Hidden,
    /// Workspace windows spread out for picking.
    WindowPicker,
    /// Application grid, workspaces shrunk to a strip.
    AppGrid,
}

impl ControlsState {
    /// Every state, lowest ordinal first.
    pub const ALL: [ControlsState; 3] = [
        ControlsState::Hidden,
        ControlsState::WindowPicker,
        ControlsState::AppGrid,
    ];

    /// Lowest state.
    pub const MIN: ControlsState = ControlsState::Hidden;

    /// Highest state.
    pub const MAX: ControlsState = ControlsState::AppGrid;

    /// Ordinal position (`0`, `1`, `2`).
    pub fn index(self) -> usize {
        match self {
            ControlsState::Hidden => 0,
            ControlsState::WindowPicker => 1,
            ControlsState::AppGrid => 2,
        }
    }

    /// The scalar value this state rests at.
    pub fn value(self) -> f64 {
        self.index() as f64
    }

    /// State for an ordinal, or `None` if out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Round `value` to the nearest state.
    ///
    /// Exact halves round up (`0.5` → `WindowPicker`).  Out-of-range and
    /// non-finite values clamp to the ends of the range (NaN maps to
    /// [`MIN`](Self::MIN)).
    pub fn from_value(value: f64) -> Self {
        Self::from_integral(value.round())
    }

    /// Map an already-integral scalar (the result of `floor`/`ceil`/`round`)
    /// to its state, clamping to range.
    pub(crate) fn from_integral(value: f64) -> Self {
        if value.is_nan() || value <= 0.0 {
            return Self::MIN;
        }
        let max = Self::MAX.index();
        Self::from_index((value as usize).min(max)).unwrap_or(Self::MAX)
    }

    /// The adjacent state one step up, clamped at [`MAX`](Self::MAX).
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1).unwrap_or(Self::MAX)
    }

    /// The adjacent state one step down, clamped at [`MIN`](Self::MIN).
    pub fn prev(self) -> Self {
        self.index()
            .checked_sub(1)
            .and_then(Self::from_index)
            .unwrap_or(Self::MIN)
    }
}

impl fmt::Display for ControlsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlsState::Hidden => write!(f, "hidden"),
            ControlsState::WindowPicker => write!(f, "window-picker"),
            ControlsState::AppGrid => write!(f, "app-grid"),
        }
    }
}

/// Parse a state name (case-insensitive; `-`, `_` and spaces ignored).
fn parse_state(s: &str) -> Option<ControlsState> {
    let normalized: String = s
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect();
    match normalized.as_str() {
        "hidden" | "0" => Some(ControlsState::Hidden),
        "windowpicker" | "picker" | "1" => Some(ControlsState::WindowPicker),
        "appgrid" | "grid" | "2" => Some(ControlsState::AppGrid),
        _ => None,
    }
}

impl Serialize for ControlsState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ControlsState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = ControlsState;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "state name (\"hidden\", \"window-picker\", \"app-grid\") or ordinal")
            }
            fn visit_u64<E>(self, n: u64) -> Result<ControlsState, E>
            where
                E: DeError,
            {
                usize::try_from(n)
                    .ok()
                    .and_then(ControlsState::from_index)
                    .ok_or_else(|| DeError::custom(format!("state ordinal out of range: {}", n)))
            }
            fn visit_str<E>(self, s: &str) -> Result<ControlsState, E>
            where
                E: DeError,
            {
                parse_state(s).ok_or_else(|| DeError::custom(format!("invalid state: {:?}", s)))
            }
        }
        deserializer.deserialize_any(V)
    }
}

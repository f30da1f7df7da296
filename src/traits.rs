//! Traits that decouple the overview controls from any renderer or
//! transport.
//!
//! The [`OverviewControls`](crate::controller::OverviewControls) pushes
//! geometry and float parameters into [`DependentView`]s and reads commands
//! from [`CommandSource`]s; it depends on nothing else.

use crate::command::Command;
use crate::geometry::GeometryBox;
use std::sync::mpsc;

//  Dependent views

/// A rendering component positioned and faded by the controls.
///
/// A view is handed a box and float parameters and renders within them.  It
/// never reads or mutates the controls' state; anything it needs is computed
/// by the controller and pushed.
///
/// Each setter is called at most once per layout pass, and only when the
/// value differs from the one pushed in the previous pass.
pub trait DependentView {
    fn set_geometry(&mut self, geometry: GeometryBox);
    fn set_opacity(&mut self, opacity: f64);
    fn set_scale(&mut self, scale: f64);
    fn set_visible(&mut self, visible: bool);

    /// Vertical offset applied after layout.  Only the thumbnails strip
    /// uses it.
    fn set_translation_y(&mut self, _translation: f64) {}

    /// Blend between showing a single workspace (`0.0`) and all of them
    /// (`1.0`).  Only the workspaces view uses it.
    fn set_fit_mode(&mut self, _fit_mode: f64) {}
}

impl<V: DependentView + ?Sized> DependentView for Box<V> {
    fn set_geometry(&mut self, geometry: GeometryBox) {
        (**self).set_geometry(geometry)
    }
    fn set_opacity(&mut self, opacity: f64) {
        (**self).set_opacity(opacity)
    }
    fn set_scale(&mut self, scale: f64) {
        (**self).set_scale(scale)
    }
    fn set_visible(&mut self, visible: bool) {
        (**self).set_visible(visible)
    }
    fn set_translation_y(&mut self, translation: f64) {
        (**self).set_translation_y(translation)
    }
    fn set_fit_mode(&mut self, fit_mode: f64) {
        (**self).set_fit_mode(fit_mode)
    }
}

//  Command Source

/// A source of [`Command`]s.
///
/// Implementations listen on some transport (a Unix socket, an input
/// dispatcher, an in-memory channel) and forward parsed commands into the
/// provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received command must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Command`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error>;
}

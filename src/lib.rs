//! **ovctl**: a continuous-state overview controller.
//!
//! The overview has three canonical states: hidden, window picker and app
//! grid.  Instead of switching between them discretely, a single scalar
//! moves continuously between their ordinals and everything on screen is
//! interpolated from it.  Discrete commands ease the scalar; swipes drag it
//! and snap it on release.
//!
//! # Architecture
//!
//! * [`adjustment::StateAdjustment`]: the clamped scalar, its running
//!   transition and its gesture flag; [`adjustment::resolve`] turns it into
//!   the `(initial, final, progress)` descriptor.
//! * [`animator::TransitionAnimator`]: the eased transition state machine.
//! * [`gesture::GestureController`]: swipe tracking and snap selection.
//! * [`layout::LayoutCache`]: settled-state boxes and their interpolation.
//! * [`controller::OverviewControls`]: the orchestrator; the only code that
//!   talks to [`traits::DependentView`]s.
//!
//! Commands reach the controller through [`traits::CommandSource`]s such as
//! the Unix-socket listener in [`ipc`].

pub mod adjustment;
pub mod animator;
pub mod command;
pub mod config;
pub mod controller;
pub mod easing;
pub mod geometry;
pub mod gesture;
pub mod ipc;
pub mod layout;
pub mod state;
pub mod traits;

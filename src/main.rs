//! Entry point for the **ovctl** daemon.
//!
//! Spawns the Unix-socket [`CommandSource`](ovctl::traits::CommandSource) on
//! a background thread and runs the frame loop on the main thread: drain
//! commands, advance animations, push to views, sleep until the next frame.
//!
//! Rendering is left to whatever consumes the views; the daemon attaches
//! views that log every update, which is enough to drive and inspect the
//! controller from scripts (`RUST_LOG=debug`).

use log::{debug, error, info, warn};
use ovctl::command::Command;
use ovctl::config::Config;
use ovctl::controller::{ControlsError, OverviewControls, ViewId};
use ovctl::geometry::GeometryBox;
use ovctl::gesture::GestureError;
use ovctl::ipc::listener::UnixSocketListener;
use ovctl::traits::{CommandSource, DependentView};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Frame interval of the main loop (~60 fps).
const FRAME: Duration = Duration::from_millis(16);

/// Value of `--config <path>`, if given.
fn config_arg() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

/// Load the config from `--config` or the XDG path, falling back to
/// compiled-in defaults.
fn load_config() -> Config {
    let Some(path) = config_arg().or_else(Config::default_path) else {
        info!("no config path, using defaults");
        return Config::default();
    };
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Logging view

/// A dependent view that only logs what it is told.
struct LogView(ViewId);

impl DependentView for LogView {
    fn set_geometry(&mut self, g: GeometryBox) {
        debug!("{}: geometry {:.1},{:.1} {:.1}x{:.1}", self.0, g.x, g.y, g.width, g.height);
    }
    fn set_opacity(&mut self, opacity: f64) {
        debug!("{}: opacity {:.3}", self.0, opacity);
    }
    fn set_scale(&mut self, scale: f64) {
        debug!("{}: scale {:.3}", self.0, scale);
    }
    fn set_visible(&mut self, visible: bool) {
        info!("{}: {}", self.0, if visible { "visible" } else { "hidden" });
    }
    fn set_translation_y(&mut self, translation: f64) {
        debug!("{}: translation_y {:.1}", self.0, translation);
    }
    fn set_fit_mode(&mut self, fit_mode: f64) {
        debug!("{}: fit mode {:.3}", self.0, fit_mode);
    }
}

//  Main

fn main() {
    env_logger::init();

    let config = load_config();
    let mut controls: OverviewControls<Box<dyn DependentView>> = OverviewControls::new(&config);
    for id in ViewId::ALL {
        controls.attach(id, Box::new(LogView(id)));
    }

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    spawn_command_sources(cmd_tx);

    info!("ovctl running");
    loop {
        let deadline = Instant::now() + FRAME;
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            match cmd_rx.recv_timeout(timeout) {
                Ok(cmd) => {
                    if let Err(e) = controls.handle(cmd, Instant::now()) {
                        report(e);
                    }
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    info!("all command sources closed, exiting");
                    return;
                }
            }
        }
        if let Err(e) = controls.frame(Instant::now()) {
            error!("frame error: {}", e);
        }
    }
}

/// Log a rejected command.  Stray gesture phases are expected from input
/// dispatchers and only warned about.
fn report(e: ControlsError) {
    match e {
        ControlsError::Gesture(GestureError::NotActive | GestureError::AlreadyActive) => {
            warn!("dropped gesture command: {}", e);
        }
        other => error!("command error: {}", other),
    }
}

//  Helpers

fn spawn_command_sources(tx: mpsc::Sender<Command>) {
    let path = UnixSocketListener::default_path();
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&path);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}

//! IPC listener that accepts commands over a Unix socket.
//!
//! Key-bind helpers, input dispatchers and scripts connect to the socket and
//! send newline-delimited JSON [`Command`](crate::command::Command)s.

pub mod listener;

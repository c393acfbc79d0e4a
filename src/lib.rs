//! Interactive schematic editor for digital logic circuits.
//!
//! Elements sit on an integer grid and are joined by orthogonal wires. The
//! [`interaction::Editor`] turns pointer input into diagram edits and talks to
//! an optional simulation backend; [`EditorApp`] hosts it in an eframe window.

#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod config;
pub mod descriptor;
pub mod diagram;
pub mod grid;
pub mod interaction;
pub mod palette;
pub mod router;
pub mod simulator;
pub mod wires;
pub use app::EditorApp;

//! tilecore - a compositor-agnostic tiling window manager core.
//!
//! The core consumes window/key/screen events from a compositor layer over
//! an abstract channel and emits placement commands back. It implements
//! grouped workspaces, Columns/Max layouts, float rules and chorded
//! keybindings; it does not speak X11 or Wayland and never draws a pixel.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod geometry;
pub mod group;
pub mod keys;
pub mod rules;
pub mod screen;
pub mod spawn;
pub mod state;
pub mod tracing;
pub mod types;

pub use engine::Engine;
pub use event::{Command, Event};

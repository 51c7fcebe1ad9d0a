//! The compositor boundary: inbound events and outbound commands.
//!
//! Both enums are serde-tagged so any adapter can ship them as JSON lines;
//! the wire framing itself is the adapter's business, not the core's.
//! `ScreenSetChanged` is always the first event a compositor sends on
//! startup - until it arrives there is nowhere to place windows.

use serde::{Deserialize, Serialize};

use crate::types::{Rect, WindowId};

/// Events consumed by the reactor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A window asked to be shown and needs managing
    WindowMapped {
        id: WindowId,
        #[serde(default)]
        class: String,
        #[serde(default)]
        title: String,
    },
    /// A window went away
    WindowUnmapped { id: WindowId },
    /// Window metadata changed; absent fields are unchanged
    WindowPropertyChanged {
        id: WindowId,
        #[serde(default)]
        class: Option<String>,
        #[serde(default)]
        title: Option<String>,
    },
    /// A grabbed key was pressed
    KeyPressed {
        #[serde(default)]
        modifiers: Vec<String>,
        key: String,
    },
    /// The screen set changed (startup, hotplug)
    ScreenSetChanged { screens: Vec<Rect> },
    /// A client requested its own geometry
    ConfigureRequested { id: WindowId, rect: Rect },
    /// The pending chord timer expired (generated by the channel driver)
    ChordTimeout,
}

/// Commands emitted back to the compositor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    PlaceWindow { id: WindowId, rect: Rect },
    RaiseWindow { id: WindowId },
    FocusWindow { id: WindowId },
    SpawnProcess { argv: Vec<String> },
    CloseWindow { id: WindowId },
    Shutdown,
}

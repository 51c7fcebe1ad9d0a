//! State machine types and validation for tilecore.
//!
//! This module formalizes the state machines in the core:
//! - Window lifecycle states
//! - State transitions worth tracing
//!
//! The engine's validator reports violations of invariants that should
//! always hold.

use serde::{Deserialize, Serialize};

use crate::types::WindowId;

/// Window lifecycle states
///
/// ```text
///               WindowMapped
///                    │ float rule classification,
///                    │ group assignment
///                    ▼
///              ┌──────────┐
///              │ Managed  │ ◄──── tiled ◄───┐
///              └────┬─────┘                 │ toggle_floating
///                   │        ──► floating ──┘
///                   │ WindowUnmapped
///                   ▼
///             ┌───────────┐
///             │ Destroyed │  (removed from its group,
///             └───────────┘   focus repaired)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    /// Known to the compositor but not (yet) managed by the core
    Unmanaged,
    /// Tracked in a group, placed by the layout or floating
    Managed,
    /// Being removed; the handle is about to disappear
    Destroyed,
}

/// State violations the validator can detect
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StateViolation {
    pub kind: ViolationKind,
    pub description: String,
}

/// Types of state violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A group lists a window the engine no longer tracks
    GhostWindow,
    /// The engine tracks a window no group contains
    OrphanedWindow,
    /// A window appears in more than one group
    MultiGroupWindow,
    /// A window's group back-reference disagrees with the member lists
    StaleGroupRef,
    /// A screen displays a group that does not exist
    MissingActiveGroup,
    /// A group's fullscreen window is not one of its members
    FullscreenNotMember,
}

/// State transition events that can be traced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum StateTransition {
    /// Window was added to management
    WindowManaged {
        window: WindowId,
        group: String,
        floating: bool,
    },
    /// Window was removed from management
    WindowUnmanaged {
        window: WindowId,
        reason: UnmanageReason,
    },
    /// Focus changed to a different window
    FocusChanged {
        from: Option<WindowId>,
        to: Option<WindowId>,
    },
    /// Window moved between groups
    WindowMoved {
        window: WindowId,
        from_group: String,
        to_group: String,
    },
    /// A screen switched which group it displays
    GroupDisplayed { group: String },
    /// A group cycled to another layout
    LayoutChanged { group: String, layout: String },
    /// The dispatcher entered a chord
    ChordEntered { name: String },
    /// The dispatcher left chord mode
    ChordExited,
    /// The configuration was reloaded and swapped in
    ConfigReloaded,
}

/// Reason a window was unmanaged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmanageReason {
    /// The client unmapped or destroyed the window
    ClientUnmapped,
    /// The core asked the compositor to close it
    WmClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_state_serialization() {
        let state = WindowState::Managed;
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, "\"managed\"");

        let parsed: WindowState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, WindowState::Managed);
    }

    #[test]
    fn test_state_transition_serialization() {
        let transition = StateTransition::WindowManaged {
            window: 42,
            group: "5".to_string(),
            floating: false,
        };
        let json = serde_json::to_string(&transition).unwrap();
        assert!(json.contains("window_managed"));
        assert!(json.contains("42"));
    }

    #[test]
    fn test_violation_kind_serialization() {
        let kind = ViolationKind::MultiGroupWindow;
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, "\"multi_group_window\"");
    }
}

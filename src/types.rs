//! Shared types used across multiple modules.
//!
//! This module contains common data structures to avoid circular dependencies
//! between the geometry, group and engine modules.

use serde::{Deserialize, Serialize};

/// Opaque window handle assigned by the compositor.
pub type WindowId = u32;

/// A rectangle representing geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// A zero-area rectangle at the origin (used to hide windows under Max)
    pub const ZERO: Rect = Rect { x: 0, y: 0, width: 0, height: 0 };

    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Center X coordinate
    pub fn center_x(&self) -> i32 {
        self.x + (self.width as i32) / 2
    }

    /// Center Y coordinate
    pub fn center_y(&self) -> i32 {
        self.y + (self.height as i32) / 2
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Shrink the rect by `amount` pixels on every side, clamping at zero size.
    pub fn inset(&self, amount: u32) -> Rect {
        Rect {
            x: self.x + amount as i32,
            y: self.y + amount as i32,
            width: self.width.saturating_sub(2 * amount),
            height: self.height.saturating_sub(2 * amount),
        }
    }

    /// Clamp this rect so it lies entirely within `bounds`.
    pub fn clamp_to(&self, bounds: Rect) -> Rect {
        let width = self.width.min(bounds.width);
        let height = self.height.min(bounds.height);
        let max_x = bounds.x + (bounds.width - width) as i32;
        let max_y = bounds.y + (bounds.height - height) as i32;
        Rect {
            x: self.x.clamp(bounds.x, max_x),
            y: self.y.clamp(bounds.y, max_y),
            width,
            height,
        }
    }
}

/// Serializable rectangle for snapshots
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RectSnapshot {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl From<Rect> for RectSnapshot {
    fn from(r: Rect) -> Self {
        Self {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }
    }
}

/// Snapshot of a single managed window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub id: WindowId,
    pub class: String,
    pub title: String,
    pub floating: bool,
    pub group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<RectSnapshot>,
}

/// Snapshot of a single group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub name: String,
    pub label: String,
    pub layout: String,
    pub members: Vec<WindowId>,
    pub focused: Option<WindowId>,
}

/// Snapshot of the full engine state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub focused_window: Option<WindowId>,
    pub active_group: Option<String>,
    pub window_count: usize,
    pub group_count: usize,
    pub groups: Vec<GroupSnapshot>,
    pub windows: Vec<WindowSnapshot>,
}

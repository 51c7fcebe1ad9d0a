//! Group (workspace) management.
//!
//! A group is a named workspace holding an ordered stack of tiled windows,
//! a separate floating list, and its active layout. The member ordering is
//! the sole source of truth for stacking/placement order; the geometry
//! engine only turns it into rectangles.

use crate::error::{Error, Result};
use crate::geometry::{
    self, Direction, GrowHints, InsertPosition, LayoutParams,
};
use crate::types::WindowId;

/// A group (workspace) with an independent window stack
#[derive(Debug)]
pub struct Group {
    /// Unique name, immutable after creation
    name: String,
    /// Display label for bars ("WWW", "DEV", ...)
    pub label: String,
    /// Index of the active layout in the configured layout list
    pub layout: usize,
    /// Tiled windows in stacking order
    members: Vec<WindowId>,
    /// Floating windows belonging to this group
    floating: Vec<WindowId>,
    /// Focused position in `members`, always a valid index when present
    focused: Option<usize>,
    /// A floating window holding focus, taking precedence over the stack
    focused_floating: Option<WindowId>,
    /// Window temporarily covering the whole screen, if any
    pub fullscreen: Option<WindowId>,
    /// Grow hints consumed by the geometry engine
    hints: GrowHints,
}

impl Group {
    pub fn new(name: impl Into<String>, label: impl Into<String>, layout: usize) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            layout,
            members: Vec::new(),
            floating: Vec::new(),
            focused: None,
            focused_floating: None,
            fullscreen: None,
            hints: GrowHints::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[WindowId] {
        &self.members
    }

    pub fn floating(&self) -> &[WindowId] {
        &self.floating
    }

    pub fn hints(&self) -> &GrowHints {
        &self.hints
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.focused
    }

    /// The focused window: a floating window holding focus beats the
    /// focused stack member.
    pub fn focused_window(&self) -> Option<WindowId> {
        self.focused_floating
            .or_else(|| self.focused.map(|i| self.members[i]))
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.members.contains(&id) || self.floating.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.floating.is_empty()
    }

    /// Insert a tiled window according to the layout's insertion policy and
    /// focus it. Under Columns each new window opens its own column until the
    /// column cap is reached, then lands at the configured edge of the
    /// focused window's column.
    pub fn insert_window(&mut self, id: WindowId, params: &LayoutParams) {
        let at = match (params, self.focused) {
            (LayoutParams::Columns(p), Some(focused)) if self.members.len() >= p.num_columns => {
                let n = self.members.len();
                let ranges = geometry::column_ranges(n, p.num_columns);
                let col = geometry::position_of(n, p.num_columns, focused)
                    .map(|(c, _)| c)
                    .unwrap_or(0);
                match p.insert_position {
                    InsertPosition::Top => ranges[col].start,
                    InsertPosition::Bottom => ranges[col].end,
                }
            }
            _ => self.members.len(),
        };
        self.members.insert(at, id);
        self.focused = Some(at);
        self.focused_floating = None;
    }

    /// Add a floating window; it takes focus, the way a new tiled window
    /// does.
    pub fn add_floating(&mut self, id: WindowId) {
        if !self.floating.contains(&id) {
            self.floating.push(id);
        }
        self.focused_floating = Some(id);
    }

    /// Remove a window from the group, repairing focus. When the focused
    /// window goes away, focus falls to the member now occupying its slot,
    /// i.e. the next window in its column (clamped to the end of the stack).
    /// Returns whether the window was a member.
    pub fn remove_window(&mut self, id: WindowId) -> bool {
        if let Some(idx) = self.members.iter().position(|&w| w == id) {
            self.members.remove(idx);
            self.focused = match self.focused {
                _ if self.members.is_empty() => None,
                Some(f) if idx < f => Some(f - 1),
                Some(f) if idx == f => Some(f.min(self.members.len() - 1)),
                other => other,
            };
            if self.fullscreen == Some(id) {
                self.fullscreen = None;
            }
            self.hints.retain_windows(&self.members);
            true
        } else if let Some(idx) = self.floating.iter().position(|&w| w == id) {
            self.floating.remove(idx);
            if self.fullscreen == Some(id) {
                self.fullscreen = None;
            }
            if self.focused_floating == Some(id) {
                self.focused_floating = None;
            }
            true
        } else {
            false
        }
    }

    /// Focus a member directly, tiled or floating.
    pub fn focus_window(&mut self, id: WindowId) {
        if let Some(idx) = self.members.iter().position(|&w| w == id) {
            self.focused = Some(idx);
            self.focused_floating = None;
        } else if self.floating.contains(&id) {
            self.focused_floating = Some(id);
        }
    }

    /// Cycle focus forward circularly through the stack. No-op on a group
    /// with no tiled members.
    pub fn next_focus(&mut self) {
        if self.members.is_empty() {
            return;
        }
        self.focused_floating = None;
        self.focused = Some(match self.focused {
            Some(f) => (f + 1) % self.members.len(),
            None => 0,
        });
    }

    /// Move focus in a spatial direction. Under Max there is only one
    /// focusable window, so directional moves are no-ops.
    pub fn focus_direction(&mut self, dir: Direction, params: &LayoutParams) {
        let LayoutParams::Columns(p) = params else { return };
        let Some(focused) = self.focused else { return };
        if let Some(next) = geometry::neighbor(self.members.len(), p.num_columns, focused, dir) {
            self.focused = Some(next);
            self.focused_floating = None;
        }
    }

    /// Swap the focused window with its neighbor in the given direction,
    /// keeping focus on the moved window. No-op at an edge or under Max.
    pub fn shuffle_direction(&mut self, dir: Direction, params: &LayoutParams) -> bool {
        let LayoutParams::Columns(p) = params else { return false };
        let Some(focused) = self.focused else { return false };
        let Some(target) = geometry::neighbor(self.members.len(), p.num_columns, focused, dir)
        else {
            return false;
        };
        self.members.swap(focused, target);
        self.focused = Some(target);
        true
    }

    /// Adjust grow hints for the focused window. Growing toward an edge with
    /// no neighbor on that side shrinks the window instead.
    pub fn grow_direction(&mut self, dir: Direction, params: &LayoutParams) {
        let LayoutParams::Columns(p) = params else { return };
        let Some(focused) = self.focused else { return };
        let n = self.members.len();
        let ranges = geometry::column_ranges(n, p.num_columns);
        let ncols = ranges.len();
        let Some((col, row)) = geometry::position_of(n, p.num_columns, focused) else {
            return;
        };
        let amount = p.grow_amount.max(1);
        let col_default = |c: usize| {
            // mirror the geometry engine's ratio-skewed default for column 0
            if c == 0 && ncols > 1 {
                let ratio = p.ratio.clamp(0.1, 0.9);
                (100.0 * ratio / (1.0 - ratio)).round() as u32
            } else {
                100
            }
        };
        match dir {
            Direction::Left => {
                if col > 0 {
                    self.hints
                        .transfer_column((col, col_default(col)), (col - 1, col_default(col - 1)), amount);
                } else if ncols > 1 {
                    self.hints.shrink_column(col, col_default(col), amount);
                }
            }
            Direction::Right => {
                if col + 1 < ncols {
                    self.hints
                        .transfer_column((col, col_default(col)), (col + 1, col_default(col + 1)), amount);
                } else if ncols > 1 {
                    self.hints.shrink_column(col, col_default(col), amount);
                }
            }
            Direction::Up => {
                let id = self.members[focused];
                if row > 0 {
                    self.hints.transfer_window(id, self.members[focused - 1], amount);
                } else if row + 1 < ranges[col].len() {
                    self.hints.shrink_window(id, amount);
                }
            }
            Direction::Down => {
                let id = self.members[focused];
                if row + 1 < ranges[col].len() {
                    self.hints.transfer_window(id, self.members[focused + 1], amount);
                } else if row > 0 {
                    self.hints.shrink_window(id, amount);
                }
            }
        }
    }

    /// Reset all grow hints to equal distribution.
    pub fn normalize(&mut self) {
        self.hints.clear();
    }

    /// Cycle the active layout through the configured layout list.
    pub fn next_layout(&mut self, layout_count: usize) {
        if layout_count > 0 {
            self.layout = (self.layout + 1) % layout_count;
        }
    }

    /// Move a tiled window to the floating list or back. Returns the new
    /// floating state, or None if the window is not in this group.
    pub fn toggle_floating(&mut self, id: WindowId, params: &LayoutParams) -> Option<bool> {
        if self.members.contains(&id) {
            self.remove_window(id);
            self.add_floating(id);
            Some(true)
        } else if self.floating.contains(&id) {
            self.floating.retain(|&w| w != id);
            self.insert_window(id, params);
            Some(false)
        } else {
            None
        }
    }
}

/// Owns the process-wide set of named groups.
///
/// Groups are created once from configuration and live for the whole
/// session; screens reference them by name but never own them.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: Vec<Group>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group. Fails if the name is taken.
    pub fn create_group(
        &mut self,
        name: impl Into<String>,
        label: impl Into<String>,
        layout: usize,
    ) -> Result<()> {
        let name = name.into();
        if self.groups.iter().any(|g| g.name() == name) {
            return Err(Error::DuplicateName(name));
        }
        self.groups.push(Group::new(name, label, layout));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Group> {
        self.groups
            .iter()
            .find(|g| g.name() == name)
            .ok_or_else(|| Error::group_not_found(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Group> {
        self.groups
            .iter_mut()
            .find(|g| g.name() == name)
            .ok_or_else(|| Error::group_not_found(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Group> {
        self.groups.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Name of the group a window belongs to, if any.
    pub fn group_of(&self, id: WindowId) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.contains(id))
            .map(|g| g.name())
    }

    /// Atomically move a window to another group: detach from its source
    /// (repairing the source's focus) and append to the target. Floating
    /// windows stay floating. A move to the window's own group is a no-op.
    pub fn move_window(
        &mut self,
        id: WindowId,
        target: &str,
        params: &LayoutParams,
    ) -> Result<()> {
        // verify the target exists before detaching anything
        self.get(target)?;
        let source = self
            .group_of(id)
            .ok_or_else(|| Error::window_not_found(id))?
            .to_string();
        if source == target {
            return Ok(());
        }
        let was_floating = {
            let src = self.get_mut(&source)?;
            let floating = src.floating.contains(&id);
            src.remove_window(id);
            floating
        };
        let dst = self.get_mut(target)?;
        if was_floating {
            dst.add_floating(id);
        } else {
            dst.insert_window(id, params);
        }
        Ok(())
    }
}

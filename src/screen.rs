//! Screen set management.
//!
//! Screens display groups but never own them: a removed screen's group just
//! returns to the undisplayed pool. Hotplug rebuilds the set from whatever
//! the compositor reports, keeping per-position group assignments where the
//! position survived.

use std::collections::HashSet;

use slotmap::{new_key_type, SlotMap};

use crate::config::{BarConfig, BarPosition};
use crate::types::Rect;

new_key_type! {
    /// Unique identifier for a screen
    pub struct ScreenId;
}

/// A physical screen displaying one group at a time
#[derive(Debug, Clone)]
pub struct Screen {
    /// Position and size in the global coordinate space
    pub geometry: Rect,
    /// Name of the group currently displayed here
    pub active_group: Option<String>,
    /// Bar settings carried for the bar renderer
    pub bar: BarConfig,
}

impl Screen {
    /// The area available for tiling once the bar strip is reserved.
    pub fn usable(&self) -> Rect {
        let bar = self.bar.size.min(self.geometry.height);
        match self.bar.position {
            BarPosition::Top => Rect::new(
                self.geometry.x,
                self.geometry.y + bar as i32,
                self.geometry.width,
                self.geometry.height - bar,
            ),
            BarPosition::Bottom => Rect::new(
                self.geometry.x,
                self.geometry.y,
                self.geometry.width,
                self.geometry.height - bar,
            ),
        }
    }
}

/// Manages all screens and which group each one displays
#[derive(Debug, Default)]
pub struct ScreenSet {
    screens: SlotMap<ScreenId, Screen>,
    /// Screens in the order the compositor reported them
    order: Vec<ScreenId>,
    focused: Option<ScreenId>,
}

impl ScreenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the screen set from a hotplug report.
    ///
    /// Screens are matched by position in the reported list: surviving
    /// positions keep their displayed group, removed positions release
    /// theirs back to the pool. Screens left without a group (new ones, or
    /// whose group vanished from the registry) take the first group in
    /// `group_names` order not displayed elsewhere. No group is ever
    /// dropped; an undisplayed group stays reachable through the registry.
    pub fn reconfigure(&mut self, geometries: &[Rect], group_names: &[String], bar: &BarConfig) {
        let previous: Vec<Option<String>> = self
            .order
            .iter()
            .filter_map(|&id| self.screens.get(id))
            .map(|s| s.active_group.clone())
            .collect();

        self.screens.clear();
        self.order.clear();

        for (i, &geometry) in geometries.iter().enumerate() {
            let inherited = previous
                .get(i)
                .cloned()
                .flatten()
                .filter(|g| group_names.contains(g));
            let id = self.screens.insert(Screen {
                geometry,
                active_group: inherited,
                bar: bar.clone(),
            });
            self.order.push(id);
        }

        // deterministic backfill: first undisplayed group, registry order
        let mut displayed: HashSet<String> = self
            .screens
            .values()
            .filter_map(|s| s.active_group.clone())
            .collect();
        for &id in &self.order {
            let screen = &mut self.screens[id];
            if screen.active_group.is_none() {
                if let Some(name) = group_names.iter().find(|n| !displayed.contains(*n)) {
                    displayed.insert(name.clone());
                    screen.active_group = Some(name.clone());
                }
            }
        }

        self.focused = self.order.first().copied();
        log::info!(
            "Screen set reconfigured: {} screen(s), focused {:?}",
            self.order.len(),
            self.focused
        );
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn focused_id(&self) -> Option<ScreenId> {
        self.focused
    }

    pub fn focused(&self) -> Option<&Screen> {
        self.focused.and_then(|id| self.screens.get(id))
    }

    pub fn get(&self, id: ScreenId) -> Option<&Screen> {
        self.screens.get(id)
    }

    pub fn get_mut(&mut self, id: ScreenId) -> Option<&mut Screen> {
        self.screens.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScreenId, &Screen)> {
        self.order.iter().filter_map(|&id| self.screens.get(id).map(|s| (id, s)))
    }

    /// The screen currently displaying `group`, if any.
    pub fn showing(&self, group: &str) -> Option<ScreenId> {
        self.iter()
            .find(|(_, s)| s.active_group.as_deref() == Some(group))
            .map(|(id, _)| id)
    }

    /// Display `group` on `screen`. A group shows on at most one screen, so
    /// any other screen displaying it is backfilled with the first
    /// undisplayed group. Returns every screen whose contents changed.
    pub fn display_group(
        &mut self,
        screen: ScreenId,
        group: &str,
        group_names: &[String],
    ) -> Vec<ScreenId> {
        if self.screens.get(screen).is_none() {
            return Vec::new();
        }
        if self.screens[screen].active_group.as_deref() == Some(group) {
            return Vec::new();
        }

        let mut changed = vec![screen];
        if let Some(other) = self.showing(group) {
            let displayed: HashSet<String> = self
                .screens
                .values()
                .filter_map(|s| s.active_group.clone())
                .collect();
            let backfill = group_names
                .iter()
                .find(|n| !displayed.contains(*n) && n.as_str() != group)
                .cloned();
            self.screens[other].active_group = backfill;
            changed.push(other);
        }
        self.screens[screen].active_group = Some(group.to_string());
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn bar() -> BarConfig {
        BarConfig::default()
    }

    #[test]
    fn test_reconfigure_assigns_groups_in_order() {
        let mut set = ScreenSet::new();
        set.reconfigure(
            &[Rect::new(0, 0, 1920, 1080), Rect::new(1920, 0, 1280, 1024)],
            &names(&["1", "2", "3"]),
            &bar(),
        );
        assert_eq!(set.len(), 2);
        let groups: Vec<_> = set.iter().map(|(_, s)| s.active_group.clone()).collect();
        assert_eq!(groups, vec![Some("1".to_string()), Some("2".to_string())]);
        assert!(set.focused_id().is_some());
    }

    #[test]
    fn test_hotplug_removal_keeps_surviving_screen_group() {
        let mut set = ScreenSet::new();
        let groups = names(&["1", "2", "3"]);
        set.reconfigure(
            &[Rect::new(0, 0, 1920, 1080), Rect::new(1920, 0, 1280, 1024)],
            &groups,
            &bar(),
        );
        // unplug the second screen; the first keeps group "1"
        set.reconfigure(&[Rect::new(0, 0, 1920, 1080)], &groups, &bar());
        assert_eq!(set.len(), 1);
        assert_eq!(set.focused().unwrap().active_group.as_deref(), Some("1"));
        // group "2" is back in the pool, not displayed anywhere
        assert!(set.showing("2").is_none());
    }

    #[test]
    fn test_hotplug_addition_backfills_next_group() {
        let mut set = ScreenSet::new();
        let groups = names(&["1", "2", "3"]);
        set.reconfigure(&[Rect::new(0, 0, 1920, 1080)], &groups, &bar());
        set.reconfigure(
            &[Rect::new(0, 0, 1920, 1080), Rect::new(1920, 0, 1280, 1024)],
            &groups,
            &bar(),
        );
        assert_eq!(
            set.iter().nth(1).unwrap().1.active_group.as_deref(),
            Some("2")
        );
    }

    #[test]
    fn test_display_group_steals_from_other_screen() {
        let mut set = ScreenSet::new();
        let groups = names(&["1", "2", "3"]);
        set.reconfigure(
            &[Rect::new(0, 0, 1920, 1080), Rect::new(1920, 0, 1280, 1024)],
            &groups,
            &bar(),
        );
        let first = set.focused_id().unwrap();
        // show group "2" (currently on the second screen) on the first
        let changed = set.display_group(first, "2", &groups);
        assert_eq!(changed.len(), 2);
        assert_eq!(set.get(first).unwrap().active_group.as_deref(), Some("2"));
        // the second screen fell back to the first undisplayed group
        let second = set.iter().nth(1).unwrap().0;
        assert_eq!(set.get(second).unwrap().active_group.as_deref(), Some("1"));
    }

    #[test]
    fn test_display_group_same_group_is_noop() {
        let mut set = ScreenSet::new();
        let groups = names(&["1", "2"]);
        set.reconfigure(&[Rect::new(0, 0, 1920, 1080)], &groups, &bar());
        let id = set.focused_id().unwrap();
        assert!(set.display_group(id, "1", &groups).is_empty());
    }

    #[test]
    fn test_usable_reserves_bar_strip() {
        let screen = Screen {
            geometry: Rect::new(0, 0, 1920, 1080),
            active_group: Some("1".to_string()),
            bar: BarConfig { size: 32, ..BarConfig::default() },
        };
        let usable = screen.usable();
        assert_eq!(usable, Rect::new(0, 32, 1920, 1048));
    }

    #[test]
    fn test_more_screens_than_groups() {
        let mut set = ScreenSet::new();
        set.reconfigure(
            &[Rect::new(0, 0, 1920, 1080), Rect::new(1920, 0, 1280, 1024)],
            &names(&["only"]),
            &bar(),
        );
        let groups: Vec<_> = set.iter().map(|(_, s)| s.active_group.clone()).collect();
        assert_eq!(groups, vec![Some("only".to_string()), None]);
    }
}

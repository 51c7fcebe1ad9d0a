//! The event loop core.
//!
//! A single-threaded reactor: `handle_event` consumes one compositor event,
//! runs to completion without suspension points, and returns the commands to
//! send back. All shared state (groups, screens, keybindings) is owned here
//! and mutated from this one entry point, so no locking exists anywhere.
//!
//! Placement is authoritative: every mutation of membership, focus or layout
//! parameters recomputes the affected screen's rectangles from scratch and
//! re-emits them. Clients' own geometry wishes are honored for floating
//! windows only.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::error::Error;
use crate::event::{Command, Event};
use crate::geometry::{self, ColumnsParams, LayoutParams};
use crate::group::GroupRegistry;
use crate::keys::{self, Action, Dispatch, Dispatcher, KeyTable};
use crate::rules;
use crate::screen::{ScreenId, ScreenSet};
use crate::spawn;
use crate::state::{StateTransition, StateViolation, UnmanageReason, ViolationKind};
use crate::tracing::EventTracer;
use crate::types::{EngineSnapshot, GroupSnapshot, Rect, WindowId, WindowSnapshot};

/// Size given to floating windows that never requested a geometry
const DEFAULT_FLOAT_SIZE: (u32, u32) = (800, 600);

/// Everything the core tracks about one managed window
#[derive(Debug, Clone)]
pub struct ManagedWindow {
    pub class: String,
    pub title: String,
    pub floating: bool,
    /// Last geometry assigned by the layout, or requested by a floater
    pub geometry: Rect,
    /// Back-reference; the group's member list is the source of truth
    pub group: String,
}

/// The window manager core
pub struct Engine {
    config: Config,
    config_path: Option<PathBuf>,
    registry: GroupRegistry,
    screens: ScreenSet,
    windows: HashMap<WindowId, ManagedWindow>,
    dispatcher: Dispatcher,
    tracer: EventTracer,
    last_focus: Option<WindowId>,
    running: bool,
}

impl Engine {
    /// Build the engine from configuration. Groups and the keybinding table
    /// are constructed once here; runtime reload swaps in replacements.
    pub fn new(mut config: Config, config_path: Option<PathBuf>) -> Self {
        if config.layouts.is_empty() {
            log::warn!("No layouts configured, falling back to columns");
            config.layouts.push(LayoutParams::Columns(ColumnsParams::default()));
        }

        let mut registry = GroupRegistry::new();
        for spec in &config.groups {
            let layout = config.layout_index(&spec.layout).unwrap_or(0);
            if let Err(e) = registry.create_group(&spec.name, spec.label(), layout) {
                log::warn!("Skipping group: {}", e);
            }
        }

        let table = KeyTable::from_bindings(&config.keybindings);
        let dispatcher = Dispatcher::new(table, config.general.chord_strict, config.chord_timeout());

        Self {
            config,
            config_path,
            registry,
            screens: ScreenSet::new(),
            windows: HashMap::new(),
            dispatcher,
            tracer: EventTracer::new(),
            last_focus: None,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    pub fn screens(&self) -> &ScreenSet {
        &self.screens
    }

    pub fn tracer(&self) -> &EventTracer {
        &self.tracer
    }

    pub fn window(&self, id: WindowId) -> Option<&ManagedWindow> {
        self.windows.get(&id)
    }

    pub fn in_chord(&self) -> bool {
        self.dispatcher.in_chord()
    }

    /// Deadline hint for the channel driver: when Some, arm a timer and feed
    /// `Event::ChordTimeout` back on expiry.
    pub fn pending_chord_timeout(&self) -> Option<Duration> {
        self.dispatcher.pending_timeout()
    }

    /// The focused window: the focused member of the focused screen's group.
    pub fn focused_window(&self) -> Option<WindowId> {
        let name = self.active_group_name()?;
        self.registry.get(&name).ok()?.focused_window()
    }

    /// Handle one compositor event, returning the commands it produced.
    pub fn handle_event(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::WindowMapped { id, class, title } => self.on_mapped(id, class, title),
            Event::WindowUnmapped { id } => self.on_unmapped(id),
            Event::WindowPropertyChanged { id, class, title } => {
                self.on_property_changed(id, class, title)
            }
            Event::KeyPressed { modifiers, key } => self.on_key(&modifiers, &key),
            Event::ScreenSetChanged { screens } => self.on_screens_changed(&screens),
            Event::ConfigureRequested { id, rect } => self.on_configure_requested(id, rect),
            Event::ChordTimeout => self.on_chord_timeout(),
        }
    }

    // ---------------------------------------------------------------------
    // Event handlers
    // ---------------------------------------------------------------------

    fn on_mapped(&mut self, id: WindowId, class: String, title: String) -> Vec<Command> {
        self.tracer.trace_event("window_mapped", Some(id), &format!("class={}", class));

        if let Some(win) = self.windows.get_mut(&id) {
            // stale re-map of a window we already manage: refresh metadata
            win.class = class;
            win.title = title;
            return Vec::new();
        }

        let Some(group_name) = self.active_group_name() else {
            log::warn!("No group available to manage window 0x{:x}", id);
            return Vec::new();
        };

        let floating = rules::classify(&class, &title, &self.config.float_rules);
        let geometry = if floating { self.default_float_rect() } else { Rect::ZERO };
        self.windows.insert(
            id,
            ManagedWindow {
                class,
                title,
                floating,
                geometry,
                group: group_name.clone(),
            },
        );

        let params = self.group_params(&group_name);
        if let Ok(group) = self.registry.get_mut(&group_name) {
            if floating {
                group.add_floating(id);
            } else {
                group.insert_window(id, &params);
            }
        }

        log::info!(
            "Managed window 0x{:x} in group '{}' ({})",
            id,
            group_name,
            if floating { "floating" } else { "tiled" }
        );
        self.tracer.trace_transition(&StateTransition::WindowManaged {
            window: id,
            group: group_name.clone(),
            floating,
        });

        self.relayout_group(&group_name)
    }

    fn on_unmapped(&mut self, id: WindowId) -> Vec<Command> {
        self.tracer.trace_event("window_unmapped", Some(id), "");

        let Some(win) = self.windows.remove(&id) else {
            // stale unmap of a window we already dropped
            log::debug!("Unmap for unknown window 0x{:x}, ignoring", id);
            return Vec::new();
        };
        if let Ok(group) = self.registry.get_mut(&win.group) {
            group.remove_window(id);
        }
        if self.last_focus == Some(id) {
            self.last_focus = None;
        }
        self.tracer.trace_transition(&StateTransition::WindowUnmanaged {
            window: id,
            reason: UnmanageReason::ClientUnmapped,
        });

        self.relayout_group(&win.group)
    }

    fn on_property_changed(
        &mut self,
        id: WindowId,
        class: Option<String>,
        title: Option<String>,
    ) -> Vec<Command> {
        let Some(win) = self.windows.get_mut(&id) else {
            log::debug!("Property change for unknown window 0x{:x}", id);
            return Vec::new();
        };
        if let Some(class) = class {
            win.class = class;
        }
        if let Some(title) = title {
            win.title = title;
        }
        Vec::new()
    }

    fn on_configure_requested(&mut self, id: WindowId, rect: Rect) -> Vec<Command> {
        self.tracer.trace_event("configure_requested", Some(id), &format!("{:?}", rect));
        match self.windows.get(&id) {
            Some(win) if win.floating => {
                // floating windows place themselves, clamped onto their screen
                let bounds = self
                    .screens
                    .showing(&win.group)
                    .and_then(|sid| self.screens.get(sid))
                    .or_else(|| self.screens.focused())
                    .map(|s| s.usable());
                let rect = match bounds {
                    Some(bounds) => rect.clamp_to(bounds),
                    None => rect,
                };
                if let Some(win) = self.windows.get_mut(&id) {
                    win.geometry = rect;
                }
                vec![Command::PlaceWindow { id, rect }]
            }
            Some(win) => {
                // tiled windows don't get a say: re-assert the layout
                let group = win.group.clone();
                self.relayout_group(&group)
            }
            // not ours: let it configure itself
            None => vec![Command::PlaceWindow { id, rect }],
        }
    }

    fn on_key(&mut self, modifiers: &[String], key: &str) -> Vec<Command> {
        let mods = keys::parse_modifiers(modifiers);
        self.tracer
            .trace_event("key_pressed", None, &format!("mods={:#x} key={}", mods, key));
        match self.dispatcher.dispatch(mods, key) {
            Dispatch::Invoke(action) => self.execute_action(action),
            Dispatch::EnteredChord(name) => {
                log::debug!("Entered chord '{}'", name);
                self.tracer.trace_transition(&StateTransition::ChordEntered { name });
                Vec::new()
            }
            Dispatch::ExitedChord => {
                self.tracer.trace_transition(&StateTransition::ChordExited);
                Vec::new()
            }
            Dispatch::Unbound => {
                log::debug!("Unbound key {}+{}, passing through", mods, key);
                Vec::new()
            }
            Dispatch::Ignored => Vec::new(),
        }
    }

    fn on_chord_timeout(&mut self) -> Vec<Command> {
        if self.dispatcher.on_timeout() {
            log::debug!("Chord timed out");
            self.tracer.trace_transition(&StateTransition::ChordExited);
        }
        Vec::new()
    }

    fn on_screens_changed(&mut self, geometries: &[Rect]) -> Vec<Command> {
        self.tracer
            .trace_event("screen_set_changed", None, &format!("count={}", geometries.len()));
        let names = self.group_names();
        self.screens.reconfigure(geometries, &names, &self.config.bar);

        let mut commands = Vec::new();
        for name in &names {
            if self.screens.showing(name).is_none() {
                commands.extend(self.hide_group_commands(name));
            }
        }
        for id in self.screen_ids() {
            commands.extend(self.relayout_screen(id));
        }
        commands
    }

    // ---------------------------------------------------------------------
    // Action dispatch
    // ---------------------------------------------------------------------

    fn execute_action(&mut self, action: Action) -> Vec<Command> {
        match action {
            Action::Spawn { command } => self.spawn_command(&command),
            Action::SpawnTerminal => {
                let terminal = self.config.general.terminal.clone();
                self.spawn_command(&terminal)
            }
            Action::Focus { direction } => {
                self.mutate_active_group(|g, p| g.focus_direction(direction, p))
            }
            Action::Shuffle { direction } => self.mutate_active_group(|g, p| {
                g.shuffle_direction(direction, p);
            }),
            Action::Grow { direction } => {
                self.mutate_active_group(|g, p| g.grow_direction(direction, p))
            }
            Action::NextFocus => self.mutate_active_group(|g, _| g.next_focus()),
            Action::Normalize => self.mutate_active_group(|g, _| g.normalize()),
            Action::NextLayout => self.next_layout(),
            Action::ToGroup { group, switch } => self.move_focused_to_group(&group, switch),
            Action::ToScreen { group } => self.show_group(&group),
            Action::ToggleFloating => self.toggle_floating(),
            Action::ToggleFullscreen => self.toggle_fullscreen(),
            Action::CloseWindow => match self.focused_window() {
                Some(id) => vec![Command::CloseWindow { id }],
                None => Vec::new(),
            },
            Action::ReloadConfig => self.reload_config(),
            Action::Shutdown => {
                log::info!("Shutting down");
                self.running = false;
                vec![Command::Shutdown]
            }
            Action::Chord { .. } => {
                // chords are compiled into the table; one reaching dispatch
                // directly would be a builder bug
                log::warn!("Raw chord action invoked, ignoring");
                Vec::new()
            }
        }
    }

    fn spawn_command(&self, command: &str) -> Vec<Command> {
        let argv = spawn::split_command(command);
        if argv.is_empty() {
            log::warn!("Spawn binding with empty command");
            Vec::new()
        } else {
            vec![Command::SpawnProcess { argv }]
        }
    }

    fn next_layout(&mut self) -> Vec<Command> {
        let Some(name) = self.active_group_name() else {
            return Vec::new();
        };
        let count = self.config.layouts.len();
        let Ok(group) = self.registry.get_mut(&name) else {
            return Vec::new();
        };
        group.next_layout(count);
        let kind = self
            .config
            .layouts
            .get(self.registry.get(&name).map(|g| g.layout).unwrap_or(0))
            .map(|l| l.kind().to_string())
            .unwrap_or_default();
        log::info!("Group '{}' switched to layout '{}'", name, kind);
        self.tracer.trace_transition(&StateTransition::LayoutChanged {
            group: name.clone(),
            layout: kind,
        });
        self.relayout_group(&name)
    }

    fn move_focused_to_group(&mut self, target: &str, switch: bool) -> Vec<Command> {
        let Some(source) = self.active_group_name() else {
            return Vec::new();
        };
        let Some(id) = self.focused_window() else {
            return Vec::new();
        };
        let params = self.group_params(target);
        match self.registry.move_window(id, target, &params) {
            Ok(()) => {
                if let Some(win) = self.windows.get_mut(&id) {
                    win.group = target.to_string();
                }
                self.tracer.trace_transition(&StateTransition::WindowMoved {
                    window: id,
                    from_group: source.clone(),
                    to_group: target.to_string(),
                });

                let mut commands = Vec::new();
                if switch {
                    commands.extend(self.show_group(target));
                } else if self.screens.showing(target).is_none() {
                    // moved out of sight until its group is displayed again
                    commands.push(Command::PlaceWindow { id, rect: Rect::ZERO });
                } else {
                    commands.extend(self.relayout_group(target));
                }
                commands.extend(self.relayout_group(&source));
                commands
            }
            Err(e) => {
                log::warn!("Cannot move window to group '{}': {}", target, e);
                Vec::new()
            }
        }
    }

    fn show_group(&mut self, name: &str) -> Vec<Command> {
        if self.registry.get(name).is_err() {
            log::warn!("Cannot display unknown group '{}'", name);
            return Vec::new();
        }
        let Some(screen_id) = self.screens.focused_id() else {
            return Vec::new();
        };
        let displaced = self
            .screens
            .get(screen_id)
            .and_then(|s| s.active_group.clone());

        let names = self.group_names();
        let changed = self.screens.display_group(screen_id, name, &names);
        if changed.is_empty() {
            return Vec::new();
        }
        self.tracer
            .trace_transition(&StateTransition::GroupDisplayed { group: name.to_string() });

        let mut commands = Vec::new();
        if let Some(displaced) = displaced {
            if self.screens.showing(&displaced).is_none() {
                commands.extend(self.hide_group_commands(&displaced));
            }
        }
        for sid in changed {
            commands.extend(self.relayout_screen(sid));
        }
        commands
    }

    fn toggle_floating(&mut self) -> Vec<Command> {
        let Some(name) = self.active_group_name() else {
            return Vec::new();
        };
        let params = self.group_params(&name);
        let Ok(group) = self.registry.get_mut(&name) else {
            return Vec::new();
        };
        // floats the focused stack window, or re-tiles a focused floater
        let Some(id) = group.focused_window() else {
            return Vec::new();
        };
        let Some(now_floating) = group.toggle_floating(id, &params) else {
            return Vec::new();
        };

        let float_rect = self.default_float_rect();
        if let Some(win) = self.windows.get_mut(&id) {
            win.floating = now_floating;
            if now_floating {
                win.geometry = float_rect;
            }
        }
        log::info!(
            "Window 0x{:x} is now {}",
            id,
            if now_floating { "floating" } else { "tiled" }
        );
        self.relayout_group(&name)
    }

    fn toggle_fullscreen(&mut self) -> Vec<Command> {
        let Some(name) = self.active_group_name() else {
            return Vec::new();
        };
        let Some(id) = self.focused_window() else {
            return Vec::new();
        };
        if let Ok(group) = self.registry.get_mut(&name) {
            group.fullscreen = if group.fullscreen == Some(id) { None } else { Some(id) };
        }
        self.relayout_group(&name)
    }

    fn reload_config(&mut self) -> Vec<Command> {
        let path = self.config_path.clone().unwrap_or_else(Config::default_path);
        let mut config = Config::load_from_path(path);
        for issue in config.validate() {
            log::warn!("Config issue: {}", issue);
        }
        if config.layouts.is_empty() {
            config.layouts.push(LayoutParams::Columns(ColumnsParams::default()));
        }

        // construct-and-swap: the old table keeps serving until this point
        let table = KeyTable::from_bindings(&config.keybindings);
        self.dispatcher
            .replace_table(table, config.general.chord_strict, config.chord_timeout());

        // new groups appear, existing groups keep their windows
        for spec in &config.groups {
            let layout = config.layout_index(&spec.layout).unwrap_or(0);
            match self.registry.create_group(&spec.name, spec.label(), layout) {
                Ok(()) => log::info!("Created group '{}' from reloaded config", spec.name),
                Err(Error::DuplicateName(_)) => {
                    if let Ok(group) = self.registry.get_mut(&spec.name) {
                        group.label = spec.label().to_string();
                        group.layout = layout;
                    }
                }
                Err(e) => log::warn!("Skipping group: {}", e),
            }
        }

        self.config = config;
        self.tracer.trace_transition(&StateTransition::ConfigReloaded);
        log::info!("Configuration reloaded");
        self.relayout_all()
    }

    // ---------------------------------------------------------------------
    // Layout plumbing
    // ---------------------------------------------------------------------

    /// Apply a mutation to the focused screen's group and relayout it.
    fn mutate_active_group(
        &mut self,
        f: impl FnOnce(&mut crate::group::Group, &LayoutParams),
    ) -> Vec<Command> {
        let Some(name) = self.active_group_name() else {
            return Vec::new();
        };
        let params = self.group_params(&name);
        if let Ok(group) = self.registry.get_mut(&name) {
            f(group, &params);
        }
        self.relayout_group(&name)
    }

    /// Recompute and emit placement for the screen displaying `group`.
    /// A group not displayed anywhere produces no placement.
    fn relayout_group(&mut self, group: &str) -> Vec<Command> {
        match self.screens.showing(group) {
            Some(screen_id) => self.relayout_screen(screen_id),
            None => Vec::new(),
        }
    }

    fn relayout_screen(&mut self, screen_id: ScreenId) -> Vec<Command> {
        let Some(screen) = self.screens.get(screen_id) else {
            return Vec::new();
        };
        let screen_rect = screen.geometry;
        let usable = screen.usable();
        let Some(group_name) = screen.active_group.clone() else {
            return Vec::new();
        };

        let (rects, fullscreen, focused, floating) = {
            let Ok(group) = self.registry.get(&group_name) else {
                log::warn!("Screen displays unknown group '{}'", group_name);
                return Vec::new();
            };
            let params = self
                .config
                .layouts
                .get(group.layout)
                .cloned()
                .unwrap_or_else(|| LayoutParams::Columns(ColumnsParams::default()));
            (
                geometry::compute_layout(
                    group.members(),
                    group.focused_index(),
                    &params,
                    group.hints(),
                    usable,
                ),
                group.fullscreen,
                group.focused_window(),
                group.floating().to_vec(),
            )
        };

        let mut commands = Vec::new();
        for (id, rect) in rects {
            let rect = if fullscreen == Some(id) { screen_rect } else { rect };
            if let Some(win) = self.windows.get_mut(&id) {
                win.geometry = rect;
            }
            commands.push(Command::PlaceWindow { id, rect });
        }
        for id in floating {
            let rect = if fullscreen == Some(id) {
                screen_rect
            } else {
                self.windows
                    .get(&id)
                    .map(|w| w.geometry)
                    .unwrap_or_else(|| self.default_float_rect())
            };
            commands.push(Command::PlaceWindow { id, rect });
            commands.push(Command::RaiseWindow { id });
        }
        if let Some(id) = fullscreen {
            commands.push(Command::RaiseWindow { id });
        }
        if let Some(id) = focused {
            commands.push(Command::FocusWindow { id });
            if self.last_focus != Some(id) {
                self.tracer.trace_transition(&StateTransition::FocusChanged {
                    from: self.last_focus,
                    to: Some(id),
                });
                self.last_focus = Some(id);
            }
        }
        commands
    }

    fn relayout_all(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        for id in self.screen_ids() {
            commands.extend(self.relayout_screen(id));
        }
        commands
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    fn active_group_name(&self) -> Option<String> {
        self.screens
            .focused()
            .and_then(|s| s.active_group.clone())
            .or_else(|| self.registry.iter().next().map(|g| g.name().to_string()))
    }

    fn group_names(&self) -> Vec<String> {
        self.registry.iter().map(|g| g.name().to_string()).collect()
    }

    fn screen_ids(&self) -> Vec<ScreenId> {
        self.screens.iter().map(|(id, _)| id).collect()
    }

    /// Layout parameters for a group's active layout (cloned, cheap).
    fn group_params(&self, name: &str) -> LayoutParams {
        let idx = self.registry.get(name).map(|g| g.layout).unwrap_or(0);
        self.config
            .layouts
            .get(idx)
            .cloned()
            .unwrap_or_else(|| LayoutParams::Columns(ColumnsParams::default()))
    }

    fn default_float_rect(&self) -> Rect {
        let bounds = self
            .screens
            .focused()
            .map(|s| s.usable())
            .unwrap_or_else(|| Rect::new(0, 0, DEFAULT_FLOAT_SIZE.0, DEFAULT_FLOAT_SIZE.1));
        let width = DEFAULT_FLOAT_SIZE.0.min(bounds.width);
        let height = DEFAULT_FLOAT_SIZE.1.min(bounds.height);
        Rect::new(
            bounds.x + ((bounds.width - width) / 2) as i32,
            bounds.y + ((bounds.height - height) / 2) as i32,
            width,
            height,
        )
    }

    fn hide_group_commands(&self, name: &str) -> Vec<Command> {
        let Ok(group) = self.registry.get(name) else {
            return Vec::new();
        };
        group
            .members()
            .iter()
            .chain(group.floating())
            .map(|&id| Command::PlaceWindow { id, rect: Rect::ZERO })
            .collect()
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    /// Check invariants that should always hold.
    pub fn validate(&self) -> Vec<StateViolation> {
        let mut violations = Vec::new();

        for group in self.registry.iter() {
            for &id in group.members().iter().chain(group.floating()) {
                if !self.windows.contains_key(&id) {
                    violations.push(StateViolation {
                        kind: ViolationKind::GhostWindow,
                        description: format!(
                            "group '{}' lists untracked window 0x{:x}",
                            group.name(),
                            id
                        ),
                    });
                }
            }
            if let Some(fs) = group.fullscreen {
                if !group.contains(fs) {
                    violations.push(StateViolation {
                        kind: ViolationKind::FullscreenNotMember,
                        description: format!(
                            "group '{}' fullscreens non-member 0x{:x}",
                            group.name(),
                            fs
                        ),
                    });
                }
            }
        }

        for (&id, win) in &self.windows {
            let holders: Vec<&str> = self
                .registry
                .iter()
                .filter(|g| g.contains(id))
                .map(|g| g.name())
                .collect();
            match holders.len() {
                0 => violations.push(StateViolation {
                    kind: ViolationKind::OrphanedWindow,
                    description: format!("window 0x{:x} is in no group", id),
                }),
                1 => {
                    if holders[0] != win.group {
                        violations.push(StateViolation {
                            kind: ViolationKind::StaleGroupRef,
                            description: format!(
                                "window 0x{:x} thinks it is in '{}' but '{}' holds it",
                                id, win.group, holders[0]
                            ),
                        });
                    }
                }
                _ => violations.push(StateViolation {
                    kind: ViolationKind::MultiGroupWindow,
                    description: format!(
                        "window 0x{:x} is in groups {:?}",
                        id, holders
                    ),
                }),
            }
        }

        for (_, screen) in self.screens.iter() {
            if let Some(name) = &screen.active_group {
                if self.registry.get(name).is_err() {
                    violations.push(StateViolation {
                        kind: ViolationKind::MissingActiveGroup,
                        description: format!("screen displays unknown group '{}'", name),
                    });
                }
            }
        }

        violations
    }

    /// Snapshot the full state for the harness.
    pub fn snapshot(&self) -> EngineSnapshot {
        let groups = self
            .registry
            .iter()
            .map(|g| GroupSnapshot {
                name: g.name().to_string(),
                label: g.label.clone(),
                layout: self
                    .config
                    .layouts
                    .get(g.layout)
                    .map(|l| l.kind().to_string())
                    .unwrap_or_default(),
                members: g.members().to_vec(),
                focused: g.focused_window(),
            })
            .collect();
        let windows = self
            .windows
            .iter()
            .map(|(&id, w)| WindowSnapshot {
                id,
                class: w.class.clone(),
                title: w.title.clone(),
                floating: w.floating,
                group: w.group.clone(),
                geometry: Some(w.geometry.into()),
            })
            .collect();
        EngineSnapshot {
            focused_window: self.focused_window(),
            active_group: self.active_group_name(),
            window_count: self.windows.len(),
            group_count: self.registry.len(),
            groups,
            windows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_screen() -> Engine {
        let mut engine = Engine::new(Config::default(), None);
        engine.handle_event(Event::ScreenSetChanged {
            screens: vec![Rect::new(0, 0, 1920, 1080)],
        });
        engine
    }

    fn map(engine: &mut Engine, id: WindowId, class: &str) -> Vec<Command> {
        engine.handle_event(Event::WindowMapped {
            id,
            class: class.to_string(),
            title: String::new(),
        })
    }

    #[test]
    fn test_map_places_and_focuses() {
        let mut engine = engine_with_screen();
        let commands = map(&mut engine, 1, "kitty");
        assert!(commands
            .iter()
            .any(|c| matches!(c, Command::PlaceWindow { id: 1, .. })));
        assert!(commands.contains(&Command::FocusWindow { id: 1 }));
        assert_eq!(engine.focused_window(), Some(1));
        assert!(engine.validate().is_empty());
    }

    #[test]
    fn test_map_before_screens_is_safe() {
        let mut engine = Engine::new(Config::default(), None);
        // no screens yet: the window still lands in a group, no placement
        let commands = map(&mut engine, 1, "kitty");
        assert!(commands.is_empty());
        assert!(engine.window(1).is_some());
        assert!(engine.validate().is_empty());
    }

    #[test]
    fn test_stale_unmap_is_noop() {
        let mut engine = engine_with_screen();
        let commands = engine.handle_event(Event::WindowUnmapped { id: 99 });
        assert!(commands.is_empty());
    }

    #[test]
    fn test_float_rule_classifies_on_map() {
        let mut engine = engine_with_screen();
        map(&mut engine, 1, "ssh-askpass");
        let win = engine.window(1).unwrap();
        assert!(win.floating);
        // floaters get a centered default geometry, not a tile
        assert!(win.geometry.width <= 800);
        assert!(engine.validate().is_empty());
    }

    #[test]
    fn test_configure_request_honored_for_floating_only() {
        let mut engine = engine_with_screen();
        map(&mut engine, 1, "ssh-askpass");
        map(&mut engine, 2, "kitty");

        let req = Rect::new(100, 100, 400, 300);
        let commands = engine.handle_event(Event::ConfigureRequested { id: 1, rect: req });
        assert_eq!(commands, vec![Command::PlaceWindow { id: 1, rect: req }]);

        // the tiled window's request is overridden by the layout
        let commands = engine.handle_event(Event::ConfigureRequested { id: 2, rect: req });
        let placed = commands.iter().find_map(|c| match c {
            Command::PlaceWindow { id: 2, rect } => Some(*rect),
            _ => None,
        });
        assert!(placed.is_some());
        assert_ne!(placed.unwrap(), req);
    }

    #[test]
    fn test_property_change_refreshes_metadata() {
        let mut engine = engine_with_screen();
        map(&mut engine, 1, "kitty");
        engine.handle_event(Event::WindowPropertyChanged {
            id: 1,
            class: None,
            title: Some("vim".to_string()),
        });
        assert_eq!(engine.window(1).unwrap().title, "vim");
        assert_eq!(engine.window(1).unwrap().class, "kitty");
    }

    #[test]
    fn test_spawn_binding_emits_argv() {
        let mut engine = engine_with_screen();
        let commands = engine.handle_event(Event::KeyPressed {
            modifiers: vec!["mod4".to_string()],
            key: "Return".to_string(),
        });
        assert_eq!(
            commands,
            vec![Command::SpawnProcess { argv: vec!["kitty".to_string()] }]
        );
    }

    #[test]
    fn test_shutdown_action() {
        let mut engine = engine_with_screen();
        let commands = engine.handle_event(Event::KeyPressed {
            modifiers: vec!["mod4".to_string(), "shift".to_string()],
            key: "q".to_string(),
        });
        assert_eq!(commands, vec![Command::Shutdown]);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_close_window_asks_compositor() {
        let mut engine = engine_with_screen();
        map(&mut engine, 1, "kitty");
        let commands = engine.handle_event(Event::KeyPressed {
            modifiers: vec!["mod4".to_string(), "shift".to_string()],
            key: "c".to_string(),
        });
        assert_eq!(commands, vec![Command::CloseWindow { id: 1 }]);
        // the window stays managed until the compositor reports the unmap
        assert!(engine.window(1).is_some());
    }

    #[test]
    fn test_unbound_key_produces_nothing() {
        let mut engine = engine_with_screen();
        let commands = engine.handle_event(Event::KeyPressed {
            modifiers: vec![],
            key: "a".to_string(),
        });
        assert!(commands.is_empty());
    }

    #[test]
    fn test_toggle_fullscreen_covers_screen() {
        let mut engine = engine_with_screen();
        map(&mut engine, 1, "kitty");
        map(&mut engine, 2, "kitty");
        let commands = engine.handle_event(Event::KeyPressed {
            modifiers: vec!["mod4".to_string(), "shift".to_string()],
            key: "Return".to_string(),
        });
        let placed = commands.iter().find_map(|c| match c {
            Command::PlaceWindow { id, rect } if *id == 2 => Some(*rect),
            _ => None,
        });
        // the fullscreen window covers the whole screen, bar included
        assert_eq!(placed.unwrap(), Rect::new(0, 0, 1920, 1080));
        assert!(commands.contains(&Command::RaiseWindow { id: 2 }));
    }

    #[test]
    fn test_snapshot_counts() {
        let mut engine = engine_with_screen();
        map(&mut engine, 1, "kitty");
        map(&mut engine, 2, "firefox");
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.window_count, 2);
        assert_eq!(snapshot.group_count, 9);
        assert_eq!(snapshot.active_group.as_deref(), Some("1"));
        assert_eq!(snapshot.focused_window, Some(2));
    }
}

//! Keybinding table and command dispatcher.
//!
//! Bindings are declared in configuration, compiled once into an immutable
//! `KeyTable` snapshot, and dispatched with an O(1) lookup on
//! (modifier mask, key symbol). Runtime reload builds a fresh snapshot and
//! swaps it in; the table is never mutated during dispatch.
//!
//! The dispatcher is a two-state machine:
//!
//! ```text
//!              prefix key
//!   ┌──────┐ ─────────────► ┌───────┐
//!   │ Root │                │ Chord │──┐ unbound key
//!   └──────┘ ◄───────────── └───────┘ ◄┘ (non-strict: stay)
//!     bound key fired (single-shot) /
//!     Escape / timeout / strict unbound
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::Direction;

// Modifier masks
pub const SHIFT_MASK: u16 = 1;
pub const CONTROL_MASK: u16 = 4;
pub const ALT_MASK: u16 = 8;
pub const SUPER_MASK: u16 = 64;

/// Parse modifier names ("mod4", "shift", ...) into a mask. Unknown names
/// are logged and skipped.
pub fn parse_modifiers(names: &[String]) -> u16 {
    let mut mask = 0;
    for name in names {
        match name.to_lowercase().as_str() {
            "mod4" | "super" | "win" => mask |= SUPER_MASK,
            "shift" => mask |= SHIFT_MASK,
            "control" | "ctrl" => mask |= CONTROL_MASK,
            "mod1" | "alt" => mask |= ALT_MASK,
            other => {
                log::warn!("Unknown modifier: {}", other);
            }
        }
    }
    mask
}

/// Normalize a key symbol for table lookup.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}

/// A bound command. Pure data: dispatch resolves these in a single match,
/// no closures capture engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Spawn { command: String },
    /// Spawn the configured terminal emulator
    SpawnTerminal,
    Focus { direction: Direction },
    Shuffle { direction: Direction },
    Grow { direction: Direction },
    NextFocus,
    Normalize,
    NextLayout,
    ToGroup {
        group: String,
        #[serde(default)]
        switch: bool,
    },
    ToScreen { group: String },
    ToggleFloating,
    ToggleFullscreen,
    CloseWindow,
    ReloadConfig,
    Shutdown,
    Chord {
        name: String,
        bindings: Vec<BindingSpec>,
        #[serde(default)]
        persistent: bool,
    },
}

/// One keybinding as declared in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSpec {
    #[serde(default)]
    pub modifiers: Vec<String>,
    pub key: String,
    pub action: Action,
}

impl BindingSpec {
    pub fn new(modifiers: &[&str], key: &str, action: Action) -> Self {
        Self {
            modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
            key: key.to_string(),
            action,
        }
    }
}

/// Lookup key: modifier mask + normalized key symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub mods: u16,
    pub key: String,
}

impl KeyCombo {
    pub fn new(mods: u16, key: &str) -> Self {
        Self { mods, key: normalize_key(key) }
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Action(Action),
    Chord(usize),
}

#[derive(Debug)]
struct ChordTable {
    name: String,
    persistent: bool,
    bindings: HashMap<KeyCombo, Entry>,
}

/// Immutable keybinding snapshot.
#[derive(Debug)]
pub struct KeyTable {
    root: HashMap<KeyCombo, Entry>,
    chords: Vec<ChordTable>,
}

impl KeyTable {
    pub fn builder() -> KeyTableBuilder {
        KeyTableBuilder::default()
    }

    /// Compile configured bindings into a snapshot.
    pub fn from_bindings(specs: &[BindingSpec]) -> Arc<KeyTable> {
        let mut builder = Self::builder();
        for spec in specs {
            builder.bind(spec.clone());
        }
        builder.build()
    }

    pub fn root_len(&self) -> usize {
        self.root.len()
    }
}

/// Builds a `KeyTable`; the product is frozen behind an `Arc`.
#[derive(Debug, Default)]
pub struct KeyTableBuilder {
    root: HashMap<KeyCombo, Entry>,
    chords: Vec<ChordTable>,
}

impl KeyTableBuilder {
    pub fn bind(&mut self, spec: BindingSpec) -> &mut Self {
        let combo = KeyCombo::new(parse_modifiers(&spec.modifiers), &spec.key);
        let entry = self.compile(spec.action);
        if self.root.insert(combo.clone(), entry).is_some() {
            log::warn!("Duplicate binding for {:?}, later declaration wins", combo);
        }
        self
    }

    fn compile(&mut self, action: Action) -> Entry {
        match action {
            Action::Chord { name, bindings, persistent } => {
                let mut table = HashMap::new();
                for child in bindings {
                    let combo = KeyCombo::new(parse_modifiers(&child.modifiers), &child.key);
                    let entry = self.compile(child.action);
                    table.insert(combo, entry);
                }
                self.chords.push(ChordTable {
                    name,
                    persistent,
                    bindings: table,
                });
                Entry::Chord(self.chords.len() - 1)
            }
            other => Entry::Action(other),
        }
    }

    pub fn build(self) -> Arc<KeyTable> {
        Arc::new(KeyTable {
            root: self.root,
            chords: self.chords,
        })
    }
}

/// Result of feeding one key press to the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// A bound action fired; dispatcher mode already advanced
    Invoke(Action),
    /// A chord prefix matched; now in chord mode
    EnteredChord(String),
    /// Chord mode ended without an action (cancel, strict miss, timeout)
    ExitedChord,
    /// Root-mode key with no binding: pass through to the client
    Unbound,
    /// Chord-mode key with no binding under the non-strict policy
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Root,
    Chord(usize),
}

/// Dispatches key presses against the current table snapshot.
pub struct Dispatcher {
    table: Arc<KeyTable>,
    mode: Mode,
    strict: bool,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(table: Arc<KeyTable>, strict: bool, timeout: Option<Duration>) -> Self {
        Self {
            table,
            mode: Mode::Root,
            strict,
            timeout,
        }
    }

    /// Swap in a freshly built table (config reload). Always drops back to
    /// root mode; a live chord referencing the old table would dangle.
    pub fn replace_table(&mut self, table: Arc<KeyTable>, strict: bool, timeout: Option<Duration>) {
        self.table = table;
        self.strict = strict;
        self.timeout = timeout;
        self.mode = Mode::Root;
    }

    pub fn in_chord(&self) -> bool {
        matches!(self.mode, Mode::Chord(_))
    }

    /// The configured chord timeout, reported only while a chord is open.
    /// The caller owns the single pending timer and feeds expiry back via
    /// `on_timeout`.
    pub fn pending_timeout(&self) -> Option<Duration> {
        match self.mode {
            Mode::Chord(_) => self.timeout,
            Mode::Root => None,
        }
    }

    /// Close the chord on timer expiry. Returns whether a chord was open.
    pub fn on_timeout(&mut self) -> bool {
        if self.in_chord() {
            self.mode = Mode::Root;
            true
        } else {
            false
        }
    }

    pub fn dispatch(&mut self, mods: u16, key: &str) -> Dispatch {
        let combo = KeyCombo::new(mods, key);
        match self.mode {
            Mode::Root => match self.table.root.get(&combo).cloned() {
                Some(Entry::Action(action)) => Dispatch::Invoke(action),
                Some(Entry::Chord(idx)) => {
                    self.mode = Mode::Chord(idx);
                    Dispatch::EnteredChord(self.table.chords[idx].name.clone())
                }
                None => Dispatch::Unbound,
            },
            Mode::Chord(idx) => {
                if combo.mods == 0 && combo.key == "escape" {
                    self.mode = Mode::Root;
                    return Dispatch::ExitedChord;
                }
                let chord = &self.table.chords[idx];
                match chord.bindings.get(&combo).cloned() {
                    Some(Entry::Action(action)) => {
                        if !chord.persistent {
                            self.mode = Mode::Root;
                        }
                        Dispatch::Invoke(action)
                    }
                    Some(Entry::Chord(next)) => {
                        self.mode = Mode::Chord(next);
                        Dispatch::EnteredChord(self.table.chords[next].name.clone())
                    }
                    None => {
                        if self.strict {
                            self.mode = Mode::Root;
                            Dispatch::ExitedChord
                        } else {
                            Dispatch::Ignored
                        }
                    }
                }
            }
        }
    }
}

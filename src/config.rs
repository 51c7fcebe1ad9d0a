//! Configuration file support.
//!
//! Loads settings from ~/.config/tilecore/config.toml if it exists,
//! otherwise uses the built-in defaults. A parse failure falls back to
//! defaults with a warning rather than refusing to start.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::{ColumnsParams, LayoutParams, MaxParams};
use crate::keys::{Action, BindingSpec};
use crate::rules::FloatRule;

/// Top-level configuration
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub groups: Vec<GroupConfig>,
    pub layouts: Vec<LayoutParams>,
    pub keybindings: Vec<BindingSpec>,
    pub float_rules: Vec<FloatRule>,
    pub bar: BarConfig,
}

/// General settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Command spawned by the terminal binding
    pub terminal: String,
    /// Close chord mode on an unbound key instead of staying in it
    pub chord_strict: bool,
    /// Auto-exit chord mode after this many milliseconds (unset: no timeout)
    pub chord_timeout_ms: Option<u64>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            terminal: "kitty".to_string(),
            chord_strict: false,
            chord_timeout_ms: None,
        }
    }
}

/// One named group (workspace)
#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Layout kind this group starts in ("columns", "max")
    #[serde(default = "default_group_layout")]
    pub layout: String,
}

fn default_group_layout() -> String {
    "columns".to_string()
}

impl GroupConfig {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Status bar settings. The widget list is carried on each screen for the
/// bar renderer; this core does not draw it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BarConfig {
    pub position: BarPosition,
    pub size: u32,
    pub widgets: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarPosition {
    Top,
    Bottom,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            position: BarPosition::Top,
            size: 32,
            widgets: [
                "group_box",
                "prompt",
                "spacer",
                "chord",
                "disk",
                "cpu_graph",
                "cpu",
                "memory",
                "systray",
                "volume",
                "clock",
                "current_layout",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            groups: default_groups(),
            layouts: default_layouts(),
            keybindings: default_keybindings(),
            float_rules: default_float_rules(),
            bar: BarConfig::default(),
        }
    }
}

fn default_groups() -> Vec<GroupConfig> {
    let labels = [
        "WWW", "CHAT", "GAME LAUNCHER", "GAME", "DEV", "ELSE1", "ELSE2", "ELSE3", "AWAY",
    ];
    labels
        .iter()
        .enumerate()
        .map(|(i, &label)| GroupConfig {
            name: (i + 1).to_string(),
            label: Some(label.to_string()),
            layout: if i == 1 { "max" } else { "columns" }.to_string(),
        })
        .collect()
}

fn default_layouts() -> Vec<LayoutParams> {
    vec![
        LayoutParams::Columns(ColumnsParams::default()),
        LayoutParams::Max(MaxParams::default()),
    ]
}

fn default_float_rules() -> Vec<FloatRule> {
    vec![
        FloatRule::class("confirmreset"),
        FloatRule::class("makebranch"),
        FloatRule::class("maketag"),
        FloatRule::class("ssh-askpass"),
        FloatRule::title("branchdialog"),
        FloatRule::title("pinentry"),
    ]
}

fn default_keybindings() -> Vec<BindingSpec> {
    use crate::geometry::Direction::*;

    let mut bindings = vec![
        // focus movement
        BindingSpec::new(&["mod4"], "b", Action::Focus { direction: Left }),
        BindingSpec::new(&["mod4"], "f", Action::Focus { direction: Right }),
        BindingSpec::new(&["mod4"], "n", Action::Focus { direction: Down }),
        BindingSpec::new(&["mod4"], "p", Action::Focus { direction: Up }),
        // move windows between columns or within the stack
        BindingSpec::new(&["mod4", "shift"], "b", Action::Shuffle { direction: Left }),
        BindingSpec::new(&["mod4", "shift"], "f", Action::Shuffle { direction: Right }),
        BindingSpec::new(&["mod4", "shift"], "n", Action::Shuffle { direction: Down }),
        BindingSpec::new(&["mod4", "shift"], "p", Action::Shuffle { direction: Up }),
        // grow windows; at a screen edge the window shrinks instead
        BindingSpec::new(&["mod4", "control"], "b", Action::Grow { direction: Left }),
        BindingSpec::new(&["mod4", "control"], "f", Action::Grow { direction: Right }),
        BindingSpec::new(&["mod4", "control"], "n", Action::Grow { direction: Down }),
        BindingSpec::new(&["mod4", "control"], "p", Action::Grow { direction: Up }),
        BindingSpec::new(&["mod4"], "space", Action::NextFocus),
        BindingSpec::new(&["mod4"], "e", Action::Normalize),
        BindingSpec::new(&["mod4"], "Return", Action::SpawnTerminal),
        BindingSpec::new(&["mod4"], "Tab", Action::NextLayout),
        BindingSpec::new(&["mod4", "shift"], "c", Action::CloseWindow),
        BindingSpec::new(&["mod4", "shift"], "Return", Action::ToggleFullscreen),
        BindingSpec::new(&["mod4"], "t", Action::ToggleFloating),
        BindingSpec::new(&["mod4", "shift"], "r", Action::ReloadConfig),
        BindingSpec::new(&["mod4", "shift"], "q", Action::Shutdown),
        BindingSpec::new(
            &["mod4"],
            "w",
            Action::Chord {
                name: "launch".to_string(),
                bindings: vec![BindingSpec::new(
                    &["mod4"],
                    "w",
                    Action::Spawn { command: "emacsclient -c".to_string() },
                )],
                persistent: false,
            },
        ),
    ];

    // per-group bindings: switch to, move window to, move window and follow
    for i in 1..=9u32 {
        let name = i.to_string();
        bindings.push(BindingSpec::new(
            &["mod4"],
            &name,
            Action::ToScreen { group: name.clone() },
        ));
        bindings.push(BindingSpec::new(
            &["mod4", "shift"],
            &name,
            Action::ToGroup { group: name.clone(), switch: false },
        ));
        bindings.push(BindingSpec::new(
            &["mod4", "control", "shift"],
            &name,
            Action::ToGroup { group: name.clone(), switch: true },
        ));
    }

    bindings
}

impl Config {
    /// Load config from the default path (~/.config/tilecore/config.toml)
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    /// Default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tilecore")
            .join("config.toml")
    }

    /// Load config from a specific path
    pub fn load_from_path(path: PathBuf) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse config: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    /// Index of the layout with the given kind in the layout list.
    pub fn layout_index(&self, kind: &str) -> Option<usize> {
        self.layouts.iter().position(|l| l.kind() == kind)
    }

    pub fn chord_timeout(&self) -> Option<Duration> {
        self.general.chord_timeout_ms.map(Duration::from_millis)
    }

    /// Sanity-check the configuration. Returns human-readable issues; an
    /// empty list means the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.groups.is_empty() {
            issues.push("no groups configured".to_string());
        }
        if self.layouts.is_empty() {
            issues.push("no layouts configured".to_string());
        }
        for (i, group) in self.groups.iter().enumerate() {
            if self.groups[..i].iter().any(|g| g.name == group.name) {
                issues.push(format!("duplicate group name '{}'", group.name));
            }
            if self.layout_index(&group.layout).is_none() {
                issues.push(format!(
                    "group '{}' wants unknown layout '{}'",
                    group.name, group.layout
                ));
            }
        }
        for rule in &self.float_rules {
            if rule.pattern.is_empty() {
                issues.push("float rule with empty pattern".to_string());
            }
        }
        if self.general.chord_timeout_ms == Some(0) {
            issues.push("chord_timeout_ms must be greater than zero".to_string());
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::InsertPosition;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.groups.len(), 9);
        assert_eq!(config.groups[0].label(), "WWW");
        assert_eq!(config.groups[1].layout, "max");
        assert_eq!(config.groups[4].layout, "columns");
    }

    #[test]
    fn test_default_layouts_mirror_columns_then_max() {
        let config = Config::default();
        assert_eq!(config.layout_index("columns"), Some(0));
        assert_eq!(config.layout_index("max"), Some(1));
        match &config.layouts[0] {
            LayoutParams::Columns(p) => {
                assert_eq!(p.margin, 8);
                assert_eq!(p.border_width, 4);
                assert_eq!(p.grow_amount, 1);
                assert_eq!(p.insert_position, InsertPosition::Top);
            }
            other => panic!("expected columns first, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[general]
terminal = "alacritty"
chord_strict = true
chord_timeout_ms = 750

[[groups]]
name = "web"
label = "WWW"
layout = "max"

[[groups]]
name = "dev"

[[layouts]]
kind = "columns"
num_columns = 2
margin = 0
border_width = 1
grow_amount = 5
ratio = 0.6
insert_position = "bottom"

[[layouts]]
kind = "max"
margin = 0
border_width = 0

[[keybindings]]
modifiers = ["mod4"]
key = "j"
action = { focus = { direction = "down" } }

[[float_rules]]
match_field = "title"
pattern = "pinentry"

[bar]
position = "bottom"
size = 24
widgets = ["group_box", "clock"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.general.terminal, "alacritty");
        assert!(config.general.chord_strict);
        assert_eq!(config.chord_timeout(), Some(Duration::from_millis(750)));
        assert_eq!(config.groups.len(), 2);
        assert_eq!(config.groups[1].label(), "dev");
        assert_eq!(config.groups[1].layout, "columns");
        assert_eq!(config.keybindings.len(), 1);
        assert_eq!(config.bar.position, BarPosition::Bottom);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_catches_duplicate_groups() {
        let toml = r#"
[[groups]]
name = "1"
[[groups]]
name = "1"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let issues = config.validate();
        assert!(issues.iter().any(|i| i.contains("duplicate group name")));
    }

    #[test]
    fn test_validate_catches_unknown_layout() {
        let toml = r#"
[[groups]]
name = "1"
layout = "spiral"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let issues = config.validate();
        assert!(issues.iter().any(|i| i.contains("unknown layout 'spiral'")));
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let config = Config::load_from_path(PathBuf::from("/nonexistent/tilecore.toml"));
        assert_eq!(config.groups.len(), 9);
    }

    #[test]
    fn test_default_keybindings_cover_groups_and_chord() {
        let config = Config::default();
        let chords = config
            .keybindings
            .iter()
            .filter(|b| matches!(b.action, Action::Chord { .. }))
            .count();
        assert_eq!(chords, 1);
        let group_switches = config
            .keybindings
            .iter()
            .filter(|b| matches!(b.action, Action::ToScreen { .. }))
            .count();
        assert_eq!(group_switches, 9);
    }
}

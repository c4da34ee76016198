//! Settings persistence using TOML
//!
//! Stores settings in ~/.config/tetronimo/settings.toml (or platform equivalent)

use crate::level::LevelMap;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine the config directory")]
    NoConfigDir,
    #[error("failed to write settings to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize settings")]
    Serialize(#[from] toml::ser::Error),
}

/// Game settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Keybindings
    pub keys: KeyBindingNames,
    /// Timing and scoring
    pub gameplay: GameplaySettings,
    /// Container layout
    pub board: BoardSettings,
}

/// Key bindings (stored as strings for easy editing)
/// Each control can have one or more keys bound to it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindingNames {
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_left: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_right: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub soft_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub hard_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub hold: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub restart: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub quit: Vec<String>,
}

/// Deserialize keys as either a single string or array of strings
fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct KeysVisitor;

    impl<'de> Visitor<'de> for KeysVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or array of strings")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut keys = Vec::new();
            while let Some(key) = seq.next_element::<String>()? {
                keys.push(key);
            }
            Ok(keys)
        }
    }

    deserializer.deserialize_any(KeysVisitor)
}

/// Serialize keys: single key as string, multiple as array
fn serialize_keys<S>(keys: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;

    if let [key] = keys {
        serializer.serialize_str(key)
    } else {
        let mut seq = serializer.serialize_seq(Some(keys.len()))?;
        for key in keys {
            seq.serialize_element(key)?;
        }
        seq.end()
    }
}

/// Timing and scoring knobs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameplaySettings {
    /// Simulation ticks per second
    pub frame_rate: u32,
    /// Frames between lateral auto-repeat steps (also the initial delay)
    pub lateral_delay_frames: u32,
    /// Starting gravity period in milliseconds
    pub fall_period_ms: f64,
    /// Fastest gravity period, also used while soft dropping
    pub min_period_ms: f64,
    /// Gravity period decrement per speed-up
    pub period_step_ms: f64,
    /// Cleared rows per speed-up
    pub rows_per_speedup: u32,
    /// How long full rows flash before they are removed
    pub row_clear_ms: f64,
    /// One grey/colour flash cycle
    pub flash_period_ms: f64,
    /// Filler rows generated per tick after a top-out
    pub fill_rows_per_tick: u32,
    pub points_per_row: u64,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            lateral_delay_frames: 8,
            fall_period_ms: 1000.0,
            min_period_ms: 50.0,
            period_step_ms: 50.0,
            rows_per_speedup: 4,
            row_clear_ms: 500.0,
            flash_period_ms: 250.0,
            fill_rows_per_tick: 2,
            points_per_row: 40,
        }
    }
}

/// Container layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoardSettings {
    /// World position of the layout's top-left tile corner
    pub origin_x: i32,
    pub origin_y: i32,
    /// Wall layout text (`#` wall, `.` empty). Uses the classic 10x24 well when unset.
    pub layout: Option<String>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            origin_x: 128,
            origin_y: 16,
            layout: None,
        }
    }
}

impl BoardSettings {
    pub fn level(&self) -> LevelMap {
        let text = self.layout.as_deref().unwrap_or(crate::level::CLASSIC_LAYOUT);
        LevelMap::parse(text, (self.origin_x, self.origin_y))
    }
}

impl Default for KeyBindingNames {
    fn default() -> Self {
        Self {
            move_left: vec!["Left".to_string()],
            move_right: vec!["Right".to_string()],
            soft_drop: vec!["Down".to_string()],
            rotate: vec!["Up".to_string(), "x".to_string()],
            hard_drop: vec!["Space".to_string(), "z".to_string()],
            hold: vec!["c".to_string(), "Shift".to_string()],
            restart: vec!["r".to_string(), "Enter".to_string()],
            quit: vec!["q".to_string(), "Esc".to_string()],
        }
    }
}

impl Settings {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "tired-of-tetris", "tetronimo")
    }

    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Directory for persistent game data such as the high score
    pub fn data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.toml"))
    }

    /// Load settings from file, or create default
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };

        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(_) => Self::default(),
        }
    }

    /// Parse settings text, falling back to defaults when it doesn't parse
    pub fn from_toml(contents: &str) -> Self {
        match toml::from_str(contents) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Invalid settings file, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Save settings to file
    pub fn save(&self) -> Result<(), SettingsError> {
        let dir = Self::config_dir().ok_or(SettingsError::NoConfigDir)?;
        let path = dir.join("settings.toml");

        fs::create_dir_all(&dir).map_err(|source| SettingsError::Write {
            path: dir.clone(),
            source,
        })?;

        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents).map_err(|source| SettingsError::Write { path, source })?;

        Ok(())
    }
}

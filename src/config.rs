//! Configuration for floatwm
//!
//! Loads configuration from a JSON file at `~/.config/floatwm/config.json`.
//! Auto-generates the default document on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const APP_NAME: &str = "floatwm";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub commands: CommandsConfig,
}

impl Config {
    /// Load configuration from the default location, writing the built-in
    /// document there first if no file exists yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from `path`, persisting the defaults when missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found at {:?}, writing defaults", path);
            Self::save_default(path)?;
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        info!("Configuration loaded from {:?}", path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Directory holding the config document and the log file.
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Failed to get config directory")?
            .join(APP_NAME))
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let json = serde_json::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, json).context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub window: WindowConfig,
}

/// Decoration and taskbar appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub frame: FrameConfig,
    pub taskbar: TaskbarConfig,
    pub minimize: ButtonColor,
    pub maximize: ButtonColor,
    pub close: ButtonColor,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            taskbar: TaskbarConfig::default(),
            minimize: ButtonColor::new("#FFBD44"),
            maximize: ButtonColor::new("#00CA4E"),
            close: ButtonColor::new("#FF605C"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Border around the client, also the size of the decoration buttons
    pub border_width: u32,
    pub active_background_color: String,
    pub passive_background_color: String,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            border_width: 10,
            active_background_color: "green".to_string(),
            passive_background_color: "lightblue".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskbarConfig {
    pub height: u32,
    pub button_border_width: u32,
    pub background_color: String,
    pub button_active_background_color: String,
    pub button_active_font_color: String,
    pub button_passive_background_color: String,
    pub button_passive_font_color: String,
}

impl Default for TaskbarConfig {
    fn default() -> Self {
        Self {
            height: 30,
            button_border_width: 2,
            background_color: "lightblue".to_string(),
            button_active_background_color: "white".to_string(),
            button_active_font_color: "black".to_string(),
            button_passive_background_color: "black".to_string(),
            button_passive_font_color: "green".to_string(),
        }
    }
}

/// Color of one decoration button (`#RRGGBB` or an X11 color name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonColor {
    pub color: String,
}

impl ButtonColor {
    pub fn new(color: &str) -> Self {
        Self { color: color.to_string() }
    }
}

/// External programs started by the keyboard shortcuts, as argv lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    pub terminal: Vec<String>,
    pub filemanager: Vec<String>,
    pub launcher: Vec<String>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            terminal: vec!["kitty".to_string()],
            filemanager: vec!["kitty".to_string(), "lf".to_string()],
            launcher: vec!["dmenu_run".to_string()],
        }
    }
}

//! Configuration system for Chisai
//!
//! Compiled defaults, optionally overridden by `~/.config/chisai/config.toml`.
//! Auto-generates the default config file on first run if missing. Loaded
//! once at startup and never re-read.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Environment variable pointing at an alternative rc-script
pub const RC_ENV: &str = "CHISAI_RC";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Border width in pixels, 0 for no border
    pub border_width: u16,
    /// Side the border is drawn on
    pub border_side: BorderSide,
    /// Border color of the focused window
    pub focus_color: Color,
    /// Border color of every other window
    pub unfocus_color: Color,
    /// Number of workspaces
    pub workspaces: u32,
    /// Focus windows when the pointer enters them
    pub sloppy_focus: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            border_width: 5,
            border_side: BorderSide::All,
            focus_color: Color(0x97a293),
            unfocus_color: Color(0x393638),
            workspaces: 4,
            sloppy_focus: false,
        }
    }
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            if let Err(e) = Self::save_default(&config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        let config = Self::load_from(&config_path)?;
        info!("Configuration loaded from {:?}", config_path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Load and validate a config file at an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.workspaces == 0 {
            bail!("workspaces must be at least 1");
        }
        Ok(())
    }

    fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Failed to get config directory")?
            .join("chisai"))
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Path of the rc-script: `$CHISAI_RC`, else `~/.config/chisai/chisairc`
    pub fn rc_path() -> Option<PathBuf> {
        match std::env::var_os(RC_ENV) {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => Self::config_dir().ok().map(|dir| dir.join("chisairc")),
        }
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string).context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Start the rc-script, if there is one. The script typically drives
/// `maikuro`, so this runs after the command socket is bound.
pub fn spawn_rc_script() {
    let Some(path) = Config::rc_path() else {
        return;
    };
    if !path.is_file() {
        debug!("No rc-script at {:?}", path);
        return;
    }

    info!("Running rc-script {:?}", path);
    // Dropped handles are reaped by the runtime
    if let Err(e) = tokio::process::Command::new(&path).spawn() {
        warn!("Failed to run rc-script {:?}: {}", path, e);
    }
}

/// Sides a border may be drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderSide {
    Top,
    Bottom,
    Right,
    Left,
    All,
}

// ============================================================================
// Colors
// ============================================================================

/// Border color, resolved from `#RRGGBB` to a 24-bit pixel value on load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub u32);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("color `{0}` must start with `#`")]
    MissingHash(String),

    #[error("color `{0}` must have exactly six hex digits")]
    BadLength(String),

    #[error("color `{0}` is not valid hex")]
    BadDigit(String),
}

impl Color {
    pub fn pixel(self) -> u32 {
        self.0
    }

    pub fn parse(s: &str) -> Result<Self, ColorError> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| ColorError::MissingHash(s.to_string()))?;
        if hex.len() != 6 {
            return Err(ColorError::BadLength(s.to_string()));
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorError::BadDigit(s.to_string()));
        }
        u32::from_str_radix(hex, 16)
            .map(Color)
            .map_err(|_| ColorError::BadDigit(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::parse(&s)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

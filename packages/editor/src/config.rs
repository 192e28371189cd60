use crate::errors::EditorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Editor behaviour settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of undo levels
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,

    /// Typing within this many milliseconds merges into one undo entry
    #[serde(default = "default_coalesce_window_ms")]
    pub coalesce_window_ms: u64,

    #[serde(default)]
    pub resize: ResizeConfig,

    #[serde(default)]
    pub palette: PaletteConfig,
}

/// Image resize bounds, in pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeConfig {
    #[serde(default = "default_min_width")]
    pub min_width: f64,

    #[serde(default = "default_max_width")]
    pub max_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteConfig {
    /// Character that opens the palette
    #[serde(default = "default_trigger")]
    pub trigger: char,

    /// Height reserved for the menu when deciding whether to flip it
    #[serde(default = "default_menu_height")]
    pub menu_height: f64,

    /// Gap between the caret and the menu
    #[serde(default = "default_menu_offset")]
    pub offset: f64,
}

fn default_history_depth() -> usize {
    100
}

fn default_coalesce_window_ms() -> u64 {
    500
}

fn default_min_width() -> f64 {
    100.0
}

fn default_max_width() -> f64 {
    1200.0
}

fn default_trigger() -> char {
    '/'
}

fn default_menu_height() -> f64 {
    320.0
}

fn default_menu_offset() -> f64 {
    8.0
}

impl EditorConfig {
    /// Parse a config from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EditorError> {
        self.resize.validate()
    }

    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: default_history_depth(),
            coalesce_window_ms: default_coalesce_window_ms(),
            resize: ResizeConfig::default(),
            palette: PaletteConfig::default(),
        }
    }
}

impl ResizeConfig {
    /// Bounds must be finite, positive and ordered
    pub fn validate(&self) -> Result<(), EditorError> {
        let Self { min_width, max_width } = *self;
        if !(min_width.is_finite() && max_width.is_finite()) || min_width <= 0.0 {
            return Err(EditorError::InvalidConfig(format!(
                "resize bounds must be positive numbers, got {min_width}..{max_width}"
            )));
        }
        if min_width > max_width {
            return Err(EditorError::InvalidConfig(format!(
                "resize.minWidth ({min_width}) is greater than resize.maxWidth ({max_width})"
            )));
        }
        Ok(())
    }
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            min_width: default_min_width(),
            max_width: default_max_width(),
        }
    }
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            trigger: default_trigger(),
            menu_height: default_menu_height(),
            offset: default_menu_offset(),
        }
    }
}

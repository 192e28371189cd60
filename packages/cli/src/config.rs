use quire_editor::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "quire.config.json";

/// Quire configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding the documents
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// Extension of document files, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Settings handed to the editor
    #[serde(default)]
    pub editor: EditorConfig,
}

fn default_content_dir() -> String {
    "content".to_string()
}

fn default_extension() -> String {
    "quire".to_string()
}

impl Config {
    /// Load config from a directory, or the defaults when there is none
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.editor.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn get_content_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.content_dir)
    }

    pub fn is_document(&self, path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == self.extension.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            extension: default_extension(),
            editor: EditorConfig::default(),
        }
    }
}

//! Configuration loading and parsing for fieldtrace
//!
//! Provides functionality to load and parse `fieldtrace.toml` configuration
//! files controlling marker tokens, member-path extraction, and import
//! resolution.

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "fieldtrace.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Comment token marking the following declaration as a tracking root.
    pub marker: String,
    /// Comment token prefix naming a specific binding (`track_variable=name`).
    pub named_marker: String,
    /// Property names that terminate member-path extraction.
    pub reserved_properties: Vec<String>,
    /// Member names treated as higher-order array-iteration calls.
    pub iteration_methods: Vec<String>,
    /// Import specifier prefix resolved against the session base directory.
    pub alias_prefix: String,
    /// Extensions probed for extensionless import specifiers, in order.
    pub extensions: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            marker: "track_this_variable".to_string(),
            named_marker: "track_variable".to_string(),
            reserved_properties: vec!["length".to_string()],
            iteration_methods: vec![
                "map".to_string(),
                "flatMap".to_string(),
                "filter".to_string(),
                "forEach".to_string(),
            ],
            alias_prefix: "@/".to_string(),
            extensions: vec![
                "ts".to_string(),
                "tsx".to_string(),
                "js".to_string(),
                "jsx".to_string(),
            ],
        }
    }
}

impl TrackerConfig {
    pub fn is_reserved_property(&self, name: &str) -> bool {
        self.reserved_properties.iter().any(|p| p == name)
    }

    pub fn is_iteration_method(&self, name: &str) -> bool {
        self.iteration_methods.iter().any(|m| m == name)
    }
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn load_config(path: &Path) -> Result<TrackerConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

pub fn load_config_or_default(start_dir: &Path) -> TrackerConfig {
    find_config_file(start_dir)
        .and_then(|path| load_config(&path).ok())
        .unwrap_or_default()
}

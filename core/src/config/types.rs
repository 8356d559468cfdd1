use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::query::Viewport;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub viewport: ViewportConfig,

    /// States to register at startup, in declaration order.
    #[serde(default)]
    pub states: Vec<StateDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "mediastate_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Initial size of the simulated viewport.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_viewport_width")]
    pub width: u32,

    #[serde(default = "default_viewport_height")]
    pub height: u32,
}

fn default_viewport_width() -> u32 {
    1024
}

fn default_viewport_height() -> u32 {
    768
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
        }
    }
}

impl From<ViewportConfig> for Viewport {
    fn from(cfg: ViewportConfig) -> Self {
        Viewport::new(cfg.width, cfg.height)
    }
}

/// One `[[states]]` table. Keys other than `id` and `query` are kept as
/// extra options for validators to inspect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDefinition {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub query: Option<String>,

    #[serde(flatten)]
    pub options: BTreeMap<String, Value>,
}

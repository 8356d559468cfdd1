use std::path::Path;

use anyhow::Context;

use super::types::AppConfig;

/// Path of a config file that takes priority over the local one.
pub const CONFIG_ENV_VAR: &str = "MEDIASTATE_CONFIG";
/// Overrides `logging.level`.
pub const LOG_LEVEL_ENV_VAR: &str = "MEDIASTATE_LOG_LEVEL";
pub const LOCAL_CONFIG_FILE: &str = "mediastate.toml";

pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<AppConfig> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: $MEDIASTATE_CONFIG
    let env_config = std::env::var(CONFIG_ENV_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty());

    // Priority 2: ./mediastate.toml
    let local_config = Path::new(LOCAL_CONFIG_FILE);

    let mut cfg = if let Some(path) = env_config {
        load_from_path(path)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(v) = std::env::var(LOG_LEVEL_ENV_VAR) {
        if !v.trim().is_empty() {
            cfg.logging.level = v;
        }
    }
}

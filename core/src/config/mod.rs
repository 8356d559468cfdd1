mod load;
mod types;

pub use load::{load_default, load_from_path, CONFIG_ENV_VAR, LOCAL_CONFIG_FILE, LOG_LEVEL_ENV_VAR};
pub use types::{AppConfig, LoggingConfig, StateDefinition, ViewportConfig};

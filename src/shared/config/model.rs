use serde::Deserialize;
use std::env;

pub const CONFIG_ENV: &str = "FLEET_QUERY_CONFIG";
pub const ENV_PREFIX: &str = "FLEET_QUERY";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub evaluator: EvaluatorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluatorConfig {
    /// Row cap applied to every stage in preview mode.
    pub preview_cap: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Directory for the rolling log file. No file output when unset.
    pub log_dir: Option<String>,
    pub stdout_level: String,
    pub file_level: String,
}

pub fn load_settings() -> Result<Settings, config::ConfigError> {
    let config_path = env::var(CONFIG_ENV).unwrap_or_else(|_| "config".to_string());
    load_settings_from(&config_path)
}

/// Defaults, then the optional file at `config_path`, then `FLEET_QUERY__*` variables.
pub fn load_settings_from(config_path: &str) -> Result<Settings, config::ConfigError> {
    let settings: Settings = config::Config::builder()
        .set_default("evaluator.preview_cap", 3)?
        .set_default("logging.stdout_level", "info")?
        .set_default("logging.file_level", "debug")?
        .add_source(config::File::with_name(config_path).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}

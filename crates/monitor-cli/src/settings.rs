//! Logging and layered configuration

use std::path::Path;

use config::{Config, Environment, File};
use fatigue_monitor::MonitorConfig;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::ReplayError;

/// Environment prefix; nested keys use `__`, e.g. `FATIGUE__ALERT__COOLDOWN_SECS=20`
pub const ENV_PREFIX: &str = "FATIGUE";

/// Initialize logging
pub fn init_logging(level: Level, json: bool) -> Result<(), ReplayError> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    result.map_err(|e| ReplayError::Logging(e.to_string()))
}

/// Build the monitor configuration: defaults, then the optional file, then
/// `FATIGUE__*` environment variables.
pub fn load_config(path: Option<&Path>) -> Result<MonitorConfig, ReplayError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        info!("Loading configuration from {}", path.display());
        builder = builder.add_source(File::from(path));
    }

    let config: MonitorConfig = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    config.validate()?;
    Ok(config)
}

//! The `config` module loads server settings.
//!
//! Sources, later ones winning: built-in defaults, an optional TOML file,
//! then `STREAMHUB_*` environment variables with `__` between section and
//! key (`STREAMHUB_SERVER__PORT=9000`).

mod settings;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{
    DeliveryMode, HeartbeatSettings, HubSettings, LogSettings, ServerSettings, Settings,
};

pub const DEFAULT_CONFIG_PATH: &str = "config/default";

const ENV_PREFIX: &str = "STREAMHUB";

/// Loads `config/default.{toml,...}` (if present) and the environment.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

/// Same as [`load_config`] with an explicit file path. The file is optional;
/// the extension may be omitted.
pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge_onto(Settings::default()))
}

#[cfg(test)]
mod tests;

use super::Config;
use crate::error::TubeHumError;
use config::Config as ConfigBuilder;

pub const ENV_PREFIX: &str = "TUBEHUM";

/// Splits `TUBEHUM__USER_AGENTS`. User agents routinely contain commas and
/// semicolons, so neither can separate them.
pub const USER_AGENT_SEPARATOR: &str = "|";

/// Loads the configuration from an optional file, then overlays
/// `TUBEHUM__SECTION__KEY` environment variables.
pub fn load_config(config_path: Option<&str>) -> Result<Config, TubeHumError> {
    let mut config_builder = ConfigBuilder::builder();

    if let Some(config_path) = config_path {
        config_builder = config_builder.add_source(config::File::with_name(config_path));
    }

    let config_builder = config_builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(USER_AGENT_SEPARATOR)
                .with_list_parse_key("user_agents"),
        )
        .build()?;

    config_builder.try_deserialize().map_err(Into::into)
}

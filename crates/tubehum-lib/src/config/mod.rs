mod loader;
mod model;

pub use loader::{ENV_PREFIX, USER_AGENT_SEPARATOR, load_config};
pub use model::{
    AcceleratorConfig, Config, CredentialsConfig, DownloadConfig, OutputConfig, ToolsConfig,
    default_user_agents,
};

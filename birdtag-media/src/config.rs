use std::{path::Path, str::FromStr, time::Duration};

use serde::Deserialize;
use strum::{Display, EnumString};

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Settings {
    pub converter: ConverterSettings,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ConverterSettings {
    /// Load the locator as an image before fetching it for encoding.
    pub preflight: bool,
    /// Whole-request timeout. Unset means requests may wait indefinitely.
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    /// Largest body accepted for embedding.
    pub max_image_bytes: Option<u64>,
    /// Upper bound on in-flight conversions for batch calls.
    pub max_concurrent_requests: usize,
    pub user_agent: String,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            preflight: true,
            request_timeout_secs: None,
            connect_timeout_secs: None,
            max_image_bytes: None,
            max_concurrent_requests: 8,
            user_agent: concat!("birdtag-media/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ConverterSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

/// Reads settings for the environment named by `APP_ENVIRONMENT` (default `local`).
pub fn read_config(config_directory: &Path) -> Result<Settings, config::ConfigError> {
    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .map_err(|e| config::ConfigError::Message(format!("Failed to parse APP_ENVIRONMENT: {e}")))?;

    read_config_for(config_directory, environment)
}

/// Layers `base.yaml`, `<environment>.yaml` and `BIRDTAG_*` variables.
///
/// Both files are optional, so a missing config directory yields defaults.
pub fn read_config_for(
    config_directory: &Path,
    environment: Environment,
) -> Result<Settings, config::ConfigError> {
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")).required(false))
        .add_source(
            config::File::from(config_directory.join(environment_filename)).required(false),
        )
        .add_source(
            config::Environment::with_prefix("BIRDTAG")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}

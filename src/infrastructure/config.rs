//! Configuration infrastructure
//!
//! Everything that used to be a module-level constant (viewport size,
//! scroll pacing, selectors) travels in `HarvestConfig` and is passed into
//! the pipeline entry point.
//!
//! Sources are layered with the `config` crate:
//! 1. Built-in defaults
//! 2. Optional config file (explicit path, `./wishlist-harvest.*`, or the user config dir)
//! 3. `WISHLIST_HARVEST__*` environment variables

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use super::harvest_error::HarvestError;
use super::parsing::config::SelectorConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    FileLoad {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

impl ConfigError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<ConfigError> for HarvestError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { message } => Self::InvalidConfig { message },
            ConfigError::FileLoad { source } => Self::invalid_config(source.to_string()),
        }
    }
}

/// Complete harvest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Scroll loop pacing
    pub scroll: ScrollConfig,

    /// Viewport the page is rendered at
    pub viewport: ViewportConfig,

    /// DOM selectors, one per wishlist field
    pub selectors: SelectorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Overall deadline for one harvest run in seconds
    pub run_timeout_secs: u64,
}

/// How far each scroll round advances the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollStep {
    /// Half of the viewport height per round
    HalfViewport,
    /// Jump to the current bottom of the document
    FullDocument,
    /// Fixed pixel distance per round
    Pixels(u32),
}

/// Scroll loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Number of scroll rounds (0 disables scrolling)
    pub iterations: u32,

    /// Delay after each round so lazy content can load
    pub settle_delay_ms: u64,

    /// Distance per round
    pub step: ScrollStep,

    /// Stop early once the item count stops growing; `iterations` stays the cap
    pub convergence: Option<ConvergenceConfig>,
}

/// Early-stop settings for the scroll loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergenceConfig {
    /// Consecutive rounds without new items before stopping
    pub quiet_rounds: u32,
}

/// Fixed browser viewport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    /// Enable console output (stderr, so stdout stays clean for JSON bodies)
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Module-specific log level filters (e.g., "chromiumoxide": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            scroll: ScrollConfig::default(),
            viewport: ViewportConfig::default(),
            selectors: SelectorConfig::default(),
            logging: LoggingConfig::default(),
            run_timeout_secs: defaults::RUN_TIMEOUT_SECS,
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            iterations: defaults::SCROLL_ITERATIONS,
            settle_delay_ms: defaults::SETTLE_DELAY_MS,
            step: ScrollStep::FullDocument,
            convergence: None,
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: defaults::VIEWPORT_WIDTH,
            height: defaults::VIEWPORT_HEIGHT,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            max_files: defaults::LOG_MAX_FILES,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("chromiumoxide".to_string(), "warn".to_string());
                filters.insert("tungstenite".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "warn".to_string());
                filters.insert("selectors".to_string(), "warn".to_string());
                filters.insert("wishlist_harvest_lib".to_string(), "info".to_string());
                filters
            },
        }
    }
}

impl HarvestConfig {
    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scroll.settle_delay_ms == 0 {
            return Err(ConfigError::validation("scroll.settle_delay_ms must be greater than 0"));
        }

        if self.scroll.iterations > defaults::MAX_SCROLL_ITERATIONS {
            return Err(ConfigError::validation(format!(
                "scroll.iterations must be at most {}",
                defaults::MAX_SCROLL_ITERATIONS
            )));
        }

        if self.scroll.step == ScrollStep::Pixels(0) {
            return Err(ConfigError::validation("scroll.step pixels must be greater than 0"));
        }

        if let Some(convergence) = &self.scroll.convergence {
            if convergence.quiet_rounds == 0 {
                return Err(ConfigError::validation(
                    "scroll.convergence.quiet_rounds must be greater than 0",
                ));
            }
        }

        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ConfigError::validation("viewport width and height must be greater than 0"));
        }

        if self.run_timeout_secs == 0 {
            return Err(ConfigError::validation("run_timeout_secs must be greater than 0"));
        }

        Ok(())
    }
}

/// Layered configuration loader
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    explicit_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from this file instead of searching the default locations
    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.explicit_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// `<user config dir>/wishlist-harvest/config`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(defaults::APP_DIR_NAME).join("config"))
    }

    pub fn load(&self) -> Result<HarvestConfig, ConfigError> {
        let built_in = config::Config::try_from(&HarvestConfig::default())?;
        let mut builder = config::Config::builder().add_source(built_in);

        match &self.explicit_path {
            Some(path) => {
                info!("Loading configuration from: {:?}", path);
                builder = builder.add_source(config::File::from(path.as_path()).required(true));
            }
            None => {
                if let Some(user_path) = Self::user_config_path() {
                    debug!("Looking for user configuration at: {:?}", user_path);
                    builder = builder.add_source(config::File::from(user_path).required(false));
                }
                builder = builder.add_source(config::File::with_name(defaults::LOCAL_CONFIG_NAME).required(false));
            }
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: HarvestConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

/// Default configuration values
pub mod defaults {
    /// Default number of scroll rounds
    pub const SCROLL_ITERATIONS: u32 = 2;

    /// Upper bound for scroll rounds in one run
    pub const MAX_SCROLL_ITERATIONS: u32 = 100;

    /// Default settle delay after each scroll round in milliseconds
    pub const SETTLE_DELAY_MS: u64 = 1000;

    /// Upper bound for the settle delay in milliseconds
    pub const MAX_SETTLE_DELAY_MS: u64 = 60_000;

    /// Default viewport; wide enough that price, priority and comment columns render
    pub const VIEWPORT_WIDTH: u32 = 1920;
    pub const VIEWPORT_HEIGHT: u32 = 1080;

    /// Default overall deadline for one run in seconds
    pub const RUN_TIMEOUT_SECS: u64 = 120;

    /// Application directory name under the user config / log locations
    pub const APP_DIR_NAME: &str = "wishlist-harvest";

    /// Config file base name searched in the working directory
    pub const LOCAL_CONFIG_NAME: &str = "wishlist-harvest";

    /// Environment variable prefix (`WISHLIST_HARVEST__SCROLL__ITERATIONS=4`)
    pub const ENV_PREFIX: &str = "WISHLIST_HARVEST";

    // Log configuration defaults
    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default JSON format setting
    pub const LOG_JSON_FORMAT: bool = false;

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = false;

    /// Default maximum log files to keep
    pub const LOG_MAX_FILES: u32 = 5;
}

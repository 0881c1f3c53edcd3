// Configuration management module
// Handles TOML configuration loading, validation, and interactive setup

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    ClassifierConfig, Config, ConfigError, EmbeddingConfig, FallbackMode, GateConfig, GateStrategy,
};

/// Get the default configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::default_config_dir()
}

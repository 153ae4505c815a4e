//! Configuration module for ferry
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (FERRY_*, then GitHub Actions INPUT_*)
//! 3. Project config (ferry.toml or --config)
//! 4. User config (~/.config/ferry/config.toml)
//! 5. Built-in defaults (lowest priority)

mod loader;
mod types;

pub use loader::{
    load_layered, load_with_warnings, parse_bool, user_config_path, with_env_overrides,
    ConfigWarning, LoadedConfig, PROJECT_CONFIG,
};
pub use types::{ConfigError, DeploySettings, IgnoreList, PlanSettings, RawConfig};

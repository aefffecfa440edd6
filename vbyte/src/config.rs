//! Engine configuration.
//!
//! Settings are layered: built-in defaults first, then an optional
//! configuration file, then `VBYTE_` environment variables.

use std::path::Path;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::decode::Strategy;

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// How compressed streams are decoded and queried.
    pub engine: EngineSettings,
}

/// Settings for [`crate::Engine`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineSettings {
    /// The bulk decode strategy.
    pub strategy: Strategy,
    /// Whether select and lower-bound search skip whole blocks.
    pub block_skipping: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            strategy: Strategy::Block,
            block_skipping: true,
        }
    }
}

impl Settings {
    /// Loads the defaults, then `config_path` if given, then the environment.
    ///
    /// The environment variables are prefixed with `VBYTE_` and nested fields
    /// are separated with double underscores. For example, the path
    /// `engine.block_skipping` is parsed as following:
    ///
    /// ```text
    /// VBYTE_ENGINE__BLOCK_SKIPPING
    /// ^^^^^ ^^^^^^  ^^^^^^^^^^^^^^
    ///   │  ^  │   ^^     └ The `block_skipping` field of the `engine` object
    ///   │  │  │   └ separator("__")
    ///   │  │  └ The `engine` field of the root object (`Settings`)
    ///   │  └ prefix_separator("_")
    ///   └ with_prefix("VBYTE")
    /// ```
    pub fn new(config_path: Option<impl AsRef<Path>>) -> Result<Self, ConfigError> {
        let mut cfg_builder = Config::builder();
        if let Some(path) = config_path {
            cfg_builder = cfg_builder.add_source(File::from(path.as_ref()));
        }

        Self::build(cfg_builder, environment())
    }

    /// Applies the defaults underneath the sources already in `cfg_builder`
    /// and `env` on top of them.
    fn build(
        cfg_builder: ConfigBuilder<DefaultState>,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        let defaults = EngineSettings::default();
        let cfg = cfg_builder
            .set_default("engine.strategy", defaults.strategy.to_string())?
            .set_default("engine.block_skipping", defaults.block_skipping)?
            .add_source(env)
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        tracing::debug!(?settings, "loaded settings");

        Ok(settings)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("VBYTE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

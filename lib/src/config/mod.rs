use std::path::Path;

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::solver::MatchOptions;

/// Configuration loaded from a TOML file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// Matching specific configuration.
    pub matching: MatchingConfig,
}

/// Matching specific configuration.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MatchingConfig {
    /// Maximum nesting depth of sub-grammars and types.
    pub max_depth: usize,
    /// Cache the outcome of leaf checkers.
    pub memoize: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            matching: MatchingConfig {
                max_depth: MatchOptions::DEFAULT_MAX_DEPTH,
                memoize: false,
            },
        }
    }
}

impl Config {
    /// Returns the [`MatchOptions`] corresponding to this configuration.
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions::new()
            .max_depth(self.matching.max_depth)
            .memoize(self.matching.memoize)
    }
}

/// Load config file from a given path. Path must contain a valid TOML file or
/// this function will propagate the error. Settings missing from the file
/// keep their default values.
pub fn load_config_from_file(
    config_file: &Path,
) -> Result<Config, figment::Error> {
    let config: Config =
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file_exact(config_file))
            .extract()?;
    Ok(config)
}

//! Configuration parameters for the index advisor.

use config::{Config, Environment, File, FileFormat};
use getset::{CopyGetters, Getters, Setters};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use typed_builder::TypedBuilder;

/// Default number of indexes to recommend.
pub const DEFAULT_MAX_NUM_INDEX: usize = 5;

/// Default maximum number of columns in a recommended index.
pub const DEFAULT_MAX_INDEX_WIDTH: usize = 3;

/// Character columns longer than this (in declared characters) are not worth indexing.
pub const DEFAULT_MAX_VARCHAR_LENGTH: u64 = 512;

/// When the candidate pool is larger than this, the naive enumeration only
/// tries single indexes instead of pairs.
pub const DEFAULT_NAIVE_PAIR_THRESHOLD: usize = 50;

/// Number of distinct winning configurations kept per query while narrowing candidates.
pub const DEFAULT_BEST_PER_QUERY: usize = 3;

/// Number of attempts to fill the budget after filtering.
pub const DEFAULT_TOP_UP_ATTEMPTS: usize = 3;

pub const DEFAULT_SCHEMA: &str = "test";

/// Prefix of the environment variables overriding file configuration
/// (e.g. `ADVISOR__MAX_NUM_INDEX=10`).
pub const ENV_PREFIX: &str = "ADVISOR";

#[derive(Debug, Error)]
pub enum AdvisorConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] config::ConfigError),
}

/// How a workload is compressed before the search.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionAlgorithm {
    /// Every query is kept as-is.
    None,
    /// Queries sharing a normalized signature collapse into one.
    #[default]
    Digest,
}

/// Which search produces the recommendation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionAlgorithm {
    #[default]
    AutoAdmin,
}

#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    CopyGetters,
    Setters,
    TypedBuilder,
)]
#[serde(default)]
#[getset(set = "pub")]
pub struct AdvisorConfig {
    #[builder(default = DEFAULT_MAX_NUM_INDEX)]
    #[getset(get_copy = "pub")]
    max_num_index: usize,
    #[builder(default = DEFAULT_MAX_INDEX_WIDTH)]
    #[getset(get_copy = "pub")]
    max_index_width: usize,
    #[builder(default)]
    #[getset(get_copy = "pub")]
    compression: CompressionAlgorithm,
    #[builder(default)]
    #[getset(get_copy = "pub")]
    selection: SelectionAlgorithm,
    #[builder(default = DEFAULT_SCHEMA.to_string())]
    #[getset(get = "pub")]
    default_schema: String,
    #[builder(default = DEFAULT_MAX_VARCHAR_LENGTH)]
    #[getset(get_copy = "pub")]
    max_varchar_length: u64,
    #[builder(default = DEFAULT_NAIVE_PAIR_THRESHOLD)]
    #[getset(get_copy = "pub")]
    naive_pair_threshold: usize,
    #[builder(default = DEFAULT_BEST_PER_QUERY)]
    #[getset(get_copy = "pub")]
    best_per_query: usize,
    #[builder(default = DEFAULT_TOP_UP_ATTEMPTS)]
    #[getset(get_copy = "pub")]
    top_up_attempts: usize,
    #[builder(default = "info".to_string())]
    #[getset(get = "pub")]
    log_level: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        AdvisorConfig::builder().build()
    }
}

impl AdvisorConfig {
    /// Loads configuration from an optional TOML file, overridden by `ADVISOR__*`
    /// environment variables (a `.env` file in the working directory is honoured).
    /// Keys missing from both take their defaults.
    pub fn load_from_file_and_env(file_path: &str) -> Result<Self, AdvisorConfigError> {
        dotenv::dotenv().ok();

        let config = Config::builder()
            .add_source(File::new(file_path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize::<AdvisorConfig>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted::assert_eq;
    use std::env;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AdvisorConfig::default();
        assert_eq!(config.max_num_index(), 5);
        assert_eq!(config.max_index_width(), 3);
        assert_eq!(config.compression(), CompressionAlgorithm::Digest);
        assert_eq!(config.default_schema(), "test");
        assert_eq!(config.max_varchar_length(), 512);
        assert_eq!(config.naive_pair_threshold(), 50);
        assert_eq!(config.best_per_query(), 3);
    }

    #[test]
    fn load_partial_config_from_file() {
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
            max_num_index = 10
            max_index_width = 2
            compression = "none"
            default_schema = "tpch"
        "#
        )
        .unwrap();
        let config_path = temp_file.path().to_str().unwrap();

        let config = AdvisorConfig::load_from_file_and_env(config_path).unwrap();

        assert_eq!(config.max_num_index(), 10);
        assert_eq!(config.max_index_width(), 2);
        assert_eq!(config.compression(), CompressionAlgorithm::None);
        assert_eq!(config.default_schema(), "tpch");
        // Untouched keys keep their defaults
        assert_eq!(config.naive_pair_threshold(), DEFAULT_NAIVE_PAIR_THRESHOLD);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AdvisorConfig::load_from_file_and_env("/nonexistent/advisor.toml").unwrap();
        assert_eq!(config.max_index_width(), DEFAULT_MAX_INDEX_WIDTH);
    }

    #[test]
    fn env_overrides_file() {
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(temp_file, "top_up_attempts = 1").unwrap();
        let config_path = temp_file.path().to_str().unwrap();

        env::set_var("ADVISOR__TOP_UP_ATTEMPTS", "7");
        let config = AdvisorConfig::load_from_file_and_env(config_path).unwrap();
        env::remove_var("ADVISOR__TOP_UP_ATTEMPTS");

        assert_eq!(config.top_up_attempts(), 7);
    }

    #[test]
    fn invalid_value_is_an_error() {
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(temp_file, r#"compression = "zip""#).unwrap();
        let config_path = temp_file.path().to_str().unwrap();

        assert!(AdvisorConfig::load_from_file_and_env(config_path).is_err());
    }
}

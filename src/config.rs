//! Mapping-layer settings.
//!
//! [`OrmConfig`] is read from the `[orm]` table of `config/config.toml`
//! (optional) overlaid with `ROWFOLD__ORM__*` environment variables, e.g.
//! `ROWFOLD__ORM__DIALECT=postgres` or `ROWFOLD__ORM__LOG_QUERIES=true`.

use crate::sql::Dialect;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
const ENV_PREFIX: &str = "ROWFOLD";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrmConfig {
    /// SQL flavor the builder emits
    #[serde(default)]
    pub dialect: Dialect,
    /// Log every statement at debug level
    #[serde(default)]
    pub log_queries: bool,
    /// Statements slower than this are logged as warnings
    #[serde(default = "default_slow_query_threshold_ms")]
    pub slow_query_threshold_ms: u64,
}

fn default_slow_query_threshold_ms() -> u64 {
    500
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            log_queries: false,
            slow_query_threshold_ms: default_slow_query_threshold_ms(),
        }
    }
}

impl OrmConfig {
    /// Load from `config/config.toml`, falling back to env vars
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from the TOML file at `path` (optional) and the environment
    ///
    /// A file that exists but cannot be parsed is skipped with a warning and
    /// only the environment is used. A missing `[orm]` table yields the
    /// defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let env = || Environment::with_prefix(ENV_PREFIX).separator("__");

        let settings = match Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(env())
            .build()
        {
            Ok(cfg) => cfg,
            Err(err) => {
                if path.exists() {
                    log::warn!(
                        "failed to load {}, falling back to env: {}",
                        path.display(),
                        err
                    );
                }
                Config::builder().add_source(env()).build().map_err(|env_err| {
                    ConfigError::Message(format!(
                        "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                    ))
                })?
            }
        };

        match settings.get::<OrmConfig>("orm") {
            Ok(cfg) => Ok(cfg),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "ORM configuration could not be loaded from file or environment: {e}"
            ))),
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_log_queries(mut self, log_queries: bool) -> Self {
        self.log_queries = log_queries;
        self
    }

    pub fn with_slow_query_threshold_ms(mut self, threshold: u64) -> Self {
        self.slow_query_threshold_ms = threshold;
        self
    }
}

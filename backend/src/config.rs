//! Configuration management for the Land Survey Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with LANDSURVEY_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::{
    LifecyclePolicy, MatchingPolicy, RetriggerPolicy, DEFAULT_RECOMMENDATION_THRESHOLD,
    DEFAULT_SOIL_AVERAGE_WINDOW,
};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Which storage collaborator backs the survey ledger
    pub storage: StorageBackend,

    /// Survey lifecycle configuration
    #[serde(default)]
    pub survey: SurveyConfig,

    /// Plant matching tolerances and weights
    #[serde(default)]
    pub matching: MatchingPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL, required for the postgres backend
    #[serde(default)]
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SurveyConfig {
    /// Submission number at which recommendations are first computed
    pub recommendation_threshold: u32,

    /// Number of recent submissions averaged for soil summaries
    pub soil_average_window: u32,

    /// Whether submissions after the threshold rerun matching
    pub retrigger: RetriggerPolicy,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            recommendation_threshold: DEFAULT_RECOMMENDATION_THRESHOLD,
            soil_average_window: DEFAULT_SOIL_AVERAGE_WINDOW,
            retrigger: RetriggerPolicy::default(),
        }
    }
}

impl SurveyConfig {
    pub fn lifecycle(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            recommendation_threshold: self.recommendation_threshold,
            retrigger: self.retrigger,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("LANDSURVEY_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("storage", "postgres")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (LANDSURVEY_ prefix)
            .add_source(
                Environment::with_prefix("LANDSURVEY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.survey.recommendation_threshold == 0 {
            return Err(ConfigError::Message(
                "survey.recommendation_threshold must be at least 1".into(),
            ));
        }
        if self.survey.soil_average_window == 0 {
            return Err(ConfigError::Message(
                "survey.soil_average_window must be at least 1".into(),
            ));
        }
        self.matching
            .validate()
            .map_err(|e| ConfigError::Message(format!("matching: {}", e)))?;
        if self.storage == StorageBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Message(
                "database.url is required when storage is postgres".into(),
            ));
        }
        Ok(())
    }

    /// Configuration for tests and local runs without a database
    pub fn in_memory() -> Self {
        Self {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 1,
                min_connections: 1,
            },
            storage: StorageBackend::Memory,
            survey: SurveyConfig::default(),
            matching: MatchingPolicy::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survey_defaults_match_three_visit_rule() {
        let survey = SurveyConfig::default();
        assert_eq!(survey.recommendation_threshold, 3);
        assert_eq!(survey.soil_average_window, 3);
        assert_eq!(survey.lifecycle().retrigger, RetriggerPolicy::EverySubmission);
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let mut config = Config::in_memory();
        config.survey.recommendation_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn overflowing_match_weights_are_rejected() {
        let mut config = Config::in_memory();
        config.matching.weights.humidity = u32::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn postgres_requires_url() {
        let mut config = Config::in_memory();
        config.storage = StorageBackend::Postgres;
        assert!(config.validate().is_err());

        config.database.url = Some("postgres://localhost/land_survey".into());
        assert!(config.validate().is_ok());
    }
}

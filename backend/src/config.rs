//! Configuration management for the Restaurant Inventory Management Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with RIM_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::AppError;
use shared::{UnitInference, UnitOverrides};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Optional external category/unit lookup service
    pub lookup: Option<LookupConfig>,

    /// Optional YAML file overriding the unit inference defaults
    pub units_override_file: Option<String>,
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
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LookupConfig {
    /// Lookup service base URL
    pub endpoint: String,

    /// Lookup service API key
    pub api_key: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("RIM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (RIM_ prefix)
            .add_source(
                Environment::with_prefix("RIM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Build the unit inference tables, applying the override file when set.
    pub fn load_unit_inference(&self) -> Result<UnitInference, AppError> {
        let Some(path) = &self.units_override_file else {
            return Ok(UnitInference::builtin());
        };
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Configuration(format!("cannot read {}: {}", path, e)))?;
        let overrides: UnitOverrides = serde_yaml::from_str(&raw)
            .map_err(|e| AppError::Configuration(format!("invalid override file {}: {}", path, e)))?;
        tracing::info!("Loaded unit inference overrides from {}", path);
        Ok(UnitInference::with_overrides(&overrides))
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

//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Token validity in days.
    #[serde(default = "default_token_expiry_days")]
    pub token_expiry_days: i64,
}

fn default_token_expiry_days() -> i64 {
    30
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MONETA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_environment() {
        temp_env::with_vars(
            [
                (
                    "MONETA__DATABASE__URL",
                    Some("postgres://localhost/moneta_test"),
                ),
                ("MONETA__JWT__SECRET", Some("test-secret")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/moneta_test");
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.server.port, 8000);
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.database.min_connections, 1);
                assert_eq!(config.jwt.token_expiry_days, 30);
            },
        );
    }

    #[test]
    fn test_environment_overrides() {
        temp_env::with_vars(
            [
                (
                    "MONETA__DATABASE__URL",
                    Some("postgres://localhost/moneta_test"),
                ),
                ("MONETA__JWT__SECRET", Some("test-secret")),
                ("MONETA__SERVER__PORT", Some("9000")),
                ("MONETA__JWT__TOKEN_EXPIRY_DAYS", Some("7")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.server.port, 9000);
                assert_eq!(config.jwt.token_expiry_days, 7);
            },
        );
    }
}

//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. The resulting `Config` is built once and
//! handed to the components that need it; handlers never read the environment.

use axum::http::HeaderValue;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which persistence strategy backs the product catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// The whole collection lives in one JSON file, rewritten on every mutation.
    JsonFile { path: PathBuf },
    /// Records live in PostgreSQL; ids and uniqueness are handled by the database.
    Postgres { database_url: String },
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub store: StoreBackend,
    pub jwt_secret: String,
    pub admin_username: String,
    pub admin_password: String,
    pub token_ttl: Duration,
    pub allowed_origins: Vec<HeaderValue>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = match &self.store {
            StoreBackend::JsonFile { path } => format!("JsonFile({})", path.display()),
            StoreBackend::Postgres { .. } => "Postgres([REDACTED])".to_string(),
        };
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("log_level", &self.log_level)
            .field("store", &store)
            .field("jwt_secret", &"[REDACTED]")
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVar(key.to_string()))
        };

        // --- Server Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:5000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Storage Settings ---
        let backend = var_or("STORE_BACKEND", "file");
        let store = match backend.trim().to_lowercase().as_str() {
            "file" | "json" => StoreBackend::JsonFile {
                path: PathBuf::from(var_or("PRODUCTS_FILE", "./data/products.json")),
            },
            "postgres" | "postgresql" => StoreBackend::Postgres {
                database_url: required("DATABASE_URL")?,
            },
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORE_BACKEND".to_string(),
                    format!("'{}' is not one of 'file' or 'postgres'", other),
                ))
            }
        };

        // --- Auth Settings ---
        let jwt_secret = required("JWT_SECRET")?;
        let admin_username = required("ADMIN_USERNAME")?;
        let admin_password = required("ADMIN_PASSWORD")?;

        let ttl_str = var_or("TOKEN_TTL_SECS", "3600");
        let token_ttl = match ttl_str.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                return Err(ConfigError::InvalidValue(
                    "TOKEN_TTL_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", ttl_str),
                ))
            }
        };

        // --- CORS ---
        let allowed_origins = var_or("ALLOWED_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                // Credentials are allowed, which rules out the wildcard origin.
                if origin == "*" {
                    return Err(ConfigError::InvalidValue(
                        "ALLOWED_ORIGINS".to_string(),
                        "'*' cannot be combined with credentialed requests".to_string(),
                    ));
                }
                origin.parse::<HeaderValue>().map_err(|e| {
                    ConfigError::InvalidValue("ALLOWED_ORIGINS".to_string(), e.to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            bind_address,
            log_level,
            store,
            jwt_secret,
            admin_username,
            admin_password,
            token_ttl,
            allowed_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const AUTH: [(&str, &str); 3] = [
        ("JWT_SECRET", "s3cret"),
        ("ADMIN_USERNAME", "admin"),
        ("ADMIN_PASSWORD", "hunter2"),
    ];

    #[test]
    fn defaults_apply_when_only_auth_is_set() {
        let config = load(&AUTH).unwrap();
        assert_eq!(
            config.bind_address,
            "0.0.0.0:5000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(
            config.store,
            StoreBackend::JsonFile {
                path: PathBuf::from("./data/products.json")
            }
        );
        assert_eq!(config.token_ttl, Duration::from_secs(3600));
        assert_eq!(config.allowed_origins, vec!["http://localhost:5173"]);
    }

    #[test]
    fn missing_secret_is_reported() {
        let err = load(&AUTH[1..]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(var) if var == "JWT_SECRET"));
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let mut vars = AUTH.to_vec();
        vars.push(("STORE_BACKEND", "postgres"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(var) if var == "DATABASE_URL"));

        vars.push(("DATABASE_URL", "postgres://localhost/perfumery"));
        let config = load(&vars).unwrap();
        assert!(matches!(config.store, StoreBackend::Postgres { .. }));
    }

    #[test]
    fn zero_token_ttl_is_rejected() {
        let mut vars = AUTH.to_vec();
        vars.push(("TOKEN_TTL_SECS", "0"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "TOKEN_TTL_SECS"));
    }

    #[test]
    fn origins_are_split_on_commas() {
        let mut vars = AUTH.to_vec();
        vars.push((
            "ALLOWED_ORIGINS",
            "https://shop.example.com, http://localhost:5173",
        ));
        let config = load(&vars).unwrap();
        assert_eq!(config.allowed_origins.len(), 2);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = load(&AUTH).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("hunter2"));
    }
}

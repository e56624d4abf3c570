use std::env;

use crate::validation::SubmissionPolicy;

/// Which record store backs the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSettings {
    Postgres { database_url: String },
    Rest { url: String, service_key: String },
    Memory,
    /// Nothing usable was configured; write endpoints answer 500.
    Unconfigured,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreSettings,
    pub submission: SubmissionPolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORT must be a valid u16, got '{0}'")]
    InvalidPort(String),
    #[error("RECORD_STORE must be one of postgres, rest, memory; got '{0}'")]
    UnknownStore(String),
    #[error("REQUIRE_SUGGESTION_CITY must be true or false, got '{0}'")]
    InvalidFlag(String),
}

impl AppConfig {
    /// Reads the process environment; `main` loads `.env` into it beforehand.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => 8082,
        };

        let database_url = var("DATABASE_URL");
        let rest = var("RECORD_STORE_URL").zip(var("RECORD_STORE_SERVICE_KEY"));

        let store = match var("RECORD_STORE").map(|v| v.trim().to_ascii_lowercase()) {
            Some(kind) => match kind.as_str() {
                "postgres" => database_url
                    .map(|database_url| StoreSettings::Postgres { database_url })
                    .unwrap_or(StoreSettings::Unconfigured),
                "rest" => rest
                    .map(|(url, service_key)| StoreSettings::Rest { url, service_key })
                    .unwrap_or(StoreSettings::Unconfigured),
                "memory" => StoreSettings::Memory,
                _ => return Err(ConfigError::UnknownStore(kind)),
            },
            None => match (database_url, rest) {
                (Some(database_url), _) => StoreSettings::Postgres { database_url },
                (None, Some((url, service_key))) => StoreSettings::Rest { url, service_key },
                (None, None) => StoreSettings::Unconfigured,
            },
        };

        let require_city = match var("REQUIRE_SUGGESTION_CITY") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => return Err(ConfigError::InvalidFlag(raw)),
            },
            None => true,
        };

        Ok(Self {
            host,
            port,
            store,
            submission: SubmissionPolicy { require_city },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

use std::{env, fmt::Display, str::FromStr};

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub session_secret: String,
    pub upload_secret: String,
    pub sign_in_path: String,
    pub run_migrations: bool,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            port: try_load(&lookup, "PORT", "8080")?,
            database_url: required(&lookup, "DATABASE_URL")?,
            database_max_connections: try_load(&lookup, "DATABASE_MAX_CONNECTIONS", "5")?,
            session_secret: required(&lookup, "SESSION_SECRET")?,
            upload_secret: required(&lookup, "UPLOAD_SECRET")?,
            sign_in_path: try_load(&lookup, "SIGN_IN_PATH", "/sign-in")?,
            run_migrations: try_load(&lookup, "RUN_MIGRATIONS", "true")?,
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => {
            log::error!("{key} is required but not set");
            Err(ConfigError::Missing(key))
        }
    }
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            log::info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e: T::Err| {
            log::warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                info: e.to_string(),
            }
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/recipes"),
        ("SESSION_SECRET", "session"),
        ("UPLOAD_SECRET", "upload"),
    ];

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.sign_in_path, "/sign-in");
        assert!(config.run_migrations);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let result = Config::from_lookup(lookup(&REQUIRED[..2]));
        assert!(matches!(result, Err(ConfigError::Missing("UPLOAD_SECRET"))));
    }

    #[test]
    fn malformed_port_is_an_error() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));
        let result = Config::from_lookup(lookup(&pairs));
        assert!(matches!(result, Err(ConfigError::Invalid { key: "PORT", .. })));
    }
}

use std::{env, net::SocketAddr};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable `{0}`")]
    Missing(&'static str),
    #[error("Invalid value for `{name}`: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub jwt_secret: String,
    pub notify_webhook_url: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let bind_addr = match lookup("BIND_ADDR") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "BIND_ADDR",
                value,
            })?,
            None => SocketAddr::from(([127, 0, 0, 1], 3001)),
        };
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => match value.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "DATABASE_MAX_CONNECTIONS",
                        value,
                    });
                }
            },
            None => 5,
        };
        let notify_webhook_url = lookup("NOTIFY_WEBHOOK_URL").filter(|url| !url.trim().is_empty());
        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            jwt_secret,
            notify_webhook_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings_from(vars: &[(&'static str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<&'static str, String> =
            vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_applied() {
        let settings = settings_from(&[
            ("DATABASE_URL", "sqlite://tt.db"),
            ("JWT_SECRET", "secret"),
        ])
        .expect("settings should load");
        assert_eq!(settings.bind_addr, SocketAddr::from(([127, 0, 0, 1], 3001)));
        assert_eq!(settings.max_connections, 5);
        assert!(settings.notify_webhook_url.is_none());
    }

    #[test]
    fn test_missing_database_url() {
        let err = settings_from(&[("JWT_SECRET", "secret")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn test_invalid_bind_addr() {
        let err = settings_from(&[
            ("DATABASE_URL", "sqlite://tt.db"),
            ("JWT_SECRET", "secret"),
            ("BIND_ADDR", "localhost"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "BIND_ADDR", .. }));
    }

    #[test]
    fn test_blank_webhook_is_disabled() {
        let settings = settings_from(&[
            ("DATABASE_URL", "sqlite://tt.db"),
            ("JWT_SECRET", "secret"),
            ("NOTIFY_WEBHOOK_URL", "  "),
        ])
        .expect("settings should load");
        assert!(settings.notify_webhook_url.is_none());
    }
}

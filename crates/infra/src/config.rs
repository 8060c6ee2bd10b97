//! Process configuration, read from the environment (and `.env` when present).

use std::env;
use std::net::SocketAddr;

use dotenvy::dotenv;
use thiserror::Error;
use tracing::warn;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";
const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Locale whose localized text stands in for a blank name/description.
    pub default_locale: String,
}

impl AppConfig {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("KIVU_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "KIVU_BIND_ADDR",
                message: e.to_string(),
            })?;

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let default_locale = lookup("KIVU_DEFAULT_LOCALE")
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
            .trim()
            .to_string();
        if default_locale.is_empty() {
            return Err(ConfigError::Invalid {
                var: "KIVU_DEFAULT_LOCALE",
                message: "must not be blank".to_string(),
            });
        }

        Ok(Self {
            bind_addr,
            jwt_secret,
            default_locale,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.jwt_secret, "dev-secret");
        assert_eq!(cfg.default_locale, "en");
    }

    #[test]
    fn explicit_values_win() {
        let cfg = load(&[
            ("KIVU_BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("KIVU_DEFAULT_LOCALE", "rw"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.default_locale, "rw");
    }

    #[test]
    fn bad_values_are_reported() {
        let err = load(&[("KIVU_BIND_ADDR", "not-an-addr")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "KIVU_BIND_ADDR", .. }));

        let err = load(&[("KIVU_DEFAULT_LOCALE", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "KIVU_DEFAULT_LOCALE", .. }));
    }
}

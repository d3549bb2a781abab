use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;

/// Listener settings shared by every service.
///
/// Read from an optional `configuration` file and `APP__`-prefixed
/// environment variables (`APP__HOST`, `APP__PORT`).
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    /// Reads `ENVIRONMENT`, defaulting to `dev`.
    pub fn from_env() -> Result<Self, AppError> {
        env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))
    }

    pub fn is_prod(&self) -> bool {
        *self == Environment::Prod
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

/// Look up an environment variable.
///
/// In production every key must be set explicitly; elsewhere `default` is
/// used when the variable is missing.
pub fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Look up and parse an environment variable, reporting the key on failure.
pub fn parse_env<T>(key: &str, default: Option<&str>, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, default, is_prod)?.parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Prod));
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Dev));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn get_env_falls_back_outside_production() {
        let value = get_env("BOOKNEST_CORE_TEST_UNSET_KEY", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn get_env_requires_value_in_production() {
        let result = get_env("BOOKNEST_CORE_TEST_UNSET_KEY", Some("fallback"), true);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn parse_env_reports_bad_values() {
        std::env::set_var("BOOKNEST_CORE_TEST_BAD_PORT", "eighty");
        let result = parse_env::<u16>("BOOKNEST_CORE_TEST_BAD_PORT", None, false);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}

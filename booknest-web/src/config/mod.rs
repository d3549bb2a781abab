use booknest_core::config::{self as core_config, get_env, parse_env, Environment};
use booknest_core::error::AppError;
use secrecy::{ExposeSecret, SecretString};
use std::env;
use url::Url;

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    /// Public origin of the site, used for provider callbacks and as the
    /// fallback origin when a request carries no usable `Host`.
    pub site_url: Url,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub session: SessionConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: SecretString,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    /// Zero disables idle reaping.
    pub idle_timeout_seconds: u64,
    /// Zero keeps connections for the life of the pool.
    pub max_lifetime_seconds: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Base URL of the hosted project; the auth API lives under `/auth/v1`.
    pub url: Url,
    pub anon_key: SecretString,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secure_cookies: bool,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl WebConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let environment = Environment::from_env()?;
        let is_prod = environment.is_prod();

        let config = WebConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("booknest-web"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            site_url: parse_url("SITE_URL", get_env("SITE_URL", Some("http://localhost:8080"), is_prod)?)?,
            database: DatabaseConfig {
                url: SecretString::new(get_env("DATABASE_URL", None, is_prod)?),
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?,
                acquire_timeout_seconds: parse_env("DATABASE_ACQUIRE_TIMEOUT_SECONDS", Some("30"), is_prod)?,
                idle_timeout_seconds: parse_env("DATABASE_IDLE_TIMEOUT_SECONDS", Some("600"), is_prod)?,
                max_lifetime_seconds: parse_env("DATABASE_MAX_LIFETIME_SECONDS", Some("1800"), is_prod)?,
                run_migrations: parse_env("DATABASE_RUN_MIGRATIONS", Some("false"), is_prod)?,
            },
            identity: IdentityConfig {
                url: parse_url("IDENTITY_URL", get_env("IDENTITY_URL", None, is_prod)?)?,
                anon_key: SecretString::new(get_env("IDENTITY_ANON_KEY", None, is_prod)?),
                timeout_seconds: parse_env("IDENTITY_TIMEOUT_SECONDS", Some("10"), is_prod)?,
            },
            session: SessionConfig {
                secure_cookies: parse_env("SECURE_COOKIES", Some(if is_prod { "true" } else { "false" }), is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.database.max_connections == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MAX_CONNECTIONS must be positive"
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS cannot exceed DATABASE_MAX_CONNECTIONS"
            )));
        }

        if self.database.acquire_timeout_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_ACQUIRE_TIMEOUT_SECONDS must be positive"
            )));
        }

        if self.identity.anon_key.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "IDENTITY_ANON_KEY must not be empty"
            )));
        }

        // Credentialed CORS cannot use a wildcard origin.
        if self.security.allowed_origins.iter().any(|o| o == "*") {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin is not allowed"
            )));
        }

        if self.environment.is_prod() && !self.session.secure_cookies {
            tracing::warn!("SECURE_COOKIES is disabled in production");
        }

        Ok(())
    }
}

fn parse_url(key: &str, value: String) -> Result<Url, AppError> {
    let url = Url::parse(&value)
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{} is not a valid URL: {}", key, e)))?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "{} must be an absolute http(s) URL",
            key
        )));
    }

    Ok(url)
}

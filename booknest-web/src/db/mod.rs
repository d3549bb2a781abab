//! PostgreSQL connection management.

use crate::config::DatabaseConfig;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

fn seconds(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}

/// Pool sizing and timeouts from configuration.
pub fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .idle_timeout(seconds(config.idle_timeout_seconds))
        .max_lifetime(seconds(config.max_lifetime_seconds))
}

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!(
        max_connections = config.max_connections,
        acquire_timeout_seconds = config.acquire_timeout_seconds,
        "Connecting to PostgreSQL..."
    );

    let pool = pool_options(config)
        .connect(config.url.expose_secret())
        .await?;

    tracing::info!("Successfully connected to PostgreSQL");

    Ok(pool)
}

/// Apply the embedded migrations for `auth_logs` and `bookmarks`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config(idle: u64, lifetime: u64) -> DatabaseConfig {
        DatabaseConfig {
            url: SecretString::new("postgres://localhost/booknest_test".to_string()),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_seconds: 3,
            idle_timeout_seconds: idle,
            max_lifetime_seconds: lifetime,
            run_migrations: false,
        }
    }

    #[test]
    fn pool_options_follow_config() {
        let options = pool_options(&config(60, 900));
        assert_eq!(options.get_max_connections(), 5);
        assert_eq!(options.get_min_connections(), 1);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(3));
        assert_eq!(options.get_idle_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(options.get_max_lifetime(), Some(Duration::from_secs(900)));
    }

    #[test]
    fn zero_disables_idle_and_lifetime_limits() {
        let options = pool_options(&config(0, 0));
        assert_eq!(options.get_idle_timeout(), None);
        assert_eq!(options.get_max_lifetime(), None);
    }

    #[tokio::test]
    #[ignore] // Requires running PostgreSQL
    async fn test_create_pool() {
        let result = create_pool(&config(600, 1800)).await;
        assert!(result.is_ok());
    }
}

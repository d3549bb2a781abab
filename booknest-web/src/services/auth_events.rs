use std::sync::Arc;

use super::repository::AuthLogRepository;
use crate::models::AuthLogEntry;

/// Writes sign-in audit rows without ever failing the caller.
#[derive(Clone)]
pub struct AuthEventLogger {
    repository: Arc<dyn AuthLogRepository>,
}

impl AuthEventLogger {
    pub fn new(repository: Arc<dyn AuthLogRepository>) -> Self {
        Self { repository }
    }

    /// Awaits the insert; a failure is logged and counted, then dropped.
    pub async fn record(&self, entry: AuthLogEntry) {
        let event = entry.event.as_str();

        match self.repository.insert_auth_log(&entry).await {
            Ok(()) => {
                metrics::counter!("auth_log_writes_total", "event" => event).increment(1);
                tracing::debug!(user_id = %entry.user_id, event, "Auth event recorded");
            }
            Err(e) => {
                metrics::counter!("auth_log_write_failures_total", "event" => event).increment(1);
                tracing::error!(
                    user_id = %entry.user_id,
                    event,
                    error = %e,
                    "Failed to record auth event"
                );
            }
        }
    }
}

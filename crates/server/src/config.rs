// crates/server/src/config.rs
//! Process configuration loaded once at startup from environment
//! variables, following the source repository's `get_port`/`get_static_dir`
//! convention rather than a config-loading crate: every setting is a
//! small `std::env::var` lookup with a documented default.

use std::time::Duration;

use activity_feed::FeedConfig;
use activity_monitoring::MonitoringConfig;
use activity_notifier::NotifierConfig;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_secs(key: &str, default_secs: u64) -> Duration {
    Duration::from_secs(env_parsed(key, default_secs))
}

/// `ACTIVITY_SERVER_PORT` (falling back to `PORT`), the bind port for the
/// HTTP server.
pub fn get_port() -> u16 {
    std::env::var("ACTIVITY_SERVER_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Every environment-derived setting this process needs, loaded once in
/// `main` and handed to component constructors by reference or `Arc`.
/// No global mutable singletons — a test harness can build one of these
/// directly with whatever values it needs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: Option<String>,
    pub feed: FeedConfig,
    pub monitoring: MonitoringConfig,
    pub notifier: NotifierConfig,
}

impl AppConfig {
    /// Reads every setting from the environment, following the source
    /// repository's env-var-with-default convention. `DATABASE_URL` has
    /// no default: a missing value is a startup error, surfaced by
    /// `main` rather than silently falling back to a local default that
    /// would mask a misconfigured deployment.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        Ok(Self {
            database_url,
            database_max_connections: env_parsed("DATABASE_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            redis_url: std::env::var("REDIS_URL").ok(),
            feed: FeedConfig {
                session_window_secs: env_parsed("ACTIVITY_SESSION_WINDOW_SECS", 900i64),
                max_events_per_session: env_parsed("ACTIVITY_MAX_EVENTS_PER_SESSION", 100i64),
                category_policy: activity_core::category::CategoryPolicy::all_enabled(),
            },
            monitoring: MonitoringConfig {
                enabled: env_parsed("MONITORING_ENABLED", true),
                environment: env_string("ACTIVITY_ENVIRONMENT", "development"),
                rate_limit_window: env_secs("MONITORING_RATE_LIMIT_WINDOW_SECS", 600),
                slow_request_threshold: env_secs("MONITORING_SLOW_REQUEST_SECS", 3),
                slow_task_threshold: env_secs("MONITORING_SLOW_TASK_SECS", 60),
                health_interval: env_secs("MONITORING_HEALTH_INTERVAL_SECS", 30 * 60),
                health_db_timeout: env_secs("MONITORING_HEALTH_DB_TIMEOUT_SECS", 5),
                health_kv_timeout: env_secs("MONITORING_HEALTH_KV_TIMEOUT_SECS", 3),
                queue_stuck_threshold: env_secs("MONITORING_QUEUE_STUCK_SECS", 10 * 60),
                daily_report_hour: env_parsed("MONITORING_DAILY_REPORT_HOUR", 9u32),
                daily_report_minute: env_parsed("MONITORING_DAILY_REPORT_MINUTE", 0u32),
                daily_report_enabled: env_parsed("MONITORING_DAILY_REPORT_ENABLED", true),
                batch_window: env_secs("MONITORING_BATCH_WINDOW_SECS", 15 * 60),
                ignored_exceptions: vec!["HttpRejection".to_string(), "ValidationError".to_string()],
                ignored_paths: vec![
                    "/health".to_string(),
                    "/metrics".to_string(),
                    "/docs".to_string(),
                    "/openapi.json".to_string(),
                ],
            },
            notifier: NotifierConfig {
                base_url: env_string("NOTIFIER_BASE_URL", "https://api.telegram.org"),
                bot_token: std::env::var("NOTIFIER_BOT_TOKEN").ok(),
                chat_id: std::env::var("NOTIFIER_CHAT_ID").ok(),
                thread_id: std::env::var("NOTIFIER_THREAD_ID").ok().and_then(|v| v.parse().ok()),
                environment: env_string("ACTIVITY_ENVIRONMENT", "development"),
                max_message_length: env_parsed("NOTIFIER_MAX_MESSAGE_LENGTH", 4000usize),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parsed_falls_back_to_default_when_unset() {
        std::env::remove_var("ACTIVITY_SERVER_TEST_VALUE");
        assert_eq!(env_parsed::<u32>("ACTIVITY_SERVER_TEST_VALUE", 42), 42);
    }

    #[test]
    fn env_secs_reads_as_whole_seconds() {
        std::env::set_var("ACTIVITY_SERVER_TEST_SECS", "7");
        assert_eq!(env_secs("ACTIVITY_SERVER_TEST_SECS", 1), Duration::from_secs(7));
        std::env::remove_var("ACTIVITY_SERVER_TEST_SECS");
    }
}

// crates/monitoring/src/config.rs
//! Configuration for the operational monitoring pipeline: feature gates,
//! thresholds, and the ignore lists the Exception Interceptor and Task
//! Instrumentation consult, grounded in `monitoring/config.py`'s
//! `MonitoringConfig`.

use std::time::Duration;

/// `MONITORING_ENABLED`: the master switch. When `false`, the
/// interceptor, task instrumentation, and health worker make no KV
/// writes at all, not just suppressed notification delivery.
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub environment: String,
    pub rate_limit_window: Duration,
    pub slow_request_threshold: Duration,
    pub slow_task_threshold: Duration,
    pub health_interval: Duration,
    pub health_db_timeout: Duration,
    pub health_kv_timeout: Duration,
    pub queue_stuck_threshold: Duration,
    pub daily_report_hour: u32,
    pub daily_report_minute: u32,
    pub daily_report_enabled: bool,
    pub batch_window: Duration,
    pub ignored_exceptions: Vec<String>,
    pub ignored_paths: Vec<String>,
}

impl MonitoringConfig {
    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// `should_monitor_path`: a path is ignored if it starts with any
    /// configured prefix.
    pub fn should_monitor_path(&self, path: &str) -> bool {
        !self.ignored_paths.iter().any(|ignored| path.starts_with(ignored.as_str()))
    }

    /// `should_monitor_exception`: Rust has no single base `HTTPException`
    /// type to special-case, so this matches by the error's type name the
    /// caller supplies (the interceptor derives it from the handler's own
    /// error enum variant name).
    pub fn should_monitor_exception(&self, exception_type: &str) -> bool {
        !self.ignored_exceptions.iter().any(|ignored| ignored == exception_type)
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            environment: "development".to_string(),
            rate_limit_window: Duration::from_secs(600),
            slow_request_threshold: Duration::from_secs(3),
            slow_task_threshold: Duration::from_secs(60),
            health_interval: Duration::from_secs(30 * 60),
            health_db_timeout: Duration::from_secs(5),
            health_kv_timeout: Duration::from_secs(3),
            queue_stuck_threshold: Duration::from_secs(10 * 60),
            daily_report_hour: 9,
            daily_report_minute: 0,
            daily_report_enabled: true,
            batch_window: Duration::from_secs(15 * 60),
            ignored_exceptions: vec!["HttpRejection".to_string(), "ValidationError".to_string()],
            ignored_paths: vec![
                "/health".to_string(),
                "/metrics".to_string(),
                "/static".to_string(),
                "/docs".to_string(),
                "/redoc".to_string(),
                "/openapi.json".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignored_paths_match_by_prefix() {
        let config = MonitoringConfig::default();
        assert!(!config.should_monitor_path("/metrics"));
        assert!(!config.should_monitor_path("/static/app.js"));
        assert!(config.should_monitor_path("/feed/project/123"));
    }

    #[test]
    fn production_matches_common_spellings() {
        let mut config = MonitoringConfig::default();
        config.environment = "PROD".to_string();
        assert!(config.is_production());
        config.environment = "staging".to_string();
        assert!(!config.is_production());
    }
}

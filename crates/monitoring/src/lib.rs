//! Operational monitoring pipeline: error fingerprinting and rate
//! limiting, the Axum exception interceptor, background job
//! instrumentation, health probing with a daily digest, and batched
//! alert collection.

pub mod batch_alerts;
pub mod config;
pub mod error;
pub mod health;
pub mod interceptor;
pub mod keys;
pub mod notify;
pub mod rate_limiter;
pub mod stats;
pub mod task_instrumentation;

pub use batch_alerts::run_batch_cycle;
pub use config::MonitoringConfig;
pub use error::MonitoringError;
pub use health::{check_health, mark_job_completed, send_daily_digest, send_startup_notice, DailyStats, DatabaseAdapter, QueueAdapter};
pub use interceptor::{track_requests, InterceptorState, RecoveredPanic};
pub use notify::Alerter;
pub use rate_limiter::{error_fingerprint, should_alert};
pub use task_instrumentation::monitored_task;

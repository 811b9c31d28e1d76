// crates/monitoring/src/keys.rs
//! Redis key layout shared by every monitoring component, grounded in
//! `monitoring/config.py`'s key-prefix constants and the literal key
//! strings scattered through `tasks.py`/`middleware.py`/`batch_alerts.py`.

use std::time::Duration;

pub const PREFIX: &str = "monitoring";

pub const ONE_HOUR: Duration = Duration::from_secs(3600);
pub const ONE_DAY: Duration = Duration::from_secs(86_400);

pub fn rate_limit(fingerprint: &str) -> String {
    format!("{PREFIX}:ratelimit:{fingerprint}")
}

pub fn slow_request_batch() -> String {
    format!("{PREFIX}:slow_requests:batch")
}

pub fn slow_request_dedup(endpoint: &str) -> String {
    format!("{PREFIX}:slow_requests:dedup:{endpoint}")
}

pub fn endpoint_stats(endpoint: &str) -> String {
    format!("{PREFIX}:endpoint_stats:{endpoint}")
}

pub fn task_success(task_name: &str) -> String {
    format!("{PREFIX}:tasks:success:{task_name}")
}

pub fn task_time(task_name: &str) -> String {
    format!("{PREFIX}:tasks:time:{task_name}")
}

pub fn task_last_success(task_name: &str) -> String {
    format!("{PREFIX}:tasks:last_success:{task_name}")
}

pub fn task_failure(task_name: &str) -> String {
    format!("{PREFIX}:tasks:failure:{task_name}")
}

pub fn task_error_class(error_class: &str) -> String {
    format!("{PREFIX}:tasks:errors:{error_class}")
}

pub fn task_last_failure(task_name: &str) -> String {
    format!("{PREFIX}:tasks:last_failure:{task_name}")
}

pub fn task_failure_count(task_name: &str) -> String {
    format!("{PREFIX}:tasks:failure_count:{task_name}")
}

pub fn task_slow_dedup(task_name: &str) -> String {
    format!("{PREFIX}:tasks:slow:{task_name}")
}

pub const QUEUE_LAST_JOB_COMPLETED: &str = "monitoring:queue:last_job_completed";

pub const HEALTH_CURRENT: &str = "monitoring:health:current";
pub const HEALTH_HISTORY: &str = "monitoring:health:history";
pub const HEALTH_HISTORY_MAX_LEN: isize = 99;

pub const STARTUP_NOTICE_DEDUP: &str = "monitoring:startup_notice";

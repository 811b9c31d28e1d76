// crates/monitoring/src/error.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitoringError {
    #[error("kv error: {0}")]
    Kv(#[from] activity_kv::KvError),
    #[error("serialization error: {0}")]
    Serialization(String),
}

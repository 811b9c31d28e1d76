// crates/kv/src/error.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("value at key {key} was not valid utf-8 or JSON: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

// crates/kv/src/trait_def.rs
//! The capability the monitoring pipeline and rate limiter depend on:
//! a small subset of Redis commands, abstracted so a process-local
//! fallback can stand in when the real store is unreachable.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::KvError;

#[async_trait]
pub trait KvAdapter: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), KvError>;

    /// Atomic `SET key value NX EX ttl`. Returns `true` if this call was
    /// the one that set the value (i.e. the key was previously absent).
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, KvError>;

    async fn delete(&self, key: &str) -> Result<(), KvError>;

    /// Atomically increments a counter, applying `ttl` only if this call
    /// created the key (mirrors `INCR` + conditional `EXPIRE`).
    async fn incr(&self, key: &str, ttl: Option<Duration>) -> Result<i64, KvError>;

    async fn lpush(&self, key: &str, value: &str) -> Result<(), KvError>;

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), KvError>;

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, KvError>;

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), KvError>;

    /// Keys matching a `SCAN`-style glob pattern. The fallback adapter
    /// implements this over its in-memory map; callers must not assume a
    /// bounded cursor cost the way a real `SCAN` provides.
    async fn scan(&self, pattern: &str) -> Result<Vec<String>, KvError>;
}

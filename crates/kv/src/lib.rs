//! The KV capability: a small Redis command surface abstracted behind
//! `KvAdapter`, with a bounded process-local fallback for when Redis is
//! unreachable.

mod error;
mod local_fallback;
mod redis_adapter;
mod resilient;
mod trait_def;

pub use error::KvError;
pub use local_fallback::LocalFallbackKv;
pub use redis_adapter::RedisKv;
pub use resilient::ResilientKv;
pub use trait_def::KvAdapter;

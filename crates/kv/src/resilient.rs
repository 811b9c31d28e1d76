// crates/kv/src/resilient.rs
//! Composes a primary `KvAdapter` (Redis) with the process-local fallback:
//! every call tries the primary first and falls back on any error,
//! logging once per failure so an outage is visible without failing the
//! caller's request.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::KvError;
use crate::local_fallback::LocalFallbackKv;
use crate::trait_def::KvAdapter;

pub struct ResilientKv<P: KvAdapter> {
    primary: P,
    fallback: LocalFallbackKv,
}

impl<P: KvAdapter> ResilientKv<P> {
    pub fn new(primary: P) -> Self {
        Self {
            primary,
            fallback: LocalFallbackKv::new(),
        }
    }
}

macro_rules! with_fallback {
    ($self:expr, $op:expr, $fallback_op:expr) => {{
        match $op(&$self.primary).await {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!(%err, "kv primary unreachable, using process-local fallback");
                $fallback_op(&$self.fallback).await
            }
        }
    }};
}

#[async_trait]
impl<P: KvAdapter> KvAdapter for ResilientKv<P> {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        with_fallback!(self, |p: &P| p.get(key), |f: &LocalFallbackKv| f.get(key))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), KvError> {
        with_fallback!(self, |p: &P| p.set(key, value, ttl), |f: &LocalFallbackKv| f.set(key, value, ttl))
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, KvError> {
        with_fallback!(
            self,
            |p: &P| p.set_if_absent(key, value, ttl),
            |f: &LocalFallbackKv| f.set_if_absent(key, value, ttl)
        )
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        with_fallback!(self, |p: &P| p.delete(key), |f: &LocalFallbackKv| f.delete(key))
    }

    async fn incr(&self, key: &str, ttl: Option<Duration>) -> Result<i64, KvError> {
        with_fallback!(self, |p: &P| p.incr(key, ttl), |f: &LocalFallbackKv| f.incr(key, ttl))
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<(), KvError> {
        with_fallback!(self, |p: &P| p.lpush(key, value), |f: &LocalFallbackKv| f.lpush(key, value))
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), KvError> {
        with_fallback!(
            self,
            |p: &P| p.ltrim(key, start, stop),
            |f: &LocalFallbackKv| f.ltrim(key, start, stop)
        )
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, KvError> {
        with_fallback!(
            self,
            |p: &P| p.lrange(key, start, stop),
            |f: &LocalFallbackKv| f.lrange(key, start, stop)
        )
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), KvError> {
        with_fallback!(self, |p: &P| p.expire(key, ttl), |f: &LocalFallbackKv| f.expire(key, ttl))
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        with_fallback!(self, |p: &P| p.scan(pattern), |f: &LocalFallbackKv| f.scan(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_fallback::LocalFallbackKv;

    struct AlwaysFails;

    #[async_trait]
    impl KvAdapter for AlwaysFails {
        async fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
            Err(unreachable_error())
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<(), KvError> {
            Err(unreachable_error())
        }
        async fn set_if_absent(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<bool, KvError> {
            Err(unreachable_error())
        }
        async fn delete(&self, _key: &str) -> Result<(), KvError> {
            Err(unreachable_error())
        }
        async fn incr(&self, _key: &str, _ttl: Option<Duration>) -> Result<i64, KvError> {
            Err(unreachable_error())
        }
        async fn lpush(&self, _key: &str, _value: &str) -> Result<(), KvError> {
            Err(unreachable_error())
        }
        async fn ltrim(&self, _key: &str, _start: isize, _stop: isize) -> Result<(), KvError> {
            Err(unreachable_error())
        }
        async fn lrange(&self, _key: &str, _start: isize, _stop: isize) -> Result<Vec<String>, KvError> {
            Err(unreachable_error())
        }
        async fn expire(&self, _key: &str, _ttl: Duration) -> Result<(), KvError> {
            Err(unreachable_error())
        }
        async fn scan(&self, _pattern: &str) -> Result<Vec<String>, KvError> {
            Err(unreachable_error())
        }
    }

    fn unreachable_error() -> KvError {
        // A connection failure is the realistic trigger for the fallback path.
        redis::RedisError::from((redis::ErrorKind::IoError, "simulated outage")).into()
    }

    #[tokio::test]
    async fn falls_back_when_primary_errors() {
        let kv = ResilientKv::new(AlwaysFails);
        kv.set("a", "1", None).await.unwrap();
        assert_eq!(kv.get("a").await.unwrap(), Some("1".to_string()));
    }

    #[tokio::test]
    async fn fallback_state_is_independent_from_a_healthy_primary() {
        let kv = ResilientKv::new(LocalFallbackKv::new());
        kv.set("a", "1", None).await.unwrap();
        assert_eq!(kv.get("a").await.unwrap(), Some("1".to_string()));
    }
}

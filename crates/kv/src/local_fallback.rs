// crates/kv/src/local_fallback.rs
//! A process-local stand-in for the KV store, used when Redis is
//! unreachable. Capped at `MAX_ENTRIES`; once full, the oldest-inserted
//! entries are swept to make room, mirroring the original's bounded
//! in-memory dict.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::KvError;
use crate::trait_def::KvAdapter;

const MAX_ENTRIES: usize = 1000;

struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
    inserted_at: DateTime<Utc>,
}

/// An in-memory `KvAdapter` capped at 1000 live entries. Lists and scalar
/// values share one map; list values are stored as a `\n`-joined blob
/// since this fallback only needs to survive brief Redis outages, not
/// serve as a faithful list implementation.
#[derive(Default)]
pub struct LocalFallbackKv {
    entries: Mutex<HashMap<String, Entry>>,
}

impl LocalFallbackKv {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn sweep_if_full(entries: &mut HashMap<String, Entry>) {
        if entries.len() < MAX_ENTRIES {
            return;
        }
        let mut oldest: Vec<(String, DateTime<Utc>)> =
            entries.iter().map(|(k, v)| (k.clone(), v.inserted_at)).collect();
        oldest.sort_by_key(|(_, inserted_at)| *inserted_at);
        let evict = oldest.len().saturating_sub(MAX_ENTRIES) + MAX_ENTRIES / 10;
        for (key, _) in oldest.into_iter().take(evict.max(1)) {
            entries.remove(&key);
        }
    }

    fn get_live<'a>(entries: &'a HashMap<String, Entry>, key: &str, now: DateTime<Utc>) -> Option<&'a Entry> {
        entries.get(key).filter(|entry| match entry.expires_at {
            Some(expires_at) => expires_at > now,
            None => true,
        })
    }
}

#[async_trait]
impl KvAdapter for LocalFallbackKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let now = Self::now();
        let entries = self.entries.lock().expect("local kv mutex poisoned");
        Ok(Self::get_live(&entries, key, now).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), KvError> {
        let now = Self::now();
        let mut entries = self.entries.lock().expect("local kv mutex poisoned");
        Self::sweep_if_full(&mut entries);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| now + chrono::Duration::from_std(ttl).unwrap_or_default()),
                inserted_at: now,
            },
        );
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, KvError> {
        let now = Self::now();
        let mut entries = self.entries.lock().expect("local kv mutex poisoned");
        if Self::get_live(&entries, key, now).is_some() {
            return Ok(false);
        }
        Self::sweep_if_full(&mut entries);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(now + chrono::Duration::from_std(ttl).unwrap_or_default()),
                inserted_at: now,
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        let mut entries = self.entries.lock().expect("local kv mutex poisoned");
        entries.remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str, ttl: Option<Duration>) -> Result<i64, KvError> {
        let now = Self::now();
        let mut entries = self.entries.lock().expect("local kv mutex poisoned");
        let current = Self::get_live(&entries, key, now)
            .and_then(|entry| entry.value.parse::<i64>().ok())
            .unwrap_or(0);
        let next = current + 1;
        let expires_at = if current == 0 {
            ttl.map(|ttl| now + chrono::Duration::from_std(ttl).unwrap_or_default())
        } else {
            entries.get(key).and_then(|entry| entry.expires_at)
        };
        Self::sweep_if_full(&mut entries);
        entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
                inserted_at: now,
            },
        );
        Ok(next)
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<(), KvError> {
        let now = Self::now();
        let mut entries = self.entries.lock().expect("local kv mutex poisoned");
        let existing = Self::get_live(&entries, key, now).map(|entry| entry.value.clone());
        let expires_at = entries.get(key).and_then(|entry| entry.expires_at);
        let combined = match existing {
            Some(existing) => format!("{value}\n{existing}"),
            None => value.to_string(),
        };
        Self::sweep_if_full(&mut entries);
        entries.insert(
            key.to_string(),
            Entry {
                value: combined,
                expires_at,
                inserted_at: now,
            },
        );
        Ok(())
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), KvError> {
        let now = Self::now();
        let mut entries = self.entries.lock().expect("local kv mutex poisoned");
        if let Some(entry) = entries.get_mut(key) {
            let items: Vec<&str> = entry.value.split('\n').collect();
            let len = items.len() as isize;
            let normalize = |i: isize| -> usize {
                if i < 0 {
                    (len + i).max(0) as usize
                } else {
                    i.min(len) as usize
                }
            };
            let (start, stop) = (normalize(start), normalize(stop));
            let trimmed = if start <= stop && start < items.len() {
                items[start..=stop.min(items.len().saturating_sub(1))].join("\n")
            } else {
                String::new()
            };
            entry.value = trimmed;
            entry.inserted_at = now;
        }
        Ok(())
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, KvError> {
        let now = Self::now();
        let entries = self.entries.lock().expect("local kv mutex poisoned");
        let Some(entry) = Self::get_live(&entries, key, now) else {
            return Ok(Vec::new());
        };
        if entry.value.is_empty() {
            return Ok(Vec::new());
        }
        let items: Vec<String> = entry.value.split('\n').map(str::to_string).collect();
        let len = items.len() as isize;
        let normalize = |i: isize| -> usize {
            if i < 0 {
                (len + i).max(0) as usize
            } else {
                i.min(len.saturating_sub(1).max(0)) as usize
            }
        };
        let (start, stop) = (normalize(start), normalize(stop));
        if start > stop || items.is_empty() {
            return Ok(Vec::new());
        }
        Ok(items[start..=stop].to_vec())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), KvError> {
        let now = Self::now();
        let mut entries = self.entries.lock().expect("local kv mutex poisoned");
        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Some(now + chrono::Duration::from_std(ttl).unwrap_or_default());
        }
        Ok(())
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        let now = Self::now();
        let entries = self.entries.lock().expect("local kv mutex poisoned");
        let regex_pattern = glob_to_regex(pattern);
        let re = regex_lite_compile(&regex_pattern);
        Ok(entries
            .iter()
            .filter(|(key, entry)| re.is_match(key) && entry_is_live(entry, now))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

fn entry_is_live(entry: &Entry, now: DateTime<Utc>) -> bool {
    match entry.expires_at {
        Some(expires_at) => expires_at > now,
        None => true,
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c if "\\.+()|[]{}^$".contains(c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('$');
    out
}

fn regex_lite_compile(pattern: &str) -> regex_lite::Regex {
    regex_lite::Regex::new(pattern).expect("glob_to_regex always produces a valid pattern")
}

//! Time-boxed response cache
//!
//! Entries are keyed by [`RequestIdentity`] and stay valid for a fixed TTL
//! after they are stored. Expiry is lazy: an expired entry is reported as
//! absent on read but is only replaced, never proactively removed. The cache
//! has no size bound.

use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::trace;

use super::identity::RequestIdentity;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    stored_at: Instant,
}

/// In-memory response cache with a fixed TTL
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: RwLock<HashMap<RequestIdentity, CacheEntry>>,
}

impl ResponseCache {
    /// Create an empty cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached payload for `identity`, if present and younger than the TTL
    pub async fn get(&self, identity: &RequestIdentity) -> Option<Value> {
        let entries = self.entries.read().await;
        let entry = entries.get(identity)?;
        if entry.stored_at.elapsed() < self.ttl {
            Some(entry.payload.clone())
        } else {
            trace!(identity = %identity, "cache entry expired");
            None
        }
    }

    /// Store `payload` for `identity`, replacing any previous entry
    pub async fn put(&self, identity: RequestIdentity, payload: Value) {
        let entry = CacheEntry {
            payload,
            stored_at: Instant::now(),
        };
        self.entries.write().await.insert(identity, entry);
    }

    /// Drop every entry
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries at all
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

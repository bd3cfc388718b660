//! Session storage for the per-session visit counter

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::AppResult;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Count this visit and return how many visits the session made before it
    async fn record_visit(&self, session_id: &str) -> AppResult<u64>;
}

struct Visits {
    count: u64,
    last_seen: Instant,
}

/// Process-local session store. A session is forgotten `ttl` after its last
/// visit, like the Redis key expiry.
#[derive(Clone)]
pub struct MemorySessionStore {
    visits: Arc<Mutex<HashMap<String, Visits>>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            visits: Arc::new(Mutex::new(HashMap::new())),
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    async fn record_visit_at(&self, session_id: &str, now: Instant) -> u64 {
        let mut visits = self.visits.lock().await;
        visits.retain(|_, v| now.saturating_duration_since(v.last_seen) < self.ttl);

        let entry = visits
            .entry(session_id.to_string())
            .or_insert(Visits { count: 0, last_seen: now });
        let previous = entry.count;
        entry.count += 1;
        entry.last_seen = now;
        previous
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn record_visit(&self, session_id: &str) -> AppResult<u64> {
        Ok(self.record_visit_at(session_id, Instant::now()).await)
    }
}

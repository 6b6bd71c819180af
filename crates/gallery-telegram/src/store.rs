//! Session store: summary messages and open readers.
//!
//! Two maps, each behind its own `RwLock`. Lookups share the lock; inserts,
//! page swaps and removals take it exclusively. Callers always get clones,
//! never references into the maps.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::session::{MessageKey, OriginRecord, ReadSession};

/// How many summary messages are remembered for opening readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Keep every origin for the life of the process.
    Unbounded,
    /// Keep at most this many, evicting the oldest-created first.
    Bounded(usize),
}

impl RetentionPolicy {
    /// `None` and `Some(0)` mean unbounded.
    pub fn from_capacity(capacity: Option<usize>) -> Self {
        match capacity {
            Some(n) if n > 0 => RetentionPolicy::Bounded(n),
            _ => RetentionPolicy::Unbounded,
        }
    }
}

/// Result of a compare-and-swap on a reader's page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The page was changed; carries the updated session.
    Swapped(ReadSession),
    /// The session moved on (or the target is out of range); carries its current state.
    Stale(ReadSession),
    /// No reader is registered for the message.
    Missing,
}

/// Storage for origin records and reader sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn origin(&self, key: MessageKey) -> Option<OriginRecord>;

    async fn put_origin(&self, key: MessageKey, origin: OriginRecord);

    async fn reader(&self, key: MessageKey) -> Option<ReadSession>;

    async fn put_reader(&self, key: MessageKey, session: ReadSession);

    /// Remove a reader. Only one of several concurrent callers gets `Some`.
    async fn remove_reader(&self, key: MessageKey) -> Option<ReadSession>;

    /// Set the reader's page to `page` if it is still at `expected`.
    async fn swap_page(&self, key: MessageKey, expected: usize, page: usize) -> SwapOutcome;
}

#[derive(Debug)]
struct OriginMap {
    entries: HashMap<MessageKey, OriginRecord>,
    created: VecDeque<MessageKey>,
    policy: RetentionPolicy,
}

impl OriginMap {
    fn insert(&mut self, key: MessageKey, origin: OriginRecord) {
        if self.entries.insert(key, origin).is_none() {
            self.created.push_back(key);
        }

        if let RetentionPolicy::Bounded(capacity) = self.policy {
            while self.entries.len() > capacity {
                let Some(oldest) = self.created.pop_front() else {
                    break;
                };
                if let Some(evicted) = self.entries.remove(&oldest) {
                    debug!(code = %evicted.code, message_id = oldest.message.0, "Evicted origin record");
                }
            }
        }
    }
}

/// In-memory [`SessionStore`].
#[derive(Debug)]
pub struct MemorySessionStore {
    origins: RwLock<OriginMap>,
    readers: RwLock<HashMap<MessageKey, ReadSession>>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(RetentionPolicy::Unbounded)
    }
}

impl MemorySessionStore {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            origins: RwLock::new(OriginMap {
                entries: HashMap::new(),
                created: VecDeque::new(),
                policy,
            }),
            readers: RwLock::new(HashMap::new()),
        }
    }

    pub async fn origin_count(&self) -> usize {
        self.origins.read().await.entries.len()
    }

    pub async fn reader_count(&self) -> usize {
        self.readers.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn origin(&self, key: MessageKey) -> Option<OriginRecord> {
        self.origins.read().await.entries.get(&key).cloned()
    }

    async fn put_origin(&self, key: MessageKey, origin: OriginRecord) {
        self.origins.write().await.insert(key, origin);
    }

    async fn reader(&self, key: MessageKey) -> Option<ReadSession> {
        self.readers.read().await.get(&key).cloned()
    }

    async fn put_reader(&self, key: MessageKey, session: ReadSession) {
        self.readers.write().await.insert(key, session);
    }

    async fn remove_reader(&self, key: MessageKey) -> Option<ReadSession> {
        self.readers.write().await.remove(&key)
    }

    async fn swap_page(&self, key: MessageKey, expected: usize, page: usize) -> SwapOutcome {
        let mut readers = self.readers.write().await;
        let Some(session) = readers.get_mut(&key) else {
            return SwapOutcome::Missing;
        };

        if session.current != expected || page >= session.total {
            return SwapOutcome::Stale(session.clone());
        }

        session.current = page;
        SwapOutcome::Swapped(session.clone())
    }
}

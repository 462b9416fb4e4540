use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use chrono::Utc;

use crate::message::MessageId;

/// Source of fresh message ids. Every call must return an id not handed out before.
pub trait IdGenerator {
    fn next_id(&self) -> MessageId;
}

/// Production ids: `msg-<unix millis>-<random hex>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeRandomIds;

impl IdGenerator for TimeRandomIds {
    fn next_id(&self) -> MessageId {
        let millis = Utc::now().timestamp_millis();
        let suffix: u64 = rand::random();
        MessageId::new(format!("msg-{millis}-{suffix:x}"))
    }
}

/// Deterministic ids (`<prefix>-1`, `<prefix>-2`, ...), mainly for tests.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("msg")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> MessageId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        MessageId::new(format!("{}-{n}", self.prefix))
    }
}

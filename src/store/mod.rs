pub mod memory;

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

use crate::error::Result;
use crate::models::{CalculationRecord, NewCalculation};

pub use memory::MemoryStore;

/// Ordered collection of saved calculations.
///
/// Implementations serialize writes. A read that starts after a write
/// returned observes that write, and change notifications are delivered in
/// commit order.
pub trait CalculationStore: Send + Sync {
    /// Store a calculation. A `None` id gets a fresh one; an explicit id
    /// replaces whatever record held it.
    fn insert(&self, calc: NewCalculation) -> Result<CalculationRecord>;

    /// All records, most recent first.
    fn list_all(&self) -> Result<Vec<CalculationRecord>>;

    fn list_by_year(&self, year: i32) -> Result<Vec<CalculationRecord>>;

    fn get_by_id(&self, id: i64) -> Result<Option<CalculationRecord>>;

    /// Returns whether a record was removed. Unknown ids are a no-op.
    fn delete_by_id(&self, id: i64) -> Result<bool>;

    /// Returns the number of records removed.
    fn delete_all(&self) -> Result<usize>;

    fn subscribe(&self) -> Receiver<StoreChange>;

    /// Number of committed changes so far, for callers that poll.
    fn version(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted(i64),
    Deleted(i64),
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange {
    pub version: u64,
    pub kind: ChangeKind,
}

/// Fan-out of committed changes. `publish` must be called while the store's
/// write lock is held so versions follow commit order.
#[derive(Debug, Default)]
pub struct ChangeFeed {
    inner: Mutex<FeedState>,
}

#[derive(Debug, Default)]
struct FeedState {
    version: u64,
    subscribers: Vec<Sender<StoreChange>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<StoreChange> {
        let (tx, rx) = channel();
        match self.inner.lock() {
            Ok(mut state) => state.subscribers.push(tx),
            Err(poisoned) => poisoned.into_inner().subscribers.push(tx),
        }
        rx
    }

    pub fn version(&self) -> u64 {
        match self.inner.lock() {
            Ok(state) => state.version,
            Err(poisoned) => poisoned.into_inner().version,
        }
    }

    pub fn publish(&self, kind: ChangeKind) {
        let mut state = match self.inner.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.version += 1;
        let change = StoreChange {
            version: state.version,
            kind,
        };
        let before = state.subscribers.len();
        state.subscribers.retain(|tx| tx.send(change).is_ok());
        let dropped = before - state.subscribers.len();
        if dropped > 0 {
            log::warn!("Dropped {dropped} disconnected store subscriber(s)");
        }
    }
}

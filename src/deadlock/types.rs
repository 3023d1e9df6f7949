// Deadlock Detector Types
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static TRANSACTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl TransactionId {
    pub fn new() -> Self {
        TransactionId(TRANSACTION_ID_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for TransactionId {
    fn from(raw: u64) -> Self {
        TransactionId(raw)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// One simple cycle through a queried transaction.
///
/// Members are listed in traversal order starting at the queried node; the
/// closing hop back to it is implicit and not repeated. Discovery order
/// across cycles of the same query is unspecified, so compare member sets
/// rather than sequences when the traversal order does not matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    members: Vec<TransactionId>,
}

impl Cycle {
    pub(crate) fn new(members: Vec<TransactionId>) -> Self {
        Cycle { members }
    }

    pub fn members(&self) -> &[TransactionId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, txn: TransactionId) -> bool {
        self.members.contains(&txn)
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for member in &self.members {
            write!(f, "{} -> ", member)?;
        }
        match self.members.first() {
            Some(start) => write!(f, "{}", start),
            None => Ok(()),
        }
    }
}

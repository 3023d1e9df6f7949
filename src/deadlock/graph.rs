// Wait-For Graph Store
use super::detect::CycleLimits;
use super::types::TransactionId;
use ahash::{AHashMap, AHashSet};
use std::fmt::Write;

/// Directed wait-for graph over transaction ids.
///
/// Maps each waiting transaction to the set of transactions holding a lock
/// it wants. A transaction absent from the map simply has no outgoing
/// edges; nodes are never pre-registered and queries on unknown ids are
/// trivial. The graph owns only identifiers, never transaction state.
pub struct WaitForGraph {
    edges: AHashMap<TransactionId, AHashSet<TransactionId>>,
    limits: CycleLimits,
}

impl WaitForGraph {
    pub fn new() -> Self {
        Self::with_limits(CycleLimits::default())
    }

    pub fn with_limits(limits: CycleLimits) -> Self {
        WaitForGraph {
            edges: AHashMap::new(),
            limits,
        }
    }

    pub fn limits(&self) -> CycleLimits {
        self.limits
    }

    /// Registers that `waiter` is blocked on `blocker`.
    ///
    /// Re-adding an existing edge is a no-op, as is a self-edge
    /// (`waiter == blocker`); the graph never stores a self-loop.
    pub fn add_edge(&mut self, waiter: TransactionId, blocker: TransactionId) {
        if waiter == blocker {
            return;
        }
        self.edges.entry(waiter).or_default().insert(blocker);
    }

    /// Removes `txn` as both waiter and blocker, so a resolved, committed,
    /// or aborted transaction leaves no stale edges behind.
    pub fn remove_node(&mut self, txn: TransactionId) {
        self.edges.remove(&txn);
        self.edges.retain(|_, blockers| {
            blockers.remove(&txn);
            !blockers.is_empty()
        });
    }

    /// Drops only `txn`'s outgoing edges. Edges where `txn` is the blocker
    /// stay: other transactions may still be waiting on it.
    pub fn clear_waits(&mut self, txn: TransactionId) {
        self.edges.remove(&txn);
    }

    /// The current direct blockers of `txn`; empty for unknown ids.
    pub fn successors(&self, txn: TransactionId) -> impl Iterator<Item = TransactionId> + '_ {
        self.edges
            .get(&txn)
            .into_iter()
            .flat_map(|blockers| blockers.iter().copied())
    }

    pub fn is_waiting(&self, txn: TransactionId) -> bool {
        self.edges.contains_key(&txn)
    }

    pub fn node_count(&self) -> usize {
        let mut nodes = AHashSet::new();
        for (waiter, blockers) in &self.edges {
            nodes.insert(*waiter);
            nodes.extend(blockers.iter().copied());
        }
        nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|blockers| blockers.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Renders the adjacency lists as one line per waiter, ids ascending,
    /// so test output stays stable across runs. Read-only.
    pub fn dump(&self) -> String {
        let mut waiters: Vec<TransactionId> = self.edges.keys().copied().collect();
        waiters.sort();

        let mut out = String::new();
        for waiter in waiters {
            if let Some(blockers) = self.edges.get(&waiter) {
                let mut blockers: Vec<TransactionId> = blockers.iter().copied().collect();
                blockers.sort();
                let list: Vec<String> = blockers.iter().map(TransactionId::to_string).collect();
                let _ = writeln!(out, "{} -> {}", waiter, list.join(", "));
            }
        }
        out
    }
}

impl Default for WaitForGraph {
    fn default() -> Self {
        Self::new()
    }
}

// Shared Deadlock Detector
//
// Detection is only correct against a globally consistent snapshot of
// waits, so every mutation and query runs under one exclusive critical
// section spanning the whole graph. Each public call is linearizable with
// respect to all others; none of them blocks beyond the mutex itself.
use super::detect::CycleLimits;
use super::graph::WaitForGraph;
use super::types::{Cycle, TransactionId};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use tracing::{debug, warn};

pub struct DeadlockDetector {
    graph: Mutex<WaitForGraph>,
}

impl DeadlockDetector {
    pub fn new() -> Self {
        DeadlockDetector {
            graph: Mutex::new(WaitForGraph::new()),
        }
    }

    pub fn with_limits(limits: CycleLimits) -> Self {
        DeadlockDetector {
            graph: Mutex::new(WaitForGraph::with_limits(limits)),
        }
    }

    /// Registers `waiter` as blocked on every transaction in `blockers`,
    /// then checks whether the new wait closes a cycle, all in a single
    /// critical section.
    ///
    /// On deadlock the registration is backed out (the waiter's outgoing
    /// edges are dropped; edges where it is the blocker stay) and the
    /// cycles through `waiter` are returned in the error so the caller can
    /// pick a victim. The cycle list is subject to the configured
    /// `CycleLimits` and may be partial.
    pub fn register_wait(&self, waiter: TransactionId, blockers: &[TransactionId]) -> Result<()> {
        let mut graph = self.graph.lock();

        for &blocker in blockers {
            graph.add_edge(waiter, blocker);
        }

        if graph.exist_cycle_from(waiter) {
            let mut cycles = Vec::new();
            graph.find_cycles_from(waiter, &mut cycles);
            graph.clear_waits(waiter);
            warn!(
                "Deadlock detected: {} closes {} cycle(s), wait refused",
                waiter,
                cycles.len()
            );
            return Err(Error::DeadlockDetected { waiter, cycles });
        }

        debug!("{} now waits on {} transaction(s)", waiter, blockers.len());
        Ok(())
    }

    /// Prunes every edge touching `txn`. Called when its wait resolves:
    /// the lock was granted, or the transaction committed or aborted.
    pub fn retire_wait(&self, txn: TransactionId) {
        let mut graph = self.graph.lock();
        graph.remove_node(txn);
        debug!("{} retired from wait-for graph", txn);
    }

    pub fn would_deadlock(&self, txn: TransactionId) -> bool {
        self.graph.lock().exist_cycle_from(txn)
    }

    pub fn cycles_from(&self, txn: TransactionId) -> Vec<Cycle> {
        let graph = self.graph.lock();
        let mut cycles = Vec::new();
        graph.find_cycles_from(txn, &mut cycles);
        cycles
    }

    pub fn dump(&self) -> String {
        self.graph.lock().dump()
    }
}

impl Default for DeadlockDetector {
    fn default() -> Self {
        Self::new()
    }
}

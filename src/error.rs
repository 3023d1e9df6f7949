use thiserror::Error;

use crate::deadlock::{Cycle, TransactionId};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Deadlock detected: transaction {waiter} would close a wait-for cycle")]
    DeadlockDetected {
        waiter: TransactionId,
        cycles: Vec<Cycle>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

//! Transaction pool for submitted, not-yet-sealed transactions.
//!
//! The pool is a plain ordered staging area. It does not deduplicate, cap, or
//! validate; invalid transactions are weeded out when a block is assembled.

use parking_lot::Mutex;
use powchain_core::Transaction;

/// Thread-safe staging area feeding the block assembler.
#[derive(Debug, Default)]
pub struct TransactionPool {
    /// Pending transactions in submission order.
    pending: Mutex<Vec<Transaction>>,
}

impl TransactionPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction to the pool.
    pub fn submit(&self, tx: Transaction) {
        self.pending.lock().push(tx);
    }

    /// Append several transactions under a single lock, keeping their order.
    pub fn submit_batch(&self, txs: impl IntoIterator<Item = Transaction>) {
        self.pending.lock().extend(txs);
    }

    /// Put transactions back ahead of everything staged since they were drained.
    pub fn requeue_front(&self, txs: impl IntoIterator<Item = Transaction>) {
        let mut pending = self.pending.lock();
        pending.splice(0..0, txs);
    }

    /// Remove and return every staged transaction, leaving the pool empty.
    pub fn drain(&self) -> Vec<Transaction> {
        std::mem::take(&mut *self.pending.lock())
    }

    /// Get the number of staged transactions.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Check if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

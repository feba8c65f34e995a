//! In-memory ledger: the chain head and every appended block.

use parking_lot::Mutex;
use powchain_core::{Block, Hash};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from checked ledger updates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("block does not extend head (head {head}, prev_hash {prev_hash})")]
    NotOnHead { head: Hash, prev_hash: Hash },

    #[error("block already known: {0}")]
    DuplicateBlock(Hash),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Default)]
struct LedgerInner {
    head: Hash,
    blocks: HashMap<Hash, Block>,
}

impl LedgerInner {
    fn insert(&mut self, block: Block) {
        self.head = block.hash;
        self.blocks.insert(block.hash, block);
    }
}

/// Chain head plus append-only block map, under one lock.
#[derive(Debug, Default)]
pub struct LedgerState {
    inner: Mutex<LedgerInner>,
}

impl LedgerState {
    /// Create an empty ledger whose head is [`Hash::ZERO`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `block` and make it the head, without any linkage check.
    pub fn append(&self, block: Block) {
        self.inner.lock().insert(block);
    }

    /// Store `block` only if it extends the current head and is not known yet.
    pub fn try_extend(&self, block: Block) -> Result<()> {
        let mut inner = self.inner.lock();
        if block.prev_hash != inner.head {
            return Err(LedgerError::NotOnHead {
                head: inner.head,
                prev_hash: block.prev_hash,
            });
        }
        if inner.blocks.contains_key(&block.hash) {
            return Err(LedgerError::DuplicateBlock(block.hash));
        }
        inner.insert(block);
        Ok(())
    }

    /// Hash of the most recently appended block.
    pub fn current_head(&self) -> Hash {
        self.inner.lock().head
    }

    /// Get a block by its hash.
    pub fn get(&self, hash: &Hash) -> Option<Block> {
        self.inner.lock().blocks.get(hash).cloned()
    }

    /// Get the head block, if any block was appended.
    pub fn head_block(&self) -> Option<Block> {
        let inner = self.inner.lock();
        inner.blocks.get(&inner.head).cloned()
    }

    /// Get the number of stored blocks.
    pub fn len(&self) -> usize {
        self.inner.lock().blocks.len()
    }

    /// Check if no block has been appended.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().blocks.is_empty()
    }

    /// Blocks from head back to the first, following `prev_hash` links.
    ///
    /// Stops at [`Hash::ZERO`] or at the first unknown parent.
    pub fn chain(&self) -> Vec<Block> {
        let inner = self.inner.lock();
        let mut out = Vec::new();
        let mut cursor = inner.head;
        while let Some(block) = inner.blocks.get(&cursor) {
            cursor = block.prev_hash;
            out.push(block.clone());
            if out.len() > inner.blocks.len() {
                break;
            }
        }
        out
    }
}

//! Block assembly: ordering, filtering, and sealing a batch of transactions.
//!
//! Every node must turn the same candidate set into the same block, so the
//! ordering is a stable sort by timestamp (ties keep submission order) and
//! invalid transactions are dropped without disturbing the rest.

use powchain_consensus::{CancelToken, Miner, MiningError, TransactionValidator};
use powchain_core::{seal_hash, Block, Hash, Transaction};
use tracing::{debug, info};

/// Ordered valid transactions plus the pre-image handed to the miner.
#[derive(Debug, Clone, PartialEq)]
pub struct SealInput {
    pub transactions: Vec<Transaction>,
    pub prev_hash: Hash,
    pub seal_hash: Hash,
}

/// Turns drained pool contents into sealed blocks.
#[derive(Clone, Default)]
pub struct BlockAssembler {
    validator: TransactionValidator,
    miner: Miner,
}

impl BlockAssembler {
    pub fn new(validator: TransactionValidator, miner: Miner) -> Self {
        Self { validator, miner }
    }

    /// Sort, filter, and hash the candidates without mining.
    pub fn prepare(&self, mut candidates: Vec<Transaction>, prev_hash: Hash) -> SealInput {
        let total = candidates.len();

        // `sort_by_key` is stable
        candidates.sort_by_key(|tx| tx.timestamp);
        candidates.retain(|tx| self.validator.verify(tx));

        if candidates.len() != total {
            debug!(
                dropped = total - candidates.len(),
                kept = candidates.len(),
                "dropped invalid transactions"
            );
        }

        let seal_hash = seal_hash(&candidates, &prev_hash);
        SealInput {
            transactions: candidates,
            prev_hash,
            seal_hash,
        }
    }

    /// Assemble and mine a block. Blocks until a nonce is found.
    pub fn assemble(
        &self,
        candidates: Vec<Transaction>,
        prev_hash: Hash,
    ) -> Result<Block, MiningError> {
        self.assemble_with_cancel(candidates, prev_hash, &CancelToken::new())
    }

    /// Assemble and mine a block, giving up once `cancel` fires.
    pub fn assemble_with_cancel(
        &self,
        candidates: Vec<Transaction>,
        prev_hash: Hash,
        cancel: &CancelToken,
    ) -> Result<Block, MiningError> {
        let input = self.prepare(candidates, prev_hash);
        self.seal(input, cancel)
    }

    /// Mine a prepared input into a block.
    pub fn seal(&self, input: SealInput, cancel: &CancelToken) -> Result<Block, MiningError> {
        let mined = self.miner.mine_with_cancel(&input.seal_hash, cancel)?;

        info!(
            hash = %mined.hash,
            prev_hash = %input.prev_hash,
            txs = input.transactions.len(),
            nonce = mined.nonce,
            "assembled block"
        );

        Ok(Block {
            hash: mined.hash,
            nonce: mined.nonce,
            transactions: input.transactions,
            prev_hash: input.prev_hash,
        })
    }
}

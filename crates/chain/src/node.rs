//! Sealing node.
//!
//! This module brings together the pool, assembler, ledger, and transport.
//! Only one sealing pipeline runs at a time; the head it reads is always the
//! one written by the previous append.

use crate::assembler::BlockAssembler;
use crate::ledger::{LedgerError, LedgerState};
use crate::mempool::TransactionPool;
use crate::transport::Transport;
use parking_lot::Mutex;
use powchain_consensus::{
    BlockValidator, CancelToken, Miner, MiningError, PowConfig, TransactionValidator,
    ValidationError,
};
use powchain_core::{Block, Ed25519Verifier, Hash, Signature, SignatureVerifier, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Errors that can occur during node operations.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("mining error: {0}")]
    Mining(#[from] MiningError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("sealing aborted, chain head is {head}")]
    Aborted { head: Hash },

    #[error("sealing task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, NodeError>;

/// Node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Proof of work settings, shared by mining and inbound block checks.
    pub pow: PowConfig,
}

/// A single-process sealing node.
pub struct Node {
    pool: Arc<TransactionPool>,
    ledger: Arc<LedgerState>,
    assembler: BlockAssembler,
    block_validator: BlockValidator,
    transport: Arc<dyn Transport>,
    /// Serializes sealing pipelines.
    pipeline: Mutex<()>,
    /// Parent and cancel handle of the block being mined, if any.
    in_flight: Mutex<Option<(Hash, CancelToken)>>,
}

impl Node {
    /// Create a node using Ed25519 identities.
    pub fn new(config: NodeConfig, transport: Arc<dyn Transport>) -> Self {
        Self::with_verifier(config, Arc::new(Ed25519Verifier), transport)
    }

    /// Create a node backed by a custom identity capability.
    pub fn with_verifier(
        config: NodeConfig,
        verifier: Arc<dyn SignatureVerifier>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let validator = TransactionValidator::new(verifier);
        let difficulty = config.pow.difficulty.clone();

        Self {
            pool: Arc::new(TransactionPool::new()),
            ledger: Arc::new(LedgerState::new()),
            assembler: BlockAssembler::new(validator.clone(), Miner::new(config.pow)),
            block_validator: BlockValidator::new(validator, difficulty),
            transport,
            pipeline: Mutex::new(()),
            in_flight: Mutex::new(None),
        }
    }

    pub fn pool(&self) -> &Arc<TransactionPool> {
        &self.pool
    }

    pub fn ledger(&self) -> &Arc<LedgerState> {
        &self.ledger
    }

    /// Inbound transaction from a submitter or the transport.
    pub fn on_transaction_received(&self, tx: Transaction) {
        self.pool.submit(tx);
    }

    /// Check if a block is currently being mined.
    pub fn is_mining(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    /// Abort the in-flight search, if any. Returns whether one was running.
    pub fn cancel_mining(&self) -> bool {
        match &*self.in_flight.lock() {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Run one sealing pipeline: drain, assemble, mine, append, broadcast.
    ///
    /// Blocks for the whole nonce search. If the search is aborted or another
    /// block takes the head first, the drained valid transactions that did not
    /// make it into the chain go back to the pool.
    pub fn seal_block(&self) -> Result<Block> {
        let _pipeline = self.pipeline.lock();

        let candidates = self.pool.drain();
        let (prev_hash, cancel) = {
            let mut slot = self.in_flight.lock();
            let prev_hash = self.ledger.current_head();
            let cancel = CancelToken::new();
            *slot = Some((prev_hash, cancel.clone()));
            (prev_hash, cancel)
        };

        let input = self.assembler.prepare(candidates, prev_hash);
        let pending = input.transactions.clone();
        let sealed = self.assembler.seal(input, &cancel);
        *self.in_flight.lock() = None;

        let block = match sealed {
            Ok(block) => block,
            Err(MiningError::Cancelled { attempts }) => {
                let head = self.ledger.current_head();
                debug!(attempts, %head, "sealing cancelled");
                let winner = (head != prev_hash).then_some(head);
                self.requeue(pending, winner.as_ref());
                return Err(NodeError::Aborted { head });
            }
            Err(e) => {
                self.requeue(pending, None);
                return Err(e.into());
            }
        };

        match self.ledger.try_extend(block.clone()) {
            Ok(()) => {}
            Err(LedgerError::NotOnHead { head, .. }) => {
                warn!(hash = %block.hash, %head, "sealed block lost the race for the head");
                self.requeue(block.transactions, Some(&head));
                return Err(NodeError::Aborted { head });
            }
            Err(e) => return Err(e.into()),
        }

        self.transport.broadcast(&block);
        Ok(block)
    }

    /// Run [`Node::seal_block`] on the blocking thread pool.
    pub fn spawn_seal(self: &Arc<Self>) -> JoinHandle<Result<Block>> {
        let node = Arc::clone(self);
        tokio::task::spawn_blocking(move || node.seal_block())
    }

    /// Seal a block without tying up the async executor.
    pub async fn seal_block_async(self: &Arc<Self>) -> Result<Block> {
        self.spawn_seal()
            .await
            .map_err(|e| NodeError::Task(e.to_string()))?
    }

    /// Inbound sealed block from the transport.
    ///
    /// The block must extend the current head. On success it becomes the new
    /// head and any search racing for the same parent is cancelled.
    pub fn on_block_received(&self, block: Block) -> Result<()> {
        let head = self.ledger.current_head();
        self.block_validator.validate(&block, &head)?;

        let slot = self.in_flight.lock();
        let hash = block.hash;
        let prev_hash = block.prev_hash;
        self.ledger.try_extend(block)?;

        if let Some((mining_on, token)) = &*slot {
            if *mining_on == prev_hash {
                token.cancel();
            }
        }

        info!(%hash, %prev_hash, "accepted block from peer");
        Ok(())
    }

    /// Return transactions to the front of the pool, skipping any sealed in
    /// block `winner` when another block took the head.
    fn requeue(&self, transactions: Vec<Transaction>, winner: Option<&Hash>) {
        let sealed: HashSet<Signature> = winner
            .and_then(|hash| self.ledger.get(hash))
            .map(|b| b.transactions.into_iter().map(|tx| tx.signature).collect())
            .unwrap_or_default();

        let leftover: Vec<Transaction> = transactions
            .into_iter()
            .filter(|tx| !sealed.contains(&tx.signature))
            .collect();

        if !leftover.is_empty() {
            debug!(count = leftover.len(), "returning transactions to the pool");
            self.pool.requeue_front(leftover);
        }
    }
}

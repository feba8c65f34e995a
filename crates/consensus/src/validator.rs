//! Transaction and block validation rules.
//!
//! Transaction validation is total: [`TransactionValidator::verify`] folds
//! every failure into `false` so one bad transaction never aborts block
//! assembly. The reason is still available through [`TransactionValidator::check`]
//! and is logged at debug level.

use crate::pow::Difficulty;
use powchain_core::{Block, Ed25519Verifier, Hash, SignatureVerifier, Transaction, TransactionError};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("amount must be finite and non-negative (got {0})")]
    InvalidAmount(f64),

    #[error("transaction signature rejected: {0}")]
    InvalidSignature(#[from] TransactionError),

    #[error("block prev_hash mismatch (expected {expected}, got {got})")]
    InvalidPrevHash { expected: Hash, got: Hash },

    #[error("transactions not ordered by timestamp at index {index}")]
    OutOfOrder { index: usize },

    #[error("invalid transaction at index {index}: {source}")]
    InvalidTransaction {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("block hash does not match its contents")]
    HashMismatch,

    #[error("block hash does not meet difficulty prefix {prefix:?}")]
    InsufficientWork { prefix: String },
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Transaction validator.
#[derive(Clone)]
pub struct TransactionValidator {
    verifier: Arc<dyn SignatureVerifier>,
}

impl TransactionValidator {
    /// Create a validator backed by the given identity capability.
    pub fn new(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { verifier }
    }

    /// Check a transaction, returning the reason it is rejected.
    pub fn check(&self, tx: &Transaction) -> Result<()> {
        if !tx.amount.is_finite() || tx.amount < 0.0 {
            return Err(ValidationError::InvalidAmount(tx.amount));
        }
        tx.verify_with(self.verifier.as_ref())?;
        Ok(())
    }

    /// Check a transaction, folding any failure into `false`.
    pub fn verify(&self, tx: &Transaction) -> bool {
        match self.check(tx) {
            Ok(()) => true,
            Err(reason) => {
                debug!(%reason, timestamp = tx.timestamp, "transaction rejected");
                false
            }
        }
    }
}

impl Default for TransactionValidator {
    fn default() -> Self {
        Self::new(Arc::new(Ed25519Verifier))
    }
}

/// Validator for sealed blocks received from elsewhere.
#[derive(Clone, Default)]
pub struct BlockValidator {
    transactions: TransactionValidator,
    difficulty: Difficulty,
}

impl BlockValidator {
    pub fn new(transactions: TransactionValidator, difficulty: Difficulty) -> Self {
        Self {
            transactions,
            difficulty,
        }
    }

    /// Validate block extends the expected parent.
    pub fn validate_block_extends_parent(block: &Block, expected_prev: &Hash) -> Result<()> {
        if block.prev_hash != *expected_prev {
            return Err(ValidationError::InvalidPrevHash {
                expected: *expected_prev,
                got: block.prev_hash,
            });
        }
        Ok(())
    }

    /// Validate ordering and every transaction signature.
    pub fn validate_block_transactions(&self, block: &Block) -> Result<()> {
        for (index, pair) in block.transactions.windows(2).enumerate() {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(ValidationError::OutOfOrder { index: index + 1 });
            }
        }

        for (index, tx) in block.transactions.iter().enumerate() {
            self.transactions
                .check(tx)
                .map_err(|e| ValidationError::InvalidTransaction {
                    index,
                    source: Box::new(e),
                })?;
        }
        Ok(())
    }

    /// Validate the hash commits to the contents and meets the difficulty.
    pub fn validate_seal(&self, block: &Block) -> Result<()> {
        if block.recompute_hash() != block.hash {
            return Err(ValidationError::HashMismatch);
        }
        if !self.difficulty.is_satisfied_by(&block.hash) {
            return Err(ValidationError::InsufficientWork {
                prefix: self.difficulty.prefix().to_owned(),
            });
        }
        Ok(())
    }

    /// Full validation (linkage + transactions + seal).
    pub fn validate(&self, block: &Block, expected_prev: &Hash) -> Result<()> {
        Self::validate_block_extends_parent(block, expected_prev)?;
        self.validate_seal(block)?;
        self.validate_block_transactions(block)?;
        Ok(())
    }
}

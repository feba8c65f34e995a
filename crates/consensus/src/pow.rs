//! Proof of Work (PoW) nonce search.
//!
//! A block is sealed by finding the first nonce, counting up from zero, whose
//! `H(seal_hash ++ decimal(nonce))` renders in URL-safe base64 with a fixed
//! literal prefix. There is no retargeting: the prefix chosen at construction
//! is the difficulty for the lifetime of the miner.

use powchain_core::{pow_hash, Hash};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, trace};

/// Errors that can end a mining search without a result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MiningError {
    #[error("mining cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    #[error("nonce space exhausted")]
    NonceSpaceExhausted,
}

pub type Result<T> = std::result::Result<T, MiningError>;

/// The difficulty predicate: a literal prefix of the base64 URL hash text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Difficulty {
    prefix: String,
}

impl Difficulty {
    /// Prefix used by every node on the network.
    pub const DEFAULT_PREFIX: &'static str = "00";

    /// Create a difficulty with a custom prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Check whether `hash` meets this difficulty.
    pub fn is_satisfied_by(&self, hash: &Hash) -> bool {
        hash.to_base64_url().starts_with(&self.prefix)
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

/// Proof of Work configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowConfig {
    /// Acceptance predicate for candidate hashes.
    pub difficulty: Difficulty,
    /// Emit a progress trace every this many attempts (0 disables).
    pub progress_interval: u64,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            progress_interval: 1_000,
        }
    }
}

/// Shared flag used to abort an in-flight search.
///
/// Clones observe the same flag. Cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A successful search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinedSeal {
    pub nonce: u64,
    pub hash: Hash,
}

/// Brute-force nonce searcher.
#[derive(Debug, Clone, Default)]
pub struct Miner {
    config: PowConfig,
}

impl Miner {
    /// Create a new miner with the given configuration.
    pub fn new(config: PowConfig) -> Self {
        Self { config }
    }

    pub fn difficulty(&self) -> &Difficulty {
        &self.config.difficulty
    }

    /// Search for a nonce without any way to stop early.
    ///
    /// Blocks the calling thread until a match is found.
    pub fn mine(&self, seal_hash: &Hash) -> Result<MinedSeal> {
        self.mine_with_cancel(seal_hash, &CancelToken::new())
    }

    /// Search for a nonce, checking `cancel` before every attempt.
    pub fn mine_with_cancel(&self, seal_hash: &Hash, cancel: &CancelToken) -> Result<MinedSeal> {
        let start = Instant::now();
        let interval = self.config.progress_interval;
        debug!(seal_hash = %seal_hash, prefix = self.difficulty().prefix(), "mining started");

        for nonce in 0..=u64::MAX {
            if cancel.is_cancelled() {
                debug!(attempts = nonce, "mining cancelled");
                return Err(MiningError::Cancelled { attempts: nonce });
            }

            let hash = pow_hash(seal_hash, nonce);
            if self.config.difficulty.is_satisfied_by(&hash) {
                info!(
                    nonce,
                    hash = %hash.to_base64_url(),
                    elapsed = ?start.elapsed(),
                    "🔨 block sealed"
                );
                return Ok(MinedSeal { nonce, hash });
            }

            if interval != 0 && nonce % interval == 0 {
                trace!(nonce, hash = %hash.to_base64_url(), "still mining");
            }
        }

        Err(MiningError::NonceSpaceExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powchain_core::hash;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_default_difficulty_prefix() {
        assert_eq!(Difficulty::default().prefix(), "00");
        assert_eq!(PowConfig::default().difficulty, Difficulty::default());
    }

    #[test]
    fn test_mined_hash_meets_difficulty() {
        let seal = hash(b"some transactions");
        let mined = Miner::default().mine(&seal).unwrap();

        assert_eq!(mined.hash, pow_hash(&seal, mined.nonce));
        assert!(mined.hash.to_base64_url().starts_with("00"));
    }

    #[test]
    fn test_first_matching_nonce_is_returned() {
        let seal = hash(b"first match");
        let miner = Miner::default();
        let mined = miner.mine(&seal).unwrap();

        for nonce in 0..mined.nonce {
            let candidate = pow_hash(&seal, nonce);
            assert!(
                !candidate.to_base64_url().starts_with("00"),
                "nonce {} already satisfied the predicate",
                nonce
            );
        }
    }

    #[test]
    fn test_mining_is_deterministic() {
        let seal = hash(b"same input");
        let a = Miner::default().mine(&seal).unwrap();
        let b = Miner::default().mine(&seal).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_prefix_accepts_nonce_zero() {
        let miner = Miner::new(PowConfig {
            difficulty: Difficulty::new(""),
            progress_interval: 0,
        });
        let mined = miner.mine(&Hash::ZERO).unwrap();
        assert_eq!(mined.nonce, 0);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();

        let result = Miner::default().mine_with_cancel(&Hash::ZERO, &token);
        assert_eq!(result, Err(MiningError::Cancelled { attempts: 0 }));
    }

    #[test]
    fn test_cancel_from_another_thread() {
        // '!' is outside the base64 alphabet, so this search never succeeds.
        let miner = Miner::new(PowConfig {
            difficulty: Difficulty::new("!"),
            progress_interval: 0,
        });
        let token = CancelToken::new();
        let remote = token.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });

        let result = miner.mine_with_cancel(&Hash::ZERO, &token);
        handle.join().unwrap();

        assert!(matches!(result, Err(MiningError::Cancelled { .. })));
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_pow_config_from_json() {
        let config: PowConfig = serde_json::from_str(r#"{"difficulty":"0"}"#).unwrap();
        assert_eq!(config.difficulty.prefix(), "0");
        assert_eq!(config.progress_interval, 1_000);
    }
}

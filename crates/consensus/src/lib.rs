//! Proof of Work consensus rules for powchain.
//!
//! This crate provides:
//! - The nonce search and its fixed difficulty predicate
//! - Transaction validation (amount and signature checks)
//! - Block validation (parent link, ordering, seal)
//!
//! # Example
//!
//! ```rust,no_run
//! use powchain_consensus::{Miner, PowConfig, TransactionValidator};
//! use powchain_core::{seal_hash, Hash, Keypair, Signer, Transaction};
//!
//! let alice = Keypair::generate();
//! let tx = Transaction::transfer(&alice, alice.public_key_pem(), 10.0);
//!
//! let validator = TransactionValidator::default();
//! assert!(validator.verify(&tx));
//!
//! let miner = Miner::new(PowConfig::default());
//! let mined = miner.mine(&seal_hash(&[tx], &Hash::ZERO)).unwrap();
//! assert!(mined.hash.to_base64_url().starts_with("00"));
//! ```

pub mod pow;
pub mod validator;

// Re-export commonly used types
pub use pow::{CancelToken, Difficulty, MinedSeal, Miner, MiningError, PowConfig};
pub use validator::{BlockValidator, TransactionValidator, ValidationError};

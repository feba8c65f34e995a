//! Core ledger primitives for powchain.
//!
//! This crate provides the fundamental types used throughout the node:
//! - SHA-256 hashing and the base64 rendering used by the difficulty check
//! - The identity capability (signing, verification, PEM key handles)
//! - Transactions and their canonical encoding
//! - Blocks and the hash rules that chain them together

pub mod block;
pub mod crypto;
pub mod hash;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{pow_hash, seal_hash, signature_digest_input, Block};
pub use crypto::{CryptoError, Ed25519Verifier, Keypair, Signature, SignatureVerifier, Signer};
pub use hash::{hash, hash_concat, Hash, H256};
pub use transaction::{current_timestamp, Transaction, TransactionError};

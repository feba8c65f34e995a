//! Block sealing pipeline for powchain.
//!
//! This crate brings together all components to turn submitted transactions
//! into a hash-linked chain:
//! - **Mempool**: staging area for submitted transactions
//! - **Assembler**: deterministic ordering, filtering, and mining
//! - **Ledger**: chain head and block map
//! - **Transport**: outbound boundary for sealed blocks
//! - **Node**: the sequential sealing pipeline tying them together
//!
//! # Example
//!
//! ```rust,no_run
//! use powchain_chain::{Node, NodeConfig, NullTransport};
//! use powchain_core::{Keypair, Signer, Transaction};
//! use std::sync::Arc;
//!
//! let node = Node::new(NodeConfig::default(), Arc::new(NullTransport));
//!
//! let alice = Keypair::generate();
//! let bob = Keypair::generate();
//! node.on_transaction_received(Transaction::transfer(&alice, bob.public_key_pem(), 10.0));
//!
//! let block = node.seal_block().unwrap();
//! assert_eq!(node.ledger().current_head(), block.hash);
//! ```

pub mod assembler;
pub mod ledger;
pub mod mempool;
pub mod node;
pub mod transport;

// Re-export commonly used types
pub use assembler::{BlockAssembler, SealInput};
pub use ledger::{LedgerError, LedgerState};
pub use mempool::TransactionPool;
pub use node::{Node, NodeConfig, NodeError};
pub use transport::{ChannelTransport, NullTransport, Transport};

//! Outbound side of the peer transport.
//!
//! Gossip, discovery and delivery guarantees belong to the transport; the
//! node only hands it sealed blocks.

use powchain_core::Block;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{trace, warn};

/// Sink for sealed blocks.
pub trait Transport: Send + Sync {
    /// Publish a freshly appended block to peers.
    fn broadcast(&self, block: &Block);
}

/// Discards every broadcast.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn broadcast(&self, block: &Block) {
        trace!(hash = %block.hash, "broadcast discarded");
    }
}

/// Forwards encoded blocks to a channel drained by the networking task.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    outbound: UnboundedSender<Vec<u8>>,
}

impl ChannelTransport {
    pub fn new(outbound: UnboundedSender<Vec<u8>>) -> Self {
        Self { outbound }
    }
}

impl Transport for ChannelTransport {
    fn broadcast(&self, block: &Block) {
        if self.outbound.send(block.encode()).is_err() {
            warn!(hash = %block.hash, "outbound channel closed, block not broadcast");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powchain_core::Hash;
    use tokio::sync::mpsc;

    fn block() -> Block {
        Block {
            hash: Hash([1u8; 32]),
            nonce: 3,
            transactions: vec![],
            prev_hash: Hash::ZERO,
        }
    }

    #[test]
    fn test_channel_transport_sends_encoded_block() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let transport = ChannelTransport::new(tx);

        transport.broadcast(&block());

        let bytes = rx.try_recv().unwrap();
        assert_eq!(Block::decode(&bytes).unwrap(), block());
    }

    #[test]
    fn test_channel_transport_closed_receiver_is_not_fatal() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        ChannelTransport::new(tx).broadcast(&block());
    }
}

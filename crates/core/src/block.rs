//! Sealed blocks and the hashing rules that link them.

use crate::hash::{hash, hash_concat, Hash};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// A sealed block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Proof-of-work hash identifying this block.
    pub hash: Hash,
    /// Nonce found by the mining search.
    pub nonce: u64,
    /// Valid transactions, ordered by ascending timestamp.
    pub transactions: Vec<Transaction>,
    /// Hash of the previous block, [`Hash::ZERO`] for the first block.
    pub prev_hash: Hash,
}

impl Block {
    /// Recompute the proof-of-work hash from the block contents.
    pub fn recompute_hash(&self) -> Hash {
        pow_hash(&seal_hash(&self.transactions, &self.prev_hash), self.nonce)
    }

    /// Check if this block is the first one of its chain.
    pub fn is_genesis_child(&self) -> bool {
        self.prev_hash == Hash::ZERO
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Encode for the transport.
    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).expect("serialization should not fail")
    }

    /// Decode bytes produced by [`Block::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Concatenation of every transaction signature, in order.
pub fn signature_digest_input(transactions: &[Transaction]) -> Vec<u8> {
    transactions
        .iter()
        .flat_map(|tx| tx.signature.as_bytes().iter().copied())
        .collect()
}

/// Pre-image handed to the miner: `H(signatures ++ prev_hash)`.
pub fn seal_hash(transactions: &[Transaction], prev_hash: &Hash) -> Hash {
    let digest_input = signature_digest_input(transactions);
    hash_concat(&[&digest_input, prev_hash.as_bytes()])
}

/// Candidate block hash for a nonce: `H(seal_hash ++ decimal(nonce))`.
pub fn pow_hash(seal_hash: &Hash, nonce: u64) -> Hash {
    let mut bits = Vec::with_capacity(32 + 20);
    bits.extend_from_slice(seal_hash.as_bytes());
    bits.extend_from_slice(nonce.to_string().as_bytes());
    hash(&bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Keypair, Signature};

    fn tx_with_sig(sig: &[u8], timestamp: u64) -> Transaction {
        let mut tx = Transaction::new(1.0, "S".into(), "R".into(), timestamp);
        tx.signature = Signature(sig.to_vec());
        tx
    }

    #[test]
    fn test_signature_digest_input_concatenates_in_order() {
        let txs = vec![tx_with_sig(&[1, 2], 1), tx_with_sig(&[3], 2), tx_with_sig(&[4, 5], 3)];
        assert_eq!(signature_digest_input(&txs), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_seal_hash_of_empty_block() {
        let prev = Hash([7u8; 32]);
        assert_eq!(seal_hash(&[], &prev), hash(&[7u8; 32]));
    }

    #[test]
    fn test_seal_hash_order_sensitive() {
        let a = tx_with_sig(&[1], 1);
        let b = tx_with_sig(&[2], 2);
        let h1 = seal_hash(&[a.clone(), b.clone()], &Hash::ZERO);
        let h2 = seal_hash(&[b, a], &Hash::ZERO);
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_pow_hash_uses_decimal_nonce() {
        let seal = Hash([9u8; 32]);
        let mut expected = seal.0.to_vec();
        expected.extend_from_slice(b"1234");
        assert_eq!(pow_hash(&seal, 1234), hash(&expected));
    }

    #[test]
    fn test_recompute_hash_matches_fields() {
        let prev = Hash([3u8; 32]);
        let txs = vec![tx_with_sig(&[1, 2, 3], 10)];
        let nonce = 17;
        let block = Block {
            hash: pow_hash(&seal_hash(&txs, &prev), nonce),
            nonce,
            transactions: txs,
            prev_hash: prev,
        };

        assert_eq!(block.recompute_hash(), block.hash);
        assert!(!block.is_genesis_child());
        assert_eq!(block.tx_count(), 1);
    }

    #[test]
    fn test_encode_decode() {
        let kp = Keypair::generate();
        let tx = Transaction::transfer(&kp, "receiver", 4.0);
        let block = Block {
            hash: Hash([1u8; 32]),
            nonce: 5,
            transactions: vec![tx],
            prev_hash: Hash::ZERO,
        };

        let decoded = Block::decode(&block.encode()).unwrap();
        assert_eq!(decoded, block);
        assert!(decoded.is_genesis_child());
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(Block::decode(&[0xff, 0x01]).is_err());
    }
}

//! Transaction types and signing.

use crate::crypto::{CryptoError, SignatureVerifier, Signature, Signer};
use crate::hash::{hash, Hash};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during transaction operations.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("missing signature")]
    MissingSignature,
    #[error("signature verification failed: {0}")]
    Crypto(#[from] CryptoError),
}

/// A signed value transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Value transferred. Must be finite and non-negative.
    pub amount: f64,
    /// Sender's public key (PEM text).
    pub sender: String,
    /// Receiver's public key (PEM text). May equal `sender`.
    pub receiver: String,
    /// Unix timestamp in seconds, set by the submitter.
    pub timestamp: u64,
    /// Sender's signature over [`Transaction::signing_hash`].
    pub signature: Signature,
}

impl Transaction {
    /// Create a new unsigned transaction.
    pub fn new(amount: f64, sender: String, receiver: String, timestamp: u64) -> Self {
        Self {
            amount,
            sender,
            receiver,
            timestamp,
            signature: Signature::default(),
        }
    }

    /// Create and sign a transfer from `signer` stamped with the current time.
    pub fn transfer(signer: &impl Signer, receiver: &str, amount: f64) -> Self {
        Self::new(
            amount,
            signer.public_key_pem().to_owned(),
            receiver.to_owned(),
            current_timestamp(),
        )
        .signed(signer)
    }

    /// Canonical encoding of the signed fields.
    ///
    /// `amount | sender | receiver | timestamp`, concatenated as text with no
    /// separators. `amount` uses the shortest decimal that round-trips and
    /// never an exponent (Rust's `f64` Display does exactly this).
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let amount = self.amount.to_string();
        let timestamp = self.timestamp.to_string();
        let mut out = Vec::with_capacity(
            amount.len() + self.sender.len() + self.receiver.len() + timestamp.len(),
        );
        out.extend_from_slice(amount.as_bytes());
        out.extend_from_slice(self.sender.as_bytes());
        out.extend_from_slice(self.receiver.as_bytes());
        out.extend_from_slice(timestamp.as_bytes());
        out
    }

    /// Digest handed to the signer.
    pub fn signing_hash(&self) -> Hash {
        hash(&self.canonical_bytes())
    }

    /// Sign the transaction.
    pub fn sign(&mut self, signer: &impl Signer) {
        let hash = self.signing_hash();
        self.signature = signer.sign(hash.as_bytes());
    }

    /// Create a signed transaction.
    pub fn signed(mut self, signer: &impl Signer) -> Self {
        self.sign(signer);
        self
    }

    /// Verify the signature against the sender's key.
    pub fn verify_with(&self, verifier: &dyn SignatureVerifier) -> Result<(), TransactionError> {
        if self.signature.is_empty() {
            return Err(TransactionError::MissingSignature);
        }
        let hash = self.signing_hash();
        verifier.verify(&self.sender, hash.as_bytes(), &self.signature)?;
        Ok(())
    }

    /// Check if this is a self-transfer.
    pub fn is_self_transfer(&self) -> bool {
        self.sender == self.receiver
    }
}

/// Get the current Unix timestamp in seconds.
pub fn current_timestamp() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Ed25519Verifier, Keypair};

    fn unsigned(amount: f64, timestamp: u64) -> Transaction {
        Transaction::new(amount, "S".into(), "R".into(), timestamp)
    }

    #[test]
    fn test_canonical_bytes_layout() {
        let tx = unsigned(100.0, 1_700_000_000);
        assert_eq!(tx.canonical_bytes(), b"100SR1700000000".to_vec());
    }

    #[test]
    fn test_canonical_amount_shortest_decimal() {
        assert_eq!(unsigned(0.1, 7).canonical_bytes(), b"0.1SR7".to_vec());
        assert_eq!(unsigned(2.5, 7).canonical_bytes(), b"2.5SR7".to_vec());
        assert_eq!(
            unsigned(1e21, 7).canonical_bytes(),
            b"1000000000000000000000SR7".to_vec()
        );
        assert_eq!(unsigned(0.0, 7).canonical_bytes(), b"0SR7".to_vec());
    }

    #[test]
    fn test_sign_and_verify() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();

        let tx = Transaction::transfer(&alice, bob.public_key_pem(), 100.0);

        assert!(tx.verify_with(&Ed25519Verifier).is_ok());
        assert!(!tx.is_self_transfer());
    }

    #[test]
    fn test_self_transfer_verifies() {
        let alice = Keypair::generate();
        let tx = Transaction::transfer(&alice, alice.public_key_pem(), 100.0);

        assert!(tx.is_self_transfer());
        assert!(tx.verify_with(&Ed25519Verifier).is_ok());
    }

    #[test]
    fn test_tampered_amount_fails() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();

        let mut tx = Transaction::transfer(&alice, bob.public_key_pem(), 100.0);
        tx.amount = 1000.0;

        assert!(tx.verify_with(&Ed25519Verifier).is_err());
    }

    #[test]
    fn test_wrong_sender_fails() {
        let alice = Keypair::generate();
        let mallory = Keypair::generate();

        let mut tx = Transaction::transfer(&alice, mallory.public_key_pem(), 5.0);
        tx.sender = mallory.public_key_pem().to_owned();

        assert!(tx.verify_with(&Ed25519Verifier).is_err());
    }

    #[test]
    fn test_unsigned_transaction_fails() {
        let alice = Keypair::generate();
        let tx = Transaction::new(
            1.0,
            alice.public_key_pem().to_owned(),
            alice.public_key_pem().to_owned(),
            42,
        );

        assert!(matches!(
            tx.verify_with(&Ed25519Verifier),
            Err(TransactionError::MissingSignature)
        ));
    }

    #[test]
    fn test_signing_hash_deterministic() {
        let tx = unsigned(3.25, 99);
        assert_eq!(tx.signing_hash(), tx.signing_hash());
        assert_ne!(tx.signing_hash(), unsigned(3.25, 100).signing_hash());
    }

    #[test]
    fn test_json_roundtrip_keeps_signature() {
        let alice = Keypair::generate();
        let tx = Transaction::transfer(&alice, alice.public_key_pem(), 12.5);

        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();

        assert_eq!(back, tx);
        assert!(back.verify_with(&Ed25519Verifier).is_ok());
    }
}

//! Identity capability: signing and verification over opaque PEM key handles.
//!
//! The ledger only ever sees public keys as PEM text carried inside
//! transactions. The [`Signer`] and [`SignatureVerifier`] traits are the seam
//! between the core and whatever key scheme backs it; Ed25519 is the default.

use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::{Signature as DalekSignature, Signer as _, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid signature encoding")]
    InvalidSignature,
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("pem encoding failed: {0}")]
    Encoding(String),
}

/// A signature as produced by a [`Signer`]. Its length depends on the scheme.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature(pub Vec<u8>);

mod signature_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        signature_serde::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Signature(signature_serde::deserialize(deserializer)?))
    }
}

impl Signature {
    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Signature({}...)", &hex[..hex.len().min(16)])
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// Holder of private key material able to sign messages.
pub trait Signer {
    /// Sign `message` with the private key.
    fn sign(&self, message: &[u8]) -> Signature;

    /// The public key handle that verifies this signer's signatures.
    fn public_key_pem(&self) -> &str;
}

/// Verification half of the identity capability.
pub trait SignatureVerifier: Send + Sync {
    /// Check `signature` over `message` against the PEM-encoded `public_key`.
    fn verify(&self, public_key: &str, message: &[u8], signature: &Signature)
        -> Result<(), CryptoError>;
}

/// Ed25519 verifier over SPKI PEM public keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(
        &self,
        public_key: &str,
        message: &[u8],
        signature: &Signature,
    ) -> Result<(), CryptoError> {
        let key = parse_public_key_pem(public_key)?;
        let sig =
            DalekSignature::from_slice(signature.as_bytes()).map_err(|_| CryptoError::InvalidSignature)?;
        key.verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

/// Parse an SPKI PEM public key.
pub fn parse_public_key_pem(pem: &str) -> Result<VerifyingKey, CryptoError> {
    VerifyingKey::from_public_key_pem(pem).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

/// An Ed25519 keypair. The public key is kept pre-rendered as PEM, since that
/// is the form in which it appears on transactions.
pub struct Keypair {
    signing_key: SigningKey,
    public_key_pem: String,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(signing_key)
            .expect("freshly generated ed25519 key always encodes")
    }

    /// Create a keypair from a private key (32 bytes).
    pub fn from_private_key(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        Self::from_signing_key(SigningKey::from_bytes(bytes))
    }

    /// Parse a PKCS#8 PEM private key.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, CryptoError> {
        let signing_key = SigningKey::from_pkcs8_pem(pem)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Self::from_signing_key(signing_key)
    }

    fn from_signing_key(signing_key: SigningKey) -> Result<Self, CryptoError> {
        let public_key_pem = signing_key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::Encoding(e.to_string()))?;
        Ok(Self {
            signing_key,
            public_key_pem,
        })
    }

    /// Export the private key as PKCS#8 PEM.
    pub fn to_pkcs8_pem(&self) -> Result<String, CryptoError> {
        let pem = self
            .signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptoError::Encoding(e.to_string()))?;
        Ok(pem.as_str().to_owned())
    }

    /// Get the private key bytes.
    pub fn private_key(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Verify a signature against our public key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        Ed25519Verifier.verify(&self.public_key_pem, message, signature)
    }
}

impl Signer for Keypair {
    fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes().to_vec())
    }

    fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field(
                "public_key",
                &hex::encode(&self.signing_key.verifying_key().as_bytes()[..8]),
            )
            .finish()
    }
}

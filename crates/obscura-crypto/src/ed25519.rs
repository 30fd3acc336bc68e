//! Ed25519 signing.
//!
//! Small wrapper over the dalek implementation: generate, sign, verify.
//! Verification is strict (rejects the malleable encodings the original
//! RFC tolerated).

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use crate::{Error, Result};

/// Ed25519 public key size in bytes.
pub const ED25519_PUBLIC_KEY_SIZE: usize = 32;

/// Ed25519 secret seed size in bytes.
pub const ED25519_SECRET_KEY_SIZE: usize = 32;

/// Ed25519 signature size in bytes.
pub const ED25519_SIGNATURE_SIZE: usize = 64;

/// An Ed25519 signing key pair.
pub struct Ed25519KeyPair {
    signing: SigningKey,
}

impl Ed25519KeyPair {
    /// Generates a fresh key pair from the system CSPRNG.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Restores a key pair from a 32-byte secret seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let seed: [u8; ED25519_SECRET_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::Primitive("ed25519 secret key must be 32 bytes".into()))?;
        Ok(Self {
            signing: SigningKey::from_bytes(&seed),
        })
    }

    /// The verifying half of the pair.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey {
            verifying: self.signing.verifying_key(),
        }
    }

    /// Signs a message.
    pub fn sign(&self, message: &[u8]) -> [u8; ED25519_SIGNATURE_SIZE] {
        self.signing.sign(message).to_bytes()
    }

    /// The secret seed, for persistence only.
    pub fn as_bytes(&self) -> [u8; ED25519_SECRET_KEY_SIZE] {
        self.signing.to_bytes()
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair([REDACTED])")
    }
}

/// An Ed25519 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct Ed25519PublicKey {
    verifying: VerifyingKey,
}

impl Ed25519PublicKey {
    /// Creates a public key from raw bytes, rejecting encodings that are
    /// not valid curve points.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; ED25519_PUBLIC_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::Primitive("ed25519 public key must be 32 bytes".into()))?;
        let verifying = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| Error::Primitive(format!("ed25519 public key: {e}")))?;
        Ok(Self { verifying })
    }

    /// The key as a byte slice.
    pub fn as_bytes(&self) -> &[u8; ED25519_PUBLIC_KEY_SIZE] {
        self.verifying.as_bytes()
    }

    /// Verifies a detached signature over `message`.
    ///
    /// # Errors
    ///
    /// [`Error::SignatureVerification`] when the signature does not
    /// match (or is not 64 bytes long).
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let signature: [u8; ED25519_SIGNATURE_SIZE] = signature
            .try_into()
            .map_err(|_| Error::SignatureVerification)?;
        self.verifying
            .verify_strict(message, &Signature::from_bytes(&signature))
            .map_err(|_| Error::SignatureVerification)
    }
}

impl std::fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self.as_bytes();
        write!(f, "Ed25519PublicKey({:02x}{:02x}..)", bytes[0], bytes[1])
    }
}

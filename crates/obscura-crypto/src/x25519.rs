//! X25519 Diffie-Hellman key agreement.
//!
//! The overlay derives one shared secret per peer pair and feeds it to
//! the container's HKDF path as the passphrase. Private scalars are
//! clamped by the underlying implementation and zeroized on drop.

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{Error, Result};

/// X25519 public key size in bytes.
pub const X25519_KEY_SIZE: usize = 32;

/// An X25519 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct X25519PublicKey {
    bytes: [u8; X25519_KEY_SIZE],
}

impl X25519PublicKey {
    /// Creates a public key from raw bytes.
    ///
    /// # Errors
    ///
    /// Fails unless the input is exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; X25519_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::Primitive("x25519 public key must be 32 bytes".into()))?;
        Ok(Self { bytes })
    }

    /// The key as a byte slice.
    pub fn as_bytes(&self) -> &[u8; X25519_KEY_SIZE] {
        &self.bytes
    }

    /// The key as an owned byte array.
    pub fn to_bytes(&self) -> [u8; X25519_KEY_SIZE] {
        self.bytes
    }
}

impl std::fmt::Debug for X25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "X25519PublicKey({:02x}{:02x}..)",
            self.bytes[0], self.bytes[1]
        )
    }
}

/// An X25519 secret scalar.
///
/// Not `Clone`: share it behind an `Arc` instead of duplicating secret
/// material in memory. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct X25519SecretKey {
    bytes: [u8; X25519_KEY_SIZE],
}

impl X25519SecretKey {
    /// Generates a fresh secret from the system CSPRNG.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        Self {
            bytes: secret.to_bytes(),
        }
    }

    /// Creates a secret key from raw bytes drawn from a secure source.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; X25519_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::Primitive("x25519 secret key must be 32 bytes".into()))?;
        Ok(Self { bytes })
    }

    /// The corresponding public key (scalar multiplication by the base
    /// point).
    pub fn public_key(&self) -> X25519PublicKey {
        let secret = StaticSecret::from(self.bytes);
        X25519PublicKey {
            bytes: PublicKey::from(&secret).to_bytes(),
        }
    }

    /// Scalar multiplication with a peer's public key.
    pub fn diffie_hellman(&self, peer: &X25519PublicKey) -> X25519SharedSecret {
        let secret = StaticSecret::from(self.bytes);
        let shared = secret.diffie_hellman(&PublicKey::from(peer.bytes));
        X25519SharedSecret {
            bytes: shared.to_bytes(),
        }
    }

    /// Raw scalar bytes, for persistence only.
    pub fn as_bytes(&self) -> &[u8; X25519_KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for X25519SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "X25519SecretKey([REDACTED])")
    }
}

/// A Diffie-Hellman shared secret.
///
/// High-entropy keying material; pair it with the HKDF path of the
/// container rather than a password hash. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct X25519SharedSecret {
    bytes: [u8; X25519_KEY_SIZE],
}

impl X25519SharedSecret {
    /// The shared secret bytes.
    pub fn as_bytes(&self) -> &[u8; X25519_KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for X25519SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "X25519SharedSecret([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_is_symmetric() {
        let alice = X25519SecretKey::generate();
        let bob = X25519SecretKey::generate();

        let ab = alice.diffie_hellman(&bob.public_key());
        let ba = bob.diffie_hellman(&alice.public_key());
        assert_eq!(ab.as_bytes(), ba.as_bytes());
    }

    #[test]
    fn test_different_peers_different_secrets() {
        let alice = X25519SecretKey::generate();
        let bob = X25519SecretKey::generate();
        let carol = X25519SecretKey::generate();

        let ab = alice.diffie_hellman(&bob.public_key());
        let ac = alice.diffie_hellman(&carol.public_key());
        assert_ne!(ab.as_bytes(), ac.as_bytes());
    }

    #[test]
    fn test_secret_key_roundtrip() {
        let original = X25519SecretKey::generate();
        let restored = X25519SecretKey::from_bytes(original.as_bytes()).unwrap();
        assert_eq!(original.public_key(), restored.public_key());
    }

    #[test]
    fn test_public_key_roundtrip_and_length_check() {
        let public = X25519SecretKey::generate().public_key();
        let restored = X25519PublicKey::from_bytes(&public.to_bytes()).unwrap();
        assert_eq!(public, restored);

        assert!(X25519PublicKey::from_bytes(&[0u8; 16]).is_err());
        assert!(X25519SecretKey::from_bytes(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_rfc7748_base_point_vector() {
        // RFC 7748 §6.1: Alice's private key -> public key.
        let secret = X25519SecretKey::from_bytes(
            &hex::decode("77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a")
                .unwrap(),
        )
        .unwrap();
        assert_eq!(
            secret.public_key().to_bytes().to_vec(),
            hex::decode("8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a")
                .unwrap()
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let secret = X25519SecretKey::generate();
        let shared = secret.diffie_hellman(&X25519SecretKey::generate().public_key());
        assert!(format!("{secret:?}").contains("REDACTED"));
        assert!(format!("{shared:?}").contains("REDACTED"));
        assert!(!format!("{:?}", secret.public_key()).contains("REDACTED"));
    }
}

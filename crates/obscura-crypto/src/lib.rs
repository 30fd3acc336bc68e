//! # obscura-crypto
//!
//! Password-based streaming encryption with a self-describing container.
//!
//! An encrypted artifact carries everything needed to decrypt it (apart
//! from the passphrase): a fixed 64-byte preamble names the cipher, key
//! derivation function, MAC construction, hash, security level, salt and
//! nonce, and the payload follows as a raw keystream ciphertext. A single
//! HMAC tag over the preamble and the ciphertext is returned out of band
//! and verified in constant time.
//!
//! - **Ciphers**: AES-256 in CTR/CFB/OFB, unauthenticated IETF ChaCha20
//! - **KDFs**: HKDF, Argon2id, Scrypt (plus PBKDF2 for legacy artifacts)
//! - **Hashes**: SHA-2, SHA-3 and BLAKE2b families
//! - **Key agreement / signing**: X25519 and Ed25519 for the overlay
//!
//! ## Security
//!
//! Derived key material is zeroized when an operation ends. Tag
//! comparison never short-circuits. This is *not* an AEAD: the tag covers
//! the preamble and ciphertext, not caller-supplied associated data, and
//! verification is an explicit step after decryption.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod archive;
pub mod cipher;
pub mod ed25519;
pub mod error;
pub mod hash;
pub mod header;
pub mod kdf;
pub mod mac;
pub mod stream;
pub mod verify;
pub mod x25519;

#[cfg(test)]
mod proptests;

pub use archive::{decrypt_archive, encrypt_archive};
// `self::` disambiguates from the `cipher` trait crate.
pub use self::cipher::{Cipher, Mode};
pub use ed25519::{Ed25519KeyPair, Ed25519PublicKey};
pub use error::{Error, Result};
pub use hash::Hash;
pub use header::{Header, HeaderFields, Meta, CURRENT_VERSION, OVERHEAD};
pub use kdf::{derive_keys, Kdf, MAX_SEC, MIN_SEC};
pub use mac::{Mac, MAC_KEY_SIZE};
pub use stream::{decrypt, decrypt_verify, encrypt, PrintFn, Suite, DEFAULT_SEC};
pub use verify::verify;
pub use x25519::{X25519PublicKey, X25519SecretKey, X25519SharedSecret};

//! Error types for container operations.

use thiserror::Error;

/// Errors that can occur while producing or consuming containers.
#[derive(Error, Debug)]
pub enum Error {
    /// The passphrase is empty.
    #[error("empty passphrase")]
    EmptyKey,

    /// Magic mismatch or short preamble read.
    #[error("malformed header")]
    MalformedHeader,

    /// The meta block names a format version this build does not know.
    #[error("unsupported header version: {0}")]
    UnsupportedVersion(u32),

    /// Cipher identifier absent from the registry.
    #[error("invalid cipher ({})", crate::cipher::Cipher::options())]
    InvalidCipher,

    /// Stream-mode identifier absent from the registry.
    #[error("invalid stream mode ({})", crate::cipher::Mode::options())]
    InvalidMode,

    /// KDF identifier absent from the registry.
    #[error("invalid key derivation ({})", crate::kdf::Kdf::options())]
    InvalidKdf,

    /// MAC identifier absent from the registry.
    #[error("invalid message authentication ({})", crate::mac::Mac::options())]
    InvalidMac,

    /// Hash identifier absent from the registry.
    #[error("invalid message digest ({})", crate::hash::Hash::options())]
    InvalidHash,

    /// Security level outside the legal range.
    #[error(
        "invalid security level ({}~{})",
        crate::kdf::MIN_SEC,
        crate::kdf::MAX_SEC
    )]
    InvalidSec,

    /// Salt length does not match the chosen KDF's declared size.
    #[error("invalid salt size")]
    InvalidSaltSize,

    /// Nonce length does not match the chosen cipher's declared size.
    #[error("invalid nonce size")]
    InvalidNonceSize,

    /// Authentication tag comparison failed.
    #[error("signature verification failed")]
    SignatureVerification,

    /// Pass-through from a reader, writer or the randomness source.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    /// Opaque failure inside a cryptographic primitive.
    #[error("primitive failure: {0}")]
    Primitive(String),

    /// Sentinel returned by a print callback to abort before any payload
    /// bytes are produced.
    #[error("dry run")]
    DryRun,
}

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, Error>;

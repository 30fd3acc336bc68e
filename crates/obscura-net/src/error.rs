//! Error types for overlay operations.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur in the overlay.
#[derive(Error, Debug)]
pub enum Error {
    /// Container encryption or decryption failed.
    #[error("crypto: {0}")]
    Crypto(#[from] obscura_crypto::Error),

    /// Socket I/O failed.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    /// The target address is not in the current peer table.
    #[error("unknown peer: {0}")]
    UnknownPeer(SocketAddr),

    /// A beacon datagram did not decode as a peer table.
    #[error("malformed peer table")]
    MalformedPeerTable,

    /// The beacon address did not resolve to a usable endpoint.
    #[error("cannot resolve beacon address: {0}")]
    BeaconAddress(String),
}

/// Result type for overlay operations.
pub type Result<T> = std::result::Result<T, Error>;

//! # obscura-net
//!
//! A small peer-to-peer messaging overlay over UDP, reusing the obscura
//! container format for every datagram.
//!
//! Two roles:
//!
//! - A [`Beacon`] is a stateless rendezvous point: peers announce their
//!   X25519 public keys to it (encrypted under a shared passphrase) and
//!   it broadcasts the resulting peer table back to everyone it knows.
//! - A [`Node`] announces itself to a beacon, tracks the peer table,
//!   and exchanges messages with other nodes directly, encrypted under
//!   per-peer X25519 shared secrets.
//!
//! Every datagram body is an archive-framed container (length-prefixed
//! ciphertext plus detached tag), so a single UDP payload is
//! self-describing and self-authenticating. The only trust anchor is
//! the shared passphrase; there is no rate limiting, persistence or
//! peer expiry.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod beacon;
pub mod error;
pub mod node;
pub mod wire;

pub use beacon::Beacon;
pub use error::{Error, Result};
pub use node::{Inbound, Node};
pub use wire::MAX_DATAGRAM;

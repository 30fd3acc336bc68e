//! Datagram payloads: sealed containers and the peer-table codec.
//!
//! A datagram body is always an archive-framed container. The plaintext
//! inside is one of three things: a 32-byte X25519 public key (node to
//! beacon), an encoded peer table (beacon to node), or free message
//! bytes (node to node).

use std::collections::HashMap;
use std::io::Cursor;
use std::net::SocketAddr;

use obscura_crypto::{decrypt_archive, encrypt_archive, Kdf, Suite};

use crate::{Error, Result};

/// X25519 public key size carried in hello datagrams and peer tables.
pub const PEER_KEY_SIZE: usize = 32;

/// Largest datagram body the overlay accepts.
pub const MAX_DATAGRAM: usize = 64 * 1024;

/// The peer table: every address the beacon has heard from, with the
/// X25519 public key it announced.
pub type PeerTable = HashMap<SocketAddr, [u8; PEER_KEY_SIZE]>;

/// Archive-encrypts `plaintext` into a datagram body.
pub fn seal(plaintext: &[u8], key: &[u8], suite: &Suite) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(plaintext.len() + 128);
    encrypt_archive(
        Cursor::new(plaintext),
        &mut out,
        key,
        plaintext.len() as u64,
        suite,
        None,
    )?;
    Ok(out)
}

/// Opens an archive-framed datagram body, verifying its tag.
pub fn open(datagram: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    decrypt_archive(Cursor::new(datagram), &mut out, key, None)?;
    Ok(out)
}

/// The suite to use when the key material is an X25519 shared secret:
/// the input is already high-entropy, so HKDF replaces the password
/// hash.
pub fn shared_suite(suite: &Suite) -> Suite {
    Suite {
        kdf: Kdf::Hkdf,
        ..*suite
    }
}

/// Encodes the peer table as `u16-be address length ‖ address ‖ key`
/// records, sorted by address.
///
/// The ancestor protocol shipped a gob-encoded map here; this layout is
/// language-neutral and deterministic, and deliberately breaks with it.
pub fn encode_peers(peers: &PeerTable) -> Vec<u8> {
    let mut entries: Vec<_> = peers.iter().collect();
    entries.sort_by_key(|(addr, _)| addr.to_string());

    let mut buf = Vec::new();
    for (addr, key) in entries {
        let addr = addr.to_string();
        buf.extend_from_slice(&(addr.len() as u16).to_be_bytes());
        buf.extend_from_slice(addr.as_bytes());
        buf.extend_from_slice(key);
    }
    buf
}

/// Decodes a peer table; trailing garbage or an unparsable address is a
/// malformed table, not a partial one.
pub fn decode_peers(mut buf: &[u8]) -> Result<PeerTable> {
    let mut peers = PeerTable::new();
    while !buf.is_empty() {
        if buf.len() < 2 {
            return Err(Error::MalformedPeerTable);
        }
        let len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
        buf = &buf[2..];
        if buf.len() < len + PEER_KEY_SIZE {
            return Err(Error::MalformedPeerTable);
        }
        let addr: SocketAddr = std::str::from_utf8(&buf[..len])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(Error::MalformedPeerTable)?;
        let mut key = [0u8; PEER_KEY_SIZE];
        key.copy_from_slice(&buf[len..len + PEER_KEY_SIZE]);
        peers.insert(addr, key);
        buf = &buf[len + PEER_KEY_SIZE..];
    }
    Ok(peers)
}

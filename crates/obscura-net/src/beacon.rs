//! The rendezvous beacon.
//!
//! A beacon is a stateless coordinator: it records the X25519 public
//! key announced by each address it hears from and, on every
//! announcement, broadcasts the encrypted peer table to everyone it
//! knows. Undecryptable or ill-sized datagrams are dropped silently;
//! the shared passphrase is the only admission control.

use std::net::SocketAddr;

use tokio::net::{ToSocketAddrs, UdpSocket};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use obscura_crypto::Suite;

use crate::wire::{self, PeerTable, MAX_DATAGRAM, PEER_KEY_SIZE};
use crate::Result;

/// The beacon role.
pub struct Beacon {
    socket: UdpSocket,
    passphrase: Vec<u8>,
    suite: Suite,
    peers: RwLock<PeerTable>,
}

impl Beacon {
    /// Binds the beacon socket.
    pub async fn bind(addr: impl ToSocketAddrs, passphrase: Vec<u8>, suite: Suite) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        info!(addr = %socket.local_addr()?, "beacon listening");
        Ok(Self {
            socket,
            passphrase,
            suite,
            peers: RwLock::new(PeerTable::new()),
        })
    }

    /// The bound socket address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Serves datagrams forever.
    ///
    /// Returns only on a socket error; per-datagram failures are logged
    /// and skipped.
    pub async fn run(&self) -> Result<()> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let (n, from) = self.socket.recv_from(&mut buf).await?;
            let payload = match wire::open(&buf[..n], &self.passphrase) {
                Ok(payload) => payload,
                Err(err) => {
                    debug!(%from, %err, "dropping undecryptable datagram");
                    continue;
                }
            };
            if payload.len() != PEER_KEY_SIZE {
                debug!(%from, len = payload.len(), "ignoring non-key payload");
                continue;
            }
            let mut key = [0u8; PEER_KEY_SIZE];
            key.copy_from_slice(&payload);
            self.peers.write().await.insert(from, key);
            debug!(%from, "peer announced");
            self.broadcast().await;
        }
    }

    /// Encrypts the current peer table and sends it to every known peer.
    async fn broadcast(&self) {
        let peers = self.peers.read().await.clone();
        let encoded = wire::encode_peers(&peers);
        let sealed = match wire::seal(&encoded, &self.passphrase, &self.suite) {
            Ok(sealed) => sealed,
            Err(err) => {
                warn!(%err, "peer table encryption failed");
                return;
            }
        };
        for addr in peers.keys() {
            if let Err(err) = self.socket.send_to(&sealed, addr).await {
                debug!(%addr, %err, "peer table send failed");
            }
        }
        info!(peers = peers.len(), "announced peer table");
    }
}

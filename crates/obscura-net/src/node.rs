//! The interactive overlay participant.
//!
//! A node announces its X25519 public key to the beacon (sealed under
//! the shared passphrase), tracks the peer table the beacon broadcasts
//! back, and talks to other nodes directly: each message is sealed
//! under the X25519 shared secret of the pair, with HKDF as the key
//! derivation since the secret is already high-entropy.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{lookup_host, UdpSocket};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use obscura_crypto::{Suite, X25519PublicKey, X25519SecretKey};

use crate::wire::{self, PeerTable, MAX_DATAGRAM};
use crate::{Error, Result};

/// A decrypted message received from another node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// The sender's socket address as observed on the wire.
    pub from: SocketAddr,
    /// The decrypted message bytes.
    pub payload: Vec<u8>,
}

/// The node role.
pub struct Node {
    socket: Arc<UdpSocket>,
    beacon: SocketAddr,
    secret: Arc<X25519SecretKey>,
    public: X25519PublicKey,
    passphrase: Vec<u8>,
    suite: Suite,
    peers: Arc<RwLock<PeerTable>>,
}

impl Node {
    /// Binds a socket, generates a fresh X25519 key pair and announces
    /// it to the beacon.
    pub async fn connect(
        bind: &str,
        beacon: &str,
        passphrase: Vec<u8>,
        suite: Suite,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(bind).await?;
        let beacon_addr = lookup_host(beacon)
            .await?
            .next()
            .ok_or_else(|| Error::BeaconAddress(beacon.to_string()))?;
        let secret = X25519SecretKey::generate();
        let public = secret.public_key();
        info!(addr = %socket.local_addr()?, beacon = %beacon_addr, "node up");

        let node = Self {
            socket: Arc::new(socket),
            beacon: beacon_addr,
            secret: Arc::new(secret),
            public,
            passphrase,
            suite,
            peers: Arc::new(RwLock::new(PeerTable::new())),
        };
        node.announce().await?;
        Ok(node)
    }

    /// The bound socket address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// This node's X25519 public key.
    pub fn public_key(&self) -> &X25519PublicKey {
        &self.public
    }

    /// Sends (or re-sends) the sealed public key to the beacon. The
    /// beacon answers every announcement with a fresh peer table.
    pub async fn announce(&self) -> Result<()> {
        let sealed = wire::seal(self.public.as_bytes(), &self.passphrase, &self.suite)?;
        self.socket.send_to(&sealed, self.beacon).await?;
        Ok(())
    }

    /// The peer addresses currently known, sorted.
    pub async fn peer_list(&self) -> Vec<SocketAddr> {
        let mut addrs: Vec<_> = self.peers.read().await.keys().copied().collect();
        addrs.sort_by_key(|a| a.to_string());
        addrs
    }

    /// Seals `payload` under the shared secret with `to` and sends it.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownPeer`] when `to` has not appeared in a peer
    /// table yet.
    pub async fn send(&self, to: SocketAddr, payload: &[u8]) -> Result<()> {
        let peer_key = self
            .peers
            .read()
            .await
            .get(&to)
            .copied()
            .ok_or(Error::UnknownPeer(to))?;
        let public = X25519PublicKey::from_bytes(&peer_key)?;
        let shared = self.secret.diffie_hellman(&public);
        let sealed = wire::seal(payload, shared.as_bytes(), &wire::shared_suite(&self.suite))?;
        self.socket.send_to(&sealed, to).await?;
        Ok(())
    }

    /// Spawns the datagram listener.
    ///
    /// Peer tables from the beacon are applied internally; decrypted
    /// peer messages arrive on the returned channel. Datagrams from
    /// unknown peers or that fail to open are dropped. The task exits
    /// when the receiver is dropped.
    pub fn spawn_listener(&self) -> mpsc::Receiver<Inbound> {
        let (tx, rx) = mpsc::channel(64);
        let socket = Arc::clone(&self.socket);
        let peers = Arc::clone(&self.peers);
        let secret = Arc::clone(&self.secret);
        let beacon = self.beacon;
        let passphrase = self.passphrase.clone();

        tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_DATAGRAM];
            loop {
                let (n, from) = match socket.recv_from(&mut buf).await {
                    Ok(received) => received,
                    Err(err) => {
                        warn!(%err, "recv failed");
                        continue;
                    }
                };
                let datagram = &buf[..n];

                if from == beacon {
                    match wire::open(datagram, &passphrase)
                        .and_then(|payload| wire::decode_peers(&payload))
                    {
                        Ok(table) => {
                            debug!(peers = table.len(), "peer table updated");
                            *peers.write().await = table;
                        }
                        Err(err) => debug!(%err, "bad beacon datagram"),
                    }
                    continue;
                }

                let Some(peer_key) = peers.read().await.get(&from).copied() else {
                    debug!(%from, "datagram from unknown peer");
                    continue;
                };
                let Ok(public) = X25519PublicKey::from_bytes(&peer_key) else {
                    continue;
                };
                let shared = secret.diffie_hellman(&public);
                match wire::open(datagram, shared.as_bytes()) {
                    Ok(payload) => {
                        if tx.send(Inbound { from, payload }).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => debug!(%from, %err, "undecryptable peer datagram"),
                }
            }
        });
        rx
    }
}

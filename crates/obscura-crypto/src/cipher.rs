//! Cipher registry and keystream construction.
//!
//! Two cipher families are registered: AES-256 driven by one of the
//! classic block stream modes (CTR, CFB, OFB) and the unauthenticated
//! IETF ChaCha20 stream. Identifiers are stable wire constants; renaming
//! is a display concern only.

use std::fmt;

use aes::Aes256;
use cipher::{KeyIvInit, StreamCipher};

use crate::{Error, Result};

type Aes256Ctr = ctr::Ctr128BE<Aes256>;
type Aes256Ofb = ofb::Ofb<Aes256>;
type Aes256CfbEnc = cfb_mode::BufEncryptor<Aes256>;
type Aes256CfbDec = cfb_mode::BufDecryptor<Aes256>;

/// Registered symmetric ciphers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Cipher {
    /// AES with a 256-bit key, driven by a [`Mode`].
    Aes256 = 1,
    /// IETF ChaCha20 (12-byte nonce), unauthenticated stream.
    ChaCha20 = 2,
}

impl Cipher {
    /// Every registered cipher, in identifier order.
    pub const ALL: [Cipher; 2] = [Cipher::Aes256, Cipher::ChaCha20];

    /// Stable wire identifier.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Required key size in bytes.
    pub const fn key_size(self) -> usize {
        match self {
            Cipher::Aes256 => 32,
            Cipher::ChaCha20 => 32,
        }
    }

    /// Required nonce size in bytes (the AES block size for the block
    /// modes, 12 for ChaCha20).
    pub const fn nonce_size(self) -> usize {
        match self {
            Cipher::Aes256 => 16,
            Cipher::ChaCha20 => 12,
        }
    }

    /// Registry summary in `id:name` form, used in help and error text.
    pub fn options() -> String {
        registry_options(&Self::ALL)
    }
}

impl fmt::Display for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cipher::Aes256 => write!(f, "AES-256"),
            Cipher::ChaCha20 => write!(f, "ChaCha20"),
        }
    }
}

impl TryFrom<u8> for Cipher {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            1 => Ok(Cipher::Aes256),
            2 => Ok(Cipher::ChaCha20),
            _ => Err(Error::InvalidCipher),
        }
    }
}

/// Block stream modes for the AES cipher family.
///
/// The mode byte is present in every container; ChaCha20 artifacts carry
/// it too but the keystream ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// Counter mode, big-endian 128-bit counter over the full block.
    Ctr = 1,
    /// Cipher feedback mode.
    Cfb = 2,
    /// Output feedback mode.
    Ofb = 3,
}

impl Mode {
    /// Every registered mode, in identifier order.
    pub const ALL: [Mode; 3] = [Mode::Ctr, Mode::Cfb, Mode::Ofb];

    /// Stable wire identifier.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Registry summary in `id:name` form, used in help and error text.
    pub fn options() -> String {
        registry_options(&Self::ALL)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Ctr => write!(f, "CTR"),
            Mode::Cfb => write!(f, "CFB"),
            Mode::Ofb => write!(f, "OFB"),
        }
    }
}

impl TryFrom<u8> for Mode {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            1 => Ok(Mode::Ctr),
            2 => Ok(Mode::Cfb),
            3 => Ok(Mode::Ofb),
            _ => Err(Error::InvalidMode),
        }
    }
}

pub(crate) fn registry_options<T: Copy + fmt::Display + Into<u8>>(all: &[T]) -> String {
    all.iter()
        .map(|item| {
            let id: u8 = (*item).into();
            format!("{id}:{item}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<Cipher> for u8 {
    fn from(cipher: Cipher) -> u8 {
        cipher.id()
    }
}

impl From<Mode> for u8 {
    fn from(mode: Mode) -> u8 {
        mode.id()
    }
}

/// Which way the keystream runs. CFB is the only registered mode where
/// the two directions differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Encrypt,
    Decrypt,
}

/// Incremental keystream applied to buffers in place.
pub(crate) trait Keystream {
    fn apply(&mut self, buf: &mut [u8]);
}

struct Synchronous<C: StreamCipher>(C);

impl<C: StreamCipher> Keystream for Synchronous<C> {
    fn apply(&mut self, buf: &mut [u8]) {
        self.0.apply_keystream(buf);
    }
}

struct CfbEncrypt(Aes256CfbEnc);

impl Keystream for CfbEncrypt {
    fn apply(&mut self, buf: &mut [u8]) {
        self.0.encrypt(buf);
    }
}

struct CfbDecrypt(Aes256CfbDec);

impl Keystream for CfbDecrypt {
    fn apply(&mut self, buf: &mut [u8]) {
        self.0.decrypt(buf);
    }
}

/// Builds the keystream for a cipher/mode pair.
///
/// Key and nonce lengths must already match the registry tables.
pub(crate) fn keystream(
    cipher: Cipher,
    mode: Mode,
    direction: Direction,
    key: &[u8],
    nonce: &[u8],
) -> Result<Box<dyn Keystream>> {
    if key.len() != cipher.key_size() {
        return Err(Error::Primitive("cipher key size mismatch".into()));
    }
    if nonce.len() != cipher.nonce_size() {
        return Err(Error::InvalidNonceSize);
    }
    let init = |e: cipher::InvalidLength| Error::Primitive(e.to_string());
    match cipher {
        Cipher::Aes256 => match (mode, direction) {
            (Mode::Ctr, _) => Ok(Box::new(Synchronous(
                Aes256Ctr::new_from_slices(key, nonce).map_err(init)?,
            ))),
            (Mode::Cfb, Direction::Encrypt) => Ok(Box::new(CfbEncrypt(
                Aes256CfbEnc::new_from_slices(key, nonce).map_err(init)?,
            ))),
            (Mode::Cfb, Direction::Decrypt) => Ok(Box::new(CfbDecrypt(
                Aes256CfbDec::new_from_slices(key, nonce).map_err(init)?,
            ))),
            (Mode::Ofb, _) => Ok(Box::new(Synchronous(
                Aes256Ofb::new_from_slices(key, nonce).map_err(init)?,
            ))),
        },
        Cipher::ChaCha20 => Ok(Box::new(Synchronous(
            chacha20::ChaCha20::new_from_slices(key, nonce).map_err(init)?,
        ))),
    }
}

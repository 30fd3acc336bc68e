//! Self-describing container preamble.
//!
//! Every artifact opens with an 8-byte meta block (magic plus format
//! version) followed by a version-specific parameter block. Integers are
//! big-endian; the layout is fixed-width, field for field, with no
//! length prefixes or variable encodings.
//!
//! ```text
//! offset  size   field
//! 0       4      magic = 0x47 0x48 0x4D 0xFF
//! 4       4      version (big-endian u32)
//! 8       1      cipher
//! 9       1      mode
//! 10      1      kdf
//! 11      1      mac
//! 12      1      hash
//! 13      1      security level
//! 14      1      salt length
//! 15      1      nonce length
//! 16      32     salt buffer (live bytes first, remainder zero)
//! 48      16     nonce buffer (live bytes first, remainder zero)
//! ```
//!
//! Version 7 is written by the encrypter; v6 (identical layout) and v5
//! (16-byte salt buffer) remain readable for archived data.

use std::io::{Read, Write};

use crate::cipher::{Cipher, Mode};
use crate::hash::Hash;
use crate::kdf::Kdf;
use crate::mac::Mac;
use crate::{Error, Result};

/// Container magic, the first four bytes of every artifact.
pub const MAGIC: u32 = 0x4748_4DFF;

/// Format version written by the encrypter.
pub const CURRENT_VERSION: u32 = 7;

/// Meta block size in bytes.
pub const META_SIZE: usize = 8;

/// Nonce buffer capacity shared by all header versions.
pub const NONCE_CAP: usize = 16;

/// Envelope cost added to any payload: meta plus the current header.
pub const OVERHEAD: usize = META_SIZE + HeaderV7::SIZE;

/// Reads the fixed-size preamble regions; a short read is a malformed
/// artifact, not a plain I/O failure.
fn read_preamble(r: &mut impl Read, buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => Error::MalformedHeader,
        _ => Error::Io(e),
    })
}

/// The meta block: magic plus format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    version: u32,
}

impl Meta {
    /// Meta block for the given format version.
    pub fn new(version: u32) -> Self {
        Self { version }
    }

    /// The format version carried by this meta block.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Parses a meta block, failing on a magic mismatch.
    pub fn from_bytes(buf: &[u8; META_SIZE]) -> Result<Self> {
        let magic = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if magic != MAGIC {
            return Err(Error::MalformedHeader);
        }
        Ok(Self {
            version: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
        })
    }

    /// Encodes the meta block.
    pub fn to_bytes(&self) -> [u8; META_SIZE] {
        let mut buf = [0u8; META_SIZE];
        buf[..4].copy_from_slice(&MAGIC.to_be_bytes());
        buf[4..].copy_from_slice(&self.version.to_be_bytes());
        buf
    }

    /// Reads and validates a meta block from `r`.
    pub fn read(r: &mut impl Read) -> Result<Self> {
        let mut buf = [0u8; META_SIZE];
        read_preamble(r, &mut buf)?;
        Self::from_bytes(&buf)
    }

    /// Writes the meta block to `w`.
    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        w.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// The header variant this meta block selects.
    pub fn header(&self) -> Result<Header> {
        Header::for_version(self.version)
    }
}

/// Borrowed view of the live header fields.
#[derive(Debug, Clone, Copy)]
pub struct HeaderFields<'a> {
    /// Cipher identifier as carried on the wire.
    pub cipher: u8,
    /// Stream-mode identifier.
    pub mode: u8,
    /// KDF identifier.
    pub kdf: u8,
    /// MAC identifier.
    pub mac: u8,
    /// Hash identifier.
    pub hash: u8,
    /// Security level.
    pub sec: u8,
    /// Live salt bytes, clamped to the buffer capacity.
    pub salt: &'a [u8],
    /// Live nonce bytes, clamped to the buffer capacity.
    pub nonce: &'a [u8],
}

/// Parameter block shared by the v5–v7 layouts; `SALT` is the variant's
/// salt buffer capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHeader<const SALT: usize> {
    cipher: u8,
    mode: u8,
    kdf: u8,
    mac: u8,
    hash: u8,
    sec: u8,
    salt_len: u8,
    nonce_len: u8,
    salt: [u8; SALT],
    nonce: [u8; NONCE_CAP],
}

/// The legacy 40-byte parameter block (16-byte salt buffer).
pub type HeaderV5 = RawHeader<16>;
/// The legacy 56-byte parameter block.
pub type HeaderV6 = RawHeader<32>;
/// The current 56-byte parameter block.
pub type HeaderV7 = RawHeader<32>;

impl<const SALT: usize> RawHeader<SALT> {
    /// Encoded size of this variant in bytes.
    pub const SIZE: usize = 8 + SALT + NONCE_CAP;

    fn empty() -> Self {
        Self {
            cipher: 0,
            mode: 0,
            kdf: 0,
            mac: 0,
            hash: 0,
            sec: 0,
            salt_len: 0,
            nonce_len: 0,
            salt: [0; SALT],
            nonce: [0; NONCE_CAP],
        }
    }

    /// Fills in the parameter fields. Salt and nonce are truncated to
    /// the buffer capacities; dead buffer bytes are zeroed so encoding is
    /// byte-for-byte reproducible.
    #[allow(clippy::too_many_arguments)]
    pub fn set(
        &mut self,
        cipher: Cipher,
        mode: Mode,
        kdf: Kdf,
        mac: Mac,
        hash: Hash,
        sec: u8,
        salt: &[u8],
        nonce: &[u8],
    ) {
        self.cipher = cipher.id();
        self.mode = mode.id();
        self.kdf = kdf.id();
        self.mac = mac.id();
        self.hash = hash.id();
        self.sec = sec;

        let n = salt.len().min(SALT);
        self.salt = [0; SALT];
        self.salt[..n].copy_from_slice(&salt[..n]);
        self.salt_len = n as u8;

        let n = nonce.len().min(NONCE_CAP);
        self.nonce = [0; NONCE_CAP];
        self.nonce[..n].copy_from_slice(&nonce[..n]);
        self.nonce_len = n as u8;
    }

    /// The live header fields; declared lengths that exceed the buffer
    /// capacity cannot describe data that physically fits and are
    /// clamped.
    pub fn get(&self) -> HeaderFields<'_> {
        HeaderFields {
            cipher: self.cipher,
            mode: self.mode,
            kdf: self.kdf,
            mac: self.mac,
            hash: self.hash,
            sec: self.sec,
            salt: &self.salt[..(self.salt_len as usize).min(SALT)],
            nonce: &self.nonce[..(self.nonce_len as usize).min(NONCE_CAP)],
        }
    }

    /// Encodes the parameter block. Buffer contents are emitted verbatim
    /// so a parsed header re-encodes to the exact bytes read.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(&[
            self.cipher,
            self.mode,
            self.kdf,
            self.mac,
            self.hash,
            self.sec,
            self.salt_len,
            self.nonce_len,
        ]);
        buf.extend_from_slice(&self.salt);
        buf.extend_from_slice(&self.nonce);
        buf
    }

    /// Parses a parameter block.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(Error::MalformedHeader);
        }
        let mut header = Self::empty();
        header.cipher = buf[0];
        header.mode = buf[1];
        header.kdf = buf[2];
        header.mac = buf[3];
        header.hash = buf[4];
        header.sec = buf[5];
        header.salt_len = buf[6];
        header.nonce_len = buf[7];
        header.salt.copy_from_slice(&buf[8..8 + SALT]);
        header.nonce.copy_from_slice(&buf[8 + SALT..Self::SIZE]);
        Ok(header)
    }

    /// Reads a parameter block from `r`.
    pub fn read(r: &mut impl Read) -> Result<Self> {
        let mut buf = vec![0u8; Self::SIZE];
        read_preamble(r, &mut buf)?;
        Self::from_bytes(&buf)
    }

    /// Writes the parameter block to `w`.
    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        w.write_all(&self.to_bytes())?;
        Ok(())
    }
}

/// A version-tagged parameter block.
///
/// Variants share the capability set `{read, write, set, get}`; new
/// format versions are new variants, selected by [`Meta::version`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    /// Version 5, legacy.
    V5(HeaderV5),
    /// Version 6, legacy.
    V6(HeaderV6),
    /// Version 7, current.
    V7(HeaderV7),
}

impl Header {
    /// An empty header of the variant for `version`.
    ///
    /// Versions 1–4 predate the self-describing parameter block and are
    /// not recognised.
    pub fn for_version(version: u32) -> Result<Self> {
        match version {
            5 => Ok(Header::V5(HeaderV5::empty())),
            6 => Ok(Header::V6(HeaderV6::empty())),
            7 => Ok(Header::V7(HeaderV7::empty())),
            v => Err(Error::UnsupportedVersion(v)),
        }
    }

    /// The format version of this variant.
    pub fn version(&self) -> u32 {
        match self {
            Header::V5(_) => 5,
            Header::V6(_) => 6,
            Header::V7(_) => 7,
        }
    }

    /// Encoded size of this variant in bytes.
    pub fn size(&self) -> usize {
        match self {
            Header::V5(_) => HeaderV5::SIZE,
            Header::V6(_) => HeaderV6::SIZE,
            Header::V7(_) => HeaderV7::SIZE,
        }
    }

    /// Fills in the parameter fields.
    #[allow(clippy::too_many_arguments)]
    pub fn set(
        &mut self,
        cipher: Cipher,
        mode: Mode,
        kdf: Kdf,
        mac: Mac,
        hash: Hash,
        sec: u8,
        salt: &[u8],
        nonce: &[u8],
    ) {
        match self {
            Header::V5(h) => h.set(cipher, mode, kdf, mac, hash, sec, salt, nonce),
            Header::V6(h) => h.set(cipher, mode, kdf, mac, hash, sec, salt, nonce),
            Header::V7(h) => h.set(cipher, mode, kdf, mac, hash, sec, salt, nonce),
        }
    }

    /// The live header fields.
    pub fn get(&self) -> HeaderFields<'_> {
        match self {
            Header::V5(h) => h.get(),
            Header::V6(h) => h.get(),
            Header::V7(h) => h.get(),
        }
    }

    /// Encodes the parameter block.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Header::V5(h) => h.to_bytes(),
            Header::V6(h) => h.to_bytes(),
            Header::V7(h) => h.to_bytes(),
        }
    }

    /// Reads the parameter block for this variant from `r`.
    pub fn read(&mut self, r: &mut impl Read) -> Result<()> {
        match self {
            Header::V5(h) => *h = HeaderV5::read(r)?,
            Header::V6(h) => *h = HeaderV6::read(r)?,
            Header::V7(h) => *h = HeaderV7::read(r)?,
        }
        Ok(())
    }

    /// Writes the parameter block to `w`.
    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        match self {
            Header::V5(h) => h.write(w),
            Header::V6(h) => h.write(w),
            Header::V7(h) => h.write(w),
        }
    }
}

//! Digest registry.
//!
//! Thirteen digests across the SHA-3, SHA-2 and BLAKE2b families. The
//! chosen hash parameterises the HMAC tag, HKDF expansion and the PBKDF2
//! legacy path; its output length is the tag length.

use std::fmt;

use crate::cipher::registry_options;
use crate::{Error, Result};

pub(crate) type Blake2b256 = blake2::Blake2b<digest::consts::U32>;
pub(crate) type Blake2b384 = blake2::Blake2b<digest::consts::U48>;
pub(crate) type Blake2b512 = blake2::Blake2b<digest::consts::U64>;

/// Registered message digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Hash {
    Sha3_224 = 1,
    Sha3_256 = 2,
    Sha3_384 = 3,
    Sha3_512 = 4,
    Sha224 = 5,
    Sha256 = 6,
    Sha384 = 7,
    Sha512 = 8,
    Sha512_224 = 9,
    Sha512_256 = 10,
    Blake2b256 = 11,
    Blake2b384 = 12,
    Blake2b512 = 13,
}

impl Hash {
    /// Every registered digest, in identifier order.
    pub const ALL: [Hash; 13] = [
        Hash::Sha3_224,
        Hash::Sha3_256,
        Hash::Sha3_384,
        Hash::Sha3_512,
        Hash::Sha224,
        Hash::Sha256,
        Hash::Sha384,
        Hash::Sha512,
        Hash::Sha512_224,
        Hash::Sha512_256,
        Hash::Blake2b256,
        Hash::Blake2b384,
        Hash::Blake2b512,
    ];

    /// Stable wire identifier.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Digest output length in bytes; also the tag length of an HMAC
    /// built over this hash.
    pub const fn digest_size(self) -> usize {
        match self {
            Hash::Sha3_224 | Hash::Sha224 | Hash::Sha512_224 => 28,
            Hash::Sha3_256 | Hash::Sha256 | Hash::Sha512_256 | Hash::Blake2b256 => 32,
            Hash::Sha3_384 | Hash::Sha384 | Hash::Blake2b384 => 48,
            Hash::Sha3_512 | Hash::Sha512 | Hash::Blake2b512 => 64,
        }
    }

    /// Registry summary in `id:name` form, used in help and error text.
    pub fn options() -> String {
        registry_options(&Self::ALL)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Hash::Sha3_224 => "SHA3-224",
            Hash::Sha3_256 => "SHA3-256",
            Hash::Sha3_384 => "SHA3-384",
            Hash::Sha3_512 => "SHA3-512",
            Hash::Sha224 => "SHA-224",
            Hash::Sha256 => "SHA-256",
            Hash::Sha384 => "SHA-384",
            Hash::Sha512 => "SHA-512",
            Hash::Sha512_224 => "SHA-512/224",
            Hash::Sha512_256 => "SHA-512/256",
            Hash::Blake2b256 => "BLAKE2b-256",
            Hash::Blake2b384 => "BLAKE2b-384",
            Hash::Blake2b512 => "BLAKE2b-512",
        };
        f.write_str(name)
    }
}

impl From<Hash> for u8 {
    fn from(hash: Hash) -> u8 {
        hash.id()
    }
}

impl TryFrom<u8> for Hash {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            1 => Ok(Hash::Sha3_224),
            2 => Ok(Hash::Sha3_256),
            3 => Ok(Hash::Sha3_384),
            4 => Ok(Hash::Sha3_512),
            5 => Ok(Hash::Sha224),
            6 => Ok(Hash::Sha256),
            7 => Ok(Hash::Sha384),
            8 => Ok(Hash::Sha512),
            9 => Ok(Hash::Sha512_224),
            10 => Ok(Hash::Sha512_256),
            11 => Ok(Hash::Blake2b256),
            12 => Ok(Hash::Blake2b384),
            13 => Ok(Hash::Blake2b512),
            _ => Err(Error::InvalidHash),
        }
    }
}

/// Monomorphises `$body` over the concrete digest type behind a [`Hash`]
/// value, binding it as the type `$ty`. HMAC, HKDF and PBKDF2 are all
/// generic over the digest, so the registry dispatches through here.
macro_rules! with_hash {
    ($hash:expr, $ty:ident => $body:expr) => {
        match $hash {
            $crate::hash::Hash::Sha3_224 => {
                type $ty = sha3::Sha3_224;
                $body
            }
            $crate::hash::Hash::Sha3_256 => {
                type $ty = sha3::Sha3_256;
                $body
            }
            $crate::hash::Hash::Sha3_384 => {
                type $ty = sha3::Sha3_384;
                $body
            }
            $crate::hash::Hash::Sha3_512 => {
                type $ty = sha3::Sha3_512;
                $body
            }
            $crate::hash::Hash::Sha224 => {
                type $ty = sha2::Sha224;
                $body
            }
            $crate::hash::Hash::Sha256 => {
                type $ty = sha2::Sha256;
                $body
            }
            $crate::hash::Hash::Sha384 => {
                type $ty = sha2::Sha384;
                $body
            }
            $crate::hash::Hash::Sha512 => {
                type $ty = sha2::Sha512;
                $body
            }
            $crate::hash::Hash::Sha512_224 => {
                type $ty = sha2::Sha512_224;
                $body
            }
            $crate::hash::Hash::Sha512_256 => {
                type $ty = sha2::Sha512_256;
                $body
            }
            $crate::hash::Hash::Blake2b256 => {
                type $ty = $crate::hash::Blake2b256;
                $body
            }
            $crate::hash::Hash::Blake2b384 => {
                type $ty = $crate::hash::Blake2b384;
                $body
            }
            $crate::hash::Hash::Blake2b512 => {
                type $ty = $crate::hash::Blake2b512;
                $body
            }
        }
    };
}

pub(crate) use with_hash;

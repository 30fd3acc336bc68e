//! Message-authentication registry.
//!
//! The current container format fixes the construction to HMAC over the
//! chosen hash; the identifier is still carried on the wire so the
//! registry can grow without a format change.

use std::fmt;

use digest::core_api::BlockSizeUser;
use digest::Digest;
use hmac::{Mac as _, SimpleHmac};

use crate::cipher::registry_options;
use crate::hash::{with_hash, Hash};
use crate::{Error, Result};

/// MAC key size in bytes; every registered construction consumes this.
pub const MAC_KEY_SIZE: usize = 64;

/// Registered MAC constructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mac {
    /// HMAC over the container's hash; tag length equals the digest size.
    Hmac = 1,
}

impl Mac {
    /// Every registered construction, in identifier order.
    pub const ALL: [Mac; 1] = [Mac::Hmac];

    /// Stable wire identifier.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Registry summary in `id:name` form, used in help and error text.
    pub fn options() -> String {
        registry_options(&Self::ALL)
    }
}

impl fmt::Display for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mac::Hmac => f.write_str("HMAC"),
        }
    }
}

impl From<Mac> for u8 {
    fn from(mac: Mac) -> u8 {
        mac.id()
    }
}

impl TryFrom<u8> for Mac {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            1 => Ok(Mac::Hmac),
            _ => Err(Error::InvalidMac),
        }
    }
}

/// Incremental MAC state fed with the preamble and ciphertext bytes in
/// stream order.
pub(crate) trait MacState {
    fn update(&mut self, data: &[u8]);
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

struct HmacState<D: Digest + BlockSizeUser>(SimpleHmac<D>);

impl<D: Digest + BlockSizeUser> MacState for HmacState<D> {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().into_bytes().to_vec()
    }
}

/// Builds the MAC state for a construction/hash pair.
pub(crate) fn mac_state(mac: Mac, hash: Hash, key: &[u8]) -> Result<Box<dyn MacState>> {
    match mac {
        Mac::Hmac => with_hash!(hash, D => {
            let state = SimpleHmac::<D>::new_from_slice(key)
                .map_err(|e| Error::Primitive(e.to_string()))?;
            Ok(Box::new(HmacState(state)) as Box<dyn MacState>)
        }),
    }
}

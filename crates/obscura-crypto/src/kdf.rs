//! Key derivation: passphrase + salt → (cipher key, MAC key).
//!
//! The security level abstracts memory cost: level `n` budgets
//! `1 << (20 + n)` bytes, i.e. 1 MiB at level 0 up to 1 TiB at level 20.
//! Each KDF converts the budget into its native parameter; HKDF ignores
//! it (the input is assumed high-entropy, e.g. a Diffie-Hellman shared
//! secret).

use std::fmt;

use hkdf::Hkdf;
use hmac::SimpleHmac;
use zeroize::Zeroizing;

use crate::cipher::registry_options;
use crate::hash::{with_hash, Hash};
use crate::{Error, Result};

/// Lowest legal security level.
pub const MIN_SEC: u8 = 0;

/// Highest legal security level.
pub const MAX_SEC: u8 = 20;

const INFO_CIPHER: &[u8] = b"CIP";
const INFO_MAC: &[u8] = b"MAC";

/// Registered key-derivation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Kdf {
    /// RFC 5869 extract-and-expand; for high-entropy input keying
    /// material only.
    Hkdf = 1,
    /// Argon2id, one pass, 128 lanes, memory-hard.
    Argon2id = 2,
    /// scrypt with `r = 8`, `p = 1`.
    Scrypt = 3,
    /// PBKDF2-HMAC; retained so legacy artifacts stay readable.
    Pbkdf2 = 4,
}

impl Kdf {
    /// Every registered KDF, in identifier order.
    pub const ALL: [Kdf; 4] = [Kdf::Hkdf, Kdf::Argon2id, Kdf::Scrypt, Kdf::Pbkdf2];

    /// Stable wire identifier.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Declared salt size in bytes; the header's live salt length must
    /// match exactly.
    pub const fn salt_size(self) -> usize {
        match self {
            Kdf::Pbkdf2 => 16,
            _ => 32,
        }
    }

    /// Registry summary in `id:name` form, used in help and error text.
    pub fn options() -> String {
        registry_options(&Self::ALL)
    }
}

impl fmt::Display for Kdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kdf::Hkdf => f.write_str("HKDF"),
            Kdf::Argon2id => f.write_str("Argon2id"),
            Kdf::Scrypt => f.write_str("Scrypt"),
            Kdf::Pbkdf2 => f.write_str("PBKDF2"),
        }
    }
}

impl From<Kdf> for u8 {
    fn from(kdf: Kdf) -> u8 {
        kdf.id()
    }
}

impl TryFrom<u8> for Kdf {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            1 => Ok(Kdf::Hkdf),
            2 => Ok(Kdf::Argon2id),
            3 => Ok(Kdf::Scrypt),
            4 => Ok(Kdf::Pbkdf2),
            _ => Err(Error::InvalidKdf),
        }
    }
}

/// Memory budget in bytes for a security level.
pub const fn memory(sec: u8) -> u64 {
    1u64 << (20 + sec as u32)
}

/// Derives the cipher and MAC keys from a passphrase and salt.
///
/// The two keys are non-overlapping byte ranges: HKDF expands the
/// passphrase twice with distinct info strings, the password-hashing
/// KDFs derive a single `size_cipher + size_mac` master output and split
/// it in order. Deterministic for fixed inputs.
///
/// # Errors
///
/// [`Error::InvalidSec`] outside `[MIN_SEC, MAX_SEC]`,
/// [`Error::EmptyKey`] for an empty passphrase,
/// [`Error::InvalidSaltSize`] when the salt does not match the KDF's
/// declared size, and [`Error::Primitive`] for failures inside the KDF.
pub fn derive_keys(
    kdf: Kdf,
    hash: Hash,
    sec: u8,
    size_cipher: usize,
    size_mac: usize,
    pass: &[u8],
    salt: &[u8],
) -> Result<(Zeroizing<Vec<u8>>, Zeroizing<Vec<u8>>)> {
    if sec > MAX_SEC {
        return Err(Error::InvalidSec);
    }
    if pass.is_empty() {
        return Err(Error::EmptyKey);
    }
    if salt.len() != kdf.salt_size() {
        return Err(Error::InvalidSaltSize);
    }

    let mut key_cipher = Zeroizing::new(vec![0u8; size_cipher]);
    let mut key_mac = Zeroizing::new(vec![0u8; size_mac]);

    if kdf == Kdf::Hkdf {
        with_hash!(hash, D => {
            let hk = Hkdf::<D, SimpleHmac<D>>::new(Some(salt), pass);
            hk.expand(INFO_CIPHER, &mut key_cipher)
                .map_err(|e| Error::Primitive(e.to_string()))?;
            hk.expand(INFO_MAC, &mut key_mac)
                .map_err(|e| Error::Primitive(e.to_string()))?;
        });
    } else {
        let mut master = Zeroizing::new(vec![0u8; size_cipher + size_mac]);
        derive_master(kdf, hash, sec, pass, salt, &mut master)?;
        key_cipher.copy_from_slice(&master[..size_cipher]);
        key_mac.copy_from_slice(&master[size_cipher..]);
    }

    Ok((key_cipher, key_mac))
}

/// Runs the level-parameterised password hash into `out`.
fn derive_master(
    kdf: Kdf,
    hash: Hash,
    sec: u8,
    pass: &[u8],
    salt: &[u8],
    out: &mut [u8],
) -> Result<()> {
    let memory = memory(sec);
    match kdf {
        Kdf::Argon2id => {
            let params = argon2::Params::new((memory / 1024) as u32, 1, 128, Some(out.len()))
                .map_err(|e| Error::Primitive(e.to_string()))?;
            argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
                .hash_password_into(pass, salt, out)
                .map_err(|e| Error::Primitive(e.to_string()))
        }
        Kdf::Scrypt => {
            // N = memory / (128 * r * p) = 2^(10 + sec) with r = 8, p = 1.
            let params = scrypt::Params::new(10 + sec, 8, 1, out.len())
                .map_err(|e| Error::Primitive(e.to_string()))?;
            scrypt::scrypt(pass, salt, &params, out).map_err(|e| Error::Primitive(e.to_string()))
        }
        Kdf::Pbkdf2 => {
            // Levels scale in millions of rounds; level 0 still gets one
            // million so the output is never the raw HMAC of the salt.
            let rounds = 1_000_000u32 * u32::from(sec.max(1));
            with_hash!(hash, D => {
                pbkdf2::pbkdf2::<SimpleHmac<D>>(pass, salt, rounds, out)
                    .map_err(|e| Error::Primitive(e.to_string()))
            })
        }
        Kdf::Hkdf => Err(Error::InvalidKdf),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_scale() {
        assert_eq!(memory(0), 1 << 20);
        assert_eq!(memory(10), 1 << 30);
        assert_eq!(memory(20), 1 << 40);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let salt = [5u8; 32];
        for kdf in [Kdf::Hkdf, Kdf::Argon2id, Kdf::Scrypt] {
            let a = derive_keys(kdf, Hash::Sha256, 0, 32, 64, b"pass", &salt).unwrap();
            let b = derive_keys(kdf, Hash::Sha256, 0, 32, 64, b"pass", &salt).unwrap();
            assert_eq!(a.0, b.0, "{kdf}");
            assert_eq!(a.1, b.1, "{kdf}");
        }
    }

    #[test]
    fn test_keys_do_not_overlap() {
        let salt = [9u8; 32];
        let (cipher, mac) = derive_keys(Kdf::Hkdf, Hash::Sha256, 0, 32, 64, b"pw", &salt).unwrap();
        assert_eq!(cipher.len(), 32);
        assert_eq!(mac.len(), 64);
        assert_ne!(&cipher[..32], &mac[..32]);
    }

    #[test]
    fn test_salt_and_level_change_keys() {
        let (a, _) = derive_keys(Kdf::Hkdf, Hash::Sha256, 0, 32, 64, b"pw", &[1u8; 32]).unwrap();
        let (b, _) = derive_keys(Kdf::Hkdf, Hash::Sha256, 0, 32, 64, b"pw", &[2u8; 32]).unwrap();
        assert_ne!(a, b);

        let (c, _) =
            derive_keys(Kdf::Argon2id, Hash::Sha256, 0, 32, 64, b"pw", &[1u8; 32]).unwrap();
        let (d, _) =
            derive_keys(Kdf::Argon2id, Hash::Sha256, 1, 32, 64, b"pw", &[1u8; 32]).unwrap();
        assert_ne!(c, d);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let salt = [0u8; 32];
        assert!(matches!(
            derive_keys(Kdf::Hkdf, Hash::Sha256, 21, 32, 64, b"pw", &salt),
            Err(Error::InvalidSec)
        ));
        assert!(matches!(
            derive_keys(Kdf::Hkdf, Hash::Sha256, 0, 32, 64, b"", &salt),
            Err(Error::EmptyKey)
        ));
        assert!(matches!(
            derive_keys(Kdf::Hkdf, Hash::Sha256, 0, 32, 64, b"pw", &salt[..16]),
            Err(Error::InvalidSaltSize)
        ));
        // PBKDF2 declares a 16-byte salt.
        assert!(matches!(
            derive_keys(Kdf::Pbkdf2, Hash::Sha256, 0, 32, 64, b"pw", &salt),
            Err(Error::InvalidSaltSize)
        ));
    }

    #[test]
    fn test_pbkdf2_legacy_path() {
        let salt = [7u8; 16];
        let a = derive_keys(Kdf::Pbkdf2, Hash::Sha256, 0, 32, 64, b"pw", &salt).unwrap();
        let b = derive_keys(Kdf::Pbkdf2, Hash::Sha256, 0, 32, 64, b"pw", &salt).unwrap();
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
    }
}

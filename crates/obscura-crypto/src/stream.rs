//! Encrypt and decrypt pipelines over the container format.
//!
//! Both directions are straight-line, single-threaded, blocking I/O:
//! read a chunk, run the keystream over it in place, fan the ciphertext
//! bytes out to the writer and the MAC, repeat until EOF. The preamble
//! bytes are fed to the MAC before the payload, so the returned tag
//! covers `meta ‖ header ‖ ciphertext` in stream order.

use std::io::{BufWriter, ErrorKind, Read, Write};

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::cipher::{keystream, Cipher, Direction, Mode};
use crate::hash::Hash;
use crate::header::{Header, Meta, CURRENT_VERSION};
use crate::kdf::{derive_keys, Kdf};
use crate::mac::{mac_state, Mac, MAC_KEY_SIZE};
use crate::verify::verify;
use crate::{Error, Result};

/// Copy-loop chunk size in bytes.
const COPY_BUF: usize = 64 * 1024;

/// Default security level (1 GiB of KDF memory).
pub const DEFAULT_SEC: u8 = 10;

/// The encrypt-side primitive selection.
///
/// Decryption never consults a `Suite`; every artifact is
/// self-describing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suite {
    /// Payload cipher.
    pub cipher: Cipher,
    /// Block stream mode, meaningful for the AES family.
    pub mode: Mode,
    /// Key derivation function.
    pub kdf: Kdf,
    /// MAC construction.
    pub mac: Mac,
    /// Hash parameterising the MAC, HKDF and PBKDF2.
    pub hash: Hash,
    /// Security level in `[MIN_SEC, MAX_SEC]`.
    pub sec: u8,
}

impl Default for Suite {
    fn default() -> Self {
        Self {
            cipher: Cipher::Aes256,
            mode: Mode::Ctr,
            kdf: Kdf::Argon2id,
            mac: Mac::Hmac,
            hash: Hash::Sha256,
            sec: DEFAULT_SEC,
        }
    }
}

/// Callback receiving the resolved version, header, passphrase and the
/// two derived keys, once per operation, between key derivation and the
/// streaming copy. Returning an error aborts the operation before any
/// payload bytes are produced; callers must not retain the key slices
/// past the call.
pub type PrintFn<'a> = &'a dyn Fn(u32, &Header, &[u8], &[u8], &[u8]) -> Result<()>;

/// Encrypts `reader` into `writer` under `pass`.
///
/// A fresh salt and nonce are drawn from the system CSPRNG, the preamble
/// is emitted, and the payload follows as keystream ciphertext. Returns
/// the authentication tag over the preamble and ciphertext; the tag is
/// *not* part of the output stream.
///
/// # Errors
///
/// Any of the validation errors from [`derive_keys`], [`Error::Io`] from
/// the reader, writer or randomness source, and whatever the print
/// callback returns.
pub fn encrypt<R: Read, W: Write>(
    reader: R,
    writer: W,
    pass: &[u8],
    suite: &Suite,
    print: Option<PrintFn<'_>>,
) -> Result<Vec<u8>> {
    let mut salt = vec![0u8; suite.kdf.salt_size()];
    let mut nonce = vec![0u8; suite.cipher.nonce_size()];
    OsRng
        .try_fill_bytes(&mut salt)
        .and_then(|()| OsRng.try_fill_bytes(&mut nonce))
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;
    encrypt_with(reader, writer, pass, suite, &salt, &nonce, print)
}

/// Deterministic core of [`encrypt`]: the caller supplies salt and
/// nonce. For a fixed salt and nonce the output is a pure function of
/// the remaining inputs.
pub(crate) fn encrypt_with<R: Read, W: Write>(
    mut reader: R,
    writer: W,
    pass: &[u8],
    suite: &Suite,
    salt: &[u8],
    nonce: &[u8],
    print: Option<PrintFn<'_>>,
) -> Result<Vec<u8>> {
    let (key_cipher, key_mac) = derive_keys(
        suite.kdf,
        suite.hash,
        suite.sec,
        suite.cipher.key_size(),
        MAC_KEY_SIZE,
        pass,
        salt,
    )?;
    if nonce.len() != suite.cipher.nonce_size() {
        return Err(Error::InvalidNonceSize);
    }

    let mut stream = keystream(
        suite.cipher,
        suite.mode,
        Direction::Encrypt,
        &key_cipher,
        nonce,
    )?;
    let mut mac = mac_state(suite.mac, suite.hash, &key_mac)?;

    let meta = Meta::new(CURRENT_VERSION);
    let mut header = Header::for_version(CURRENT_VERSION)?;
    header.set(
        suite.cipher,
        suite.mode,
        suite.kdf,
        suite.mac,
        suite.hash,
        suite.sec,
        salt,
        nonce,
    );

    if let Some(print) = print {
        print(meta.version(), &header, pass, &key_cipher, &key_mac)?;
    }

    let mut w = BufWriter::new(writer);
    let meta_bytes = meta.to_bytes();
    let header_bytes = header.to_bytes();
    w.write_all(&meta_bytes)?;
    w.write_all(&header_bytes)?;
    mac.update(&meta_bytes);
    mac.update(&header_bytes);

    let mut buf = Zeroizing::new(vec![0u8; COPY_BUF]);
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        };
        stream.apply(&mut buf[..n]);
        w.write_all(&buf[..n])?;
        mac.update(&buf[..n]);
    }
    w.flush()?;

    Ok(mac.finalize())
}

/// Decrypts `reader` into `writer` under `pass`.
///
/// The artifact's own preamble selects the primitives; unknown
/// identifiers fail before any payload byte is read. Returns the
/// computed tag — callers wanting integrity must compare it against an
/// expected tag, most conveniently through [`decrypt_verify`].
pub fn decrypt<R: Read, W: Write>(
    mut reader: R,
    writer: W,
    pass: &[u8],
    print: Option<PrintFn<'_>>,
) -> Result<Vec<u8>> {
    let meta = Meta::read(&mut reader)?;
    let mut header = meta.header()?;
    header.read(&mut reader)?;

    let fields = header.get();
    let cipher = Cipher::try_from(fields.cipher)?;
    let mode = Mode::try_from(fields.mode)?;
    let kdf = Kdf::try_from(fields.kdf)?;
    let mac_id = Mac::try_from(fields.mac)?;
    let hash = Hash::try_from(fields.hash)?;
    if fields.salt.len() != kdf.salt_size() {
        return Err(Error::InvalidSaltSize);
    }
    if fields.nonce.len() != cipher.nonce_size() {
        return Err(Error::InvalidNonceSize);
    }

    let (key_cipher, key_mac) = derive_keys(
        kdf,
        hash,
        fields.sec,
        cipher.key_size(),
        MAC_KEY_SIZE,
        pass,
        fields.salt,
    )?;
    let mut stream = keystream(cipher, mode, Direction::Decrypt, &key_cipher, fields.nonce)?;
    let mut mac = mac_state(mac_id, hash, &key_mac)?;

    if let Some(print) = print {
        print(meta.version(), &header, pass, &key_cipher, &key_mac)?;
    }

    // Bind the preamble into the tag exactly as transmitted.
    mac.update(&meta.to_bytes());
    mac.update(&header.to_bytes());

    let mut w = BufWriter::new(writer);
    let mut buf = Zeroizing::new(vec![0u8; COPY_BUF]);
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        };
        mac.update(&buf[..n]);
        stream.apply(&mut buf[..n]);
        w.write_all(&buf[..n])?;
    }
    w.flush()?;

    Ok(mac.finalize())
}

/// Decrypts and, when `expected` carries a tag, verifies it in constant
/// time.
///
/// The computed tag is returned either way; on a mismatch the plaintext
/// may already have been written and the caller decides whether to
/// discard it.
pub fn decrypt_verify<R: Read, W: Write>(
    reader: R,
    writer: W,
    pass: &[u8],
    expected: Option<&[u8]>,
    print: Option<PrintFn<'_>>,
) -> Result<Vec<u8>> {
    let tag = decrypt(reader, writer, pass, print)?;
    if let Some(expected) = expected {
        if !expected.is_empty() {
            verify(expected, &tag)?;
        }
    }
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{META_SIZE, OVERHEAD};

    fn hkdf_suite() -> Suite {
        Suite {
            cipher: Cipher::Aes256,
            mode: Mode::Ctr,
            kdf: Kdf::Hkdf,
            mac: Mac::Hmac,
            hash: Hash::Sha256,
            sec: 0,
        }
    }

    #[test]
    fn test_container_layout_with_fixed_entropy() {
        // AES-256-CTR + HKDF + HMAC-SHA-256, level 0, all-zero salt and
        // nonce, passphrase "pw", payload "hello".
        let salt = [0u8; 32];
        let nonce = [0u8; 16];
        let mut out = Vec::new();
        let tag = encrypt_with(
            &b"hello"[..],
            &mut out,
            b"pw",
            &hkdf_suite(),
            &salt,
            &nonce,
            None,
        )
        .unwrap();

        assert_eq!(out.len(), OVERHEAD + 5);
        assert_eq!(&out[..4], &[0x47, 0x48, 0x4D, 0xFF]);
        assert_eq!(&out[4..8], &[0, 0, 0, 7]);
        // cipher, mode, kdf, mac, hash, sec, salt len, nonce len
        assert_eq!(&out[8..16], &[1, 1, 1, 1, 6, 0, 32, 16]);
        assert_eq!(&out[16..48], &salt);
        assert_eq!(&out[48..64], &nonce);
        assert_eq!(tag.len(), 32);

        let mut plain = Vec::new();
        let tag2 = decrypt(&out[..], &mut plain, b"pw", None).unwrap();
        assert_eq!(plain, b"hello");
        assert_eq!(tag, tag2);
    }

    #[test]
    fn test_fixed_entropy_is_deterministic() {
        let salt = [4u8; 32];
        let nonce = [5u8; 16];
        let suite = hkdf_suite();
        let run = || {
            let mut out = Vec::new();
            let tag =
                encrypt_with(&b"payload"[..], &mut out, b"pw", &suite, &salt, &nonce, None)
                    .unwrap();
            (out, tag)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_empty_payload_chacha_argon2() {
        let suite = Suite {
            cipher: Cipher::ChaCha20,
            mode: Mode::Ctr,
            kdf: Kdf::Argon2id,
            mac: Mac::Hmac,
            hash: Hash::Sha512,
            sec: 1,
        };
        let mut out = Vec::new();
        let tag = encrypt(&b""[..], &mut out, b"x", &suite, None).unwrap();
        assert_eq!(out.len(), OVERHEAD);
        assert_eq!(tag.len(), 64);

        let mut plain = Vec::new();
        let tag2 = decrypt_verify(&out[..], &mut plain, b"x", Some(&tag), None).unwrap();
        assert!(plain.is_empty());
        assert_eq!(tag, tag2);
    }

    #[test]
    fn test_header_self_description() {
        let salt = [0x11u8; 32];
        let nonce = [0x22u8; 12];
        let suite = Suite {
            cipher: Cipher::ChaCha20,
            mode: Mode::Ofb,
            kdf: Kdf::Hkdf,
            mac: Mac::Hmac,
            hash: Hash::Blake2b384,
            sec: 0,
        };
        let mut out = Vec::new();
        encrypt_with(&b"data"[..], &mut out, b"pw", &suite, &salt, &nonce, None).unwrap();

        let mut r = &out[..];
        let meta = Meta::read(&mut r).unwrap();
        let mut header = meta.header().unwrap();
        header.read(&mut r).unwrap();
        let f = header.get();
        assert_eq!(meta.version(), CURRENT_VERSION);
        assert_eq!(f.cipher, suite.cipher.id());
        assert_eq!(f.mode, suite.mode.id());
        assert_eq!(f.kdf, suite.kdf.id());
        assert_eq!(f.mac, suite.mac.id());
        assert_eq!(f.hash, suite.hash.id());
        assert_eq!(f.sec, suite.sec);
        assert_eq!(f.salt, &salt);
        assert_eq!(f.nonce, &nonce);
    }

    #[test]
    fn test_print_callback_sees_keys_and_can_abort() {
        let seen = std::cell::Cell::new(false);
        let dump: PrintFn<'_> = &|version, header, pass, key_cipher, key_mac| {
            assert_eq!(version, CURRENT_VERSION);
            assert_eq!(header.get().cipher, 1);
            assert_eq!(pass, b"pw");
            assert_eq!(key_cipher.len(), 32);
            assert_eq!(key_mac.len(), MAC_KEY_SIZE);
            seen.set(true);
            Ok(())
        };
        let mut out = Vec::new();
        encrypt(&b"hi"[..], &mut out, b"pw", &hkdf_suite(), Some(dump)).unwrap();
        assert!(seen.get());

        // A dry run aborts before any byte reaches the writer.
        let abort: PrintFn<'_> = &|_, _, _, _, _| Err(Error::DryRun);
        let mut out = Vec::new();
        let err = encrypt(&b"hi"[..], &mut out, b"pw", &hkdf_suite(), Some(abort));
        assert!(matches!(err, Err(Error::DryRun)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_decrypt_without_expected_tag_still_returns_tag() {
        let mut out = Vec::new();
        let tag = encrypt(&b"abc"[..], &mut out, b"pw", &hkdf_suite(), None).unwrap();
        let mut plain = Vec::new();
        let tag2 = decrypt_verify(&out[..], &mut plain, b"pw", None, None).unwrap();
        assert_eq!(tag, tag2);
    }

    #[test]
    fn test_empty_passphrase_rejected_before_output() {
        let mut out = Vec::new();
        let err = encrypt(&b"x"[..], &mut out, b"", &hkdf_suite(), None);
        assert!(matches!(err, Err(Error::EmptyKey)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_v6_layout_reads_like_v7() {
        // The v6 parameter block is byte-identical to v7; relabelling the
        // version must not change the recovered payload (only the tag,
        // which covers the meta bytes).
        let mut out = Vec::new();
        encrypt(&b"legacy"[..], &mut out, b"pw", &hkdf_suite(), None).unwrap();
        out[META_SIZE - 1] = 6;

        let mut plain = Vec::new();
        decrypt(&out[..], &mut plain, b"pw", None).unwrap();
        assert_eq!(plain, b"legacy");
    }

    #[test]
    fn test_v5_artifact_decrypts() {
        // Hand-assembled v5 container: 16-byte salt buffer, PBKDF2.
        let pass = b"pw";
        let salt = [6u8; 16];
        let nonce = [7u8; 16];
        let (key_cipher, key_mac) =
            derive_keys(Kdf::Pbkdf2, Hash::Sha256, 0, 32, MAC_KEY_SIZE, pass, &salt).unwrap();

        let meta = Meta::new(5);
        let mut header = Header::for_version(5).unwrap();
        header.set(
            Cipher::Aes256,
            Mode::Ctr,
            Kdf::Pbkdf2,
            Mac::Hmac,
            Hash::Sha256,
            0,
            &salt,
            &nonce,
        );

        let mut body = b"legacy v5 payload".to_vec();
        keystream(
            Cipher::Aes256,
            Mode::Ctr,
            Direction::Encrypt,
            &key_cipher,
            &nonce,
        )
        .unwrap()
        .apply(&mut body);

        let mut artifact = Vec::new();
        artifact.extend_from_slice(&meta.to_bytes());
        artifact.extend_from_slice(&header.to_bytes());
        artifact.extend_from_slice(&body);

        let mut plain = Vec::new();
        let tag = decrypt(&artifact[..], &mut plain, pass, None).unwrap();
        assert_eq!(plain, b"legacy v5 payload");

        // The tag covers the v5 preamble plus ciphertext.
        let mut mac = mac_state(Mac::Hmac, Hash::Sha256, &key_mac).unwrap();
        mac.update(&meta.to_bytes());
        mac.update(&header.to_bytes());
        mac.update(&body);
        assert_eq!(tag, mac.finalize());
    }

    #[test]
    fn test_large_payload_crosses_chunk_boundaries() {
        let payload: Vec<u8> = (0..200_000u32).map(|i| i as u8).collect();
        let mut out = Vec::new();
        let tag = encrypt(&payload[..], &mut out, b"pw", &hkdf_suite(), None).unwrap();
        assert_eq!(out.len(), OVERHEAD + payload.len());

        let mut plain = Vec::new();
        let tag2 = decrypt_verify(&out[..], &mut plain, b"pw", Some(&tag), None).unwrap();
        assert_eq!(plain, payload);
        assert_eq!(tag, tag2);
    }
}

//! Property-based tests for the container pipeline.
//!
//! These focus on invariants that must hold for arbitrary inputs:
//! round-tripping, overhead identity, tamper detection and the rejection
//! of unregistered identifiers. HKDF at level 0 keeps the KDF cost out
//! of the hot loop.

use proptest::prelude::*;

use crate::{
    decrypt, decrypt_verify, derive_keys, encrypt, verify, Cipher, Error, Hash, Kdf, Mac, Mode,
    Suite, MAC_KEY_SIZE, OVERHEAD,
};

fn fast_suite(cipher: Cipher, mode: Mode, hash: Hash) -> Suite {
    Suite {
        cipher,
        mode,
        kdf: Kdf::Hkdf,
        mac: Mac::Hmac,
        hash,
        sec: 0,
    }
}

fn any_cipher_mode() -> impl Strategy<Value = (Cipher, Mode)> {
    (
        prop::sample::select(Cipher::ALL.to_vec()),
        prop::sample::select(Mode::ALL.to_vec()),
    )
}

fn any_hash() -> impl Strategy<Value = Hash> {
    prop::sample::select(Hash::ALL.to_vec())
}

proptest! {
    /// Decryption inverts encryption and both sides compute the same
    /// tag, for every registered cipher/mode/hash combination.
    #[test]
    fn roundtrip_any_payload(
        payload in prop::collection::vec(any::<u8>(), 0..2000),
        (cipher, mode) in any_cipher_mode(),
        hash in any_hash(),
    ) {
        let suite = fast_suite(cipher, mode, hash);
        let mut artifact = Vec::new();
        let tag = encrypt(&payload[..], &mut artifact, b"pw", &suite, None).unwrap();

        prop_assert_eq!(artifact.len(), OVERHEAD + payload.len());
        prop_assert_eq!(tag.len(), hash.digest_size());

        let mut plain = Vec::new();
        let tag2 = decrypt_verify(&artifact[..], &mut plain, b"pw", Some(&tag), None).unwrap();
        prop_assert_eq!(plain, payload);
        prop_assert_eq!(tag, tag2);
    }

    /// Flipping any single bit of the artifact makes verification fail.
    #[test]
    fn any_bitflip_is_detected(
        payload in prop::collection::vec(any::<u8>(), 1..200),
        bit in any::<usize>(),
    ) {
        let suite = fast_suite(Cipher::Aes256, Mode::Ctr, Hash::Sha256);
        let mut artifact = Vec::new();
        let tag = encrypt(&payload[..], &mut artifact, b"pw", &suite, None).unwrap();

        let bit = bit % (artifact.len() * 8);
        artifact[bit / 8] ^= 1 << (bit % 8);

        let mut plain = Vec::new();
        let result = decrypt_verify(&artifact[..], &mut plain, b"pw", Some(&tag), None);
        prop_assert!(result.is_err());
    }

    /// Unregistered identifiers never parse.
    #[test]
    fn unknown_identifiers_rejected(id in any::<u8>()) {
        if !(1..=2).contains(&id) {
            prop_assert!(matches!(Cipher::try_from(id), Err(Error::InvalidCipher)));
        }
        if !(1..=3).contains(&id) {
            prop_assert!(matches!(Mode::try_from(id), Err(Error::InvalidMode)));
        }
        if !(1..=4).contains(&id) {
            prop_assert!(matches!(Kdf::try_from(id), Err(Error::InvalidKdf)));
        }
        if id != 1 {
            prop_assert!(matches!(Mac::try_from(id), Err(Error::InvalidMac)));
        }
        if !(1..=13).contains(&id) {
            prop_assert!(matches!(Hash::try_from(id), Err(Error::InvalidHash)));
        }
    }

    /// Key derivation is a pure function of its inputs and the two keys
    /// never coincide.
    #[test]
    fn derive_keys_deterministic(
        pass in prop::collection::vec(any::<u8>(), 1..64),
        salt in prop::array::uniform32(any::<u8>()),
    ) {
        let a = derive_keys(Kdf::Hkdf, Hash::Sha256, 0, 32, MAC_KEY_SIZE, &pass, &salt).unwrap();
        let b = derive_keys(Kdf::Hkdf, Hash::Sha256, 0, 32, MAC_KEY_SIZE, &pass, &salt).unwrap();
        prop_assert_eq!(&a.0, &b.0);
        prop_assert_eq!(&a.1, &b.1);
        prop_assert_ne!(&a.0[..], &a.1[..32]);
    }

    /// The constant-time comparator agrees with plain equality.
    #[test]
    fn verify_matches_equality(
        x in prop::collection::vec(any::<u8>(), 0..64),
        y in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        prop_assert_eq!(verify(&x, &y).is_ok(), x == y);
    }

    /// A wrong passphrase yields a different tag (and so fails verify),
    /// but decryption itself still runs to completion.
    #[test]
    fn wrong_passphrase_changes_tag(payload in prop::collection::vec(any::<u8>(), 16..200)) {
        let suite = fast_suite(Cipher::ChaCha20, Mode::Ctr, Hash::Sha256);
        let mut artifact = Vec::new();
        let tag = encrypt(&payload[..], &mut artifact, b"right", &suite, None).unwrap();

        let mut plain = Vec::new();
        let tag2 = decrypt(&artifact[..], &mut plain, b"wrong", None).unwrap();
        prop_assert_ne!(&tag, &tag2);
        prop_assert_ne!(plain, payload);
    }
}

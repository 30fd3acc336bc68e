//! Archive framing over arbitrary bytes must fail cleanly, never panic
//! or over-allocate from attacker-controlled length prefixes.
//!
//! The empty passphrase stops every run at key derivation; see
//! `fuzz_container_decrypt`.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut out = Vec::new();
    let _ = obscura_crypto::decrypt_archive(std::io::Cursor::new(data), &mut out, b"", None);
});

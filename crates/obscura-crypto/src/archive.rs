//! Length-prefixed outer envelope for embedding a container in a larger
//! carrier stream.
//!
//! ```text
//! [ i64-be data size ][ container of that many bytes ]
//! [ i64-be tag size  ][ tag bytes ]
//! ```
//!
//! `data size` is the container length, i.e. [`OVERHEAD`] plus the
//! plaintext length, so a reader can locate and verify the artifact
//! without external metadata. The trailing tag is the detached
//! authentication tag of the inner container.

use std::io::{Read, Write};

use crate::header::OVERHEAD;
use crate::stream::{decrypt, encrypt, PrintFn, Suite};
use crate::verify::verify;
use crate::{Error, Result};

/// Upper bound accepted for the trailing tag region; the longest
/// registered digest is 64 bytes.
const MAX_TAG_SIZE: i64 = 1024;

fn invalid_data(msg: &str) -> Error {
    Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, msg))
}

fn read_i64(r: &mut impl Read) -> Result<i64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_be_bytes(buf))
}

/// Encrypts exactly `size` bytes of `reader` into an archive frame.
///
/// The caller must know the plaintext size in advance; the reader is
/// limited to it. Returns the inner tag (which is also written as the
/// trailer).
pub fn encrypt_archive<R: Read, W: Write>(
    reader: R,
    mut writer: W,
    pass: &[u8],
    size: u64,
    suite: &Suite,
    print: Option<PrintFn<'_>>,
) -> Result<Vec<u8>> {
    let data_size = i64::try_from(size)
        .ok()
        .and_then(|n| n.checked_add(OVERHEAD as i64))
        .ok_or_else(|| invalid_data("archive size overflow"))?;
    writer.write_all(&data_size.to_be_bytes())?;
    let tag = encrypt(reader.take(size), &mut writer, pass, suite, print)?;
    writer.write_all(&(tag.len() as i64).to_be_bytes())?;
    writer.write_all(&tag)?;
    writer.flush()?;
    Ok(tag)
}

/// Decrypts an archive frame, verifying the trailing tag against the
/// computed one in constant time.
///
/// Returns `(computed, expected)` — byte-equal on success.
pub fn decrypt_archive<R: Read, W: Write>(
    mut reader: R,
    writer: W,
    pass: &[u8],
    print: Option<PrintFn<'_>>,
) -> Result<(Vec<u8>, Vec<u8>)> {
    let data_size = read_i64(&mut reader)?;
    let data_size =
        u64::try_from(data_size).map_err(|_| invalid_data("negative archive data size"))?;

    let tag = decrypt((&mut reader).take(data_size), writer, pass, print)?;

    let tag_size = read_i64(&mut reader)?;
    if !(0..=MAX_TAG_SIZE).contains(&tag_size) {
        return Err(invalid_data("archive tag size out of range"));
    }
    let mut expected = vec![0u8; tag_size as usize];
    reader.read_exact(&mut expected)?;
    verify(&expected, &tag)?;
    Ok((tag, expected))
}

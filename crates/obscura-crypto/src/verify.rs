//! Fixed-time tag comparison.

use subtle::ConstantTimeEq;

use crate::{Error, Result};

/// Compares two byte strings without short-circuiting on the first
/// differing byte.
///
/// This is the only comparison the decrypt paths apply to
/// authentication tags. Length is treated as public: unequal lengths
/// fail immediately.
pub fn verify(x: &[u8], y: &[u8]) -> Result<()> {
    if x.len() == y.len() && bool::from(x.ct_eq(y)) {
        Ok(())
    } else {
        Err(Error::SignatureVerification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_slices_pass() {
        verify(b"", b"").unwrap();
        verify(b"tag-bytes", b"tag-bytes").unwrap();
    }

    #[test]
    fn test_any_difference_fails() {
        assert!(matches!(
            verify(b"tag-bytes", b"tag-byteZ"),
            Err(Error::SignatureVerification)
        ));
        assert!(matches!(
            verify(b"short", b"longer-tag"),
            Err(Error::SignatureVerification)
        ));
        assert!(matches!(
            verify(b"", b"x"),
            Err(Error::SignatureVerification)
        ));
    }
}

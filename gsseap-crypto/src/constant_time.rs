//! Constant-time comparisons, used for channel-binding and MIC checks.

use subtle::ConstantTimeEq;

/// Compare two byte slices in constant time. Unequal lengths short-circuit
/// (length itself is not treated as secret here).
pub fn bytes_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_slices_match() {
        assert!(bytes_eq(b"abcdef", b"abcdef"));
    }

    #[test]
    fn unequal_length_does_not_match() {
        assert!(!bytes_eq(b"abc", b"abcd"));
    }

    #[test]
    fn unequal_content_does_not_match() {
        assert!(!bytes_eq(b"abcdef", b"abcxef"));
    }
}

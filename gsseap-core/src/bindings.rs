//! Channel-bindings verification (C5).

use gsseap_crypto::Rfc3961Key;
use gsseap_crypto::Rfc3961Suite;

use crate::errors::{GssError, MajorStatus, MinorStatus};

/// The initiator's side: wrap `application_data` (confidentiality) under
/// the newly derived key, ready to carry in a `GSS_CHANNEL_BINDINGS`
/// inner token. Missing bindings are treated as a zero-length buffer.
pub fn wrap_bindings(suite: &dyn Rfc3961Suite, key: &Rfc3961Key, application_data: Option<&[u8]>) -> Vec<u8> {
    suite.wrap(key, application_data.unwrap_or(&[]))
}

/// The acceptor's side: unwrap the peer's wrapped bindings and
/// constant-time compare to the caller-supplied local bindings.
pub fn verify_bindings(
    suite: &dyn Rfc3961Suite,
    key: &Rfc3961Key,
    wrapped_peer_bindings: &[u8],
    local_application_data: Option<&[u8]>,
) -> Result<(), GssError> {
    let peer_bindings = suite
        .unwrap(key, wrapped_peer_bindings)
        .map_err(|_| GssError::new(MajorStatus::BadBindings, MinorStatus::BindingsMismatch))?;
    let local = local_application_data.unwrap_or(&[]);
    if gsseap_crypto::bytes_eq(&peer_bindings, local) {
        Ok(())
    } else {
        Err(GssError::new(MajorStatus::BadBindings, MinorStatus::BindingsMismatch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsseap_crypto::HmacSha1Suite;

    #[test]
    fn matching_bindings_verify() {
        let suite = HmacSha1Suite;
        let key = suite.random_to_key(&[0x55; 32]).unwrap();
        let wrapped = wrap_bindings(&suite, &key, Some(b"tls-unique:abc"));
        assert!(verify_bindings(&suite, &key, &wrapped, Some(b"tls-unique:abc")).is_ok());
    }

    #[test]
    fn mismatched_bindings_fail() {
        let suite = HmacSha1Suite;
        let key = suite.random_to_key(&[0x55; 32]).unwrap();
        let wrapped = wrap_bindings(&suite, &key, Some(b"abc"));
        assert!(verify_bindings(&suite, &key, &wrapped, Some(b"xyz")).is_err());
    }

    #[test]
    fn empty_bindings_on_both_sides_verify() {
        let suite = HmacSha1Suite;
        let key = suite.random_to_key(&[0x55; 32]).unwrap();
        let wrapped = wrap_bindings(&suite, &key, None);
        assert!(verify_bindings(&suite, &key, &wrapped, None).is_ok());
    }
}

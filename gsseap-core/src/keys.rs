//! Key derivation (C4): EMSK-half-split (initiator) and MS-MPPE-Send-Key
//! (acceptor) paths into an RFC-3961 key, driven through
//! `gsseap_crypto::Rfc3961Suite`.

use gsseap_crypto::{Rfc3961Key, Rfc3961Suite};

use crate::errors::{MajorStatus, MinorStatus, SmError};

/// Minimum EMSK length per spec §4.4/GLOSSARY.
const EMSK_MIN_LEN: usize = 64;
const EMSK_HALF_OFFSET: usize = 32;
const EMSK_HALF_LEN: usize = 32;

/// Initiator path: take the EMSK's second half (offset 32, len 32) and
/// run it through `random_to_key`.
pub fn derive_initiator_key(
    emsk: Option<&[u8]>,
    suite: &dyn Rfc3961Suite,
) -> Result<Rfc3961Key, SmError> {
    let emsk = emsk.ok_or_else(|| SmError::new(MajorStatus::Failure, MinorStatus::KeyUnavailable))?;
    if emsk.len() < EMSK_MIN_LEN {
        return Err(SmError::new(MajorStatus::Failure, MinorStatus::KeyTooShort));
    }
    let half = &emsk[EMSK_HALF_OFFSET..EMSK_HALF_OFFSET + EMSK_HALF_LEN];
    suite
        .random_to_key(half)
        .map_err(|_| SmError::new(MajorStatus::Failure, MinorStatus::KeyTooShort))
}

/// Acceptor path: feed the decrypted MS-MPPE-Send-Key octets straight to
/// `random_to_key`.
pub fn derive_acceptor_key(
    mppe_send_key: Option<&[u8]>,
    suite: &dyn Rfc3961Suite,
) -> Result<Rfc3961Key, SmError> {
    let key = mppe_send_key
        .ok_or_else(|| SmError::new(MajorStatus::Failure, MinorStatus::KeyUnavailable))?;
    suite
        .random_to_key(key)
        .map_err(|_| SmError::new(MajorStatus::Failure, MinorStatus::KeyTooShort))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsseap_crypto::HmacSha1Suite;

    #[test]
    fn initiator_path_takes_second_half() {
        let suite = HmacSha1Suite;
        let mut emsk = vec![0u8; 64];
        emsk[32..].copy_from_slice(&[0x77; 32]);
        let key = derive_initiator_key(Some(&emsk), &suite).unwrap();
        assert_eq!(key.as_bytes(), &[0x77; 16]);
    }

    #[test]
    fn initiator_path_rejects_short_emsk() {
        let suite = HmacSha1Suite;
        let emsk = vec![0u8; 40];
        assert!(derive_initiator_key(Some(&emsk), &suite).is_err());
    }

    #[test]
    fn initiator_path_rejects_missing_emsk() {
        let suite = HmacSha1Suite;
        assert!(derive_initiator_key(None, &suite).is_err());
    }

    #[test]
    fn acceptor_path_uses_mppe_key_directly() {
        let suite = HmacSha1Suite;
        let mppe = vec![0x11; 32];
        let key = derive_acceptor_key(Some(&mppe), &suite).unwrap();
        assert_eq!(key.as_bytes(), &[0x11; 16]);
    }
}

//! The RFC-3961 boundary: random-to-key, MIC, and wrap/unwrap.
//!
//! Implementing certified RFC 3961 crypto is explicitly out of scope (see
//! `spec.md` §1 Non-goals); this module defines the trait the state machine
//! drives, plus one concrete [`HmacSha1Suite`] reference/test
//! implementation that is strong enough to exercise the whole protocol
//! end-to-end but makes no standards-compliance claim.

use aes::cipher::{KeyIvInit, StreamCipher};
use aes::Aes128;
use ctr::Ctr128BE;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::errors::CryptoError;
use crate::key::{EncType, Rfc3961Key};

type Aes128Ctr = Ctr128BE<Aes128>;
type HmacSha1 = Hmac<Sha1>;

/// The checksum/wrap/unwrap boundary driven by `gsseap-core`.
pub trait Rfc3961Suite: Send + Sync {
    /// The enctype this suite implements.
    fn enctype(&self) -> EncType;

    /// Derive a key from raw random material (the EMSK half or MS-MPPE
    /// key octets). Fails if `random` is shorter than the enctype's key
    /// length.
    fn random_to_key(&self, random: &[u8]) -> Result<Rfc3961Key, CryptoError>;

    /// Compute a MIC over `data` under `key`.
    fn get_mic(&self, key: &Rfc3961Key, data: &[u8]) -> Vec<u8>;

    /// Verify a MIC produced by [`Rfc3961Suite::get_mic`].
    fn verify_mic(&self, key: &Rfc3961Key, data: &[u8], mic: &[u8]) -> Result<(), CryptoError> {
        let expected = self.get_mic(key, data);
        if crate::constant_time::bytes_eq(&expected, mic) {
            Ok(())
        } else {
            Err(CryptoError::MicMismatch)
        }
    }

    /// Encrypt `plaintext` for confidentiality under `key`.
    fn wrap(&self, key: &Rfc3961Key, plaintext: &[u8]) -> Vec<u8>;

    /// Decrypt a buffer produced by [`Rfc3961Suite::wrap`].
    fn unwrap(&self, key: &Rfc3961Key, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// Reference suite: HMAC-SHA1-96 checksums, AES-128-CTR confidentiality
/// with a random IV prepended to the ciphertext.
///
/// This is *not* an implementation of RFC 3961's key-derivation or
/// checksum algorithms (`random-to-key`, `DK`, `make-checksum`); it is a
/// deliberately simple stand-in sufficient to drive the state machine
/// in tests and the demo binary.
#[derive(Default)]
pub struct HmacSha1Suite;

impl Rfc3961Suite for HmacSha1Suite {
    fn enctype(&self) -> EncType {
        EncType::Aes128CtsHmacSha1_96
    }

    fn random_to_key(&self, random: &[u8]) -> Result<Rfc3961Key, CryptoError> {
        let need = self.enctype().key_len();
        if random.len() < need {
            return Err(CryptoError::KeyTooShort { got: random.len(), need });
        }
        Ok(Rfc3961Key::new(self.enctype(), random[..need].to_vec()))
    }

    fn get_mic(&self, key: &Rfc3961Key, data: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("hmac accepts any key length");
        mac.update(data);
        let full = mac.finalize().into_bytes();
        full[..12].to_vec() // hmac-sha1-96
    }

    fn wrap(&self, key: &Rfc3961Key, plaintext: &[u8]) -> Vec<u8> {
        let mut iv = [0u8; 16];
        getrandom::getrandom(&mut iv).expect("getrandom");
        let mut buf = plaintext.to_vec();
        let mut cipher = Aes128Ctr::new(key.as_bytes().into(), &iv.into());
        cipher.apply_keystream(&mut buf);

        let mut out = Vec::with_capacity(16 + buf.len());
        out.extend_from_slice(&iv);
        out.extend(buf);
        out
    }

    fn unwrap(&self, key: &Rfc3961Key, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.len() < 16 {
            return Err(CryptoError::CiphertextTooShort);
        }
        let (iv, body) = ciphertext.split_at(16);
        let mut buf = body.to_vec();
        let mut cipher = Aes128Ctr::new(key.as_bytes().into(), iv.into());
        cipher.apply_keystream(&mut buf);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mic_round_trips() {
        let suite = HmacSha1Suite;
        let key = suite.random_to_key(&[0x11; 32]).unwrap();
        let mic = suite.get_mic(&key, b"conversation log bytes");
        assert!(suite.verify_mic(&key, b"conversation log bytes", &mic).is_ok());
        assert!(suite.verify_mic(&key, b"tampered", &mic).is_err());
    }

    #[test]
    fn wrap_unwrap_round_trips() {
        let suite = HmacSha1Suite;
        let key = suite.random_to_key(&[0x22; 32]).unwrap();
        let wrapped = suite.wrap(&key, b"channel binding application data");
        let unwrapped = suite.unwrap(&key, &wrapped).unwrap();
        assert_eq!(unwrapped, b"channel binding application data");
    }

    #[test]
    fn random_to_key_rejects_short_input() {
        let suite = HmacSha1Suite;
        assert_eq!(
            suite.random_to_key(&[0u8; 8]),
            Err(CryptoError::KeyTooShort { got: 8, need: 16 })
        );
    }
}

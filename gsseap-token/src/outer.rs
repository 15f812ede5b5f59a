//! Outer token framing: `0x60 | DER-length | 0x06 | oid-len | oid | token-type | payload`.

use byteorder::{BigEndian, ByteOrder};

use crate::errors::TokenError;

const APPLICATION_TAG: u8 = 0x60;
const OID_TAG: u8 = 0x06;

/// Discriminates the outer `token-type` field.
///
/// Values are chosen to mirror the grouping used by the real GSS-EAP
/// mechanism (context tokens vs. per-message tokens vs. name export), not to
/// match any particular registered OID arc byte-for-byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u16)]
pub enum TokenType {
    InitiatorContext = 0x0100,
    AcceptorContext = 0x0302,
    Mic = 0x0303,
    Wrap = 0x0304,
    ExportName = 0x0401,
    ExportNameComposite = 0x0402,
    ContextError = 0x0500,
}

impl TokenType {
    pub const fn from_u16(v: u16) -> Option<Self> {
        Some(match v {
            0x0100 => Self::InitiatorContext,
            0x0302 => Self::AcceptorContext,
            0x0303 => Self::Mic,
            0x0304 => Self::Wrap,
            0x0401 => Self::ExportName,
            0x0402 => Self::ExportNameComposite,
            0x0500 => Self::ContextError,
            _ => return None,
        })
    }
}

/// A fully-decoded outer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OuterToken {
    pub oid: Vec<u8>,
    pub token_type: u16,
    pub payload: Vec<u8>,
}

/// Encode a definite-length DER length field, minimal form.
fn encode_der_length(len: usize) -> Vec<u8> {
    if len < 0x80 {
        vec![len as u8]
    } else {
        let mut be = Vec::new();
        let mut n = len as u64;
        while n > 0 {
            be.insert(0, (n & 0xff) as u8);
            n >>= 8;
        }
        let mut out = vec![0x80 | be.len() as u8];
        out.extend(be);
        out
    }
}

/// Decode a definite-length DER length field. Returns `(length, bytes_consumed)`.
fn decode_der_length(buf: &[u8]) -> Result<(usize, usize), TokenError> {
    let first = *buf.first().ok_or(TokenError::Truncated)?;
    if first < 0x80 {
        return Ok((first as usize, 1));
    }
    let n_bytes = (first & 0x7f) as usize;
    if n_bytes == 0 || n_bytes > 5 {
        return Err(TokenError::LengthOverflow);
    }
    if buf.len() < 1 + n_bytes {
        return Err(TokenError::Truncated);
    }
    let be = &buf[1..1 + n_bytes];
    if be[0] == 0 {
        return Err(TokenError::NonMinimalLength);
    }
    if n_bytes > 4 || (n_bytes == 4 && be[0] & 0x80 != 0) {
        return Err(TokenError::LengthOverflow);
    }
    let mut padded = [0u8; 4];
    padded[4 - n_bytes..].copy_from_slice(be);
    let len = BigEndian::read_u32(&padded) as usize;
    Ok((len, 1 + n_bytes))
}

/// Encode an outer token. `oid` is the mechanism OID body (without the
/// `0x06`/length prefix, which this function adds).
pub fn encode_outer(oid: &[u8], token_type: u16, inner_payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(2 + oid.len() + 2 + inner_payload.len());
    body.push(OID_TAG);
    body.push(oid.len() as u8);
    body.extend_from_slice(oid);
    body.extend_from_slice(&token_type.to_be_bytes());
    body.extend_from_slice(inner_payload);

    let mut out = Vec::with_capacity(1 + 5 + body.len());
    out.push(APPLICATION_TAG);
    out.extend(encode_der_length(body.len()));
    out.extend(body);
    out
}

/// Decode an outer token, verifying `expected_oid` matches exactly.
pub fn decode_outer(buf: &[u8], expected_oid: &[u8]) -> Result<OuterToken, TokenError> {
    if buf.first() != Some(&APPLICATION_TAG) {
        return Err(TokenError::BadPrefix);
    }
    let (len, consumed) = decode_der_length(&buf[1..])?;
    let body_start = 1 + consumed;
    if buf.len() < body_start + len {
        return Err(TokenError::Truncated);
    }
    if buf.len() != body_start + len {
        return Err(TokenError::InconsistentLength);
    }
    let body = &buf[body_start..body_start + len];

    if body.first() != Some(&OID_TAG) {
        return Err(TokenError::WrongMech);
    }
    let oid_len = *body.get(1).ok_or(TokenError::Truncated)? as usize;
    if body.len() < 2 + oid_len + 2 {
        return Err(TokenError::Truncated);
    }
    let oid = &body[2..2 + oid_len];
    if oid != expected_oid {
        return Err(TokenError::WrongMech);
    }
    let token_type = BigEndian::read_u16(&body[2 + oid_len..2 + oid_len + 2]);
    let payload = body[2 + oid_len + 2..].to_vec();

    Ok(OuterToken { oid: oid.to_vec(), token_type, payload })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OID: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x0f, 0x01, 0x01, 0x01];

    #[test]
    fn round_trips_short_payload() {
        let wire = encode_outer(OID, TokenType::InitiatorContext as u16, b"hello");
        let decoded = decode_outer(&wire, OID).unwrap();
        assert_eq!(decoded.token_type, TokenType::InitiatorContext as u16);
        assert_eq!(decoded.payload, b"hello");
    }

    #[test]
    fn round_trips_long_payload_multi_byte_length() {
        let payload = vec![0xAB; 300];
        let wire = encode_outer(OID, TokenType::Mic as u16, &payload);
        let decoded = decode_outer(&wire, OID).unwrap();
        assert_eq!(decoded.payload, payload);
    }

    #[test]
    fn rejects_bad_prefix() {
        let mut wire = encode_outer(OID, TokenType::Mic as u16, b"x");
        wire[0] = 0x61;
        assert_eq!(decode_outer(&wire, OID), Err(TokenError::BadPrefix));
    }

    #[test]
    fn rejects_truncated_body() {
        let wire = encode_outer(OID, TokenType::Mic as u16, b"hello world");
        let truncated = &wire[..wire.len() - 4];
        assert_eq!(decode_outer(truncated, OID), Err(TokenError::Truncated));
    }

    #[test]
    fn rejects_wrong_mech() {
        let wire = encode_outer(OID, TokenType::Mic as u16, b"x");
        let other_oid: &[u8] = &[0x2b, 0x06, 0x01, 0x04, 0x01];
        assert_eq!(decode_outer(&wire, other_oid), Err(TokenError::WrongMech));
    }

    #[test]
    fn rejects_non_minimal_length() {
        // Build a hand-crafted outer token with a two-byte length (0x81 0x05)
        // even though 5 fits in one byte.
        let mut body = vec![OID_TAG, OID.len() as u8];
        body.extend_from_slice(OID);
        body.extend_from_slice(&(TokenType::Mic as u16).to_be_bytes());
        body.extend_from_slice(b"x");
        let mut wire = vec![APPLICATION_TAG, 0x81, body.len() as u8];
        wire.extend(body);
        assert_eq!(decode_outer(&wire, OID), Err(TokenError::NonMinimalLength));
    }

    #[test]
    fn length_roundtrips_at_boundary() {
        for len in [0usize, 1, 0x7f, 0x80, 0xff, 0x1_00, 0x1_0000] {
            let (decoded, consumed) = decode_der_length(&encode_der_length(len)).unwrap();
            assert_eq!(decoded, len);
            assert_eq!(consumed, encode_der_length(len).len());
        }
    }
}

//! Inner token multiplexing: a sequence of `(u32 type, u32 length, body)`.
//!
//! The high bit of `type` is the criticality flag; the low 31 bits enumerate
//! the inner-token kind.

use std::collections::HashSet;

use byteorder::{BigEndian, ByteOrder};

use crate::errors::TokenError;

const CRITICAL_BIT: u32 = 0x8000_0000;

/// The enumerated inner-token kinds.
///
/// `from_u32`/`to_u32` are the single source of truth for the wire values;
/// [`InnerTokenKind::is_known`] backs the dispatcher's criticality check
/// (an inner token flagged critical whose kind is *not* known here must
/// cause `CRIT_ITOK_UNAVAILABLE`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum InnerTokenKind {
    AcceptorNameReq = 1,
    AcceptorNameResp = 2,
    EapReq = 3,
    EapResp = 4,
    GssFlags = 5,
    GssChannelBindings = 6,
    InitiatorMic = 7,
    AcceptorMic = 8,
    ReauthReq = 9,
    ReauthResp = 10,
    ReauthCreds = 11,
    ContextErr = 12,
    VendorInfo = 13,
    InitiatorExts = 14,
    AcceptorExts = 15,
}

impl InnerTokenKind {
    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    pub const fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            1 => Self::AcceptorNameReq,
            2 => Self::AcceptorNameResp,
            3 => Self::EapReq,
            4 => Self::EapResp,
            5 => Self::GssFlags,
            6 => Self::GssChannelBindings,
            7 => Self::InitiatorMic,
            8 => Self::AcceptorMic,
            9 => Self::ReauthReq,
            10 => Self::ReauthResp,
            11 => Self::ReauthCreds,
            12 => Self::ContextErr,
            13 => Self::VendorInfo,
            14 => Self::InitiatorExts,
            15 => Self::AcceptorExts,
            _ => return None,
        })
    }

    pub const fn is_known(raw: u32) -> bool {
        Self::from_u32(raw).is_some()
    }
}

/// One `(type, length, body)` entry of the inner-token stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InnerToken {
    pub critical: bool,
    pub kind_raw: u32,
    pub body: Vec<u8>,
}

impl InnerToken {
    pub fn new(kind: InnerTokenKind, critical: bool, body: Vec<u8>) -> Self {
        Self { critical, kind_raw: kind.to_u32(), body }
    }

    pub fn kind(&self) -> Option<InnerTokenKind> {
        InnerTokenKind::from_u32(self.kind_raw)
    }

    fn wire_type(&self) -> u32 {
        if self.critical { self.kind_raw | CRITICAL_BIT } else { self.kind_raw }
    }
}

/// Serialize a sequence of inner tokens into a single outer-token payload.
pub fn encode_inner_stream(tokens: &[InnerToken]) -> Vec<u8> {
    let mut out = Vec::new();
    for tok in tokens {
        let mut hdr = [0u8; 8];
        BigEndian::write_u32(&mut hdr[0..4], tok.wire_type());
        BigEndian::write_u32(&mut hdr[4..8], tok.body.len() as u32);
        out.extend_from_slice(&hdr);
        out.extend_from_slice(&tok.body);
    }
    out
}

/// Parse an outer-token payload into its inner tokens, preserving order.
///
/// Fails with [`TokenError::Truncated`] if a declared length exceeds the
/// remaining bytes, and [`TokenError::DuplicateKind`] if the same kind
/// (critical bit ignored) appears twice.
pub fn decode_inner_stream(buf: &[u8]) -> Result<Vec<InnerToken>, TokenError> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut pos = 0usize;

    while pos < buf.len() {
        if buf.len() - pos < 8 {
            return Err(TokenError::Truncated);
        }
        let wire_type = BigEndian::read_u32(&buf[pos..pos + 4]);
        let len = BigEndian::read_u32(&buf[pos + 4..pos + 8]) as usize;
        pos += 8;
        if buf.len() - pos < len {
            return Err(TokenError::Truncated);
        }
        let body = buf[pos..pos + len].to_vec();
        pos += len;

        let critical = wire_type & CRITICAL_BIT != 0;
        let kind_raw = wire_type & !CRITICAL_BIT;
        if !seen.insert(kind_raw) {
            return Err(TokenError::DuplicateKind(kind_raw));
        }
        out.push(InnerToken { critical, kind_raw, body });
    }
    Ok(out)
}

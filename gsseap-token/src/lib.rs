//! Outer/inner token framing for the GSS-EAP context-establishment protocol.
//!
//! This crate handles:
//! * The outer ASN.1-ish wrapper (`0x60 | DER-length | 0x06 | oid | token-type | payload`)
//! * The inner TLV stream multiplexed inside a outer token's payload
//!
//! It knows nothing about state machines, RADIUS, or EAP — just framing.

#![deny(unsafe_code)]

mod errors;
mod inner;
mod outer;

pub use errors::TokenError;
pub use inner::{decode_inner_stream, encode_inner_stream, InnerToken, InnerTokenKind};
pub use outer::{decode_outer, encode_outer, OuterToken, TokenType};

/// The mechanism OID body used by every token this crate produces.
///
/// DER-encoded arc for `1.3.6.1.5.5.15.1.1.1` (the GSS-EAP mechanism
/// family), without the leading `0x06`/length tag — [`encode_outer`] and
/// [`decode_outer`] add/check that tag themselves.
pub const MECHANISM_OID: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x0f, 0x01, 0x01, 0x01];

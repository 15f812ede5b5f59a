//! RFC-3961 key/checksum boundary: key material, the `Rfc3961Suite` trait
//! the state machine drives, a reference suite, and constant-time compare
//! helpers used for channel-binding verification.

#![deny(unsafe_code)]

mod constant_time;
mod errors;
mod key;
mod suite;

pub use constant_time::bytes_eq;
pub use errors::CryptoError;
pub use key::{CksumType, EncType, Rfc3961Key};
pub use suite::{HmacSha1Suite, Rfc3961Suite};

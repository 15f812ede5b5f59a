//! RADIUS/RadSec transport boundary: typed AVPs, request/response types,
//! and an in-memory AAA server test double.
//!
//! RADIUS wire parsing and RadSec transport security are out of scope
//! (see `spec.md` Non-goals); this crate carries only the interface
//! `gsseap-core`'s acceptor drives.

#![deny(unsafe_code)]

mod aaa;
mod avp;
mod transport;

pub use aaa::InMemoryAaaServer;
pub use avp::{find_eap_message, find_ms_mppe_send_key, find_state, Avp};
pub use transport::{
    AccessRequest, AccessResponse, RadiusCode, RadiusError, RadiusServerConfig, RadiusTransport,
};

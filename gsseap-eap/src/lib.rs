//! EAP packet codec and the peer/method boundary the state machine drives.
//!
//! Real EAP methods are out of scope (see `spec.md` Non-goals); this crate
//! carries the boundary trait plus an in-memory identity/challenge test
//! method sufficient to exercise context establishment end to end.

#![deny(unsafe_code)]

mod method;
mod packet;

pub use method::{EapError, EapPeer, EapStep, ServerStep, TestEapPeer, TestEapServer};
pub use packet::{EapCode, EapPacket, EapPacketError, EapType};

//! # gsseap — GSS-EAP context establishment
//!
//! `gsseap` is a modular Rust library implementing GSS-EAP-shaped context
//! establishment for EAP-over-RADIUS authentication. It consists of four
//! focused sub-crates wired together here for convenience:
//!
//! | Sub-crate       | Role                                                  |
//! |------------------|-------------------------------------------------------|
//! | `gsseap-token`   | Outer/inner token framing                             |
//! | `gsseap-crypto`  | RFC-3961 key derivation, MIC, and wrap/unwrap boundary |
//! | `gsseap-eap`     | EAP peer/method boundary and packet codec             |
//! | `gsseap-radius`  | RADIUS/RadSec transport boundary and AVP model        |
//! | `gsseap-core`    | The state machine itself: dispatcher, contexts, API   |
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gsseap::{Context, Substate, init_sec_context};
//! use gsseap::crypto::HmacSha1Suite;
//! use gsseap::eap::TestEapPeer;
//! use std::sync::Arc;
//!
//! let ctx = Context::allocate(
//!     Substate::Initiator {
//!         eap_peer: Box::new(TestEapPeer::new("alice@example.org", "secret")),
//!         eap_established: false,
//!     },
//!     Arc::new(HmacSha1Suite),
//!     gsseap::GssFlags::advertised_default(),
//! );
//!
//! let first = init_sec_context(&ctx, None)?;
//! # Ok::<(), gsseap::GssError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub use gsseap_core::*;

/// Re-export of [`gsseap_token`] — outer/inner token framing.
pub use gsseap_token as token;
/// Re-export of [`gsseap_crypto`] — the RFC-3961 suite boundary.
pub use gsseap_crypto as crypto;
/// Re-export of [`gsseap_eap`] — the EAP peer/method boundary.
pub use gsseap_eap as eap;
/// Re-export of [`gsseap_radius`] — the RADIUS transport boundary.
pub use gsseap_radius as radius;

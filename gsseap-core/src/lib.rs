//! # gsseap-core — GSS-EAP context-establishment state machine
//!
//! Implements the initiator/acceptor context-establishment exchange that
//! drives EAP authentication over RADIUS behind a GSS-API shaped interface:
//! outer/inner token framing, the table-driven handler dispatcher, RFC-3961
//! key derivation, channel-binding verification, mutual MIC exchange, and
//! context export/import.
//!
//! | Module          | Role                                                |
//! |-----------------|------------------------------------------------------|
//! | [`dispatcher`]  | Table-driven handler walk shared by both roles        |
//! | [`initiator`]   | Handler table driving `init_sec_context`               |
//! | [`acceptor`]    | Handler table driving `accept_sec_context`, over RADIUS|
//! | [`context`]     | Context lifecycle: allocate, export, import            |
//! | [`api`]         | Public entry points                                    |
//! | [`keys`]        | RFC-3961 key derivation (EMSK half-split, MS-MPPE)      |
//! | [`bindings`]    | Channel-bindings wrap/verify                            |
//! | [`sequence`]    | Per-direction sequence/replay window                    |
//! | [`conversation`]| Append-only MIC input log                               |
//! | [`name`]        | Principal names and attribute providers                 |
//! | [`credential`]  | Credential data model and reauth boundary               |
//! | [`errors`]      | Major/minor status taxonomy and `CONTEXT_ERR` framing   |
//! | [`state`]       | Context state and negotiated GSS flags, as bit-flags    |

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod acceptor;
mod api;
mod bindings;
mod context;
mod conversation;
mod credential;
mod dispatcher;
mod errors;
mod initiator;
mod keys;
mod name;
mod sequence;
mod state;

pub use api::{
    accept_sec_context, delete_name_attribute, export_name, export_sec_context, get_mic,
    get_name_attribute, init_sec_context, inquire_name, set_name_attribute, unwrap, verify_mic,
    wrap, StepResult,
};
pub use context::{Context, ContextInner, Substate};
pub use credential::{Credential, CredentialUsage, ReauthMechanism};
pub use errors::{GssError, MajorStatus, MinorStatus};
pub use name::{LocalAttributeProvider, Name, NameAttributeProvider, NameFlags, ProviderSlot};
pub use sequence::{SeqOutcome, SequenceState};
pub use state::{GssFlags, Role, State};

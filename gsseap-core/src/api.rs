//! Public entry points (spec §6): `init_sec_context`, `accept_sec_context`,
//! export/import, and the per-message primitives.

use crate::context::{Context, ContextInner};
use crate::errors::{GssError, MajorStatus, MinorStatus};
use crate::name::Name;
use crate::state::{GssFlags, Role};
use crate::{acceptor, initiator};

/// The caller-visible outcome of one `init_sec_context`/`accept_sec_context`
/// call (spec §6's return tuple, minus the context handle the caller
/// already owns).
pub struct StepResult {
    pub output_token: Option<Vec<u8>>,
    pub mech_used: Option<Vec<u8>>,
    pub ret_flags: GssFlags,
    /// The initiator's name, as seen by the acceptor. Always `None` for
    /// `init_sec_context` (spec §6 lists `src_name` only on the accept side).
    pub src_name: Option<Name>,
    pub major: MajorStatus,
}

impl StepResult {
    /// Per spec §7: "Any fatal error on a context releases it from the
    /// caller's handle." Callers drop their `Context` handle when this
    /// returns true; the entry points below cannot do it for them since
    /// they only borrow the context.
    pub fn should_release(&self) -> bool {
        self.major.is_fatal()
    }
}

fn finish(inner: &ContextInner, outcome: crate::dispatcher::StepOutcome, role: Role) -> StepResult {
    StepResult {
        output_token: outcome.output_token,
        mech_used: inner.mechanism_oid.clone(),
        ret_flags: inner.gss_flags,
        src_name: if role == Role::Acceptor { inner.initiator_name.clone() } else { None },
        major: outcome.major,
    }
}

/// `init_sec_context` (spec §6). `target_name`/`chan_bindings` are supplied
/// up front via [`Context::with_target_name`]/[`Context::with_channel_bindings`]
/// before the first call, matching how this crate's builder-style
/// `Context::allocate` already front-loads `req_flags`.
pub fn init_sec_context(ctx: &Context, input_token: Option<&[u8]>) -> Result<StepResult, GssError> {
    let mut inner = ctx.lock();
    if inner.role() != Role::Initiator {
        return Err(GssError::new(MajorStatus::Failure, MinorStatus::BadDirection));
    }
    let outcome = initiator::step(&mut inner, ctx.suite.as_ref(), input_token)?;
    Ok(finish(&inner, outcome, Role::Initiator))
}

/// `accept_sec_context` (spec §6).
pub fn accept_sec_context(ctx: &Context, input_token: Option<&[u8]>) -> Result<StepResult, GssError> {
    let mut inner = ctx.lock();
    if inner.role() != Role::Acceptor {
        return Err(GssError::new(MajorStatus::Failure, MinorStatus::BadDirection));
    }
    let outcome = acceptor::step(&mut inner, ctx.suite.as_ref(), input_token)?;
    Ok(finish(&inner, outcome, Role::Acceptor))
}

fn require_established(inner: &ContextInner) -> Result<(), GssError> {
    if !inner.state.contains(crate::state::State::ESTABLISHED) {
        return Err(GssError::new(MajorStatus::Failure, MinorStatus::ContextEstablished));
    }
    Ok(())
}

/// `export_sec_context`.
pub fn export_sec_context(ctx: &Context) -> Result<Vec<u8>, GssError> {
    ctx.export()
}

/// `get_mic`: require `ESTABLISHED`, delegate to the RFC-3961 suite.
pub fn get_mic(ctx: &Context, message: &[u8]) -> Result<Vec<u8>, GssError> {
    let inner = ctx.lock();
    require_established(&inner)?;
    let key = inner
        .key
        .as_ref()
        .ok_or_else(|| GssError::new(MajorStatus::Failure, MinorStatus::KeyUnavailable))?;
    Ok(ctx.suite.get_mic(key, message))
}

/// `verify_mic`: require `ESTABLISHED`, delegate to the RFC-3961 suite.
pub fn verify_mic(ctx: &Context, message: &[u8], mic: &[u8]) -> Result<(), GssError> {
    let inner = ctx.lock();
    require_established(&inner)?;
    let key = inner
        .key
        .as_ref()
        .ok_or_else(|| GssError::new(MajorStatus::Failure, MinorStatus::KeyUnavailable))?;
    ctx.suite
        .verify_mic(key, message, mic)
        .map_err(|_| GssError::new(MajorStatus::DefectiveToken, MinorStatus::WrongItok))
}

/// `wrap`: bump the send sequence number, prepend it (8 bytes, big-endian),
/// then confidentiality-wrap the plaintext.
pub fn wrap(ctx: &Context, plaintext: &[u8]) -> Result<Vec<u8>, GssError> {
    let mut inner = ctx.lock();
    require_established(&inner)?;
    let key = inner
        .key
        .clone()
        .ok_or_else(|| GssError::new(MajorStatus::Failure, MinorStatus::KeyUnavailable))?;
    let seq = inner.seq.next_send_seq();
    let mut out = seq.to_be_bytes().to_vec();
    out.extend(ctx.suite.wrap(&key, plaintext));
    Ok(out)
}

/// `unwrap`: read the 8-byte sequence prefix, apply the replay/sequence
/// policy (spec §4.3), then confidentiality-unwrap the remainder.
pub fn unwrap(ctx: &Context, wrapped: &[u8]) -> Result<Vec<u8>, GssError> {
    let mut inner = ctx.lock();
    require_established(&inner)?;
    if wrapped.len() < 8 {
        return Err(GssError::new(MajorStatus::DefectiveToken, MinorStatus::WrongSize));
    }
    let seq = u64::from_be_bytes(wrapped[0..8].try_into().unwrap());
    let outcome = inner.seq.check_recv(seq);
    inner.seq.enforce(outcome)?;
    let key = inner
        .key
        .clone()
        .ok_or_else(|| GssError::new(MajorStatus::Failure, MinorStatus::KeyUnavailable))?;
    ctx.suite
        .unwrap(&key, &wrapped[8..])
        .map_err(|_| GssError::new(MajorStatus::DefectiveToken, MinorStatus::BadTokHeader))
}

/// `inquire_name`: the peer name as known to this side once established
/// (the acceptor's view of the initiator; `None` on the initiator side,
/// which never learns its own name back).
pub fn inquire_name(ctx: &Context) -> Option<Name> {
    ctx.lock().initiator_name.clone()
}

/// `get_name_attribute` / `set_name_attribute` / `delete_name_attribute`:
/// thin passthroughs to the acceptor's learned initiator [`Name`] (spec §6;
/// full attribute-provider plumbing is a boundary, see [`crate::name`]).
pub fn get_name_attribute(ctx: &Context, key: &str) -> Option<Vec<u8>> {
    ctx.lock().initiator_name.as_ref().and_then(|n| n.get_name_attribute(key))
}

pub fn set_name_attribute(ctx: &Context, key: &str, value: Vec<u8>) -> Result<(), GssError> {
    let mut inner = ctx.lock();
    let name = inner
        .initiator_name
        .as_mut()
        .ok_or_else(|| GssError::new(MajorStatus::BadName, MinorStatus::NoAcceptorName))?;
    name.set_name_attribute(key, value)
}

pub fn delete_name_attribute(ctx: &Context, key: &str) -> Result<(), GssError> {
    let mut inner = ctx.lock();
    let name = inner
        .initiator_name
        .as_mut()
        .ok_or_else(|| GssError::new(MajorStatus::BadName, MinorStatus::NoAcceptorName))?;
    name.delete_name_attribute(key)
}

/// `export_name`: the acceptor's confirmed own name, mechanism-prefixed.
pub fn export_name(ctx: &Context) -> Result<Vec<u8>, GssError> {
    let inner = ctx.lock();
    let name = inner
        .acceptor_name
        .as_ref()
        .ok_or_else(|| GssError::new(MajorStatus::BadName, MinorStatus::NoAcceptorName))?;
    let oid = inner
        .mechanism_oid
        .as_deref()
        .ok_or_else(|| GssError::new(MajorStatus::BadMech, MinorStatus::KeyUnavailable))?;
    Ok(name.export_name(oid))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gsseap_crypto::HmacSha1Suite;
    use gsseap_eap::TestEapPeer;
    use gsseap_radius::InMemoryAaaServer;

    use super::*;
    use crate::context::Substate;
    use crate::state::GssFlags as Flags;

    fn initiator_ctx() -> Context {
        Context::allocate(
            Substate::Initiator {
                eap_peer: Box::new(TestEapPeer::new("alice@REALM", "secret")),
                eap_established: false,
            },
            Arc::new(HmacSha1Suite),
            Flags::advertised_default(),
        )
    }

    #[test]
    fn init_sec_context_rejects_acceptor_role_confusion() {
        let ctx = Context::allocate(
            Substate::Acceptor {
                radius: Box::new(InMemoryAaaServer::new("secret", vec![1; 16])),
                cached_radius_state: None,
                initiator_identity: None,
                radius_established: false,
            },
            Arc::new(HmacSha1Suite),
            Flags::advertised_default(),
        );
        let err = init_sec_context(&ctx, None).unwrap_err();
        assert_eq!(err.minor, MinorStatus::BadDirection);
    }

    #[test]
    fn get_mic_requires_established() {
        let ctx = initiator_ctx();
        let err = get_mic(&ctx, b"hello").unwrap_err();
        assert_eq!(err.minor, MinorStatus::ContextEstablished);
    }

    #[test]
    fn wrap_unwrap_round_trip_once_established() {
        let ctx = initiator_ctx();
        {
            let mut inner = ctx.lock();
            inner.state = crate::state::State::ESTABLISHED;
            inner.key = Some(gsseap_crypto::Rfc3961Key::new(
                gsseap_crypto::EncType::Aes128CtsHmacSha1_96,
                vec![0x42; 16],
            ));
        }
        let wrapped = wrap(&ctx, b"payload").unwrap();
        let unwrapped = unwrap(&ctx, &wrapped).unwrap();
        assert_eq!(unwrapped, b"payload");
    }
}

//! Initiator state machine (C6): the handler table and callbacks driving
//! `init_sec_context` (spec §4.6).

use gsseap_crypto::Rfc3961Suite;
use gsseap_eap::{EapPacket, EapStep};
use gsseap_token::{InnerTokenKind, TokenType, MECHANISM_OID};

use crate::bindings;
use crate::context::{ContextInner, Substate};
use crate::dispatcher::{step as dispatch_step, HandlerEntry, StepOutcome};
use crate::errors::{decode_context_err, GssError, MajorStatus, MinorStatus, SmError};
use crate::keys;
use crate::state::State;

fn emit_acceptor_name_req(
    ctx: &mut ContextInner,
    _suite: &dyn Rfc3961Suite,
    _input: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SmError> {
    Ok(ctx.target_name.clone())
}

fn emit_initiator_exts(
    ctx: &mut ContextInner,
    _suite: &dyn Rfc3961Suite,
    _input: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SmError> {
    ctx.state = State::AUTHENTICATE;
    Ok(Some(Vec::new()))
}

fn handle_context_err(
    _ctx: &mut ContextInner,
    _suite: &dyn Rfc3961Suite,
    input: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SmError> {
    let Some(body) = input else { return Ok(None) };
    let (major, minor) = decode_context_err(body)?;
    Err(SmError::new(major, minor))
}

fn eap_exchange(
    ctx: &mut ContextInner,
    suite: &dyn Rfc3961Suite,
    input: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SmError> {
    let request = match input {
        Some(bytes) => Some(
            EapPacket::decode(bytes)
                .map_err(|_| SmError::new(MajorStatus::DefectiveToken, MinorStatus::BadTokHeader))?,
        ),
        None => None,
    };

    let outcome = {
        let Substate::Initiator { eap_peer, .. } = &mut ctx.substate else {
            unreachable!("initiator table only runs against Substate::Initiator");
        };
        eap_peer
            .step(request.as_ref())
            .map_err(|_| SmError::new(MajorStatus::DefectiveCredential, MinorStatus::PeerAuthFailure))?
    };

    match outcome {
        EapStep::Send(pkt) => Ok(Some(pkt.encode())),
        EapStep::Done { emsk } => {
            let key = keys::derive_initiator_key(Some(&emsk), suite)?;
            ctx.key = Some(key);
            ctx.mechanism_oid = Some(MECHANISM_OID.to_vec());
            if let Substate::Initiator { eap_established, .. } = &mut ctx.substate {
                *eap_established = true;
            }
            ctx.state = State::INITIATOR_EXTS;
            Ok(None)
        }
        EapStep::Failed { .. } => {
            Err(SmError::new(MajorStatus::DefectiveCredential, MinorStatus::PeerAuthFailure))
        }
    }
}

fn emit_channel_bindings(
    ctx: &mut ContextInner,
    suite: &dyn Rfc3961Suite,
    _input: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SmError> {
    let key = ctx
        .key
        .as_ref()
        .ok_or_else(|| SmError::new(MajorStatus::Failure, MinorStatus::KeyUnavailable))?;
    let wrapped = bindings::wrap_bindings(suite, key, ctx.local_channel_bindings.as_deref());
    Ok(Some(wrapped))
}

fn emit_initiator_mic(
    ctx: &mut ContextInner,
    suite: &dyn Rfc3961Suite,
    _input: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SmError> {
    let key = ctx
        .key
        .as_ref()
        .ok_or_else(|| SmError::new(MajorStatus::Failure, MinorStatus::KeyUnavailable))?;
    let mic = suite.get_mic(key, ctx.conversation.mic_input());
    ctx.state = State::ACCEPTOR_EXTS;
    Ok(Some(mic))
}

fn reauth_creds_noop(
    _ctx: &mut ContextInner,
    _suite: &dyn Rfc3961Suite,
    _input: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SmError> {
    // Fast reauthentication credentials are a boundary-only feature (spec
    // §9's `ReauthMechanism` trait object); accept and ignore them.
    Ok(None)
}

fn verify_acceptor_mic(
    ctx: &mut ContextInner,
    suite: &dyn Rfc3961Suite,
    input: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SmError> {
    let mic = input.ok_or_else(|| SmError::new(MajorStatus::DefectiveToken, MinorStatus::MissingRequiredItok))?;
    let key = ctx
        .key
        .as_ref()
        .ok_or_else(|| SmError::new(MajorStatus::Failure, MinorStatus::KeyUnavailable))?;
    suite
        .verify_mic(key, ctx.conversation.mic_input(), mic)
        .map_err(|_| SmError::new(MajorStatus::DefectiveToken, MinorStatus::WrongItok))?;
    ctx.state = State::ESTABLISHED;
    Ok(None)
}

const NON_ESTABLISHED: State = State::INITIAL
    .union(State::AUTHENTICATE)
    .union(State::INITIATOR_EXTS)
    .union(State::ACCEPTOR_EXTS);

static TABLE: &[HandlerEntry] = &[
    HandlerEntry {
        valid_states: State::INITIAL,
        input_kind: None,
        output_kind: Some(InnerTokenKind::AcceptorNameReq),
        required: false,
        output_critical: false,
        handler: emit_acceptor_name_req,
    },
    HandlerEntry {
        valid_states: State::INITIAL,
        input_kind: None,
        output_kind: Some(InnerTokenKind::InitiatorExts),
        required: false,
        output_critical: false,
        handler: emit_initiator_exts,
    },
    HandlerEntry {
        valid_states: NON_ESTABLISHED,
        input_kind: Some(InnerTokenKind::ContextErr),
        output_kind: None,
        required: false,
        output_critical: false,
        handler: handle_context_err,
    },
    HandlerEntry {
        valid_states: State::AUTHENTICATE,
        input_kind: Some(InnerTokenKind::EapReq),
        output_kind: Some(InnerTokenKind::EapResp),
        required: false,
        output_critical: false,
        handler: eap_exchange,
    },
    HandlerEntry {
        valid_states: State::INITIATOR_EXTS,
        input_kind: None,
        output_kind: Some(InnerTokenKind::GssChannelBindings),
        required: false,
        output_critical: false,
        handler: emit_channel_bindings,
    },
    HandlerEntry {
        valid_states: State::INITIATOR_EXTS,
        input_kind: None,
        output_kind: Some(InnerTokenKind::InitiatorMic),
        required: false,
        output_critical: false,
        handler: emit_initiator_mic,
    },
    HandlerEntry {
        valid_states: State::ACCEPTOR_EXTS,
        input_kind: Some(InnerTokenKind::ReauthCreds),
        output_kind: None,
        required: false,
        output_critical: false,
        handler: reauth_creds_noop,
    },
    HandlerEntry {
        valid_states: State::ACCEPTOR_EXTS,
        input_kind: Some(InnerTokenKind::AcceptorMic),
        output_kind: None,
        required: true,
        output_critical: false,
        handler: verify_acceptor_mic,
    },
];

/// Drive one `init_sec_context` call.
pub fn step(
    ctx: &mut ContextInner,
    suite: &dyn Rfc3961Suite,
    input_token: Option<&[u8]>,
) -> Result<StepOutcome, GssError> {
    dispatch_step(TABLE, ctx, suite, MECHANISM_OID, TokenType::InitiatorContext as u16, input_token)
}

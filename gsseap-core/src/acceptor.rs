//! Acceptor state machine (C7): the handler table and callbacks driving
//! `accept_sec_context` (spec §4.7), relaying the exchange over RADIUS.

use gsseap_crypto::Rfc3961Suite;
use gsseap_eap::{EapPacket, EapType};
use gsseap_radius::{find_eap_message, find_ms_mppe_send_key, find_state, AccessRequest, Avp, RadiusCode};
use gsseap_token::{InnerTokenKind, TokenType, MECHANISM_OID};

use crate::bindings;
use crate::context::{ContextInner, Substate};
use crate::dispatcher::{step as dispatch_step, HandlerEntry, StepOutcome};
use crate::errors::{GssError, MajorStatus, MinorStatus, SmError};
use crate::keys;
use crate::name::Name;
use crate::state::{GssFlags, State};

const ACCEPTOR_SERVICE: &[u8] = b"gsseap";

fn confirm_acceptor_name(
    ctx: &mut ContextInner,
    _suite: &dyn Rfc3961Suite,
    input: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SmError> {
    let body = input.ok_or_else(|| SmError::new(MajorStatus::DefectiveToken, MinorStatus::MissingRequiredItok))?;
    ctx.acceptor_name = Some(Name::from_nai(&String::from_utf8_lossy(body)));
    Ok(Some(body.to_vec()))
}

/// Turn a RADIUS response into the next inner token to emit, deriving the
/// acceptor key and advancing state on Access-Accept.
fn process_radius_response(
    ctx: &mut ContextInner,
    suite: &dyn Rfc3961Suite,
    response: gsseap_radius::AccessResponse,
) -> Result<Option<Vec<u8>>, SmError> {
    match response.code {
        RadiusCode::AccessChallenge => {
            let eap_bytes = find_eap_message(&response.avps)
                .ok_or_else(|| SmError::new(MajorStatus::DefectiveToken, MinorStatus::MissingEapRequest))?
                .to_vec();
            let state = find_state(&response.avps).map(<[u8]>::to_vec);
            let Substate::Acceptor { cached_radius_state, .. } = &mut ctx.substate else {
                unreachable!("acceptor table only runs against Substate::Acceptor");
            };
            *cached_radius_state = state;
            Ok(Some(eap_bytes))
        }
        RadiusCode::AccessAccept => {
            let eap_bytes = find_eap_message(&response.avps).map(<[u8]>::to_vec);
            let mppe = find_ms_mppe_send_key(&response.avps);
            let key = keys::derive_acceptor_key(mppe, suite)?;
            ctx.key = Some(key);
            ctx.mechanism_oid = Some(MECHANISM_OID.to_vec());
            let Substate::Acceptor { cached_radius_state, radius_established, .. } = &mut ctx.substate
            else {
                unreachable!("acceptor table only runs against Substate::Acceptor");
            };
            *cached_radius_state = None;
            *radius_established = true;
            ctx.state = State::INITIATOR_EXTS;
            Ok(eap_bytes)
        }
        RadiusCode::AccessReject => {
            Err(SmError::new(MajorStatus::DefectiveCredential, MinorStatus::RadiusAuthFailure))
        }
        RadiusCode::AccessRequest => {
            Err(SmError::new(MajorStatus::Failure, MinorStatus::UnknownRadiusCode))
        }
    }
}

fn start_radius(
    ctx: &mut ContextInner,
    suite: &dyn Rfc3961Suite,
    _input: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SmError> {
    let response = {
        let Substate::Acceptor { radius, .. } = &mut ctx.substate else {
            unreachable!("acceptor table only runs against Substate::Acceptor");
        };
        radius.send_receive(AccessRequest::new(vec![Avp::AcceptorService(ACCEPTOR_SERVICE.to_vec())]))?
    };
    ctx.state = State::AUTHENTICATE;
    process_radius_response(ctx, suite, response)
}

fn eap_exchange(
    ctx: &mut ContextInner,
    suite: &dyn Rfc3961Suite,
    input: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SmError> {
    let body = input.ok_or_else(|| SmError::new(MajorStatus::DefectiveToken, MinorStatus::MissingRequiredItok))?;
    let pkt = EapPacket::decode(body)
        .map_err(|_| SmError::new(MajorStatus::DefectiveToken, MinorStatus::BadTokHeader))?;

    let mut avps = vec![Avp::EapMessage(body.to_vec()), Avp::AcceptorService(ACCEPTOR_SERVICE.to_vec())];

    let cached_state = {
        let Substate::Acceptor { cached_radius_state, .. } = &mut ctx.substate else {
            unreachable!("acceptor table only runs against Substate::Acceptor");
        };
        cached_radius_state.take()
    };
    if let Some(state) = cached_state {
        avps.push(Avp::State(state));
    }

    let just_learned = pkt.typ == Some(EapType::Identity) && {
        let Substate::Acceptor { initiator_identity, .. } = &ctx.substate else {
            unreachable!("acceptor table only runs against Substate::Acceptor");
        };
        initiator_identity.is_none()
    };
    if just_learned {
        let Substate::Acceptor { initiator_identity, .. } = &mut ctx.substate else {
            unreachable!("acceptor table only runs against Substate::Acceptor");
        };
        *initiator_identity = Some(pkt.data.clone());
        ctx.initiator_name = Some(Name::from_nai(&String::from_utf8_lossy(&pkt.data)));
        avps.push(Avp::UserName(pkt.data.clone()));
    }

    let response = {
        let Substate::Acceptor { radius, .. } = &mut ctx.substate else {
            unreachable!("acceptor table only runs against Substate::Acceptor");
        };
        radius.send_receive(AccessRequest::new(avps))?
    };
    process_radius_response(ctx, suite, response)
}

fn record_gss_flags(
    ctx: &mut ContextInner,
    _suite: &dyn Rfc3961Suite,
    input: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SmError> {
    let body = input.ok_or_else(|| SmError::new(MajorStatus::DefectiveToken, MinorStatus::MissingRequiredItok))?;
    if let Some(&raw) = body.first() {
        if let Some(flags) = GssFlags::from_bits(raw as u32) {
            ctx.gss_flags = flags;
        }
    }
    Ok(None)
}

fn verify_channel_bindings(
    ctx: &mut ContextInner,
    suite: &dyn Rfc3961Suite,
    input: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SmError> {
    let body = input.ok_or_else(|| SmError::new(MajorStatus::DefectiveToken, MinorStatus::MissingRequiredItok))?;
    let key = ctx.key.as_ref().ok_or_else(|| SmError::new(MajorStatus::Failure, MinorStatus::KeyUnavailable))?;
    bindings::verify_bindings(suite, key, body, ctx.local_channel_bindings.as_deref()).map_err(SmError::from)?;
    Ok(None)
}

fn verify_initiator_mic(
    ctx: &mut ContextInner,
    suite: &dyn Rfc3961Suite,
    input: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SmError> {
    let mic = input.ok_or_else(|| SmError::new(MajorStatus::DefectiveToken, MinorStatus::MissingRequiredItok))?;
    let key = ctx.key.as_ref().ok_or_else(|| SmError::new(MajorStatus::Failure, MinorStatus::KeyUnavailable))?;
    suite
        .verify_mic(key, ctx.conversation.mic_input(), mic)
        .map_err(|_| SmError::new(MajorStatus::DefectiveToken, MinorStatus::WrongItok))?;
    ctx.state = State::ACCEPTOR_EXTS;
    Ok(None)
}

fn emit_acceptor_mic(
    ctx: &mut ContextInner,
    suite: &dyn Rfc3961Suite,
    _input: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SmError> {
    let key = ctx.key.as_ref().ok_or_else(|| SmError::new(MajorStatus::Failure, MinorStatus::KeyUnavailable))?;
    let mic = suite.get_mic(key, ctx.conversation.mic_input());
    ctx.state = State::ESTABLISHED;
    Ok(Some(mic))
}

static TABLE: &[HandlerEntry] = &[
    HandlerEntry {
        valid_states: State::INITIAL,
        input_kind: Some(InnerTokenKind::AcceptorNameReq),
        output_kind: Some(InnerTokenKind::AcceptorNameResp),
        required: false,
        output_critical: false,
        handler: confirm_acceptor_name,
    },
    HandlerEntry {
        valid_states: State::INITIAL,
        input_kind: None,
        output_kind: Some(InnerTokenKind::EapReq),
        required: false,
        output_critical: false,
        handler: start_radius,
    },
    HandlerEntry {
        valid_states: State::AUTHENTICATE,
        input_kind: Some(InnerTokenKind::EapResp),
        output_kind: Some(InnerTokenKind::EapReq),
        required: false,
        output_critical: false,
        handler: eap_exchange,
    },
    HandlerEntry {
        valid_states: State::INITIATOR_EXTS,
        input_kind: Some(InnerTokenKind::GssFlags),
        output_kind: None,
        required: false,
        output_critical: false,
        handler: record_gss_flags,
    },
    HandlerEntry {
        valid_states: State::INITIATOR_EXTS,
        input_kind: Some(InnerTokenKind::GssChannelBindings),
        output_kind: None,
        required: true,
        output_critical: false,
        handler: verify_channel_bindings,
    },
    HandlerEntry {
        valid_states: State::INITIATOR_EXTS,
        input_kind: Some(InnerTokenKind::InitiatorMic),
        output_kind: None,
        required: true,
        output_critical: false,
        handler: verify_initiator_mic,
    },
    HandlerEntry {
        valid_states: State::ACCEPTOR_EXTS,
        input_kind: None,
        output_kind: Some(InnerTokenKind::AcceptorMic),
        required: false,
        output_critical: false,
        handler: emit_acceptor_mic,
    },
];

/// Drive one `accept_sec_context` call.
pub fn step(
    ctx: &mut ContextInner,
    suite: &dyn Rfc3961Suite,
    input_token: Option<&[u8]>,
) -> Result<StepOutcome, GssError> {
    dispatch_step(TABLE, ctx, suite, MECHANISM_OID, TokenType::AcceptorContext as u16, input_token)
}

//! End-to-end scenarios covering the happy path and the main failure modes
//! of context establishment, driven entirely through the public API with
//! the in-memory EAP/RADIUS test doubles standing in for the wire.

use std::sync::Arc;

use gsseap_core::{
    accept_sec_context, export_sec_context, get_mic, init_sec_context, verify_mic, Context,
    GssFlags, MajorStatus, MinorStatus, State, Substate,
};
use gsseap_crypto::HmacSha1Suite;
use gsseap_eap::TestEapPeer;
use gsseap_radius::InMemoryAaaServer;
use gsseap_token::{encode_inner_stream, encode_outer, InnerToken, TokenType, MECHANISM_OID};

const IDENTITY: &str = "alice@example.org";
const SECRET: &str = "correct-horse-battery-staple";
const CHALLENGE: [u8; 16] = [0x09; 16];

fn fresh_initiator(channel_bindings: Option<&[u8]>) -> Context {
    let ctx = Context::allocate(
        Substate::Initiator {
            eap_peer: Box::new(TestEapPeer::new(IDENTITY, SECRET)),
            eap_established: false,
        },
        Arc::new(HmacSha1Suite),
        GssFlags::advertised_default(),
    );
    match channel_bindings {
        Some(bytes) => ctx.with_channel_bindings(bytes.to_vec()),
        None => ctx,
    }
}

fn fresh_acceptor(secret: &str, channel_bindings: Option<&[u8]>) -> Context {
    let ctx = Context::allocate(
        Substate::Acceptor {
            radius: Box::new(InMemoryAaaServer::new(secret, CHALLENGE.to_vec())),
            cached_radius_state: None,
            initiator_identity: None,
            radius_established: false,
        },
        Arc::new(HmacSha1Suite),
        GssFlags::advertised_default(),
    );
    match channel_bindings {
        Some(bytes) => ctx.with_channel_bindings(bytes.to_vec()),
        None => ctx,
    }
}

/// Drive initiator/acceptor to completion or to the first hard failure.
/// Returns the last result from each side.
fn run_to_completion(
    initiator: &Context,
    acceptor: &Context,
) -> (Result<MajorStatus, gsseap_core::GssError>, Result<MajorStatus, gsseap_core::GssError>) {
    let mut from_initiator: Option<Vec<u8>> = None;
    let mut last_acc = Ok(MajorStatus::ContinueNeeded);
    let mut last_init = Ok(MajorStatus::ContinueNeeded);

    for _ in 0..20 {
        let acc = match accept_sec_context(acceptor, from_initiator.as_deref()) {
            Ok(r) => r,
            Err(e) => {
                last_acc = Err(e);
                break;
            }
        };
        last_acc = Ok(acc.major);

        let init = match init_sec_context(initiator, acc.output_token.as_deref()) {
            Ok(r) => r,
            Err(e) => {
                last_init = Err(e);
                break;
            }
        };
        last_init = Ok(init.major);
        from_initiator = init.output_token;

        if acc.major == MajorStatus::Complete && init.major == MajorStatus::Complete {
            break;
        }
    }

    (last_init, last_acc)
}

#[test]
fn s1_happy_path_establishes_and_mics_verify() {
    let initiator = fresh_initiator(None);
    let acceptor = fresh_acceptor(SECRET, None);

    let (init_result, acc_result) = run_to_completion(&initiator, &acceptor);
    assert_eq!(init_result, Ok(MajorStatus::Complete));
    assert_eq!(acc_result, Ok(MajorStatus::Complete));

    let message = b"application data protected after establishment";
    let mic = get_mic(&initiator, message).unwrap();
    verify_mic(&acceptor, message, &mic).unwrap();
}

#[test]
fn s2_mismatched_channel_bindings_fail_at_acceptor() {
    let initiator = fresh_initiator(Some(b"tls-unique:aaa"));
    let acceptor = fresh_acceptor(SECRET, Some(b"tls-unique:bbb"));

    let (init_result, _acc_result) = run_to_completion(&initiator, &acceptor);
    let err = init_result.unwrap_err();
    assert_eq!(err.major, MajorStatus::BadBindings);
    assert_eq!(err.minor, MinorStatus::BindingsMismatch);
}

#[test]
fn s3_truncated_outer_token_is_rejected_before_dispatch() {
    let acceptor = fresh_acceptor(SECRET, None);
    let wire = encode_outer(MECHANISM_OID, TokenType::InitiatorContext as u16, b"not empty");
    let truncated = &wire[..wire.len() - 3];

    let err = accept_sec_context(&acceptor, Some(truncated)).unwrap_err();
    assert_eq!(err.major, MajorStatus::DefectiveToken);
}

#[test]
fn s4_unknown_critical_inner_token_is_rejected() {
    let acceptor = fresh_acceptor(SECRET, None);
    let unknown = InnerToken { critical: true, kind_raw: 0x7FFF, body: vec![] };
    let payload = encode_inner_stream(&[unknown]);
    let wire = encode_outer(MECHANISM_OID, TokenType::InitiatorContext as u16, &payload);

    let result = accept_sec_context(&acceptor, Some(&wire)).unwrap();
    assert_eq!(result.major, MajorStatus::Unavailable);
}

#[test]
fn s5_radius_reject_surfaces_as_defective_credential() {
    let initiator = fresh_initiator(None);
    // Acceptor's RADIUS server expects a different shared secret than the
    // initiator's EAP peer will answer with.
    let acceptor = fresh_acceptor("a-completely-different-secret", None);

    let (init_result, _acc_result) = run_to_completion(&initiator, &acceptor);
    let err = init_result.unwrap_err();
    assert_eq!(err.major, MajorStatus::DefectiveCredential);
    assert_eq!(err.minor, MinorStatus::RadiusAuthFailure);
}

#[test]
fn s6_export_import_mid_exchange_acceptor_resumes_to_established() {
    let initiator = fresh_initiator(None);
    let acceptor = fresh_acceptor(SECRET, None);

    let mut from_initiator: Option<Vec<u8>> = None;
    loop {
        let acc = accept_sec_context(&acceptor, from_initiator.as_deref()).unwrap();
        let init = init_sec_context(&initiator, acc.output_token.as_deref()).unwrap();
        from_initiator = init.output_token;
        if acceptor.lock().state == State::INITIATOR_EXTS {
            break;
        }
    }

    let exported = export_sec_context(&acceptor).unwrap();
    let resumed = Context::import(
        &exported,
        Arc::new(HmacSha1Suite),
        || panic!("a resumed acceptor never drives an EAP peer"),
        || Box::new(InMemoryAaaServer::new(SECRET, CHALLENGE.to_vec())),
    )
    .unwrap();
    assert_eq!(resumed.lock().state, State::INITIATOR_EXTS);

    loop {
        let acc = accept_sec_context(&resumed, from_initiator.as_deref()).unwrap();
        let init = init_sec_context(&initiator, acc.output_token.as_deref()).unwrap();
        from_initiator = init.output_token;
        if acc.major == MajorStatus::Complete && init.major == MajorStatus::Complete {
            break;
        }
    }

    let message = b"resumed acceptor still protects traffic";
    let mic = get_mic(&initiator, message).unwrap();
    verify_mic(&resumed, message, &mic).unwrap();
}

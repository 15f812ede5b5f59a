//! SM dispatcher (C8): the table-driven engine that runs both the
//! initiator's and the acceptor's handlers (spec §4.8, §9's "table-driven
//! polymorphism" re-architecture note — no function pointers beyond plain
//! `fn` items in a static table).

use gsseap_crypto::Rfc3961Suite;
use gsseap_token::{
    decode_inner_stream, decode_outer, encode_inner_stream, encode_outer, InnerToken,
    InnerTokenKind,
};

use crate::context::ContextInner;
use crate::errors::{encode_context_err, whitelist, GssError, MajorStatus, MinorStatus, SmError};
use crate::state::{Role, State};

/// A single handler row. `input_kind = None` means "run on state entry
/// regardless of input"; `output_kind = None` means the handler never
/// produces an inner token.
pub type HandlerFn =
    fn(&mut ContextInner, &dyn Rfc3961Suite, Option<&[u8]>) -> Result<Option<Vec<u8>>, SmError>;

pub struct HandlerEntry {
    pub valid_states: State,
    pub input_kind: Option<InnerTokenKind>,
    pub output_kind: Option<InnerTokenKind>,
    pub required: bool,
    pub output_critical: bool,
    pub handler: HandlerFn,
}

/// Run `table` against `input_tokens` until the walk stabilizes (no
/// further rollback), returning the inner tokens to emit.
///
/// Implements spec §4.8 steps 3–4: ordered walk, required/critical
/// enforcement, and restart-on-rollback.
pub fn run_handlers(
    table: &'static [HandlerEntry],
    ctx: &mut ContextInner,
    suite: &dyn Rfc3961Suite,
    input_tokens: &[InnerToken],
) -> Result<Vec<InnerToken>, SmError> {
    let mut outputs;
    let mut verified_kinds;
    const MIC_SCOPE: State = State::INITIATOR_EXTS.union(State::ACCEPTOR_EXTS);

    loop {
        outputs = Vec::new();
        verified_kinds = Vec::new();
        let mut restarted = false;
        // The state this call started in. A required input whose entry's
        // state was only reached via a forward transition *within this
        // same call* hasn't had a round trip yet for the peer to have
        // sent it — that's not a missing-input error, just "not yet".
        let state_at_entry = ctx.state;
        let log_len_at_entry = ctx.conversation.len();

        for entry in table {
            if !entry.valid_states.intersects(ctx.state) {
                continue;
            }
            let in_mic_scope = entry.valid_states.intersects(MIC_SCOPE);

            let input_bytes: Option<&[u8]> = match entry.input_kind {
                None => None,
                Some(kind) => {
                    match input_tokens.iter().find(|t| t.kind() == Some(kind)) {
                        Some(tok) => {
                            verified_kinds.push(kind);
                            if in_mic_scope
                                && !matches!(
                                    kind,
                                    InnerTokenKind::InitiatorMic | InnerTokenKind::AcceptorMic
                                )
                            {
                                ctx.conversation.record_bytes(&[tok.body.as_slice()]);
                            }
                            Some(tok.body.as_slice())
                        }
                        None => {
                            if entry.required && entry.valid_states.intersects(state_at_entry) {
                                return Err(SmError::new(
                                    MajorStatus::DefectiveToken,
                                    MinorStatus::MissingRequiredItok,
                                ));
                            }
                            continue;
                        }
                    }
                }
            };

            let rank_before = ctx.state.rank();
            let produced = (entry.handler)(ctx, suite, input_bytes)?;
            if let Some(bytes) = produced {
                let output_kind = entry
                    .output_kind
                    .expect("handler produced output but its table entry declares no output kind");
                if in_mic_scope
                    && !matches!(
                        output_kind,
                        InnerTokenKind::InitiatorMic | InnerTokenKind::AcceptorMic
                    )
                {
                    ctx.conversation.record_bytes(&[&bytes]);
                }
                outputs.push(InnerToken::new(output_kind, entry.output_critical, bytes));
            }

            if ctx.state.rank() < rank_before {
                restarted = true;
                ctx.conversation.truncate(log_len_at_entry);
                break;
            }
        }

        if !restarted {
            break;
        }
    }

    for tok in input_tokens {
        if !tok.critical {
            continue;
        }
        let known_and_verified = match tok.kind() {
            Some(kind) => verified_kinds.contains(&kind),
            None => false,
        };
        if !known_and_verified {
            return Err(SmError::new(MajorStatus::Unavailable, MinorStatus::CritItokUnavailable));
        }
    }

    Ok(outputs)
}

/// The outcome of one [`step`] call: a caller-visible major status plus an
/// optional outer token to deliver to the peer.
pub struct StepOutcome {
    pub major: MajorStatus,
    pub output_token: Option<Vec<u8>>,
}

/// Runs both the initiator's and the acceptor's per-call protocol exactly
/// as described in spec §4.8 steps 1–2 and 5–6, with step 3–4 delegated to
/// [`run_handlers`]. Callers (`initiator::step`, `acceptor::step`) only
/// supply the role-specific handler table and outer-token type.
pub fn step(
    table: &'static [HandlerEntry],
    ctx: &mut ContextInner,
    suite: &dyn Rfc3961Suite,
    mechanism_oid: &[u8],
    outbound_token_type: u16,
    input_token: Option<&[u8]>,
) -> Result<StepOutcome, GssError> {
    let role = ctx.role();

    let input_tokens: Vec<InnerToken> = match input_token {
        Some(bytes) => {
            let outer = decode_outer(bytes, mechanism_oid)?;
            decode_inner_stream(&outer.payload)?
        }
        None => Vec::new(),
    };

    let (major, outputs) = match run_handlers(table, ctx, suite, &input_tokens) {
        Ok(outputs) => {
            let major = if ctx.state.contains(State::ESTABLISHED) {
                MajorStatus::Complete
            } else {
                MajorStatus::ContinueNeeded
            };
            (major, outputs)
        }
        Err(err) if role == Role::Acceptor => {
            log::warn!("acceptor handler failed: {err}");
            let minor = whitelist(err.0.minor);
            let body = encode_context_err(err.0.major, minor);
            (err.0.major, vec![InnerToken::new(InnerTokenKind::ContextErr, true, body)])
        }
        Err(err) => return Err(err.0),
    };

    let should_emit = !outputs.is_empty() || role == Role::Acceptor || major != MajorStatus::Complete;
    let output_token = if should_emit {
        let payload = encode_inner_stream(&outputs);
        let outer = encode_outer(mechanism_oid, outbound_token_type, &payload);
        Some(outer)
    } else {
        None
    };

    Ok(StepOutcome { major, output_token })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Substate;
    use crate::conversation::Conversation;
    use crate::sequence::SequenceState;
    use crate::state::GssFlags;
    use gsseap_crypto::HmacSha1Suite;
    use gsseap_eap::TestEapPeer;

    fn fresh_inner(state: State) -> ContextInner {
        ContextInner {
            state,
            req_flags: GssFlags::advertised_default(),
            gss_flags: GssFlags::advertised_default(),
            mechanism_oid: None,
            key: None,
            seq: SequenceState::new(0, true, true),
            conversation: Conversation::new(),
            expiry: None,
            initiator_name: None,
            acceptor_name: None,
            target_name: None,
            credential: None,
            local_channel_bindings: None,
            substate: Substate::Initiator {
                eap_peer: Box::new(TestEapPeer::new("alice@REALM", "secret")),
                eap_established: false,
            },
        }
    }

    fn noop_handler(
        _ctx: &mut ContextInner,
        _suite: &dyn Rfc3961Suite,
        _input: Option<&[u8]>,
    ) -> Result<Option<Vec<u8>>, SmError> {
        Ok(None)
    }

    fn echo_handler(
        _ctx: &mut ContextInner,
        _suite: &dyn Rfc3961Suite,
        input: Option<&[u8]>,
    ) -> Result<Option<Vec<u8>>, SmError> {
        Ok(input.map(|b| b.to_vec()))
    }

    fn rollback_handler(
        ctx: &mut ContextInner,
        _suite: &dyn Rfc3961Suite,
        _input: Option<&[u8]>,
    ) -> Result<Option<Vec<u8>>, SmError> {
        ctx.state = State::INITIAL;
        Ok(None)
    }

    static ECHO_TABLE: &[HandlerEntry] = &[HandlerEntry {
        valid_states: State::INITIATOR_EXTS,
        input_kind: Some(InnerTokenKind::GssFlags),
        output_kind: Some(InnerTokenKind::GssFlags),
        required: true,
        output_critical: false,
        handler: echo_handler,
    }];

    static REQUIRED_MISSING_TABLE: &[HandlerEntry] = &[HandlerEntry {
        valid_states: State::INITIATOR_EXTS,
        input_kind: Some(InnerTokenKind::InitiatorMic),
        output_kind: None,
        required: true,
        output_critical: false,
        handler: noop_handler,
    }];

    static OPTIONAL_ABSENT_TABLE: &[HandlerEntry] = &[HandlerEntry {
        valid_states: State::INITIATOR_EXTS,
        input_kind: Some(InnerTokenKind::VendorInfo),
        output_kind: Some(InnerTokenKind::VendorInfo),
        required: false,
        output_critical: false,
        handler: echo_handler,
    }];

    static ROLLBACK_TABLE: &[HandlerEntry] = &[
        HandlerEntry {
            valid_states: State::ACCEPTOR_EXTS,
            input_kind: None,
            output_kind: None,
            required: false,
            output_critical: false,
            handler: rollback_handler,
        },
        HandlerEntry {
            valid_states: State::INITIAL,
            input_kind: None,
            output_kind: Some(InnerTokenKind::AcceptorNameReq),
            required: false,
            output_critical: false,
            handler: |_ctx, _suite, _input| Ok(Some(b"restarted".to_vec())),
        },
    ];

    #[test]
    fn required_and_present_is_echoed() {
        let mut ctx = fresh_inner(State::INITIATOR_EXTS);
        let suite = HmacSha1Suite;
        let input = vec![InnerToken::new(InnerTokenKind::GssFlags, false, vec![0x1f])];
        let out = run_handlers(ECHO_TABLE, &mut ctx, &suite, &input).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].body, vec![0x1f]);
    }

    #[test]
    fn required_and_absent_is_an_error() {
        let mut ctx = fresh_inner(State::INITIATOR_EXTS);
        let suite = HmacSha1Suite;
        let err = run_handlers(REQUIRED_MISSING_TABLE, &mut ctx, &suite, &[]).unwrap_err();
        assert_eq!(err.0.minor, MinorStatus::MissingRequiredItok);
    }

    #[test]
    fn optional_and_absent_is_skipped_without_error() {
        let mut ctx = fresh_inner(State::INITIATOR_EXTS);
        let suite = HmacSha1Suite;
        let out = run_handlers(OPTIONAL_ABSENT_TABLE, &mut ctx, &suite, &[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_critical_token_is_rejected() {
        let mut ctx = fresh_inner(State::INITIATOR_EXTS);
        let suite = HmacSha1Suite;
        let input = vec![InnerToken { critical: true, kind_raw: 0x7FFF, body: vec![] }];
        let err = run_handlers(ECHO_TABLE, &mut ctx, &suite, &input).unwrap_err();
        assert_eq!(err.0.minor, MinorStatus::CritItokUnavailable);
    }

    #[test]
    fn rollback_restarts_the_walk() {
        let mut ctx = fresh_inner(State::ACCEPTOR_EXTS);
        let suite = HmacSha1Suite;
        let out = run_handlers(ROLLBACK_TABLE, &mut ctx, &suite, &[]).unwrap();
        assert_eq!(ctx.state, State::INITIAL);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].body, b"restarted".to_vec());
    }
}

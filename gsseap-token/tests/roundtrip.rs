use gsseap_token::{
    decode_inner_stream, decode_outer, encode_inner_stream, encode_outer, InnerToken,
    InnerTokenKind, TokenType, MECHANISM_OID,
};

#[test]
fn outer_roundtrip_is_identity() {
    let inner = vec![
        InnerToken::new(InnerTokenKind::AcceptorNameReq, false, b"host@svc.example".to_vec()),
        InnerToken::new(InnerTokenKind::InitiatorExts, false, vec![]),
    ];
    let payload = encode_inner_stream(&inner);
    let wire = encode_outer(MECHANISM_OID, TokenType::InitiatorContext as u16, &payload);

    let decoded = decode_outer(&wire, MECHANISM_OID).unwrap();
    assert_eq!(decoded.token_type, TokenType::InitiatorContext as u16);
    assert_eq!(decoded.payload, payload);
}

#[test]
fn inner_stream_roundtrip_preserves_order() {
    let inner = vec![
        InnerToken::new(InnerTokenKind::GssFlags, false, vec![0x1f]),
        InnerToken::new(InnerTokenKind::GssChannelBindings, false, vec![0; 16]),
        InnerToken::new(InnerTokenKind::InitiatorMic, true, vec![7; 20]),
    ];
    let wire = encode_inner_stream(&inner);
    let decoded = decode_inner_stream(&wire).unwrap();
    assert_eq!(decoded, inner);
}

#[test]
fn truncated_der_length_is_rejected() {
    // S3 from the spec: outer token claims 200 bytes of body but only
    // supplies 120.
    let short_payload = vec![0xAA; 120];
    let mut wire = encode_outer(MECHANISM_OID, TokenType::AcceptorContext as u16, &short_payload);
    // Patch the single-byte DER length (at offset 1) to claim more bytes
    // than are actually present.
    let body_len = wire.len() - 2 - MECHANISM_OID.len() - 2 - 2;
    assert!(body_len < 0x80, "test assumes single-byte DER length");
    wire[1] = (body_len + 80) as u8;
    assert!(decode_outer(&wire, MECHANISM_OID).is_err());
}

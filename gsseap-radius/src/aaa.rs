//! An in-memory AAA server double: drives `gsseap_eap::TestEapServer` and
//! implements [`RadiusTransport`] directly, with no socket in between.

use gsseap_eap::{EapPacket, ServerStep, TestEapServer};

use crate::avp::{find_eap_message, Avp};
use crate::transport::{AccessRequest, AccessResponse, RadiusCode, RadiusError, RadiusTransport};

/// Spec scenario S1's canned 32-byte MS-MPPE-Send-Key length: the acceptor
/// only needs a prefix of the EAP method's exported key material.
const MPPE_KEY_LEN: usize = 32;

enum Phase {
    AwaitingFirstRequest,
    Running,
    Finished,
}

/// In-memory AAA server used by this crate's own tests and by
/// `gsseap-demo`. Synthesizes the first Identity request itself (the
/// acceptor never sees it) and thereafter answers Access-Requests
/// carrying the peer's EAP responses.
pub struct InMemoryAaaServer {
    eap: TestEapServer,
    phase: Phase,
    state_counter: u32,
}

impl InMemoryAaaServer {
    pub fn new(secret: impl Into<Vec<u8>>, challenge: Vec<u8>) -> Self {
        Self {
            eap: TestEapServer::new(secret, challenge),
            phase: Phase::AwaitingFirstRequest,
            state_counter: 0,
        }
    }

    fn next_state_avp(&mut self) -> Avp {
        self.state_counter += 1;
        Avp::State(self.state_counter.to_be_bytes().to_vec())
    }
}

impl RadiusTransport for InMemoryAaaServer {
    fn send_receive(&mut self, request: AccessRequest) -> Result<AccessResponse, RadiusError> {
        match self.phase {
            Phase::AwaitingFirstRequest => {
                self.phase = Phase::Running;
                let id_req = self.eap.start();
                Ok(AccessResponse {
                    code: RadiusCode::AccessChallenge,
                    avps: vec![Avp::EapMessage(id_req.encode()), self.next_state_avp()],
                })
            }
            Phase::Running => {
                let eap_bytes = find_eap_message(&request.avps)
                    .ok_or_else(|| RadiusError::Protocol("Access-Request missing EAP-Message".into()))?;
                let response = EapPacket::decode(eap_bytes)
                    .map_err(|e| RadiusError::Protocol(format!("malformed EAP-Message: {e}")))?;

                match self.eap.step(&response) {
                    Ok(ServerStep::Continue(next)) => Ok(AccessResponse {
                        code: RadiusCode::AccessChallenge,
                        avps: vec![Avp::EapMessage(next.encode()), self.next_state_avp()],
                    }),
                    Ok(ServerStep::Accept { emsk }) => {
                        self.phase = Phase::Finished;
                        let success = EapPacket::success(response.identifier.wrapping_add(1));
                        let send_key = emsk[..MPPE_KEY_LEN.min(emsk.len())].to_vec();
                        Ok(AccessResponse {
                            code: RadiusCode::AccessAccept,
                            avps: vec![
                                Avp::EapMessage(success.encode()),
                                Avp::MsMppeSendKey(send_key),
                            ],
                        })
                    }
                    Ok(ServerStep::Reject) => {
                        self.phase = Phase::Finished;
                        let failure = EapPacket::failure(response.identifier.wrapping_add(1));
                        Ok(AccessResponse {
                            code: RadiusCode::AccessReject,
                            avps: vec![Avp::EapMessage(failure.encode())],
                        })
                    }
                    Err(e) => Err(RadiusError::Protocol(e.to_string())),
                }
            }
            Phase::Finished => Err(RadiusError::Protocol("conversation already concluded".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsseap_eap::{EapPeer, EapStep, TestEapPeer};

    #[test]
    fn full_transaction_yields_accept_with_mppe_key() {
        let mut server = InMemoryAaaServer::new("shared-secret", vec![0x09; 16]);
        let mut peer = TestEapPeer::new("bob@example.org", "shared-secret");

        let mut response = server.send_receive(AccessRequest::new(vec![])).unwrap();
        let mut final_emsk = None;

        loop {
            let eap_bytes = find_eap_message(&response.avps).unwrap();
            let request = EapPacket::decode(eap_bytes).unwrap();

            match peer.step(Some(&request)).unwrap() {
                EapStep::Send(reply) => {
                    response = server
                        .send_receive(AccessRequest::new(vec![Avp::EapMessage(reply.encode())]))
                        .unwrap();
                    if response.is_accept() || response.is_reject() {
                        // one more EAP packet (Success/Failure) is embedded
                        // in this very response; feed it to the peer too.
                        let final_bytes = find_eap_message(&response.avps).unwrap();
                        let final_pkt = EapPacket::decode(final_bytes).unwrap();
                        match peer.step(Some(&final_pkt)).unwrap() {
                            EapStep::Done { emsk } => final_emsk = Some(emsk),
                            EapStep::Failed { .. } => {}
                            EapStep::Send(_) => panic!("unexpected response to Success/Failure"),
                        }
                        break;
                    }
                }
                EapStep::Done { .. } | EapStep::Failed { .. } => break,
            }
        }

        assert!(response.is_accept());
        assert_eq!(
            response.avps.iter().find_map(|a| match a {
                Avp::MsMppeSendKey(bytes) => Some(bytes.len()),
                _ => None,
            }),
            Some(MPPE_KEY_LEN)
        );
        assert!(final_emsk.is_some());
    }

    #[test]
    fn wrong_secret_yields_reject() {
        let mut server = InMemoryAaaServer::new("shared-secret", vec![0x09; 16]);
        let mut peer = TestEapPeer::new("mallory@example.org", "guessed-secret");

        let mut response = server.send_receive(AccessRequest::new(vec![])).unwrap();
        loop {
            let eap_bytes = find_eap_message(&response.avps).unwrap();
            let request = EapPacket::decode(eap_bytes).unwrap();
            match peer.step(Some(&request)).unwrap() {
                EapStep::Send(reply) => {
                    response = server
                        .send_receive(AccessRequest::new(vec![Avp::EapMessage(reply.encode())]))
                        .unwrap();
                    if response.is_reject() || response.is_accept() {
                        break;
                    }
                }
                EapStep::Done { .. } | EapStep::Failed { .. } => break,
            }
        }
        assert!(response.is_reject());
    }
}

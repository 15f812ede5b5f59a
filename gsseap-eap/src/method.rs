//! The EAP peer boundary and an in-memory identity/challenge test method.
//!
//! Real EAP methods (EAP-TLS, EAP-pwd, and so on) are out of scope; this
//! crate ships only the trait `gsseap-core` drives plus enough of a toy
//! method to carry a full context establishment end to end, including
//! producing an EMSK for key derivation.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::packet::{EapCode, EapPacket, EapType};

/// Outcome of one [`EapPeer::step`] call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EapStep {
    /// Send this packet and await the next one.
    Send(EapPacket),
    /// The method concluded successfully; `emsk` is the exported master
    /// session key (spec requires at least 64 bytes so the initiator can
    /// take the second half for `random-to-key`).
    Done { emsk: Vec<u8> },
    /// The method failed; `send` is an optional final packet (e.g. a
    /// Response before the peer gives up).
    Failed { send: Option<EapPacket> },
}

/// Errors from the EAP peer boundary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EapError {
    UnexpectedPacket(EapPacket),
    Protocol(String),
}

impl fmt::Display for EapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedPacket(pkt) => write!(f, "unexpected EAP packet: {pkt:?}"),
            Self::Protocol(msg) => write!(f, "EAP protocol error: {msg}"),
        }
    }
}

impl std::error::Error for EapError {}

/// Drives one side of an EAP conversation. `gsseap-core`'s acceptor calls
/// this indirectly through `gsseap-radius`'s in-memory AAA server; the
/// initiator calls it directly.
pub trait EapPeer: Send {
    /// Process an incoming request packet (`None` on the very first call,
    /// before the peer has seen anything) and produce the next step.
    fn step(&mut self, request: Option<&EapPacket>) -> Result<EapStep, EapError>;
}

fn derive_emsk(identity: &[u8], secret: &[u8], challenge: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    let mut counter: u8 = 0;
    while out.len() < 64 {
        let mut hasher = Sha256::new();
        hasher.update(identity);
        hasher.update(secret);
        hasher.update(challenge);
        hasher.update([counter]);
        out.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    out.truncate(64);
    out
}

fn challenge_response(secret: &[u8], challenge: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hasher.update(challenge);
    hasher.finalize().to_vec()
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum PeerState {
    AwaitingIdentityRequest,
    AwaitingChallenge,
    Done,
}

/// In-memory test peer: answers an Identity request with a fixed identity,
/// then answers an experimental challenge with a keyed SHA-256 response,
/// then reports success once it sees an EAP-Success.
pub struct TestEapPeer {
    identity: Vec<u8>,
    secret: Vec<u8>,
    state: PeerState,
    emsk: Option<Vec<u8>>,
}

impl TestEapPeer {
    pub fn new(identity: impl Into<Vec<u8>>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
            state: PeerState::AwaitingIdentityRequest,
            emsk: None,
        }
    }
}

impl EapPeer for TestEapPeer {
    fn step(&mut self, request: Option<&EapPacket>) -> Result<EapStep, EapError> {
        let Some(request) = request else {
            return Ok(EapStep::Failed { send: None });
        };

        match (self.state, request.code, request.typ) {
            (PeerState::AwaitingIdentityRequest, EapCode::Request, Some(EapType::Identity)) => {
                self.state = PeerState::AwaitingChallenge;
                let resp = EapPacket::response(request.identifier, EapType::Identity, self.identity.clone());
                Ok(EapStep::Send(resp))
            }
            (PeerState::AwaitingChallenge, EapCode::Request, Some(EapType::Experimental)) => {
                let challenge = request.data.clone();
                self.emsk = Some(derive_emsk(&self.identity, &self.secret, &challenge));
                let response = challenge_response(&self.secret, &challenge);
                self.state = PeerState::Done;
                Ok(EapStep::Send(EapPacket::response(request.identifier, EapType::Experimental, response)))
            }
            (PeerState::Done, EapCode::Success, None) => {
                let emsk = self.emsk.clone().ok_or_else(|| {
                    EapError::Protocol("success reached before EMSK was derived".into())
                })?;
                Ok(EapStep::Done { emsk })
            }
            (_, EapCode::Failure, None) => Ok(EapStep::Failed { send: None }),
            _ => Err(EapError::UnexpectedPacket(request.clone())),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum ServerState {
    SentIdentityRequest,
    SentChallenge { identity: Vec<u8>, challenge: Vec<u8> },
    Done,
}

impl Default for ServerState {
    fn default() -> Self {
        Self::SentIdentityRequest
    }
}

/// Server side of [`TestEapPeer`]'s protocol: consumed by
/// `gsseap-radius`'s in-memory AAA double. Not itself an `EapPeer`
/// (the acceptor never runs this directly; RADIUS does).
pub struct TestEapServer {
    secret: Vec<u8>,
    state: ServerState,
    next_identifier: u8,
    challenge_source: Vec<u8>,
}

impl TestEapServer {
    /// `challenge` fixes the nonce the server sends, so tests and the
    /// demo binary get reproducible transcripts without calling into a
    /// random source from this crate.
    pub fn new(secret: impl Into<Vec<u8>>, challenge: Vec<u8>) -> Self {
        Self {
            secret: secret.into(),
            state: ServerState::default(),
            next_identifier: 0,
            challenge_source: challenge,
        }
    }

    /// The first packet to send to the peer: an Identity request.
    pub fn start(&mut self) -> EapPacket {
        let pkt = EapPacket::request(self.next_identifier, EapType::Identity, Vec::new());
        self.next_identifier = self.next_identifier.wrapping_add(1);
        pkt
    }

    /// Feed the peer's response and get back the next packet to send, or
    /// `None` with the final verdict once the exchange concludes.
    pub fn step(&mut self, response: &EapPacket) -> Result<ServerStep, EapError> {
        match (&self.state, response.typ) {
            (ServerState::SentIdentityRequest, Some(EapType::Identity)) => {
                let identity = response.data.clone();
                let challenge = self.challenge_source.clone();
                self.state = ServerState::SentChallenge { identity, challenge: challenge.clone() };
                let pkt = EapPacket::request(self.next_identifier, EapType::Experimental, challenge);
                self.next_identifier = self.next_identifier.wrapping_add(1);
                Ok(ServerStep::Continue(pkt))
            }
            (ServerState::SentChallenge { identity, challenge }, Some(EapType::Experimental)) => {
                let expected = challenge_response(&self.secret, challenge);
                if response.data == expected {
                    let emsk = derive_emsk(identity, &self.secret, challenge);
                    self.state = ServerState::Done;
                    Ok(ServerStep::Accept { emsk })
                } else {
                    self.state = ServerState::Done;
                    Ok(ServerStep::Reject)
                }
            }
            _ => Err(EapError::UnexpectedPacket(response.clone())),
        }
    }
}

/// Result of feeding one response into [`TestEapServer::step`].
pub enum ServerStep {
    Continue(EapPacket),
    Accept { emsk: Vec<u8> },
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive_happy_path() -> (Vec<u8>, Vec<u8>) {
        let mut peer = TestEapPeer::new("alice@example.org", "correct-horse");
        let mut server = TestEapServer::new("correct-horse", vec![0x42; 16]);

        let id_req = server.start();
        let EapStep::Send(id_resp) = peer.step(Some(&id_req)).unwrap() else {
            panic!("expected identity response");
        };

        let ServerStep::Continue(challenge_req) = server.step(&id_resp).unwrap() else {
            panic!("expected challenge");
        };
        let EapStep::Send(challenge_resp) = peer.step(Some(&challenge_req)).unwrap() else {
            panic!("expected challenge response");
        };

        let ServerStep::Accept { emsk: server_emsk } = server.step(&challenge_resp).unwrap() else {
            panic!("expected accept");
        };

        let success = EapPacket::success(challenge_req.identifier.wrapping_add(1));
        let EapStep::Done { emsk: peer_emsk } = peer.step(Some(&success)).unwrap() else {
            panic!("expected done");
        };

        (peer_emsk, server_emsk)
    }

    #[test]
    fn peer_and_server_agree_on_emsk() {
        let (peer_emsk, server_emsk) = drive_happy_path();
        assert_eq!(peer_emsk, server_emsk);
        assert_eq!(peer_emsk.len(), 64);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let mut peer = TestEapPeer::new("alice@example.org", "wrong-secret");
        let mut server = TestEapServer::new("correct-horse", vec![0x42; 16]);

        let id_req = server.start();
        let EapStep::Send(id_resp) = peer.step(Some(&id_req)).unwrap() else {
            panic!("expected identity response");
        };
        let ServerStep::Continue(challenge_req) = server.step(&id_resp).unwrap() else {
            panic!("expected challenge");
        };
        let EapStep::Send(challenge_resp) = peer.step(Some(&challenge_req)).unwrap() else {
            panic!("expected challenge response");
        };
        assert!(matches!(server.step(&challenge_resp).unwrap(), ServerStep::Reject));
    }
}

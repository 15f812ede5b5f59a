//! RADIUS request/response transport boundary.

use std::fmt;

use crate::avp::Avp;

/// RADIUS packet codes relevant to an EAP-over-RADIUS exchange
/// (RFC 2865 §3, RFC 3579).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum RadiusCode {
    AccessRequest = 1,
    AccessAccept = 2,
    AccessReject = 3,
    AccessChallenge = 11,
}

/// An Access-Request, carrying the acceptor's EAP-Message and any cached
/// State from a previous Access-Challenge.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccessRequest {
    pub avps: Vec<Avp>,
}

impl AccessRequest {
    pub fn new(avps: Vec<Avp>) -> Self {
        Self { avps }
    }
}

/// The server's reply to an [`AccessRequest`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccessResponse {
    pub code: RadiusCode,
    pub avps: Vec<Avp>,
}

impl AccessResponse {
    pub fn is_accept(&self) -> bool {
        self.code == RadiusCode::AccessAccept
    }

    pub fn is_challenge(&self) -> bool {
        self.code == RadiusCode::AccessChallenge
    }

    pub fn is_reject(&self) -> bool {
        self.code == RadiusCode::AccessReject
    }
}

/// Configuration for a RADIUS/RadSec server endpoint. Connection details
/// (RadSec TLS, UDP retransmission) are out of scope; this is carried
/// only so acceptor configuration has somewhere to put a server identity.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RadiusServerConfig {
    pub name: String,
    pub shared_secret: Vec<u8>,
}

/// Errors from a [`RadiusTransport`] round trip.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RadiusError {
    Unreachable(String),
    Protocol(String),
    Timeout,
}

impl fmt::Display for RadiusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable(server) => write!(f, "RADIUS server unreachable: {server}"),
            Self::Protocol(msg) => write!(f, "RADIUS protocol error: {msg}"),
            Self::Timeout => write!(f, "RADIUS request timed out"),
        }
    }
}

impl std::error::Error for RadiusError {}

/// A synchronous RADIUS/RadSec request/response client. Implementations
/// own their own connection and (per spec C7) perform one blocking round
/// trip per acceptor step; there is no coroutine/async model here.
pub trait RadiusTransport {
    fn send_receive(&mut self, request: AccessRequest) -> Result<AccessResponse, RadiusError>;
}

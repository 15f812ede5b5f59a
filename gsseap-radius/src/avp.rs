//! Typed RADIUS attribute-value pairs.
//!
//! RADIUS wire parsing is out of scope (see `spec.md` Non-goals); the
//! transport boundary exchanges these typed values directly rather than
//! encoded byte strings, since nothing in this crate ever needs the raw
//! RFC 2865 attribute/length/value framing.

/// An attribute carried on a RADIUS request or response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Avp {
    UserName(Vec<u8>),
    EapMessage(Vec<u8>),
    State(Vec<u8>),
    MessageAuthenticator([u8; 16]),
    /// Microsoft vendor attribute 311/16, carries the MSK's send-direction
    /// half (spec C4: "MS-MPPE-Send-Key (vendor 311, attr 16)").
    MsMppeSendKey(Vec<u8>),
    /// Microsoft vendor attribute 311/17.
    MsMppeRecvKey(Vec<u8>),
    /// Identifies the acceptor's service to the AAA server.
    AcceptorService(Vec<u8>),
    Vendor { vendor_id: u32, vendor_type: u8, value: Vec<u8> },
    Generic { attribute_type: u8, value: Vec<u8> },
}

impl Avp {
    pub fn as_eap_message(&self) -> Option<&[u8]> {
        match self {
            Self::EapMessage(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_state(&self) -> Option<&[u8]> {
        match self {
            Self::State(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_ms_mppe_send_key(&self) -> Option<&[u8]> {
        match self {
            Self::MsMppeSendKey(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Find the first matching AVP of a kind in a slice, by discriminant.
pub fn find_eap_message(avps: &[Avp]) -> Option<&[u8]> {
    avps.iter().find_map(Avp::as_eap_message)
}

pub fn find_state(avps: &[Avp]) -> Option<&[u8]> {
    avps.iter().find_map(Avp::as_state)
}

pub fn find_ms_mppe_send_key(avps: &[Avp]) -> Option<&[u8]> {
    avps.iter().find_map(Avp::as_ms_mppe_send_key)
}

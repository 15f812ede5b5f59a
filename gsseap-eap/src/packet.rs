//! RFC 3748 EAP packet header: `code | identifier | length(u16 BE) | type | data`.

use byteorder::{BigEndian, ByteOrder};
use std::fmt;

/// EAP code (RFC 3748 §4).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum EapCode {
    Request = 1,
    Response = 2,
    Success = 3,
    Failure = 4,
}

impl EapCode {
    fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Request),
            2 => Some(Self::Response),
            3 => Some(Self::Success),
            4 => Some(Self::Failure),
            _ => None,
        }
    }
}

/// EAP type octet (RFC 3748 §5). `Identity` is the only IANA-assigned
/// value used here; `Experimental` (254, RFC 3748's vendor-extensible
/// escape) carries this crate's in-memory test method.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum EapType {
    Identity = 1,
    Experimental = 254,
}

impl EapType {
    fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Identity),
            254 => Some(Self::Experimental),
            _ => None,
        }
    }
}

/// A decoded EAP packet. `Success`/`Failure` carry no type octet or data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EapPacket {
    pub code: EapCode,
    pub identifier: u8,
    pub typ: Option<EapType>,
    pub data: Vec<u8>,
}

/// Errors decoding an EAP packet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EapPacketError {
    TooShort { got: usize },
    LengthMismatch { header: usize, actual: usize },
    UnknownCode(u8),
    UnknownType(u8),
    MissingType,
}

impl fmt::Display for EapPacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { got } => write!(f, "packet too short: {got} bytes"),
            Self::LengthMismatch { header, actual } => {
                write!(f, "header length {header} does not match actual {actual}")
            }
            Self::UnknownCode(c) => write!(f, "unknown EAP code {c}"),
            Self::UnknownType(t) => write!(f, "unknown EAP type {t}"),
            Self::MissingType => write!(f, "request/response packet missing a type octet"),
        }
    }
}

impl std::error::Error for EapPacketError {}

impl EapPacket {
    pub fn request(identifier: u8, typ: EapType, data: Vec<u8>) -> Self {
        Self { code: EapCode::Request, identifier, typ: Some(typ), data }
    }

    pub fn response(identifier: u8, typ: EapType, data: Vec<u8>) -> Self {
        Self { code: EapCode::Response, identifier, typ: Some(typ), data }
    }

    pub fn success(identifier: u8) -> Self {
        Self { code: EapCode::Success, identifier, typ: None, data: Vec::new() }
    }

    pub fn failure(identifier: u8) -> Self {
        Self { code: EapCode::Failure, identifier, typ: None, data: Vec::new() }
    }

    pub fn encode(&self) -> Vec<u8> {
        let has_type = self.typ.is_some();
        let len = 4 + if has_type { 1 + self.data.len() } else { 0 };
        let mut out = Vec::with_capacity(len);
        out.push(self.code as u8);
        out.push(self.identifier);
        let mut len_buf = [0u8; 2];
        BigEndian::write_u16(&mut len_buf, len as u16);
        out.extend_from_slice(&len_buf);
        if let Some(typ) = self.typ {
            out.push(typ as u8);
            out.extend_from_slice(&self.data);
        }
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, EapPacketError> {
        if buf.len() < 4 {
            return Err(EapPacketError::TooShort { got: buf.len() });
        }
        let code = EapCode::from_u8(buf[0]).ok_or(EapPacketError::UnknownCode(buf[0]))?;
        let identifier = buf[1];
        let declared_len = BigEndian::read_u16(&buf[2..4]) as usize;
        if declared_len != buf.len() {
            return Err(EapPacketError::LengthMismatch { header: declared_len, actual: buf.len() });
        }

        match code {
            EapCode::Success | EapCode::Failure => {
                Ok(Self { code, identifier, typ: None, data: Vec::new() })
            }
            EapCode::Request | EapCode::Response => {
                if buf.len() < 5 {
                    return Err(EapPacketError::MissingType);
                }
                let typ = EapType::from_u8(buf[4]).ok_or(EapPacketError::UnknownType(buf[4]))?;
                Ok(Self { code, identifier, typ: Some(typ), data: buf[5..].to_vec() })
            }
        }
    }
}

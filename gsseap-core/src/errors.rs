//! GSS major/minor status taxonomy and the acceptor-side error whitelist.

use std::fmt;

/// The caller-visible outcome of a `step_*` call.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MajorStatus {
    /// Emit `output_token` and call again with the peer's next token.
    ContinueNeeded,
    /// The context is established; `output_token` may still be set.
    Complete,
    DefectiveToken,
    BadMech,
    BadName,
    NoCred,
    CredentialsExpired,
    ContextExpired,
    BadBindings,
    DefectiveCredential,
    Failure,
    BadStatus,
    /// A critical inner token of unknown type was received.
    Unavailable,
}

impl MajorStatus {
    /// Per spec §7: these leave the context unusable.
    pub fn is_fatal(self) -> bool {
        !matches!(self, Self::ContinueNeeded | Self::Complete)
    }
}

impl fmt::Display for MajorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ContinueNeeded => "continue needed",
            Self::Complete => "complete",
            Self::DefectiveToken => "defective token",
            Self::BadMech => "bad mechanism",
            Self::BadName => "bad name",
            Self::NoCred => "no credential",
            Self::CredentialsExpired => "credentials expired",
            Self::ContextExpired => "context expired",
            Self::BadBindings => "bad channel bindings",
            Self::DefectiveCredential => "defective credential",
            Self::Failure => "failure",
            Self::BadStatus => "bad status",
            Self::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// Minor status codes, grouped per spec §7's taxonomy.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MinorStatus {
    // Framing
    TokTrunc,
    WrongSize,
    BadTokHeader,
    WrongMech,
    WrongTokId,
    DuplicateItok,
    MissingRequiredItok,
    CritItokUnavailable,
    // Protocol
    WrongItok,
    BadDirection,
    Reflect,
    BadErrorToken,
    // Crypto/key
    KeyUnavailable,
    KeyTooShort,
    // Auth
    RadiusAuthFailure,
    UnknownRadiusCode,
    PeerAuthFailure,
    MissingEapRequest,
    BindingsMismatch,
    // Lifecycle
    ContextEstablished,
    ContextExpired,
    CredUsageMismatch,
    CredMechMismatch,
    NoAcceptorName,
    // Resource
    OutOfMemory,
    RadsecContextFailure,
    GenericRadiusError,
    TransportError,
}

impl fmt::Display for MinorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TokTrunc => "token truncated",
            Self::WrongSize => "wrong size",
            Self::BadTokHeader => "bad token header",
            Self::WrongMech => "wrong mechanism",
            Self::WrongTokId => "wrong token id",
            Self::DuplicateItok => "duplicate inner token",
            Self::MissingRequiredItok => "missing required inner token",
            Self::CritItokUnavailable => "critical inner token unavailable",
            Self::WrongItok => "unexpected inner token for state",
            Self::BadDirection => "token received in wrong direction",
            Self::Reflect => "own token reflected back",
            Self::BadErrorToken => "malformed context-error token",
            Self::KeyUnavailable => "key material unavailable",
            Self::KeyTooShort => "key material too short",
            Self::RadiusAuthFailure => "RADIUS authentication failure",
            Self::UnknownRadiusCode => "unknown RADIUS response code",
            Self::PeerAuthFailure => "peer EAP authentication failure",
            Self::MissingEapRequest => "Access-Challenge missing EAP-Message",
            Self::BindingsMismatch => "channel bindings mismatch",
            Self::ContextEstablished => "context already established",
            Self::ContextExpired => "context expired",
            Self::CredUsageMismatch => "credential usage mismatch",
            Self::CredMechMismatch => "credential mechanism mismatch",
            Self::NoAcceptorName => "no acceptor name available",
            Self::OutOfMemory => "out of memory",
            Self::RadsecContextFailure => "RadSec context failure",
            Self::GenericRadiusError => "generic RADIUS error",
            Self::TransportError => "transport error",
        };
        f.write_str(s)
    }
}

/// The acceptor-side whitelist (spec §7): only framing/protocol kinds and a
/// small set of auth-related kinds are ever embedded in a `CONTEXT_ERR`
/// token; everything else collapses to `GENERIC_RADIUS_ERROR` so internal
/// RADIUS/system detail never leaks to the initiator.
pub fn whitelist(minor: MinorStatus) -> MinorStatus {
    use MinorStatus::*;
    match minor {
        TokTrunc | WrongSize | BadTokHeader | WrongMech | WrongTokId | DuplicateItok
        | MissingRequiredItok | CritItokUnavailable | WrongItok | BadDirection | Reflect
        | BadErrorToken | RadiusAuthFailure | UnknownRadiusCode | PeerAuthFailure
        | MissingEapRequest | BindingsMismatch => minor,
        _ => GenericRadiusError,
    }
}

impl MajorStatus {
    /// Stable wire code used by `CONTEXT_ERR` framing (spec §4.6/§7). Not a
    /// claim to match any registered GSS numeric status.
    pub const fn code(self) -> u32 {
        match self {
            Self::ContinueNeeded => 0,
            Self::Complete => 1,
            Self::DefectiveToken => 2,
            Self::BadMech => 3,
            Self::BadName => 4,
            Self::NoCred => 5,
            Self::CredentialsExpired => 6,
            Self::ContextExpired => 7,
            Self::BadBindings => 8,
            Self::DefectiveCredential => 9,
            Self::Failure => 10,
            Self::BadStatus => 11,
            Self::Unavailable => 12,
        }
    }

    pub const fn from_code(v: u32) -> Option<Self> {
        Some(match v {
            0 => Self::ContinueNeeded,
            1 => Self::Complete,
            2 => Self::DefectiveToken,
            3 => Self::BadMech,
            4 => Self::BadName,
            5 => Self::NoCred,
            6 => Self::CredentialsExpired,
            7 => Self::ContextExpired,
            8 => Self::BadBindings,
            9 => Self::DefectiveCredential,
            10 => Self::Failure,
            11 => Self::BadStatus,
            12 => Self::Unavailable,
            _ => return None,
        })
    }
}

impl MinorStatus {
    pub const fn code(self) -> u32 {
        use MinorStatus::*;
        match self {
            TokTrunc => 0,
            WrongSize => 1,
            BadTokHeader => 2,
            WrongMech => 3,
            WrongTokId => 4,
            DuplicateItok => 5,
            MissingRequiredItok => 6,
            CritItokUnavailable => 7,
            WrongItok => 8,
            BadDirection => 9,
            Reflect => 10,
            BadErrorToken => 11,
            KeyUnavailable => 12,
            KeyTooShort => 13,
            RadiusAuthFailure => 14,
            UnknownRadiusCode => 15,
            PeerAuthFailure => 16,
            MissingEapRequest => 17,
            BindingsMismatch => 18,
            ContextEstablished => 19,
            ContextExpired => 20,
            CredUsageMismatch => 21,
            CredMechMismatch => 22,
            NoAcceptorName => 23,
            OutOfMemory => 24,
            RadsecContextFailure => 25,
            GenericRadiusError => 26,
            TransportError => 27,
        }
    }

    pub const fn from_code(v: u32) -> Option<Self> {
        use MinorStatus::*;
        Some(match v {
            0 => TokTrunc,
            1 => WrongSize,
            2 => BadTokHeader,
            3 => WrongMech,
            4 => WrongTokId,
            5 => DuplicateItok,
            6 => MissingRequiredItok,
            7 => CritItokUnavailable,
            8 => WrongItok,
            9 => BadDirection,
            10 => Reflect,
            11 => BadErrorToken,
            12 => KeyUnavailable,
            13 => KeyTooShort,
            14 => RadiusAuthFailure,
            15 => UnknownRadiusCode,
            16 => PeerAuthFailure,
            17 => MissingEapRequest,
            18 => BindingsMismatch,
            19 => ContextEstablished,
            20 => ContextExpired,
            21 => CredUsageMismatch,
            22 => CredMechMismatch,
            23 => NoAcceptorName,
            24 => OutOfMemory,
            25 => RadsecContextFailure,
            26 => GenericRadiusError,
            27 => TransportError,
            _ => return None,
        })
    }
}

/// Encode a `CONTEXT_ERR` inner-token body: two 32-bit big-endian numbers,
/// major status then minor status (spec §4.6: "the initiator decodes two
/// 32-bit big-endian numbers").
pub fn encode_context_err(major: MajorStatus, minor: MinorStatus) -> Vec<u8> {
    let mut out = Vec::with_capacity(8);
    out.extend_from_slice(&major.code().to_be_bytes());
    out.extend_from_slice(&minor.code().to_be_bytes());
    out
}

pub fn decode_context_err(body: &[u8]) -> Result<(MajorStatus, MinorStatus), SmError> {
    if body.len() != 8 {
        return Err(SmError::new(MajorStatus::DefectiveToken, MinorStatus::BadErrorToken));
    }
    let major_code = u32::from_be_bytes(body[0..4].try_into().unwrap());
    let minor_code = u32::from_be_bytes(body[4..8].try_into().unwrap());
    let major = MajorStatus::from_code(major_code)
        .ok_or_else(|| SmError::new(MajorStatus::DefectiveToken, MinorStatus::BadErrorToken))?;
    let minor = MinorStatus::from_code(minor_code)
        .ok_or_else(|| SmError::new(MajorStatus::DefectiveToken, MinorStatus::BadErrorToken))?;
    Ok((major, minor))
}

/// `(major, minor)`, the caller-visible result of every entry point.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct GssError {
    pub major: MajorStatus,
    pub minor: MinorStatus,
}

impl GssError {
    pub fn new(major: MajorStatus, minor: MinorStatus) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for GssError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.major, self.minor)
    }
}

impl std::error::Error for GssError {}

impl From<gsseap_token::TokenError> for GssError {
    fn from(e: gsseap_token::TokenError) -> Self {
        SmError::from(e).0
    }
}

/// An error raised inside a single handler, before the dispatcher decides
/// whether to substitute a `CONTEXT_ERR` token (acceptor) or surface it
/// directly (initiator).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SmError(pub GssError);

impl SmError {
    pub fn new(major: MajorStatus, minor: MinorStatus) -> Self {
        Self(GssError::new(major, minor))
    }
}

impl From<GssError> for SmError {
    fn from(e: GssError) -> Self {
        Self(e)
    }
}

impl fmt::Display for SmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for SmError {}

impl From<gsseap_token::TokenError> for SmError {
    fn from(e: gsseap_token::TokenError) -> Self {
        use gsseap_token::TokenError::*;
        let minor = match e {
            BadPrefix | InconsistentLength => MinorStatus::BadTokHeader,
            NonMinimalLength | LengthOverflow | Truncated => MinorStatus::TokTrunc,
            WrongMech => MinorStatus::WrongMech,
            DuplicateKind(_) => MinorStatus::DuplicateItok,
        };
        Self::new(MajorStatus::DefectiveToken, minor)
    }
}

impl From<gsseap_radius::RadiusError> for SmError {
    fn from(_: gsseap_radius::RadiusError) -> Self {
        Self::new(MajorStatus::Failure, MinorStatus::TransportError)
    }
}

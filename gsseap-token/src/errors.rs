use std::fmt;

/// Errors produced while decoding an outer or inner token stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenError {
    /// The leading `0x60` application tag was missing or wrong.
    BadPrefix,
    /// The DER length used a non-minimal encoding (a leading zero byte).
    NonMinimalLength,
    /// The DER length would not fit in a signed 32-bit integer.
    LengthOverflow,
    /// The outer length field did not match the actual remaining bytes.
    InconsistentLength,
    /// The `0x06` OID tag was missing, or the OID bytes did not match the
    /// expected mechanism family.
    WrongMech,
    /// An inner token's declared length exceeds the bytes remaining in the
    /// stream.
    Truncated,
    /// Two inner tokens in the same outer token shared the same kind.
    DuplicateKind(u32),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadPrefix => write!(f, "missing or invalid outer token prefix"),
            Self::NonMinimalLength => write!(f, "non-minimal DER length encoding"),
            Self::LengthOverflow => write!(f, "DER length overflows a signed 32-bit integer"),
            Self::InconsistentLength => write!(f, "outer length does not match remaining bytes"),
            Self::WrongMech => write!(f, "OID does not belong to the mechanism family"),
            Self::Truncated => write!(f, "inner token stream truncated"),
            Self::DuplicateKind(k) => write!(f, "duplicate inner token kind {k:#x}"),
        }
    }
}

impl std::error::Error for TokenError {}

use std::fmt;

/// Errors from the [`crate::Rfc3961Suite`] boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CryptoError {
    /// Key material was shorter than the enctype requires.
    KeyTooShort { got: usize, need: usize },
    /// `verify_mic` found a checksum mismatch.
    MicMismatch,
    /// `unwrap` was given a buffer too short to contain the IV/header.
    CiphertextTooShort,
    /// The requested enctype/cksumtype pair isn't supported by this suite.
    UnsupportedEnctype,
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyTooShort { got, need } => {
                write!(f, "key material too short: got {got} bytes, need {need}")
            }
            Self::MicMismatch => write!(f, "MIC verification failed"),
            Self::CiphertextTooShort => write!(f, "ciphertext too short to contain header"),
            Self::UnsupportedEnctype => write!(f, "unsupported enctype/cksumtype pair"),
        }
    }
}

impl std::error::Error for CryptoError {}

//! RFC-3961 key and checksum-type identifiers, and the derived key type.

/// Encryption type, using the registered RFC 3961 / RFC 3962 numbers where
/// one exists.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum EncType {
    /// No confidentiality; only used transiently before key derivation fails.
    Null = 0,
    /// `aes128-cts-hmac-sha1-96` (RFC 3962).
    Aes128CtsHmacSha1_96 = 17,
    /// `aes256-cts-hmac-sha1-96` (RFC 3962).
    Aes256CtsHmacSha1_96 = 18,
}

impl EncType {
    pub const fn key_len(self) -> usize {
        match self {
            Self::Null => 0,
            Self::Aes128CtsHmacSha1_96 => 16,
            Self::Aes256CtsHmacSha1_96 => 32,
        }
    }

    /// The checksum type the enctype implies, per the spec's "the
    /// checksum-type is derived from the key's enctype" rule.
    pub const fn cksumtype(self) -> CksumType {
        match self {
            Self::Null => CksumType::Null,
            Self::Aes128CtsHmacSha1_96 => CksumType::HmacSha1Aes128,
            Self::Aes256CtsHmacSha1_96 => CksumType::HmacSha1Aes256,
        }
    }
}

/// Checksum type, paired 1:1 with an [`EncType`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum CksumType {
    Null = 0,
    HmacSha1Aes128 = 15,
    HmacSha1Aes256 = 16,
}

/// A derived RFC-3961 key. `Debug` never prints the raw bytes (mirrors
/// `layer_crypto::AuthKey`'s redacted `Debug`, which prints only a key id).
#[derive(Clone)]
pub struct Rfc3961Key {
    pub(crate) enctype: EncType,
    pub(crate) bytes: Vec<u8>,
}

impl Rfc3961Key {
    pub fn new(enctype: EncType, bytes: Vec<u8>) -> Self {
        Self { enctype, bytes }
    }

    pub fn enctype(&self) -> EncType {
        self.enctype
    }

    pub fn cksumtype(&self) -> CksumType {
        self.enctype.cksumtype()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for Rfc3961Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rfc3961Key(enctype={:?}, len={})", self.enctype, self.bytes.len())
    }
}

impl PartialEq for Rfc3961Key {
    fn eq(&self, other: &Self) -> bool {
        self.enctype == other.enctype && self.bytes == other.bytes
    }
}

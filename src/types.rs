//! Core identifiers shared by the guard, the registry and the host.
//!
//! Every identifier is a fixed-width byte string rendered as `0x`-prefixed
//! lowercase hex, both in `Display` and in serde.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Errors produced when parsing hex identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The input was not valid hex.
    #[error("invalid {kind}: {reason}")]
    InvalidHex {
        /// Which identifier was being parsed.
        kind: &'static str,
        /// Decoder error text.
        reason: String,
    },

    /// The input decoded to the wrong number of bytes.
    #[error("invalid {kind}: expected {expected} bytes, got {actual}")]
    WrongLength {
        /// Which identifier was being parsed.
        kind: &'static str,
        /// Required byte length.
        expected: usize,
        /// Decoded byte length.
        actual: usize,
    },
}

fn parse_fixed<const N: usize>(kind: &'static str, input: &str) -> Result<[u8; N], ParseError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|e| ParseError::InvalidHex {
        kind,
        reason: e.to_string(),
    })?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| ParseError::WrongLength {
        kind,
        expected: N,
        actual,
    })
}

macro_rules! hex_identifier {
    ($name:ident, $len:expr, $kind:literal) => {
        impl $name {
            /// Raw bytes of the identifier.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Whether every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({self})", stringify!($name))
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_fixed::<$len>($kind, s).map(Self)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.to_string()
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// 20-byte account, module or token identity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    /// The zero address, used as "unset" throughout.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Address whose low eight bytes hold `n` big-endian.
    ///
    /// Handy for labelled fixtures (`Address::from_low_u64(0xa11ce)`).
    pub fn from_low_u64(n: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    /// Address derived from arbitrary key material: the last 20 bytes of its SHA-256.
    pub fn from_key_material(material: &[u8]) -> Self {
        let digest: [u8; 32] = Sha256::digest(material).into();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Self(bytes)
    }
}

hex_identifier!(Address, 20, "address");

// ---------------------------------------------------------------------------
// CodeHash
// ---------------------------------------------------------------------------

/// SHA-256 over a module's deployed code.
///
/// The zero hash stands for "no code at this address".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CodeHash([u8; 32]);

impl CodeHash {
    /// Hash reported for an address without code.
    pub const EMPTY: CodeHash = CodeHash([0u8; 32]);

    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash deployed code.
    pub fn of(code: &[u8]) -> Self {
        Self(Sha256::digest(code).into())
    }
}

hex_identifier!(CodeHash, 32, "code hash");

// ---------------------------------------------------------------------------
// TxId
// ---------------------------------------------------------------------------

/// Opaque transaction identifier used to key audit notes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxId([u8; 32]);

impl TxId {
    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Identifier derived from a label, for tests and tooling.
    pub fn from_label(label: &str) -> Self {
        Self(Sha256::digest(label.as_bytes()).into())
    }

    /// First `n` hex digits after the `0x` prefix.
    pub fn short_hex(&self, n: usize) -> String {
        hex::encode(self.0).chars().take(n).collect()
    }
}

hex_identifier!(TxId, 32, "transaction id");

// ---------------------------------------------------------------------------
// Verdict and annotations
// ---------------------------------------------------------------------------

/// Safety classification of a (module, content-hash) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Never reviewed, or reviewed under a different content-hash.
    #[default]
    Unknown,
    /// Reviewed and cleared to run.
    Safe,
    /// Reviewed and rejected.
    Unsafe,
}

impl Verdict {
    /// Numeric encoding (0 = Unknown, 1 = Safe, 2 = Unsafe).
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Safe => 1,
            Self::Unsafe => 2,
        }
    }

    /// Decode the numeric encoding; out-of-range values read as `Unknown`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Safe,
            2 => Self::Unsafe,
            _ => Self::Unknown,
        }
    }
}

/// Free-form reviewer notes attached to registry records and audit notes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotation {
    /// Short display name.
    pub name: String,
    /// One-line summary.
    pub summary: String,
    /// Longer description.
    pub description: String,
    /// Newline-separated reasons.
    pub reasons: String,
}

impl Annotation {
    /// Build an annotation from its four text fields.
    pub fn new(
        name: impl Into<String>,
        summary: impl Into<String>,
        description: impl Into<String>,
        reasons: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
            description: description.into(),
            reasons: reasons.into(),
        }
    }
}

//! Parameter kind tag.
//!
//! The kind names which member of a parameter's value union is valid. It is
//! stored as a `u16` inside shared records and spelled as text in
//! configuration files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Value kind carried by a parameter.
///
/// The discriminants are the raw tags written into record memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ParameterKind {
    /// 32-bit float
    #[serde(rename = "FLOAT")]
    Float = 0,
    /// 64-bit float
    #[serde(rename = "DOUBLE")]
    Double = 1,
    /// 64-bit signed integer
    #[serde(rename = "S64")]
    S64 = 2,
    /// Three 32-bit floats
    #[serde(rename = "VEC3_FLOAT")]
    Vec3Float = 3,
    /// Three 64-bit floats
    #[serde(rename = "VEC3_DOUBLE")]
    Vec3Double = 4,
}

/// All kinds, in tag order.
pub const PARAMETER_KINDS: [ParameterKind; 5] = [
    ParameterKind::Float,
    ParameterKind::Double,
    ParameterKind::S64,
    ParameterKind::Vec3Float,
    ParameterKind::Vec3Double,
];

/// Error returned for an unrecognized kind spelling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown parameter kind: {0:?}")]
pub struct UnknownKind(pub String);

impl ParameterKind {
    /// Convert from the raw tag stored in record memory.
    #[inline]
    pub const fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Self::Float),
            1 => Some(Self::Double),
            2 => Some(Self::S64),
            3 => Some(Self::Vec3Float),
            4 => Some(Self::Vec3Double),
            _ => None,
        }
    }

    /// Raw tag as stored in record memory.
    #[inline]
    pub const fn as_raw(self) -> u16 {
        self as u16
    }

    /// Fixed textual spelling, identical to the tag name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::S64 => "S64",
            Self::Vec3Float => "VEC3_FLOAT",
            Self::Vec3Double => "VEC3_DOUBLE",
        }
    }

    /// True for the two 3-vector kinds.
    #[inline]
    pub const fn is_vector(self) -> bool {
        matches!(self, Self::Vec3Float | Self::Vec3Double)
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PARAMETER_KINDS
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spelling_roundtrip() {
        for kind in PARAMETER_KINDS {
            assert_eq!(kind.as_str().parse::<ParameterKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn unknown_spelling_is_rejected() {
        assert_eq!(
            "float".parse::<ParameterKind>(),
            Err(UnknownKind("float".to_string()))
        );
        assert!("".parse::<ParameterKind>().is_err());
        assert!("VEC3".parse::<ParameterKind>().is_err());
    }

    #[test]
    fn raw_tag_roundtrip() {
        for kind in PARAMETER_KINDS {
            assert_eq!(ParameterKind::from_raw(kind.as_raw()), Some(kind));
        }
        assert_eq!(ParameterKind::from_raw(5), None);
        assert_eq!(ParameterKind::from_raw(u16::MAX), None);
    }

    #[test]
    fn serde_uses_tag_spelling() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Wrapper {
            kind: ParameterKind,
        }

        let text = toml::to_string(&Wrapper {
            kind: ParameterKind::Vec3Double,
        })
        .unwrap();
        assert!(text.contains("\"VEC3_DOUBLE\""));

        let parsed: Wrapper = toml::from_str("kind = \"S64\"").unwrap();
        assert_eq!(parsed.kind, ParameterKind::S64);
        assert!(toml::from_str::<Wrapper>("kind = \"INT\"").is_err());
    }
}

//! Package sizes a perfume is sold in.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fixed packaging size.
///
/// Serialized as `"30ml"`, `"50ml"` or `"100ml"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variant {
    #[serde(rename = "30ml")]
    Ml30,
    #[serde(rename = "50ml")]
    Ml50,
    #[serde(rename = "100ml")]
    Ml100,
}

impl Variant {
    /// Every variant, smallest first.
    pub const ALL: [Variant; 3] = [Variant::Ml30, Variant::Ml50, Variant::Ml100];

    /// Returns the wire name of the variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Ml30 => "30ml",
            Variant::Ml50 => "50ml",
            Variant::Ml100 => "100ml",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown variant: {0} (expected 30ml, 50ml or 100ml)")]
pub struct ParseVariantError(pub String);

impl FromStr for Variant {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseVariantError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Variant::Ml30.to_string(), "30ml");
        assert_eq!(Variant::Ml50.to_string(), "50ml");
        assert_eq!(Variant::Ml100.to_string(), "100ml");
    }

    #[test]
    fn test_parse() {
        assert_eq!("30ml".parse::<Variant>().unwrap(), Variant::Ml30);
        assert_eq!("100ML".parse::<Variant>().unwrap(), Variant::Ml100);
        assert_eq!(
            "75ml".parse::<Variant>(),
            Err(ParseVariantError("75ml".to_string()))
        );
    }

    #[test]
    fn test_serialization_uses_wire_names() {
        let json = serde_json::to_string(&Variant::Ml50).unwrap();
        assert_eq!(json, "\"50ml\"");
        let parsed: Variant = serde_json::from_str("\"100ml\"").unwrap();
        assert_eq!(parsed, Variant::Ml100);
    }
}

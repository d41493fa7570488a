//! # Field Elements and Commitments
//!
//! [`FieldElement`] is an integer strictly below the BN254 scalar field
//! modulus, carried on the wire as a decimal string. [`Commitment`] is the
//! two-element digest stored per user.
//!
//! ## Security Invariant
//!
//! A `FieldElement` can only be constructed from a value already reduced
//! below the modulus. Values that would silently wrap inside the proving
//! system are rejected here, so two distinct wire strings can never denote
//! the same in-circuit value.

use std::fmt;
use std::sync::OnceLock;

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use subtle::ConstantTimeEq;

use crate::error::ValidationError;

/// Decimal representation of the BN254 (alt_bn128) scalar field modulus.
pub const BN254_SCALAR_MODULUS: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

/// Number of field elements in a commitment.
pub const COMMITMENT_LEN: usize = 2;

fn modulus() -> &'static BigUint {
    static MODULUS: OnceLock<BigUint> = OnceLock::new();
    MODULUS.get_or_init(|| {
        BigUint::parse_bytes(BN254_SCALAR_MODULUS.as_bytes(), 10)
            .unwrap_or_else(|| unreachable!("modulus literal is valid decimal"))
    })
}

/// An element of the BN254 scalar field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldElement(BigUint);

impl FieldElement {
    /// Parse a canonical decimal string.
    ///
    /// Only the canonical form is accepted, so two accepted strings denote
    /// the same element exactly when they are textually equal. Leading
    /// zeros, signs, whitespace, and hex prefixes are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidFieldElement`] for empty strings,
    /// non-digit characters, or values not below the modulus.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let reject = |reason: &str| ValidationError::InvalidFieldElement {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if value.is_empty() {
            return Err(reject("empty string"));
        }
        if !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(reject("expected decimal digits only"));
        }
        if value.len() > 1 && value.starts_with('0') {
            return Err(reject("leading zeros are not canonical"));
        }
        let n = BigUint::parse_bytes(value.as_bytes(), 10)
            .ok_or_else(|| reject("not a decimal integer"))?;
        Self::from_biguint(n).map_err(|_| reject("value is not below the BN254 scalar modulus"))
    }

    /// Construct from a 128-bit value. Always in range.
    pub fn from_u128(value: u128) -> Self {
        Self(BigUint::from(value))
    }

    /// Construct from big-endian bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidFieldElement`] if the value is not
    /// below the modulus.
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        Self::from_biguint(BigUint::from_bytes_be(bytes))
    }

    fn from_biguint(n: BigUint) -> Result<Self, ValidationError> {
        if &n >= modulus() {
            return Err(ValidationError::InvalidFieldElement {
                value: n.to_str_radix(10),
                reason: "value is not below the BN254 scalar modulus".to_string(),
            });
        }
        Ok(Self(n))
    }

    /// Fixed-width 32-byte big-endian encoding.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let raw = self.0.to_bytes_be();
        let mut out = [0u8; 32];
        // Invariant: value < modulus < 2^254, so raw.len() <= 32.
        out[32 - raw.len()..].copy_from_slice(&raw);
        out
    }

    /// Borrow the underlying integer.
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_str_radix(10))
    }
}

impl std::str::FromStr for FieldElement {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A two-element hash commitment binding a secret.
///
/// Element 0 is the high 128 bits of the SHA-256 digest, element 1 the low
/// 128 bits. Serialized as a JSON array of two decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Commitment([FieldElement; COMMITMENT_LEN]);

impl Commitment {
    /// Build a commitment from its two elements.
    pub fn new(elements: [FieldElement; COMMITMENT_LEN]) -> Self {
        Self(elements)
    }

    /// Parse a commitment from decimal strings.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::CommitmentLength`] unless exactly two
    /// strings are given, or [`ValidationError::InvalidFieldElement`] if
    /// either fails to parse.
    pub fn from_strings<S: AsRef<str>>(values: &[S]) -> Result<Self, ValidationError> {
        match values {
            [a, b] => Ok(Self([
                FieldElement::parse(a.as_ref())?,
                FieldElement::parse(b.as_ref())?,
            ])),
            other => Err(ValidationError::CommitmentLength(other.len())),
        }
    }

    /// The two elements, in order.
    pub fn elements(&self) -> &[FieldElement; COMMITMENT_LEN] {
        &self.0
    }

    /// The elements as decimal strings.
    pub fn to_strings(&self) -> [String; COMMITMENT_LEN] {
        [self.0[0].to_string(), self.0[1].to_string()]
    }

    /// Compare two commitments without early exit on the first differing byte.
    pub fn ct_eq(&self, other: &Self) -> bool {
        let lhs = self.wide_bytes();
        let rhs = other.wide_bytes();
        lhs[..].ct_eq(&rhs[..]).into()
    }

    fn wide_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.0[0].to_be_bytes());
        out[32..].copy_from_slice(&self.0[1].to_be_bytes());
        out
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.0[0], self.0[1])
    }
}

impl Serialize for Commitment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_strings().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Commitment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<String>::deserialize(deserializer)?;
        Self::from_strings(&values).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_canonical_decimal() {
        let fe = FieldElement::parse("123456789").unwrap();
        assert_eq!(fe.to_string(), "123456789");
    }

    #[test]
    fn leading_zeros_rejected() {
        for bad in ["000042", "0111", "00"] {
            assert!(
                matches!(
                    FieldElement::parse(bad),
                    Err(ValidationError::InvalidFieldElement { .. })
                ),
                "{bad}"
            );
        }
        assert_eq!(FieldElement::parse("0").unwrap(), FieldElement::from_u128(0));
    }

    #[test]
    fn rejects_empty_sign_and_hex() {
        for bad in ["", "-1", "+1", "0x10", " 1", "1.0", "1e3"] {
            assert!(FieldElement::parse(bad).is_err(), "{bad:?} must be rejected");
        }
    }

    #[test]
    fn rejects_modulus_and_above() {
        assert!(FieldElement::parse(BN254_SCALAR_MODULUS).is_err());
        let above = format!("{BN254_SCALAR_MODULUS}0");
        assert!(FieldElement::parse(&above).is_err());
    }

    #[test]
    fn accepts_modulus_minus_one() {
        let max = "21888242871839275222246405745257275088548364400416034343698204186575808495616";
        let fe = FieldElement::parse(max).unwrap();
        assert_eq!(fe.to_string(), max);
    }

    #[test]
    fn be_bytes_are_fixed_width() {
        let fe = FieldElement::from_u128(0x0102);
        let bytes = fe.to_be_bytes();
        assert_eq!(bytes[30], 0x01);
        assert_eq!(bytes[31], 0x02);
        assert!(bytes[..30].iter().all(|b| *b == 0));
        assert_eq!(FieldElement::from_be_bytes(&bytes).unwrap(), fe);
    }

    #[test]
    fn commitment_requires_exactly_two() {
        assert_eq!(
            Commitment::from_strings(&["1"]).unwrap_err(),
            ValidationError::CommitmentLength(1)
        );
        assert_eq!(
            Commitment::from_strings(&["1", "2", "3"]).unwrap_err(),
            ValidationError::CommitmentLength(3)
        );
        let empty: [&str; 0] = [];
        assert_eq!(
            Commitment::from_strings(&empty).unwrap_err(),
            ValidationError::CommitmentLength(0)
        );
    }

    #[test]
    fn commitment_serde_is_string_pair() {
        let c = Commitment::from_strings(&["111", "222"]).unwrap();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"["111","222"]"#);
        let back: Commitment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn commitment_deserialize_rejects_wrong_shape() {
        assert!(serde_json::from_str::<Commitment>(r#"["1"]"#).is_err());
        assert!(serde_json::from_str::<Commitment>(r#"["1","x"]"#).is_err());
        assert!(serde_json::from_str::<Commitment>(r#"[1,2]"#).is_err());
    }

    #[test]
    fn ct_eq_matches_structural_eq() {
        let a = Commitment::from_strings(&["111", "222"]).unwrap();
        let b = Commitment::from_strings(&["111", "222"]).unwrap();
        let c = Commitment::from_strings(&["222", "111"]).unwrap();
        assert!(a.ct_eq(&b));
        assert!(!a.ct_eq(&c));
        assert!(Commitment::from_strings(&["0111", "222"]).is_err());
    }

    #[test]
    fn commitment_display_joins_with_pipe() {
        let c = Commitment::from_strings(&["7", "9"]).unwrap();
        assert_eq!(c.to_string(), "7|9");
    }

    proptest! {
        #[test]
        fn u128_decimal_roundtrip(v in any::<u128>()) {
            let fe = FieldElement::from_u128(v);
            let parsed = FieldElement::parse(&v.to_string()).unwrap();
            prop_assert_eq!(fe, parsed);
        }
    }
}

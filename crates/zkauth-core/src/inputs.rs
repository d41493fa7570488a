//! # Public Inputs
//!
//! Login requests carry the proof's public inputs as an arbitrarily nested
//! JSON array of decimal strings, normally just `[c0, c1]`. Any nesting is
//! accepted, and by circuit convention the last two elements after
//! flattening are the claimed commitment. Leading elements are ignored.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::field::{Commitment, COMMITMENT_LEN};

/// A nested sequence of field-element strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublicInputs {
    /// A single field-element string.
    Element(String),
    /// An ordered list of nested inputs.
    List(Vec<PublicInputs>),
}

impl PublicInputs {
    /// Flatten depth-first, preserving order.
    pub fn flatten(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Element(s) => out.push(s),
            Self::List(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }

    /// The commitment claimed by the final two flattened elements.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InsufficientPublicInputs`] when fewer than
    /// two elements are present, or [`ValidationError::InvalidFieldElement`]
    /// when either of the last two is not a field element.
    pub fn claimed_commitment(&self) -> Result<Commitment, ValidationError> {
        let flat = self.flatten();
        if flat.len() < COMMITMENT_LEN {
            return Err(ValidationError::InsufficientPublicInputs(flat.len()));
        }
        Commitment::from_strings(&flat[flat.len() - COMMITMENT_LEN..])
    }
}

impl From<&Commitment> for PublicInputs {
    fn from(commitment: &Commitment) -> Self {
        Self::List(
            commitment
                .to_strings()
                .into_iter()
                .map(Self::Element)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> PublicInputs {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn flattens_nested_in_order() {
        let inputs = parse(r#"[["1","2"],[["3"]],"4"]"#);
        assert_eq!(inputs.flatten(), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn claimed_commitment_is_last_two() {
        let inputs = parse(r#"[["5","6","7","8"],["111","222"]]"#);
        let claimed = inputs.claimed_commitment().unwrap();
        assert_eq!(claimed, Commitment::from_strings(&["111", "222"]).unwrap());
    }

    #[test]
    fn flat_pair_is_accepted() {
        let inputs = parse(r#"["111","222"]"#);
        assert!(inputs.claimed_commitment().is_ok());
    }

    #[test]
    fn too_few_elements_rejected() {
        assert_eq!(
            parse(r#"[["1"]]"#).claimed_commitment().unwrap_err(),
            ValidationError::InsufficientPublicInputs(1)
        );
        assert_eq!(
            parse("[]").claimed_commitment().unwrap_err(),
            ValidationError::InsufficientPublicInputs(0)
        );
    }

    #[test]
    fn non_numeric_tail_rejected() {
        let inputs = parse(r#"["1","abc"]"#);
        assert!(matches!(
            inputs.claimed_commitment(),
            Err(ValidationError::InvalidFieldElement { .. })
        ));
    }

    #[test]
    fn numbers_are_not_inputs() {
        assert!(serde_json::from_str::<PublicInputs>("[1,2]").is_err());
    }

    #[test]
    fn from_commitment_roundtrips_through_claim() {
        let c = Commitment::from_strings(&["9", "10"]).unwrap();
        assert_eq!(PublicInputs::from(&c).claimed_commitment().unwrap(), c);
    }
}

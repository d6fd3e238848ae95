//! Tolerance-based comparison of two named array sets.

use crate::dump::NamedArraySet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric comparison policy.
///
/// Kernel variants are rebuilt with different instruction selection and
/// reassociated reductions, so bit-exact equality is the exception; the
/// default absolute tolerance absorbs that while still catching real
/// divergence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparePolicy {
    /// Maximum absolute difference allowed per element.
    pub abs_epsilon: f64,
}

impl Default for ComparePolicy {
    fn default() -> Self {
        Self { abs_epsilon: 0.011 }
    }
}

impl ComparePolicy {
    /// Exact equality, no tolerance.
    pub fn strict() -> Self {
        Self { abs_epsilon: 0.0 }
    }

    pub fn absolute(abs_epsilon: f64) -> Self {
        Self { abs_epsilon }
    }
}

/// Outcome of comparing an expected against an actual array set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    Equal,
    /// A name occurs in exactly one of the two sets.
    KeySetMismatch { name: String },
    /// An array occurs in both sets with different lengths.
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    /// A pair of corresponding values differs beyond tolerance.
    ValueMismatch {
        name: String,
        index: usize,
        expected: f64,
        actual: f64,
    },
}

impl Verdict {
    pub fn is_equal(&self) -> bool {
        matches!(self, Verdict::Equal)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Equal => write!(f, "outputs match"),
            Verdict::KeySetMismatch { name } => {
                write!(f, "array `{name}` does not occur in both outputs")
            }
            Verdict::LengthMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "array `{name}` has different lengths ({expected} vs. {actual})"
            ),
            Verdict::ValueMismatch {
                name,
                index,
                expected,
                actual,
            } => write!(
                f,
                "array `{name}` differs at index {index} ({expected} != {actual})"
            ),
        }
    }
}

/// Compare two array sets element-wise under `policy`.
///
/// Key sets are checked first, then lengths across every shared key, then
/// values. The value scan short-circuits at the first element whose absolute
/// difference exceeds the tolerance. Pure; called several times per benchmark
/// with different `actual` inputs.
pub fn compare(expected: &NamedArraySet, actual: &NamedArraySet, policy: &ComparePolicy) -> Verdict {
    if let Some(name) = symmetric_difference(expected, actual) {
        return Verdict::KeySetMismatch { name };
    }

    // All shared keys are length-checked before any value is looked at, but
    // only the first offender is reported.
    let mut length_mismatch = None;
    for (name, expected_values) in expected.iter() {
        let actual_values = match actual.get(name) {
            Some(values) => values,
            None => continue,
        };
        if expected_values.len() != actual_values.len() && length_mismatch.is_none() {
            length_mismatch = Some(Verdict::LengthMismatch {
                name: name.to_string(),
                expected: expected_values.len(),
                actual: actual_values.len(),
            });
        }
    }
    if let Some(verdict) = length_mismatch {
        return verdict;
    }

    for (name, expected_values) in expected.iter() {
        let actual_values = match actual.get(name) {
            Some(values) => values,
            None => continue,
        };
        for (index, (e, a)) in expected_values.iter().zip(actual_values).enumerate() {
            if (e - a).abs() > policy.abs_epsilon {
                return Verdict::ValueMismatch {
                    name: name.to_string(),
                    index,
                    expected: *e,
                    actual: *a,
                };
            }
        }
    }

    Verdict::Equal
}

fn symmetric_difference(expected: &NamedArraySet, actual: &NamedArraySet) -> Option<String> {
    for name in actual.names() {
        if !expected.contains(name) {
            return Some(name.to_string());
        }
    }
    for name in expected.names() {
        if !actual.contains(name) {
            return Some(name.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(entries: &[(&str, &[f64])]) -> NamedArraySet {
        entries
            .iter()
            .map(|(name, values)| (name.to_string(), values.to_vec()))
            .collect()
    }

    #[test]
    fn test_equal_within_tolerance() {
        let expected = set(&[("A", &[1.0, 2.0])]);
        let actual = set(&[("A", &[1.005, 2.0])]);
        let policy = ComparePolicy::default();
        assert_eq!(compare(&expected, &actual, &policy), Verdict::Equal);
        // Equality is symmetric under swapping the operands.
        assert_eq!(compare(&actual, &expected, &policy), Verdict::Equal);
    }

    #[test]
    fn test_value_mismatch_beyond_tolerance() {
        let expected = set(&[("A", &[1.0, 2.0])]);
        let actual = set(&[("A", &[1.02, 2.0])]);
        assert_eq!(
            compare(&expected, &actual, &ComparePolicy::default()),
            Verdict::ValueMismatch {
                name: "A".into(),
                index: 0,
                expected: 1.0,
                actual: 1.02,
            }
        );
    }

    #[test]
    fn test_strict_degenerates_to_exact_equality() {
        let expected = set(&[("A", &[1.0])]);
        let actual = set(&[("A", &[1.0 + 1e-12])]);
        assert_eq!(compare(&expected, &actual, &ComparePolicy::default()), Verdict::Equal);
        assert!(matches!(
            compare(&expected, &actual, &ComparePolicy::strict()),
            Verdict::ValueMismatch { .. }
        ));
        assert_eq!(
            compare(&expected, &expected.clone(), &ComparePolicy::strict()),
            Verdict::Equal
        );
    }

    #[test]
    fn test_key_set_mismatch_reports_extra_key() {
        let expected = set(&[("A", &[1.0])]);
        let actual = set(&[("A", &[1.0]), ("B", &[2.0])]);
        assert_eq!(
            compare(&expected, &actual, &ComparePolicy::default()),
            Verdict::KeySetMismatch { name: "B".into() }
        );
    }

    #[test]
    fn test_length_mismatch_checked_before_values() {
        // `A` would fail the value check, but the length mismatch on `B` is
        // found during the length pass over all keys and reported first.
        let expected = set(&[("A", &[1.0]), ("B", &[1.0, 2.0])]);
        let actual = set(&[("A", &[5.0]), ("B", &[1.0])]);
        assert_eq!(
            compare(&expected, &actual, &ComparePolicy::default()),
            Verdict::LengthMismatch {
                name: "B".into(),
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn test_value_scan_short_circuits() {
        let expected = set(&[("A", &[1.0, 2.0, 3.0])]);
        let actual = set(&[("A", &[1.0, 9.0, 7.0])]);
        let verdict = compare(&expected, &actual, &ComparePolicy::default());
        assert_eq!(
            verdict,
            Verdict::ValueMismatch {
                name: "A".into(),
                index: 1,
                expected: 2.0,
                actual: 9.0,
            }
        );
    }
}

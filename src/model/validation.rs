//! The outcome of checking a `BayesianNetwork` for structural and probabilistic consistency.

use itertools::Itertools;

use std::fmt;

/// A single reason why a `BayesianNetwork` is not a valid model.
#[derive(Clone, Debug, PartialEq)]
pub enum Violation {

    /// The variable has no CPT attached
    MissingCpt(String),

    /// The CPT of `variable` is over `found`, but the variable and its parents are `expected`.
    /// This happens when edges are added after the CPT was attached.
    ScopeMismatch { variable: String, expected: Vec<String>, found: Vec<String> },

    /// For the parent assignment `parents`, the CPT of `variable` sums to `sum` instead of one
    NotNormalized { variable: String, parents: Vec<(String, String)>, sum: f64 },

    /// The variables involved in a directed cycle
    Cycle(Vec<String>),

}

impl fmt::Display for Violation {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Violation::MissingCpt(v) => write!(f, "no CPT for '{}'", v),
            Violation::ScopeMismatch { variable, expected, found } => write!(
                f, "CPT of '{}' is over [{}], expected [{}]",
                variable, found.join(", "), expected.join(", ")
            ),
            Violation::NotNormalized { variable, parents, sum } if parents.is_empty() => {
                write!(f, "CPT of '{}' sums to {}", variable, sum)
            },
            Violation::NotNormalized { variable, parents, sum } => write!(
                f, "CPT of '{}' sums to {} given {}",
                variable, sum, parents.iter().map(|(p, s)| format!("{}={}", p, s)).join(", ")
            ),
            Violation::Cycle(vars) => write!(f, "cycle through {}", vars.join(", ")),
        }
    }

}


/// Result of `BayesianNetwork::validate`.
#[derive(Clone, Debug, PartialEq)]
pub enum Validation {
    Valid,
    Invalid(Vec<Violation>),
}

impl Validation {

    /// Build a `Validation` from the collected violations
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            Validation::Valid
        } else {
            Validation::Invalid(violations)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    /// The violations found, empty if the network is valid
    pub fn violations(&self) -> &[Violation] {
        match self {
            Validation::Valid => &[],
            Validation::Invalid(v) => v,
        }
    }

}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_violations() {
        assert!(Validation::from_violations(vec![]).is_valid());

        let v = Validation::from_violations(vec![Violation::MissingCpt("A".into())]);
        assert!(!v.is_valid());
        assert_eq!(1, v.violations().len());
    }

    #[test]
    fn display() {
        let v = Violation::NotNormalized {
            variable: "B".into(),
            parents: vec![("A".into(), "Si".into())],
            sum: 0.5
        };
        assert_eq!("CPT of 'B' sums to 0.5 given A=Si", v.to_string());

        let v = Violation::ScopeMismatch {
            variable: "B".into(),
            expected: vec!["A".into(), "C".into(), "B".into()],
            found: vec!["A".into(), "B".into()]
        };
        assert_eq!("CPT of 'B' is over [A, B], expected [A, C, B]", v.to_string());
    }

}

//! Defines `TabularCpd`, the name-level description of a conditional probability table.
//!
//! A `TabularCpd` is how callers hand a CPT to a `BayesianNetwork`. Values are laid out the way
//! they are usually written down by hand: one row per state of the variable, one column per
//! assignment of the evidence variables, with the *last* evidence variable changing fastest.
//!
//! ```text
//!                 Lluvia=No  Lluvia=Si
//! CespedMojado=No    0.9        0.2
//! CespedMojado=Si    0.1        0.8
//! ```

use crate::factor::Table;
use crate::util::{PluviaError, Result};

use indexmap::IndexMap;
use ndarray::IxDyn;

#[derive(Clone, Debug, PartialEq)]
pub struct TabularCpd {

    /// Name of the variable the distribution is over
    variable: String,

    /// Number of states of `variable`
    variable_card: usize,

    /// One row per state of `variable`, one column per evidence assignment
    values: Vec<Vec<f64>>,

    /// Names of the conditioning variables, in column order
    evidence: Vec<String>,

    /// Number of states of each evidence variable
    evidence_card: Vec<usize>,

    /// Optional state labels, checked against the network when the CPD is attached
    state_names: IndexMap<String, Vec<String>>

}


impl TabularCpd {

    /// Describe a CPD for `variable` with no evidence (yet).
    ///
    /// # Args
    /// * `variable`: the name of the variable
    /// * `variable_card`: the number of states of the variable
    /// * `values`: one row per state of `variable`
    pub fn new(variable: &str, variable_card: usize, values: Vec<Vec<f64>>) -> Self {
        TabularCpd {
            variable: String::from(variable),
            variable_card,
            values,
            evidence: Vec::new(),
            evidence_card: Vec::new(),
            state_names: IndexMap::new()
        }
    }


    /// Condition the CPD on `evidence`, with `evidence_card[i]` states for `evidence[i]`.
    pub fn with_evidence(mut self, evidence: &[&str], evidence_card: &[usize]) -> Self {
        self.evidence = evidence.iter().map(|&e| String::from(e)).collect();
        self.evidence_card = evidence_card.to_vec();
        self
    }


    /// Label the states of `variable` (either the CPD variable or one of its evidence variables).
    pub fn with_state_names(mut self, variable: &str, states: &[&str]) -> Self {
        self.state_names.insert(
            String::from(variable),
            states.iter().map(|&s| String::from(s)).collect()
        );
        self
    }


    pub fn variable(&self) -> &str {
        &self.variable
    }


    pub fn variable_card(&self) -> usize {
        self.variable_card
    }


    pub fn evidence(&self) -> &[String] {
        &self.evidence
    }


    pub fn evidence_card(&self) -> &[usize] {
        &self.evidence_card
    }


    pub fn state_names(&self) -> &IndexMap<String, Vec<String>> {
        &self.state_names
    }


    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }


    /// Build the dense table of the CPD, with one axis per evidence variable followed by the axis
    /// of the variable itself.
    ///
    /// # Errors
    /// * `PluviaError::SchemaMismatch`, if the value matrix does not have `variable_card` rows of
    ///   one entry per evidence assignment, or the evidence names and cardinalities disagree
    pub fn to_table(&self) -> Result<Table> {
        if self.evidence.len() != self.evidence_card.len() {
            return Err(PluviaError::SchemaMismatch(format!(
                "{} evidence variables but {} evidence cardinalities for '{}'",
                self.evidence.len(), self.evidence_card.len(), self.variable
            )));
        }

        let columns: usize = self.evidence_card.iter().product();
        if self.values.len() != self.variable_card || self.values.iter().any(|r| r.len() != columns) {
            let found = self.values.iter().map(|r| r.len()).collect::<Vec<usize>>();
            return Err(PluviaError::SchemaMismatch(format!(
                "values of '{}' must be {} rows of {} columns, found rows of {:?}",
                self.variable, self.variable_card, columns, found
            )));
        }

        let mut shape = self.evidence_card.clone();
        shape.push(self.variable_card);

        // the column of an evidence assignment is its row-major offset
        let last = self.evidence_card.len();
        Ok(Table::from_shape_fn(IxDyn(&shape), |idx| {
            let col = self.evidence_card.iter()
                                        .enumerate()
                                        .fold(0, |acc, (i, &card)| acc * card + idx[i]);
            self.values[idx[last]][col]
        }))
    }

}


#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn root_table() {
        let cpd = TabularCpd::new("Lluvia", 2, vec![vec![0.7], vec![0.3]]);
        assert_eq!(array![0.7, 0.3].into_dyn(), cpd.to_table().unwrap());
    }

    #[test]
    fn conditional_table_is_transposed() {
        let cpd = TabularCpd::new("CespedMojado", 2, vec![vec![0.9, 0.2], vec![0.1, 0.8]])
            .with_evidence(&["Lluvia"], &[2]);

        assert_eq!(array![[0.9, 0.1], [0.2, 0.8]].into_dyn(), cpd.to_table().unwrap());
    }

    #[test]
    fn last_evidence_changes_fastest() {
        // columns: (A=0,B=0) (A=0,B=1) (A=0,B=2) (A=1,B=0) (A=1,B=1) (A=1,B=2)
        let cpd = TabularCpd::new("C", 2, vec![
            vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5],
            vec![1.0, 0.9, 0.8, 0.7, 0.6, 0.5],
        ]).with_evidence(&["A", "B"], &[2, 3]);

        let table = cpd.to_table().unwrap();
        assert_eq!(&[2, 3, 2], table.shape());
        assert_eq!(0.2, table[[0, 2, 0].as_ref()]);
        assert_eq!(0.3, table[[1, 0, 0].as_ref()]);
        assert_eq!(0.6, table[[1, 1, 1].as_ref()]);
    }

    #[test]
    fn shape_errors() {
        let cpd = TabularCpd::new("C", 2, vec![vec![0.5, 0.5], vec![0.5]])
            .with_evidence(&["A"], &[2]);
        assert!(matches!(cpd.to_table(), Err(PluviaError::SchemaMismatch(_))));

        let cpd = TabularCpd::new("C", 3, vec![vec![0.5], vec![0.5]]);
        assert!(matches!(cpd.to_table(), Err(PluviaError::SchemaMismatch(_))));

        let cpd = TabularCpd::new("C", 2, vec![vec![0.5, 0.5], vec![0.5, 0.5]])
            .with_evidence(&["A", "B"], &[2]);
        assert!(matches!(cpd.to_table(), Err(PluviaError::SchemaMismatch(_))));
    }

    #[test]
    fn state_names() {
        let cpd = TabularCpd::new("Lluvia", 2, vec![vec![0.7], vec![0.3]])
            .with_state_names("Lluvia", &["No", "Si"]);

        assert_eq!(&vec!["No".to_string(), "Si".to_string()], &cpd.state_names()["Lluvia"]);
    }

}

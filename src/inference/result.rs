//! Defines `QueryResult`, the normalized distribution answering a query, addressable by variable
//! names and state labels.

use crate::factor::{Factor, Table};
use crate::util::{PluviaError, Result};
use crate::variable::Variable;

use itertools::Itertools;
use ndarray::IxDyn;

use std::fmt;


/// The normalized distribution over the query variables, in the order they were requested.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult {

    /// Names of the query variables, in axis order
    variables: Vec<String>,

    /// State labels of each query variable
    states: Vec<Vec<String>>,

    /// The distribution itself, with one axis per query variable
    factor: Factor

}


impl QueryResult {

    pub(crate) fn new(variables: Vec<String>, states: Vec<Vec<String>>, factor: Factor) -> Self {
        QueryResult { variables, states, factor }
    }


    /// Names of the query variables, in the order they were requested
    pub fn variables(&self) -> &[String] {
        &self.variables
    }


    /// State labels of the query variable `name`
    pub fn states(&self, name: &str) -> Option<&[String]> {
        self.position(name).map(|i| self.states[i].as_slice())
    }


    /// The probabilities in row-major order: the last query variable changes fastest and states
    /// follow their declaration order. A query over no variables has the single value 1.
    pub fn values(&self) -> Vec<f64> {
        self.factor.table().iter().cloned().collect()
    }


    pub fn table(&self) -> &Table {
        self.factor.table()
    }


    pub fn factor(&self) -> &Factor {
        &self.factor
    }


    /// The probability of a full assignment of the query variables, given as
    /// ```(variable, state)``` pairs in any order.
    ///
    /// # Errors
    /// * `PluviaError::UnknownVariable` if a name is not a query variable
    /// * `PluviaError::InvalidState` if a label is not a state of its variable
    /// * `PluviaError::IncompleteAssignment` if a query variable is not assigned
    /// * `PluviaError::DuplicateVariable` if a variable is assigned twice
    pub fn probability_of(&self, assignment: &[(&str, &str)]) -> Result<f64> {
        let mut idx: Vec<Option<usize>> = vec![None; self.variables.len()];

        for &(name, state) in assignment {
            let i = self.position(name)
                        .ok_or_else(|| PluviaError::UnknownVariable(String::from(name)))?;
            let s = self.states[i].iter()
                                  .position(|l| l == state)
                                  .ok_or_else(|| PluviaError::InvalidState {
                                      variable: String::from(name),
                                      state: String::from(state)
                                  })?;
            if idx[i].replace(s).is_some() {
                return Err(PluviaError::DuplicateVariable(String::from(name)));
            }
        }

        let idx = idx.into_iter()
                     .collect::<Option<Vec<usize>>>()
                     .ok_or(PluviaError::IncompleteAssignment)?;

        Ok(self.factor.table()[IxDyn(&idx)])
    }


    /// Iterate over every assignment of the query variables (as state labels) with its
    /// probability, in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (Vec<&str>, f64)> + '_ {
        self.factor.table().indexed_iter().map(move |(idx, &p)| {
            let labels = (0..self.variables.len()).map(|i| self.states[i][idx[i]].as_str())
                                                  .collect();
            (labels, p)
        })
    }


    /// The most probable assignment and its probability. Ties go to the assignment that comes
    /// first in row-major order.
    pub fn argmax(&self) -> Option<(Vec<&str>, f64)> {
        self.iter().fold(None, |best, (labels, p)| match best {
            Some((_, q)) if p <= q => best,
            _ => Some((labels, p))
        })
    }


    /// The marginal distribution of the query variable `name`.
    ///
    /// # Errors
    /// * `PluviaError::UnknownVariable` if `name` is not a query variable
    pub fn marginal(&self, name: &str) -> Result<QueryResult> {
        let i = self.position(name)
                    .ok_or_else(|| PluviaError::UnknownVariable(String::from(name)))?;
        let keep: Variable = self.factor.scope()[i];

        let mut factor = self.factor.clone();
        for v in self.factor.scope().iter().filter(|&&v| v != keep) {
            factor = factor.marginalize(*v)?;
        }

        Ok(QueryResult {
            variables: vec![self.variables[i].clone()],
            states: vec![self.states[i].clone()],
            factor
        })
    }


    fn position(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == name)
    }

}


/// Renders the distribution as a grid, one row per assignment:
///
/// ```text
/// +------------------+-------------------+
/// | CespedMojado     | phi(CespedMojado) |
/// +==================+===================+
/// | CespedMojado(No) |            0.6900 |
/// +------------------+-------------------+
/// | CespedMojado(Si) |            0.3100 |
/// +------------------+-------------------+
/// ```
impl fmt::Display for QueryResult {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut header: Vec<String> = self.variables.clone();
        header.push(format!("phi({})", self.variables.join(",")));

        let rows: Vec<Vec<String>> = self.iter().map(|(labels, p)| {
            let mut row: Vec<String> = self.variables.iter()
                                                     .zip(labels)
                                                     .map(|(v, s)| format!("{}({})", v, s))
                                                     .collect();
            row.push(format!("{:.4}", p));
            row
        }).collect();

        let widths: Vec<usize> = (0..header.len()).map(|c| {
            rows.iter().map(|r| r[c].len()).chain(Some(header[c].len())).max().unwrap_or(0)
        }).collect();

        let rule = |fill: char| {
            format!("+{}+", widths.iter().map(|&w| fill.to_string().repeat(w + 2)).join("+"))
        };

        // labels to the left, probabilities to the right
        let line = |cells: &[String]| {
            let last = cells.len() - 1;
            let inner = cells.iter().enumerate().map(|(c, cell)| {
                if c == last {
                    format!(" {:>w$} ", cell, w = widths[c])
                } else {
                    format!(" {:<w$} ", cell, w = widths[c])
                }
            }).join("|");
            format!("|{}|", inner)
        };

        writeln!(f, "{}", rule('-'))?;
        writeln!(f, "{}", line(header.as_slice()))?;
        write!(f, "{}", rule('='))?;
        for row in rows.iter() {
            writeln!(f)?;
            writeln!(f, "{}", line(row.as_slice()))?;
            write!(f, "{}", rule('-'))?;
        }

        Ok(())
    }

}

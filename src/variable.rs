//! Definition of the variable module
//!
//! A `Variable` represents a discrete random variable in a Bayesian network. `Variable`s are
//! lightweight, copyable handles: the human readable name and the state labels of a `Variable`
//! are owned by the `BayesianNetwork` that declared it, and only the state *indices* are used
//! during inference.

use ndarray::{Dimension, IxDyn};

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of unique `Variable` ids
static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// A discrete random variable with a fixed number of states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {

    /// Process-wide unique identifier
    id: usize,

    /// The number of states the `Variable` can take
    cardinality: usize

}

impl Variable {

    /// Construct a new `Variable` with two states
    pub fn binary() -> Self {
        Variable::discrete(2)
    }

    /// Construct a new `Variable` with `cardinality` states, tagged ```0..cardinality```.
    ///
    /// # Panics
    /// if `cardinality` is zero; a random variable must be able to take at least one value.
    pub fn discrete(cardinality: usize) -> Self {
        assert!(cardinality > 0, "a Variable must have at least one state");

        Variable {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            cardinality
        }
    }

    /// Get the unique id of the `Variable`
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get the number of states of the `Variable`
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }
}

impl fmt::Display for Variable {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "X{}", self.id)
    }

}


/// A (possibly partial) assignment of state indices to `Variable`s.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assignment {
    values: HashMap<Variable, usize>
}

impl Assignment {

    /// Construct an empty `Assignment`
    pub fn new() -> Self {
        Assignment { values: HashMap::new() }
    }

    /// Assign state `value` to `var`, replacing any previous assignment
    pub fn set(&mut self, var: &Variable, value: usize) {
        self.values.insert(*var, value);
    }

    /// Get the state assigned to `var`, if any
    pub fn get(&self, var: &Variable) -> Option<&usize> {
        self.values.get(var)
    }

    /// Remove the assignment to `var`
    pub fn remove(&mut self, var: &Variable) -> Option<usize> {
        self.values.remove(var)
    }

    pub fn contains(&self, var: &Variable) -> bool {
        self.values.contains_key(var)
    }

    /// The `Variable`s that have been assigned
    pub fn scope(&self) -> impl Iterator<Item = &Variable> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &usize)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}


/// Enumerate every complete `Assignment` to `scope`.
///
/// Assignments are produced in row-major order: the last `Variable` of the scope changes fastest.
/// This matches the memory layout of a `Factor` table over the same scope. An empty scope has
/// exactly one (empty) assignment.
pub fn all_assignments(scope: &[Variable]) -> impl Iterator<Item = Assignment> + '_ {
    let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();

    ndarray::indices(IxDyn(&shape)).into_iter().map(move |idx| {
        let mut assn = Assignment::new();
        for (var, &val) in scope.iter().zip(idx.slice()) {
            assn.set(var, val);
        }
        assn
    })
}


// Unit Tests for the Variable struct.
#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn unique_ids() {
        let a = Variable::binary();
        let b = Variable::binary();

        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
        assert_eq!(2, a.cardinality());
        assert_eq!(5, Variable::discrete(5).cardinality());
    }

    #[test]
    #[should_panic]
    fn empty_domain() {
        let _ = Variable::discrete(0);
    }

    #[test]
    fn assignment() {
        let a = Variable::binary();
        let b = Variable::discrete(3);

        let mut assn = Assignment::new();
        assert!(assn.is_empty());

        assn.set(&a, 1);
        assn.set(&b, 2);
        assert_eq!(Some(&1), assn.get(&a));
        assert_eq!(Some(&2), assn.get(&b));
        assert_eq!(2, assn.len());

        assn.set(&b, 0);
        assert_eq!(Some(&0), assn.get(&b));

        assert_eq!(Some(1), assn.remove(&a));
        assert!(!assn.contains(&a));
    }

    #[test]
    fn enumerate_row_major() {
        let a = Variable::binary();
        let b = Variable::discrete(3);
        let scope = vec![a, b];

        let all: Vec<(usize, usize)> = all_assignments(&scope)
            .map(|assn| (*assn.get(&a).unwrap(), *assn.get(&b).unwrap()))
            .collect();

        assert_eq!(vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)], all);
    }

    #[test]
    fn enumerate_empty_scope() {
        let all: Vec<Assignment> = all_assignments(&[]).collect();
        assert_eq!(1, all.len());
        assert!(all[0].is_empty());
    }

}

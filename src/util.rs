//! Defines the `Error` type for the pluvia library

use crate::model::validation::Violation;

use itertools::Itertools;
use thiserror::Error;

use std::result;

pub type Result<T> = result::Result<T, PluviaError>;

/// Tolerance used when checking that a conditional distribution sums to one.
pub const TOLERANCE: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum PluviaError {

    /// Adding the edge ```parent -> child``` would introduce a directed cycle
    #[error("Adding the edge {parent} -> {child} would create a cycle")]
    CycleDetected { parent: String, child: String },

    /// The shape of a CPT disagrees with the declared parents or cardinalities
    #[error("CPT does not match the network: {0}")]
    SchemaMismatch(String),

    /// A query was attempted against a network that failed validation
    #[error("The network is not a valid model: {}", .0.iter().join("; "))]
    InvalidModel(Vec<Violation>),

    /// A name that was never declared in the network
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    /// A state that is not among the declared states of the variable
    #[error("'{state}' is not a state of variable '{variable}'")]
    InvalidState { variable: String, state: String },

    /// Two factors disagree on the cardinality of a shared variable, or a table does not have the
    /// shape of its scope
    #[error("Dimension mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch { expected: Vec<usize>, found: Vec<usize> },

    /// Normalizing a factor whose entries sum to zero, e.g. evidence with zero probability
    #[error("Cannot normalize a distribution with zero total mass")]
    DegenerateDistribution,

    /// Represents a variable that was present multiple times in a situation where it should only
    /// have been present once
    #[error("Variable '{0}' was given more than once")]
    DuplicateVariable(String),

    /// A state label declared twice for the same variable
    #[error("State '{state}' is declared twice for variable '{variable}'")]
    DuplicateState { variable: String, state: String },

    /// A variable declared without any states
    #[error("Variable '{0}' must have at least one state")]
    EmptyDomain(String),

    /// A query variable that is also observed in the evidence
    #[error("Variable '{0}' is both queried and observed")]
    QueryEvidenceOverlap(String),

    /// Represents an incomplete assignment where a complete assignment was required.
    #[error("Missing assignments to the required variables")]
    IncompleteAssignment,

    /// An explicit elimination order that leaves out some of the variables to eliminate
    #[error("Elimination order does not mention: {}", .0.join(", "))]
    IncompleteEliminationOrder(Vec<String>),

    /// Represents an error where a certain constraint on a scope was not satisfied
    #[error("Provided scope did not satisfy constraints: {0}")]
    InvalidScope(String),

    /// Factor tables hold non-negative, finite values only
    #[error("Encountered a negative or non-finite value")]
    NegativeValue,

    /// A table declared as a CPD that does not sum to one for some parent assignment
    #[error("Not a conditional distribution: {0}")]
    NotNormalized(String),

    /// Represents an attempt to initialize a variable with an incompatible `Initialization`
    #[error("An invalid initialization was provided: {0}")]
    InvalidInitialization(String),

}

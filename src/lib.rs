//! Exact inference for discrete Bayesian networks.
//!
//! A `BayesianNetwork` is built from named variables, edges and conditional probability tables;
//! `VariableElimination` then answers posterior, marginal and MAP queries over it.

pub mod cpd;
pub mod evidence;
pub mod factor;
pub mod inference;
pub mod init;
pub mod model;
pub mod util;
pub mod variable;

pub use crate::cpd::TabularCpd;
pub use crate::evidence::Evidence;
pub use crate::inference::{ConditionalInferenceEngine, EliminationOrder, MapInferenceEngine,
                           QueryResult, VariableElimination};
pub use crate::init::Initialization;
pub use crate::model::{BayesianNetwork, Validation, Violation};
pub use crate::util::{PluviaError, Result};

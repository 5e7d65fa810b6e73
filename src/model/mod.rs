//! Defines the `BayesianNetwork`, a directed graphical model representing the factorization of a
//! probability distribution P, and the `Validation` it reports about itself.

pub mod directed;
pub mod validation;

pub use self::directed::BayesianNetwork;
pub use self::validation::{Validation, Violation};

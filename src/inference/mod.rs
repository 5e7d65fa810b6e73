//! Defines the interface to inference engines

use crate::evidence::Evidence;
use crate::util::Result;

use indexmap::IndexMap;

mod ordering;
mod result;
mod variable_elimination;

pub use self::ordering::EliminationOrder;
pub use self::result::QueryResult;
pub use self::variable_elimination::VariableElimination;


/// A `ConditionalInferenceEngine` is capable of answering Conditional Probability Queries of the form:
///     ```P(Y | E = e)```
///
/// Engines are read-only: the evidence `e` is given with each query.
pub trait ConditionalInferenceEngine {

    /// Infer the joint distribution ```P(variables | evidence)```
    fn infer(&self, variables: &[&str], evidence: &Evidence) -> Result<QueryResult>;

}


/// A `MapInferenceEngine` is capable of answering Maximum a posteriori queries:
///     ```MAP(Y | E = e) = argmax_y P(Y = y | E = e)```
pub trait MapInferenceEngine {

    /// Infer the most probable assignment `Y = y` given the evidence, as state labels by name
    fn infer_map(&self, variables: &[&str], evidence: &Evidence) -> Result<IndexMap<String, String>>;

}

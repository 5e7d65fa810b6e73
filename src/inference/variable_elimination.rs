//! Defines a `ConditionalInferenceEngine` that uses exact inference by variable elimination to
//! answer conditional inference queries.
//!
//! Implementation of Koller & Friedman Algorithm 9.1 - Sum-Product-VE

use crate::evidence::Evidence;
use crate::factor::Factor;
use crate::model::{BayesianNetwork, Validation};
use crate::util::{PluviaError, Result};
use crate::variable::Variable;
use super::{ConditionalInferenceEngine, EliminationOrder, MapInferenceEngine, QueryResult};

use indexmap::IndexMap;
use itertools::Itertools;
use tracing::{debug, instrument, trace};


/// Exact inference over a validated `BayesianNetwork`.
///
/// The engine borrows the network, so the network cannot change while the engine exists. Queries
/// take `&self` and share no state, so one engine may serve several threads at once.
#[derive(Debug)]
pub struct VariableElimination<'a> {

    /// The network whose CPDs form the initial 'bag of factors'
    model: &'a BayesianNetwork,

    /// How hidden variables are ordered for elimination
    order: EliminationOrder

}


/// A query with its names resolved and the evidence applied
struct Prepared {
    query: Vec<Variable>,
    factors: Vec<Factor>,
    hidden: Vec<Variable>
}


impl<'a> VariableElimination<'a> {

    /// Build an engine for `model`, using the default `EliminationOrder`.
    ///
    /// # Errors
    /// * `PluviaError::InvalidModel` with every violation if `model` does not validate
    pub fn new(model: &'a BayesianNetwork) -> Result<Self> {
        if let Validation::Invalid(violations) = model.validate() {
            return Err(PluviaError::InvalidModel(violations));
        }

        debug!(variables = model.num_variables(), "built variable elimination engine");
        Ok(VariableElimination { model, order: EliminationOrder::default() })
    }


    /// Use `order` to pick the elimination order of later queries
    pub fn with_order(mut self, order: EliminationOrder) -> Self {
        self.order = order;
        self
    }


    pub fn order(&self) -> &EliminationOrder {
        &self.order
    }


    /// Compute the posterior ```P(variables | evidence)```.
    ///
    /// # Args
    /// * `variables`: names of the query variables; the result has its axes in this order
    /// * `evidence`: the observed states
    ///
    /// # Returns
    /// the normalized joint distribution of `variables`. With no query variables, the result is
    /// the scalar 1.
    ///
    /// # Errors
    /// * `PluviaError::UnknownVariable` / `PluviaError::InvalidState` for bad names
    /// * `PluviaError::DuplicateVariable` if a query variable is repeated
    /// * `PluviaError::QueryEvidenceOverlap` if a query variable is also observed
    /// * `PluviaError::IncompleteEliminationOrder` if a custom order leaves out hidden variables
    /// * `PluviaError::DegenerateDistribution` if the evidence has probability zero
    #[instrument(level = "debug", skip(self, evidence), fields(observed = evidence.len()))]
    pub fn query(&self, variables: &[&str], evidence: &Evidence) -> Result<QueryResult> {
        let prepared = self.prepare(variables, evidence)?;

        let phi_star = self.eliminate(prepared.factors, &prepared.hidden)?;

        // now we have an unnormalized distribution, over the query variables in some order. The
        // partition function turns it into the conditional probability.
        let phi = phi_star.permute(&prepared.query)?.normalize()?;

        let states = prepared.query.iter()
                                   .map(|v| self.model.states(v).map(|s| s.to_vec()).unwrap_or_default())
                                   .collect();
        let names = variables.iter().map(|&v| String::from(v)).collect();

        debug!(entries = phi.len(), "answered query");
        Ok(QueryResult::new(names, states, phi))
    }


    /// Compute the posterior marginal of each query variable separately.
    ///
    /// # Errors
    /// Same as `query`
    pub fn query_marginals(&self, variables: &[&str], evidence: &Evidence) -> Result<IndexMap<String, QueryResult>> {
        // check the whole request up front, so duplicates are caught
        self.prepare(variables, evidence)?;

        variables.iter()
                 .map(|&v| self.query(&[v], evidence).map(|r| (String::from(v), r)))
                 .collect()
    }


    /// Compute the most probable joint assignment ```argmax_y P(Y = y | evidence)``` of the query
    /// variables. Ties go to the assignment that comes first in row-major order.
    ///
    /// # Errors
    /// Same as `query`
    pub fn map_query(&self, variables: &[&str], evidence: &Evidence) -> Result<IndexMap<String, String>> {
        let result = self.query(variables, evidence)?;

        let map = match result.argmax() {
            Some((labels, _)) => variables.iter()
                                          .zip(labels)
                                          .map(|(&v, s)| (String::from(v), String::from(s)))
                                          .collect(),
            None => IndexMap::new()
        };

        Ok(map)
    }


    /// Compute ```P(evidence)```, summing every other variable out. The empty evidence has
    /// probability 1.
    ///
    /// # Errors
    /// * `PluviaError::UnknownVariable` / `PluviaError::InvalidState` for bad names
    pub fn probability_of_evidence(&self, evidence: &Evidence) -> Result<f64> {
        let prepared = self.prepare(&[], evidence)?;
        let phi = self.eliminate(prepared.factors, &prepared.hidden)?;

        Ok(phi.total())
    }


    /// The names of the variables `query` would eliminate, in the order it would eliminate them.
    ///
    /// # Errors
    /// Same as `query`, except `PluviaError::DegenerateDistribution`
    pub fn elimination_order(&self, variables: &[&str], evidence: &Evidence) -> Result<Vec<String>> {
        let prepared = self.prepare(variables, evidence)?;
        let order = self.order.order(self.model, &prepared.factors, &prepared.hidden)?;

        Ok(order.iter()
                .filter_map(|v| self.model.lookup_name(v))
                .map(String::from)
                .collect())
    }


    /// Resolve the query, reduce every CPD by the evidence and find the hidden variables
    fn prepare(&self, variables: &[&str], evidence: &Evidence) -> Result<Prepared> {
        let query = variables.iter()
                             .map(|v| self.model.resolve(v))
                             .collect::<Result<Vec<Variable>>>()?;

        if let Some(dup) = variables.iter().duplicates().next() {
            return Err(PluviaError::DuplicateVariable(dup.to_string()));
        }

        let assn = self.model.assignment(evidence)?;

        if let Some(name) = query.iter()
                                 .zip(variables)
                                 .find(|(v, _)| assn.contains(v))
                                 .map(|(_, &name)| name) {
            return Err(PluviaError::QueryEvidenceOverlap(String::from(name)));
        }

        // reduce the provided model with the evidence - these are the factors we will use for
        // variable elimination
        let factors = self.model.factors()
                                .iter()
                                .map(|f| f.reduce(&assn))
                                .collect::<Result<Vec<Factor>>>()?;

        let hidden = self.model.handles()
                               .into_iter()
                               .filter(|v| !query.contains(v) && !assn.contains(v))
                               .collect();

        Ok(Prepared { query, factors, hidden })
    }


    /// Sum the `hidden` variables out of the product of `factors`
    fn eliminate(&self, factors: Vec<Factor>, hidden: &[Variable]) -> Result<Factor> {
        let order = self.order.order(self.model, &factors, hidden)?;

        let mut phis = factors;
        for &var in order.iter() {
            // time to get rid of var
            let (phi_1prime, phi_2prime): (Vec<Factor>, Vec<Factor>) = phis
                                           .into_iter()
                                           .partition(|f| f.contains(&var));

            let count = phi_1prime.len();

            // product step - multiply factors with var
            let psi = phi_1prime.iter()
                                .try_fold(Factor::identity(), |acc, phi| acc.product(phi))?;

            // sum step - marginalize psi over var
            let tau = psi.marginalize(var)?;

            trace!(
                variable = self.model.lookup_name(&var).unwrap_or_default(),
                factors = count,
                scope = tau.scope().len(),
                "eliminated variable"
            );

            phis = phi_2prime;
            phis.push(tau);
        }

        // multiply together remaining phis
        phis.iter().try_fold(Factor::identity(), |acc, phi| acc.product(phi))
    }

}


impl<'a> ConditionalInferenceEngine for VariableElimination<'a> {

    fn infer(&self, variables: &[&str], evidence: &Evidence) -> Result<QueryResult> {
        self.query(variables, evidence)
    }

}


impl<'a> MapInferenceEngine for VariableElimination<'a> {

    fn infer_map(&self, variables: &[&str], evidence: &Evidence) -> Result<IndexMap<String, String>> {
        self.map_query(variables, evidence)
    }

}

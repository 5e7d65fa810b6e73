//! Defines a `BayesianNetwork`, a directed model that represents the factorization of a
//! probability distribution P into one conditional probability table per variable.

use crate::cpd::TabularCpd;
use crate::evidence::Evidence;
use crate::factor::Factor;
use crate::init::Initialization;
use crate::util::{PluviaError, Result, TOLERANCE};
use crate::variable::{all_assignments, Assignment, Variable};
use super::validation::{Validation, Violation};

use bidir_map::BidirMap;
use indexmap::IndexMap;
use itertools::Itertools;
use tracing::debug;

use std::collections::HashSet;
use std::fmt;


/// Everything the network knows about one `Variable`
struct Node {

    /// Labels of the states, in declaration order
    states: Vec<String>,

    /// Parents, in the order the edges were added
    parents: Vec<Variable>,

    children: Vec<Variable>,

    /// The CPD ```P(X | Pa(X))```, with scope ```Pa ++ [X]``` where ```Pa``` is the evidence
    /// order of the CPT it was built from
    cpd: Option<Factor>

}


/// Represents a Bayesian Network - a Directed Probabilistic Graphical Model.
///
/// # Representation
/// The network keeps its `Variable`s in declaration order along with their parents, children and
/// CPDs. Edges are checked for cycles as they are added, so the graph is a DAG at all times.
/// Names and state labels are only used at the boundary of the API; internally a state is its
/// index in the declared label list.
///
/// # Example
/// ```
/// use pluvia::{BayesianNetwork, TabularCpd};
///
/// let mut net = BayesianNetwork::new();
/// net.add_variable("Lluvia", &["No", "Si"]).unwrap();
/// net.add_variable("CespedMojado", &["No", "Si"]).unwrap();
/// net.add_edge("Lluvia", "CespedMojado").unwrap();
///
/// net.set_cpt(TabularCpd::new("Lluvia", 2, vec![vec![0.7], vec![0.3]])).unwrap();
/// net.set_cpt(
///     TabularCpd::new("CespedMojado", 2, vec![vec![0.9, 0.2], vec![0.1, 0.8]])
///         .with_evidence(&["Lluvia"], &[2])
/// ).unwrap();
///
/// assert!(net.validate().is_valid());
/// ```
pub struct BayesianNetwork {

    /// The `Variable`s comprising the network, in declaration order
    graph: IndexMap<Variable, Node>,

    /// The user-defined names of each `Variable`. This is a two way lookup ```(`Variable`->Name)```
    /// and ```(Name->`Variable`)```
    names: BidirMap<Variable, String>

}


impl BayesianNetwork {

    /// Construct an empty `BayesianNetwork`
    pub fn new() -> Self {
        BayesianNetwork { graph: IndexMap::new(), names: BidirMap::new() }
    }


    /// Declare a new variable with the given, ordered state labels.
    ///
    /// # Returns
    /// the handle of the new `Variable`
    ///
    /// # Errors
    /// * `PluviaError::DuplicateVariable` if `name` is already declared
    /// * `PluviaError::EmptyDomain` if `states` is empty
    /// * `PluviaError::DuplicateState` if a label appears twice
    pub fn add_variable(&mut self, name: &str, states: &[&str]) -> Result<Variable> {
        if self.lookup_variable(name).is_some() {
            return Err(PluviaError::DuplicateVariable(String::from(name)));
        }

        if states.is_empty() {
            return Err(PluviaError::EmptyDomain(String::from(name)));
        }

        if let Some(dup) = states.iter().duplicates().next() {
            return Err(PluviaError::DuplicateState {
                variable: String::from(name),
                state: dup.to_string()
            });
        }

        let var = Variable::discrete(states.len());
        let node = Node {
            states: states.iter().map(|&s| String::from(s)).collect(),
            parents: Vec::new(),
            children: Vec::new(),
            cpd: None
        };

        self.graph.insert(var, node);
        self.names.insert(var, String::from(name));

        debug!(variable = name, states = states.len(), "declared variable");
        Ok(var)
    }


    /// Add the edge ```parent -> child```.
    ///
    /// Adding an edge that already exists does nothing. A CPT already attached to `child` is kept
    /// as is; `validate` reports it until a CPT over the new parents is set.
    ///
    /// # Errors
    /// * `PluviaError::UnknownVariable` if either name is not declared
    /// * `PluviaError::CycleDetected` if `parent` is reachable from `child`. The network is left
    ///   unchanged.
    pub fn add_edge(&mut self, parent: &str, child: &str) -> Result<()> {
        let p = self.resolve(parent)?;
        let c = self.resolve(child)?;

        if p == c || self.reaches(c, p) {
            return Err(PluviaError::CycleDetected {
                parent: String::from(parent),
                child: String::from(child)
            });
        }

        if self.graph[&c].parents.contains(&p) {
            return Ok(());
        }

        if let Some(node) = self.graph.get_mut(&c) {
            node.parents.push(p);
        }
        if let Some(node) = self.graph.get_mut(&p) {
            node.children.push(c);
        }

        debug!(parent, child, "added edge");
        Ok(())
    }


    /// Add several edges, in order.
    ///
    /// Stops at the first edge that fails; the edges before it stay in the network.
    pub fn add_edges_from(&mut self, edges: &[(&str, &str)]) -> Result<()> {
        for &(parent, child) in edges {
            self.add_edge(parent, child)?;
        }
        Ok(())
    }


    /// Attach a CPT to the variable it describes, replacing any previous one.
    ///
    /// The values need not be normalized yet; `validate` reports CPTs that are not.
    ///
    /// # Errors
    /// * `PluviaError::UnknownVariable` if the CPT mentions an undeclared variable
    /// * `PluviaError::SchemaMismatch` if the evidence of the CPT is not exactly the parents of the
    ///   variable, a cardinality disagrees, the value matrix has the wrong shape or the CPT's state
    ///   names differ from the declared ones
    /// * `PluviaError::NegativeValue` if a value is negative
    pub fn set_cpt(&mut self, cpd: TabularCpd) -> Result<()> {
        let var = self.resolve(cpd.variable())?;
        let node = &self.graph[&var];

        if cpd.variable_card() != node.states.len() {
            return Err(PluviaError::SchemaMismatch(format!(
                "'{}' has {} states, the CPT has {}",
                cpd.variable(), node.states.len(), cpd.variable_card()
            )));
        }

        let evidence = cpd.evidence().iter()
                                     .map(|e| self.resolve(e))
                                     .collect::<Result<Vec<Variable>>>()?;

        let declared: HashSet<&Variable> = node.parents.iter().collect();
        let given: HashSet<&Variable> = evidence.iter().collect();
        if declared != given || evidence.len() != given.len() {
            return Err(PluviaError::SchemaMismatch(format!(
                "the evidence of '{}' is [{}], but its parents are [{}]",
                cpd.variable(),
                cpd.evidence().join(", "),
                self.names_of(&node.parents).join(", ")
            )));
        }

        for (e, (name, &card)) in evidence.iter().zip(cpd.evidence().iter().zip(cpd.evidence_card())) {
            if e.cardinality() != card {
                return Err(PluviaError::SchemaMismatch(format!(
                    "'{}' has {} states, the CPT of '{}' assumes {}",
                    name, e.cardinality(), cpd.variable(), card
                )));
            }
        }

        for (name, labels) in cpd.state_names() {
            let v = self.resolve(name)?;
            if v != var && !evidence.contains(&v) {
                return Err(PluviaError::SchemaMismatch(format!(
                    "state names given for '{}', which is not in the CPT of '{}'",
                    name, cpd.variable()
                )));
            }
            if self.graph[&v].states != *labels {
                return Err(PluviaError::SchemaMismatch(format!(
                    "the states of '{}' are [{}], the CPT uses [{}]",
                    name, self.graph[&v].states.join(", "), labels.join(", ")
                )));
            }
        }

        let mut scope = evidence;
        scope.push(var);
        let factor = Factor::new(scope, cpd.to_table()?)?;

        if let Some(node) = self.graph.get_mut(&var) {
            node.cpd = Some(factor);
        }

        debug!(variable = cpd.variable(), "attached CPT");
        Ok(())
    }


    /// Attach a generated CPT over the current parents of `name`.
    ///
    /// # Errors
    /// * `PluviaError::UnknownVariable` if `name` is not declared
    /// * `PluviaError::InvalidInitialization` if `init` does not fit the variable
    pub fn initialize_cpt(&mut self, name: &str, init: Initialization) -> Result<()> {
        let var = self.resolve(name)?;
        let factor = init.build_cpd(var, &self.graph[&var].parents)?;

        if let Some(node) = self.graph.get_mut(&var) {
            node.cpd = Some(factor);
        }

        debug!(variable = name, "initialized CPT");
        Ok(())
    }


    /// Check the network for structural and probabilistic consistency.
    ///
    /// Every variable must have a CPT over itself and its parents, and each CPT must sum to one
    /// (within `TOLERANCE`) for every assignment of the parents. All violations are collected.
    pub fn validate(&self) -> Validation {
        let mut violations = Vec::new();

        if let Err(cycle) = self.sort_topologically() {
            violations.push(Violation::Cycle(self.names_of(&cycle)));
        }

        for (&var, node) in self.graph.iter() {
            let name = self.name(&var);

            let cpd = match node.cpd {
                Some(ref cpd) => cpd,
                None => {
                    violations.push(Violation::MissingCpt(name));
                    continue;
                }
            };

            let scope = cpd.scope();
            let matches = scope.len() == node.parents.len() + 1
                && cpd.contains(&var)
                && node.parents.iter().all(|p| cpd.contains(p));

            if !matches {
                let mut expected = node.parents.clone();
                expected.push(var);
                violations.push(Violation::ScopeMismatch {
                    variable: name,
                    expected: self.names_of(&expected),
                    found: self.names_of(scope)
                });
                continue;
            }

            // the sums come out in row-major order over the scope without `var`
            let parents: Vec<Variable> = scope.iter().cloned().filter(|&v| v != var).collect();
            let sums = match cpd.conditional_sums(var) {
                Ok(sums) => sums,
                Err(_) => continue
            };

            for (assn, sum) in all_assignments(&parents).zip(sums) {
                if (sum - 1.0).abs() > TOLERANCE {
                    violations.push(Violation::NotNormalized {
                        variable: name.clone(),
                        parents: self.labels_of(&parents, &assn),
                        sum
                    });
                }
            }
        }

        debug!(violations = violations.len(), "validated network");
        Validation::from_violations(violations)
    }


    /// Determine the probability of a full assignment to the variables of the network.
    ///
    /// Specifically, this computes ```P(zeta) = prod_X P(X | Pa(X))``` by the chain rule.
    ///
    /// # Errors
    /// * `PluviaError::InvalidModel` if the network does not validate
    /// * `PluviaError::UnknownVariable` / `PluviaError::InvalidState` for bad names
    /// * `PluviaError::IncompleteAssignment` if some variable is not assigned
    pub fn probability(&self, assignment: &Evidence) -> Result<f64> {
        if let Validation::Invalid(violations) = self.validate() {
            return Err(PluviaError::InvalidModel(violations));
        }

        let assn = self.assignment(assignment)?;
        if assn.len() != self.num_variables() {
            return Err(PluviaError::IncompleteAssignment);
        }

        // for every variable in the graph
        self.graph.values()
                  // get the probability of the assignment
                  .filter_map(|node| node.cpd.as_ref())
                  .map(|cpd| cpd.value(&assn))
                  // and multiply those probability by the chain rule
                  // but if there are any errors, just return the error
                  .fold(Ok(1.0), |acc, val| acc.and_then(|p| val.map(|v| p * v)))
    }


    /// Translate named evidence into an `Assignment` of state indices.
    ///
    /// # Errors
    /// * `PluviaError::UnknownVariable` if a variable is not declared
    /// * `PluviaError::InvalidState` if a state is not one of the variable's labels
    pub fn assignment(&self, evidence: &Evidence) -> Result<Assignment> {
        let mut assn = Assignment::new();
        for (name, state) in evidence.iter() {
            let var = self.resolve(name)?;
            assn.set(&var, self.state_index(&var, state)?);
        }
        Ok(assn)
    }


    /// Get the index of the state labelled `state` of `var`.
    pub fn state_index(&self, var: &Variable, state: &str) -> Result<usize> {
        self.states(var)
            .and_then(|labels| labels.iter().position(|s| s == state))
            .ok_or_else(|| PluviaError::InvalidState {
                variable: self.name(var),
                state: String::from(state)
            })
    }


    /// Lookup a `Variable` by name, failing with `PluviaError::UnknownVariable`
    pub fn resolve(&self, name: &str) -> Result<Variable> {
        self.lookup_variable(name)
            .ok_or_else(|| PluviaError::UnknownVariable(String::from(name)))
    }


    /// Lookup a `Variable` in the `BayesianNetwork` based on the name
    pub fn lookup_variable(&self, name: &str) -> Option<Variable> {
        self.names.get_by_second(&String::from(name)).cloned()
    }


    /// Lookup a `Variable`'s name in the `BayesianNetwork`.
    pub fn lookup_name(&self, var: &Variable) -> Option<&str> {
        self.names.get_by_first(var).map(|n| n.as_str())
    }


    /// The names of the variables, in declaration order
    pub fn variables(&self) -> Vec<&str> {
        self.graph.keys().filter_map(|v| self.lookup_name(v)).collect()
    }


    /// The `Variable` handles of the network, in declaration order
    pub fn handles(&self) -> Vec<Variable> {
        self.graph.keys().cloned().collect()
    }


    /// Get the number of `Variable`s in the `BayesianNetwork`
    pub fn num_variables(&self) -> usize {
        self.graph.len()
    }


    /// The state labels of `var`
    pub fn states(&self, var: &Variable) -> Option<&[String]> {
        self.graph.get(var).map(|n| n.states.as_slice())
    }


    pub fn parents(&self, var: &Variable) -> Option<&[Variable]> {
        self.graph.get(var).map(|n| n.parents.as_slice())
    }


    pub fn children(&self, var: &Variable) -> Option<&[Variable]> {
        self.graph.get(var).map(|n| n.children.as_slice())
    }


    /// Get the CPD attached to `var`, if any
    pub fn cpd(&self, var: &Variable) -> Option<&Factor> {
        self.graph.get(var).and_then(|n| n.cpd.as_ref())
    }


    /// Every attached CPD, in declaration order. This is the "bag of factors" view of the network.
    pub fn factors(&self) -> Vec<Factor> {
        self.graph.values().filter_map(|n| n.cpd.clone()).collect()
    }


    /// Get a topological order of the `BayesianNetwork`. Among the variables that are ready at
    /// the same time, the one declared first comes first.
    pub fn topological_order(&self) -> Vec<Variable> {
        // edges are checked as they are added, so the graph is always acyclic
        match self.sort_topologically() {
            Ok(order) => order,
            Err(rest) => rest
        }
    }


    /// Kahn's algorithm. On failure, returns the variables left on a cycle.
    fn sort_topologically(&self) -> std::result::Result<Vec<Variable>, Vec<Variable>> {
        let mut indegree: IndexMap<Variable, usize> = self.graph.iter()
                                                               .map(|(&v, n)| (v, n.parents.len()))
                                                               .collect();
        let mut order = Vec::with_capacity(self.graph.len());

        while let Some(next) = indegree.iter().find(|(_, &d)| d == 0).map(|(&v, _)| v) {
            indegree.shift_remove(&next);
            for child in self.graph[&next].children.iter() {
                if let Some(d) = indegree.get_mut(child) {
                    *d -= 1;
                }
            }
            order.push(next);
        }

        if indegree.is_empty() {
            Ok(order)
        } else {
            Err(indegree.keys().cloned().collect())
        }
    }


    /// Check whether `to` can be reached from `from` following edges forward
    fn reaches(&self, from: Variable, to: Variable) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();

        while let Some(v) = stack.pop() {
            if v == to {
                return true;
            }
            if seen.insert(v) {
                stack.extend(self.graph[&v].children.iter().cloned());
            }
        }

        false
    }


    fn name(&self, var: &Variable) -> String {
        self.lookup_name(var).map(String::from).unwrap_or_else(|| var.to_string())
    }


    fn names_of(&self, vars: &[Variable]) -> Vec<String> {
        vars.iter().map(|v| self.name(v)).collect()
    }


    /// Pairs of ```(name, state label)``` for the variables of `vars` in `assn`
    fn labels_of(&self, vars: &[Variable], assn: &Assignment) -> Vec<(String, String)> {
        vars.iter()
            .filter_map(|v| {
                let state = assn.get(v)?;
                let label = self.states(v)?.get(*state)?;
                Some((self.name(v), label.clone()))
            })
            .collect()
    }
}


impl Default for BayesianNetwork {

    fn default() -> Self {
        BayesianNetwork::new()
    }

}


impl fmt::Debug for BayesianNetwork {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut map = f.debug_map();
        for (var, node) in self.graph.iter() {
            map.entry(&self.name(var), &self.names_of(&node.parents));
        }
        map.finish()
    }

}

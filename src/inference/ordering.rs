//! Heuristics choosing the order in which variable elimination sums out the hidden variables.
//!
//! The heuristics work on the interaction graph of the (evidence reduced) factors: two variables
//! are neighbours when some factor mentions both. Every heuristic is greedy and deterministic;
//! ties always go to the variable declared first in the network. The order changes how large the
//! intermediate factors get, never the result of a query.

use crate::factor::Factor;
use crate::model::BayesianNetwork;
use crate::util::{PluviaError, Result};
use crate::variable::Variable;

use indexmap::IndexMap;
use itertools::Itertools;

use std::collections::HashSet;


/// Defines the possible ways to order the elimination of hidden variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EliminationOrder {

    /// Eliminate the variable whose neighbours have the smallest product of cardinalities, i.e.
    /// the one producing the smallest intermediate factor
    MinWeight,

    /// Eliminate the variable with the fewest neighbours
    MinNeighbors,

    /// Eliminate the variable whose elimination adds the fewest fill edges
    MinFill,

    /// Like `MinFill`, but each fill edge costs the product of the cardinalities of its ends
    WeightedMinFill,

    /// The reverse of a maximum cardinality search (Koller & Friedman Algorithm 9.3)
    MaxCardinality,

    /// Topological order of the network
    Topological,

    /// An explicit order, by name. Names of query or evidence variables are skipped.
    Custom(Vec<String>),

}


impl Default for EliminationOrder {

    fn default() -> Self {
        EliminationOrder::MinWeight
    }

}


impl EliminationOrder {

    /// Order the `hidden` variables for elimination.
    ///
    /// # Args
    /// * `model`: the network the factors came from, used for names and declaration order
    /// * `factors`: the factors left after reducing by the evidence
    /// * `hidden`: the variables to eliminate
    ///
    /// # Errors
    /// * `PluviaError::UnknownVariable` if a custom order names an undeclared variable
    /// * `PluviaError::IncompleteEliminationOrder` if a custom order leaves out hidden variables
    pub(crate) fn order(&self, model: &BayesianNetwork, factors: &[Factor], hidden: &[Variable]) -> Result<Vec<Variable>> {
        // candidates in declaration order, so the first minimum is the earliest declared
        let hidden_set: HashSet<&Variable> = hidden.iter().collect();
        let candidates: Vec<Variable> = model.handles()
                                             .into_iter()
                                             .filter(|v| hidden_set.contains(v))
                                             .collect();

        let order = match *self {
            EliminationOrder::MinWeight => {
                // saturates at usize::MAX
                greedy(model, factors, candidates, |g, v| {
                    g.neighbors(v).iter().fold(1usize, |acc, n| acc.saturating_mul(n.cardinality()))
                })
            },
            EliminationOrder::MinNeighbors => {
                greedy(model, factors, candidates, |g, v| g.neighbors(v).len())
            },
            EliminationOrder::MinFill => {
                greedy(model, factors, candidates, |g, v| {
                    g.fill_edges(v).count()
                })
            },
            EliminationOrder::WeightedMinFill => {
                greedy(model, factors, candidates, |g, v| {
                    g.fill_edges(v).fold(0usize, |acc, (a, b)| {
                        acc.saturating_add(a.cardinality().saturating_mul(b.cardinality()))
                    })
                })
            },
            EliminationOrder::MaxCardinality => {
                max_cardinality(model, factors, &hidden_set)
            },
            EliminationOrder::Topological => {
                model.topological_order()
                     .into_iter()
                     .filter(|v| hidden_set.contains(v))
                     .collect()
            },
            EliminationOrder::Custom(ref names) => {
                let mut order = Vec::with_capacity(hidden.len());
                for name in names.iter() {
                    let var = model.resolve(name)?;
                    if hidden_set.contains(&var) && !order.contains(&var) {
                        order.push(var);
                    }
                }

                if order.len() != candidates.len() {
                    let missing = candidates.iter()
                                            .filter(|v| !order.contains(v))
                                            .map(|v| model.lookup_name(v).unwrap_or_default().to_string())
                                            .collect();
                    return Err(PluviaError::IncompleteEliminationOrder(missing));
                }

                order
            }
        };

        Ok(order)
    }

}


/// Undirected graph linking variables that share a factor
struct InteractionGraph {
    adjacency: IndexMap<Variable, HashSet<Variable>>
}


impl InteractionGraph {

    fn new(model: &BayesianNetwork, factors: &[Factor]) -> Self {
        let mut adjacency: IndexMap<Variable, HashSet<Variable>> = IndexMap::new();

        // only the variables that survive the reduction take part
        for v in model.handles() {
            if factors.iter().any(|f| f.contains(&v)) {
                adjacency.insert(v, HashSet::new());
            }
        }

        for f in factors.iter() {
            for (a, b) in f.scope().iter().tuple_combinations() {
                adjacency.entry(*a).or_insert_with(HashSet::new).insert(*b);
                adjacency.entry(*b).or_insert_with(HashSet::new).insert(*a);
            }
        }

        InteractionGraph { adjacency }
    }

    fn neighbors(&self, var: &Variable) -> Vec<Variable> {
        self.adjacency.get(var).map(|n| n.iter().cloned().collect()).unwrap_or_default()
    }

    /// The pairs of neighbours of `var` that are not yet adjacent
    fn fill_edges<'g>(&'g self, var: &Variable) -> impl Iterator<Item = (Variable, Variable)> + 'g {
        let neighbors = self.neighbors(var);
        neighbors.into_iter()
                 .tuple_combinations()
                 .filter(move |(a, b)| !self.adjacency[a].contains(b))
    }

    /// Remove `var`, connecting all of its neighbours to each other
    fn eliminate(&mut self, var: &Variable) {
        let neighbors = self.neighbors(var);
        for (a, b) in neighbors.iter().tuple_combinations() {
            self.adjacency[a].insert(*b);
            self.adjacency[b].insert(*a);
        }
        for n in neighbors.iter() {
            self.adjacency[n].remove(var);
        }
        self.adjacency.shift_remove(var);
    }

}


/// Repeatedly eliminate the candidate of least `cost`
fn greedy<F>(model: &BayesianNetwork, factors: &[Factor], mut candidates: Vec<Variable>, cost: F) -> Vec<Variable>
    where F: Fn(&InteractionGraph, &Variable) -> usize
{
    let mut graph = InteractionGraph::new(model, factors);
    let mut order = Vec::with_capacity(candidates.len());

    while !candidates.is_empty() {
        // `min_by_key` keeps the first of equal elements
        let idx = match candidates.iter().enumerate().min_by_key(|(_, v)| cost(&graph, *v)) {
            Some((idx, _)) => idx,
            None => break
        };

        let var = candidates.remove(idx);
        graph.eliminate(&var);
        order.push(var);
    }

    order
}


/// Compute the preferred elimination order by the max-cardinality heuristic, restricted to the
/// hidden variables
fn max_cardinality(model: &BayesianNetwork, factors: &[Factor], hidden: &HashSet<&Variable>) -> Vec<Variable> {
    let graph = InteractionGraph::new(model, factors);

    // the variables in the graph, in declaration order
    let vars: Vec<Variable> = graph.adjacency.keys().cloned().collect();
    // set of marked variables
    let mut marked = HashSet::new();
    // the (reverse) elimination order
    let mut elimination = Vec::with_capacity(vars.len());

    for _ in 0..vars.len() {
        let mut best: Option<(Variable, usize)> = None;

        for v in vars.iter().filter(|v| !marked.contains(*v)) {
            // count the number of marked neighbors
            let ct = graph.adjacency[v].iter().filter(|n| marked.contains(*n)).count();

            // only a strictly larger count replaces the current pick
            match best {
                Some((_, max)) if ct <= max => (),
                _ => best = Some((*v, ct))
            }
        }

        if let Some((v, _)) = best {
            elimination.push(v);
            marked.insert(v);
        }
    }

    // we need to reverse the elimination order before returning
    elimination.reverse();
    elimination.into_iter().filter(|v| hidden.contains(v)).collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::Initialization;

    /// The extended student network of Koller & Friedman Figure 9.8, with uniform CPTs
    fn extended_student() -> BayesianNetwork {
        let mut net = BayesianNetwork::new();
        for name in &["C", "D", "I", "G", "S", "L", "J", "H"] {
            net.add_variable(name, &["0", "1"]).unwrap();
        }
        net.add_edges_from(&[
            ("C", "D"), ("D", "G"), ("I", "G"), ("I", "S"), ("G", "L"),
            ("L", "J"), ("S", "J"), ("G", "H"), ("J", "H")
        ]).unwrap();
        for name in &["C", "D", "I", "G", "S", "L", "J", "H"] {
            net.initialize_cpt(name, Initialization::Uniform).unwrap();
        }
        net
    }

    fn vars(net: &BayesianNetwork, names: &[&str]) -> Vec<Variable> {
        names.iter().map(|n| net.lookup_variable(n).unwrap()).collect()
    }

    fn names(net: &BayesianNetwork, order: &[Variable]) -> Vec<String> {
        order.iter().map(|v| net.lookup_name(v).unwrap().to_string()).collect()
    }

    #[test]
    fn every_heuristic_is_a_permutation() {
        let net = extended_student();
        let factors = net.factors();
        let hidden = vars(&net, &["C", "D", "I", "G", "S", "L", "H"]);

        let strategies = vec![
            EliminationOrder::MinWeight,
            EliminationOrder::MinNeighbors,
            EliminationOrder::MinFill,
            EliminationOrder::WeightedMinFill,
            EliminationOrder::MaxCardinality,
            EliminationOrder::Topological,
        ];

        for s in strategies {
            let order = s.order(&net, &factors, &hidden).unwrap();
            assert_eq!(hidden.len(), order.len(), "{:?}", s);

            let set: HashSet<Variable> = order.iter().cloned().collect();
            assert_eq!(hidden.iter().cloned().collect::<HashSet<Variable>>(), set, "{:?}", s);
        }
    }

    #[test]
    fn min_neighbors_prefers_leaves() {
        let net = extended_student();
        let hidden = vars(&net, &["C", "D", "I", "G", "S", "L", "J", "H"]);
        let order = EliminationOrder::MinNeighbors.order(&net, &net.factors(), &hidden).unwrap();

        // C has the single neighbour D, and is declared first
        assert_eq!("C", names(&net, &order)[0]);
    }

    #[test]
    fn deterministic() {
        let net = extended_student();
        let hidden = vars(&net, &["C", "D", "I", "G", "S", "L", "J", "H"]);

        let first = EliminationOrder::MinFill.order(&net, &net.factors(), &hidden).unwrap();
        for _ in 0..10 {
            assert_eq!(first, EliminationOrder::MinFill.order(&net, &net.factors(), &hidden).unwrap());
        }
    }

    #[test]
    fn topological() {
        let net = extended_student();
        let hidden = vars(&net, &["C", "G", "H", "I"]);
        let order = EliminationOrder::Topological.order(&net, &net.factors(), &hidden).unwrap();

        assert_eq!(vec!["C", "I", "G", "H"], names(&net, &order));
    }

    #[test]
    fn custom() {
        let net = extended_student();
        let hidden = vars(&net, &["C", "D"]);

        let custom = EliminationOrder::Custom(vec!["J".into(), "D".into(), "C".into(), "D".into()]);
        let order = custom.order(&net, &net.factors(), &hidden).unwrap();
        assert_eq!(vec!["D", "C"], names(&net, &order));

        let unknown = EliminationOrder::Custom(vec!["X".into()]);
        assert_eq!(
            Err(PluviaError::UnknownVariable("X".into())),
            unknown.order(&net, &net.factors(), &hidden)
        );

        let incomplete = EliminationOrder::Custom(vec!["D".into()]);
        assert_eq!(
            Err(PluviaError::IncompleteEliminationOrder(vec!["C".into()])),
            incomplete.order(&net, &net.factors(), &hidden)
        );
    }

    #[test]
    fn fill_edges() {
        let net = extended_student();
        let graph = InteractionGraph::new(&net, &net.factors());
        let g = net.lookup_variable("G").unwrap();
        let c = net.lookup_variable("C").unwrap();

        // G's neighbours D, I, L, H, J: only (D, I), (L, J) and (H, J) are connected
        assert_eq!(7, graph.fill_edges(&g).count());
        assert_eq!(0, graph.fill_edges(&c).count());
    }

    #[test]
    fn heavy_hub_is_eliminated_last() {
        // C -> F0..F63: C's weight 2^64 does not fit in a usize
        let mut net = BayesianNetwork::new();
        net.add_variable("C", &["0", "1"]).unwrap();
        for i in 0..64 {
            let f = format!("F{}", i);
            net.add_variable(&f, &["0", "1"]).unwrap();
            net.add_edge("C", &f).unwrap();
        }
        for name in net.variables().iter().map(|s| s.to_string()).collect::<Vec<_>>() {
            net.initialize_cpt(&name, Initialization::Uniform).unwrap();
        }

        let f0 = net.lookup_variable("F0").unwrap();
        let hidden: Vec<Variable> = net.handles().into_iter().filter(|v| *v != f0).collect();

        for s in &[EliminationOrder::MinWeight, EliminationOrder::WeightedMinFill] {
            let order = s.order(&net, &net.factors(), &hidden).unwrap();
            assert_eq!(hidden.len(), order.len());
            assert_eq!("C", names(&net, &order)[order.len() - 1], "{:?}", s);
        }
    }

}

//! Property-based tests over randomly shaped networks with seeded random CPTs.

use approx::assert_abs_diff_eq;
use pluvia::{BayesianNetwork, EliminationOrder, Evidence, Initialization, VariableElimination};
use proptest::prelude::*;

const MAX_VARS: usize = 5;
const STATE_LABELS: &[&str] = &["s0", "s1", "s2"];

/// Variables `V0..Vn`, edges only from lower to higher index, so the graph is acyclic
fn network(n: usize, cards: &[usize], edges: &[bool], seed: u64) -> BayesianNetwork {
    let mut net = BayesianNetwork::new();
    for i in 0..n {
        net.add_variable(&format!("V{}", i), &STATE_LABELS[..cards[i]]).unwrap();
    }

    let pairs = (0..MAX_VARS).flat_map(|i| ((i + 1)..MAX_VARS).map(move |j| (i, j)));
    for ((i, j), &edge) in pairs.zip(edges) {
        if edge && j < n {
            net.add_edge(&format!("V{}", i), &format!("V{}", j)).unwrap();
        }
    }

    for i in 0..n {
        let init = Initialization::Seeded(seed.wrapping_add(i as u64));
        net.initialize_cpt(&format!("V{}", i), init).unwrap();
    }

    net
}

fn arb_network() -> impl Strategy<Value = BayesianNetwork> {
    (
        2..=MAX_VARS,
        prop::collection::vec(2usize..=3, MAX_VARS),
        prop::collection::vec(any::<bool>(), MAX_VARS * (MAX_VARS - 1) / 2),
        any::<u64>(),
    ).prop_map(|(n, cards, edges, seed)| network(n, &cards, &edges, seed))
}

fn names(net: &BayesianNetwork) -> Vec<String> {
    net.variables().iter().map(|s| s.to_string()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_networks_validate(net in arb_network()) {
        prop_assert!(net.validate().is_valid());
    }

    #[test]
    fn marginals_are_distributions(net in arb_network()) {
        let engine = VariableElimination::new(&net).unwrap();

        for name in names(&net) {
            let r = engine.query(&[name.as_str()], &Evidence::new()).unwrap();
            assert_abs_diff_eq!(1.0, r.values().iter().sum::<f64>(), epsilon = 1e-9);
            prop_assert!(r.values().iter().all(|&p| p >= 0.0));
        }
    }

    #[test]
    fn orders_agree(net in arb_network()) {
        let names = names(&net);
        let last = names[names.len() - 1].as_str();
        let evidence = Evidence::new().observe(&names[0], "s0");

        let reference = VariableElimination::new(&net).unwrap().query(&[last], &evidence).unwrap();

        let mut reversed = names.clone();
        reversed.reverse();

        let orders = vec![
            EliminationOrder::MinNeighbors,
            EliminationOrder::MinFill,
            EliminationOrder::WeightedMinFill,
            EliminationOrder::MaxCardinality,
            EliminationOrder::Topological,
            EliminationOrder::Custom(reversed),
        ];

        for order in orders {
            let engine = VariableElimination::new(&net).unwrap().with_order(order);
            let r = engine.query(&[last], &evidence).unwrap();
            for (x, y) in reference.values().iter().zip(r.values()) {
                assert_abs_diff_eq!(*x, y, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn joint_is_chain_rule(net in arb_network()) {
        let names = names(&net);
        let query: Vec<&str> = names.iter().map(|s| s.as_str()).collect();

        let engine = VariableElimination::new(&net).unwrap();
        let joint = engine.query(&query, &Evidence::new()).unwrap();

        assert_abs_diff_eq!(1.0, joint.values().iter().sum::<f64>(), epsilon = 1e-9);

        for (labels, p) in joint.iter() {
            let full: Evidence = query.iter().cloned().zip(labels).collect();
            assert_abs_diff_eq!(net.probability(&full).unwrap(), p, epsilon = 1e-9);
        }
    }

    #[test]
    fn evidence_probability_is_marginal(net in arb_network()) {
        let names = names(&net);
        let engine = VariableElimination::new(&net).unwrap();

        let marginal = engine.query(&[names[0].as_str()], &Evidence::new()).unwrap();
        let evidence = Evidence::new().observe(&names[0], "s1");

        assert_abs_diff_eq!(
            marginal.values()[1],
            engine.probability_of_evidence(&evidence).unwrap(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn identical_queries_are_identical(net in arb_network()) {
        let names = names(&net);
        let engine = VariableElimination::new(&net).unwrap();
        let evidence = Evidence::new().observe(&names[1], "s0");

        let first = engine.query(&[names[0].as_str()], &evidence).unwrap();
        let second = engine.query(&[names[0].as_str()], &evidence).unwrap();
        prop_assert_eq!(first.values(), second.values());
    }
}

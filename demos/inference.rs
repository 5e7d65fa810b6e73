//! Inference on the rain network: rain makes the grass wet and driving dangerous.
//!
//! Run with `cargo run --example inference`.

use pluvia as p;
use p::ConditionalInferenceEngine;

const STATES: &[&str] = &["No", "Si"];

fn main() -> p::Result<()> {
    /////////////////////////////////////////////////////
    // Step 1: Build Model
    let model = build_model()?;
    assert!(model.validate().is_valid());

    /////////////////////////////////////////////////////
    // Step 2: Compile some evidence
    let evidence = p::Evidence::new().observe("ConducirPeligroso", "Si");

    /////////////////////////////////////////////////////
    // Step 3: Build an inference engine
    let engine = p::VariableElimination::new(&model)?.with_order(p::EliminationOrder::MinFill);

    /////////////////////////////////////////////////////
    // Step 4: Run a Conditional Query
    let posterior = engine.infer(&["Lluvia"], &evidence)?;
    for (labels, prob) in posterior.iter() {
        println!("P(Lluvia = {} | ConducirPeligroso = Si) = {:.4}", labels[0], prob);
    }

    /////////////////////////////////////////////////////
    // Step 5: Most probable explanation
    let map = engine.map_query(&["Lluvia", "CespedMojado"], &evidence)?;
    for (var, state) in map.iter() {
        println!("{} = {}", var, state);
    }

    Ok(())
}

fn build_model() -> p::Result<p::BayesianNetwork> {
    let mut model = p::BayesianNetwork::new();
    model.add_variable("Lluvia", STATES)?;
    model.add_variable("CespedMojado", STATES)?;
    model.add_variable("ConducirPeligroso", STATES)?;
    model.add_edges_from(&[("Lluvia", "CespedMojado"), ("Lluvia", "ConducirPeligroso")])?;

    ///////////////////////////////////////////////////
    // CPTs: one column per state of Lluvia
    model.initialize_cpt("Lluvia", p::Initialization::Binomial(0.7))?;
    model.set_cpt(
        p::TabularCpd::new("CespedMojado", 2, vec![vec![0.9, 0.2], vec![0.1, 0.8]])
            .with_evidence(&["Lluvia"], &[2])
    )?;
    model.set_cpt(
        p::TabularCpd::new("ConducirPeligroso", 2, vec![vec![0.6, 0.3], vec![0.4, 0.7]])
            .with_evidence(&["Lluvia"], &[2])
    )?;

    Ok(model)
}

//! Command line demo: builds the rain network (rain makes the grass wet and driving dangerous),
//! checks it and answers queries about it.

use clap::{ArgAction, Parser, ValueEnum};
use pluvia::{BayesianNetwork, EliminationOrder, Evidence, Result, TabularCpd, Validation,
             VariableElimination};
use tracing::Level;

use std::process::ExitCode;


#[derive(Parser)]
#[command(name = "pluvia")]
#[command(author, version, about = "Exact inference on the rain Bayesian network", long_about = None)]
struct Cli {
    /// Elimination order heuristic
    #[arg(short, long, value_enum, default_value = "min-weight")]
    order: Order,

    /// Query variables, comma separated (runs a single query instead of the examples)
    #[arg(short, long, value_delimiter = ',')]
    query: Vec<String>,

    /// Observed state as Variable=State, can be specified multiple times
    #[arg(short, long, value_parser = parse_observation, requires = "query")]
    evidence: Vec<(String, String)>,

    /// Also print the most probable assignment of the query variables
    #[arg(long, requires = "query")]
    map: bool,

    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}


#[derive(Clone, Copy, Debug, ValueEnum)]
enum Order {
    MinWeight,
    MinNeighbors,
    MinFill,
    WeightedMinFill,
    MaxCardinality,
    Topological,
}

impl From<Order> for EliminationOrder {

    fn from(order: Order) -> Self {
        match order {
            Order::MinWeight => EliminationOrder::MinWeight,
            Order::MinNeighbors => EliminationOrder::MinNeighbors,
            Order::MinFill => EliminationOrder::MinFill,
            Order::WeightedMinFill => EliminationOrder::WeightedMinFill,
            Order::MaxCardinality => EliminationOrder::MaxCardinality,
            Order::Topological => EliminationOrder::Topological,
        }
    }

}


fn parse_observation(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=').map(|(var, state)| (var.trim(), state.trim())) {
        Some((var, state)) if !var.is_empty() && !state.is_empty() => {
            Ok((var.to_string(), state.to_string()))
        },
        _ => Err(format!("expected Variable=State, got '{}'", s))
    }
}


const STATES: &[&str] = &["No", "Si"];

/// Lluvia -> CespedMojado, Lluvia -> ConducirPeligroso
fn rain_network() -> Result<BayesianNetwork> {
    let mut net = BayesianNetwork::new();
    net.add_variable("Lluvia", STATES)?;
    net.add_variable("CespedMojado", STATES)?;
    net.add_variable("ConducirPeligroso", STATES)?;
    net.add_edges_from(&[("Lluvia", "CespedMojado"), ("Lluvia", "ConducirPeligroso")])?;

    // 70% no rain, 30% rain
    net.set_cpt(
        TabularCpd::new("Lluvia", 2, vec![vec![0.7], vec![0.3]])
            .with_state_names("Lluvia", STATES)
    )?;

    // columns: Lluvia=No, Lluvia=Si
    net.set_cpt(
        TabularCpd::new("CespedMojado", 2, vec![vec![0.9, 0.2], vec![0.1, 0.8]])
            .with_evidence(&["Lluvia"], &[2])
            .with_state_names("CespedMojado", STATES)
            .with_state_names("Lluvia", STATES)
    )?;
    net.set_cpt(
        TabularCpd::new("ConducirPeligroso", 2, vec![vec![0.6, 0.3], vec![0.4, 0.7]])
            .with_evidence(&["Lluvia"], &[2])
            .with_state_names("ConducirPeligroso", STATES)
            .with_state_names("Lluvia", STATES)
    )?;

    Ok(net)
}


fn run(cli: &Cli) -> Result<()> {
    let net = rain_network()?;

    match net.validate() {
        Validation::Valid => println!("La red bayesiana es válida.\n"),
        Validation::Invalid(violations) => {
            println!("La red bayesiana no es válida:");
            for v in violations.iter() {
                println!("  {}", v);
            }
            println!();
        }
    }

    let engine = VariableElimination::new(&net)?.with_order(cli.order.into());

    if cli.query.is_empty() {
        println!("Probabilidad de que el césped esté mojado:");
        let r = engine.query(&["CespedMojado"], &Evidence::new())?;
        println!("{:?}\n", r.values());

        println!("Probabilidad de que esté lloviendo dado que conducir es peligroso:");
        let r = engine.query(&["Lluvia"], &Evidence::new().observe("ConducirPeligroso", "Si"))?;
        println!("{:?}\n", r.values());

        println!("Probabilidad conjunta de todos los estados:");
        let r = engine.query(&["Lluvia", "CespedMojado", "ConducirPeligroso"], &Evidence::new())?;
        println!("{}", r);

        return Ok(());
    }

    let variables: Vec<&str> = cli.query.iter().map(|q| q.trim()).collect();
    let evidence: Evidence = cli.evidence.iter().map(|(v, s)| (v.as_str(), s.as_str())).collect();

    println!("{}", engine.query(&variables, &evidence)?);

    if cli.map {
        let map = engine.map_query(&variables, &evidence)?;
        println!();
        for (var, state) in map.iter() {
            println!("{} = {}", var, state);
        }
    }

    Ok(())
}


fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

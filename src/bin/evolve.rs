//! Time-evolution driver.
//!
//! Loads an edge list, seeds a random fraction of infected nodes,
//! evolves for a duration, and writes the `t I R` series to stdout.

use clap::Parser;
use contagion::dynamics::rates::Rates;
use contagion::graph::Graph;
use contagion::process::spreading::Spreading;

#[derive(Parser)]
#[command(about = "simulate compartmental dynamics on a network")]
struct Args {
    /// path to the edge list: one `u v` pair of node ids per line
    edges: std::path::PathBuf,
    /// transmission rate per infected-susceptible contact
    #[arg(long)]
    beta: f64,
    /// recovery rate per infected node (0 selects SI)
    #[arg(long)]
    gamma: f64,
    /// waning immunity rate (0 selects SIR, inf selects SIS)
    #[arg(long, default_value_t = 0.)]
    alpha: f64,
    /// logarithmic bin base of the rejection sampler
    #[arg(long, default_value_t = 2.)]
    base: f64,
    /// initially infected fraction of the population
    #[arg(long, default_value_t = 0.01)]
    fraction: f64,
    /// simulated duration; defaults to running until absorption
    #[arg(long, default_value_t = f64::INFINITY)]
    time: f64,
    /// generator seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let graph = Graph::load(&args.edges)?;
    log::info!("loaded {}", graph);
    let rates = Rates::new(args.beta, args.gamma, args.alpha)?;
    let mut process = Spreading::with_base(graph, rates, args.base)?;
    process.initialize_random(args.fraction, args.seed)?;
    process.evolve(args.time);
    print!("{}", process.time_series());
    Ok(())
}

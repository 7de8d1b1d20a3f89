/// pathsort - sort a bidirected pangenome graph with path-guided 1D SGD
///
/// Loads a GFA file, lays the nodes out on a line so that layout
/// distances approximate path distances, and writes the graph back with
/// its segments in the resulting order.
use clap::Parser;
use std::path::PathBuf;
use std::process;

use pathsort::{gfa_parser, path_linear_sgd_order, PathIndex, PathSGDParams, SortResult};

#[derive(Parser)]
#[command(name = "pathsort")]
#[command(about = "Sort a GFA file with path-guided 1D SGD")]
struct Args {
    /// Input GFA file
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Output GFA file
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Maximum number of SGD iterations
    #[arg(long, default_value_t = 100)]
    iter_max: u64,

    /// Iteration with the maximum learning rate
    #[arg(long, default_value_t = 0)]
    iter_peak: u64,

    /// Minimum term updates before an iteration rotates
    #[arg(long, default_value_t = 1000)]
    min_term_updates: u64,

    /// Convergence threshold on the largest observed update
    #[arg(long, default_value_t = 0.0)]
    delta: f64,

    /// Scale of the final learning rate
    #[arg(long, default_value_t = 0.01)]
    eps: f64,

    /// Maximum learning rate
    #[arg(long, default_value_t = 100.0)]
    eta_max: f64,

    /// Zipfian skew of the jump-length distribution
    #[arg(long, default_value_t = 0.99)]
    theta: f64,

    /// Upper bound of the Zipfian jump support
    #[arg(long, default_value_t = 100)]
    space: u64,

    /// Number of SGD worker threads
    #[arg(short = 't', long, default_value_t = 1)]
    threads: usize,

    /// Run the single-threaded deterministic engine
    #[arg(long)]
    deterministic: bool,

    /// Seed string for the deterministic engine
    #[arg(long)]
    seed: Option<String>,

    /// Sample term starts from the node-path incidence instead of path
    /// nucleotides
    #[arg(long, conflicts_with = "sample_from_nodes")]
    sample_from_steps: bool,

    /// Sample term starts uniformly from nodes
    #[arg(long)]
    sample_from_nodes: bool,

    /// Print one progress line per iteration to standard error
    #[arg(short = 'p', long)]
    progress: bool,
}

fn run(args: &Args) -> SortResult<()> {
    let mut graph = gfa_parser::load_gfa(&args.input)?;
    let index = PathIndex::from_graph(&graph);
    let use_paths: Vec<usize> = (0..index.num_paths()).collect();

    let params = PathSGDParams {
        iter_max: args.iter_max,
        iter_with_max_learning_rate: args.iter_peak,
        min_term_updates: args.min_term_updates,
        delta: args.delta,
        eps: args.eps,
        eta_max: args.eta_max,
        theta: args.theta,
        space: args.space,
        nthreads: args.threads,
        deterministic: args.deterministic,
        seed: args.seed.clone(),
        sample_from_paths: !args.sample_from_steps,
        sample_from_nodes: args.sample_from_nodes,
        snapshot: false,
        progress: args.progress,
    };

    let (order, _) = path_linear_sgd_order(&graph, &index, &use_paths, &params)?;
    graph.apply_ordering(&order);
    gfa_parser::write_gfa(&graph, &args.output)?;
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("[pathsort] error: {}", e);
        process::exit(1);
    }
}

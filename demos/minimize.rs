//! Minimizes a random multi-output function and prints the netlist.
//!
//! A random simulation trace marks the observed rows as care rows; every
//! other row is left to the merge policy.
//!
//! Run with:
//! ```bash
//! cargo run --example minimize -- --inputs 8 --outputs 4 --policy two-sided
//! ```

use clap::{Parser, ValueEnum};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use ttbdd::bdd::{Bdd, BddConfig};
use ttbdd::merge::MergePolicy;
use ttbdd::trace::SimTrace;

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Policy {
    Exact,
    Skip,
    OneSided,
    OneSidedComplement,
    TwoSided,
    LevelTwoSided,
}

impl From<Policy> for MergePolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Exact => MergePolicy::Exact,
            Policy::Skip => MergePolicy::SkipDontCare,
            Policy::OneSided => MergePolicy::OneSided { complement: false },
            Policy::OneSidedComplement => MergePolicy::OneSided { complement: true },
            Policy::TwoSided => MergePolicy::TwoSided,
            Policy::LevelTwoSided => MergePolicy::LevelTwoSided,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of inputs.
    #[arg(long, value_name = "INT", default_value = "8")]
    inputs: usize,

    /// Number of outputs.
    #[arg(long, value_name = "INT", default_value = "4")]
    outputs: usize,

    /// Don't-care merge policy.
    #[arg(long, value_enum, default_value = "exact")]
    policy: Policy,

    /// Observations needed for a traced row to become a care row (0 disables care tracking).
    #[arg(long, value_name = "INT", default_value = "1")]
    rarity: usize,

    /// Trace length in bytes per input (8 patterns each).
    #[arg(long, value_name = "INT", default_value = "4")]
    trace_bytes: usize,

    /// Random sifting restarts.
    #[arg(long, value_name = "INT", default_value = "20")]
    rounds: usize,

    /// Seed for the function, the trace and the restarts.
    #[arg(long, value_name = "INT", default_value = "0")]
    seed: u64,

    /// Print the netlist.
    #[arg(long)]
    print: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let onsets: Vec<Vec<usize>> = (0..args.outputs)
        .map(|_| (0..1 << args.inputs).filter(|_| rng.gen_bool(0.5)).collect())
        .collect();
    let lanes = (0..args.inputs)
        .map(|_| (0..args.trace_bytes).map(|_| rng.gen::<u8>()).collect())
        .collect();
    let trace = SimTrace::from_lanes(lanes)?;
    println!("Trace holds {} patterns", trace.n_patterns());

    let config = BddConfig::default()
        .with_policy(args.policy.into())
        .with_rarity(args.rarity)
        .with_sift_rounds(args.rounds)
        .with_seed(args.seed);
    let mut bdd = Bdd::from_onsets_and_trace(args.inputs, &onsets, &trace, config)?;

    let time_reorder = std::time::Instant::now();
    let stats = bdd.reorder();
    println!(
        "Reordered in {:.3}s: {} -> {} nodes ({:.1}% smaller) with {} swaps over {} rounds",
        time_reorder.elapsed().as_secs_f64(),
        stats.initial_size,
        stats.final_size,
        stats.reduction_percent(),
        stats.swaps,
        stats.rounds
    );
    println!("Final order: {}", bdd.order());

    let inputs: Vec<String> = (0..args.inputs).map(|i| format!("x{}", i)).collect();
    let outputs: Vec<String> = (0..args.outputs).map(|i| format!("f{}", i)).collect();
    let netlist = bdd.to_netlist(&inputs, &outputs)?;
    println!("Netlist has {} nodes", netlist.node_records());
    if args.print {
        print!("{}", netlist);
    }

    let care = trace.care_rows(args.rarity.max(1));
    let mut mismatches = 0;
    for &row in &care {
        let values = netlist.simulate_row(&inputs, &outputs, row)?;
        for (value, onset) in values.iter().zip(&onsets) {
            if *value != onset.contains(&row) {
                mismatches += 1;
            }
        }
    }
    println!("Checked {} care rows: {} mismatches", care.len(), mismatches);

    println!("\nAll done in {:.3}s", time_total.elapsed().as_secs_f64());
    Ok(())
}

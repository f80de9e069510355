//! SfcSim CLI — Compare VNF placement policies on a simulated network.

use clap::{Parser, Subcommand};
use sfcsim_core::config::SimConfig;
use sfcsim_core::metrics;
use sfcsim_core::trace;
use sfcsim_policies::SfcRequest;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "sfcsim",
    about = "Simulate service function chain admission and VNF placement",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation with a single policy.
    Run {
        /// Path to TOML configuration file.
        #[arg(short, long)]
        config: PathBuf,
        /// Path to trace file.
        #[arg(short, long)]
        trace: Option<PathBuf>,
        /// Placement policy name (defaults to simulation.policy).
        #[arg(short, long)]
        policy: Option<String>,
        /// Output results to JSON file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare multiple policies on the same trace.
    Compare {
        /// Path to TOML configuration file.
        #[arg(short, long)]
        config: PathBuf,
        /// Path to trace file.
        #[arg(short, long)]
        trace: Option<PathBuf>,
        /// Comma-separated list of policy names.
        #[arg(short = 'P', long, value_delimiter = ',')]
        policies: Vec<String>,
        /// Output results to JSON file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List available policies.
    ListPolicies,
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            trace: trace_path,
            policy,
            output,
        } => {
            let sim_config = load_config(&config);
            let requests = load_requests(&sim_config, trace_path.as_deref());
            let name = policy.unwrap_or_else(|| sim_config.simulation.policy.clone());
            let policy = sim_config.build_policy(&name).unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });

            let result = sfcsim_core::run_simulation(&sim_config, requests, policy)
                .unwrap_or_else(|e| {
                    eprintln!("Simulation failed: {}", e);
                    std::process::exit(1);
                });
            println!("{}", metrics::format_table(&result));

            if let Some(output_path) = output {
                write_json(&result, &output_path);
            }
        }
        Commands::Compare {
            config,
            trace: trace_path,
            policies,
            output,
        } => {
            let sim_config = load_config(&config);
            let requests = load_requests(&sim_config, trace_path.as_deref());
            let names: Vec<&str> = if policies.is_empty() {
                sfcsim_policies::available_policies()
            } else {
                policies.iter().map(|s| s.as_str()).collect()
            };

            let results = sfcsim_core::compare_policies(&sim_config, &requests, &names)
                .unwrap_or_else(|e| {
                    eprintln!("Simulation failed: {}", e);
                    std::process::exit(1);
                });
            println!("{}", metrics::format_comparison_table(&results));

            for result in &results {
                println!("{}", metrics::format_table(result));
            }

            if let Some(output_path) = output {
                write_json(&results, &output_path);
            }
        }
        Commands::ListPolicies => {
            println!("Available placement policies:");
            for name in sfcsim_policies::available_policies() {
                println!("  - {}", name);
            }
        }
    }
}

fn load_config(path: &Path) -> SimConfig {
    SimConfig::from_file(path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    })
}

fn load_requests(config: &SimConfig, trace_path: Option<&Path>) -> Vec<SfcRequest> {
    let path = trace_path
        .map(PathBuf::from)
        .or_else(|| config.trace.path.as_ref().map(PathBuf::from));

    match path {
        Some(p) => trace::load_trace(&p, &config.trace.format).unwrap_or_else(|e| {
            eprintln!("Error loading trace: {}", e);
            std::process::exit(1);
        }),
        None => {
            eprintln!("No trace file specified. Use --trace or set trace.path in config.");
            std::process::exit(1);
        }
    }
}

fn write_json<T: serde::Serialize + ?Sized>(value: &T, path: &Path) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error serializing results: {}", e);
        std::process::exit(1);
    });
    std::fs::write(path, json).unwrap_or_else(|e| {
        eprintln!("Error writing output: {}", e);
        std::process::exit(1);
    });
    println!("Results written to {}", path.display());
}

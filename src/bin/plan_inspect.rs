//! Binary entry point for inspecting native EXPLAIN reports.
#![forbid(unsafe_code)]

use std::error::Error;
use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use pgsteer::explain::ExplainPlan;

#[derive(Parser, Debug)]
#[command(
    name = "plan-inspect",
    version,
    about = "Normalize and pretty-print a Postgres EXPLAIN (FORMAT JSON) report"
)]
struct Cli {
    /// Path to the report file. Reads standard input when omitted.
    report: Option<PathBuf>,

    /// Print the native plan tree instead of the normalized one.
    #[arg(long)]
    native: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let raw = match &cli.report {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let plan = ExplainPlan::parse_str(&raw)?;
    if cli.native {
        println!("{}", plan.inspect());
    } else {
        println!("{}", plan.plan().inspect());
    }

    if plan.is_analyze() {
        println!(
            "planning: {:.3}s, execution: {:.3}s",
            plan.planning_time(),
            plan.execution_time()
        );
    }
    Ok(())
}

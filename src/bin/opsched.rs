//! Command-line driver: schedule a problem file and print the latency.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use opsched::{parse_problem, schedule, SchedConfig};

#[derive(Parser, Debug)]
#[command(name = "opsched")]
#[command(about = "Resource- and timing-constrained operation scheduler")]
struct Args {
    /// Problem file: clock period, op catalog, and statements.
    problem: PathBuf,

    /// Raise log verbosity (-v placements, -vv checks, -vvv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let text = match std::fs::read_to_string(&args.problem) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: {}: {}", args.problem.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let problem = match parse_problem(&text) {
        Ok(problem) => problem,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let mut dfg = problem.dfg;
    let config = SchedConfig::new(problem.clock_period).with_verbosity(args.verbose);
    match schedule(&mut dfg, &problem.ops, &config) {
        Ok(latency) => {
            println!("{}", latency);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

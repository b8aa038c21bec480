//! Trip Settle CLI
//!
//! Replays a CSV event log for one trip and prints either the final
//! participant balances or the settlement plan.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- events.csv > balances.csv
//! cargo run -- events.csv --plan
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `TRIP_SETTLE_SCALE`: Decimal places used when settling (default 2)
//! - `TRIP_SETTLE_EPSILON`: Tolerance treated as settled (default 0.01)

use log::debug;
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::process;
use trip_settle::{LedgerError, Precision, Result, Trip};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let plan = args.iter().any(|a| a == "--plan");
    let input_path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .ok_or(LedgerError::MissingArgument)?;

    let precision = Precision::from_env()?;
    let file = File::open(input_path)?;
    let reader = BufReader::new(file);

    let name = Path::new(input_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut trip = Trip::with_precision(name, precision);
    trip.process_csv(reader)?;
    debug!(
        "Trip {} replayed: {} participants, {} expenses",
        trip.name(),
        trip.participants().len(),
        trip.expenses().len()
    );

    let stdout = io::stdout();
    let handle = stdout.lock();
    if plan {
        trip.write_plan(handle)?;
    } else {
        trip.write_balances(handle)?;
    }

    Ok(())
}

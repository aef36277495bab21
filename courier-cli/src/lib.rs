//! Command-line interface for the Courier route planner.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod fs;
mod solve;

pub use error::CliError;

use solve::SolveArgs;

pub(crate) const ARG_SOLVE_REQUEST: &str = "request";
pub(crate) const ARG_SOLVE_MAX_RELOAD: &str = "max-reload";
pub(crate) const ARG_SOLVE_TIME_LIMIT: &str = "time-limit";
pub(crate) const ARG_SOLVE_DROP_PENALTY: &str = "drop-penalty";
pub(crate) const ENV_SOLVE_REQUEST: &str = "COURIER_CMDS_SOLVE_REQUEST_PATH";

/// Run the Courier CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments, configuration or the request are
/// invalid, or when planning or writing the report fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Solve(args) => solve::run_solve(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "courier",
    about = "Plan delivery routes for a fleet of vehicles",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan routes for a JSON request and print the JSON report.
    Solve(SolveArgs),
}

#[cfg(test)]
mod tests;

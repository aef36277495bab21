//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use std::io::Write;
use std::process::ExitCode;

use courier_cli::CliError;

fn main() -> ExitCode {
    match courier_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            let mut stderr = std::io::stderr().lock();
            if writeln!(stderr, "courier: {err}").is_err() {
                return ExitCode::from(2);
            }
            ExitCode::FAILURE
        }
    }
}

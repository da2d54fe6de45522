//! Binary entrypoint for the `covsub` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    match covsub::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

//! Core library entry for the `covsub` CLI.

pub mod adapters;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod git_info;
pub mod job;
pub mod json_writer;
pub mod parser;
pub mod ports;
pub mod reporting;
pub mod service;
pub mod source;
pub mod source_loader;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    // A .env file may carry COVERALLS_REPO_TOKEN and CI variables.
    dotenvy::dotenv().ok();
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli.command)
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_executes_a_dry_run_report() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_str().unwrap();
        let result = run([
            "covsub",
            "report",
            "--dry-run",
            "--base-dir",
            base,
            "--output",
            "coveralls.json",
        ]);
        assert!(result.is_ok(), "{result:?}");
        assert!(dir.path().join("coveralls.json").exists());
    }

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["covsub", "unknown"]);
        assert!(result.is_err());
    }
}

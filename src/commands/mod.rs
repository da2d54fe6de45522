//! Command dispatch and handlers.

pub mod report;

use crate::cli::Command;
use crate::context::ServiceContext;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    let ctx = ServiceContext::live();
    match command {
        Command::Report(args) => report::run(&ctx, args),
    }
}

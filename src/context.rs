//! Service context bundling all port trait objects.

use crate::adapters::live::{LiveClock, LiveEnvironment, LiveFileSystem, LiveGitRepo};
use crate::ports::clock::Clock;
use crate::ports::env::Environment;
use crate::ports::filesystem::FileSystem;
use crate::ports::git::GitRepo;

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. The live
/// constructor wires real adapters; tests build the struct directly with
/// whatever stand-ins they need.
pub struct ServiceContext {
    /// Clock for timestamping the job.
    pub clock: Box<dyn Clock>,
    /// Filesystem for source file resolution.
    pub fs: Box<dyn FileSystem>,
    /// Git repository for the VCS snapshot.
    pub git: Box<dyn GitRepo>,
    /// Process environment for CI service detection.
    pub env: Box<dyn Environment>,
}

impl ServiceContext {
    /// Creates a live context with real adapters for every port.
    #[must_use]
    pub fn live() -> Self {
        Self {
            clock: Box::new(LiveClock),
            fs: Box::new(LiveFileSystem),
            git: Box::new(LiveGitRepo),
            env: Box::new(LiveEnvironment),
        }
    }
}

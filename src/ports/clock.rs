//! Clock port for timestamping the job.

use chrono::{DateTime, Utc};

/// Provides the current time.
///
/// Abstracting the clock keeps job timestamps deterministic in tests.
pub trait Clock: Send + Sync {
    /// Returns the current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

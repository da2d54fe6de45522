//! Optional `.coveralls.yml` project configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::{ProcessingError, ReportError};

/// Name of the conventional config file at the project base dir.
pub const CONFIG_FILE: &str = ".coveralls.yml";

/// Values read from `.coveralls.yml`.
///
/// Precedence is CLI flag, then this file, then CI service detection;
/// unknown keys are ignored for compatibility with other Coveralls
/// tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileConfig {
    /// Repository token authenticating the submission.
    #[serde(default)]
    pub repo_token: Option<String>,
    /// CI service name.
    #[serde(default)]
    pub service_name: Option<String>,
    /// Submission endpoint override.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl FileConfig {
    /// Loads the config file under `base_dir`, or defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file exists but cannot be read, or a
    /// processing error when it is not valid YAML.
    pub fn load(base_dir: &Path) -> Result<Self, ReportError> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)?;
        serde_yaml::from_str(&text).map_err(|err| {
            ProcessingError::MalformedReport { file: path, detail: err.to_string() }.into()
        })
    }
}

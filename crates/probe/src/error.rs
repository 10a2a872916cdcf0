//! Error types for external command execution.
//!
//! These errors never escape a probe: [`crate::Probe::execute`] folds them
//! into an absent [`crate::ProbeResult`]. They are public so that callers
//! driving a [`crate::Shell`] directly (configuration items, page sources)
//! can match on them.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while running an external command.
#[derive(Debug, Error)]
pub enum Error {
    /// The program is not on PATH
    #[error("command not found: {program}")]
    NotFound {
        /// Program that was looked up
        program: String,
    },

    /// The process could not be spawned or waited on
    #[error("failed to execute {command}: {source}")]
    Spawn {
        /// Rendered command line
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process outlived its bounded wait and was killed
    #[error("{command} timed out after {}s", timeout.as_secs())]
    Timeout {
        /// Rendered command line
        command: String,
        /// The wait that was exceeded
        timeout: Duration,
    },
}

impl Error {
    /// Whether the error means the tool is simply absent from this host.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
            || matches!(self, Self::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, Error>;

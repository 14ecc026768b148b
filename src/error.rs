//! Error types surfaced by the rotation engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems detected while building an appender.
///
/// The appender refuses to start rather than run in an undefined state;
/// none of these are recoverable at runtime.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The appender name would escape the log directory when substituted
    /// into the file name.
    #[error("appender name `{0}` cannot contain filesystem path elements")]
    InvalidName(String),

    /// The minimum historical index must be non-negative.
    #[error("min index {0} cannot be negative")]
    InvalidMinIndex(i32),

    /// The configured rotation hour is outside `0..=23`.
    #[error("roll hour {0} is outside the 0..=23 range")]
    InvalidRollHour(u8),

    /// The configured rotation minute is outside `0..=59`.
    #[error("roll minute {0} is outside the 0..=59 range")]
    InvalidRollMinute(u8),

    /// No explicit file, no directory and no `LOG_DIR` variable: there is
    /// nowhere to append.
    #[error("no log file path: set an explicit file, a directory, or the LOG_DIR environment variable")]
    MissingPath,

    /// A process-wide property was set but does not parse as the expected
    /// type.
    #[error("could not parse `{value}` from {var}")]
    InvalidProperty {
        /// The environment variable that held the value.
        var: &'static str,
        /// The raw value found in the environment.
        value: String,
    },

    /// The active log file could not be opened for appending.
    #[error("failed to open log file {}", path.display())]
    Open {
        /// The resolved active file path.
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A rename or delete failed while shifting the historical window.
///
/// The rotation attempt is abandoned as a whole: the active file keeps
/// receiving appends and the next scheduled instant retries. Continuing
/// past a failed delete would grow the window without bound.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RolloverError {
    #[error("could not delete old log {}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not rename {} to {}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

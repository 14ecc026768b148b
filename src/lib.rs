//! An indexed rolling file appender.
//!
//! # Overview
//!
//! This crate provides a file appender for long-running server processes
//! that keeps disk usage bounded while preserving recent history. Each
//! [`RollingFileAppender`][appender] owns one actively-written file,
//! `<name>.log`, rotates it once a day at a configured time into a bounded
//! window of indexed historical files (`<name>.log.1` is the youngest,
//! `<name>.log.N` the oldest, about to be evicted), and optionally gzips
//! rotated files in the background (`<name>.log.<i>.gz`).
//!
//! Rotation across many co-located appenders is staggered by a small
//! per-instance jitter offset so that a fleet of processes sharing the same
//! schedule does not hit the disk at the same moment.
//!
//! There is no persisted rotation metadata: file existence and the index in
//! the file name are the only source of truth, so a crash at any point —
//! mid-shift, mid-compress — is recovered from on the next pass. A process
//! that was down across a scheduled instant rotates once at startup before
//! the recurring schedule is armed.
//!
//! [appender]: appender::RollingFileAppender
//!
//! # Usage
//!
//! A process constructs exactly one [`Scheduler`][scheduler] — the shared
//! timer and worker pool — and threads it through to every appender it
//! builds:
//!
//! ```rust
//! # fn docs() {
//! use tracing_rolling::appender::RollingFileAppender;
//! use tracing_rolling::scheduler::Scheduler;
//!
//! let scheduler = Scheduler::new();
//! let appender = RollingFileAppender::builder("my-app")
//!     .directory("/var/log")
//!     .build(&scheduler)
//!     .expect("failed to build appender");
//!
//! let subscriber = tracing_subscriber::fmt().with_writer(appender);
//! tracing::subscriber::set_global_default(subscriber.finish())
//!     .expect("could not set global default");
//! # }
//! ```
//!
//! Every option can also be supplied process-wide through `LOG_*`
//! environment variables (`LOG_DIR`, `LOG_INDEX_MAX`, `LOG_ROLL_HOUR`, …);
//! an explicit builder setting always wins. See the [`builder`] module.
//!
//! Compression is enabled per appender:
//!
//! ```rust
//! # #[cfg(feature = "gzip")]
//! # fn docs() {
//! use tracing_rolling::appender::RollingFileAppender;
//! use tracing_rolling::compression::CompressionOption;
//! use tracing_rolling::scheduler::Scheduler;
//!
//! let scheduler = Scheduler::new();
//! let appender = RollingFileAppender::builder("my-app")
//!     .directory("/var/log")
//!     .max_index(7)
//!     .compress(CompressionOption::GzipFast)
//!     .build(&scheduler)
//!     .expect("failed to build appender");
//! # }
//! ```

/// The active writer: appends, rotation and startup recovery.
pub mod appender;

/// Configuration: explicit settings, `LOG_*` environment fallbacks,
/// validation.
pub mod builder;

/// Gzip compression of rotated files.
#[cfg(feature = "gzip")]
#[cfg_attr(docsrs, doc(cfg(feature = "gzip")))]
pub mod compression;

/// Error types surfaced by the rotation engine.
pub mod error;

/// The process-wide packaging-metadata toggle.
pub mod packaging;

/// The shared timer and worker pool driving rotation and compression.
pub mod scheduler;

mod fsutil;
mod index;
mod schedule;
mod sync;

use std::path::Path;

use crate::appender::RollingFileAppender;
use crate::error::ConfigError;
use crate::scheduler::Scheduler;

/// Convenience function for an appender with default settings: appends to
/// `<directory>/<name>.log`, keeps `<name>.log.1` through `<name>.log.3`,
/// rotates at midnight UTC, no compression.
///
/// # Examples
///
/// ```rust
/// # fn docs() {
/// use tracing_rolling::scheduler::Scheduler;
///
/// let scheduler = Scheduler::new();
/// let appender = tracing_rolling::daily("/var/log", "my-app", &scheduler)
///     .expect("failed to build appender");
/// # }
/// ```
pub fn daily(
    directory: impl AsRef<Path>,
    name: impl AsRef<str>,
    scheduler: &Scheduler,
) -> Result<RollingFileAppender, ConfigError> {
    RollingFileAppender::builder(name.as_ref())
        .directory(directory.as_ref())
        .build(scheduler)
}

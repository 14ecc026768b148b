//! The active writer: appends, the rotation path, startup recovery and
//! schedule arming.
//!
//! A [`RollingFileAppender`] owns exactly one actively-written file.
//! Appends and rotation contend on a single per-file lock, so a rotation
//! can never interleave with a write; appends block on rotation only for
//! the time it takes to close, shift and reopen a handful of files.
//!
//! # Examples
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

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use time::OffsetDateTime;
use tracing_subscriber::fmt::MakeWriter;

use crate::builder::Builder;
use crate::error::{ConfigError, RolloverError};
use crate::fsutil;
use crate::index::{self, IndexWindow};
use crate::schedule::{self, Schedule};
use crate::scheduler::Scheduler;
use crate::sync::Mutex;

#[cfg(feature = "gzip")]
use crate::compression::{self, CompressionConfig};

/// How long after a rotation the compression pass runs, so the shifter's
/// renames have settled before the compressor touches the same names.
const COMPRESSION_DELAY: Duration = Duration::from_secs(60);

/// Validated configuration assembled by [`Builder::build`].
pub(crate) struct Config {
    pub(crate) file: PathBuf,
    pub(crate) window: IndexWindow,
    pub(crate) schedule: Schedule,
    pub(crate) jitter: Duration,
    pub(crate) roll_enabled: bool,
    pub(crate) immediate_flush: bool,
    #[cfg(feature = "gzip")]
    pub(crate) compression: Option<CompressionConfig>,
}

#[derive(Debug)]
struct Inner {
    file: PathBuf,
    window: IndexWindow,
    immediate_flush: bool,
    #[cfg(feature = "gzip")]
    compression: Option<CompressionConfig>,
    /// `None` only after `close`; rotation swaps the handle in place.
    writer: Mutex<Option<BufWriter<File>>>,
    stopped: AtomicBool,
}

/// A file appender that appends to `<name>.log`, rotates it on a daily
/// schedule into a bounded window of indexed historical files
/// (`<name>.log.1` … `<name>.log.N`), and optionally gzips rotated files
/// in the background.
///
/// Handles are cheap to clone and all clones share the same file and lock.
/// `RollingFileAppender` implements [`std::io::Write`] and [`MakeWriter`],
/// so it can be handed directly to a `tracing-subscriber` fmt layer.
///
/// [`MakeWriter`]: tracing_subscriber::fmt::MakeWriter
#[derive(Debug, Clone)]
pub struct RollingFileAppender {
    inner: Arc<Inner>,
}

impl RollingFileAppender {
    /// Starts building an appender named `name`; the name becomes the
    /// `<name>.log` file name unless an explicit file is set.
    pub fn builder(name: impl Into<String>) -> Builder {
        Builder::new(name)
    }

    pub(crate) fn start(config: Config, scheduler: &Scheduler) -> Result<Self, ConfigError> {
        let now = OffsetDateTime::now_utc();

        // Roll first if a scheduled instant passed while the process was
        // down. The file is not opened for writing yet, so this skips the
        // live lock-contended path entirely.
        let mut recovered = false;
        if config.roll_enabled {
            let previous = config.schedule.previous_instant(now);
            if let Some(modified) = fsutil::modified(&config.file) {
                if OffsetDateTime::from(modified) < previous {
                    match index::shift(&config.file, config.window) {
                        Ok(()) => recovered = true,
                        Err(error) => tracing::error!(
                            %error,
                            file = %config.file.display(),
                            "failed to roll logs at startup, will try again at the next scheduled instant"
                        ),
                    }
                }
            }
        }

        let file = fsutil::open_append(&config.file).map_err(|source| ConfigError::Open {
            path: config.file.clone(),
            source,
        })?;

        let inner = Arc::new(Inner {
            file: config.file,
            window: config.window,
            immediate_flush: config.immediate_flush,
            #[cfg(feature = "gzip")]
            compression: config.compression,
            writer: Mutex::new(Some(BufWriter::new(file))),
            stopped: AtomicBool::new(false),
        });

        if recovered {
            inner.schedule_compression(scheduler);
        }

        if config.roll_enabled {
            let base = config.schedule.next_instant(now);
            arm(scheduler.clone(), Arc::downgrade(&inner), base, config.jitter);
        }

        Ok(RollingFileAppender { inner })
    }

    /// Rotates now: closes the active file, shifts the historical window
    /// up by one, and reopens a fresh active file.
    ///
    /// A rotation with no active file on disk is a no-op: there is nothing
    /// to roll. If the shift fails the existing file is reopened and keeps
    /// receiving appends — bytes already written are never truncated by a
    /// failed rotation attempt.
    pub fn rotate(&self) -> Result<(), RolloverError> {
        self.inner.rotate()
    }

    /// Flushes and closes the active file and stops future scheduled
    /// rotations. Appends after `close` return an error.
    ///
    /// Affects every clone of this handle.
    pub fn close(&self) {
        self.inner.stopped.store(true, Ordering::Release);
        let mut writer = self.inner.writer.lock();
        if let Some(mut file) = writer.take() {
            if let Err(error) = file.flush() {
                eprintln!("failed to flush {}: {}", self.inner.file.display(), error);
            }
        }
    }
}

impl Inner {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut writer = self.writer.lock();
        match writer.as_mut() {
            Some(file) => {
                file.write_all(buf)?;
                if self.immediate_flush {
                    file.flush()?;
                }
                Ok(buf.len())
            }
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                "appender is closed",
            )),
        }
    }

    fn flush(&self) -> io::Result<()> {
        if let Some(file) = self.writer.lock().as_mut() {
            file.flush()?;
        }
        Ok(())
    }

    fn rotate(&self) -> Result<(), RolloverError> {
        let mut writer = self.writer.lock();
        // checked under the lock: a close racing this rotation must not
        // see its writer resurrected
        if self.stopped.load(Ordering::Acquire) {
            return Ok(());
        }
        if !self.file.exists() {
            // nothing to roll
            return Ok(());
        }
        if let Some(mut current) = writer.take() {
            if let Err(error) = current.flush() {
                eprintln!("failed to flush {}: {}", self.file.display(), error);
            }
        }
        let shifted = index::shift(&self.file, self.window);
        // Reopen whether or not the shift succeeded: on failure the old
        // file is still in place and appends must keep landing in it.
        match fsutil::open_append(&self.file) {
            Ok(file) => *writer = Some(BufWriter::new(file)),
            Err(error) => eprintln!("failed to reopen {}: {}", self.file.display(), error),
        }
        shifted
    }

    #[cfg(feature = "gzip")]
    fn schedule_compression(&self, scheduler: &Scheduler) {
        if let Some(config) = self.compression {
            let file = self.file.clone();
            let window = self.window;
            scheduler.schedule_after(COMPRESSION_DELAY, move || {
                compression::compress_window(&file, window, config);
            });
        }
    }

    #[cfg(not(feature = "gzip"))]
    fn schedule_compression(&self, _scheduler: &Scheduler) {}
}

/// Arms the one-shot timer for the next scheduled instant and re-arms
/// after every firing, advancing the base instant by exactly one day.
/// Jitter is a constant per-instance offset layered on top of the base
/// chain, so it never accumulates.
///
/// The task holds only a weak reference: once every appender handle is
/// dropped, the chain stops rescheduling itself.
fn arm(scheduler: Scheduler, inner: Weak<Inner>, base: OffsetDateTime, jitter: Duration) {
    let delay = schedule::delay_until(base, OffsetDateTime::now_utc()) + jitter;
    let rearm = scheduler.clone();
    scheduler.schedule_after(delay, move || {
        let strong = match inner.upgrade() {
            Some(inner) => inner,
            None => return,
        };
        if strong.stopped.load(Ordering::Acquire) {
            return;
        }
        match strong.rotate() {
            Ok(()) => strong.schedule_compression(&rearm),
            Err(error) => tracing::warn!(
                %error,
                file = %strong.file.display(),
                "rollover failed, deferring to the next scheduled instant"
            ),
        }
        let inner = Arc::downgrade(&strong);
        drop(strong);
        arm(rearm, inner, base + time::Duration::days(1), jitter);
    });
}

impl io::Write for RollingFileAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingFileAppender {
    type Writer = RollingFileAppender;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

//! Builder struct for `RollingFileAppender`.
//!
//! Every option resolves in the same order: an explicit setter wins, then a
//! process-wide environment variable, then a hardcoded default. Validation
//! runs once, in [`build`](Builder::build); an appender that would run in
//! an undefined state refuses to start instead.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::appender::{Config, RollingFileAppender};
use crate::error::ConfigError;
use crate::index::IndexWindow;
use crate::packaging;
use crate::schedule::{self, Schedule};
use crate::scheduler::Scheduler;

#[cfg(feature = "gzip")]
use crate::compression::{CompressionConfig, CompressionOption};

pub const DEFAULT_MIN_INDEX: i32 = 1;
pub const DEFAULT_MAX_INDEX: i32 = 3;
pub const DEFAULT_ROLL_HOUR: u8 = 0;
pub const DEFAULT_ROLL_MINUTE: u8 = 0;
pub const DEFAULT_ROLL_ENABLED: bool = true;
// can be set to false for especially intensive logs
pub const DEFAULT_IMMEDIATE_FLUSH: bool = true;

pub(crate) const ENV_LOG_DIR: &str = "LOG_DIR";
pub(crate) const ENV_INDEX_MIN: &str = "LOG_INDEX_MIN";
pub(crate) const ENV_INDEX_MAX: &str = "LOG_INDEX_MAX";
pub(crate) const ENV_ROLL_HOUR: &str = "LOG_ROLL_HOUR";
pub(crate) const ENV_ROLL_MINUTE: &str = "LOG_ROLL_MINUTE";
pub(crate) const ENV_ROLL_ENABLED: &str = "LOG_ROLL_ENABLED";
#[cfg(feature = "gzip")]
pub(crate) const ENV_ROLL_COMPRESS: &str = "LOG_ROLL_COMPRESS";
pub(crate) const ENV_IMMEDIATE_FLUSH: &str = "LOG_IMMEDIATE_FLUSH";
pub(crate) const ENV_PACKAGING_INFO: &str = "LOG_PACKAGING_INFO";

/// Configures and starts a [`RollingFileAppender`].
///
/// The appender name is the only required argument; it becomes the
/// `<name>.log` file name unless an explicit file path is set.
///
/// # Examples
///
/// ```rust
/// # fn docs() {
/// use tracing_rolling::appender::RollingFileAppender;
/// use tracing_rolling::scheduler::Scheduler;
///
/// let scheduler = Scheduler::new();
/// let appender = RollingFileAppender::builder("my-app")
///     .directory("/var/log")
///     .max_index(5)
///     .roll_hour(4)
///     .build(&scheduler)
///     .expect("failed to build appender");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    name: String,
    file: Option<PathBuf>,
    directory: Option<PathBuf>,
    min_index: Option<i32>,
    max_index: Option<i32>,
    roll_hour: Option<u8>,
    roll_minute: Option<u8>,
    roll_enabled: Option<bool>,
    immediate_flush: Option<bool>,
    append: bool,
    collect_packaging_info: Option<bool>,
    jitter: Option<Duration>,
    #[cfg(feature = "gzip")]
    compression: Option<CompressionOption>,
}

impl Builder {
    /// Starts a builder for an appender named `name`.
    pub fn new(name: impl Into<String>) -> Builder {
        Builder {
            name: name.into(),
            file: None,
            directory: None,
            min_index: None,
            max_index: None,
            roll_hour: None,
            roll_minute: None,
            roll_enabled: None,
            immediate_flush: None,
            append: true,
            collect_packaging_info: None,
            jitter: None,
            #[cfg(feature = "gzip")]
            compression: None,
        }
    }

    /// Sets the active file path explicitly, bypassing the
    /// `{directory}/{name}.log` convention.
    pub fn file(mut self, file: impl AsRef<Path>) -> Builder {
        self.file = Some(file.as_ref().to_path_buf());
        self
    }

    /// Sets the directory the `<name>.log` file is created in.
    pub fn directory(mut self, directory: impl AsRef<Path>) -> Builder {
        self.directory = Some(directory.as_ref().to_path_buf());
        self
    }

    /// Lowest historical index kept; must be non-negative.
    pub fn min_index(mut self, min_index: i32) -> Builder {
        self.min_index = Some(min_index);
        self
    }

    /// Highest historical index kept. Windows wider than 12 slots are
    /// clamped, and a max below the min is corrected to equal it.
    pub fn max_index(mut self, max_index: i32) -> Builder {
        self.max_index = Some(max_index);
        self
    }

    /// Hour of day (UTC, `0..=23`) at which rotation fires.
    pub fn roll_hour(mut self, roll_hour: u8) -> Builder {
        self.roll_hour = Some(roll_hour);
        self
    }

    /// Minute (`0..=59`) at which rotation fires.
    pub fn roll_minute(mut self, roll_minute: u8) -> Builder {
        self.roll_minute = Some(roll_minute);
        self
    }

    /// Enables or disables scheduled rotation wholesale. Disabled leaves a
    /// plain append-only file.
    pub fn roll_enabled(mut self, roll_enabled: bool) -> Builder {
        self.roll_enabled = Some(roll_enabled);
        self
    }

    /// Compresses rotated files in the background with the given level.
    #[cfg(feature = "gzip")]
    #[cfg_attr(docsrs, doc(cfg(feature = "gzip")))]
    pub fn compress(mut self, compression: CompressionOption) -> Builder {
        self.compression = Some(compression);
        self
    }

    /// Flushes to the operating system on every append, trading throughput
    /// for durability if the process crashes.
    pub fn immediate_flush(mut self, immediate_flush: bool) -> Builder {
        self.immediate_flush = Some(immediate_flush);
        self
    }

    /// Append mode is mandatory; passing `false` is corrected back with a
    /// warning. Overwriting existing logs on restart is never permitted.
    pub fn append(mut self, append: bool) -> Builder {
        self.append = append;
        self
    }

    /// Asks the shared logging context to collect packaging metadata; a
    /// process-wide side effect, not a per-appender setting.
    pub fn collect_packaging_info(mut self, collect: bool) -> Builder {
        self.collect_packaging_info = Some(collect);
        self
    }

    /// Injects an explicit jitter offset instead of deriving one from the
    /// scheduler's instance sequence. Mostly useful to make tests
    /// deterministic.
    pub fn jitter(mut self, jitter: Duration) -> Builder {
        self.jitter = Some(jitter);
        self
    }

    /// Validates the configuration and starts the appender, arming its
    /// rotation schedule on `scheduler`.
    pub fn build(self, scheduler: &Scheduler) -> Result<RollingFileAppender, ConfigError> {
        if !self.append {
            // we don't want to void existing log files
            tracing::warn!("append mode is mandatory for RollingFileAppender, ignoring append(false)");
        }

        if self.name.contains("..") || self.name.contains('/') || self.name.contains('\\') {
            return Err(ConfigError::InvalidName(self.name));
        }

        let min_index = resolve(self.min_index, ENV_INDEX_MIN, DEFAULT_MIN_INDEX)?;
        let max_index = resolve(self.max_index, ENV_INDEX_MAX, DEFAULT_MAX_INDEX)?;
        if min_index < 0 {
            return Err(ConfigError::InvalidMinIndex(min_index));
        }

        let roll_hour = resolve(self.roll_hour, ENV_ROLL_HOUR, DEFAULT_ROLL_HOUR)?;
        if roll_hour > 23 {
            return Err(ConfigError::InvalidRollHour(roll_hour));
        }
        let roll_minute = resolve(self.roll_minute, ENV_ROLL_MINUTE, DEFAULT_ROLL_MINUTE)?;
        if roll_minute > 59 {
            return Err(ConfigError::InvalidRollMinute(roll_minute));
        }

        let roll_enabled = resolve(self.roll_enabled, ENV_ROLL_ENABLED, DEFAULT_ROLL_ENABLED)?;
        let immediate_flush =
            resolve(self.immediate_flush, ENV_IMMEDIATE_FLUSH, DEFAULT_IMMEDIATE_FLUSH)?;

        let file = match self.file {
            Some(file) => file,
            None => {
                let directory = self
                    .directory
                    .or_else(|| env::var_os(ENV_LOG_DIR).map(PathBuf::from))
                    .ok_or(ConfigError::MissingPath)?;
                directory.join(format!("{}.log", self.name))
            }
        };

        #[cfg(feature = "gzip")]
        let compression = match self.compression {
            Some(option) => Some(CompressionConfig::from(option)),
            None => {
                if resolve::<bool>(None, ENV_ROLL_COMPRESS, false)? {
                    Some(CompressionConfig::from(CompressionOption::GzipFast))
                } else {
                    None
                }
            }
        };

        let collect = resolve(self.collect_packaging_info, ENV_PACKAGING_INFO, false)?;
        packaging::set_collect_packaging_info(collect);

        let seq = scheduler.next_instance_seq();
        let jitter = self.jitter.unwrap_or_else(|| schedule::jitter_for(seq));

        RollingFileAppender::start(
            Config {
                file,
                window: IndexWindow::new(min_index, max_index),
                schedule: Schedule::new(roll_hour, roll_minute),
                jitter,
                roll_enabled,
                immediate_flush,
                #[cfg(feature = "gzip")]
                compression,
            },
            scheduler,
        )
    }
}

/// One configuration parameter: explicit value, else the trimmed
/// process-wide variable, else the default. A variable that is set but
/// unparseable is a fatal configuration error, not a silent fallback.
fn resolve<T: FromStr>(
    explicit: Option<T>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    if let Some(value) = explicit {
        return Ok(value);
    }
    match env::var(var) {
        Ok(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(default);
            }
            trimmed
                .parse()
                .map_err(|_| ConfigError::InvalidProperty { var, value: raw })
        }
        Err(_) => Ok(default),
    }
}

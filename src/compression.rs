//! Deferred gzip compression of rotated files.
//!
//! Compression runs on the shared scheduler a short while after rotation
//! completes, so the shifter's renames — which touch both plain and
//! compressed names — are never racing the compressor. The pass is
//! idempotent and safe to re-run after a crash: a slot that only holds a
//! compressed file is skipped, and debris from an attempt that never
//! finished is deleted and re-compressed from the surviving plain file.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::index::{self, IndexWindow};

/// Compression level for rotated files.
///
/// Levels map onto `flate2`'s: 0 stores without compressing, 1 prefers
/// speed, 9 prefers ratio.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[non_exhaustive]
pub enum CompressionOption {
    /// Store only (gzip level 0).
    GzipNone,
    /// Prefer speed (gzip level 1).
    GzipFast,
    /// Prefer ratio (gzip level 9).
    GzipBest,
    /// An explicit gzip level; values above 9 are treated as 9.
    GzipLevel(u32),
}

/// Resolved compression parameters carried by the appender.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct CompressionConfig {
    level: CompressionOption,
}

impl From<CompressionOption> for CompressionConfig {
    fn from(level: CompressionOption) -> Self {
        CompressionConfig { level }
    }
}

impl CompressionConfig {
    fn gz_level(&self) -> Compression {
        match self.level {
            CompressionOption::GzipNone => Compression::none(),
            CompressionOption::GzipFast => Compression::fast(),
            CompressionOption::GzipBest => Compression::best(),
            CompressionOption::GzipLevel(level) => Compression::new(level.min(9)),
        }
    }
}

/// Compresses every plain historical file in the window, oldest first.
///
/// Walks `i` from `max - 1` down to `min`; slot `max` is never compressed
/// in place, it is the next slot to be evicted. Failures are per-file: the
/// offending slot is skipped with its plain file intact and the pass
/// continues, so one bad file never loses another file's data.
pub(crate) fn compress_window(file: &Path, window: IndexWindow, config: CompressionConfig) {
    let mut i = window.max() - 1;
    while i >= window.min() {
        compress_slot(file, i, config);
        i -= 1;
    }
}

fn compress_slot(file: &Path, i: i32, config: CompressionConfig) {
    let plain = index::plain(file, i);
    if !plain.exists() {
        return;
    }
    let compressed = index::compressed(file, i);
    if compressed.exists() {
        // The plain source survived, so whatever sits at the destination
        // is debris of an attempt that never finished.
        tracing::debug!(
            path = %compressed.display(),
            "deleting potentially corrupted archive, uncompressed version is present"
        );
        if let Err(error) = fs::remove_file(&compressed) {
            tracing::warn!(path = %compressed.display(), %error, "could not delete stale archive, skipping slot");
            return;
        }
    }
    if let Err(error) = compress_file(&plain, &compressed, config) {
        tracing::warn!(path = %plain.display(), %error, "compression failed, keeping the plain file");
        return;
    }
    if let Err(error) = fs::remove_file(&plain) {
        tracing::warn!(path = %plain.display(), %error, "could not remove plain file after compression");
    }
}

/// Gzips `from` into `to`. The archive is fully written and closed before
/// this returns; the caller only deletes the source on success.
fn compress_file(from: &Path, to: &Path, config: CompressionConfig) -> io::Result<()> {
    let mut reader = BufReader::new(File::open(from)?);
    let writer = GzEncoder::new(File::create(to)?, config.gz_level());
    let mut writer = BufWriter::new(writer);

    io::copy(&mut reader, &mut writer)?;
    writer
        .into_inner()
        .map_err(io::IntoInnerError::into_error)?
        .finish()?;
    Ok(())
}

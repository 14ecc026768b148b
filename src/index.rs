//! The historical index window and the shift that makes room at the bottom
//! of it.
//!
//! Historical files live at `<file>.<i>` (plain) or `<file>.<i>.gz`
//! (compressed) for `i` in the configured window. Every rotation moves each
//! occupied slot up by one, evicting whatever sits at the top slot, and
//! parks the active file in the freed bottom slot.

use std::path::{Path, PathBuf};

use crate::error::RolloverError;
use crate::fsutil;

/// It's almost always a bad idea to have a large window, say over 12:
/// every rotation pays one rename per occupied slot.
pub(crate) const MAX_WINDOW_SIZE: i32 = 12;

/// The contiguous range of historical file slots kept on disk.
///
/// Configured once at startup and immutable thereafter.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct IndexWindow {
    min: i32,
    max: i32,
}

impl IndexWindow {
    /// Builds a window from raw configuration, correcting `max < min` and
    /// clamping oversized windows rather than rejecting them.
    pub(crate) fn new(min: i32, max: i32) -> Self {
        let mut max = max;
        if max < min {
            tracing::warn!(
                min,
                max,
                "max index cannot be smaller than min index, setting max index to equal min index"
            );
            max = min;
        }
        if max - min > MAX_WINDOW_SIZE {
            max = min + MAX_WINDOW_SIZE;
            tracing::warn!(max, "large windows are not allowed, max index reduced");
        }
        IndexWindow { min, max }
    }

    pub(crate) fn min(&self) -> i32 {
        self.min
    }

    pub(crate) fn max(&self) -> i32 {
        self.max
    }
}

/// `<file>.<i>` — the plain historical file at `index`.
pub(crate) fn plain(file: &Path, index: i32) -> PathBuf {
    indexed(file, index, "")
}

/// `<file>.<i>.gz` — the compressed historical file at `index`.
pub(crate) fn compressed(file: &Path, index: i32) -> PathBuf {
    indexed(file, index, ".gz")
}

fn indexed(file: &Path, index: i32, suffix: &str) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(format!(".{}{}", index, suffix));
    PathBuf::from(name)
}

/// Shifts every occupied slot up by one and moves the active file into the
/// freed slot at `min`.
///
/// Slot `max` is vacated first; losing the oldest index is the designed
/// eviction, but failing to delete it aborts the rotation — continuing
/// would grow the window without bound. A negative `max` disables shifting
/// entirely (configuration corrects `max < min` before a window ever gets
/// here, so this is reserved rather than reachable).
pub(crate) fn shift(file: &Path, window: IndexWindow) -> Result<(), RolloverError> {
    if window.max() < 0 {
        return Ok(());
    }

    fsutil::remove_if_exists(&plain(file, window.max()))?;
    fsutil::remove_if_exists(&compressed(file, window.max()))?;

    // Map {max-1, ..., min} onto {max, ..., min+1}. Both forms are checked
    // at every slot: a crash mid-compress can leave a plain and a
    // compressed file at the same index.
    let mut i = window.max() - 1;
    while i >= window.min() {
        let from = compressed(file, i);
        if from.exists() {
            fsutil::rename(&from, &compressed(file, i + 1))?;
        }
        let from = plain(file, i);
        if from.exists() {
            fsutil::rename(&from, &plain(file, i + 1))?;
        }
        i -= 1;
    }

    fsutil::rename(file, &plain(file, window.min()))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn corrects_inverted_window() {
        let window = IndexWindow::new(5, 3);
        assert_eq!(window.min(), 5);
        assert_eq!(window.max(), 5);
    }

    #[test]
    fn clamps_oversized_window() {
        let window = IndexWindow::new(1, 100);
        assert_eq!(window.min(), 1);
        assert_eq!(window.max(), 1 + MAX_WINDOW_SIZE);
    }

    #[test]
    fn keeps_window_at_cap() {
        let window = IndexWindow::new(1, 1 + MAX_WINDOW_SIZE);
        assert_eq!(window.max(), 1 + MAX_WINDOW_SIZE);
    }

    #[test]
    fn indexed_names() {
        let file = Path::new("/var/log/app.log");
        assert_eq!(plain(file, 3), Path::new("/var/log/app.log.3"));
        assert_eq!(compressed(file, 3), Path::new("/var/log/app.log.3.gz"));
    }

    #[test]
    fn shift_evicts_top_and_moves_every_slot() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let file = dir.path().join("app.log");
        fs::write(&file, "active").unwrap();
        fs::write(plain(&file, 1), "one").unwrap();
        fs::write(compressed(&file, 2), "two-gz").unwrap();
        fs::write(plain(&file, 3), "three").unwrap();

        shift(&file, IndexWindow::new(1, 3)).expect("shift failed");

        assert!(!file.exists());
        assert_eq!(fs::read_to_string(plain(&file, 1)).unwrap(), "active");
        assert_eq!(fs::read_to_string(plain(&file, 2)).unwrap(), "one");
        assert_eq!(fs::read_to_string(compressed(&file, 3)).unwrap(), "two-gz");
        // the old slot 3 content was evicted, not shifted to 4
        assert!(!plain(&file, 3).exists());
        assert!(!plain(&file, 4).exists());
        assert!(!compressed(&file, 4).exists());
    }

    #[test]
    fn shift_moves_both_forms_left_by_a_crash() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let file = dir.path().join("app.log");
        fs::write(&file, "active").unwrap();
        fs::write(plain(&file, 1), "one").unwrap();
        fs::write(compressed(&file, 1), "one-gz").unwrap();

        shift(&file, IndexWindow::new(1, 3)).expect("shift failed");

        assert_eq!(fs::read_to_string(plain(&file, 1)).unwrap(), "active");
        assert_eq!(fs::read_to_string(plain(&file, 2)).unwrap(), "one");
        assert_eq!(fs::read_to_string(compressed(&file, 2)).unwrap(), "one-gz");
    }

    #[test]
    fn shift_with_single_slot_window() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let file = dir.path().join("app.log");
        fs::write(&file, "new").unwrap();
        fs::write(plain(&file, 1), "old").unwrap();

        shift(&file, IndexWindow::new(1, 1)).expect("shift failed");

        assert_eq!(fs::read_to_string(plain(&file, 1)).unwrap(), "new");
        assert!(!plain(&file, 2).exists());
    }

    #[test]
    fn negative_max_is_a_no_op() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let file = dir.path().join("app.log");
        fs::write(&file, "active").unwrap();

        shift(&file, IndexWindow { min: 0, max: -1 }).expect("shift failed");

        assert_eq!(fs::read_to_string(&file).unwrap(), "active");
    }
}

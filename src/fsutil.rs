//! The filesystem primitives every rotation step is built from.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::time::SystemTime;

use crate::error::RolloverError;

/// Moves `from` to `to`, replacing `to` if it already exists.
///
/// `fs::rename` cannot cross filesystem boundaries, so a failed rename is
/// retried as copy-then-delete before the error is surfaced.
pub(crate) fn rename(from: &Path, to: &Path) -> Result<(), RolloverError> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    copy_then_delete(from, to).map_err(|source| RolloverError::Rename {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

fn copy_then_delete(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to)?;
    fs::remove_file(from)
}

/// Deletes `path` if present. Returns whether a file was actually removed.
pub(crate) fn remove_if_exists(path: &Path) -> Result<bool, RolloverError> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).map_err(|source| RolloverError::Delete {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

/// Opens `path` for appending, creating the file and any missing parent
/// directories first.
pub(crate) fn open_append(path: &Path) -> io::Result<File> {
    let mut open_options = OpenOptions::new();
    open_options.append(true).create(true);

    let file = open_options.open(path);
    if file.is_err() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
            return open_options.open(path);
        }
    }
    file
}

/// Last-modified time of `path`, if it exists and the platform reports one.
pub(crate) fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rename_replaces_destination() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let from = dir.path().join("a");
        let to = dir.path().join("b");
        fs::write(&from, "fresh").unwrap();
        fs::write(&to, "stale").unwrap();

        rename(&from, &to).expect("rename failed");

        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "fresh");
    }

    #[test]
    fn remove_if_exists_reports_removal() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join("victim");
        fs::write(&path, "x").unwrap();

        assert!(remove_if_exists(&path).unwrap());
        assert!(!remove_if_exists(&path).unwrap());
    }

    #[test]
    fn open_append_creates_missing_parents() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join("deep/nested/app.log");

        let file = open_append(&path).expect("open failed");
        drop(file);

        assert!(path.exists());
    }
}

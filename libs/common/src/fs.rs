//! Small file helpers used by the flat-file stores

use crate::error::{StoreError, StoreResult};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Create the parent directory of `path` if it has one
pub fn ensure_parent(path: &Path) -> StoreResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))
        }
        _ => Ok(()),
    }
}

/// Read a whole file, treating a missing file as `None`
///
/// Bytes that are not UTF-8 are replaced with U+FFFD so that the line and
/// JSON parsers downstream skip or ignore the damaged entry.
pub fn read_optional(path: &Path) -> StoreResult<Option<String>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    match String::from_utf8(bytes) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) => {
            warn!("{} is not valid UTF-8; damaged bytes replaced", path.display());
            Ok(Some(String::from_utf8_lossy(e.as_bytes()).into_owned()))
        }
    }
}

/// Append `contents` to `path`, creating the file if needed
pub fn append(path: &Path, contents: &str) -> StoreResult<()> {
    ensure_parent(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StoreError::io(path, e))?;
    file.write_all(contents.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| StoreError::io(path, e))
}

/// Replace the contents of `path` by writing a sibling file and renaming it
/// over the original
pub fn replace(path: &Path, contents: &str) -> StoreResult<()> {
    ensure_parent(path)?;
    let tmp = staging_path(path);

    let write = || -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::io(path, e)
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

//! Pre-flight checks for the directories a run works on and validation
//! helpers for configuration values.

use validator::ValidationError;

use std::ffi::OsString;
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};

use crate::backup::generation::max_index_for_width;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;

/// Checks that `path` is an existing directory and returns it without any
/// trailing separator.
pub fn normalize_dir<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Err(Error::NotFound {
            path: path.to_path_buf(),
        });
    }

    Ok(strip_trailing_separator(path))
}

/// Normalizes source and destination together so both problems are reported
/// in one go when neither exists.
pub fn normalize_source_and_destination<P1: AsRef<Path>, P2: AsRef<Path>>(
    source: P1,
    destination: P2,
) -> Result<(PathBuf, PathBuf)> {
    match (normalize_dir(source), normalize_dir(destination)) {
        (Ok(s), Ok(d)) => Ok((s, d)),
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
        (Err(e1), Err(e2)) => Err(e1.chain(e2)),
    }
}

/// Rebuilding from components drops trailing separators (and repeated ones)
/// while keeping a bare root intact.
pub fn strip_trailing_separator<P: AsRef<Path>>(path: P) -> PathBuf {
    path.as_ref().components().collect()
}

/// Appends a separator so rsync treats the path as "contents of" rather than
/// the directory itself.
pub fn with_trailing_separator<P: AsRef<Path>>(path: P) -> OsString {
    let mut s = path.as_ref().as_os_str().to_owned();
    if !path.as_ref().as_os_str().is_empty() && !ends_with_separator(path.as_ref()) {
        s.push(MAIN_SEPARATOR_STR);
    }
    s
}

fn ends_with_separator(path: &Path) -> bool {
    path.as_os_str()
        .to_str()
        .and_then(|s| s.chars().last())
        .map(std::path::is_separator)
        .unwrap_or(false)
}

/// Name the generation directories are prefixed with: the last component of
/// the source directory. Relative paths like `.` are resolved first.
pub fn source_base_name<P: AsRef<Path>>(source: P) -> Result<String> {
    let source = source.as_ref();
    let name = match source.file_name() {
        Some(name) => Some(name.to_owned()),
        None => source
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(ToOwned::to_owned)),
    };
    name.map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::MissingBaseName {
            path: source.to_path_buf(),
        })
}

pub fn validate_index_fits_width(
    index: u32,
    width: u8,
) -> std::result::Result<(), ValidationError> {
    let max = max_index_for_width(width);
    if index > max {
        return Err(ValidationError::new("RetentionTooLarge").with_message(
            format!("retention count {index} does not fit in {width} digits (max {max})").into(),
        ));
    }

    Ok(())
}

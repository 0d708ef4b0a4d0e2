//! Ownership marker for container directories created by this tool.
//!
//! A container directory may exist for reasons unrelated to linking (the
//! GIS itself writes `cell_misc/<map>/` for every raster). Only directories
//! carrying the marker somewhere below them may be removed wholesale.

use std::path::{Path, PathBuf};

use crate::error::{MapLinkError, Result};
use crate::ports::FileSystem;

/// Reserved file name of the marker. The file is empty.
pub const MARKER_NAME: &str = "maplink.owned";

/// Path of the marker inside `directory`.
#[must_use]
pub fn marker_path(directory: &Path) -> PathBuf {
    directory.join(MARKER_NAME)
}

/// Returns `true` if `path` names a marker file.
#[must_use]
pub fn is_marker(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == MARKER_NAME)
}

/// Writes the marker into a freshly created container directory.
///
/// # Errors
///
/// Returns [`MapLinkError::SystemFailure`] if the file cannot be created.
pub fn write_marker(fs: &dyn FileSystem, directory: &Path) -> Result<()> {
    let path = marker_path(directory);
    fs.touch(&path).map_err(|e| MapLinkError::system("Failed to write marker", path, e))
}

/// Searches `directory` recursively for a marker file.
///
/// # Errors
///
/// Returns [`MapLinkError::SystemFailure`] if the directory cannot be scanned.
pub fn has_marker(fs: &dyn FileSystem, directory: &Path) -> Result<bool> {
    let scan_error = |e| MapLinkError::system("Failed to scan", directory, e);
    for entry in fs.walk_files(directory).map_err(scan_error)? {
        if is_marker(&entry.map_err(scan_error)?) {
            return Ok(true);
        }
    }
    Ok(false)
}

//! Deciding which links may be removed, and removing them.
//!
//! Evaluation never mutates anything; candidates are handed back to the
//! caller, which collects them for the whole dataset and passes them to
//! [`apply_unlink`] once.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::engine::marker;
use crate::error::{MapLinkError, Result};
use crate::ports::{FileIdentity, FileSystem};

/// Warning attached to every preview.
pub const FORCE_WARNING: &str = "Nothing removed. You must use the force flag (--force) to \
                                 actually unlink the listed raster map files. Exiting.";

/// Structural kind of a removal candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Removed with a single-entry delete.
    File,
    /// Removed recursively.
    Directory,
}

/// A path that is safe to remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlinkCandidate {
    /// Path to remove.
    pub path: PathBuf,
    /// File or directory.
    pub kind: EntryKind,
    /// Identity observed at inspection time.
    pub identity: FileIdentity,
}

/// Why a path is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// There is no regular file at the link path.
    NoSuchLink,
    /// The file is the last remaining name of its inode.
    SoleCopy {
        /// The inode that would be lost.
        inode: u64,
    },
    /// The file at the link path is a different inode than the source.
    NotLinkedToSource,
    /// The path is not a real directory.
    NoSuchDirectory,
    /// The directory carries no ownership marker.
    Unmarked,
    /// The directory holds a file that exists nowhere else.
    HoldsSoleCopy {
        /// The file that would be lost.
        path: PathBuf,
    },
}

/// Outcome of evaluating one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlinkDecision {
    /// Leave the path alone.
    Skip {
        /// The evaluated path.
        path: PathBuf,
        /// Why it is kept.
        reason: SkipReason,
    },
    /// The path may be removed.
    Candidate(UnlinkCandidate),
}

/// Final disposition of an unlink run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Disposition {
    /// The run linked; unlinking was not asked for.
    NotRequested,
    /// Unlinking was asked for but nothing qualified.
    NothingToUnlink,
    /// Candidates listed, nothing removed.
    Preview {
        /// What would be removed.
        candidates: Vec<UnlinkCandidate>,
        /// Why nothing was removed.
        warning: String,
    },
    /// Candidates removed.
    Removed {
        /// What was removed, in removal order.
        removed: Vec<UnlinkCandidate>,
        /// Candidates that went away with a directory removed before them.
        covered: Vec<PathBuf>,
    },
}

fn inspect(fs: &dyn FileSystem, path: &Path) -> Result<FileIdentity> {
    fs.identity(path).map_err(|e| MapLinkError::system("Failed to inspect", path, e))
}

/// Decides whether `link`, a mirror of `target`, may be removed.
///
/// A link that is not a symbolic link is kept when its inode has no other
/// name, whatever flags are in effect.
///
/// # Errors
///
/// Returns [`MapLinkError::SystemFailure`] if either path cannot be inspected.
pub fn evaluate_for_unlink(
    fs: &dyn FileSystem,
    target: &Path,
    link: &Path,
) -> Result<UnlinkDecision> {
    if !fs.is_file(link) {
        tracing::debug!("There is no raster map file '{}' to remove", link.display());
        return Ok(UnlinkDecision::Skip { path: link.to_path_buf(), reason: SkipReason::NoSuchLink });
    }

    let target_identity = inspect(fs, target)?;
    if !fs.is_symlink(link) {
        let link_identity = inspect(fs, link)?;
        if target_identity.link_count == 1 || link_identity.link_count == 1 {
            tracing::info!(
                "The file '{}' is the only hardlink for the inode '{}'. Will NOT unlink!",
                link.display(),
                link_identity.inode
            );
            return Ok(UnlinkDecision::Skip {
                path: link.to_path_buf(),
                reason: SkipReason::SoleCopy { inode: link_identity.inode },
            });
        }
        if !link_identity.same_inode(&target_identity) {
            tracing::info!(
                "The file '{}' is not a hardlink of '{}'. Will NOT unlink!",
                link.display(),
                target.display()
            );
            return Ok(UnlinkDecision::Skip {
                path: link.to_path_buf(),
                reason: SkipReason::NotLinkedToSource,
            });
        }
    }

    Ok(UnlinkDecision::Candidate(UnlinkCandidate {
        path: link.to_path_buf(),
        kind: EntryKind::File,
        identity: target_identity,
    }))
}

/// Decides whether a container directory may be removed as a whole.
///
/// The directory must carry the ownership marker and must not hold any
/// file whose inode has no other name.
///
/// # Errors
///
/// Returns [`MapLinkError::SystemFailure`] if the directory cannot be scanned.
pub fn evaluate_directory_for_unlink(
    fs: &dyn FileSystem,
    directory: &Path,
) -> Result<UnlinkDecision> {
    let skip = |reason| {
        Ok(UnlinkDecision::Skip { path: directory.to_path_buf(), reason })
    };
    if fs.is_symlink(directory) || !fs.is_dir(directory) {
        return skip(SkipReason::NoSuchDirectory);
    }
    if !marker::has_marker(fs, directory)? {
        tracing::debug!("Directory '{}' has no ownership marker; leaving it", directory.display());
        return skip(SkipReason::Unmarked);
    }

    let scan_error = |e| MapLinkError::system("Failed to scan", directory, e);
    for entry in fs.walk_files(directory).map_err(scan_error)? {
        let entry = entry.map_err(scan_error)?;
        if marker::is_marker(&entry) || fs.is_symlink(&entry) {
            continue;
        }
        if inspect(fs, &entry)?.link_count == 1 {
            tracing::info!(
                "Directory '{}' holds '{}', the only hardlink for its inode. Will NOT unlink it!",
                directory.display(),
                entry.display()
            );
            return skip(SkipReason::HoldsSoleCopy { path: entry });
        }
    }

    tracing::info!(
        "Directory '{}' appears to be a maplink product. Adding it to the list of elements to unlink. Please review!",
        directory.display()
    );
    Ok(UnlinkDecision::Candidate(UnlinkCandidate {
        path: directory.to_path_buf(),
        kind: EntryKind::Directory,
        identity: inspect(fs, directory)?,
    }))
}

/// Previews or performs removal of the collected candidates.
///
/// Without `force` nothing is touched. With `force` every candidate is
/// removed in collection order; each removal is logged before it happens.
///
/// # Errors
///
/// Returns [`MapLinkError::SystemFailure`] on the first failed removal.
pub fn apply_unlink(
    fs: &dyn FileSystem,
    candidates: Vec<UnlinkCandidate>,
    force: bool,
) -> Result<Disposition> {
    if candidates.is_empty() {
        tracing::info!("The list of raster map files to unlink is empty!");
        return Ok(Disposition::NothingToUnlink);
    }
    if !force {
        tracing::warn!("{FORCE_WARNING}");
        return Ok(Disposition::Preview { candidates, warning: FORCE_WARNING.to_string() });
    }

    let mut removed: Vec<UnlinkCandidate> = Vec::with_capacity(candidates.len());
    let mut covered = Vec::new();
    for candidate in candidates {
        let under_removed_dir = removed
            .iter()
            .any(|r| r.kind == EntryKind::Directory && candidate.path.starts_with(&r.path));
        if under_removed_dir {
            covered.push(candidate.path);
            continue;
        }

        tracing::info!("Removing link: {}", candidate.path.display());
        let result = match candidate.kind {
            EntryKind::File => fs.remove_file(&candidate.path),
            EntryKind::Directory => fs.remove_dir_all(&candidate.path),
        };
        result.map_err(|e| MapLinkError::system("Failed to remove", &candidate.path, e))?;
        removed.push(candidate);
    }
    Ok(Disposition::Removed { removed, covered })
}

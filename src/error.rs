//! Error taxonomy for linking and unlinking runs.
//!
//! Every variant here is fatal: the run stops at the first one. Outcomes
//! that only inform (an element that already exists, a sole copy that is
//! kept) are not errors and live in [`crate::report`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised by a linking or unlinking run.
#[derive(Debug, Error)]
pub enum MapLinkError {
    /// The dataset could not be found in the requested workspace.
    #[error("Can't find the {dataset} raster map in mapset {workspace}")]
    DatasetNotFound {
        /// Dataset name as given.
        dataset: String,
        /// Workspace that was searched.
        workspace: String,
    },

    /// A required element's backing file is absent.
    #[error("Source file missing: {path}")]
    SourceMissing {
        /// Path that was expected to be a regular file.
        path: PathBuf,
    },

    /// A hardlink was requested across two filesystem volumes.
    #[error("Cannot hardlink across filesystems: {source_path} -> {destination}")]
    CrossVolumeLink {
        /// File being linked to.
        source_path: PathBuf,
        /// Link that could not be created.
        destination: PathBuf,
    },

    /// Source and destination would be the same path.
    #[error(
        "Mapset {workspace} is the dataset's own mapset; a suffix is required to avoid linking {path} onto itself"
    )]
    SuffixRequired {
        /// Workspace shared by source and destination.
        workspace: String,
        /// The colliding path.
        path: PathBuf,
    },

    /// The suffix would move the link out of its element directory.
    #[error("Invalid suffix '{suffix}': it must not contain path separators or '..'")]
    InvalidSuffix {
        /// Suffix as given.
        suffix: String,
    },

    /// The GIS environment could not be resolved.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An underlying filesystem call failed.
    #[error("{action} {path}: {source}")]
    SystemFailure {
        /// What was being attempted.
        action: &'static str,
        /// Path the call operated on.
        path: PathBuf,
        /// The OS error.
        #[source]
        source: io::Error,
    },
}

impl MapLinkError {
    /// Wraps an I/O error raised while performing `action` on `path`.
    pub fn system(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::SystemFailure { action, path: path.into(), source }
    }
}

/// Result alias used across the engine.
pub type Result<T, E = MapLinkError> = std::result::Result<T, E>;

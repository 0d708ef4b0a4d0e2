//! Dataset catalog port: where datasets and workspaces live.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result of looking a dataset up in a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Located {
    /// Whether the dataset exists in the workspace.
    pub found: bool,
    /// The dataset name with any workspace qualifier removed.
    pub canonical_name: String,
}

/// Resolves datasets and workspace roots.
///
/// The engines only consume this boundary; catalog lookup itself belongs
/// to the GIS environment.
pub trait DatasetCatalog: Send + Sync {
    /// Checks whether `dataset` exists in `workspace`.
    fn locate(&self, dataset: &str, workspace: &str) -> Located;

    /// Returns the absolute root directory of `workspace`, under which the
    /// element directories live.
    fn workspace_root(&self, dataset: &str, workspace: &str) -> PathBuf;
}

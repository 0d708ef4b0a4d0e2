//! Replaying adapter for the `DatasetCatalog` port.

use std::path::PathBuf;
use std::sync::Mutex;

use super::{decode, next_output};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{DatasetCatalog, Located};

/// Answers catalog lookups from a cassette.
pub struct ReplayingCatalog {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingCatalog {
    /// Creates a replaying catalog from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl DatasetCatalog for ReplayingCatalog {
    fn locate(&self, _dataset: &str, _workspace: &str) -> Located {
        decode(next_output(&self.replayer, "catalog", "locate"), "catalog::locate")
    }

    fn workspace_root(&self, _dataset: &str, _workspace: &str) -> PathBuf {
        decode(next_output(&self.replayer, "catalog", "workspace_root"), "catalog::workspace_root")
    }
}

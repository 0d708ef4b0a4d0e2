//! Recording adapter for the `DatasetCatalog` port.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_interaction;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{DatasetCatalog, Located};

/// Records catalog lookups while delegating to an inner implementation.
pub struct RecordingCatalog {
    inner: Box<dyn DatasetCatalog>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingCatalog {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(inner: Box<dyn DatasetCatalog>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct LookupInput<'a> {
    dataset: &'a str,
    workspace: &'a str,
}

impl DatasetCatalog for RecordingCatalog {
    fn locate(&self, dataset: &str, workspace: &str) -> Located {
        let located = self.inner.locate(dataset, workspace);
        let input = LookupInput { dataset, workspace };
        record_interaction(&self.recorder, "catalog", "locate", &input, &located);
        located
    }

    fn workspace_root(&self, dataset: &str, workspace: &str) -> PathBuf {
        let root = self.inner.workspace_root(dataset, workspace);
        let input = LookupInput { dataset, workspace };
        record_interaction(&self.recorder, "catalog", "workspace_root", &input, &root);
        root
    }
}

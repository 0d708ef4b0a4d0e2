//! A recording session: one cassette recorder per port.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::recorder::CassetteRecorder;

/// Owns the per-port recorders of one run.
///
/// Each port writes `<port>.cassette.yaml` into the session directory when
/// the session finishes.
#[derive(Debug)]
pub struct RecordingSession {
    /// Recorder for filesystem interactions.
    pub fs: Arc<Mutex<CassetteRecorder>>,
    /// Recorder for dataset catalog interactions.
    pub catalog: Arc<Mutex<CassetteRecorder>>,
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Starts a session writing into `output_dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or already holds
    /// cassettes from an earlier session.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, String> {
        let output_dir = output_dir.into();
        let cassette = |port: &str| output_dir.join(format!("{port}.cassette.yaml"));
        if let Some(existing) = ["fs", "catalog"].into_iter().map(cassette).find(|p| p.exists()) {
            return Err(format!("Cassette already exists: {}", existing.display()));
        }
        std::fs::create_dir_all(&output_dir).map_err(|e| {
            format!("Failed to create cassette directory {}: {e}", output_dir.display())
        })?;

        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let make_recorder = |port: &str| {
            Arc::new(Mutex::new(CassetteRecorder::new(
                cassette(port),
                format!("{timestamp}-{port}"),
                env!("CARGO_PKG_VERSION"),
            )))
        };

        let fs = make_recorder("fs");
        let catalog = make_recorder("catalog");
        tracing::debug!(dir = %output_dir.display(), "recording cassettes");
        Ok(Self { fs, catalog, output_dir })
    }

    /// Directory the cassettes are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes every port's cassette and returns the session directory.
    ///
    /// The adapters sharing the recorders must have been dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if a recorder is still shared or a file cannot be
    /// written.
    pub fn finish(self) -> Result<PathBuf, String> {
        fn finish_one(arc: Arc<Mutex<CassetteRecorder>>, port: &str) -> Result<(), String> {
            let recorder = Arc::try_unwrap(arc)
                .map_err(|_| format!("Recording adapter for {port} still has references"))?
                .into_inner()
                .map_err(|e| format!("Recorder lock for {port} poisoned: {e}"))?;
            recorder.finish().map_err(|e| format!("Failed to write {port} cassette: {e}"))?;
            Ok(())
        }

        finish_one(self.fs, "fs")?;
        finish_one(self.catalog, "catalog")?;
        Ok(self.output_dir)
    }
}

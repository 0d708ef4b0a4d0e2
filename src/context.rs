//! Service context bundling the port trait objects.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::live::catalog::GisDatabase;
use crate::adapters::live::filesystem::LiveFileSystem;
use crate::adapters::recording::{RecordingCatalog, RecordingFileSystem};
use crate::adapters::replaying::{ReplayingCatalog, ReplayingFileSystem};
use crate::cassette::config::CassetteConfig;
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::config::Settings;
use crate::ports::{DatasetCatalog, FileIdentity, FileSystem, FileWalk, Located};

/// The ports one run talks to.
///
/// Constructors wire up live, recording or replaying adapters.
pub struct ServiceContext {
    /// Filesystem holding the workspaces.
    pub fs: Box<dyn FileSystem>,
    /// Dataset and workspace lookup.
    pub catalog: Box<dyn DatasetCatalog>,
}

impl ServiceContext {
    /// Wraps explicit port implementations.
    #[must_use]
    pub fn new(fs: Box<dyn FileSystem>, catalog: Box<dyn DatasetCatalog>) -> Self {
        Self { fs, catalog }
    }

    /// Real disk and the GIS database named by `settings`.
    #[must_use]
    pub fn live(settings: &Settings) -> Self {
        Self::new(
            Box::new(LiveFileSystem),
            Box::new(GisDatabase::new(&settings.database, &settings.location)),
        )
    }

    /// Live adapters whose calls are recorded into cassettes under `dir`.
    ///
    /// The context must be dropped before [`RecordingSession::finish`].
    ///
    /// # Errors
    ///
    /// Returns an error if the recording session cannot be started.
    pub fn recording_at(
        dir: impl Into<PathBuf>,
        settings: &Settings,
    ) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::new(dir)?;
        let live = Self::live(settings);
        let ctx = Self::new(
            Box::new(RecordingFileSystem::new(live.fs, Arc::clone(&session.fs))),
            Box::new(RecordingCatalog::new(live.catalog, Arc::clone(&session.catalog))),
        );
        Ok((ctx, session))
    }

    /// Replays every port from one monolithic cassette.
    ///
    /// Each port gets its own replayer over the same cassette, so cursors
    /// are independent.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        let cassette: Cassette = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;
        Ok(Self::new(
            Box::new(ReplayingFileSystem::new(CassetteReplayer::new(&cassette))),
            Box::new(ReplayingCatalog::new(CassetteReplayer::new(&cassette))),
        ))
    }

    /// Replays ports from per-port cassettes. A port without a cassette
    /// panics when called.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured cassette cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;
        Ok(Self::new(
            match replayers.fs {
                Some(r) => Box::new(ReplayingFileSystem::new(r)),
                None => Box::new(PanickingFileSystem),
            },
            match replayers.catalog {
                Some(r) => Box::new(ReplayingCatalog::new(r)),
                None => Box::new(PanickingCatalog),
            },
        ))
    }
}

// Stand-ins for ports that have no cassette during replay.

const NO_FS: &str = "FileSystem port not configured in CassetteConfig: no cassette loaded for fs";
const NO_CATALOG: &str =
    "DatasetCatalog port not configured in CassetteConfig: no cassette loaded for catalog";

struct PanickingFileSystem;
impl FileSystem for PanickingFileSystem {
    fn exists(&self, _path: &Path) -> bool {
        panic!("{NO_FS}");
    }
    fn is_file(&self, _path: &Path) -> bool {
        panic!("{NO_FS}");
    }
    fn is_dir(&self, _path: &Path) -> bool {
        panic!("{NO_FS}");
    }
    fn is_symlink(&self, _path: &Path) -> bool {
        panic!("{NO_FS}");
    }
    fn identity(&self, _path: &Path) -> io::Result<FileIdentity> {
        panic!("{NO_FS}");
    }
    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        panic!("{NO_FS}");
    }
    fn hard_link(&self, _original: &Path, _link: &Path) -> io::Result<()> {
        panic!("{NO_FS}");
    }
    fn symlink(&self, _target: &Path, _link: &Path) -> io::Result<()> {
        panic!("{NO_FS}");
    }
    fn touch(&self, _path: &Path) -> io::Result<()> {
        panic!("{NO_FS}");
    }
    fn remove_file(&self, _path: &Path) -> io::Result<()> {
        panic!("{NO_FS}");
    }
    fn remove_dir_all(&self, _path: &Path) -> io::Result<()> {
        panic!("{NO_FS}");
    }
    fn walk_files(&self, _root: &Path) -> io::Result<FileWalk<'_>> {
        panic!("{NO_FS}");
    }
}

struct PanickingCatalog;
impl DatasetCatalog for PanickingCatalog {
    fn locate(&self, _dataset: &str, _workspace: &str) -> Located {
        panic!("{NO_CATALOG}");
    }
    fn workspace_root(&self, _dataset: &str, _workspace: &str) -> PathBuf {
        panic!("{NO_CATALOG}");
    }
}

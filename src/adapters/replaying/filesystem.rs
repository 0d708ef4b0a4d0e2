//! Replaying adapter for the `FileSystem` port.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;

use super::{decode, decode_io_result, next_output};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{FileIdentity, FileSystem, FileWalk};

const PORT: &str = "fs";

/// Answers filesystem calls from a cassette. Nothing touches the disk.
pub struct ReplayingFileSystem {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingFileSystem {
    /// Creates a replaying filesystem from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    fn query(&self, method: &str) -> bool {
        decode(next_output(&self.replayer, PORT, method), method)
    }

    fn mutation(&self, method: &str) -> io::Result<()> {
        decode_io_result(next_output(&self.replayer, PORT, method), method)
    }
}

impl FileSystem for ReplayingFileSystem {
    fn exists(&self, _path: &Path) -> bool {
        self.query("exists")
    }

    fn is_file(&self, _path: &Path) -> bool {
        self.query("is_file")
    }

    fn is_dir(&self, _path: &Path) -> bool {
        self.query("is_dir")
    }

    fn is_symlink(&self, _path: &Path) -> bool {
        self.query("is_symlink")
    }

    fn identity(&self, _path: &Path) -> io::Result<FileIdentity> {
        decode_io_result(next_output(&self.replayer, PORT, "identity"), "identity")
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        self.mutation("create_dir_all")
    }

    fn hard_link(&self, _original: &Path, _link: &Path) -> io::Result<()> {
        self.mutation("hard_link")
    }

    fn symlink(&self, _target: &Path, _link: &Path) -> io::Result<()> {
        self.mutation("symlink")
    }

    fn touch(&self, _path: &Path) -> io::Result<()> {
        self.mutation("touch")
    }

    fn remove_file(&self, _path: &Path) -> io::Result<()> {
        self.mutation("remove_file")
    }

    fn remove_dir_all(&self, _path: &Path) -> io::Result<()> {
        self.mutation("remove_dir_all")
    }

    fn walk_files(&self, _root: &Path) -> io::Result<FileWalk<'_>> {
        let entries: Vec<Value> =
            decode_io_result(next_output(&self.replayer, PORT, "walk_files"), "walk_files")?;
        Ok(Box::new(
            entries.into_iter().map(|entry| decode_io_result::<PathBuf>(entry, "walk_files entry")),
        ))
    }
}

//! Recording adapter for the `FileSystem` port.

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::json;

use super::{encode_io_error, record_interaction, record_raw, record_result, to_json};
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{FileIdentity, FileSystem, FileWalk};

const PORT: &str = "fs";

/// Records filesystem calls while delegating to an inner implementation.
pub struct RecordingFileSystem {
    inner: Box<dyn FileSystem>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingFileSystem {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(inner: Box<dyn FileSystem>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }

    fn query(&self, method: &str, path: &Path, answer: bool) -> bool {
        record_interaction(&self.recorder, PORT, method, &PathInput::new(path), &answer);
        answer
    }

    fn mutation(&self, method: &str, path: &Path, result: io::Result<()>) -> io::Result<()> {
        record_result(&self.recorder, PORT, method, &PathInput::new(path), &result);
        result
    }
}

#[derive(Serialize)]
struct PathInput {
    path: String,
}

impl PathInput {
    fn new(path: &Path) -> Self {
        Self { path: path.display().to_string() }
    }
}

#[derive(Serialize)]
struct LinkInput {
    target: String,
    link: String,
}

impl LinkInput {
    fn new(target: &Path, link: &Path) -> Self {
        Self { target: target.display().to_string(), link: link.display().to_string() }
    }
}

impl FileSystem for RecordingFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.query("exists", path, self.inner.exists(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.query("is_file", path, self.inner.is_file(path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.query("is_dir", path, self.inner.is_dir(path))
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.query("is_symlink", path, self.inner.is_symlink(path))
    }

    fn identity(&self, path: &Path) -> io::Result<FileIdentity> {
        let result = self.inner.identity(path);
        record_result(&self.recorder, PORT, "identity", &PathInput::new(path), &result);
        result
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.mutation("create_dir_all", path, self.inner.create_dir_all(path))
    }

    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()> {
        let result = self.inner.hard_link(original, link);
        record_result(&self.recorder, PORT, "hard_link", &LinkInput::new(original, link), &result);
        result
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        let result = self.inner.symlink(target, link);
        record_result(&self.recorder, PORT, "symlink", &LinkInput::new(target, link), &result);
        result
    }

    fn touch(&self, path: &Path) -> io::Result<()> {
        self.mutation("touch", path, self.inner.touch(path))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.mutation("remove_file", path, self.inner.remove_file(path))
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        self.mutation("remove_dir_all", path, self.inner.remove_dir_all(path))
    }

    /// Drains the inner walk so the whole scan lands in one interaction.
    fn walk_files(&self, root: &Path) -> io::Result<FileWalk<'_>> {
        let input = PathInput::new(root);
        let entries: Vec<io::Result<_>> = match self.inner.walk_files(root) {
            Ok(walk) => walk.collect(),
            Err(e) => {
                record_raw(
                    &self.recorder,
                    PORT,
                    "walk_files",
                    to_json(&input),
                    json!({ "err": encode_io_error(&e) }),
                );
                return Err(e);
            }
        };
        let recorded: Vec<_> = entries
            .iter()
            .map(|entry| match entry {
                Ok(path) => json!({ "ok": path.display().to_string() }),
                Err(e) => json!({ "err": encode_io_error(e) }),
            })
            .collect();
        record_raw(&self.recorder, PORT, "walk_files", to_json(&input), json!({ "ok": recorded }));
        Ok(Box::new(entries.into_iter()))
    }
}

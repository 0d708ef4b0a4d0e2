//! Link creation, one file at a time.
//!
//! A [`Linker`] remembers what a dry run would have created so that later
//! requests in the same run observe it, which keeps a preview identical to
//! the real run.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::engine::marker;
use crate::error::{MapLinkError, Result};
use crate::ports::FileSystem;

/// Flavour of link to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// A hardlink sharing the source's inode.
    #[default]
    Hard,
    /// A symbolic link holding the source's absolute path.
    Symbolic,
    /// A symbolic link holding the source's path relative to the link's directory.
    RelativeSymbolic,
}

impl LinkKind {
    fn verb(self) -> &'static str {
        match self {
            Self::Hard => "Linking",
            Self::Symbolic => "Soft linking",
            Self::RelativeSymbolic => "Relative soft linking",
        }
    }
}

/// One link to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    /// Existing file to link to.
    pub source: PathBuf,
    /// Where the link goes, before the suffix is applied.
    pub destination: PathBuf,
    /// Appended to the destination's file name as `_<suffix>`.
    pub suffix: Option<String>,
    /// Link flavour.
    pub kind: LinkKind,
    /// Report only, do not touch the filesystem.
    pub dry_run: bool,
}

impl LinkRequest {
    /// The final link path with the suffix applied.
    #[must_use]
    pub fn link_path(&self) -> PathBuf {
        with_suffix(&self.destination, self.suffix.as_deref())
    }
}

/// A suffix must stay inside the file name it extends: no path
/// separators, no `..`, no NUL.
#[must_use]
pub fn is_valid_suffix(suffix: &str) -> bool {
    let forbidden = |c: char| matches!(c, '/' | '\\' | '\0') || std::path::is_separator(c);
    !suffix.contains(forbidden) && !suffix.contains("..")
}

/// Appends `_<suffix>` to the last component of `path`.
#[must_use]
pub fn with_suffix(path: &Path, suffix: Option<&str>) -> PathBuf {
    match suffix {
        Some(suffix) => {
            let mut name = path.file_name().map(OsString::from).unwrap_or_default();
            name.push("_");
            name.push(suffix);
            path.with_file_name(name)
        }
        None => path.to_path_buf(),
    }
}

/// What happened to a link or directory request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Created (or, in a dry run, would be created).
    Created,
    /// Already present; left alone.
    AlreadyExists,
}

/// Result of a single [`Linker::create_link`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    /// The link path.
    pub link: PathBuf,
    /// Parent directory that had to be created first, if any.
    pub created_dir: Option<PathBuf>,
    /// Whether the link was created or found in place.
    pub status: Status,
}

#[derive(Debug, Default)]
struct Staged {
    dirs: BTreeSet<PathBuf>,
    files: BTreeSet<PathBuf>,
}

/// Creates links and directories against a [`FileSystem`].
pub struct Linker<'a> {
    fs: &'a dyn FileSystem,
    staged: Staged,
}

impl<'a> Linker<'a> {
    /// Creates a linker over the given filesystem.
    #[must_use]
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs, staged: Staged::default() }
    }

    /// Whether `path` is a directory, or would be one had the dry run executed.
    #[must_use]
    pub fn dir_exists(&self, path: &Path) -> bool {
        self.staged.dirs.contains(path) || self.fs.is_dir(path)
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.staged.files.contains(path) || self.staged.dirs.contains(path) || self.fs.exists(path)
    }

    /// Creates `dir` and its missing ancestors. Returns `true` if anything
    /// was (or would be) created.
    fn ensure_dir(&mut self, dir: &Path, dry_run: bool) -> Result<bool> {
        if self.dir_exists(dir) {
            return Ok(false);
        }
        if dry_run {
            for ancestor in dir.ancestors() {
                if self.dir_exists(ancestor) {
                    break;
                }
                self.staged.dirs.insert(ancestor.to_path_buf());
            }
        } else {
            self.fs
                .create_dir_all(dir)
                .map_err(|e| MapLinkError::system("Failed to create directory", dir, e))?;
        }
        Ok(true)
    }

    /// Creates a container directory and writes its ownership marker.
    ///
    /// An existing directory is left untouched and gets no marker.
    ///
    /// # Errors
    ///
    /// Returns [`MapLinkError::SystemFailure`] if the directory or marker
    /// cannot be created.
    pub fn create_container(&mut self, dir: &Path, dry_run: bool) -> Result<Status> {
        if self.dir_exists(dir) {
            return Ok(Status::AlreadyExists);
        }
        tracing::debug!("+ Creating sub-element directory '{}'", dir.display());
        self.ensure_dir(dir, dry_run)?;
        if dry_run {
            self.staged.files.insert(marker::marker_path(dir));
        } else {
            marker::write_marker(self.fs, dir)?;
        }
        Ok(Status::Created)
    }

    /// Creates one link.
    ///
    /// # Errors
    ///
    /// - [`MapLinkError::SourceMissing`] if the source is not a regular file.
    /// - [`MapLinkError::CrossVolumeLink`] if a hardlink would span volumes.
    /// - [`MapLinkError::SystemFailure`] for any other filesystem failure.
    pub fn create_link(&mut self, request: &LinkRequest) -> Result<LinkOutcome> {
        let source = &request.source;
        if !self.fs.is_file(source) {
            return Err(MapLinkError::SourceMissing { path: source.clone() });
        }

        let link = request.link_path();
        if self.path_exists(&link) {
            return Ok(LinkOutcome { link, created_dir: None, status: Status::AlreadyExists });
        }

        if request.kind == LinkKind::Hard {
            self.check_same_volume(source, &link)?;
        }

        let parent = link.parent().unwrap_or_else(|| Path::new("/")).to_path_buf();
        let needs_parent = !self.dir_exists(&parent);
        if needs_parent {
            tracing::debug!("+ Creating element directory '{}'", parent.display());
        }
        self.ensure_dir(&parent, request.dry_run)?;

        tracing::debug!(
            "{} '{}' to '{}'",
            request.kind.verb(),
            source.display(),
            link.display()
        );
        if request.dry_run {
            self.staged.files.insert(link.clone());
        } else {
            self.make_link(request, &parent, &link)?;
        }

        Ok(LinkOutcome {
            link,
            created_dir: needs_parent.then_some(parent),
            status: Status::Created,
        })
    }

    fn make_link(&self, request: &LinkRequest, parent: &Path, link: &Path) -> Result<()> {
        let source = &request.source;
        let result = match request.kind {
            LinkKind::Hard => self.fs.hard_link(source, link),
            LinkKind::Symbolic => self.fs.symlink(source, link),
            LinkKind::RelativeSymbolic => {
                let target = pathdiff::diff_paths(source, parent).ok_or_else(|| {
                    MapLinkError::system(
                        "Failed to compute relative path for",
                        link,
                        io::Error::new(io::ErrorKind::InvalidInput, "source is not absolute"),
                    )
                })?;
                self.fs.symlink(&target, link)
            }
        };
        result.map_err(|e| {
            if e.kind() == io::ErrorKind::CrossesDevices {
                MapLinkError::CrossVolumeLink {
                    source_path: source.clone(),
                    destination: link.to_path_buf(),
                }
            } else {
                MapLinkError::system("Failed to link", link, e)
            }
        })
    }

    /// Compares the source's device with that of the link's nearest
    /// existing ancestor on disk.
    fn check_same_volume(&self, source: &Path, link: &Path) -> Result<()> {
        let Some(anchor) = link.ancestors().skip(1).find(|a| self.fs.is_dir(a)) else {
            return Ok(());
        };
        let source_device = self
            .fs
            .identity(source)
            .map_err(|e| MapLinkError::system("Failed to inspect", source, e))?
            .device;
        let anchor_device = self
            .fs
            .identity(anchor)
            .map_err(|e| MapLinkError::system("Failed to inspect", anchor, e))?
            .device;
        if source_device == anchor_device {
            Ok(())
        } else {
            Err(MapLinkError::CrossVolumeLink {
                source_path: source.to_path_buf(),
                destination: link.to_path_buf(),
            })
        }
    }
}

//! Filesystem port for the link and unlink engines.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Device, inode and hardlink count of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIdentity {
    /// Device (volume) the inode lives on.
    pub device: u64,
    /// Inode number.
    pub inode: u64,
    /// Number of directory entries referring to the inode.
    pub link_count: u64,
}

impl FileIdentity {
    /// Returns `true` when both identities name the same inode.
    #[must_use]
    pub fn same_inode(&self, other: &Self) -> bool {
        self.device == other.device && self.inode == other.inode
    }
}

/// A single-pass scan of the files below a directory.
///
/// The scan is taken once; files appearing after it started may or may not
/// be yielded.
pub type FileWalk<'a> = Box<dyn Iterator<Item = io::Result<PathBuf>> + 'a>;

/// Provides the filesystem operations the engines rely on.
///
/// Abstracting the filesystem allows the engines to run against an
/// in-memory fake or a replayed cassette without touching the real disk.
pub trait FileSystem: Send + Sync {
    /// Returns `true` if the path exists, including dangling symbolic links.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if the path resolves to a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Returns `true` if the path resolves to a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns `true` if the path itself is a symbolic link.
    fn is_symlink(&self, path: &Path) -> bool;

    /// Returns the identity of the file the path resolves to.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or cannot be inspected.
    fn identity(&self, path: &Path) -> io::Result<FileIdentity>;

    /// Creates a directory and all missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Creates `link` as a new hardlink to `original`.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::CrossesDevices`] when the two paths live on
    /// different volumes, or any other error from the call.
    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()>;

    /// Creates `link` as a symbolic link whose content is `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be created.
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// Creates an empty file, leaving an existing one untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    fn touch(&self, path: &Path) -> io::Result<()>;

    /// Removes a single directory entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be removed.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Removes a directory and everything below it.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry cannot be removed.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Scans the non-directory entries below `root`, recursively, in
    /// file-name order. Symbolic links are yielded without being followed,
    /// so callers must check what each entry resolves to.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` cannot be read; errors on individual
    /// entries are yielded by the iterator.
    fn walk_files(&self, root: &Path) -> io::Result<FileWalk<'_>>;
}

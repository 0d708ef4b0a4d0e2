//! Live filesystem adapter using `std::fs` and `walkdir`.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::ports::filesystem::{FileIdentity, FileSystem, FileWalk};

/// Live filesystem adapter backed by real disk I/O.
pub struct LiveFileSystem;

#[cfg(unix)]
fn identity_of(metadata: &fs::Metadata) -> io::Result<FileIdentity> {
    use std::os::unix::fs::MetadataExt;

    Ok(FileIdentity { device: metadata.dev(), inode: metadata.ino(), link_count: metadata.nlink() })
}

#[cfg(not(unix))]
fn identity_of(_metadata: &fs::Metadata) -> io::Result<FileIdentity> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "inode identity requires a Unix filesystem"))
}

impl FileSystem for LiveFileSystem {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        path.is_symlink()
    }

    fn identity(&self, path: &Path) -> io::Result<FileIdentity> {
        identity_of(&fs::metadata(path)?)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()> {
        fs::hard_link(original, link)
    }

    #[cfg(unix)]
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(windows)]
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        std::os::windows::fs::symlink_file(target, link)
    }

    fn touch(&self, path: &Path) -> io::Result<()> {
        fs::OpenOptions::new().create(true).append(true).open(path).map(drop)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn walk_files(&self, root: &Path) -> io::Result<FileWalk<'_>> {
        // Surface an unreadable root up front rather than as the first item.
        fs::read_dir(root)?;
        let walk = WalkDir::new(root).min_depth(1).sort_by_file_name().into_iter().filter_map(
            |entry| match entry {
                Ok(entry) if entry.file_type().is_dir() => None,
                Ok(entry) => Some(Ok(entry.into_path())),
                Err(err) => Some(Err(io::Error::from(err))),
            },
        );
        Ok(Box::new(walk))
    }
}

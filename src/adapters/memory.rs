//! In-memory filesystem with inode, link-count and volume semantics.
//!
//! Used to exercise the engines without touching the disk. Paths are
//! expected to be absolute and free of `.` components; only the final
//! component of a path is resolved through symbolic links.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use crate::ports::filesystem::{FileIdentity, FileSystem, FileWalk};

const ROOT_DEVICE: u64 = 1;
const MAX_SYMLINK_HOPS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Dir,
    File(u64),
    Symlink(PathBuf),
}

#[derive(Debug)]
struct Inode {
    device: u64,
    links: u64,
}

#[derive(Debug)]
struct State {
    entries: BTreeMap<PathBuf, Entry>,
    inodes: HashMap<u64, Inode>,
    next_inode: u64,
    volumes: Vec<(PathBuf, u64)>,
}

/// Filesystem fake keeping every entry in memory.
#[derive(Debug)]
pub struct MemoryFileSystem {
    state: Mutex<State>,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{}: no such file or directory", path.display()))
}

fn already_exists(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::AlreadyExists, format!("{}: file exists", path.display()))
}

/// Collapses `..` components lexically.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

impl State {
    fn device_of(&self, path: &Path) -> u64 {
        self.volumes
            .iter()
            .filter(|(mount, _)| path.starts_with(mount))
            .max_by_key(|(mount, _)| mount.components().count())
            .map_or(ROOT_DEVICE, |(_, device)| *device)
    }

    /// Follows symbolic links at the final component.
    fn resolve(&self, path: &Path) -> Option<PathBuf> {
        let mut current = path.to_path_buf();
        for _ in 0..MAX_SYMLINK_HOPS {
            match self.entries.get(&current)? {
                Entry::Symlink(target) => {
                    let base = current.parent().unwrap_or_else(|| Path::new("/"));
                    current = normalize(&base.join(target));
                }
                _ => return Some(current),
            }
        }
        None
    }

    fn resolved_entry(&self, path: &Path) -> Option<&Entry> {
        self.resolve(path).and_then(|p| self.entries.get(&p))
    }

    fn require_parent_dir(&self, path: &Path) -> io::Result<()> {
        let parent = path.parent().ok_or_else(|| not_found(path))?;
        match self.resolved_entry(parent) {
            Some(Entry::Dir) => Ok(()),
            _ => Err(not_found(parent)),
        }
    }

    fn require_vacant(&self, path: &Path) -> io::Result<()> {
        if self.entries.contains_key(path) {
            return Err(already_exists(path));
        }
        self.require_parent_dir(path)
    }

    fn new_inode(&mut self, path: &Path) -> u64 {
        let inode = self.next_inode;
        self.next_inode += 1;
        let device = self.device_of(path);
        self.inodes.insert(inode, Inode { device, links: 1 });
        inode
    }

    fn drop_link(&mut self, inode: u64) {
        if let Some(node) = self.inodes.get_mut(&inode) {
            node.links -= 1;
            if node.links == 0 {
                self.inodes.remove(&inode);
            }
        }
    }

    fn mkdirs(&mut self, path: &Path) -> io::Result<()> {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            match self.resolved_entry(&current) {
                Some(Entry::Dir) => {}
                Some(_) => return Err(already_exists(&current)),
                None => {
                    self.entries.insert(current.clone(), Entry::Dir);
                }
            }
        }
        Ok(())
    }
}

impl MemoryFileSystem {
    /// Creates a filesystem holding only the root directory.
    #[must_use]
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("/"), Entry::Dir);
        Self {
            state: Mutex::new(State {
                entries,
                inodes: HashMap::new(),
                next_inode: 1,
                volumes: Vec::new(),
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Treats everything below `mount` as a separate volume.
    #[must_use]
    pub fn with_volume(self, mount: impl Into<PathBuf>) -> Self {
        {
            let mut state = self.state();
            let device = ROOT_DEVICE + 1 + state.volumes.len() as u64;
            state.volumes.push((mount.into(), device));
        }
        self
    }

    /// Adds a directory and its missing ancestors.
    ///
    /// # Panics
    ///
    /// Panics if a non-directory is in the way.
    #[must_use]
    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        self.create_dir_all(path.as_ref()).expect("with_dir");
        self
    }

    /// Adds a fresh regular file (link count 1), creating its ancestors.
    ///
    /// # Panics
    ///
    /// Panics if the path is already taken.
    #[must_use]
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent).expect("with_file parent");
        }
        self.touch(path).expect("with_file");
        self
    }

    /// Returns every entry as a sorted, human-readable listing.
    ///
    /// Two listings are equal exactly when the trees have the same entries,
    /// inode sharing and link counts.
    #[must_use]
    pub fn listing(&self) -> Vec<String> {
        let state = self.state();
        state
            .entries
            .iter()
            .map(|(path, entry)| match entry {
                Entry::Dir => format!("{} dir", path.display()),
                Entry::File(inode) => {
                    let links = state.inodes.get(inode).map_or(0, |node| node.links);
                    format!("{} file#{inode} links={links}", path.display())
                }
                Entry::Symlink(target) => {
                    format!("{} -> {}", path.display(), target.display())
                }
            })
            .collect()
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.state().entries.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.state().resolved_entry(path), Some(Entry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.state().resolved_entry(path), Some(Entry::Dir))
    }

    fn is_symlink(&self, path: &Path) -> bool {
        matches!(self.state().entries.get(path), Some(Entry::Symlink(_)))
    }

    fn identity(&self, path: &Path) -> io::Result<FileIdentity> {
        let state = self.state();
        let resolved = state.resolve(path).ok_or_else(|| not_found(path))?;
        match state.entries.get(&resolved) {
            Some(Entry::File(inode)) => {
                let node = state.inodes.get(inode).ok_or_else(|| not_found(path))?;
                Ok(FileIdentity { device: node.device, inode: *inode, link_count: node.links })
            }
            Some(Entry::Dir) => Ok(FileIdentity {
                device: state.device_of(&resolved),
                inode: 0,
                link_count: 2,
            }),
            _ => Err(not_found(path)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.state().mkdirs(path)
    }

    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()> {
        let mut state = self.state();
        let Some(Entry::File(inode)) = state.resolved_entry(original).cloned() else {
            return Err(not_found(original));
        };
        state.require_vacant(link)?;
        let device = state.inodes.get(&inode).map_or(ROOT_DEVICE, |node| node.device);
        if state.device_of(link) != device {
            return Err(io::Error::new(
                io::ErrorKind::CrossesDevices,
                format!("{}: invalid cross-device link", link.display()),
            ));
        }
        if let Some(node) = state.inodes.get_mut(&inode) {
            node.links += 1;
        }
        state.entries.insert(link.to_path_buf(), Entry::File(inode));
        Ok(())
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        let mut state = self.state();
        state.require_vacant(link)?;
        state.entries.insert(link.to_path_buf(), Entry::Symlink(target.to_path_buf()));
        Ok(())
    }

    fn touch(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state();
        if state.entries.contains_key(path) {
            return Ok(());
        }
        state.require_parent_dir(path)?;
        let inode = state.new_inode(path);
        state.entries.insert(path.to_path_buf(), Entry::File(inode));
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state();
        match state.entries.get(path).cloned() {
            Some(Entry::File(inode)) => {
                state.entries.remove(path);
                state.drop_link(inode);
                Ok(())
            }
            Some(Entry::Symlink(_)) => {
                state.entries.remove(path);
                Ok(())
            }
            Some(Entry::Dir) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{}: is a directory", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state();
        if state.entries.get(path) != Some(&Entry::Dir) {
            return Err(not_found(path));
        }
        let doomed: Vec<PathBuf> =
            state.entries.keys().filter(|p| p.starts_with(path)).cloned().collect();
        for victim in doomed {
            if let Some(Entry::File(inode)) = state.entries.remove(&victim) {
                state.drop_link(inode);
            }
        }
        Ok(())
    }

    fn walk_files(&self, root: &Path) -> io::Result<FileWalk<'_>> {
        let state = self.state();
        if state.resolved_entry(root) != Some(&Entry::Dir) {
            return Err(not_found(root));
        }
        let files: Vec<PathBuf> = state
            .entries
            .iter()
            .filter(|(path, entry)| {
                path.starts_with(root) && path.as_path() != root && **entry != Entry::Dir
            })
            .map(|(path, _)| path.clone())
            .collect();
        Ok(Box::new(files.into_iter().map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hard_link_shares_inode_and_counts_links() {
        let fs = MemoryFileSystem::new().with_file("/a/src").with_dir("/b");
        fs.hard_link(Path::new("/a/src"), Path::new("/b/dst")).unwrap();

        let src = fs.identity(Path::new("/a/src")).unwrap();
        let dst = fs.identity(Path::new("/b/dst")).unwrap();
        assert!(src.same_inode(&dst));
        assert_eq!(src.link_count, 2);

        fs.remove_file(Path::new("/b/dst")).unwrap();
        assert_eq!(fs.identity(Path::new("/a/src")).unwrap().link_count, 1);
    }

    #[test]
    fn hard_link_across_volumes_fails() {
        let fs = MemoryFileSystem::new().with_volume("/mnt").with_file("/a/src").with_dir("/mnt/b");
        let err = fs.hard_link(Path::new("/a/src"), Path::new("/mnt/b/dst")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::CrossesDevices);
    }

    #[test]
    fn hard_link_requires_parent_directory() {
        let fs = MemoryFileSystem::new().with_file("/a/src");
        let err = fs.hard_link(Path::new("/a/src"), Path::new("/b/dst")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn relative_symlink_resolves_against_link_directory() {
        let fs = MemoryFileSystem::new().with_file("/db/A/cell/x").with_dir("/db/B/cell");
        fs.symlink(Path::new("../../A/cell/x"), Path::new("/db/B/cell/x")).unwrap();
        assert!(fs.is_symlink(Path::new("/db/B/cell/x")));
        assert!(fs.is_file(Path::new("/db/B/cell/x")));
    }

    #[test]
    fn remove_dir_all_releases_links() {
        let fs = MemoryFileSystem::new().with_file("/a/src").with_dir("/b/dir");
        fs.hard_link(Path::new("/a/src"), Path::new("/b/dir/dst")).unwrap();
        fs.remove_dir_all(Path::new("/b/dir")).unwrap();
        assert!(!fs.exists(Path::new("/b/dir/dst")));
        assert_eq!(fs.identity(Path::new("/a/src")).unwrap().link_count, 1);
    }

    #[test]
    fn walk_lists_nested_files_only() {
        let fs = MemoryFileSystem::new().with_file("/c/a").with_file("/c/sub/b").with_dir("/c/empty");
        let files: Vec<_> = fs.walk_files(Path::new("/c")).unwrap().map(Result::unwrap).collect();
        assert_eq!(files, vec![PathBuf::from("/c/a"), PathBuf::from("/c/sub/b")]);
    }
}

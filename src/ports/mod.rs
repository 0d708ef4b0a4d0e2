//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the linking core and the
//! outside world (the filesystem, the dataset catalog). Implementations
//! live in `src/adapters/`.

pub mod catalog;
pub mod filesystem;

pub use catalog::{DatasetCatalog, Located};
pub use filesystem::{FileIdentity, FileSystem, FileWalk};

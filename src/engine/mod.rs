//! The link/unlink engine.
//!
//! Everything here talks to the outside world only through
//! [`crate::ports::FileSystem`] and [`crate::ports::DatasetCatalog`].

pub mod link;
pub mod marker;
pub mod orchestrator;
pub mod unlink;

pub use link::{LinkKind, LinkRequest, Linker};
pub use orchestrator::{run, Invocation, Mode};
pub use unlink::{apply_unlink, evaluate_directory_for_unlink, evaluate_for_unlink, Disposition};

//! Live adapters for real external interactions.

pub mod catalog;
pub mod filesystem;

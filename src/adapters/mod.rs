//! Port implementations.

pub mod live;
pub mod memory;
pub mod recording;
pub mod replaying;

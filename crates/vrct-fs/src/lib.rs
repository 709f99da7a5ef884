//! Filesystem primitives for the VRCT virtual configuration tracker
//!
//! Provides the low-level operations the tracker builds on: atomic writes,
//! cross-filesystem file moves, checksummed content, and path normalization
//! for mirroring real absolute paths under a virtual root.

pub mod checksum;
pub mod error;
pub mod io;
pub mod path;

pub use error::{Error, Result};

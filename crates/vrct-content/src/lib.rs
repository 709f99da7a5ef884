//! Format detection, parsing and structural merge for tracked content
//!
//! Structured formats (JSON, YAML, TOML) are decoded into a single generic
//! tree representation so layers of different origin can be merged key by
//! key and re-encoded in the target file's own format. Plain text stays
//! opaque bytes.

pub mod codec;
pub mod compare;
pub mod error;
pub mod format;
pub mod merge;

pub use codec::{decode, encode};
pub use compare::content_equal;
pub use error::{Error, Result};
pub use format::Format;
pub use merge::{fill_missing, overlay};

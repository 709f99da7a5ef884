//! Structural content comparison

use crate::codec;
use crate::error::Result;
use crate::format::Format;

/// Compare two raw contents for equality in the given format.
///
/// Structured formats compare their decoded trees, so key order and
/// formatting differences do not matter. Text compares raw bytes.
pub fn content_equal(a: &[u8], b: &[u8], format: Format) -> Result<bool> {
    if !format.is_structured() {
        return Ok(a == b);
    }
    let tree_a = codec::decode(a, format)?;
    let tree_b = codec::decode(b, format)?;
    Ok(tree_a == tree_b)
}

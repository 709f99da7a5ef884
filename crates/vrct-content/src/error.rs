//! Error types for vrct-content

use crate::format::Format;

/// Result type for vrct-content operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vrct-content operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Content could not be parsed in the expected format
    #[error("Failed to parse {format} content: {message}")]
    Parse { format: Format, message: String },

    /// A merged tree could not be encoded back into the target format
    #[error("Failed to encode {format} content: {message}")]
    Encode { format: Format, message: String },
}

impl Error {
    /// Create a parse error
    pub fn parse(format: Format, message: impl Into<String>) -> Self {
        Self::Parse {
            format,
            message: message.into(),
        }
    }

    /// Create an encode error
    pub fn encode(format: Format, message: impl Into<String>) -> Self {
        Self::Encode {
            format,
            message: message.into(),
        }
    }
}

//! File format identification

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Content format of a tracked file.
///
/// Structured formats are decoded into a generic tree and merged key by
/// key; [`Format::Text`] content is opaque and merged by replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Opaque text, merged by whole-content replacement
    #[default]
    Text,
    Json,
    Yaml,
    Toml,
}

impl Format {
    /// Detect a format from a path's extension.
    ///
    /// Unknown and missing extensions fall back to [`Format::Text`].
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Self::Text;
        };
        match ext.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            "toml" => Self::Toml,
            _ => Self::Text,
        }
    }

    /// Whether content in this format parses into a mergeable tree.
    pub fn is_structured(self) -> bool {
        !matches!(self, Self::Text)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        };
        write!(f, "{name}")
    }
}

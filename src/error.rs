//! Error types for document-class loading and configuration

use thiserror::Error;

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Diagnostics produced while loading a document class
///
/// None of these abort a load. The offending pattern is either dropped
/// or kept in a degraded form, see each variant.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Pattern dropped
    #[error("pattern '{pattern}': invalid regular expression: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Pattern kept as a top-level pattern
    #[error("pattern '{pattern}': parent '{parent}' not found")]
    UnresolvedParent { pattern: String, parent: String },

    /// Pattern kept as a top-level pattern
    #[error("pattern '{pattern}': parent chain loops back to itself")]
    ParentCycle { pattern: String },

    /// Pattern kept with an empty style
    #[error("pattern '{pattern}': style '{style}' not found")]
    UnknownStyle { pattern: String, style: String },

    /// Pattern dropped
    #[error("pattern '{pattern}': more than {limit} patterns in one document class")]
    TooManyPatterns { pattern: String, limit: usize },

    /// Later definition dropped
    #[error("pattern '{pattern}': defined more than once")]
    DuplicatePattern { pattern: String },

    /// Indent pattern dropped
    #[error("indent pattern '{pattern}': invalid regular expression: {source}")]
    InvalidIndentRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Scale reset to 1
    #[error("indent pattern '{pattern}': scale must be positive")]
    InvalidScale { pattern: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

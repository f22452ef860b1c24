//! Structured error types for the subsetter.
//!
//! Every stage of the pipeline returns [`SubsetError`]. Nothing is retried at
//! this layer: the first error aborts the request and no partial font is
//! returned.

use thiserror::Error;

/// The unified error type returned by all public subsetting functions.
#[derive(Debug, Error)]
pub enum SubsetError {
    /// The bytes at the directory offset are not an sfnt header we accept.
    #[error("{font} is not a TrueType font")]
    Format { font: String },

    /// One of the tables the subsetter cannot work without is absent.
    #[error("table '{table}' does not exist in {font}")]
    MissingTable { font: String, table: String },

    /// A seek or read against the font source failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A component of composite glyph `glyph` sits deeper than the configured
    /// nesting limit.
    #[error("a component of composite glyph {glyph} in {font} exceeds the nesting limit of {limit} levels")]
    ClosureDepth { font: String, glyph: u16, limit: u32 },

    /// The composite closure grew past the configured glyph budget.
    #[error("glyph closure of {font} exceeds {limit} glyphs")]
    ClosureSize { font: String, limit: usize },

    /// A table's contents point outside of where they are allowed to.
    #[error("table '{table}' in {font} is malformed: {reason}")]
    MalformedTable {
        font: String,
        table: String,
        reason: String,
    },

    /// Subset options supplied as JSON failed to parse.
    #[error("invalid subset options: {0}")]
    Options(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SubsetError>;

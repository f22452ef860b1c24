//! Per-request subsetting options.
//!
//! Hosts that drive the subsetter from a document description can hand the
//! options over as JSON; every field has a default, so `{}` is valid.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::font::{ClosureLimits, TableProfile};

/// How to read the source font and what to put in the subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubsetOptions {
    /// Which tables the output font carries.
    pub profile: TableProfile,

    /// Byte offset of the sfnt table directory within the source. Non-zero
    /// for fonts inside a collection or another container.
    pub directory_offset: u32,

    /// Table offsets in the directory are relative to `directory_offset`
    /// rather than to the start of the source.
    pub directory_relative: bool,

    /// Deepest composite glyph nesting the closure will follow.
    pub max_component_depth: u32,

    /// Largest number of glyphs the closure may collect.
    pub max_glyphs: usize,
}

impl Default for SubsetOptions {
    fn default() -> Self {
        let limits = ClosureLimits::default();
        SubsetOptions {
            profile: TableProfile::default(),
            directory_offset: 0,
            directory_relative: false,
            max_component_depth: limits.max_depth,
            max_glyphs: limits.max_glyphs,
        }
    }
}

impl SubsetOptions {
    /// Parse options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_profile(mut self, profile: TableProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn closure_limits(&self) -> ClosureLimits {
        ClosureLimits {
            max_depth: self.max_component_depth,
            max_glyphs: self.max_glyphs,
        }
    }
}

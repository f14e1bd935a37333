//! Source locations for diagnostics.
//!
//! The engine never interprets locations: every node handed over by the parser
//! carries a `SourceLocation`, and diagnostics produced for that node report it
//! back unchanged.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A byte range in a named source file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: Arc<str>,
    pub start: u32,
    pub length: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<Arc<str>>, start: u32, length: u32) -> Self {
        Self {
            file: file.into(),
            start,
            length,
        }
    }

    /// Exclusive end offset.
    #[inline]
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.length)
    }
}

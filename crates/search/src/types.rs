//! Search result types.

use serde::{Deserialize, Serialize};

/// One raw web search result.
///
/// Scoped to a single retrieval call. The position of a result in the
/// returned sequence is significant: it is the join key used to map a
/// similarity-index rank back to this record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawResult {
    /// Page title
    pub title: String,

    /// Snippet body text
    pub body: String,

    /// Source URL
    pub url: String,
}

impl RawResult {
    /// Create a new raw result.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            url: url.into(),
        }
    }
}

//! Message shapes at the persistence boundary.
//!
//! Requests are tagged by `type` (`STORE_POST`, `GET_POSTS`, `CLEAR_POSTS`);
//! every response carries `success` plus an optional error or post list.

use serde::{Deserialize, Serialize};

use crate::record::ExtractedRecord;

/// Request sent to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Upsert one record keyed by `postId`.
    StorePost { data: ExtractedRecord },
    /// All records, newest first.
    GetPosts,
    /// Remove every record.
    ClearPosts,
}

/// Reply from the persistence collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<ExtractedRecord>>,
}

impl Response {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_posts(posts: Vec<ExtractedRecord>) -> Self {
        Self {
            success: true,
            posts: Some(posts),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            posts: None,
        }
    }
}

//! Extracted post records.
//!
//! One record per logical post, created once and never mutated afterwards.
//! Field names serialize in camelCase to match the store's message format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extractor::Fields;

/// A post as handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecord {
    /// Extraction time, ISO-8601 with millisecond precision.
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,

    /// Content fingerprint (`post_<hex>`), the store's upsert key.
    pub post_id: String,

    /// Author display name, or `"Unknown Author"`.
    pub author: String,

    /// Caption blocks separated by blank lines; may be empty.
    pub text: String,

    /// Content image URLs in first-seen order, without duplicates.
    pub images: Vec<String>,

    /// Page location the post was seen on.
    #[serde(alias = "url")]
    pub source_url: String,
}

impl ExtractedRecord {
    #[must_use]
    pub fn new(post_id: String, fields: Fields, source_url: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            post_id,
            author: fields.author,
            text: fields.text,
            images: fields.images,
            source_url: source_url.to_string(),
        }
    }

    #[must_use]
    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }
}

/// `DateTime<Utc>` as `2024-05-01T12:30:00.000Z`.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

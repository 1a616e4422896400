//! Reference persistence collaborator.
//!
//! Keeps records in insertion order, upserts by `postId`, and answers the
//! boundary protocol. With a backing file every mutation rewrites the file;
//! a failed write is reported as a failed response and the change is undone.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::protocol::{Request, Response};
use crate::record::ExtractedRecord;

/// Counts shown alongside the stored list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total: usize,
    pub with_images: usize,
}

/// Record store keyed by post id.
#[derive(Debug, Default)]
pub struct PostStore {
    posts: Vec<ExtractedRecord>,
    path: Option<PathBuf>,
}

impl PostStore {
    /// Empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// File-backed store; a missing file starts empty.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let posts = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => Vec::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), count = posts.len(), "opened post store");
        Ok(Self {
            posts,
            path: Some(path),
        })
    }

    /// Insert or replace the record with the same post id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing file cannot be written; the store
    /// is left as it was.
    pub fn store(&mut self, record: ExtractedRecord) -> Result<(), StoreError> {
        let existing = self.posts.iter().position(|p| p.post_id == record.post_id);
        let previous = match existing {
            Some(index) => {
                debug!(post_id = %record.post_id, index, "updating existing post");
                Some((index, std::mem::replace(&mut self.posts[index], record)))
            }
            None => {
                self.posts.push(record);
                None
            }
        };

        if let Err(e) = self.persist() {
            match previous {
                Some((index, old)) => self.posts[index] = old,
                None => {
                    self.posts.pop();
                }
            }
            return Err(e);
        }

        info!(total = self.posts.len(), "post stored");
        Ok(())
    }

    /// All records, newest first.
    #[must_use]
    pub fn posts(&self) -> Vec<ExtractedRecord> {
        let mut posts = self.posts.clone();
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        posts
    }

    #[must_use]
    pub fn get(&self, post_id: &str) -> Option<&ExtractedRecord> {
        self.posts.iter().find(|p| p.post_id == post_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Remove every record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing file cannot be written.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        let previous = std::mem::take(&mut self.posts);
        if let Err(e) = self.persist() {
            self.posts = previous;
            return Err(e);
        }
        Ok(())
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total: self.posts.len(),
            with_images: self.posts.iter().filter(|p| p.has_images()).count(),
        }
    }

    /// Answer one boundary request.
    pub fn handle(&mut self, request: Request) -> Response {
        match request {
            Request::StorePost { data } => match self.store(data) {
                Ok(()) => Response::ok(),
                Err(e) => {
                    warn!(error = %e, "storing post failed");
                    Response::failure(e.to_string())
                }
            },
            Request::GetPosts => Response::with_posts(self.posts()),
            Request::ClearPosts => match self.clear() {
                Ok(()) => Response::ok(),
                Err(e) => {
                    warn!(error = %e, "clearing posts failed");
                    Response::failure(e.to_string())
                }
            },
        }
    }

    /// Pretty JSON array of all records, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Json` if serialization fails.
    pub fn export_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.posts())?)
    }

    /// Download name for an export made on `date`.
    #[must_use]
    pub fn export_file_name(date: NaiveDate) -> String {
        format!("posts_{}.json", date.format("%Y-%m-%d"))
    }

    fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string(&self.posts)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, minute: u32, images: usize) -> ExtractedRecord {
        ExtractedRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
            post_id: id.to_string(),
            author: "A".to_string(),
            text: format!("text {id}"),
            images: (0..images).map(|i| format!("https://cdn.test/{id}/{i}.jpg")).collect(),
            source_url: "https://social.example/".to_string(),
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("feed_capture_{name}_{}.json", std::process::id()))
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut store = PostStore::new();
        store.store(record("a", 1, 0)).unwrap();
        store.store(record("b", 2, 0)).unwrap();

        let mut updated = record("a", 3, 1);
        updated.text = "edited".to_string();
        store.store(updated).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").unwrap().text, "edited");
    }

    #[test]
    fn test_posts_newest_first() {
        let mut store = PostStore::new();
        store.store(record("old", 1, 0)).unwrap();
        store.store(record("new", 9, 0)).unwrap();
        store.store(record("mid", 5, 0)).unwrap();

        let ids: Vec<_> = store.posts().into_iter().map(|p| p.post_id).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_protocol_round() {
        let mut store = PostStore::new();

        assert!(store.handle(Request::StorePost { data: record("a", 1, 2) }).success);
        assert!(store.handle(Request::StorePost { data: record("b", 2, 0) }).success);

        let listed = store.handle(Request::GetPosts);
        assert!(listed.success);
        assert_eq!(listed.posts.unwrap().len(), 2);
        assert_eq!(store.stats(), StoreStats { total: 2, with_images: 1 });

        assert!(store.handle(Request::ClearPosts).success);
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_backing_survives_reopen() {
        let path = temp_path("reopen");
        let _ = fs::remove_file(&path);

        {
            let mut store = PostStore::open(&path).unwrap();
            store.store(record("a", 1, 1)).unwrap();
        }
        let store = PostStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().images.len(), 1);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = std::env::temp_dir().join(format!("feed_capture_dir_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        // Writing to a directory path fails.
        let mut store = PostStore::open(&dir).unwrap_or_else(|_| PostStore {
            posts: Vec::new(),
            path: Some(dir.clone()),
        });
        let response = store.handle(Request::StorePost { data: record("a", 1, 0) });

        assert!(!response.success);
        assert!(response.error.is_some());
        assert!(store.is_empty());

        let _ = fs::remove_dir(&dir);
    }

    #[test]
    fn test_export() {
        let mut store = PostStore::new();
        store.store(record("a", 1, 0)).unwrap();

        let json = store.export_json().unwrap();
        assert!(json.contains("\"postId\": \"a\""));
        assert_eq!(
            PostStore::export_file_name(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
            "posts_2024-05-01.json"
        );
    }
}

//! # feed-capture
//!
//! Visibility-driven extraction of posts from an infinitely scrolling feed.
//!
//! The crate watches a continuously mutating document, tracks how much of
//! each post is on screen, and once scrolling settles extracts every
//! sufficiently visible post exactly once: author, full (unclamped) caption,
//! and content image URLs. Each record is keyed by a content fingerprint so
//! re-rendered copies of the same post collapse into one.
//!
//! ## Quick Start
//!
//! ```rust
//! use feed_capture::{dom, extract_post, AttributeLayout, Options};
//!
//! let doc = dom::parse(r#"
//!     <div role="feed">
//!         <div role="article" aria-posinset="1" aria-labelledby="t1">
//!             <h3><a role="link" href="/ann">Ann</a></h3>
//!             <div dir="auto">Hello from the feed</div>
//!         </div>
//!     </div>"#);
//! let post = doc.select(r#"[role="article"]"#);
//!
//! let record = extract_post(&post, "https://social.example/", &AttributeLayout, &Options::default())
//!     .expect("post has a caption");
//! assert_eq!(record.author, "Ann");
//! assert_eq!(record.text, "Hello from the feed");
//! assert!(record.post_id.starts_with("post_"));
//! ```
//!
//! ## Driving a live page
//!
//! A [`Session`] is the event loop: the host forwards scroll/resize/mutation
//! and intersection events to [`Session::handle`] and calls [`Session::tick`]
//! periodically. The host supplies three capabilities: [`Viewport`]
//! (visibility and mutation observation), [`Layout`] (rendered sizes) and
//! [`Dispatcher`] (the channel to the persistence store).

mod error;
mod options;
mod patterns;

/// DOM operations adapter over `dom_query`.
pub mod dom;

/// Candidate classification (top-level post vs. reply, comment, ad).
pub mod classifier;

/// Caption, image and author extraction.
pub mod extractor;

/// Content fingerprints for post deduplication.
pub mod identity;

/// Visibility tracking and the viewport capability.
pub mod visibility;

/// Mutation watching and candidate registration.
pub mod watcher;

/// Idle, one-shot and interval timers.
pub mod timer;

/// Session context and extraction orchestration.
pub mod session;

/// Record dispatch to the persistence collaborator.
pub mod dispatch;

/// Boundary message shapes.
pub mod protocol;

/// Reference persistence store.
pub mod store;

/// Extracted record type.
pub mod record;

/// URL validation and resolution.
pub mod url_utils;

/// Snapshot charset detection and decoding.
pub mod encoding;

/// One-shot extraction over a saved page.
pub mod snapshot;

// Public API - re-exports
pub use dispatch::{Completion, Dispatcher, StoreDispatcher, Ticket};
pub use error::{DispatchError, Error, Result, StoreError};
pub use extractor::{AttributeLayout, Fields, ImageContext, Layout, Rect};
pub use options::Options;
pub use protocol::{Request, Response};
pub use record::ExtractedRecord;
pub use session::{Event, Page, PassReport, Session};
pub use snapshot::{capture, SnapshotCapture, SnapshotViewport};
pub use store::{PostStore, StoreStats};
pub use visibility::{IntersectionUpdate, VisibilityEntry, VisibilityTracker, Viewport};

use dom_query::Selection;

/// Extract one post outside of any session.
///
/// Runs the extractor suite and the identity builder over `post`. Returns
/// `None` when the post has neither caption nor images.
#[must_use]
pub fn extract_post(
    post: &Selection,
    location: &str,
    layout: &dyn Layout,
    options: &Options,
) -> Option<ExtractedRecord> {
    let base_url = url::Url::parse(location).ok();
    let ctx = ImageContext {
        layout,
        base_url: base_url.as_ref(),
        min_side: options.min_image_side,
    };

    let fields = extractor::extract_fields(post, &ctx, options);
    if fields.is_empty() {
        return None;
    }

    let post_id = identity::key_for_fields(post, &fields, options.caption_preview_len);
    Some(ExtractedRecord::new(post_id, fields, location, chrono::Utc::now()))
}

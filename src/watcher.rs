//! Mutation watching and candidate registration.

use dom_query::{Document, NodeId};
use tracing::debug;

use crate::classifier;
use crate::dom;
use crate::patterns::FEED_ROOTS;
use crate::visibility::{VisibilityTracker, Viewport};

/// Root the mutation watch is attached to: the feed, else the main region,
/// else `<body>`.
#[must_use]
pub fn feed_root(doc: &Document) -> Option<NodeId> {
    FEED_ROOTS
        .iter()
        .find_map(|selector| dom::first_id(&doc.select(selector)))
}

/// Attach the mutation watch to the current feed root.
///
/// Returns the chosen root, or `None` for a document without a body.
pub fn watch<V: Viewport>(doc: &Document, viewport: &mut V) -> Option<NodeId> {
    let root = feed_root(doc)?;
    viewport.watch_mutations(root);
    Some(root)
}

/// Register every approved candidate not yet registered.
///
/// Idempotent: repeated calls only register elements new since the last one.
/// Returns how many new registrations were made.
pub fn register_candidates<V: Viewport>(
    doc: &Document,
    tracker: &mut VisibilityTracker,
    viewport: &mut V,
    thresholds: &[f64],
) -> usize {
    let mut added = 0;
    for candidate in classifier::find_candidates(doc) {
        let Some(node) = dom::first_id(&candidate) else {
            continue;
        };
        if tracker.register(viewport, node, thresholds) {
            added += 1;
        }
    }
    if added > 0 {
        debug!(added, "registered new candidates");
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingViewport {
        observed: Vec<NodeId>,
        watched: Option<NodeId>,
    }

    impl Viewport for RecordingViewport {
        fn observe(&mut self, node: NodeId, _thresholds: &[f64]) {
            self.observed.push(node);
        }
        fn disconnect(&mut self) {
            self.observed.clear();
        }
        fn watch_mutations(&mut self, root: NodeId) {
            self.watched = Some(root);
        }
    }

    #[test]
    fn test_feed_root_preference() {
        let doc = dom::parse(r#"<div role="main"><div role="feed" id="f"></div></div>"#);
        assert_eq!(feed_root(&doc), dom::first_id(&doc.select("#f")));

        let doc = dom::parse(r#"<div role="main" id="m"></div>"#);
        assert_eq!(feed_root(&doc), dom::first_id(&doc.select("#m")));

        let doc = dom::parse("<p>bare</p>");
        assert_eq!(feed_root(&doc), dom::first_id(&doc.select("body")));
    }

    #[test]
    fn test_watch_attaches_to_root() {
        let doc = dom::parse(r#"<div role="feed" id="f"></div>"#);
        let mut viewport = RecordingViewport::default();

        let root = watch(&doc, &mut viewport);
        assert_eq!(root, viewport.watched);
        assert!(root.is_some());
    }

    #[test]
    fn test_registration_picks_up_insertions_only_once() {
        let doc = dom::parse(r#"<div role="feed" id="f"><div role="article">one</div></div>"#);
        let mut tracker = VisibilityTracker::new();
        let mut viewport = RecordingViewport::default();

        assert_eq!(register_candidates(&doc, &mut tracker, &mut viewport, &[0.0]), 1);
        assert_eq!(register_candidates(&doc, &mut tracker, &mut viewport, &[0.0]), 0);

        doc.select("#f")
            .append_html(r#"<div role="article">two</div><div role="article">Sponsored</div>"#);

        assert_eq!(register_candidates(&doc, &mut tracker, &mut viewport, &[0.0]), 1);
        assert_eq!(viewport.observed.len(), 2);
    }
}

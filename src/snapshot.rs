//! One-shot extraction over a saved page.
//!
//! A snapshot has no scrolling, so every candidate counts as fully visible
//! and a single pass takes all of them.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use tracing::info;

use crate::dom::{Document, NodeId};
use crate::{
    classifier, AttributeLayout, Event, IntersectionUpdate, Options, Page, PassReport, PostStore,
    Session, StoreDispatcher, Viewport,
};

/// Viewport for a static snapshot: remembers registrations so they can be
/// reported back as fully visible.
#[derive(Debug, Default)]
pub struct SnapshotViewport {
    observed: Vec<NodeId>,
}

impl SnapshotViewport {
    #[must_use]
    pub fn observed(&self) -> &[NodeId] {
        &self.observed
    }
}

impl Viewport for SnapshotViewport {
    fn observe(&mut self, node: NodeId, _thresholds: &[f64]) {
        self.observed.push(node);
    }

    fn disconnect(&mut self) {
        self.observed.clear();
    }

    fn watch_mutations(&mut self, _root: NodeId) {}
}

/// Result of [`capture`].
#[derive(Debug)]
pub struct SnapshotCapture {
    /// Candidate posts found in the document.
    pub candidates: usize,
    pub report: PassReport,
    pub store: PostStore,
}

/// Run one extraction pass over `doc` into a fresh in-memory store.
///
/// `options.max_posts_per_pass` is raised to the candidate count.
#[must_use]
pub fn capture(doc: &Document, location: &str, mut options: Options) -> SnapshotCapture {
    let candidates = classifier::find_candidates(doc).len();
    options.max_posts_per_pass = options.max_posts_per_pass.max(candidates);

    let store = Rc::new(RefCell::new(PostStore::new()));
    let page = Page {
        document: doc,
        location,
        layout: &AttributeLayout,
    };
    let now = Instant::now();
    let mut session = Session::new(
        options,
        SnapshotViewport::default(),
        StoreDispatcher::new(Rc::clone(&store)),
        &page,
        now,
    );

    let updates = session
        .viewport()
        .observed()
        .iter()
        .map(|node| IntersectionUpdate {
            node: *node,
            ratio: 1.0,
        })
        .collect();
    session.handle(&page, Event::Intersections(updates), now);

    let report = session.run_pass(&page);
    session.pump_completions();

    info!(
        candidates,
        dispatched = report.dispatched,
        empty = report.empty,
        "snapshot processed"
    );

    let store = std::mem::take(&mut *store.borrow_mut());
    SnapshotCapture {
        candidates,
        report,
        store,
    }
}

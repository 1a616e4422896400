//! Page session: the event-driven extraction loop.
//!
//! A [`Session`] owns all transient state for one page session (visibility
//! entries, the seen-set, in-flight dispatches, timers) and is driven by the
//! host through two entry points:
//!
//! - [`Session::handle`] for page events (scroll, resize, mutation batches,
//!   intersection callbacks, dispatch completions);
//! - [`Session::tick`] to let due timers fire (idle window, initial pass,
//!   registration recheck, navigation poll, runtime retry).
//!
//! Everything runs on the caller's thread and every call runs to completion,
//! so no locking is involved. On navigation the whole state is discarded and
//! rebuilt.

use std::collections::HashSet;
use std::time::Instant;

use chrono::Utc;
use dom_query::{Document, NodeId};
use tracing::{debug, info, warn};
use url::Url;

use crate::dispatch::{Completion, Dispatcher, Ticket};
use crate::dom;
use crate::error::DispatchError;
use crate::extractor::{extract_fields, ImageContext, Layout};
use crate::identity;
use crate::options::Options;
use crate::protocol::Request;
use crate::record::ExtractedRecord;
use crate::timer::{Delay, IdleTimer, Interval};
use crate::visibility::{IntersectionUpdate, VisibilityTracker, Viewport};
use crate::watcher;

/// The host page as seen during one call.
#[derive(Clone, Copy)]
pub struct Page<'a> {
    pub document: &'a Document,
    /// Current location (`location.href`).
    pub location: &'a str,
    pub layout: &'a dyn Layout,
}

/// Host events the session reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Scroll,
    Resize,
    /// A batch of insertions/removals under the watched root.
    Mutations,
    Intersections(Vec<IntersectionUpdate>),
    DispatchCompleted(Completion),
}

/// What one extraction pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Candidates taken from the ranking.
    pub selected: usize,
    /// Records handed to the dispatcher.
    pub dispatched: usize,
    /// Skipped: id already in the seen-set.
    pub already_seen: usize,
    /// Skipped: a dispatch for the same id is pending.
    pub in_flight: usize,
    /// Skipped: neither caption nor images.
    pub empty: usize,
    /// Entries dropped because the node left the document.
    pub pruned: usize,
    /// Records the channel refused.
    pub send_failures: usize,
}

#[derive(Debug)]
enum Phase {
    /// Messaging runtime not reachable yet; retry start when the delay fires.
    WaitingForRuntime(Delay),
    Running,
}

/// Session-scoped context shared by every pipeline component.
pub struct Session<V: Viewport, D: Dispatcher> {
    options: Options,
    viewport: V,
    dispatcher: D,
    tracker: VisibilityTracker,
    seen: HashSet<String>,
    in_flight: HashSet<String>,
    generation: u64,
    location: String,
    phase: Phase,
    idle: IdleTimer,
    initial_pass: Option<Delay>,
    recheck: Option<Interval>,
    navigation: Interval,
    feed_root: Option<NodeId>,
}

impl<V: Viewport, D: Dispatcher> Session<V, D> {
    /// Create a session for `page` and start it if the runtime is available.
    pub fn new(options: Options, viewport: V, dispatcher: D, page: &Page, now: Instant) -> Self {
        let mut session = Self {
            idle: IdleTimer::new(options.idle_window()),
            navigation: Interval::starting_at(now, options.navigation_poll()),
            options,
            viewport,
            dispatcher,
            tracker: VisibilityTracker::new(),
            seen: HashSet::new(),
            in_flight: HashSet::new(),
            generation: 0,
            location: page.location.to_string(),
            phase: Phase::WaitingForRuntime(Delay::after(now, std::time::Duration::ZERO)),
            initial_pass: None,
            recheck: None,
            feed_root: None,
        };
        session.try_start(page, now);
        session
    }

    fn try_start(&mut self, page: &Page, now: Instant) {
        if !self.dispatcher.is_available() {
            debug!("runtime not ready; delaying start");
            self.phase = Phase::WaitingForRuntime(Delay::after(now, self.options.runtime_retry()));
            return;
        }

        self.phase = Phase::Running;
        self.rebuild_registrations(page.document);
        self.initial_pass = Some(Delay::after(now, self.options.initial_delay()));
        self.recheck = Some(Interval::starting_at(now, self.options.recheck_interval()));
        info!(location = %self.location, "feed capture ready");
    }

    /// React to one host event.
    pub fn handle(&mut self, page: &Page, event: Event, now: Instant) {
        if let Event::DispatchCompleted(completion) = event {
            self.complete(completion);
            return;
        }
        if !self.is_running() {
            return;
        }

        match event {
            Event::Scroll | Event::Resize => self.idle.mark_busy(now),
            Event::Mutations => {
                self.register(page.document);
                self.idle.mark_busy(now);
            }
            Event::Intersections(updates) => self.tracker.apply(page.document, &updates, now),
            Event::DispatchCompleted(_) => {}
        }
    }

    /// Fire whatever timers are due at `now`.
    ///
    /// Returns the report of the extraction pass if one ran.
    pub fn tick(&mut self, page: &Page, now: Instant) -> Option<PassReport> {
        self.pump_completions();

        if self.navigation.fire_if_due(now) {
            self.check_navigation(page);
        }

        let report = match &mut self.phase {
            Phase::WaitingForRuntime(retry) => {
                if retry.fire_if_due(now) {
                    self.try_start(page, now);
                }
                None
            }
            Phase::Running => {
                if self.recheck.as_mut().is_some_and(|r| r.fire_if_due(now)) {
                    self.register(page.document);
                }
                let initial_due = self.initial_pass.as_mut().is_some_and(|d| d.fire_if_due(now));
                let idle_due = self.idle.fire_if_due(now);
                (initial_due || idle_due).then(|| self.run_pass(page))
            }
        };

        self.pump_completions();
        report
    }

    /// Reset everything if the page location changed.
    ///
    /// Returns whether a reset happened.
    pub fn check_navigation(&mut self, page: &Page) -> bool {
        if page.location == self.location {
            return false;
        }
        self.location = page.location.to_string();
        self.seen.clear();
        self.in_flight.clear();
        self.generation += 1;
        self.tracker.clear();
        self.idle.cancel();
        self.viewport.disconnect();
        if self.is_running() {
            self.rebuild_registrations(page.document);
        }
        info!(location = %self.location, generation = self.generation, "navigation detected, state reset");
        true
    }

    /// Run one extraction pass over the currently visible candidates.
    pub fn run_pass(&mut self, page: &Page) -> PassReport {
        let mut report = PassReport::default();
        let base_url = Url::parse(page.location).ok();
        let ctx = ImageContext {
            layout: page.layout,
            base_url: base_url.as_ref(),
            min_side: self.options.min_image_side,
        };

        // Virtualized feeds drop posts from the DOM without telling us.
        report.pruned = self.tracker.retain_attached(page.document);

        let batch = self
            .tracker
            .ranked(self.options.visibility_threshold, self.options.max_posts_per_pass);
        report.selected = batch.len();

        for node in batch {
            let post = dom::select_node(page.document, node);
            let fields = extract_fields(&post, &ctx, &self.options);
            let post_id = identity::key_for_fields(&post, &fields, self.options.caption_preview_len);

            if self.seen.contains(&post_id) {
                report.already_seen += 1;
                continue;
            }
            if self.in_flight.contains(&post_id) {
                report.in_flight += 1;
                continue;
            }
            if fields.is_empty() {
                debug!(%post_id, "nothing to record yet");
                report.empty += 1;
                continue;
            }

            let record = ExtractedRecord::new(post_id, fields, page.location, Utc::now());
            match self.dispatch(record) {
                Ok(()) => report.dispatched += 1,
                Err(_) => report.send_failures += 1,
            }
        }

        debug!(?report, "extraction pass finished");
        report
    }

    /// Apply completions the dispatcher has collected.
    pub fn pump_completions(&mut self) {
        for completion in self.dispatcher.poll_completions() {
            self.complete(completion);
        }
    }

    fn dispatch(&mut self, record: ExtractedRecord) -> Result<(), DispatchError> {
        let ticket = Ticket {
            generation: self.generation,
            post_id: record.post_id.clone(),
        };

        let sent = if self.dispatcher.is_available() {
            self.dispatcher
                .send(ticket.clone(), Request::StorePost { data: record })
        } else {
            Err(DispatchError::Unavailable)
        };

        match sent {
            Ok(()) => {
                self.in_flight.insert(ticket.post_id);
                Ok(())
            }
            Err(e) => {
                log_dispatch_failure(&ticket.post_id, &e);
                Err(e)
            }
        }
    }

    fn complete(&mut self, completion: Completion) {
        if completion.ticket.generation != self.generation {
            debug!(post_id = %completion.ticket.post_id, "completion from before navigation ignored");
            return;
        }
        self.in_flight.remove(&completion.ticket.post_id);

        match completion.outcome() {
            Ok(()) => {
                info!(post_id = %completion.ticket.post_id, "stored post");
                self.seen.insert(completion.ticket.post_id);
            }
            Err(e) => log_dispatch_failure(&completion.ticket.post_id, &e),
        }
    }

    fn register(&mut self, doc: &Document) {
        watcher::register_candidates(
            doc,
            &mut self.tracker,
            &mut self.viewport,
            &self.options.observe_thresholds,
        );
    }

    fn rebuild_registrations(&mut self, doc: &Document) {
        self.register(doc);
        self.feed_root = watcher::watch(doc, &mut self.viewport);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running)
    }

    #[must_use]
    pub fn is_seen(&self, post_id: &str) -> bool {
        self.seen.contains(post_id)
    }

    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_in_flight(&self, post_id: &str) -> bool {
        self.in_flight.contains(post_id)
    }

    #[must_use]
    pub fn tracker(&self) -> &VisibilityTracker {
        &self.tracker
    }

    /// Bumped on every navigation reset.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn feed_root(&self) -> Option<NodeId> {
        self.feed_root
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    #[must_use]
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }
}

fn log_dispatch_failure(post_id: &str, error: &DispatchError) {
    match error {
        DispatchError::ContextInvalidated => {
            warn!(%post_id, "extension context invalidated; will retry on a later pass");
        }
        DispatchError::Unavailable => {
            warn!(%post_id, "runtime unavailable or reloaded; skipping send");
        }
        other => warn!(%post_id, error = %other, "dispatch failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::StoreDispatcher;
    use crate::extractor::AttributeLayout;
    use crate::store::PostStore;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Default)]
    struct NullViewport {
        observed: usize,
        disconnects: usize,
    }

    impl Viewport for NullViewport {
        fn observe(&mut self, _node: NodeId, _thresholds: &[f64]) {
            self.observed += 1;
        }
        fn disconnect(&mut self) {
            self.disconnects += 1;
        }
        fn watch_mutations(&mut self, _root: NodeId) {}
    }

    const FEED: &str = r#"
        <div role="feed">
            <div role="article" aria-posinset="1" aria-labelledby="h1">
                <h3><a role="link" href="/ann">Ann</a></h3>
                <div dir="auto">First post caption</div>
            </div>
        </div>
    "#;

    fn session(doc: &Document, location: &str, now: Instant) -> Session<NullViewport, StoreDispatcher> {
        let store = Rc::new(RefCell::new(PostStore::new()));
        let page = Page { document: doc, location, layout: &AttributeLayout };
        Session::new(Options::default(), NullViewport::default(), StoreDispatcher::new(store), &page, now)
    }

    #[test]
    fn test_start_registers_candidates() {
        let doc = dom::parse(FEED);
        let s = session(&doc, "https://social.example/", Instant::now());

        assert!(s.is_running());
        assert_eq!(s.viewport().observed, 1);
        assert!(s.feed_root().is_some());
    }

    #[test]
    fn test_waits_for_runtime() {
        let doc = dom::parse(FEED);
        let page = Page { document: &doc, location: "https://social.example/", layout: &AttributeLayout };
        let dispatcher = StoreDispatcher::new(Rc::new(RefCell::new(PostStore::new())));
        let availability = dispatcher.availability();
        availability.set(false);
        let t0 = Instant::now();

        let mut s = Session::new(Options::default(), NullViewport::default(), dispatcher, &page, t0);
        assert!(!s.is_running());
        assert_eq!(s.viewport().observed, 0);

        s.tick(&page, t0 + Duration::from_millis(500));
        assert!(!s.is_running());

        availability.set(true);
        s.tick(&page, t0 + Duration::from_millis(1000));
        assert!(s.is_running());
        assert_eq!(s.viewport().observed, 1);
    }

    #[test]
    fn test_events_ignored_before_start() {
        let doc = dom::parse(FEED);
        let page = Page { document: &doc, location: "https://social.example/", layout: &AttributeLayout };
        let dispatcher = StoreDispatcher::new(Rc::new(RefCell::new(PostStore::new())));
        dispatcher.availability().set(false);
        let t0 = Instant::now();
        let node = dom::first_id(&doc.select(r#"[role="article"]"#)).unwrap();

        let mut s = Session::new(Options::default(), NullViewport::default(), dispatcher, &page, t0);
        s.handle(&page, Event::Intersections(vec![IntersectionUpdate { node, ratio: 1.0 }]), t0);

        assert!(s.tracker().is_empty());
    }

    #[test]
    fn test_stale_completion_ignored() {
        let doc = dom::parse(FEED);
        let t0 = Instant::now();
        let mut s = session(&doc, "https://social.example/a", t0);
        let page = Page { document: &doc, location: "https://social.example/b", layout: &AttributeLayout };

        assert!(s.check_navigation(&page));
        assert_eq!(s.generation(), 1);
        assert_eq!(s.viewport().disconnects, 1);

        s.handle(
            &page,
            Event::DispatchCompleted(Completion {
                ticket: Ticket { generation: 0, post_id: "post_old".to_string() },
                result: Ok(crate::protocol::Response::ok()),
            }),
            t0,
        );
        assert!(!s.is_seen("post_old"));
    }

    #[test]
    fn test_scroll_bursts_coalesce_into_one_pass() {
        let doc = dom::parse(FEED);
        let t0 = Instant::now();
        let mut s = session(&doc, "https://social.example/", t0);
        let page = Page { document: &doc, location: "https://social.example/", layout: &AttributeLayout };
        let ms = Duration::from_millis;

        // Consume the landing pass.
        assert!(s.tick(&page, t0 + ms(800)).is_some());

        s.handle(&page, Event::Scroll, t0 + ms(900));
        s.handle(&page, Event::Scroll, t0 + ms(1200));
        s.handle(&page, Event::Resize, t0 + ms(1400));

        assert!(s.tick(&page, t0 + ms(1500)).is_none());
        assert!(s.tick(&page, t0 + ms(2000)).is_some());
        assert!(s.tick(&page, t0 + ms(2600)).is_none());
    }
}

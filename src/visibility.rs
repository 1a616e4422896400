//! Visibility tracking.
//!
//! The host reports intersection changes for registered elements; the tracker
//! keeps only the latest ratio and sighting time per element. Entries are keyed
//! by node handle and never assumed valid between passes.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use dom_query::{Document, NodeId};
use tracing::debug;

use crate::classifier;
use crate::dom;

/// Host capability: viewport-visibility and mutation observation.
///
/// Registrations are asynchronous in a browser; results come back to the
/// session as [`IntersectionUpdate`]s and mutation events.
pub trait Viewport {
    /// Start reporting visible-fraction crossings of `thresholds` for `node`.
    fn observe(&mut self, node: NodeId, thresholds: &[f64]);

    /// Drop every registration made through [`Viewport::observe`].
    fn disconnect(&mut self);

    /// Watch insertions/removals in the subtree under `root`, replacing any
    /// previous mutation watch.
    fn watch_mutations(&mut self, root: NodeId);
}

/// One intersection callback entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionUpdate {
    pub node: NodeId,
    /// Visible fraction, clamped into `[0, 1]` on record.
    pub ratio: f64,
}

/// Latest visibility of one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityEntry {
    pub ratio: f64,
    pub last_seen_at: Instant,
    /// First-registration order, for stable ranking among equal ratios.
    seq: u64,
}

/// Per-session map of candidate element to its latest visibility.
#[derive(Debug, Default)]
pub struct VisibilityTracker {
    entries: HashMap<NodeId, VisibilityEntry>,
    registered: HashSet<NodeId>,
    next_seq: u64,
}

impl VisibilityTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate with the viewport unless already registered.
    ///
    /// Returns whether a new registration was made.
    pub fn register<V: Viewport>(&mut self, viewport: &mut V, node: NodeId, thresholds: &[f64]) -> bool {
        if !self.registered.insert(node) {
            return false;
        }
        viewport.observe(node, thresholds);
        true
    }

    #[must_use]
    pub fn is_registered(&self, node: NodeId) -> bool {
        self.registered.contains(&node)
    }

    /// Apply a batch of intersection updates.
    ///
    /// Elements that no longer classify as posts (re-rendered into a comment,
    /// flagged sponsored) are not recorded.
    pub fn apply(&mut self, doc: &Document, updates: &[IntersectionUpdate], now: Instant) {
        for update in updates {
            if !dom::is_attached(doc, update.node) {
                continue;
            }
            if !classifier::is_candidate(&dom::select_node(doc, update.node)) {
                debug!(node = ?update.node, "intersection for non-candidate ignored");
                continue;
            }
            self.record(update.node, update.ratio, now);
        }
    }

    /// Overwrite the entry for `node`.
    pub fn record(&mut self, node: NodeId, ratio: f64, now: Instant) {
        let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
        let next_seq = &mut self.next_seq;
        self.entries
            .entry(node)
            .and_modify(|entry| {
                entry.ratio = ratio;
                entry.last_seen_at = now;
            })
            .or_insert_with(|| {
                let seq = *next_seq;
                *next_seq += 1;
                VisibilityEntry {
                    ratio,
                    last_seen_at: now,
                    seq,
                }
            });
    }

    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<&VisibilityEntry> {
        self.entries.get(&node)
    }

    /// Forget a node (detached from the document).
    pub fn remove(&mut self, node: NodeId) {
        self.entries.remove(&node);
        self.registered.remove(&node);
    }

    /// Forget every entry and registration whose node left the document.
    ///
    /// Returns how many nodes were dropped.
    pub fn retain_attached(&mut self, doc: &Document) -> usize {
        let detached: HashSet<NodeId> = self
            .registered
            .iter()
            .chain(self.entries.keys())
            .copied()
            .filter(|node| !dom::is_attached(doc, *node))
            .collect();

        for node in &detached {
            self.remove(*node);
        }
        if !detached.is_empty() {
            debug!(pruned = detached.len(), "dropped detached candidates");
        }
        detached.len()
    }

    #[must_use]
    pub fn registered_len(&self) -> usize {
        self.registered.len()
    }

    /// Nodes at or above `threshold`, most visible first, at most `limit`.
    ///
    /// Ties keep first-registration order.
    #[must_use]
    pub fn ranked(&self, threshold: f64, limit: usize) -> Vec<NodeId> {
        let mut eligible: Vec<(NodeId, &VisibilityEntry)> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.ratio >= threshold)
            .map(|(node, entry)| (*node, entry))
            .collect();

        eligible.sort_by(|(_, a), (_, b)| {
            b.ratio.total_cmp(&a.ratio).then(a.seq.cmp(&b.seq))
        });

        eligible.into_iter().take(limit).map(|(node, _)| node).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries and registrations.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.registered.clear();
    }
}

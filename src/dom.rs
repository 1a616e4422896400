//! DOM Operations Adapter
//!
//! Thin helpers over the `dom_query` crate for the operations the feed pipeline
//! needs from a live page: node handles that may go stale, `closest`-style
//! ancestor tests, an approximation of rendered text, and detached clones.

// Re-export core types for external use
pub use dom_query::{Document, NodeId, NodeRef, Selection};

/// Elements whose boundaries produce line breaks in rendered text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Elements that never render text.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

// === Parsing ===

/// Parse HTML string into document
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

// === Handles ===

/// Resolve a node handle against its document.
///
/// Handles are arena indices: they stay resolvable after the node is removed
/// from the tree, so callers must still check [`is_attached`].
#[inline]
#[must_use]
pub fn node<'a>(doc: &'a Document, id: NodeId) -> NodeRef<'a> {
    NodeRef::new(id, &doc.tree)
}

/// Selection wrapping a single handle.
#[inline]
#[must_use]
pub fn select_node(doc: &Document, id: NodeId) -> Selection<'_> {
    Selection::from(node(doc, id))
}

/// Whether the node is still connected to the document root.
#[must_use]
pub fn is_attached(doc: &Document, id: NodeId) -> bool {
    let root_id = doc.root().id;
    let mut current = Some(node(doc, id));
    while let Some(n) = current {
        if n.id == root_id {
            return true;
        }
        current = n.parent();
    }
    false
}

/// Handle of the first node in a selection.
#[inline]
#[must_use]
pub fn first_id(sel: &Selection) -> Option<NodeId> {
    sel.nodes().first().map(|n| n.id)
}

// === Attributes ===

/// Get any attribute value
#[inline]
#[must_use]
pub fn get_attribute(sel: &Selection, name: &str) -> Option<String> {
    sel.attr(name).map(|s| s.to_string())
}

/// Get a non-empty attribute value
#[must_use]
pub fn non_empty_attribute(sel: &Selection, name: &str) -> Option<String> {
    get_attribute(sel, name).filter(|v| !v.is_empty())
}

// === Ancestry ===

/// Nearest inclusive ancestor matching `selector`.
///
/// Mirrors `Element.closest`: the element itself is tested first.
#[must_use]
pub fn closest<'a>(sel: &Selection<'a>, selector: &str) -> Option<Selection<'a>> {
    let mut current = sel.nodes().first().copied();
    while let Some(n) = current {
        if n.is_element() {
            let candidate = Selection::from(n);
            if candidate.is(selector) {
                return Some(candidate);
            }
        }
        current = n.parent();
    }
    None
}

/// Nearest strict ancestor matching `selector`.
#[must_use]
pub fn closest_ancestor<'a>(sel: &Selection<'a>, selector: &str) -> Option<Selection<'a>> {
    let parent = sel.nodes().first().and_then(NodeRef::parent)?;
    closest(&Selection::from(parent), selector)
}

/// Whether `sel` or one of its ancestors matches `selector`.
#[inline]
#[must_use]
pub fn within(sel: &Selection, selector: &str) -> bool {
    closest(sel, selector).is_some()
}

// === Text Content ===

/// Approximate rendered text, the way `innerText` reads.
///
/// Whitespace inside text runs collapses to one space, block boundaries and
/// `<br>` become line breaks, and script/style content is skipped.
#[must_use]
pub fn inner_text(sel: &Selection) -> String {
    let mut out = String::new();
    for n in sel.nodes() {
        collect_text(n, &mut out);
    }
    out.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

fn collect_text(n: &NodeRef, out: &mut String) {
    if n.is_text() {
        let text = n.text();
        let mut last_space = out.ends_with([' ', '\n']) || out.is_empty();
        for c in text.chars() {
            if c.is_whitespace() {
                if !last_space {
                    out.push(' ');
                    last_space = true;
                }
            } else {
                out.push(c);
                last_space = false;
            }
        }
        return;
    }

    if !n.is_element() && !n.is_document() {
        return;
    }

    let tag = n
        .node_name()
        .map(|t| t.to_ascii_lowercase())
        .unwrap_or_default();
    if HIDDEN_ELEMENTS.contains(&tag.as_str()) {
        return;
    }
    if tag == "br" {
        out.push('\n');
        return;
    }

    let block = BLOCK_ELEMENTS.contains(&tag.as_str());
    if block {
        break_line(out);
    }
    for child in n.children() {
        collect_text(&child, out);
    }
    if block {
        break_line(out);
    }
}

fn break_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

// === Cloning ===

/// Deep copy of an element into its own document.
///
/// The copy shares nothing with the live page, so it can be mutated freely.
/// Select the copy's top element with [`clone_root`].
#[must_use]
pub fn detached_clone(sel: &Selection) -> Document {
    Document::from(sel.html().to_string())
}

/// Top element of a detached clone (the first child of `<body>`).
#[must_use]
pub fn clone_root(doc: &Document) -> Selection<'_> {
    doc.select("body > *").first()
}

//! Author extraction.

use dom_query::Selection;

use crate::dom;
use crate::patterns::{AUTHOR_LINKS, UNKNOWN_AUTHOR};

/// Extract the post author's display name.
///
/// Tries heading links, the story subtitle, then profile-link patterns, and
/// takes the first non-empty name shorter than `max_len` characters. Falls
/// back to `"Unknown Author"`; never returns an empty string.
#[must_use]
pub fn extract_author(sel: &Selection, max_len: usize) -> String {
    for selector in AUTHOR_LINKS {
        let link = sel.select(selector).first();
        if !link.exists() {
            continue;
        }
        let name = dom::inner_text(&link);
        let name = name.trim();
        if !name.is_empty() && name.chars().count() < max_len {
            return name.to_string();
        }
    }
    UNKNOWN_AUTHOR.to_string()
}

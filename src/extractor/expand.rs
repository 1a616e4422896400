//! Unclamped clones of post elements.
//!
//! Captions are often rendered pre-truncated behind a "See more" button and a
//! CSS line clamp. Clicking the button would re-layout the live page, so the
//! caption is read from a detached copy with the affordance removed and the
//! clamp relaxed instead.

use dom_query::{Document, Selection};

use crate::dom;
use crate::patterns::{AFFORDANCE_HOLDER, CLAMP_STYLE, TRUNCATION_LABELS};

/// Style properties that undo a clamp, applied over the clamped declaration.
const EXPANDED_STYLE: &[(&str, &str)] = &[
    ("-webkit-line-clamp", "unset"),
    ("max-height", "none"),
    ("overflow", "visible"),
    ("text-overflow", "unset"),
    ("display", "block"),
    ("white-space", "normal"),
];

/// Deep-copy `sel` and defeat truncation on the copy.
///
/// The live document is never touched. Use [`dom::clone_root`] to reach the
/// copied element.
#[must_use]
pub fn expand(sel: &Selection) -> Document {
    let clone = dom::detached_clone(sel);
    {
        let root = dom::clone_root(&clone);
        remove_truncation_affordances(&root);
        relax_clamps(&root);
    }
    clone
}

/// Whether trimmed rendered text is (or starts with) a truncation label.
#[must_use]
pub fn is_truncation_label(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    !text.is_empty()
        && TRUNCATION_LABELS
            .iter()
            .any(|label| text == *label || text.starts_with(label))
}

fn remove_truncation_affordances(root: &Selection) {
    for n in root.select(AFFORDANCE_HOLDER).nodes() {
        let node = Selection::from(*n);
        if is_truncation_label(&dom::inner_text(&node)) {
            node.remove();
        }
    }
}

fn relax_clamps(root: &Selection) {
    for n in root.select("[style]").nodes() {
        let node = Selection::from(*n);
        let Some(style) = dom::get_attribute(&node, "style") else {
            continue;
        };
        if CLAMP_STYLE.is_match(&style) {
            node.set_attr("style", &unclamped_style(&style));
        }
    }
}

/// Rewrite a style declaration with the expanded properties overriding it.
#[must_use]
pub fn unclamped_style(style: &str) -> String {
    let mut declarations: Vec<String> = style
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| {
            let property = decl.split(':').next().unwrap_or_default().trim();
            !EXPANDED_STYLE
                .iter()
                .any(|(name, _)| property.eq_ignore_ascii_case(name))
        })
        .map(ToString::to_string)
        .collect();

    declarations.extend(
        EXPANDED_STYLE
            .iter()
            .map(|(name, value)| format!("{name}: {value}")),
    );
    declarations.join("; ")
}

//! Post identity.
//!
//! A post's id is a fingerprint of its content, not of its DOM node: the same
//! logical post re-rendered into a fresh node hashes to the same id. The hash
//! is a 32-bit rolling string hash, so collisions are possible and accepted.

use dom_query::Selection;

use crate::dom;
use crate::extractor::{extract_caption, extract_images, Fields, ImageContext};
use crate::options::Options;

/// Structural attributes folded into the fingerprint, in order.
const KEY_ATTRIBUTES: &[&str] = &[
    "data-pagelet",
    "aria-labelledby",
    "aria-posinset",
    "data-testid",
    "id",
];

/// Separator between fingerprint parts.
const SEPARATOR: u16 = b'|' as u16;

/// 32-bit rolling hash over UTF-16 code units.
///
/// `h = h * 31 + unit` with 32-bit wrap-around, computed as
/// `(h << 5) - h + unit`.
#[must_use]
pub fn hash_units(units: impl IntoIterator<Item = u16>) -> i32 {
    units.into_iter().fold(0i32, |hash, unit| {
        (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
    })
}

/// [`hash_units`] over a string's UTF-16 encoding.
#[must_use]
pub fn hash_string(input: &str) -> i32 {
    hash_units(input.encode_utf16())
}

/// Format a hash as a post id: `post_` plus the hex absolute value.
#[must_use]
pub fn format_post_id(hash: i32) -> String {
    format!("post_{:x}", i64::from(hash).unsigned_abs())
}

/// Non-empty structural attribute values joined with `|`.
#[must_use]
pub fn structural_signature(sel: &Selection) -> String {
    KEY_ATTRIBUTES
        .iter()
        .filter_map(|name| dom::non_empty_attribute(sel, name))
        .collect::<Vec<_>>()
        .join("|")
}

/// Post id from already-extracted parts.
///
/// Hashes `signature | caption[..preview_len] | first_image`, where the
/// caption prefix is measured in UTF-16 units.
#[must_use]
pub fn key_from_parts(
    signature: &str,
    caption: &str,
    first_image: Option<&str>,
    preview_len: usize,
) -> String {
    let units = signature
        .encode_utf16()
        .chain(std::iter::once(SEPARATOR))
        .chain(caption.encode_utf16().take(preview_len))
        .chain(std::iter::once(SEPARATOR))
        .chain(first_image.unwrap_or_default().encode_utf16());
    format_post_id(hash_units(units))
}

/// Post id of `sel` given its already-extracted fields.
#[must_use]
pub fn key_for_fields(sel: &Selection, fields: &Fields, preview_len: usize) -> String {
    key_from_parts(
        &structural_signature(sel),
        &fields.text,
        fields.images.first().map(String::as_str),
        preview_len,
    )
}

/// Build the fingerprint key of a post element.
///
/// Deterministic for a fixed subtree, attribute set and layout: no time or
/// randomness enters the key.
#[must_use]
pub fn build_key(sel: &Selection, ctx: &ImageContext, options: &Options) -> String {
    let caption = extract_caption(sel, options.min_block_len);
    let images = extract_images(sel, ctx);
    key_from_parts(
        &structural_signature(sel),
        &caption,
        images.first().map(String::as_str),
        options.caption_preview_len,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::AttributeLayout;

    fn ctx() -> ImageContext<'static> {
        ImageContext {
            layout: &AttributeLayout,
            base_url: None,
            min_side: 80.0,
        }
    }

    #[test]
    fn test_hash_known_values() {
        assert_eq!(hash_string(""), 0);
        assert_eq!(hash_string("a"), 97);
        // 31 * 97 + 98
        assert_eq!(hash_string("ab"), 3105);
        // Java/JS String hash of "hello"
        assert_eq!(hash_string("hello"), 99_162_322);
    }

    #[test]
    fn test_post_id_never_signed() {
        let hash = hash_string("the quick brown fox jumps over the lazy dog");
        let id = format_post_id(hash);
        assert!(id.starts_with("post_"));
        assert!(!id.contains('-'));
    }

    #[test]
    fn test_format_min_value() {
        assert_eq!(format_post_id(i32::MIN), "post_80000000");
        assert_eq!(format_post_id(-255), "post_ff");
    }

    #[test]
    fn test_signature_omits_missing_attributes() {
        let doc = dom::parse(r#"<div role="article" aria-posinset="4" id="" data-testid="story">x</div>"#);
        let sig = structural_signature(&doc.select(r#"[role="article"]"#));
        assert_eq!(sig, "4|story");
    }

    #[test]
    fn test_preview_truncated_to_len() {
        let long = "a".repeat(300);
        let truncated = "a".repeat(120);
        assert_eq!(
            key_from_parts("s", &long, None, 120),
            key_from_parts("s", &truncated, None, 120)
        );
        assert_ne!(
            key_from_parts("s", &long, None, 121),
            key_from_parts("s", &truncated, None, 121)
        );
    }

    #[test]
    fn test_build_key_is_deterministic() {
        let doc = dom::parse(
            r#"<div role="article" aria-posinset="1" aria-labelledby="t1">
                <div dir="auto">A caption worth keeping</div>
                <img src="https://cdn.test/p.jpg">
            </div>"#,
        );
        let post = doc.select(r#"[role="article"]"#);
        let opts = Options::default();

        let first = build_key(&post, &ctx(), &opts);
        let second = build_key(&post, &ctx(), &opts);
        assert_eq!(first, second);
        assert_eq!(
            first,
            key_from_parts("t1|1", "A caption worth keeping", Some("https://cdn.test/p.jpg"), 120)
        );
    }

    #[test]
    fn test_distinct_nodes_same_content_share_key() {
        let html = r#"<div role="article" aria-posinset="7" aria-labelledby="x"><div dir="auto">Same post body</div><img src="https://cdn.test/i.jpg"></div>"#;
        let doc_a = dom::parse(html);
        let doc_b = dom::parse(&format!("<section>{html}</section>"));
        let opts = Options::default();

        assert_eq!(
            build_key(&doc_a.select(r#"[role="article"]"#), &ctx(), &opts),
            build_key(&doc_b.select(r#"[role="article"]"#), &ctx(), &opts)
        );
    }
}

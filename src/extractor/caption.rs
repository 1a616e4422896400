//! Caption extraction.

use dom_query::Selection;

use super::expand;
use crate::dom;
use crate::patterns::{CAPTION_BLOCK, COMMENT_PAGELET, HEADING_REGION, PREVIEW_MESSAGE, WHITESPACE};

/// Blank-line separator between caption blocks.
const BLOCK_SEPARATOR: &str = "\n\n";

/// Extract the full caption of a post.
///
/// Reads from an unclamped clone. The preview message block (if any) comes
/// first, followed by every direction-marked text block outside headings and
/// comment regions. Blocks are whitespace-collapsed, de-duplicated in order of
/// first appearance, and blocks shorter than `min_block_len` characters are
/// dropped as UI chrome.
///
/// An empty string is a valid result (image-only posts).
#[must_use]
pub fn extract_caption(sel: &Selection, min_block_len: usize) -> String {
    let clone = expand::expand(sel);
    let root = dom::clone_root(&clone);

    let mut blocks: Vec<String> = Vec::new();

    let preview = root.select(PREVIEW_MESSAGE).first();
    if preview.exists() {
        blocks.push(dom::inner_text(&preview));
    }

    for n in root.select(CAPTION_BLOCK).nodes() {
        let block = Selection::from(*n);
        if dom::within(&block, HEADING_REGION) || dom::within(&block, COMMENT_PAGELET) {
            continue;
        }
        blocks.push(dom::inner_text(&block));
    }

    let mut kept: Vec<String> = Vec::new();
    for block in blocks {
        let clean = WHITESPACE.replace_all(block.trim(), " ").into_owned();
        if clean.chars().count() < min_block_len || kept.contains(&clean) {
            continue;
        }
        kept.push(clean);
    }

    kept.join(BLOCK_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caption(html: &str) -> String {
        let doc = dom::parse(html);
        extract_caption(&doc.select(r#"[role="article"]"#).first(), 5)
    }

    #[test]
    fn test_blocks_joined_with_blank_line() {
        let text = caption(
            r#"<div role="article"><div dir="auto">Hello</div><div dir="auto">World</div></div>"#,
        );
        assert_eq!(text, "Hello\n\nWorld");
    }

    #[test]
    fn test_preview_message_comes_first() {
        let text = caption(
            r#"<div role="article">
                <span dir="auto">Second block here</span>
                <div data-ad-preview="message">Preview first</div>
            </div>"#,
        );
        assert_eq!(text, "Preview first\n\nSecond block here");
    }

    #[test]
    fn test_headings_and_comments_excluded() {
        let text = caption(
            r#"<div role="article">
                <h2><span dir="auto">Author Name</span></h2>
                <header><div dir="auto">Header chrome</div></header>
                <div dir="auto">Actual caption</div>
                <div data-pagelet="comment_section"><div dir="auto">A comment reply</div></div>
            </div>"#,
        );
        assert_eq!(text, "Actual caption");
    }

    #[test]
    fn test_short_blocks_and_duplicates_dropped() {
        let text = caption(
            r#"<div role="article">
                <span dir="auto">2h</span>
                <div dir="auto">Same   text</div>
                <div dir="auto">Same text</div>
            </div>"#,
        );
        assert_eq!(text, "Same text");
    }

    #[test]
    fn test_image_only_post_has_empty_caption() {
        let text = caption(r#"<div role="article"><img src="https://cdn.test/a.jpg"></div>"#);
        assert_eq!(text, "");
    }

    #[test]
    fn test_clamped_caption_read_in_full() {
        let text = caption(
            r#"<div role="article">
                <div dir="auto" style="-webkit-line-clamp: 2; overflow: hidden">
                    First line of the story. Hidden tail beyond the clamp.
                    <div role="button">See more</div>
                </div>
            </div>"#,
        );
        assert!(text.contains("Hidden tail beyond the clamp."));
        assert!(!text.contains("See more"));
    }
}

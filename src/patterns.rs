//! Compiled regex patterns and CSS selectors for feed extraction.
//!
//! All patterns are compiled once at first use via `LazyLock`.
//! Selectors are kept as string constants so `dom_query` can reuse them.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

// =============================================================================
// Candidate Selectors
// =============================================================================

/// Shapes of a top-level feed item: an article-role container or an indexed feed row.
pub const CANDIDATE: &str = r#"[role="article"], div[aria-posinset][aria-labelledby]"#;

/// Article-role containers, used to detect nesting (replies).
pub const ARTICLE_ROLE: &str = r#"[role="article"]"#;

/// Comment-region markers.
pub const COMMENT_REGION: &str =
    r#"[data-pagelet*="comment"], [aria-label*="comment"], [data-testid*="comment"]"#;

/// Comment pagelets only; caption and image scans exclude these.
pub const COMMENT_PAGELET: &str = r#"[data-pagelet*="comment"]"#;

/// Header and heading regions, which hold author/title chrome rather than captions.
pub const HEADING_REGION: &str = "header, h1, h2, h3";

/// Feed root candidates for the mutation watcher, in preference order.
pub const FEED_ROOTS: &[&str] = &[r#"[role="feed"]"#, r#"[role="main"]"#, "body"];

// =============================================================================
// Caption Selectors
// =============================================================================

/// Sponsored/preview caption block, listed first in the caption.
pub const PREVIEW_MESSAGE: &str = r#"[data-ad-preview="message"]"#;

/// Direction-marked text blocks that carry caption text.
pub const CAPTION_BLOCK: &str = r#"div[dir="auto"], span[dir="auto"]"#;

/// Nodes that may hold a truncation affordance.
pub const AFFORDANCE_HOLDER: &str = r#"[role="button"], span, div"#;

/// Truncation affordance labels (lowercase).
pub const TRUNCATION_LABELS: &[&str] = &["see more", "show more"];

// =============================================================================
// Author Selectors
// =============================================================================

/// Author link selectors, tried in order.
pub const AUTHOR_LINKS: &[&str] = &[
    r#"h2 a[role="link"]"#,
    r#"h3 a[role="link"]"#,
    r#"[data-testid="story-subtitle"] a"#,
    r#"a[role="link"][href*="/profile.php"]"#,
    r#"a[role="link"][href*="/user/"]"#,
];

/// Sentinel author when no selector yields a usable name.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

// =============================================================================
// Image Selectors and Markers
// =============================================================================

/// Div-like nodes with an inline background image.
pub const BACKGROUND_IMAGE_HOLDER: &str = r#"div[style*="background-image"]"#;

/// URL fragments marking UI imagery rather than post content.
pub const NON_CONTENT_IMAGE_MARKERS: &[&str] =
    &["profile", "avatar", "emoji", "icon", "reaction", "sprite"];

// =============================================================================
// Regex Patterns
// =============================================================================

/// Advertising pagelet names: "Sponsored…" anywhere, or "Ad" as its own
/// camel, snake or upper-case segment ("AdUnit", "ad_feed", "FeedAds",
/// "AD_UNIT") but not inside words like "Header", "Adventure" or "HEADER".
pub static AD_PAGELET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i:sponsor)",
        r"|(?:^|[^A-Za-z])[Aa]d(?:s|vert[a-z]*)?(?:[^a-z]|$)",
        r"|[a-z]Ads?(?:[^a-z]|$)",
        r"|(?:^|[^A-Z])AD(?:S|VERT[A-Z]*)?(?:[^A-Z]|$)",
    ))
    .expect("AD_PAGELET regex")
});

/// Sponsorship marker in rendered post text.
pub static SPONSORED_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)sponsored").expect("SPONSORED_TEXT regex"));

/// Inline style declarations that clamp text.
pub static CLAMP_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-webkit-line-clamp|max-height|overflow\s*:\s*hidden|text-overflow")
        .expect("CLAMP_STYLE regex")
});

/// First `url(...)` in a style declaration.
pub static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(["']?([^"')]+)["']?\)"#).expect("CSS_URL regex")
});

/// Runs of whitespace for normalisation.
pub static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE regex"));

/// Leading pixel length in a CSS value ("120px", "80").
pub static PIXEL_LENGTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*(?:px)?\s*$").expect("PIXEL_LENGTH regex"));

//! URL Utility Functions
//!
//! Validation and resolution of image URLs found in feed markup, plus the
//! parsing of `background-image` declarations.

use url::Url;

use crate::patterns::{CSS_URL, NON_CONTENT_IMAGE_MARKERS};

/// Check if a string is a valid absolute http(s) URL.
///
/// # Returns
/// * `(is_absolute, parsed_url)` - Whether URL is absolute and the parsed URL if valid
#[must_use]
pub fn is_absolute_url(s: &str) -> (bool, Option<Url>) {
    let s = s.trim();

    if s.is_empty() {
        return (false, None);
    }

    // Must start with http:// or https://
    if !s.starts_with("http://") && !s.starts_with("https://") {
        return (false, None);
    }

    match Url::parse(s) {
        Ok(url) if url.host().is_some() => (true, Some(url)),
        _ => (false, None),
    }
}

/// Resolve an attribute URL the way the browser resolves `img.src`.
///
/// Absolute http(s) URLs are returned as written. Relative URLs are joined
/// onto `base` when one is known. Anything else (data:, blob:, unresolvable)
/// yields `None`.
#[must_use]
pub fn resolve_http_url(raw: &str, base: Option<&Url>) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if is_absolute_url(raw).0 {
        return Some(raw.to_string());
    }

    let base = base?;
    if raw.contains(':') && !raw.starts_with("//") && Url::parse(raw).is_ok() {
        // Some other scheme (data:, blob:, javascript:)
        return None;
    }

    let joined = base.join(raw).ok()?;
    matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
}

/// First candidate URL of a `srcset` attribute.
#[must_use]
pub fn first_srcset_url(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
        .find(|url| !url.is_empty())
}

/// URL of the first `url(...)` in an inline style declaration.
#[must_use]
pub fn background_image_url(style: &str) -> Option<&str> {
    CSS_URL
        .captures(style)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Whether the URL points at UI imagery (avatars, emoji, icons, sprites).
#[must_use]
pub fn is_non_content_image(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    NON_CONTENT_IMAGE_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

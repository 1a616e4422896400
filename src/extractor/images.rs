//! Image extraction and the layout capability it depends on.

use dom_query::{NodeRef, Selection};
use url::Url;

use crate::dom;
use crate::patterns::{
    BACKGROUND_IMAGE_HOLDER, COMMENT_PAGELET, HEADING_REGION, PIXEL_LENGTH,
};
use crate::url_utils;

/// Rendered size of an element, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Host capability that reports current rendered geometry.
///
/// Returning `None` means the size is unknown; such images are kept, since
/// only a measured box can prove an image is an icon.
pub trait Layout {
    fn bounding_box(&self, node: &NodeRef) -> Option<Rect>;
}

/// Layout read from markup alone: `width`/`height` attributes, falling back
/// to pixel lengths in the inline `style`.
///
/// Serves offline snapshots, where no renderer is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeLayout;

impl Layout for AttributeLayout {
    fn bounding_box(&self, node: &NodeRef) -> Option<Rect> {
        let sel = Selection::from(*node);
        let width = dimension(&sel, "width")?;
        let height = dimension(&sel, "height")?;
        Some(Rect::new(width, height))
    }
}

fn dimension(sel: &Selection, name: &str) -> Option<f64> {
    if let Some(value) = dom::get_attribute(sel, name) {
        if let Some(px) = pixels(&value) {
            return Some(px);
        }
    }
    let style = dom::get_attribute(sel, "style")?;
    style.split(';').find_map(|decl| {
        let (property, value) = decl.split_once(':')?;
        if property.trim().eq_ignore_ascii_case(name) {
            pixels(value)
        } else {
            None
        }
    })
}

fn pixels(value: &str) -> Option<f64> {
    PIXEL_LENGTH
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// What the image scan needs to know about the page.
#[derive(Clone, Copy)]
pub struct ImageContext<'a> {
    pub layout: &'a dyn Layout,
    /// Page location, for resolving relative `src` values.
    pub base_url: Option<&'a Url>,
    /// Images where both sides are below this are treated as icons.
    pub min_side: f64,
}

/// Extract content image URLs from a post.
///
/// `<img>` elements come first, then inline `background-image` URLs on divs.
/// Images in headers or comment regions, URLs carrying UI markers (profile,
/// avatar, emoji, icon, reaction, sprite) and `<img>` boxes smaller than
/// `min_side` on both axes are skipped. URLs are de-duplicated in first-seen
/// order.
#[must_use]
pub fn extract_images(sel: &Selection, ctx: &ImageContext) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();

    for n in sel.select("img").nodes() {
        let img = Selection::from(*n);
        if in_excluded_region(&img) {
            continue;
        }

        let Some(src) = image_source(&img, ctx.base_url) else {
            continue;
        };
        if url_utils::is_non_content_image(&src) {
            continue;
        }

        if let Some(rect) = ctx.layout.bounding_box(n) {
            if rect.width < ctx.min_side && rect.height < ctx.min_side {
                continue;
            }
        }

        push_unique(&mut urls, src);
    }

    for n in sel.select(BACKGROUND_IMAGE_HOLDER).nodes() {
        let div = Selection::from(*n);
        if in_excluded_region(&div) {
            continue;
        }
        let Some(style) = dom::get_attribute(&div, "style") else {
            continue;
        };
        let Some(url) = url_utils::background_image_url(&style) else {
            continue;
        };
        if !url_utils::is_absolute_url(url).0 || url_utils::is_non_content_image(url) {
            continue;
        }
        push_unique(&mut urls, url.to_string());
    }

    urls
}

/// Resolved source of an `<img>`: `src`, then the first `srcset` candidate.
fn image_source(img: &Selection, base: Option<&Url>) -> Option<String> {
    if let Some(src) = dom::non_empty_attribute(img, "src") {
        if let Some(url) = url_utils::resolve_http_url(&src, base) {
            return Some(url);
        }
    }
    let srcset = dom::non_empty_attribute(img, "srcset")?;
    url_utils::first_srcset_url(&srcset).and_then(|u| url_utils::resolve_http_url(u, base))
}

fn in_excluded_region(sel: &Selection) -> bool {
    dom::within(sel, HEADING_REGION) || dom::within(sel, COMMENT_PAGELET)
}

fn push_unique(urls: &mut Vec<String>, url: String) {
    if !urls.contains(&url) {
        urls.push(url);
    }
}

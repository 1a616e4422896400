//! Field extraction from a single post element.
//!
//! Each extractor is a pure function from an element to one record field.
//! They never fail: a heuristic miss yields an empty caption, an empty image
//! list, or the unknown-author sentinel.

pub mod author;
pub mod caption;
pub mod expand;
pub mod images;

pub use author::extract_author;
pub use caption::extract_caption;
pub use expand::expand;
pub use images::{extract_images, AttributeLayout, ImageContext, Layout, Rect};

use dom_query::Selection;

use crate::options::Options;

/// Caption, images and author of one post, as read in one go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub author: String,
    pub text: String,
    pub images: Vec<String>,
}

impl Fields {
    /// Nothing worth recording: no caption and no images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.images.is_empty()
    }
}

/// Run the full extractor suite over a post.
#[must_use]
pub fn extract_fields(sel: &Selection, ctx: &ImageContext, options: &Options) -> Fields {
    Fields {
        text: extract_caption(sel, options.min_block_len),
        images: extract_images(sel, ctx),
        author: extract_author(sel, options.max_author_len),
    }
}

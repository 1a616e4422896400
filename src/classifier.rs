//! Candidate Classification
//!
//! Decides whether an element is a genuine top-level feed post rather than a
//! reply, a comment fragment, or sponsored content. The predicate reads live
//! DOM state, so its answer can change between calls as the page re-renders.

use dom_query::{Document, Selection};

use crate::dom;
use crate::patterns::{AD_PAGELET, ARTICLE_ROLE, CANDIDATE, COMMENT_REGION, SPONSORED_TEXT};

/// Whether the element sits in a comment region or inside another article.
#[must_use]
pub fn is_comment(sel: &Selection) -> bool {
    if dom::within(sel, COMMENT_REGION) {
        return true;
    }
    dom::closest_ancestor(sel, ARTICLE_ROLE).is_some()
}

/// Whether the element is flagged as advertising.
#[must_use]
pub fn is_sponsored(sel: &Selection) -> bool {
    if dom::get_attribute(sel, "data-pagelet").is_some_and(|p| AD_PAGELET.is_match(&p)) {
        return true;
    }
    SPONSORED_TEXT.is_match(&dom::inner_text(sel))
}

/// Whether the element is a top-level, organic feed post.
#[must_use]
pub fn is_candidate(sel: &Selection) -> bool {
    if !sel.exists() || !sel.is(CANDIDATE) {
        return false;
    }
    !is_comment(sel) && !is_sponsored(sel)
}

/// All elements in the document currently shaped like posts and approved.
#[must_use]
pub fn find_candidates(doc: &Document) -> Vec<Selection<'_>> {
    doc.select(CANDIDATE)
        .nodes()
        .iter()
        .map(|n| Selection::from(*n))
        .filter(is_candidate)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(html: &str, id: &str) -> bool {
        let doc = dom::parse(html);
        is_candidate(&doc.select(&format!("#{id}")))
    }

    #[test]
    fn test_article_role_is_candidate() {
        assert!(classify(r#"<div role="feed"><div id="p" role="article">Post</div></div>"#, "p"));
    }

    #[test]
    fn test_indexed_feed_item_is_candidate() {
        assert!(classify(
            r#"<div id="p" aria-posinset="3" aria-labelledby="t3">Post</div>"#,
            "p"
        ));
    }

    #[test]
    fn test_indexed_item_needs_both_attributes() {
        assert!(!classify(r#"<div id="p" aria-posinset="3">Post</div>"#, "p"));
    }

    #[test]
    fn test_nested_article_is_reply() {
        let html = r#"
            <div role="article" id="outer">
                <p>Post</p>
                <div role="article" id="inner">Reply</div>
            </div>
        "#;
        assert!(classify(html, "outer"));
        assert!(!classify(html, "inner"));
    }

    #[test]
    fn test_comment_regions_rejected() {
        assert!(!classify(
            r#"<div data-pagelet="comment_list"><div id="p" role="article">c</div></div>"#,
            "p"
        ));
        assert!(!classify(r#"<div id="p" role="article" aria-label="comment by Ann">c</div>"#, "p"));
        assert!(!classify(
            r#"<div data-testid="UFI2comment"><div id="p" role="article">c</div></div>"#,
            "p"
        ));
    }

    #[test]
    fn test_sponsored_rejected() {
        assert!(!classify(r#"<div id="p" role="article" data-pagelet="AdUnit_1">Buy</div>"#, "p"));
        assert!(!classify(r#"<div id="p" role="article"><span>Sponsored</span> Buy now</div>"#, "p"));
        assert!(classify(r#"<div id="p" role="article" data-pagelet="FeedUnit_1">Hi</div>"#, "p"));
    }

    #[test]
    fn test_plain_div_is_not_candidate() {
        assert!(!classify(r#"<div id="p">Post</div>"#, "p"));
    }

    #[test]
    fn test_find_candidates_filters() {
        let doc = dom::parse(
            r#"
            <div role="feed">
                <div role="article" id="a">One</div>
                <div role="article" id="b">Sponsored thing</div>
                <div role="article" id="c">Three<div role="article">reply</div></div>
            </div>
        "#,
        );
        let ids: Vec<_> = find_candidates(&doc)
            .iter()
            .filter_map(|s| dom::get_attribute(s, "id"))
            .collect();
        assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
    }
}

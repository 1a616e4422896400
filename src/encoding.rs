//! Decoding of saved page snapshots.
//!
//! Live pages hand the pipeline an already-decoded DOM; snapshots read from
//! disk or stdin arrive as bytes in whatever charset the page was saved with.
//! The charset is taken from a byte-order mark, then a `<meta>` declaration in
//! the first kilobyte, then defaults to UTF-8.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;

use crate::dom::{self, Document};

/// `<meta charset="...">` or `<meta http-equiv="Content-Type" content="...; charset=...">`.
#[allow(clippy::expect_used)]
static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s;>/]+)"#).expect("META_CHARSET regex")
});

/// How far into the snapshot a charset declaration is looked for.
const SNIFF_LEN: usize = 1024;

/// Encoding of a snapshot and the length of any byte-order mark.
#[must_use]
pub fn sniff_encoding(bytes: &[u8]) -> (&'static Encoding, usize) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return (encoding, bom_len);
    }

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(SNIFF_LEN)]);
    let declared = META_CHARSET
        .captures(&head)
        .and_then(|caps| caps.get(1))
        .and_then(|m| Encoding::for_label(m.as_str().as_bytes()));

    (declared.unwrap_or(UTF_8), 0)
}

/// Decode snapshot bytes to UTF-8, replacing invalid sequences with U+FFFD.
#[must_use]
pub fn decode_snapshot(bytes: &[u8]) -> String {
    let (encoding, bom_len) = sniff_encoding(bytes);
    let body = &bytes[bom_len..];
    let (decoded, _had_errors) = encoding.decode_without_bom_handling(body);
    decoded.into_owned()
}

/// Decode and parse a snapshot into a document.
#[must_use]
pub fn load_snapshot(bytes: &[u8]) -> Document {
    dom::parse(&decode_snapshot(bytes))
}

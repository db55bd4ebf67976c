// src/probe/title.rs
// =============================================================================
// Pulls the page title out of an HTML document.
//
// We use the `scraper` crate (html5ever underneath), so:
// - tag names match regardless of case (<TITLE>, <Title>, ...)
// - the title text may span several lines
// - entities are decoded (&amp; becomes &)
//
// The parser would happily close an unterminated <title> at end of input, so
// we first insist on a literal closing tag being present.
// =============================================================================

use scraper::{Html, Selector};

const CLOSING_TAG: &[u8] = b"</title";

/// Returns the trimmed text of the first `<title>` element, if there is one.
///
/// An empty `<title></title>` gives `Some("")`. A `<title>` that is never
/// closed gives `None`.
pub fn extract_title(html: &str) -> Option<String> {
    if !has_closing_tag(html) {
        return None;
    }

    let document = Html::parse_document(html);

    // Constant selector, known to be valid
    let selector = Selector::parse("title").unwrap();

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

fn has_closing_tag(html: &str) -> bool {
    html.as_bytes()
        .windows(CLOSING_TAG.len())
        .any(|window| window.eq_ignore_ascii_case(CLOSING_TAG))
}

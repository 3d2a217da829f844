//! Small helpers for reading text out of parsed documents.

use scraper::{ElementRef, Html, Selector};

/// Element text with runs of whitespace collapsed to single spaces.
pub(crate) fn element_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first match of `selector` under `scope`, if non-empty.
pub(crate) fn first_text(scope: ElementRef, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Text of the first match of `selector` in the document, if non-empty.
pub(crate) fn document_text(document: &Html, selector: &Selector) -> Option<String> {
    first_text(document.root_element(), selector)
}

pub(crate) fn has_match(document: &Html, selector: &Selector) -> bool {
    document.select(selector).next().is_some()
}

/// Case-insensitive check of the text under `scope` for any of `phrases`.
pub(crate) fn mentions_any(scope: ElementRef, phrases: &[&str]) -> bool {
    let text = element_text(scope).to_lowercase();
    phrases.iter().any(|phrase| text.contains(phrase))
}

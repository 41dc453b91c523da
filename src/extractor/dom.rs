//! Cascading selector lookups over a parsed document

use crate::extractor::text::collapse_whitespace;
use scraper::{ElementRef, Html, Selector};

/// Compiles hint selectors followed by built-in selectors, in that order
///
/// Invalid hints are skipped and reported in `warnings`. Built-in selectors
/// are static and always valid.
pub fn candidates(
    field: &str,
    hints: &[String],
    builtin: &[&str],
    warnings: &mut Vec<String>,
) -> Vec<Selector> {
    let mut selectors = Vec::with_capacity(hints.len() + builtin.len());

    for hint in hints {
        match Selector::parse(hint) {
            Ok(selector) => selectors.push(selector),
            Err(_) => warnings.push(format!(
                "invalid selector hint `{}` for {} skipped",
                hint, field
            )),
        }
    }

    selectors.extend(builtin.iter().filter_map(|css| Selector::parse(css).ok()));
    selectors
}

/// Visible text of an element, or the `content` attribute for `<meta>`
pub fn element_text(element: ElementRef<'_>) -> String {
    if element.value().name() == "meta" {
        return element
            .value()
            .attr("content")
            .map(collapse_whitespace)
            .unwrap_or_default();
    }

    let text = element.text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// Walks the selectors in order and returns the first accepted value
///
/// For each selector every matching element is tried in document order;
/// `accept` turns non-empty text into a value or rejects it.
pub fn first_match<T>(
    document: &Html,
    selectors: &[Selector],
    mut accept: impl FnMut(&str) -> Option<T>,
) -> Option<T> {
    selectors.iter().find_map(|selector| {
        document.select(selector).find_map(|element| {
            let text = element_text(element);
            if text.is_empty() {
                None
            } else {
                accept(&text)
            }
        })
    })
}

/// Like [`first_match`] but hands `accept` the element itself
pub fn first_element<T>(
    document: &Html,
    selectors: &[Selector],
    mut accept: impl FnMut(ElementRef<'_>) -> Option<T>,
) -> Option<T> {
    selectors
        .iter()
        .find_map(|selector| document.select(selector).find_map(&mut accept))
}

/// Whole-document text used for pattern fallbacks
///
/// Script and style contents are excluded.
pub fn body_text(document: &Html) -> String {
    let Ok(body) = Selector::parse("body") else {
        return String::new();
    };
    let Some(root) = document.select(&body).next() else {
        return String::new();
    };

    let mut parts = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_code = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| matches!(el.value().name(), "script" | "style" | "noscript"));
        if !in_code {
            let text: &str = text;
            parts.push(text);
        }
    }

    collapse_whitespace(&parts.join(" "))
}

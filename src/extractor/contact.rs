use crate::extractor::dom::{candidates, element_text, first_element, first_match};
use crate::extractor::text::{clean, find_email, find_phone, normalize_phone};
use crate::model::{ContactInfo, SelectorHints};
use crate::url::resolve_url;
use scraper::{ElementRef, Html, Selector};
use url::Url;

const PHONE_SELECTORS: &[&str] = &[
    "a[href^='tel:']",
    ".phone",
    ".telephone",
    "[itemprop='telephone']",
];

const EMAIL_SELECTORS: &[&str] = &["a[href^='mailto:']", ".email", "[itemprop='email']"];

const ADDRESS_SELECTORS: &[&str] = &[
    "[itemprop='address']",
    "address",
    ".address",
    ".location",
];

const WEBSITE_SELECTORS: &[&str] = &["link[rel='canonical']", "meta[property='og:url']"];

/// Link text or href fragments that mark a tee-time booking link
const BOOKING_MARKERS: &[&str] = &[
    "book",
    "tee-time",
    "tee time",
    "teetime",
    "tee-times",
    "reserve",
    "reservation",
];

/// Extracts phone, e-mail, address, website and booking link
///
/// `body` is the document text used for pattern fallbacks.
pub fn extract_contact(
    document: &Html,
    base: &Url,
    hints: &SelectorHints,
    body: &str,
    warnings: &mut Vec<String>,
) -> ContactInfo {
    let phone_selectors = candidates("phone", &hints.phone, PHONE_SELECTORS, warnings);
    let phone = first_element(document, &phone_selectors, |el| {
        attr_after(el, "href", "tel:")
            .and_then(|raw| normalize_phone(&raw))
            .or_else(|| find_phone(&element_text(el)))
    })
    .or_else(|| find_phone(body));

    let email_selectors = candidates("email", &hints.email, EMAIL_SELECTORS, warnings);
    let email = first_element(document, &email_selectors, |el| {
        attr_after(el, "href", "mailto:")
            .and_then(|raw| {
                let address = raw.split('?').next().unwrap_or_default();
                find_email(address)
            })
            .or_else(|| find_email(&element_text(el)))
    })
    .or_else(|| find_email(body));

    let address_selectors = candidates("address", &hints.address, ADDRESS_SELECTORS, warnings);
    let address = first_match(document, &address_selectors, clean);

    let website = website(document, base);
    let booking_url = booking_url(document, base, &hints.booking_url, warnings);

    ContactInfo {
        phone,
        email,
        address,
        website,
        booking_url,
    }
}

/// Attribute value with a scheme prefix removed, e.g. `tel:` or `mailto:`
fn attr_after(element: ElementRef<'_>, attr: &str, prefix: &str) -> Option<String> {
    let value = element.value().attr(attr)?.trim();
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| value[prefix.len()..].to_string())
}

fn website(document: &Html, base: &Url) -> Option<String> {
    WEBSITE_SELECTORS
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|selector| {
            document.select(&selector).find_map(|el| {
                let raw = el.value().attr("href").or_else(|| el.value().attr("content"))?;
                resolve_url(base, raw).map(|u| u.to_string())
            })
        })
}

fn booking_url(
    document: &Html,
    base: &Url,
    hints: &[String],
    warnings: &mut Vec<String>,
) -> Option<String> {
    let hinted = candidates("booking_url", hints, &[], warnings);
    let from_hints = first_element(document, &hinted, |el| {
        el.value()
            .attr("href")
            .and_then(|href| resolve_url(base, href))
            .map(|u| u.to_string())
    });
    if from_hints.is_some() {
        return from_hints;
    }

    let links = Selector::parse("a[href]").ok()?;
    document.select(&links).find_map(|el| {
        let resolved = resolve_url(base, el.value().attr("href")?)?;
        let text = element_text(el).to_lowercase();
        // Host names are ignored so social links such as facebook.com do not match
        let location = format!(
            "{}?{}",
            resolved.path().to_lowercase(),
            resolved.query().unwrap_or_default().to_lowercase()
        );

        BOOKING_MARKERS
            .iter()
            .any(|marker| location.contains(marker) || text.contains(marker))
            .then(|| resolved.to_string())
    })
}

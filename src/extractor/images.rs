use crate::extractor::dom::candidates;
use crate::model::{CourseImages, SelectorHints};
use crate::url::{dedup_key, resolve_url};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

pub const MAX_HERO_IMAGES: usize = 3;
pub const MAX_GALLERY_IMAGES: usize = 10;
pub const MAX_COURSE_MAP_IMAGES: usize = 2;

const HERO_SELECTORS: &[&str] = &[
    ".hero img",
    "img.hero",
    ".banner img",
    "[class*='hero'] img",
    "img[class*='hero']",
    "meta[property='og:image']",
];

const COURSE_MAP_SELECTORS: &[&str] = &[
    ".course-map img",
    "img.course-map",
    "[class*='course-map'] img",
    "img[class*='map']",
    "img[src*='course-map']",
    "img[alt*='map']",
    "img[alt*='Map']",
];

const GALLERY_SELECTORS: &[&str] = &[
    ".gallery img",
    "[class*='gallery'] img",
    "img[class*='gallery']",
    ".slider img",
    ".carousel img",
    ".slideshow img",
    "figure img",
];

/// Attributes that may carry an image location, lazy-loading ones included
const SRC_ATTRS: &[&str] = &["src", "data-src", "data-lazy-src", "data-original"];

/// Buckets images into hero, course map and gallery
///
/// Buckets are filled in that order. An image already placed in an earlier
/// bucket is not repeated, and each bucket is capped.
pub fn extract_images(
    document: &Html,
    base: &Url,
    hints: &SelectorHints,
    warnings: &mut Vec<String>,
) -> CourseImages {
    let mut seen = HashSet::new();

    let hero_selectors = candidates("hero_images", &hints.hero_images, HERO_SELECTORS, warnings);
    let hero = collect(document, &hero_selectors, base, &mut seen, MAX_HERO_IMAGES);

    let map_selectors = candidates(
        "course_map_images",
        &hints.course_map_images,
        COURSE_MAP_SELECTORS,
        warnings,
    );
    let course_map = collect(document, &map_selectors, base, &mut seen, MAX_COURSE_MAP_IMAGES);

    let gallery_selectors = candidates(
        "gallery_images",
        &hints.gallery_images,
        GALLERY_SELECTORS,
        warnings,
    );
    let gallery = collect(document, &gallery_selectors, base, &mut seen, MAX_GALLERY_IMAGES);

    CourseImages {
        hero,
        gallery,
        course_map,
    }
}

fn collect(
    document: &Html,
    selectors: &[Selector],
    base: &Url,
    seen: &mut HashSet<String>,
    cap: usize,
) -> Vec<String> {
    let mut images = Vec::new();

    for selector in selectors {
        for element in document.select(selector) {
            if images.len() >= cap {
                return images;
            }
            let Some(url) = image_url(element, base) else {
                continue;
            };
            if seen.insert(dedup_key(&url)) {
                images.push(url.to_string());
            }
        }
    }

    images
}

/// Absolute location of an `<img>`, an `og:image` meta tag, or the first
/// image inside a hinted container
fn image_url(element: ElementRef<'_>, base: &Url) -> Option<Url> {
    let value = element.value();

    if value.name() == "meta" {
        return value.attr("content").and_then(|c| resolve_url(base, c));
    }

    if value.name() != "img" {
        let img = Selector::parse("img").ok()?;
        return element
            .select(&img)
            .next()
            .and_then(|inner| image_url(inner, base));
    }

    SRC_ATTRS
        .iter()
        .filter_map(|attr| value.attr(attr))
        .find_map(|src| resolve_url(base, src))
}

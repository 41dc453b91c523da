//! Shared extraction pipeline
//!
//! Both strategies end here: the static one with the raw response body, the
//! dynamic one with the rendered DOM. Extraction is synchronous and
//! deterministic for a given document, URL and timestamp.

use crate::extractor::contact::extract_contact;
use crate::extractor::dom::{body_text, candidates, element_text, first_element, first_match};
use crate::extractor::images::extract_images;
use crate::extractor::text::{
    clean, collapse_whitespace, find_architect, find_holes, find_opening_year, find_par,
    find_price_range, find_yardage, parse_architect, parse_par, parse_price_range, parse_year,
    parse_yardage, truncate_description,
};
use crate::model::{ContactInfo, CourseImages, ExtractedCourseFacts, ScrapeTarget};
use chrono::{DateTime, Utc};
use scraper::Html;
use url::Url;

/// Holes assumed when the page does not say
pub const DEFAULT_HOLES: u8 = 18;

const NAME_SELECTORS: &[&str] = &[
    ".course-name",
    "[itemprop='name']",
    "h1",
    "meta[property='og:title']",
    "title",
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    ".course-description",
    ".description",
    "[itemprop='description']",
    ".about p",
    "main p",
    "article p",
    "meta[name='description']",
    "meta[property='og:description']",
];

const ARCHITECT_SELECTORS: &[&str] = &[
    ".architect",
    ".course-architect",
    ".designer",
    "[itemprop='architect']",
];

const OPENING_YEAR_SELECTORS: &[&str] = &[
    ".year-opened",
    ".opened",
    ".established",
    "[itemprop='foundingDate']",
];

const YARDAGE_SELECTORS: &[&str] = &[".yardage", ".total-yardage", ".course-length"];

const PAR_SELECTORS: &[&str] = &[".par", ".course-par"];

const HOLES_SELECTORS: &[&str] = &[".holes", ".number-of-holes"];

const GREEN_FEES_SELECTORS: &[&str] = &[
    ".green-fees",
    ".greens-fees",
    ".rates",
    ".pricing",
    ".price",
];

/// Separators between a page title and the site name
const TITLE_SEPARATORS: &[&str] = &[" | ", " - ", " – ", " — ", " :: "];

const COURSE_FACT_POINTS: u32 = 10;
const CONTACT_POINTS: u32 = 5;
const HERO_POINTS: u32 = 10;
const GALLERY_POINTS: u32 = 5;
const COURSE_MAP_POINTS: u32 = 5;

/// 7 course facts, 4 contact fields and 20 image points
pub const MAX_SCORE: u32 = 7 * COURSE_FACT_POINTS
    + 4 * CONTACT_POINTS
    + HERO_POINTS
    + GALLERY_POINTS
    + COURSE_MAP_POINTS;

/// Facts extracted from one document plus non-fatal observations
#[derive(Debug, Clone)]
pub struct PageExtraction {
    pub facts: ExtractedCourseFacts,
    pub warnings: Vec<String>,
}

/// Extracts course facts from a document
///
/// # Arguments
///
/// * `html` - Raw or rendered HTML; malformed markup is tolerated
/// * `final_url` - URL the document was served from, used to resolve links
/// * `target` - Supplies selector hints and the fallback name
pub fn extract_page(html: &str, final_url: &Url, target: &ScrapeTarget) -> PageExtraction {
    extract_page_at(html, final_url, target, Utc::now())
}

/// [`extract_page`] with an explicit extraction timestamp
pub fn extract_page_at(
    html: &str,
    final_url: &Url,
    target: &ScrapeTarget,
    extracted_at: DateTime<Utc>,
) -> PageExtraction {
    let document = Html::parse_document(html);
    let body = body_text(&document);
    let hints = &target.selectors;
    let mut warnings = Vec::new();

    if body.is_empty() {
        warnings.push("document has no visible text".to_string());
    }

    let name_selectors = candidates("name", &hints.name, NAME_SELECTORS, &mut warnings);
    let name = first_element(&document, &name_selectors, |el| {
        let text = element_text(el);
        let text = match el.value().name() {
            "title" | "meta" => strip_site_suffix(&text),
            _ => text,
        };
        (!text.is_empty()).then_some(text)
    })
    .unwrap_or_else(|| fallback_name(target));

    let description_selectors = candidates(
        "description",
        &hints.description,
        DESCRIPTION_SELECTORS,
        &mut warnings,
    );
    let description = first_match(&document, &description_selectors, |t| {
        Some(truncate_description(&collapse_whitespace(t)))
    });

    let architect_selectors = candidates(
        "architect",
        &hints.architect,
        ARCHITECT_SELECTORS,
        &mut warnings,
    );
    let architect = first_match(&document, &architect_selectors, parse_architect)
        .or_else(|| find_architect(&body));

    let year_selectors = candidates(
        "opening_year",
        &hints.opening_year,
        OPENING_YEAR_SELECTORS,
        &mut warnings,
    );
    let opening_year =
        first_match(&document, &year_selectors, parse_year).or_else(|| find_opening_year(&body));

    let yardage_selectors = candidates(
        "total_yardage",
        &hints.total_yardage,
        YARDAGE_SELECTORS,
        &mut warnings,
    );
    let total_yardage =
        first_match(&document, &yardage_selectors, parse_yardage).or_else(|| find_yardage(&body));

    let par_selectors = candidates("par_score", &hints.par_score, PAR_SELECTORS, &mut warnings);
    let par_score = first_match(&document, &par_selectors, parse_par).or_else(|| find_par(&body));

    let holes_selectors = candidates(
        "number_of_holes",
        &hints.number_of_holes,
        HOLES_SELECTORS,
        &mut warnings,
    );
    let number_of_holes = first_match(&document, &holes_selectors, |t| {
        find_holes(t).or_else(|| t.trim().parse().ok().filter(|n: &u8| *n > 0))
    })
    .or_else(|| find_holes(&body))
    .unwrap_or(DEFAULT_HOLES);

    let fees_selectors = candidates(
        "green_fees",
        &hints.green_fees,
        GREEN_FEES_SELECTORS,
        &mut warnings,
    );
    let green_fees_price_range = first_match(&document, &fees_selectors, |t| {
        parse_price_range(t).or_else(|| clean(t).filter(|c| c.chars().any(|ch| ch.is_ascii_digit())))
    })
    .or_else(|| find_price_range(&body));

    let contact = extract_contact(&document, final_url, hints, &body, &mut warnings);
    let images = extract_images(&document, final_url, hints, &mut warnings);

    let mut facts = ExtractedCourseFacts {
        name,
        description,
        architect,
        opening_year,
        total_yardage,
        par_score,
        number_of_holes,
        green_fees_price_range,
        contact,
        images,
        confidence: 0,
        extracted_at,
        source: final_url.to_string(),
    };
    facts.confidence = confidence(&facts);

    PageExtraction { facts, warnings }
}

/// Weighted completeness score in 0..=100
///
/// | Field group | Points |
/// |-------------|--------|
/// | name, description, architect, opening year, yardage, par, green fees | 10 each |
/// | phone, email, address, website | 5 each |
/// | hero / gallery / course map images present | 10 / 5 / 5 |
///
/// `name` always scores because it falls back to the target's name.
/// `number_of_holes` does not score because it defaults to 18.
pub fn confidence(facts: &ExtractedCourseFacts) -> u8 {
    let course_facts = [
        !facts.name.is_empty(),
        facts.description.is_some(),
        facts.architect.is_some(),
        facts.opening_year.is_some(),
        facts.total_yardage.is_some(),
        facts.par_score.is_some(),
        facts.green_fees_price_range.is_some(),
    ];

    let score = course_facts.iter().filter(|present| **present).count() as u32
        * COURSE_FACT_POINTS
        + contact_score(&facts.contact)
        + image_score(&facts.images);

    let percent = (score * 100 + MAX_SCORE / 2) / MAX_SCORE;
    percent.min(100) as u8
}

fn contact_score(contact: &ContactInfo) -> u32 {
    [
        contact.phone.is_some(),
        contact.email.is_some(),
        contact.address.is_some(),
        contact.website.is_some(),
    ]
    .iter()
    .filter(|present| **present)
    .count() as u32
        * CONTACT_POINTS
}

fn image_score(images: &CourseImages) -> u32 {
    let mut score = 0;
    if !images.hero.is_empty() {
        score += HERO_POINTS;
    }
    if !images.gallery.is_empty() {
        score += GALLERY_POINTS;
    }
    if !images.course_map.is_empty() {
        score += COURSE_MAP_POINTS;
    }
    score
}

/// "Pine Valley | Official Site" -> "Pine Valley"
fn strip_site_suffix(title: &str) -> String {
    TITLE_SEPARATORS
        .iter()
        .filter_map(|sep| title.split_once(sep).map(|(head, _)| head))
        .min_by_key(|head| head.len())
        .unwrap_or(title)
        .trim()
        .to_string()
}

fn fallback_name(target: &ScrapeTarget) -> String {
    let name = collapse_whitespace(&target.name);
    if name.is_empty() {
        target.url.clone()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SelectorHints;

    fn target() -> ScrapeTarget {
        ScrapeTarget::new("t1", "Fallback Links", "https://example.com/course")
    }

    fn url() -> Url {
        Url::parse("https://example.com/course").unwrap()
    }

    const SCENARIO: &str = r#"<!DOCTYPE html>
<html><head><title>Test Golf Course | Home</title></head>
<body>
  <h1>Test Golf Course</h1>
  <div class="description">
    <p>Designed by Tom Fazio. Opened in 1995, this par-72 layout stretches 7,200 yards
    across rolling hills.</p>
  </div>
</body></html>"#;

    #[test]
    fn test_course_fact_scenario() {
        let extraction = extract_page(SCENARIO, &url(), &target());
        let facts = extraction.facts;

        assert_eq!(facts.name, "Test Golf Course");
        assert_eq!(facts.architect.as_deref(), Some("Tom Fazio"));
        assert_eq!(facts.opening_year, Some(1995));
        assert_eq!(facts.par_score, Some(72));
        assert_eq!(facts.total_yardage, Some(7200));
        assert_eq!(facts.number_of_holes, DEFAULT_HOLES);
        assert!(facts.confidence > 0);
        assert!(facts
            .description
            .as_deref()
            .is_some_and(|d| d.contains("Tom Fazio")));
        assert_eq!(facts.source, "https://example.com/course");
    }

    #[test]
    fn test_malformed_html_uses_fallback_name() {
        let html = "<html><body><div class='x'><p>Welcome to the <b>club";
        let extraction = extract_page(html, &url(), &target());
        assert_eq!(extraction.facts.name, "Fallback Links");
        assert!(extraction.facts.confidence > 0);
    }

    #[test]
    fn test_empty_document() {
        let extraction = extract_page("", &url(), &target());
        assert_eq!(extraction.facts.name, "Fallback Links");
        assert_eq!(extraction.facts.number_of_holes, 18);
        assert!(extraction
            .warnings
            .iter()
            .any(|w| w.contains("no visible text")));
    }

    #[test]
    fn test_idempotent() {
        let at = Utc::now();
        let first = extract_page_at(SCENARIO, &url(), &target(), at);
        let second = extract_page_at(SCENARIO, &url(), &target(), at);
        assert_eq!(first.facts, second.facts);
    }

    #[test]
    fn test_title_suffix_stripped() {
        let html = "<html><head><title>Pine Valley | Official Site</title></head><body></body></html>";
        let extraction = extract_page(html, &url(), &target());
        assert_eq!(extraction.facts.name, "Pine Valley");
    }

    #[test]
    fn test_selector_hints() {
        let target = target().with_selectors(SelectorHints {
            name: vec!["#course-title".to_string()],
            par_score: vec!["td.par-total".to_string()],
            green_fees: vec![".fees-table".to_string()],
            ..SelectorHints::default()
        });
        let html = r#"<body>
            <h1>Welcome</h1>
            <h2 id="course-title">Ocean Course</h2>
            <table><tr><td class="par-total">72</td></tr></table>
            <div class="fees-table">Green fees: $95 - $210</div>
        </body>"#;

        let facts = extract_page(html, &url(), &target).facts;
        assert_eq!(facts.name, "Ocean Course");
        assert_eq!(facts.par_score, Some(72));
        assert_eq!(facts.green_fees_price_range.as_deref(), Some("$95 - $210"));
    }

    #[test]
    fn test_description_truncated() {
        let long = "Rolling fairways and firm greens. ".repeat(40);
        let html = format!(r#"<body><div class="description">{}</div></body>"#, long);
        let facts = extract_page(&html, &url(), &target()).facts;
        let description = facts.description.unwrap();
        assert!(description.chars().count() <= 500);
        assert!(description.ends_with("..."));
    }

    #[test]
    fn test_confidence_full_marks() {
        let mut facts = extract_page(SCENARIO, &url(), &target()).facts;
        facts.green_fees_price_range = Some("$50".into());
        facts.contact = ContactInfo {
            phone: Some("5555550100".into()),
            email: Some("a@b.co".into()),
            address: Some("1 Main St".into()),
            website: Some("https://example.com/".into()),
            booking_url: None,
        };
        facts.images = CourseImages {
            hero: vec!["h".into()],
            gallery: vec!["g".into()],
            course_map: vec!["m".into()],
        };
        assert_eq!(confidence(&facts), 100);
    }

    #[test]
    fn test_confidence_name_only() {
        let facts = extract_page("<p>hello</p>", &url(), &target()).facts;
        // 10 of 110 points
        assert_eq!(facts.confidence, 9);
    }
}

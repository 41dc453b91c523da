//! Text normalisation and pattern matching for course facts
//!
//! Every function here is pure so that extracting the same document twice
//! yields the same facts.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum description length, ellipsis included
pub const MAX_DESCRIPTION_CHARS: usize = 500;

const ELLIPSIS: &str = "...";

/// Labels stripped from the start of matched text, longest first
const BOILERPLATE_PREFIXES: &[&str] = &[
    "golf course architect",
    "course architect",
    "year opened",
    "green fees",
    "greens fees",
    "designed by",
    "architect",
    "green fee",
    "established",
    "telephone",
    "yardage",
    "address",
    "opened",
    "phone",
    "email",
    "rates",
    "par",
    "tel",
];

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").expect("valid year regex"));

static OPENING_CONTEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:opened|established|founded|built|since|est\.)\D{0,20}?\b((?:19|20)\d{2})\b")
        .expect("valid opening year regex")
});

static YARDAGE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2},\d{3}|\d{4,5})\b").expect("valid yardage regex"));

static YARDAGE_CONTEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2},\d{3}|\d{4,5})\s*(?:-\s*)?(?:yards|yard|yds|yd)\b")
        .expect("valid yardage context regex")
});

static PAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpar\b[\s:-]*(\d{2})\b").expect("valid par regex"));

static BARE_TWO_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{2})\b").expect("valid two digit regex"));

static HOLES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})[\s-]*holes?\b").expect("valid holes regex"));

static ARCHITECT_CONTEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i:designed\s+by|course\s+architect|architect)\s*:?\s+((?:(?:[A-Z]\.)+|[A-Z][A-Za-z'-]+)(?:\s(?:(?:[A-Z]\.)+|[A-Z][A-Za-z'-]+)){0,3})",
    )
    .expect("valid architect regex")
});

static NAME_WORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^((?:(?:[A-Z]\.)+|[A-Z][A-Za-z'-]+)(?:(?:\s(?:&|and))?\s(?:(?:[A-Z]\.)+|[A-Z][A-Za-z'-]+)){0,5})",
    )
    .expect("valid name words regex")
});

static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s?\d{1,4}(?:\.\d{2})?(?:\s*(?:-|–|to)\s*\$?\s?\d{1,4}(?:\.\d{2})?)?")
        .expect("valid price regex")
});

static FEES_CONTEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:greens?\s+fees?|rates?)\b[^$]{0,40}(\$\s?\d{1,4}(?:\.\d{2})?(?:\s*(?:-|–|to)\s*\$?\s?\d{1,4}(?:\.\d{2})?)?)")
        .expect("valid fees context regex")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?1[\s.-]?)?\(?\b\d{3}\)?[\s.-]?\d{3}[\s.-]\d{4}\b").expect("valid phone regex")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex")
});

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Removes leading labels such as "Designed by" or "Green fees:"
///
/// Prefixes are matched case-insensitively on word boundaries and may be
/// stacked ("Course architect: designed by ...").
pub fn strip_boilerplate(text: &str) -> String {
    let mut rest = text.trim();

    'outer: loop {
        for prefix in BOILERPLATE_PREFIXES {
            let matches = rest
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
            if !matches {
                continue;
            }
            let tail = &rest[prefix.len()..];
            // Only strip whole words: "Parkland" must survive the "par" prefix
            if tail
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric())
            {
                continue;
            }
            rest = tail.trim_start_matches(|c: char| c == ':' || c == '-' || c.is_whitespace());
            continue 'outer;
        }
        break;
    }

    rest.trim().to_string()
}

/// Collapses whitespace and strips boilerplate; `None` if nothing is left
pub fn clean(text: &str) -> Option<String> {
    let cleaned = strip_boilerplate(&collapse_whitespace(text));
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Truncates to [`MAX_DESCRIPTION_CHARS`] characters with a trailing ellipsis
pub fn truncate_description(text: &str) -> String {
    if text.chars().count() <= MAX_DESCRIPTION_CHARS {
        return text.to_string();
    }

    let keep = MAX_DESCRIPTION_CHARS - ELLIPSIS.len();
    let truncated: String = text.chars().take(keep).collect();
    format!("{}{}", truncated.trim_end(), ELLIPSIS)
}

/// First year in [1900, 2099] found in the text
pub fn parse_year(text: &str) -> Option<u16> {
    YEAR_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Year following "opened", "established", "founded" and similar words
pub fn find_opening_year(text: &str) -> Option<u16> {
    OPENING_CONTEXT_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// A 4-5 digit yardage (commas allowed) anywhere in the text
pub fn parse_yardage(text: &str) -> Option<u32> {
    YARDAGE_NUMBER_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_grouped_number(m.as_str()))
}

/// A yardage immediately followed by "yards" or "yds"
pub fn find_yardage(text: &str) -> Option<u32> {
    YARDAGE_CONTEXT_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_grouped_number(m.as_str()))
}

fn parse_grouped_number(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok().filter(|n| (1_000..=99_999).contains(n))
}

/// "par 72", "Par: 71" or "par-70"
pub fn find_par(text: &str) -> Option<u8> {
    PAR_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Par from text already known to describe par, e.g. a `.par` element reading "72"
pub fn parse_par(text: &str) -> Option<u8> {
    find_par(text).or_else(|| {
        BARE_TWO_DIGITS_RE
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    })
}

/// "18 holes", "9-hole"
pub fn find_holes(text: &str) -> Option<u8> {
    HOLES_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n| *n > 0)
}

/// Architect name following "designed by" or "architect"
pub fn find_architect(text: &str) -> Option<String> {
    ARCHITECT_CONTEXT_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Architect from text already known to name the architect
///
/// Keeps the leading run of capitalised words so trailing prose
/// ("Tom Fazio in 1995") is dropped.
pub fn parse_architect(text: &str) -> Option<String> {
    let cleaned = clean(text)?;
    NAME_WORDS_RE
        .captures(&cleaned)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .or(Some(cleaned))
}

/// Dollar amount or range, e.g. "$45 - $85"
pub fn parse_price_range(text: &str) -> Option<String> {
    PRICE_RE
        .find(text)
        .map(|m| collapse_whitespace(m.as_str()))
}

/// Dollar amount or range following "green fees" or "rates"
pub fn find_price_range(text: &str) -> Option<String> {
    FEES_CONTEXT_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| collapse_whitespace(m.as_str()))
}

/// Normalises a phone number to its digits, keeping a leading `+`
///
/// Returns `None` unless 7-15 digits remain.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if !(7..=15).contains(&digits.len()) {
        return None;
    }

    if raw.starts_with('+') {
        Some(format!("+{}", digits))
    } else {
        Some(digits)
    }
}

/// First phone-number-shaped run in the text
pub fn find_phone(text: &str) -> Option<String> {
    PHONE_RE.find(text).and_then(|m| normalize_phone(m.as_str()))
}

/// First e-mail address in the text, lowercased
pub fn find_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_lowercase())
}

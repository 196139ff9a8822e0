//! Result page parser for marketplace search pages
//!
//! Works on the markup of the marketplace's search result listing. Each result
//! item is a tag carrying `data-component-type="s-search-result"` and a
//! `data-asin` attribute; the fields of interest live in the markup that follows
//! it up to the next result item.

use crate::modules::catalog::domain::{BookRecord, CollectorError};
use regex::Regex;
use std::sync::LazyLock;

const RESULT_MARKER: &str = r#"data-component-type="s-search-result""#;
const NO_RESULTS_MARKERS: [&str; 2] = ["s-no-results", "No results for"];
const CAPTCHA_MARKERS: [&str; 3] = [
    "/errors/validateCaptcha",
    "Enter the characters you see below",
    "api-services-support@",
];

static ASIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-asin="([A-Z0-9]{10})""#).expect("valid regex"));
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<h2[^>]*>.*?<span[^>]*>(.*?)</span>"#).expect("valid regex")
});
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="([^"]*/dp/[A-Z0-9]{10}[^"]*)""#).expect("valid regex")
});
static AUTHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)>\s*by\s*</span>\s*<(?:a|span)[^>]*>\s*([^<]+?)\s*</"#)
        .expect("valid regex")
});
static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span class="a-offscreen">\s*([^<]+?)\s*</span>"#).expect("valid regex")
});
static RATING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([0-5](?:\.[0-9])?) out of 5 stars"#).expect("valid regex")
});
static REVIEWS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"aria-label="([0-9][0-9,]*) (?:ratings?|reviews?)""#).expect("valid regex")
});
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<img[^>]*class="s-image"[^>]*src="([^"]+)""#).expect("valid regex")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<[^>]+>"#).expect("valid regex"));
static NEXT_PAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(a|span)[^>]*class="[^"]*s-pagination-next[^"]*"[^>]*>"#).expect("valid regex")
});

/// One parsed result page
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPage {
    pub records: Vec<BookRecord>,
    pub has_next_page: bool,
}

/// Parses search result markup into book records
pub struct ResultPageParser {
    base_url: String,
}

impl ResultPageParser {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn parse(&self, html: &str, category: Option<&str>) -> Result<ParsedPage, CollectorError> {
        if CAPTCHA_MARKERS.iter().any(|marker| html.contains(marker)) {
            return Err(CollectorError::rate_limited(
                "marketplace served an anti-automation challenge page",
            ));
        }

        let item_starts: Vec<usize> = html.match_indices(RESULT_MARKER).map(|(i, _)| i).collect();

        if item_starts.is_empty() {
            if NO_RESULTS_MARKERS.iter().any(|marker| html.contains(marker)) {
                return Ok(ParsedPage {
                    records: Vec::new(),
                    has_next_page: false,
                });
            }
            return Err(CollectorError::Parse(
                "unrecognized result page structure: no result items or no-results notice"
                    .to_string(),
            ));
        }

        let mut records = Vec::with_capacity(item_starts.len());
        for (index, &marker_pos) in item_starts.iter().enumerate() {
            let tag_start = html[..marker_pos].rfind('<').unwrap_or(marker_pos);
            let tag_end = html[marker_pos..]
                .find('>')
                .map(|offset| marker_pos + offset + 1)
                .unwrap_or(html.len());
            let block_end = item_starts
                .get(index + 1)
                .and_then(|&next| html[..next].rfind('<'))
                .unwrap_or(html.len());

            let opening_tag = &html[tag_start..tag_end];
            let block = &html[tag_end..block_end.max(tag_end)];

            if let Some(record) = self.parse_item(opening_tag, block, category) {
                records.push(record);
            }
        }

        if records.is_empty() {
            return Err(CollectorError::Parse(format!(
                "found {} result items but none could be parsed",
                item_starts.len()
            )));
        }

        Ok(ParsedPage {
            records,
            has_next_page: Self::has_next_page(html),
        })
    }

    fn parse_item(&self, opening_tag: &str, block: &str, category: Option<&str>) -> Option<BookRecord> {
        let asin = capture(&ASIN_RE, opening_tag)?;
        let title = capture(&TITLE_RE, block)
            .map(|raw| clean_text(&raw))
            .filter(|title| !title.is_empty())?;

        let mut record = BookRecord::new(asin, title);
        record.category = category.map(str::to_string);
        record.authors = capture(&AUTHOR_RE, block)
            .map(|author| vec![clean_text(&author)])
            .unwrap_or_default();

        if let Some((amount, currency)) = capture(&PRICE_RE, block).and_then(|p| parse_price(&p)) {
            record.price = Some(amount);
            record.currency = currency;
        }

        record.rating = capture(&RATING_RE, block).and_then(|r| r.parse().ok());
        record.review_count = capture(&REVIEWS_RE, block).and_then(|r| r.replace(',', "").parse().ok());
        record.url = capture(&LINK_RE, block).map(|href| self.absolute_url(&decode_entities(&href)));
        record.image_url = capture(&IMAGE_RE, block);

        Some(record)
    }

    fn has_next_page(html: &str) -> bool {
        NEXT_PAGE_RE.captures(html).is_some_and(|caps| {
            let tag = caps.get(0).map_or("", |m| m.as_str());
            caps.get(1).is_some_and(|name| name.as_str() == "a")
                && !tag.contains("s-pagination-disabled")
        })
    }

    fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            format!("{}/{}", self.base_url, href)
        }
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn clean_text(raw: &str) -> String {
    let stripped = TAG_RE.replace_all(raw, "");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// "$1,299.99" -> (1299.99, Some("USD")), "12,99 €" -> (12.99, Some("EUR"))
fn parse_price(raw: &str) -> Option<(f64, Option<String>)> {
    let currency = raw.trim().chars().find_map(currency_code);

    let number: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let amount = normalize_amount(&number)?.parse::<f64>().ok()?;

    Some((amount, currency.map(str::to_string)))
}

fn currency_code(symbol: char) -> Option<&'static str> {
    match symbol {
        '$' => Some("USD"),
        '£' => Some("GBP"),
        '€' => Some("EUR"),
        '¥' => Some("JPY"),
        _ => None,
    }
}

/// Rewrite digits with `.` or `,` separators as a plain decimal number.
///
/// The last separator is the decimal point when both kinds appear or when it is
/// followed by one or two digits. A lone separator followed by three digits, or a
/// repeated one, is grouping. Returns None when nothing is left to parse.
fn normalize_amount(number: &str) -> Option<String> {
    let is_separator = |c: char| c == '.' || c == ',';
    let decimal_at = number.rfind(is_separator).and_then(|pos| {
        let separator = &number[pos..pos + 1];
        let fraction_len = number.len() - pos - 1;
        let mixed = number.chars().any(|c| is_separator(c) && !separator.starts_with(c));

        if mixed || (number.matches(separator).count() == 1 && (1..=2).contains(&fraction_len)) {
            Some(pos)
        } else {
            None
        }
    });

    let digits = |part: &str| part.chars().filter(char::is_ascii_digit).collect::<String>();
    let normalized = match decimal_at {
        Some(pos) => format!("{}.{}", digits(&number[..pos]), digits(&number[pos + 1..])),
        None => digits(number),
    };

    if normalized.is_empty() || normalized == "." {
        None
    } else {
        Some(normalized)
    }
}

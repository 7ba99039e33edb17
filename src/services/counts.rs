//! Total-count extraction from the first page of each list.
//!
//! When the count markup cannot be found the caller's page-1 record count is
//! used instead. That keeps the pipeline moving but under-counts any list
//! longer than one page, so a markup change on the source site silently
//! truncates scrapes to their first page.

use regex::Regex;
use std::sync::OnceLock;

/// Every spelling of a non-breaking space the source has been seen to emit
const NBSP_VARIANTS: [&str; 4] = ["&nbsp;", "&#160;", "&#xa0;", "\u{a0}"];

/// Upper bound on a list's total; anything larger is treated as misparsed markup
pub const MAX_LIST_COUNT: u32 = 100_000;

fn watched_count_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"class="tooltip"[^>]*title="(.+?)films""#).expect("valid watched count regex")
    })
}

fn watchlist_count_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"class="[^"]*js-watchlist-count[^"]*">([^<]+)<"#)
            .expect("valid watchlist count regex")
    })
}

/// Total watched films, e.g. from `<span class="tooltip" title="1,543 films">`
pub fn extract_watched_count(html: &str, page_one_records: usize) -> u32 {
    let found = watched_count_pattern()
        .captures(html)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_count(m.as_str()));

    match found {
        Some(count) => clamp_count("watched", count),
        None => fallback("watched", page_one_records),
    }
}

/// Total wish-list films, e.g. from `<span class="js-watchlist-count">123</span>`
pub fn extract_watchlist_count(html: &str, page_one_records: usize) -> u32 {
    let found = watchlist_count_pattern()
        .captures(html)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_count(m.as_str()));

    match found {
        Some(count) => clamp_count("watchlist", count),
        None => fallback("watchlist", page_one_records),
    }
}

fn clamp_count(list: &str, count: u32) -> u32 {
    if count > MAX_LIST_COUNT {
        tracing::warn!(
            list = list,
            count = count,
            max = MAX_LIST_COUNT,
            "Implausible list count, clamping"
        );
        return MAX_LIST_COUNT;
    }
    count
}

fn fallback(list: &str, page_one_records: usize) -> u32 {
    tracing::warn!(
        list = list,
        page_one_records = page_one_records,
        "Count markup not found, falling back to page 1 record count"
    );
    u32::try_from(page_one_records).unwrap_or(u32::MAX)
}

/// Parses the leading integer of a count label after dropping thousands
/// separators and non-breaking spaces
pub fn parse_count(raw: &str) -> Option<u32> {
    let mut cleaned = raw.replace(',', "");
    for nbsp in NBSP_VARIANTS {
        cleaned = cleaned.replace(nbsp, "");
    }

    let digits: String = cleaned
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse().ok()
}

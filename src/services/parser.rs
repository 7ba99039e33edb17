//! Film grid extraction.
//!
//! Pages carry up to 72 grid items. Rather than building a DOM, the body is
//! split on the marker that opens each item and every fragment is matched
//! with a few anchored patterns.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{FilmRecord, ListKind, Rating};

/// Literal that opens every grid item on list pages
const GRID_ITEM_MARKER: &str = "<li class=\"griditem";

fn film_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"data-film-id="(\d+)""#).expect("valid film id regex"))
}

fn slug_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"data-item-slug="([^"]+)""#).expect("valid slug regex"))
}

fn rating_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"rated-(\d+)").expect("valid rating regex"))
}

/// Extracts every well-formed film record from one page body
///
/// Fragments missing either the film id or the slug are ads or broken markup
/// and are skipped.
pub fn parse_films(html: &str, username: &str, kind: ListKind) -> Vec<FilmRecord> {
    let owner = kind.owner_tag(username);

    html.split(GRID_ITEM_MARKER)
        .skip(1)
        .filter_map(|fragment| parse_fragment(fragment, &owner, kind))
        .collect()
}

fn parse_fragment(fragment: &str, owner: &str, kind: ListKind) -> Option<FilmRecord> {
    let movie_id = film_id_pattern()
        .captures(fragment)?
        .get(1)?
        .as_str()
        .parse::<u64>()
        .ok()?;
    let slug = slug_pattern().captures(fragment)?.get(1)?.as_str();

    let rating = rating_pattern()
        .captures(fragment)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(Rating::from_half_stars)
        .unwrap_or(Rating::Unrated);

    Some(FilmRecord {
        owner: owner.to_string(),
        movie_id,
        slug: slug.to_string(),
        rating,
        list: kind,
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::{grid_item, list_page};
    use super::*;

    #[test]
    fn test_parses_well_formed_items() {
        let html = list_page(&[
            grid_item(51568, "the-matrix", Some(9)),
            grid_item(2321, "heat-1995", Some(7)),
            grid_item(777, "akira", None),
        ]);

        let films = parse_films(&html, "alice", ListKind::Watched);

        assert_eq!(films.len(), 3);
        assert_eq!(films[0].movie_id, 51568);
        assert_eq!(films[0].slug, "the-matrix");
        assert_eq!(films[0].rating, Rating::Rated(4.5));
        assert_eq!(films[1].rating, Rating::Rated(3.5));
        assert_eq!(films[2].rating, Rating::Unrated);
        assert!(films.iter().all(|f| f.owner == "alice"));
    }

    #[test]
    fn test_skips_fragments_missing_id_or_slug() {
        let html = list_page(&[
            grid_item(1, "kept-one", None),
            r#"<li class="griditem"><div data-item-slug="no-id"></div></li>"#.to_string(),
            r#"<li class="griditem"><div data-film-id="42"></div></li>"#.to_string(),
            r#"<li class="griditem"><div class="ad-slot"></div></li>"#.to_string(),
            grid_item(2, "kept-two", Some(10)),
        ]);

        let films = parse_films(&html, "alice", ListKind::Watched);

        let slugs: Vec<&str> = films.iter().map(|f| f.slug.as_str()).collect();
        assert_eq!(slugs, vec!["kept-one", "kept-two"]);
    }

    #[test]
    fn test_watchlist_records_are_tagged() {
        let html = list_page(&[grid_item(10, "past-lives", None)]);

        let films = parse_films(&html, "bob", ListKind::Watchlist);

        assert_eq!(films.len(), 1);
        assert_eq!(films[0].owner, "watchlist_bob");
        assert!(films[0].is_watchlist());
        assert_eq!(films[0].rating, Rating::Unrated);
    }

    #[test]
    fn test_header_before_first_item_is_ignored() {
        // A film id in the page header must not produce a record
        let html = format!(
            r#"<header data-film-id="99" data-item-slug="header-film"></header>{}"#,
            grid_item(1, "real", None)
        );

        let films = parse_films(&html, "alice", ListKind::Watched);

        assert_eq!(films.len(), 1);
        assert_eq!(films[0].slug, "real");
    }

    #[test]
    fn test_page_without_items() {
        assert!(parse_films("<html><body>Private</body></html>", "a", ListKind::Watched).is_empty());
        assert!(parse_films("", "a", ListKind::Watchlist).is_empty());
    }
}

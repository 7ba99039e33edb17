use std::collections::HashSet;

use crate::{
    error::{AppError, AppResult},
    models::{FilmRecord, LikedFilm, ListKind},
};

/// Default share of rated films that fall below the "liked" threshold
pub const DEFAULT_LIKE_PERCENTILE: f64 = 0.95;

/// Inputs for the recommendation engine derived from a scraped profile
#[derive(Debug, Clone, PartialEq)]
pub struct TasteSelection {
    pub liked: Vec<LikedFilm>,
    pub exclude: Vec<String>,
    /// Lowest rating counted as liked
    pub threshold: f32,
}

/// Picks the user's top-rated films and the slugs that must not be recommended
///
/// Liked films are the rated ones at or above the `percentile` quantile of all
/// ratings. Everything already watched is excluded, and the wish-list too when
/// `exclude_watchlist` is set.
pub fn select_taste(
    films: &[FilmRecord],
    percentile: f64,
    exclude_watchlist: bool,
) -> AppResult<TasteSelection> {
    let rated: Vec<(&FilmRecord, f32)> = films
        .iter()
        .filter_map(|film| film.rating.value().map(|value| (film, value)))
        .collect();

    if rated.is_empty() {
        return Err(AppError::NoData("Profile has no rated films".to_string()));
    }

    let ratings: Vec<f32> = rated.iter().map(|(_, value)| *value).collect();
    let threshold = quantile(&ratings, percentile);

    let liked = rated
        .iter()
        .filter(|(_, value)| *value >= threshold)
        .map(|(film, value)| LikedFilm {
            slug: film.slug.clone(),
            rating: *value,
        })
        .collect();

    // A film can sit on both lists or repeat across overlapping pages
    let mut seen = HashSet::new();
    let exclude = films
        .iter()
        .filter(|film| film.list == ListKind::Watched || exclude_watchlist)
        .filter(|film| seen.insert(film.slug.as_str()))
        .map(|film| film.slug.clone())
        .collect();

    Ok(TasteSelection {
        liked,
        exclude,
        threshold,
    })
}

/// Linear-interpolated quantile; `percentile` is clamped to [0, 1]
pub fn quantile(values: &[f32], percentile: f64) -> f32 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = (sorted.len() - 1) as f64 * percentile.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = (position - lower as f64) as f32;

    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Readable title for a slug: `the-matrix-1999` becomes `The Matrix (1999)`
pub fn format_title(slug: &str) -> String {
    let parts: Vec<&str> = slug.split('-').filter(|p| !p.is_empty()).collect();
    let last = parts.len().saturating_sub(1);

    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if i == last && part.len() == 4 && part.chars().all(|c| c.is_ascii_digit()) {
                format!("({})", part)
            } else {
                capitalize(part)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;

    fn film(slug: &str, rating: Rating, list: ListKind) -> FilmRecord {
        FilmRecord {
            owner: list.owner_tag("alice"),
            movie_id: 1,
            slug: slug.to_string(),
            rating,
            list,
        }
    }

    #[test]
    fn test_quantile_interpolates() {
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.5), 3.0);
        assert!((quantile(&[1.0, 2.0], 0.95) - 1.95).abs() < 1e-6);
        assert_eq!(quantile(&[4.0], 0.95), 4.0);
        assert_eq!(quantile(&[], 0.95), 0.0);
        assert_eq!(quantile(&[3.0, 1.0, 2.0], 1.0), 3.0);
    }

    #[test]
    fn test_select_taste_picks_top_ratings() {
        let mut films: Vec<FilmRecord> = (0..19)
            .map(|i| film(&format!("ok-{}", i), Rating::Rated(3.0), ListKind::Watched))
            .collect();
        films.push(film("favorite", Rating::Rated(5.0), ListKind::Watched));
        films.push(film("seen-unrated", Rating::Unrated, ListKind::Watched));
        films.push(film("wished", Rating::Unrated, ListKind::Watchlist));

        let selection = select_taste(&films, DEFAULT_LIKE_PERCENTILE, false).unwrap();

        assert_eq!(selection.liked.len(), 1);
        assert_eq!(selection.liked[0].slug, "favorite");
        assert!(selection.threshold > 3.0);
        assert!(selection.exclude.contains(&"seen-unrated".to_string()));
        assert!(!selection.exclude.contains(&"wished".to_string()));
        assert_eq!(selection.exclude.len(), 21);
    }

    #[test]
    fn test_select_taste_can_exclude_watchlist() {
        let films = vec![
            film("seen", Rating::Rated(4.0), ListKind::Watched),
            film("wished", Rating::Unrated, ListKind::Watchlist),
        ];

        let selection = select_taste(&films, 0.0, true).unwrap();

        assert_eq!(selection.exclude, vec!["seen".to_string(), "wished".to_string()]);
        assert_eq!(selection.liked.len(), 1);
    }

    #[test]
    fn test_select_taste_excludes_each_slug_once() {
        let films = vec![
            film("seen", Rating::Rated(4.0), ListKind::Watched),
            film("seen", Rating::Rated(4.0), ListKind::Watched),
            film("both", Rating::Rated(3.0), ListKind::Watched),
            film("both", Rating::Unrated, ListKind::Watchlist),
        ];

        let selection = select_taste(&films, 0.0, true).unwrap();

        assert_eq!(selection.exclude, vec!["seen".to_string(), "both".to_string()]);
    }

    #[test]
    fn test_select_taste_without_ratings() {
        let films = vec![film("seen", Rating::Unrated, ListKind::Watched)];
        assert!(matches!(
            select_taste(&films, 0.95, false),
            Err(AppError::NoData(_))
        ));
    }

    #[test]
    fn test_format_title() {
        assert_eq!(format_title("the-matrix-1999"), "The Matrix (1999)");
        assert_eq!(format_title("heat"), "Heat");
        assert_eq!(format_title("1917"), "(1917)");
        assert_eq!(format_title("blade-runner-2049"), "Blade Runner (2049)");
        assert_eq!(format_title("apollo-13"), "Apollo 13");
        assert_eq!(format_title(""), "");
    }
}

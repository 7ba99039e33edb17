use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Prefix that marks a wish-list record's owner tag
pub const WATCHLIST_OWNER_PREFIX: &str = "watchlist_";

/// Which of a user's two film lists a page or record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Watched,
    Watchlist,
}

impl ListKind {
    /// Number of grid items the source site renders per page
    pub fn page_size(self) -> u32 {
        match self {
            ListKind::Watched => 72,
            ListKind::Watchlist => 28,
        }
    }

    /// Path segment following the username in page URLs
    pub fn path_segment(self) -> &'static str {
        match self {
            ListKind::Watched => "films",
            ListKind::Watchlist => "watchlist",
        }
    }

    /// Owner tag stamped on records parsed from this list
    pub fn owner_tag(self, username: &str) -> String {
        match self {
            ListKind::Watched => username.to_string(),
            ListKind::Watchlist => format!("{}{}", WATCHLIST_OWNER_PREFIX, username),
        }
    }
}

impl Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListKind::Watched => write!(f, "watched"),
            ListKind::Watchlist => write!(f, "watchlist"),
        }
    }
}

/// A user's star rating on a film, in half-star steps from 0.5 to 5.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rating {
    Rated(f32),
    Unrated,
}

impl Rating {
    /// Decodes the site's `rated-N` class value, where N counts half stars
    pub fn from_half_stars(half_stars: u32) -> Self {
        match half_stars {
            1..=10 => Rating::Rated(half_stars as f32 / 2.0),
            _ => Rating::Unrated,
        }
    }

    pub fn value(self) -> Option<f32> {
        match self {
            Rating::Rated(value) => Some(value),
            Rating::Unrated => None,
        }
    }
}

/// One film entry parsed from a profile page
#[derive(Debug, Clone, PartialEq)]
pub struct FilmRecord {
    /// Username for watched entries, `watchlist_<username>` for wish-list entries
    pub owner: String,
    pub movie_id: u64,
    /// Catalog join key
    pub slug: String,
    pub rating: Rating,
    pub list: ListKind,
}

impl FilmRecord {
    pub fn is_watchlist(&self) -> bool {
        self.list == ListKind::Watchlist
    }
}

/// Aggregated output of scraping one user's profile
#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub username: String,
    pub watched_count: u32,
    pub watchlist_count: u32,
    pub films: Vec<FilmRecord>,
}

/// A page still to be fetched after the first page of a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationTask {
    pub url: String,
    pub kind: ListKind,
}

// ============================================================================
// Recommendation Types
// ============================================================================

/// A film the user liked, with the rating that expresses how much
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikedFilm {
    pub slug: String,
    pub rating: f32,
}

/// Tuning knobs of the recommendation engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationParams {
    /// Rarity exponent; larger values favor niche (low-norm) titles in the profile
    pub alpha: f32,
    /// Popularity exponent applied at scoring time; negative values penalize mainstream titles
    pub pop_factor: f32,
    /// Exponent on rating intensity; above 1 suppresses middling opinions
    pub rating_power: f32,
    /// Treat ratings under 2.5 as negative signals
    pub use_negatives: bool,
}

impl Default for RecommendationParams {
    fn default() -> Self {
        Self {
            alpha: 3.0,
            pop_factor: 0.4,
            rating_power: 2.0,
            use_negatives: true,
        }
    }
}

/// One ranked recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationEntry {
    pub slug: String,
    /// Score relative to the best retained entry, 0 to 100
    pub relative_score: u8,
}

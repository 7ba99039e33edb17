use std::sync::Arc;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    models::{FilmRecord, ListKind, ScrapeResult},
    services::{
        counts::{extract_watched_count, extract_watchlist_count},
        fetcher::PageFetcher,
        pagination::{first_page_url, plan_remaining_pages},
        parser::parse_films,
        scheduler::run_in_batches,
    },
};

/// First page of one list: its records and the list's total count
struct FirstPage {
    films: Vec<FilmRecord>,
    count: u32,
}

/// Collects a user's watched list and wish-list from the source site
#[derive(Clone)]
pub struct Scraper {
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
    batch_size: usize,
}

impl Scraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, base_url: impl Into<String>, batch_size: usize) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            batch_size: batch_size.max(1),
        }
    }

    /// Scrapes every page of both lists
    ///
    /// Page 1 of each list is fetched first because its count decides how many
    /// more pages exist. Missing pages only make the result less complete; the
    /// call fails with `NoData` only when neither list could be reached and no
    /// record was collected.
    pub async fn scrape(&self, username: &str) -> AppResult<ScrapeResult> {
        let username = validate_username(username)?;
        let start = Instant::now();

        let mut films = Vec::new();
        let mut tasks = Vec::new();
        let mut reachable = false;

        let watched_count = match self.first_page(username, ListKind::Watched).await {
            Some(page) => {
                reachable = true;
                films.extend(page.films);
                page.count
            }
            None => 0,
        };
        tasks.extend(plan_remaining_pages(
            &self.base_url,
            username,
            ListKind::Watched,
            watched_count,
        ));

        let watchlist_count = match self.first_page(username, ListKind::Watchlist).await {
            Some(page) => {
                reachable = true;
                films.extend(page.films);
                page.count
            }
            None => 0,
        };
        tasks.extend(plan_remaining_pages(
            &self.base_url,
            username,
            ListKind::Watchlist,
            watchlist_count,
        ));

        let task_count = tasks.len();
        films.extend(run_in_batches(self.fetcher.clone(), tasks, username, self.batch_size).await);

        if !reachable && films.is_empty() {
            tracing::warn!(username = %username, "Neither list could be fetched");
            return Err(AppError::NoData(format!(
                "No films could be retrieved for user {}",
                username
            )));
        }

        tracing::info!(
            username = %username,
            watched_count = watched_count,
            watchlist_count = watchlist_count,
            extra_pages = task_count,
            films = films.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Scrape completed"
        );

        Ok(ScrapeResult {
            username: username.to_string(),
            watched_count,
            watchlist_count,
            films,
        })
    }

    async fn first_page(&self, username: &str, kind: ListKind) -> Option<FirstPage> {
        let url = first_page_url(&self.base_url, username, kind);
        let html = self.fetcher.fetch_page(&url).await?;

        let films = parse_films(&html, username, kind);
        let count = match kind {
            ListKind::Watched => extract_watched_count(&html, films.len()),
            ListKind::Watchlist => extract_watchlist_count(&html, films.len()),
        };

        tracing::debug!(list = %kind, count = count, page_one = films.len(), "First page parsed");

        Some(FirstPage { films, count })
    }
}

/// Trims a username and rejects anything that could alter the fetched URL path
pub fn validate_username(raw: &str) -> AppResult<&str> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(AppError::InvalidInput("Username is required".to_string()));
    }

    let valid = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(AppError::InvalidInput(format!(
            "Invalid username: {}",
            username
        )));
    }

    Ok(username)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;
    use crate::services::fetcher::MockPageFetcher;
    use crate::services::parser::fixtures::{grid_item, list_page};

    const BASE: &str = "http://test.local";

    fn watched_page(count_label: &str, items: &[String]) -> String {
        format!(
            r#"<span class="tooltip" title="{} films">Films</span>{}"#,
            count_label,
            list_page(items)
        )
    }

    fn watchlist_page(count: u32, items: &[String]) -> String {
        format!(
            r#"<span class="js-watchlist-count">{}</span>{}"#,
            count,
            list_page(items)
        )
    }

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("  alice_99 ").unwrap(), "alice_99");
        assert!(matches!(validate_username(""), Err(AppError::InvalidInput(_))));
        assert!(matches!(validate_username("   "), Err(AppError::InvalidInput(_))));
        assert!(matches!(validate_username("../admin"), Err(AppError::InvalidInput(_))));
        assert!(matches!(validate_username("a b"), Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_scrape_paginates_both_lists() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch_page().returning(|url| match url {
            "http://test.local/alice/films/" => Some(watched_page(
                "73",
                &[grid_item(1, "first-page-film", Some(10))],
            )),
            "http://test.local/alice/films/page/2/" => {
                Some(list_page(&[grid_item(2, "second-page-film", Some(6))]))
            }
            "http://test.local/alice/watchlist/" => {
                Some(watchlist_page(29, &[grid_item(3, "wished", None)]))
            }
            "http://test.local/alice/watchlist/page/2/" => {
                Some(list_page(&[grid_item(4, "wished-too", None)]))
            }
            other => panic!("unexpected url {}", other),
        });

        let scraper = Scraper::new(Arc::new(fetcher), BASE, 5);
        let result = scraper.scrape("alice").await.unwrap();

        assert_eq!(result.watched_count, 73);
        assert_eq!(result.watchlist_count, 29);
        let slugs: Vec<&str> = result.films.iter().map(|f| f.slug.as_str()).collect();
        assert_eq!(
            slugs,
            vec!["first-page-film", "wished", "second-page-film", "wished-too"]
        );
        assert_eq!(result.films[2].rating, Rating::Rated(3.0));
        assert_eq!(result.films[3].owner, "watchlist_alice");
    }

    #[tokio::test]
    async fn test_missing_count_falls_back_to_first_page() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch_page()
            .withf(|url| !url.contains("/page/"))
            .returning(|url| {
                if url.ends_with("/films/") {
                    Some(list_page(&[grid_item(1, "a", Some(8)), grid_item(2, "b", Some(4))]))
                } else {
                    Some(list_page(&[]))
                }
            });

        let scraper = Scraper::new(Arc::new(fetcher), BASE, 5);
        let result = scraper.scrape("alice").await.unwrap();

        assert_eq!(result.watched_count, 2);
        assert_eq!(result.watchlist_count, 0);
        assert_eq!(result.films.len(), 2);
    }

    #[tokio::test]
    async fn test_one_unreachable_list_is_partial_success() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch_page().returning(|url| {
            if url.contains("/watchlist/") {
                None
            } else {
                Some(watched_page("1", &[grid_item(1, "only", Some(9))]))
            }
        });

        let scraper = Scraper::new(Arc::new(fetcher), BASE, 5);
        let result = scraper.scrape("alice").await.unwrap();

        assert_eq!(result.films.len(), 1);
        assert_eq!(result.watchlist_count, 0);
    }

    #[tokio::test]
    async fn test_unreachable_profile_is_no_data() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch_page().times(2).returning(|_| None);

        let scraper = Scraper::new(Arc::new(fetcher), BASE, 5);
        let result = scraper.scrape("ghost").await;

        assert!(matches!(result, Err(AppError::NoData(_))));
    }

    #[tokio::test]
    async fn test_reachable_empty_profile_is_success() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch_page()
            .returning(|_| Some(list_page(&[])));

        let scraper = Scraper::new(Arc::new(fetcher), BASE, 5);
        let result = scraper.scrape("newcomer").await.unwrap();

        assert!(result.films.is_empty());
        assert_eq!(result.watched_count, 0);
    }

    #[tokio::test]
    async fn test_invalid_username_never_fetches() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch_page().never();

        let scraper = Scraper::new(Arc::new(fetcher), BASE, 5);
        let result = scraper.scrape("bad/name").await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}

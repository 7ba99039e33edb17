use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::request_id::RequestId;
use crate::models::{FilmRecord, LikedFilm, RecommendationEntry, RecommendationParams, ScrapeResult};
use crate::services::{
    recommendations::get_recommendations,
    taste::{format_title, select_taste, DEFAULT_LIKE_PERCENTILE},
};

use super::AppState;

/// Edge cache policy for scrape responses
const SCRAPE_CACHE_CONTROL: &str = "public, s-maxage=86400, stale-while-revalidate=43200";

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct ScrapeQuery {
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FilmResponse {
    pub username: String,
    pub movie_id: u64,
    pub title: String,
    pub rating: Option<f32>,
}

impl From<&FilmRecord> for FilmResponse {
    fn from(film: &FilmRecord) -> Self {
        Self {
            username: film.owner.clone(),
            movie_id: film.movie_id,
            title: film.slug.clone(),
            rating: film.rating.value(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub username: String,
    pub watched_count: u32,
    pub watchlist_count: u32,
    pub total_films_retrieved: usize,
    pub films: Vec<FilmResponse>,
}

impl From<&ScrapeResult> for ScrapeResponse {
    fn from(result: &ScrapeResult) -> Self {
        Self {
            username: result.username.clone(),
            watched_count: result.watched_count,
            watchlist_count: result.watchlist_count,
            total_films_retrieved: result.films.len(),
            films: result.films.iter().map(FilmResponse::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub liked: Vec<LikedFilm>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub alpha: Option<f32>,
    pub pop_factor: Option<f32>,
    pub rating_power: Option<f32>,
    pub use_negatives: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UserRecommendationQuery {
    pub alpha: Option<f32>,
    pub pop_factor: Option<f32>,
    pub rating_power: Option<f32>,
    pub use_negatives: Option<bool>,
    #[serde(default)]
    pub exclude_watchlist: bool,
    pub percentile: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct TitledRecommendation {
    pub slug: String,
    pub title: String,
    pub relative_score: u8,
}

impl From<RecommendationEntry> for TitledRecommendation {
    fn from(entry: RecommendationEntry) -> Self {
        Self {
            title: format_title(&entry.slug),
            slug: entry.slug,
            relative_score: entry.relative_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserRecommendationsResponse {
    pub username: String,
    pub liked_count: usize,
    pub threshold: f32,
    pub excluded_count: usize,
    pub recommendations: Vec<TitledRecommendation>,
}

#[derive(Debug, Serialize)]
pub struct CatalogInfoResponse {
    pub loaded: bool,
    pub titles: usize,
    pub dimension: usize,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Merges optional overrides onto the engine defaults and validates them
fn resolve_params(
    alpha: Option<f32>,
    pop_factor: Option<f32>,
    rating_power: Option<f32>,
    use_negatives: Option<bool>,
) -> AppResult<RecommendationParams> {
    let defaults = RecommendationParams::default();
    let params = RecommendationParams {
        alpha: alpha.unwrap_or(defaults.alpha),
        pop_factor: pop_factor.unwrap_or(defaults.pop_factor),
        rating_power: rating_power.unwrap_or(defaults.rating_power),
        use_negatives: use_negatives.unwrap_or(defaults.use_negatives),
    };

    for (name, value) in [
        ("alpha", params.alpha),
        ("pop_factor", params.pop_factor),
        ("rating_power", params.rating_power),
    ] {
        if !value.is_finite() {
            return Err(AppError::InvalidInput(format!("{} must be a finite number", name)));
        }
    }

    Ok(params)
}

fn validate_liked(liked: &[LikedFilm]) -> AppResult<()> {
    match liked
        .iter()
        .find(|film| !(0.5..=5.0).contains(&film.rating))
    {
        Some(film) => Err(AppError::InvalidInput(format!(
            "Rating for {} must be between 0.5 and 5.0",
            film.slug
        ))),
        None => Ok(()),
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Scrapes a user's watched list and wish-list
pub async fn scrape(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<ScrapeQuery>,
) -> AppResult<impl IntoResponse> {
    let username = query
        .username
        .ok_or_else(|| AppError::InvalidInput("Username is required".to_string()))?;

    tracing::info!(request_id = %request_id, username = %username, "Processing scrape request");

    let result = state.scraper.scrape(&username).await?;

    Ok((
        [(header::CACHE_CONTROL, SCRAPE_CACHE_CONTROL)],
        Json(ScrapeResponse::from(&result)),
    ))
}

/// Ranks the catalog for an explicit list of liked and excluded films
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<Vec<RecommendationEntry>>> {
    validate_liked(&request.liked)?;
    let params = resolve_params(
        request.alpha,
        request.pop_factor,
        request.rating_power,
        request.use_negatives,
    )?;

    let recommendations =
        get_recommendations(state.catalog(), &request.liked, &request.exclude, &params);

    Ok(Json(recommendations))
}

/// Scrapes a profile and turns its top-rated films into recommendations
pub async fn recommend_for_user(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(username): Path<String>,
    Query(query): Query<UserRecommendationQuery>,
) -> AppResult<Json<UserRecommendationsResponse>> {
    let params = resolve_params(
        query.alpha,
        query.pop_factor,
        query.rating_power,
        query.use_negatives,
    )?;
    let percentile = query.percentile.unwrap_or(DEFAULT_LIKE_PERCENTILE);
    if !(0.0..=1.0).contains(&percentile) {
        return Err(AppError::InvalidInput(
            "percentile must be between 0 and 1".to_string(),
        ));
    }

    tracing::info!(
        request_id = %request_id,
        username = %username,
        "Processing user recommendation request"
    );

    let result = state.scraper.scrape(&username).await?;
    let selection = select_taste(&result.films, percentile, query.exclude_watchlist)?;

    let recommendations =
        get_recommendations(state.catalog(), &selection.liked, &selection.exclude, &params);

    tracing::info!(
        request_id = %request_id,
        liked = selection.liked.len(),
        threshold = selection.threshold,
        recommendations = recommendations.len(),
        "User recommendations completed"
    );

    Ok(Json(UserRecommendationsResponse {
        username: result.username,
        liked_count: selection.liked.len(),
        threshold: selection.threshold,
        excluded_count: selection.exclude.len(),
        recommendations: recommendations
            .into_iter()
            .map(TitledRecommendation::from)
            .collect(),
    }))
}

/// Reports whether a catalog is loaded and its shape
pub async fn catalog_info(State(state): State<AppState>) -> Json<CatalogInfoResponse> {
    let response = match state.catalog() {
        Some(catalog) => CatalogInfoResponse {
            loaded: true,
            titles: catalog.len(),
            dimension: catalog.dimension(),
            loaded_at: Some(catalog.loaded_at()),
        },
        None => CatalogInfoResponse {
            loaded: false,
            titles: 0,
            dimension: 0,
            loaded_at: None,
        },
    };
    Json(response)
}

//! Embedding-based recommendation engine.
//!
//! Two pure phases over a read-only [`CatalogHandle`]:
//!
//! 1. **Profile construction**: liked films are resolved against the catalog,
//!    weighted by rarity (inverse norm) and rating intensity, and pooled into a
//!    single unit-length taste vector.
//! 2. **Scoring**: every non-excluded catalog entry is scored by cosine
//!    similarity to the profile times a popularity term, ranked, capped and
//!    rescaled relative to the best entry.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Instant;

use crate::{
    models::{LikedFilm, RecommendationEntry, RecommendationParams},
    services::catalog::CatalogHandle,
};

/// Maximum number of entries returned
pub const MAX_RECOMMENDATIONS: usize = 150;

/// Keeps the rarity weight finite for zero-norm entries
const RARITY_EPSILON: f32 = 1e-6;

/// Below this the pooled profile is treated as the zero vector
const DEGENERATE_NORM: f32 = 1e-9;

/// Rating that separates positive from negative signals
const NEUTRAL_RATING: f32 = 2.5;

/// Direction and strength of one rating
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSignal {
    /// +1.0 for a positive signal, -1.0 for a negative one
    pub sign: f32,
    /// Strength in [0, 1]
    pub intensity: f32,
}

/// Maps a 0.5..=5.0 rating to a signed intensity
///
/// Without negatives every rating is a positive signal of strength `r / 5`.
/// With negatives, 2.5 is neutral: ratings above it scale to (0, 1] and
/// ratings below it become negative signals, strongest at 0.5.
pub fn rating_signal(rating: f32, use_negatives: bool) -> RatingSignal {
    if !use_negatives {
        return RatingSignal {
            sign: 1.0,
            intensity: rating / 5.0,
        };
    }

    if rating < NEUTRAL_RATING {
        RatingSignal {
            sign: -1.0,
            intensity: (NEUTRAL_RATING - rating) / NEUTRAL_RATING,
        }
    } else {
        RatingSignal {
            sign: 1.0,
            intensity: (rating - NEUTRAL_RATING) / NEUTRAL_RATING,
        }
    }
}

/// Inverse-popularity weight; larger `alpha` favors low-norm (niche) titles more
pub fn rarity_weight(norm: f32, alpha: f32) -> f32 {
    1.0 / (norm.powf(alpha) + RARITY_EPSILON)
}

/// Builds the user's unit-length taste vector
///
/// Returns `None` when no liked film resolves against the catalog. With
/// negatives enabled contributions are summed so opposite signals offset;
/// otherwise each dimension keeps its strongest weighted value.
pub fn build_user_profile(
    catalog: &CatalogHandle,
    liked: &[LikedFilm],
    alpha: f32,
    rating_power: f32,
    use_negatives: bool,
) -> Option<Vec<f32>> {
    let resolved: Vec<(usize, f32)> = liked
        .iter()
        .filter_map(|film| match catalog.lookup(&film.slug) {
            Some(idx) => Some((idx, film.rating)),
            None => {
                tracing::debug!(slug = %film.slug, "Liked film not in catalog");
                None
            }
        })
        .collect();

    if resolved.is_empty() {
        return None;
    }

    let dimension = catalog.dimension();
    let initial = if use_negatives { 0.0 } else { f32::NEG_INFINITY };
    let mut profile = vec![initial; dimension];

    for (idx, rating) in resolved {
        let signal = rating_signal(rating, use_negatives);
        let weight = rarity_weight(catalog.norm(idx), alpha)
            * signal.intensity.powf(rating_power)
            * signal.sign;

        for (acc, value) in profile.iter_mut().zip(catalog.vector(idx)) {
            let weighted = value * weight;
            if use_negatives {
                *acc += weighted;
            } else if weighted > *acc {
                *acc = weighted;
            }
        }
    }

    for value in profile.iter_mut() {
        if !value.is_finite() {
            *value = 0.0;
        }
    }

    normalize(&mut profile);
    Some(profile)
}

/// Scales `vector` to unit length unless it is (near) zero
fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > DEGENERATE_NORM {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Ranks the catalog against a taste profile
///
/// Excluded slugs are matched with the same normalization as catalog lookups.
/// Entries whose score is not finite are dropped. Ties keep catalog order.
pub fn score_catalog(
    catalog: &CatalogHandle,
    profile: &[f32],
    exclude: &[String],
    pop_factor: f32,
) -> Vec<RecommendationEntry> {
    let excluded: HashSet<usize> = exclude
        .iter()
        .filter_map(|slug| catalog.lookup(slug))
        .collect();

    let mut scored: Vec<(usize, f32)> = (0..catalog.len())
        .filter(|idx| !excluded.contains(idx))
        .map(|idx| {
            let similarity = dot(profile, catalog.vector(idx));
            let popularity = catalog.norm(idx).powf(pop_factor);
            (idx, similarity * popularity)
        })
        .filter(|(_, score)| score.is_finite())
        .collect();

    scored.sort_by(|a, b| match b.1.partial_cmp(&a.1) {
        Some(Ordering::Equal) | None => a.0.cmp(&b.0),
        Some(order) => order,
    });
    scored.truncate(MAX_RECOMMENDATIONS);

    let max_score = scored.first().map(|(_, score)| *score).unwrap_or(0.0);

    scored
        .into_iter()
        .map(|(idx, score)| RecommendationEntry {
            slug: catalog.title(idx).to_string(),
            relative_score: relative_score(score, max_score),
        })
        .collect()
}

/// Score as a rounded percentage of the best retained score, clamped to 0..=100
fn relative_score(score: f32, max_score: f32) -> u8 {
    if max_score <= 0.0 {
        return 0;
    }
    ((score / max_score) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Produces the ranked recommendation list for a set of liked films
///
/// Short-circuits to an empty list when no catalog is loaded or none of the
/// liked films are in it.
pub fn get_recommendations(
    catalog: Option<&CatalogHandle>,
    liked: &[LikedFilm],
    exclude: &[String],
    params: &RecommendationParams,
) -> Vec<RecommendationEntry> {
    let Some(catalog) = catalog else {
        tracing::warn!("Recommendation requested without a loaded catalog");
        return Vec::new();
    };

    let start = Instant::now();

    let Some(profile) = build_user_profile(
        catalog,
        liked,
        params.alpha,
        params.rating_power,
        params.use_negatives,
    ) else {
        tracing::warn!(liked = liked.len(), "No liked film matched the catalog");
        return Vec::new();
    };

    let recommendations = score_catalog(catalog, &profile, exclude, params.pop_factor);

    tracing::info!(
        liked = liked.len(),
        excluded = exclude.len(),
        returned = recommendations.len(),
        processing_time_ms = start.elapsed().as_millis(),
        "Recommendations computed"
    );

    recommendations
}

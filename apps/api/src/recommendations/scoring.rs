//! Content-based recommendation scoring.
//!
//! Pure functions over catalog rows and rating maps so the ranking logic is
//! fully testable without a database. Candidates are compared against the
//! user's highly-rated games (3+ stars); lower ratings signal dislike and
//! contribute nothing to the comparison set.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::models::game::CatalogGame;

/// How many suggestions to return.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// Ratings below this do not qualify as taste signals.
const HIGH_RATING_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Serialize)]
pub struct RecommendedGame {
    pub board_game_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub average_rating: Option<f64>,
    pub rating_count: i64,
    pub complexity: Option<f64>,
    pub average_playtime_minutes: Option<i32>,
    pub game_type: Option<String>,
    pub theme: Option<String>,
    pub complexity_tier: Option<String>,
    /// Set in fallback mode only, where "recommendations" are the user's own
    /// favorites.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResult {
    pub is_fallback_mode: bool,
    pub games: Vec<RecommendedGame>,
}

/// Ranks up to `limit` suggestions for a user.
///
/// `user_ratings` holds the user's mean rating per game (across sessions),
/// `average_ratings`/`rating_counts` the global per-game aggregates.
pub fn recommend(
    games: &[CatalogGame],
    user_ratings: &HashMap<Uuid, f64>,
    average_ratings: &HashMap<Uuid, f64>,
    rating_counts: &HashMap<Uuid, i64>,
    limit: usize,
) -> RecommendationResult {
    if games.is_empty() {
        return RecommendationResult {
            is_fallback_mode: false,
            games: Vec::new(),
        };
    }

    let (rated, unrated): (Vec<&CatalogGame>, Vec<&CatalogGame>) = games
        .iter()
        .partition(|g| user_ratings.contains_key(&g.game.id));

    // Fallback mode: the user has rated the whole catalog, so return their
    // top-rated games instead of novel suggestions.
    if unrated.is_empty() {
        let mut favorites: Vec<&CatalogGame> = rated;
        // Stable sort: full ties stay in catalog order.
        favorites.sort_by(|a, b| {
            let (ua, ub) = (user_ratings[&a.game.id], user_ratings[&b.game.id]);
            let avg_a = average_ratings.get(&a.game.id).copied().unwrap_or(0.0);
            let avg_b = average_ratings.get(&b.game.id).copied().unwrap_or(0.0);
            ub.total_cmp(&ua).then(avg_b.total_cmp(&avg_a))
        });

        let games = favorites
            .into_iter()
            .take(limit)
            .map(|g| to_recommended(g, average_ratings, rating_counts, user_ratings.get(&g.game.id).copied()))
            .collect();

        return RecommendationResult {
            is_fallback_mode: true,
            games,
        };
    }

    let mut scored: Vec<(&CatalogGame, f64)> = unrated
        .into_iter()
        .map(|candidate| {
            let score = similarity_score(candidate, &rated, user_ratings);
            (candidate, score)
        })
        .collect();

    // Score descending, then game id ascending as a deterministic tie-break.
    scored.sort_by(|(a, sa), (b, sb)| sb.total_cmp(sa).then(a.game.id.cmp(&b.game.id)));

    let games = scored
        .into_iter()
        .take(limit)
        .map(|(g, _)| to_recommended(g, average_ratings, rating_counts, None))
        .collect();

    RecommendationResult {
        is_fallback_mode: false,
        games,
    }
}

/// Mean of per-rated-game similarity, each comparison weighted by the user's
/// rating for that game. Only ratings >= 3 qualify; zero qualifying
/// comparisons scores 0.
pub fn similarity_score(
    candidate: &CatalogGame,
    rated: &[&CatalogGame],
    user_ratings: &HashMap<Uuid, f64>,
) -> f64 {
    let mut total = 0.0;
    let mut comparisons = 0u32;

    for rated_game in rated {
        let Some(&user_rating) = user_ratings.get(&rated_game.game.id) else {
            continue;
        };
        if user_rating < HIGH_RATING_THRESHOLD {
            continue;
        }

        total += pairwise_similarity(candidate, rated_game) * user_rating;
        comparisons += 1;
    }

    if comparisons > 0 {
        total / comparisons as f64
    } else {
        0.0
    }
}

fn pairwise_similarity(candidate: &CatalogGame, other: &CatalogGame) -> f64 {
    let mut similarity = 0.0;

    if let (Some(c), Some(r)) = (candidate.metadata.as_ref(), other.metadata.as_ref()) {
        if fields_match(&c.game_type, &r.game_type) {
            similarity += 3.0;
        }
        if fields_match(&c.theme, &r.theme) {
            similarity += 2.0;
        }
        if fields_match(&c.complexity_tier, &r.complexity_tier) {
            similarity += 2.0;
        }
        if fields_match(&c.player_interaction_level, &r.player_interaction_level) {
            similarity += 1.0;
        }
        if fields_match(&c.typical_play_style, &r.typical_play_style) {
            similarity += 1.0;
        }
    }

    if let (Some(a), Some(b)) = (candidate.game.setup_complexity, other.game.setup_complexity) {
        let diff = (a - b).abs();
        if diff <= 1.0 {
            similarity += 1.5 * (1.0 - diff);
        }
    }

    if let (Some(a), Some(b)) = (
        candidate.game.average_playtime_minutes,
        other.game.average_playtime_minutes,
    ) {
        let diff = f64::from((a - b).abs());
        let max = f64::from(a.max(b));
        if max > 0.0 {
            similarity += 1.0 - diff.min(max) / max;
        }
    }

    similarity
}

/// Case-insensitive equality over non-blank values.
fn fields_match(a: &Option<String>, b: &Option<String>) -> bool {
    match (a.as_deref().map(str::trim), b.as_deref().map(str::trim)) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

fn to_recommended(
    g: &CatalogGame,
    average_ratings: &HashMap<Uuid, f64>,
    rating_counts: &HashMap<Uuid, i64>,
    user_rating: Option<f64>,
) -> RecommendedGame {
    RecommendedGame {
        board_game_id: g.game.id,
        name: g.game.name.clone(),
        description: g.game.description.clone(),
        average_rating: average_ratings.get(&g.game.id).copied(),
        rating_count: rating_counts.get(&g.game.id).copied().unwrap_or(0),
        complexity: g.game.setup_complexity,
        average_playtime_minutes: g.game.average_playtime_minutes,
        game_type: g.metadata.as_ref().and_then(|m| m.game_type.clone()),
        theme: g.metadata.as_ref().and_then(|m| m.theme.clone()),
        complexity_tier: g.metadata.as_ref().and_then(|m| m.complexity_tier.clone()),
        user_rating,
    }
}

// src/models/rating.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'prompt_ratings' table in the database.
/// One row per (prompt, user), enforced by a unique constraint.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRating {
    pub id: i64,
    pub prompt_id: i64,
    pub user_id: i64,
    /// Star value, 1..=5.
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating or updating a rating.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5."))]
    pub rating: i16,
    #[validate(length(max = 1000, message = "Comment must be at most 1000 characters."))]
    pub comment: Option<String>,
}

impl RateRequest {
    /// Normalized comment: trimmed, empty collapsed to NULL.
    pub fn normalized_comment(&self) -> Option<String> {
        self.comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned)
    }
}

/// One rating in a listing, with the rater's nickname joined in.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RatingListItem {
    pub id: i64,
    pub user_id: i64,
    pub nickname: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Response for rating create/update: the rating plus the fresh aggregate.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingMutationResponse {
    pub rating: PromptRating,
    pub average_rating: Option<f64>,
    pub rating_count: i32,
}

/// Response for rating deletion: just the fresh aggregate.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingAggregateResponse {
    pub average_rating: Option<f64>,
    pub rating_count: i32,
}

/// Response for `GET /api/prompts/{id}/ratings/stats`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingStatsResponse {
    pub average_rating: Option<f64>,
    pub rating_count: i64,
    /// The caller's own rating, when authenticated and present.
    pub my_rating: Option<i16>,
    /// Count per star value, keyed "1".."5". Always carries all five keys.
    pub distribution: BTreeMap<String, i64>,
}

/// Shapes `GROUP BY rating` rows into the full five-bucket histogram.
/// Star values without ratings appear with a count of 0.
pub fn distribution_from_rows(rows: &[(i16, i64)]) -> BTreeMap<String, i64> {
    let mut distribution: BTreeMap<String, i64> =
        (1..=5).map(|star: i16| (star.to_string(), 0)).collect();
    for (star, count) in rows {
        if (1..=5).contains(star) {
            distribution.insert(star.to_string(), *count);
        }
    }
    distribution
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_request_range() {
        let ok = RateRequest { rating: 5, comment: None };
        assert!(ok.validate().is_ok());

        let low = RateRequest { rating: 0, comment: None };
        assert!(low.validate().is_err());

        let high = RateRequest { rating: 6, comment: None };
        assert!(high.validate().is_err());
    }

    #[test]
    fn comment_is_trimmed_and_emptied_to_none() {
        let req = RateRequest {
            rating: 4,
            comment: Some("  nice prompt  ".to_string()),
        };
        assert_eq!(req.normalized_comment(), Some("nice prompt".to_string()));

        let blank = RateRequest {
            rating: 4,
            comment: Some("   ".to_string()),
        };
        assert_eq!(blank.normalized_comment(), None);

        let absent = RateRequest { rating: 4, comment: None };
        assert_eq!(absent.normalized_comment(), None);
    }

    #[test]
    fn overlong_comment_rejected() {
        let req = RateRequest {
            rating: 3,
            comment: Some("x".repeat(1001)),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn distribution_fills_missing_stars() {
        let rows = vec![(3i16, 1i64), (5, 1)];
        let dist = distribution_from_rows(&rows);
        assert_eq!(dist.len(), 5);
        assert_eq!(dist["1"], 0);
        assert_eq!(dist["3"], 1);
        assert_eq!(dist["5"], 1);
    }

    #[test]
    fn distribution_ignores_out_of_range_rows() {
        let rows = vec![(0i16, 9i64), (7, 9)];
        let dist = distribution_from_rows(&rows);
        assert!(dist.values().all(|&c| c == 0));
    }
}

//! Review validation and rating aggregation.
//!
//! An item's `average_rating` and `review_count` are derived values. They are
//! never set directly: every review mutation recomputes them from the full
//! list of ratings via [`compute_rating_stats`].

use serde::Serialize;

use crate::error::CoreError;

/// Lowest accepted rating.
pub const MIN_RATING: i16 = 1;

/// Highest accepted rating.
pub const MAX_RATING: i16 = 5;

/// Maximum length of a review comment.
pub const MAX_COMMENT_LENGTH: usize = 2_000;

/// Default page size for review listings.
pub const DEFAULT_REVIEW_LIMIT: i64 = 10;

/// Maximum page size for review listings.
pub const MAX_REVIEW_LIMIT: i64 = 100;

/// Name shown for reviewers without a usable name.
pub const ANONYMOUS_REVIEWER: &str = "Anonymous";

/// Validate that a rating is an integer in `[1, 5]`.
pub fn validate_rating(rating: i16) -> Result<(), CoreError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(CoreError::Validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    Ok(())
}

/// Validate comment length. An empty comment is allowed.
pub fn validate_comment(comment: &str) -> Result<(), CoreError> {
    if comment.chars().count() > MAX_COMMENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Comment must be at most {MAX_COMMENT_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Derived rating aggregate for one item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingStats {
    pub average_rating: f64,
    pub review_count: i32,
}

impl RatingStats {
    pub const EMPTY: RatingStats = RatingStats {
        average_rating: 0.0,
        review_count: 0,
    };
}

/// Recompute the aggregate from every rating on the item.
///
/// The mean is rounded to one decimal place. No ratings yields
/// [`RatingStats::EMPTY`]. The result depends only on the multiset of
/// ratings, so re-running it is idempotent.
pub fn compute_rating_stats(ratings: &[i16]) -> RatingStats {
    if ratings.is_empty() {
        return RatingStats::EMPTY;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    let mean = sum as f64 / ratings.len() as f64;
    RatingStats {
        average_rating: round_to_tenth(mean),
        review_count: ratings.len() as i32,
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Display name for a reviewer, falling back to [`ANONYMOUS_REVIEWER`].
pub fn reviewer_display_name(first_name: &str, last_name: &str) -> String {
    let full = format!("{} {}", first_name.trim(), last_name.trim());
    let full = full.trim();
    if full.is_empty() {
        ANONYMOUS_REVIEWER.to_string()
    } else {
        full.to_string()
    }
}

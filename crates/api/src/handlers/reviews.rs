//! Handlers for item reviews.
//!
//! Adding a review and recomputing the item's rating aggregate happen in one
//! transaction that holds the item row lock, so concurrent reviews on the
//! same item are applied one at a time.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bistro_core::error::CoreError;
use bistro_core::review::{
    compute_rating_stats, reviewer_display_name, validate_comment, validate_rating, RatingStats,
    DEFAULT_REVIEW_LIMIT, MAX_REVIEW_LIMIT,
};
use bistro_core::types::{DbId, Timestamp};
use bistro_db::models::review::{CreateReview, Review, ReviewListing};
use bistro_db::repositories::{ItemRepo, OrderRepo, ReviewRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /items/{id}/reviews`.
#[derive(Debug, Deserialize)]
pub struct AddReviewRequest {
    pub rating: i16,
    pub comment: Option<String>,
}

/// One item's rating aggregate with a page of its reviews.
#[derive(Debug, Serialize)]
pub struct ItemReviews {
    pub item_id: DbId,
    #[serde(flatten)]
    pub stats: RatingStats,
    pub reviews: Vec<ReviewListing>,
}

/// Public projection of a review: display name instead of user details.
#[derive(Debug, Serialize)]
pub struct PublicReview {
    pub id: DbId,
    pub item_id: DbId,
    pub item_name: String,
    pub item_image_ref: String,
    pub reviewer_name: String,
    pub profile_image: Option<String>,
    pub rating: i16,
    pub comment: String,
    pub created_at: Timestamp,
}

impl From<ReviewListing> for PublicReview {
    fn from(r: ReviewListing) -> Self {
        Self {
            reviewer_name: reviewer_display_name(&r.first_name, &r.last_name),
            id: r.id,
            item_id: r.item_id,
            item_name: r.item_name,
            item_image_ref: r.item_image_ref,
            profile_image: r.profile_image,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        }
    }
}

fn item_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Item", id })
}

/// POST /api/v1/items/{id}/reviews
///
/// The reviewer must have ordered the item at least once, in any status,
/// and may review it only once.
pub async fn add_review(
    user: AuthUser,
    State(state): State<AppState>,
    Path(item_id): Path<DbId>,
    AppJson(input): AppJson<AddReviewRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Review>>)> {
    validate_rating(input.rating)?;
    let comment = input.comment.unwrap_or_default().trim().to_string();
    validate_comment(&comment)?;

    let mut tx = state.pool.begin().await?;
    ItemRepo::find_for_update(&mut tx, item_id)
        .await?
        .ok_or_else(|| item_not_found(item_id))?;

    if !OrderRepo::user_has_ordered_item(&mut tx, user.user_id, item_id).await? {
        return Err(CoreError::Forbidden(
            "You can only review items you have ordered".into(),
        )
        .into());
    }
    if ReviewRepo::exists_for_user(&mut tx, item_id, user.user_id).await? {
        return Err(CoreError::Conflict("You have already reviewed this item".into()).into());
    }

    let review = ReviewRepo::create(
        &mut tx,
        &CreateReview {
            item_id,
            user_id: user.user_id,
            rating: input.rating,
            comment,
        },
    )
    .await?;

    let stats = compute_rating_stats(&ReviewRepo::ratings_for_item(&mut tx, item_id).await?);
    ItemRepo::set_rating_stats(&mut tx, item_id, &stats).await?;
    tx.commit().await?;

    tracing::info!(
        item_id,
        review_id = review.id,
        user_id = user.user_id,
        average_rating = stats.average_rating,
        review_count = stats.review_count,
        "Review added"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: review })))
}

/// GET /api/v1/items/{id}/reviews
pub async fn item_reviews(
    State(state): State<AppState>,
    Path(item_id): Path<DbId>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<ItemReviews>>> {
    let item = ItemRepo::find_by_id(&state.pool, item_id)
        .await?
        .ok_or_else(|| item_not_found(item_id))?;
    let reviews = ReviewRepo::list_for_item(
        &state.pool,
        item_id,
        page.limit(DEFAULT_REVIEW_LIMIT, MAX_REVIEW_LIMIT),
        page.offset(),
    )
    .await?;
    Ok(Json(DataResponse {
        data: ItemReviews {
            item_id,
            stats: RatingStats {
                average_rating: item.average_rating,
                review_count: item.review_count,
            },
            reviews,
        },
    }))
}

/// GET /api/v1/admin/reviews
pub async fn admin_reviews(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<ReviewListing>>>> {
    let reviews = ReviewRepo::list_all(
        &state.pool,
        page.limit(DEFAULT_REVIEW_LIMIT, MAX_REVIEW_LIMIT),
        page.offset(),
    )
    .await?;
    Ok(Json(DataResponse { data: reviews }))
}

/// GET /api/v1/public/reviews
pub async fn public_reviews(
    State(state): State<AppState>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<PublicReview>>>> {
    let reviews = ReviewRepo::list_all(
        &state.pool,
        page.limit(DEFAULT_REVIEW_LIMIT, MAX_REVIEW_LIMIT),
        page.offset(),
    )
    .await?;
    Ok(Json(DataResponse {
        data: reviews.into_iter().map(PublicReview::from).collect(),
    }))
}

//! Route definitions for items and their reviews.
//!
//! Two routers are provided:
//! - `router()` for item routes mounted at `/items`
//! - `discovery_router()` for the storefront lists merged at the API root

use axum::routing::get;
use axum::Router;

use crate::handlers::{items, reviews};
use crate::state::AppState;

/// Item routes mounted at `/items`.
///
/// ```text
/// GET    /                   -> list
/// POST   /                   -> create (admin, multipart)
/// GET    /category/{id}      -> list_by_category
/// GET    /{id}               -> get_by_id
/// PUT    /{id}               -> update (admin, multipart)
/// DELETE /{id}               -> delete (admin)
/// GET    /{id}/reviews       -> item_reviews
/// POST   /{id}/reviews       -> add_review (auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(items::list).post(items::create))
        .route("/category/{id}", get(items::list_by_category))
        .route(
            "/{id}",
            get(items::get_by_id).put(items::update).delete(items::delete),
        )
        .route(
            "/{id}/reviews",
            get(reviews::item_reviews).post(reviews::add_review),
        )
}

/// ```text
/// GET /featured   -> featured (at most 4)
/// GET /popular    -> popular (top 5 by sell count)
/// GET /deals      -> deals
/// ```
pub fn discovery_router() -> Router<AppState> {
    Router::new()
        .route("/featured", get(items::featured))
        .route("/popular", get(items::popular))
        .route("/deals", get(items::deals))
}

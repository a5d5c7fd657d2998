//! Route definitions for cross-item review listings.

use axum::routing::get;
use axum::Router;

use crate::handlers::reviews;
use crate::state::AppState;

/// Mounted at `/admin/reviews`.
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/", get(reviews::admin_reviews))
}

/// Mounted at `/public/reviews`.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(reviews::public_reviews))
}

//! Route definitions for `/orders`.

use axum::routing::get;
use axum::Router;

use crate::handlers::orders;
use crate::state::AppState;

/// ```text
/// GET    /        -> list (admin)
/// POST   /        -> create (auth)
/// GET    /{id}    -> get_by_id (owner or admin)
/// PUT    /{id}    -> update (admin)
/// DELETE /{id}    -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route(
            "/{id}",
            get(orders::get_by_id)
                .put(orders::update)
                .delete(orders::delete),
        )
}

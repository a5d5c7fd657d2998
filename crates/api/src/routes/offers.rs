//! Route definitions for `/offers`.

use axum::routing::get;
use axum::Router;

use crate::handlers::offers;
use crate::state::AppState;

/// ```text
/// GET    /              -> list
/// POST   /              -> create (admin, multipart)
/// GET    /{id}          -> get_by_id
/// PUT    /{id}          -> update (admin, multipart)
/// DELETE /{id}          -> delete (admin)
/// GET    /{id}/items    -> list_items
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(offers::list).post(offers::create))
        .route(
            "/{id}",
            get(offers::get_by_id)
                .put(offers::update)
                .delete(offers::delete),
        )
        .route("/{id}/items", get(offers::list_items))
}

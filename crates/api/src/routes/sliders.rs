//! Route definitions for `/sliders`.

use axum::routing::get;
use axum::Router;

use crate::handlers::sliders;
use crate::state::AppState;

/// ```text
/// GET    /        -> list_active
/// POST   /        -> create (admin, multipart)
/// GET    /{id}    -> get_by_id
/// PUT    /{id}    -> update (admin, multipart)
/// DELETE /{id}    -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sliders::list_active).post(sliders::create))
        .route(
            "/{id}",
            get(sliders::get_by_id)
                .put(sliders::update)
                .delete(sliders::delete),
        )
}

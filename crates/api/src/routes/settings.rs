//! Route definitions for `/settings`.

use axum::routing::get;
use axum::Router;

use crate::handlers::settings;
use crate::state::AppState;

/// ```text
/// GET    /    -> get (public, no gateway credentials)
/// POST   /    -> save (admin, create or replace)
/// PUT    /    -> update (admin, partial)
/// DELETE /    -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(settings::get)
            .post(settings::save)
            .put(settings::update)
            .delete(settings::delete),
    )
}

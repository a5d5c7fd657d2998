pub mod categories;
pub mod health;
pub mod items;
pub mod offers;
pub mod orders;
pub mod reviews;
pub mod search;
pub mod settings;
pub mod sliders;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /categories                      list, create
/// /categories/{id}                 get, update, delete
///
/// /items                           list, create
/// /items/category/{id}             items in a category
/// /items/{id}                      get, update, delete
/// /items/{id}/reviews              item aggregates + reviews, add review
///
/// /featured                        featured items (at most 4)
/// /popular                         top items by sell count
/// /deals                           items flagged as deals
///
/// /offers                          list, create
/// /offers/{id}                     get, update, delete
/// /offers/{id}/items               the offer's items
///
/// /sliders                         active sliders, create
/// /sliders/{id}                    get, update, delete
///
/// /orders                          list (admin), place order
/// /orders/{id}                     get, update, delete
///
/// /admin/reviews                   all reviews (admin)
/// /public/reviews                  all reviews, public projection
///
/// /search                          ranked items, categories, offers
///
/// /settings                        restaurant settings (writes admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/categories", categories::router())
        .nest("/items", items::router())
        .merge(items::discovery_router())
        .nest("/offers", offers::router())
        .nest("/sliders", sliders::router())
        .nest("/orders", orders::router())
        .nest("/admin/reviews", reviews::admin_router())
        .nest("/public/reviews", reviews::public_router())
        .merge(search::router())
        .nest("/settings", settings::router())
}

//! Handler for `GET /search`.
//!
//! Items, categories and offers are ranked independently: exact matches
//! first, then case-insensitive partial matches, each kind within its own
//! budget.

use axum::extract::{Query, State};
use axum::Json;
use bistro_core::search::{
    clamp_limit, merge_tiers, normalize_query, partial_budget, partial_pattern, SearchResults,
    CATEGORY_RESULT_CAP,
};
use bistro_core::types::DbId;
use bistro_db::models::category::Category;
use bistro_db::models::item::{Item, ItemWithCategory};
use bistro_db::models::offer::{Offer, OfferWithItems};
use bistro_db::repositories::{CategoryRepo, ItemRepo, OfferRepo};

use crate::error::AppResult;
use crate::handlers::offers::with_items;
use crate::query::SearchParams;
use crate::response::DataResponse;
use crate::state::AppState;

pub type SearchResponse = SearchResults<ItemWithCategory, Category, OfferWithItems>;

fn ids<T>(hits: &[T], id_of: impl Fn(&T) -> DbId) -> Vec<DbId> {
    hits.iter().map(id_of).collect()
}

async fn search_items(
    state: &AppState,
    query: &str,
    pattern: &str,
    category_id: Option<DbId>,
    limit: i64,
) -> AppResult<Vec<Item>> {
    let exact = ItemRepo::search_exact(&state.pool, query, category_id, limit).await?;
    let budget = partial_budget(limit, exact.len());
    let partial = if budget > 0 {
        let exclude = ids(&exact, |i: &Item| i.id);
        ItemRepo::search_partial(&state.pool, pattern, category_id, &exclude, budget).await?
    } else {
        Vec::new()
    };
    Ok(merge_tiers(exact, partial, limit, |i| i.id))
}

async fn search_categories(
    state: &AppState,
    query: &str,
    pattern: &str,
) -> AppResult<Vec<Category>> {
    let limit = CATEGORY_RESULT_CAP;
    let exact = CategoryRepo::search_exact(&state.pool, query, limit).await?;
    let budget = partial_budget(limit, exact.len());
    let partial = if budget > 0 {
        let exclude = ids(&exact, |c: &Category| c.id);
        CategoryRepo::search_partial(&state.pool, pattern, &exclude, budget).await?
    } else {
        Vec::new()
    };
    Ok(merge_tiers(exact, partial, limit, |c| c.id))
}

async fn search_offers(
    state: &AppState,
    query: &str,
    pattern: &str,
    limit: i64,
) -> AppResult<Vec<Offer>> {
    let exact = OfferRepo::search_exact(&state.pool, query, limit).await?;
    let budget = partial_budget(limit, exact.len());
    let partial = if budget > 0 {
        let exclude = ids(&exact, |o: &Offer| o.id);
        OfferRepo::search_partial(&state.pool, pattern, &exclude, budget).await?
    } else {
        Vec::new()
    };
    Ok(merge_tiers(exact, partial, limit, |o| o.id))
}

/// GET /api/v1/search?q=&category_id=&limit=
///
/// `query` is accepted in place of `q`. `category_id` filters items only.
/// Offers come back with their items populated. Categories are capped at
/// [`CATEGORY_RESULT_CAP`] regardless of `limit`.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<DataResponse<SearchResponse>>> {
    let query = normalize_query(params.q.as_deref())?;
    let pattern = partial_pattern(&query);
    let limit = clamp_limit(params.limit);

    let items = search_items(&state, &query, &pattern, params.category_id, limit).await?;
    let items = ItemRepo::with_categories(&state.pool, items).await?;
    let categories = search_categories(&state, &query, &pattern).await?;
    let offers = search_offers(&state, &query, &pattern, limit).await?;
    let offers = with_items(&state, offers).await?;

    let results = SearchResults::new(items, categories, offers);
    tracing::debug!(query = %query, total = results.total_results, "Search completed");
    Ok(Json(DataResponse { data: results }))
}

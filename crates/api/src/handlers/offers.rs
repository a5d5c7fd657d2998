//! Handlers for the `/offers` resource.
//!
//! Writes arrive as `multipart/form-data` with `title`, `description`,
//! `item_ids` (JSON array of item ids) and an `image` file. Every id in
//! `item_ids` must name an existing item when the offer is written.

use std::collections::HashMap;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use bistro_core::assets::upload::PREFIX_OFFERS;
use bistro_core::catalog::{
    check_offer_membership, validate_required_text, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH,
};
use bistro_core::error::CoreError;
use bistro_core::types::DbId;
use bistro_db::models::item::{Item, ItemWithCategory};
use bistro_db::models::offer::{CreateOffer, Offer, OfferWithItems, UpdateOffer};
use bistro_db::repositories::{ItemRepo, OfferRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::multipart::MultipartForm;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Offer", id })
}

/// Reject the write unless every requested id resolves to an item.
async fn check_items_exist(state: &AppState, item_ids: &[DbId]) -> AppResult<()> {
    if item_ids.is_empty() {
        return Ok(());
    }
    let found = ItemRepo::count_existing(&state.pool, item_ids).await?;
    check_offer_membership(item_ids, found)?;
    Ok(())
}

/// Attach current items to each offer, dropping ids that no longer resolve.
/// Attach each offer's still-existing items, in `item_ids` order.
pub(crate) async fn with_items(state: &AppState, offers: Vec<Offer>) -> AppResult<Vec<OfferWithItems>> {
    let mut ids: Vec<DbId> = offers.iter().flat_map(|o| o.item_ids.iter().copied()).collect();
    ids.sort_unstable();
    ids.dedup();

    let items: HashMap<DbId, Item> = ItemRepo::find_by_ids(&state.pool, &ids)
        .await?
        .into_iter()
        .map(|i| (i.id, i))
        .collect();

    Ok(offers
        .into_iter()
        .map(|offer| {
            let items = offer
                .item_ids
                .iter()
                .filter_map(|id| items.get(id).cloned())
                .collect();
            OfferWithItems { offer, items }
        })
        .collect())
}

/// POST /api/v1/offers
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Offer>>)> {
    let form = MultipartForm::collect(multipart).await?;
    let title = form.required_text("title")?;
    validate_required_text("title", &title, MAX_NAME_LENGTH)?;
    let description = form.required_text("description")?;
    validate_required_text("description", &description, MAX_DESCRIPTION_LENGTH)?;
    let item_ids: Vec<DbId> = form.json_array("item_ids")?.unwrap_or_default();
    let image = form.required_image()?;
    state.assets.validate(image)?;

    check_items_exist(&state, &item_ids).await?;

    let image_ref = state.assets.upload(PREFIX_OFFERS, image).await?;
    let input = CreateOffer {
        title,
        description,
        image_ref: image_ref.clone(),
        item_ids,
    };
    let offer = match OfferRepo::create(&state.pool, &input).await {
        Ok(offer) => offer,
        Err(e) => {
            state.assets.release(&image_ref).await;
            return Err(e.into());
        }
    };

    tracing::info!(offer_id = offer.id, user_id = admin.user_id, "Offer created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: offer })))
}

/// GET /api/v1/offers
pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<OfferWithItems>>>> {
    let offers = OfferRepo::list(&state.pool).await?;
    let data = with_items(&state, offers).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/offers/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OfferWithItems>>> {
    let offer = OfferRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let data = with_items(&state, vec![offer])
        .await?
        .pop()
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/offers/{id}/items
///
/// The offer's items with their categories. Ids of deleted items are
/// skipped.
pub async fn list_items(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ItemWithCategory>>>> {
    let offer = OfferRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let items = ItemRepo::find_by_ids(&state.pool, &offer.item_ids).await?;
    let data = ItemRepo::with_categories(&state.pool, items).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/offers/{id}
///
/// Partial update; a sent `item_ids` is re-validated as a whole.
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<Offer>>> {
    let form = MultipartForm::collect(multipart).await?;
    let title = form.text("title").map(str::to_string);
    if let Some(title) = &title {
        validate_required_text("title", title, MAX_NAME_LENGTH)?;
    }
    let description = form.text("description").map(str::to_string);
    if let Some(description) = &description {
        validate_required_text("description", description, MAX_DESCRIPTION_LENGTH)?;
    }
    let item_ids: Option<Vec<DbId>> = form.json_array("item_ids")?;
    if let Some(image) = &form.image {
        state.assets.validate(image)?;
    }

    OfferRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if let Some(item_ids) = &item_ids {
        check_items_exist(&state, item_ids).await?;
    }

    let mut replacement = match &form.image {
        Some(image) => Some(state.assets.stage(PREFIX_OFFERS, None, image).await?),
        None => None,
    };

    // The old image is read under the row lock so concurrent replacements
    // each release exactly the image they overwrote.
    let result = async {
        let mut tx = state.pool.begin().await?;
        let current = OfferRepo::find_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found(id))?;
        if let Some(replacement) = replacement.as_mut() {
            replacement.supersede(&current.image_ref);
        }
        let input = UpdateOffer {
            title,
            description,
            image_ref: replacement.as_ref().map(|r| r.new_ref().to_string()),
            item_ids,
        };
        let offer = OfferRepo::update(&mut *tx, id, &input)
            .await?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await?;
        Ok::<_, AppError>(offer)
    }
    .await;

    let updated = match result {
        Ok(offer) => offer,
        Err(e) => {
            if let Some(replacement) = replacement {
                replacement.rollback(&state.assets).await;
            }
            return Err(e);
        }
    };
    if let Some(replacement) = replacement {
        replacement.commit(&state.assets).await;
    }

    tracing::info!(offer_id = id, user_id = admin.user_id, "Offer updated");
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/offers/{id}
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let offer = OfferRepo::delete(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    state.assets.release(&offer.image_ref).await;

    tracing::info!(offer_id = id, user_id = admin.user_id, "Offer deleted");
    Ok(StatusCode::NO_CONTENT)
}

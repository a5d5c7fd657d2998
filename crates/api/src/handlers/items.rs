//! Handlers for the `/items` resource and the featured / popular / deals
//! listings.
//!
//! Item writes arrive as `multipart/form-data`:
//!
//! | Field          | Kind              | Notes                                  |
//! |----------------|-------------------|----------------------------------------|
//! | `name`         | text              | required on create                     |
//! | `description`  | text              | required on create                     |
//! | `price`        | text (number)     | required on create                     |
//! | `category_id`  | text (id)         | required on create, must exist         |
//! | `sizes`        | text (JSON array) | `[{name, price}]`                      |
//! | `temperatures` | text (JSON array) | `[{name, price}]`                      |
//! | `addons`       | text (JSON array) | `[{name, price, image_ref, image_name}]` |
//! | `is_featured`  | text (bool)       | subject to the featured quota          |
//! | `is_deal`      | text (bool)       |                                        |
//! | `item_type`    | text              | `veg` or `non-veg`                     |
//! | `image`        | file              | required on create                     |
//! | `addon_image`  | file, repeatable  | file name matched to `image_name`      |

use std::collections::{HashMap, HashSet};

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bistro_core::assets::manager::{item_owned_refs, released_refs, StagedUploads};
use bistro_core::assets::upload::{Upload, PREFIX_ADDONS, PREFIX_ITEMS};
use bistro_core::catalog::{
    attach_addon_images, has_addon_with_hint, retain_owned_addon_images, validate_addons,
    validate_item_type, validate_price, validate_required_text, validate_variants, Addon,
    FeaturedChange, FeaturedSlot, Variant, MAX_DESCRIPTION_LENGTH, MAX_FEATURED_ITEMS,
    MAX_NAME_LENGTH, POPULAR_ITEMS_LIMIT,
};
use bistro_core::error::CoreError;
use bistro_core::types::DbId;
use bistro_db::models::item::{CreateItem, Item, ItemWithCategory, UpdateItem};
use bistro_db::repositories::{CategoryRepo, ItemRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::multipart::MultipartForm;
use crate::query::{PaginationParams, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Form parsing
// ---------------------------------------------------------------------------

/// Item fields as sent by the client, validated but not yet persisted.
#[derive(Debug, Default)]
struct ItemForm {
    name: Option<String>,
    description: Option<String>,
    price: Option<f64>,
    category_id: Option<DbId>,
    sizes: Option<Vec<Variant>>,
    temperatures: Option<Vec<Variant>>,
    addons: Option<Vec<Addon>>,
    is_featured: Option<bool>,
    is_deal: Option<bool>,
    item_type: Option<String>,
}

impl ItemForm {
    /// Parse and validate every field present in `form`.
    fn parse(form: &MultipartForm) -> Result<Self, CoreError> {
        let parsed = Self {
            name: form.text("name").map(str::to_string),
            description: form.text("description").map(str::to_string),
            price: form.parse("price")?,
            category_id: form.parse("category_id")?,
            sizes: form.json_array("sizes")?,
            temperatures: form.json_array("temperatures")?,
            addons: form.json_array("addons")?,
            is_featured: form.flag("is_featured")?,
            is_deal: form.flag("is_deal")?,
            item_type: form.text("item_type").map(str::to_string),
        };

        if let Some(name) = &parsed.name {
            validate_required_text("name", name, MAX_NAME_LENGTH)?;
        }
        if let Some(description) = &parsed.description {
            validate_required_text("description", description, MAX_DESCRIPTION_LENGTH)?;
        }
        if let Some(price) = parsed.price {
            validate_price("price", price)?;
        }
        if let Some(sizes) = &parsed.sizes {
            validate_variants("sizes", sizes)?;
        }
        if let Some(temperatures) = &parsed.temperatures {
            validate_variants("temperatures", temperatures)?;
        }
        if let Some(addons) = &parsed.addons {
            validate_addons(addons)?;
        }
        if let Some(item_type) = &parsed.item_type {
            validate_item_type(item_type)?;
        }
        for image in form.addon_images.iter().chain(form.image.as_ref()) {
            if image.file_name.trim().is_empty() {
                return Err(CoreError::Validation("Uploaded file requires a name".into()));
            }
        }
        Ok(parsed)
    }

    fn require_create_fields(&self) -> Result<(), CoreError> {
        let missing = [
            ("name", self.name.is_none()),
            ("description", self.description.is_none()),
            ("price", self.price.is_none()),
            ("category_id", self.category_id.is_none()),
        ]
        .into_iter()
        .find(|(_, missing)| *missing);

        match missing {
            Some((field, _)) => Err(CoreError::Validation(format!("{field} is required"))),
            None => Ok(()),
        }
    }
}

/// Addon image uploads whose file name matches a hint in `addons`.
///
/// Files matching no addon are never uploaded.
fn matching_addon_images<'a>(uploads: &'a [Upload], addons: &[Addon]) -> Vec<&'a Upload> {
    uploads
        .iter()
        .filter(|u| has_addon_with_hint(addons, u.file_name.trim()))
        .collect()
}

async fn ensure_category_exists(state: &AppState, category_id: DbId) -> AppResult<()> {
    if !CategoryRepo::exists(&state.pool, category_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id: category_id,
        }));
    }
    Ok(())
}

/// Upload the main image (if any) and matching addon images, recording every
/// new blob in `staged`.
async fn upload_images(
    state: &AppState,
    image: Option<&Upload>,
    addon_images: &[&Upload],
    staged: &mut StagedUploads,
) -> AppResult<(Option<String>, HashMap<String, String>)> {
    let main = match image {
        Some(upload) => {
            let url = state.assets.upload(PREFIX_ITEMS, upload).await?;
            staged.push(url.clone());
            Some(url)
        }
        None => None,
    };

    let mut addon_urls = HashMap::new();
    for upload in addon_images {
        let url = state.assets.upload(PREFIX_ADDONS, upload).await?;
        staged.push(url.clone());
        addon_urls.insert(upload.file_name.trim().to_string(), url);
    }
    Ok((main, addon_urls))
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// POST /api/v1/items
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<ItemWithCategory>>)> {
    let form = MultipartForm::collect(multipart).await?;
    let fields = ItemForm::parse(&form)?;
    fields.require_create_fields()?;
    let image = form.required_image()?;
    state.assets.validate(image)?;

    let mut addons = fields.addons.clone().unwrap_or_default();
    for addon in &mut addons {
        // New items own no blobs yet.
        addon.image_ref = None;
    }
    let addon_images = matching_addon_images(&form.addon_images, &addons);
    for upload in &addon_images {
        state.assets.validate(upload)?;
    }

    let category_id = fields.category_id.unwrap_or_default();
    ensure_category_exists(&state, category_id).await?;

    let mut staged = StagedUploads::new();
    let result = async {
        let (main, addon_urls) =
            upload_images(&state, Some(image), &addon_images, &mut staged).await?;
        attach_addon_images(&mut addons, &addon_urls);

        let mut tx = state.pool.begin().await?;
        let featured = if fields.is_featured == Some(true) {
            let elsewhere = ItemRepo::lock_featured_count(&mut *tx, None).await?;
            Some(FeaturedSlot::reserve(elsewhere)?)
        } else {
            None
        };

        let input = CreateItem {
            name: fields.name.clone().unwrap_or_default(),
            description: fields.description.clone().unwrap_or_default(),
            image_ref: main.unwrap_or_default(),
            price: fields.price.unwrap_or_default(),
            category_id,
            sizes: fields.sizes.clone().unwrap_or_default(),
            temperatures: fields.temperatures.clone().unwrap_or_default(),
            addons,
            featured,
            is_deal: fields.is_deal.unwrap_or(false),
            item_type: fields.item_type.clone(),
        };
        let item = ItemRepo::create(&mut *tx, &input).await?;
        tx.commit().await?;
        Ok::<Item, AppError>(item)
    }
    .await;

    let item = match result {
        Ok(item) => {
            staged.keep();
            item
        }
        Err(e) => {
            staged.rollback(&state.assets).await;
            return Err(e);
        }
    };

    tracing::info!(item_id = item.id, user_id = admin.user_id, "Item created");
    let data = with_category(&state, item).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// PUT /api/v1/items/{id}
///
/// Partial update. A new `image` replaces the main image. When `addons` is
/// sent it replaces the addon list: echoed `image_ref`s the item already
/// owns are kept, others are dropped, and `addon_image` files bind by hint.
/// Blobs no longer referenced after the write are released.
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<ItemWithCategory>>> {
    let form = MultipartForm::collect(multipart).await?;
    let fields = ItemForm::parse(&form)?;
    if let Some(image) = &form.image {
        state.assets.validate(image)?;
    }

    let existing = ItemRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Item", id }))?;

    let hint_source = fields.addons.as_deref().unwrap_or(&existing.addons.0);
    let addon_images = matching_addon_images(&form.addon_images, hint_source);
    for upload in &addon_images {
        state.assets.validate(upload)?;
    }

    if let Some(category_id) = fields.category_id {
        ensure_category_exists(&state, category_id).await?;
    }

    let mut staged = StagedUploads::new();
    let result = async {
        let (main, addon_urls) =
            upload_images(&state, form.image.as_ref(), &addon_images, &mut staged).await?;

        let mut tx = state.pool.begin().await?;
        let current = ItemRepo::find_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound { entity: "Item", id }))?;

        let featured = match fields.is_featured {
            Some(true) => {
                let elsewhere = ItemRepo::lock_featured_count(&mut *tx, Some(id)).await?;
                FeaturedChange::Set(FeaturedSlot::reserve(elsewhere)?)
            }
            Some(false) => FeaturedChange::Clear,
            None => FeaturedChange::Unchanged,
        };

        let before = item_owned_refs(Some(&current.image_ref), &current.addons.0);
        let addons = match &fields.addons {
            Some(requested) => {
                let owned: HashSet<String> = current
                    .addons
                    .0
                    .iter()
                    .filter_map(|a| a.image_ref.clone())
                    .collect();
                let mut addons = requested.clone();
                retain_owned_addon_images(&mut addons, &owned);
                attach_addon_images(&mut addons, &addon_urls);
                Some(addons)
            }
            None if !addon_urls.is_empty() => {
                let mut addons = current.addons.0.clone();
                attach_addon_images(&mut addons, &addon_urls);
                Some(addons)
            }
            None => None,
        };

        let input = UpdateItem {
            name: fields.name.clone(),
            description: fields.description.clone(),
            image_ref: main,
            price: fields.price,
            category_id: fields.category_id,
            sizes: fields.sizes.clone(),
            temperatures: fields.temperatures.clone(),
            addons,
            featured,
            is_deal: fields.is_deal,
            item_type: fields.item_type.clone(),
        };
        let item = ItemRepo::update(&mut *tx, id, &input)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound { entity: "Item", id }))?;
        tx.commit().await?;

        let after = item_owned_refs(Some(&item.image_ref), &item.addons.0);
        Ok::<_, AppError>((item, released_refs(&before, &after)))
    }
    .await;

    let (item, released) = match result {
        Ok(done) => {
            staged.keep();
            done
        }
        Err(e) => {
            staged.rollback(&state.assets).await;
            return Err(e);
        }
    };
    state.assets.release_all(&released).await;

    tracing::info!(
        item_id = id,
        user_id = admin.user_id,
        released = released.len(),
        "Item updated"
    );
    let data = with_category(&state, item).await?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/items/{id}
///
/// Removes the item (its reviews cascade) and releases the main image and
/// every addon image exactly once.
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let item = ItemRepo::delete(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Item", id }))?;

    let owned = item_owned_refs(Some(&item.image_ref), &item.addons.0);
    state.assets.release_all(&owned).await;

    tracing::info!(
        item_id = id,
        user_id = admin.user_id,
        released = owned.len(),
        "Item deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

async fn with_category(state: &AppState, item: Item) -> AppResult<ItemWithCategory> {
    let mut listed = ItemRepo::with_categories(&state.pool, vec![item]).await?;
    listed
        .pop()
        .ok_or_else(|| AppError::InternalError("Item lost while loading category".into()))
}

/// GET /api/v1/items
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<ItemWithCategory>>>> {
    let items = ItemRepo::list(
        &state.pool,
        params.limit(DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
        params.offset(),
    )
    .await?;
    let data = ItemRepo::with_categories(&state.pool, items).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/items/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ItemWithCategory>>> {
    let item = ItemRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Item", id }))?;
    let data = with_category(&state, item).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/items/category/{category_id}
pub async fn list_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ItemWithCategory>>>> {
    ensure_category_exists(&state, category_id).await?;
    let items = ItemRepo::list_by_category(&state.pool, category_id).await?;
    let data = ItemRepo::with_categories(&state.pool, items).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/featured
pub async fn featured(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ItemWithCategory>>>> {
    let items = ItemRepo::list_featured(&state.pool, MAX_FEATURED_ITEMS).await?;
    let data = ItemRepo::with_categories(&state.pool, items).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/popular
pub async fn popular(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ItemWithCategory>>>> {
    let items = ItemRepo::list_popular(&state.pool, POPULAR_ITEMS_LIMIT).await?;
    let data = ItemRepo::with_categories(&state.pool, items).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/deals
pub async fn deals(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ItemWithCategory>>>> {
    let items = ItemRepo::list_deals(&state.pool).await?;
    let data = ItemRepo::with_categories(&state.pool, items).await?;
    Ok(Json(DataResponse { data }))
}

//! Handlers for the `/categories` resource.
//!
//! Writes arrive as `multipart/form-data` with a `name` field and an `image`
//! file.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use bistro_core::assets::upload::PREFIX_CATEGORIES;
use bistro_core::catalog::{validate_required_text, MAX_NAME_LENGTH};
use bistro_core::error::CoreError;
use bistro_core::types::DbId;
use bistro_db::models::category::{Category, CreateCategory, UpdateCategory};
use bistro_db::repositories::CategoryRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::multipart::MultipartForm;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Category",
        id,
    })
}

/// POST /api/v1/categories
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Category>>)> {
    let form = MultipartForm::collect(multipart).await?;
    let name = form.required_text("name")?;
    validate_required_text("name", &name, MAX_NAME_LENGTH)?;
    let image = form.required_image()?;
    state.assets.validate(image)?;

    let image_ref = state.assets.upload(PREFIX_CATEGORIES, image).await?;
    let input = CreateCategory {
        name,
        image_ref: image_ref.clone(),
    };

    let category = match CategoryRepo::create(&state.pool, &input).await {
        Ok(category) => category,
        Err(e) => {
            state.assets.release(&image_ref).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        category_id = category.id,
        user_id = admin.user_id,
        "Category created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// GET /api/v1/categories
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Category>>>> {
    let categories = CategoryRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: categories }))
}

/// GET /api/v1/categories/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Category>>> {
    let category = CategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: category }))
}

/// PUT /api/v1/categories/{id}
///
/// Optional `name` and `image`. A new image replaces the old one, which is
/// released only after the row points at the new blob.
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<Category>>> {
    let form = MultipartForm::collect(multipart).await?;
    let name = form.text("name").map(str::to_string);
    if let Some(name) = &name {
        validate_required_text("name", name, MAX_NAME_LENGTH)?;
    }
    if let Some(image) = &form.image {
        state.assets.validate(image)?;
    }

    CategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let mut replacement = match &form.image {
        Some(image) => Some(state.assets.stage(PREFIX_CATEGORIES, None, image).await?),
        None => None,
    };

    // The old image is read under the row lock so concurrent replacements
    // each release exactly the image they overwrote.
    let result = async {
        let mut tx = state.pool.begin().await?;
        let current = CategoryRepo::find_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found(id))?;
        if let Some(replacement) = replacement.as_mut() {
            replacement.supersede(&current.image_ref);
        }
        let input = UpdateCategory {
            name,
            image_ref: replacement.as_ref().map(|r| r.new_ref().to_string()),
        };
        let category = CategoryRepo::update(&mut *tx, id, &input)
            .await?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await?;
        Ok::<_, AppError>(category)
    }
    .await;

    let updated = match result {
        Ok(category) => category,
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

    tracing::info!(category_id = id, user_id = admin.user_id, "Category updated");
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/categories/{id}
///
/// Items in the category keep their `category_id`.
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let category = CategoryRepo::delete(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    state.assets.release(&category.image_ref).await;

    tracing::info!(category_id = id, user_id = admin.user_id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

//! Handlers for the `/sliders` resource (home-screen banners).

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use bistro_core::assets::upload::PREFIX_SLIDERS;
use bistro_core::catalog::MAX_DESCRIPTION_LENGTH;
use bistro_core::error::CoreError;
use bistro_core::types::DbId;
use bistro_db::models::slider::{CreateSlider, Slider, UpdateSlider};
use bistro_db::repositories::SliderRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::multipart::MultipartForm;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Slider", id })
}

fn validate_text(text: &str) -> Result<(), CoreError> {
    if text.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "text must be at most {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

/// POST /api/v1/sliders
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Slider>>)> {
    let form = MultipartForm::collect(multipart).await?;
    let text = form.text("text").unwrap_or_default().to_string();
    validate_text(&text)?;
    let is_active = form.flag("is_active")?.unwrap_or(true);
    let position: i32 = form.parse("position")?.unwrap_or(0);
    let image = form.required_image()?;
    state.assets.validate(image)?;

    let image_ref = state.assets.upload(PREFIX_SLIDERS, image).await?;
    let input = CreateSlider {
        text,
        image_ref: image_ref.clone(),
        is_active,
        position,
    };
    let slider = match SliderRepo::create(&state.pool, &input).await {
        Ok(slider) => slider,
        Err(e) => {
            state.assets.release(&image_ref).await;
            return Err(e.into());
        }
    };

    tracing::info!(slider_id = slider.id, user_id = admin.user_id, "Slider created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: slider })))
}

/// GET /api/v1/sliders
///
/// Active sliders ordered by `position`.
pub async fn list_active(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Slider>>>> {
    let sliders = SliderRepo::list_active(&state.pool).await?;
    Ok(Json(DataResponse { data: sliders }))
}

/// GET /api/v1/sliders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Slider>>> {
    let slider = SliderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: slider }))
}

/// PUT /api/v1/sliders/{id}
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<Slider>>> {
    let form = MultipartForm::collect(multipart).await?;
    let text = form.text("text").map(str::to_string);
    if let Some(text) = &text {
        validate_text(text)?;
    }
    let is_active = form.flag("is_active")?;
    let position: Option<i32> = form.parse("position")?;
    if let Some(image) = &form.image {
        state.assets.validate(image)?;
    }

    SliderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let mut replacement = match &form.image {
        Some(image) => Some(state.assets.stage(PREFIX_SLIDERS, None, image).await?),
        None => None,
    };

    // The old image is read under the row lock so concurrent replacements
    // each release exactly the image they overwrote.
    let result = async {
        let mut tx = state.pool.begin().await?;
        let current = SliderRepo::find_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found(id))?;
        if let Some(replacement) = replacement.as_mut() {
            replacement.supersede(&current.image_ref);
        }
        let input = UpdateSlider {
            text,
            image_ref: replacement.as_ref().map(|r| r.new_ref().to_string()),
            is_active,
            position,
        };
        let slider = SliderRepo::update(&mut *tx, id, &input)
            .await?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await?;
        Ok::<_, AppError>(slider)
    }
    .await;

    let updated = match result {
        Ok(slider) => slider,
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

    tracing::info!(slider_id = id, user_id = admin.user_id, "Slider updated");
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/sliders/{id}
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let slider = SliderRepo::delete(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    state.assets.release(&slider.image_ref).await;

    tracing::info!(slider_id = id, user_id = admin.user_id, "Slider deleted");
    Ok(StatusCode::NO_CONTENT)
}

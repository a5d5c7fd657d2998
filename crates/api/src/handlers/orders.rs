//! Handlers for the `/orders` resource.
//!
//! Placing an order validates every line against the current catalog,
//! increments sell counts and inserts the order in one transaction.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bistro_core::error::CoreError;
use bistro_core::order::{
    validate_line_variants, validate_lines, validate_status_change, validate_total_price,
    DeliveryType, OrderLine, OrderStatus, PaymentStatus,
};
use bistro_core::roles::ROLE_ADMIN;
use bistro_core::types::DbId;
use bistro_db::models::item::ItemVariants;
use bistro_db::models::order::{CreateOrder, Order, OrderWithItems, UpdateOrder};
use bistro_db::repositories::{ItemRepo, OrderRepo, UserRepo};
use serde::Deserialize;
use sqlx::PgConnection;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::{OrderListParams, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /orders`. The buyer is the token subject.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderLine>,
    pub total_price: f64,
    pub delivery_type: Option<String>,
}

/// Request body for `PUT /orders/{id}`. Every field is optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrderRequest {
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Option<Vec<OrderLine>>,
    pub total_price: Option<f64>,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    #[validate(email)]
    pub user_email: Option<String>,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Order", id })
}

/// Check each line against its item's current variants and return the
/// normalized snapshots to persist.
async fn snapshot_lines(
    conn: &mut PgConnection,
    lines: &[OrderLine],
) -> AppResult<Vec<OrderLine>> {
    let mut ids: Vec<DbId> = lines.iter().map(|l| l.item_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let variants: HashMap<DbId, ItemVariants> = ItemRepo::variants_for(conn, &ids)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    lines
        .iter()
        .map(|line| -> AppResult<OrderLine> {
            let item = variants.get(&line.item_id).ok_or(CoreError::NotFound {
                entity: "Item",
                id: line.item_id,
            })?;
            validate_line_variants(line, &item.sizes.0, &item.temperatures.0)?;
            Ok(line.snapshot())
        })
        .collect()
}

async fn with_items(state: &AppState, order: Order) -> AppResult<OrderWithItems> {
    let mut ids: Vec<DbId> = order.line_items.0.iter().map(|l| l.item_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let items = ItemRepo::find_by_ids(&state.pool, &ids).await?;
    let items = ItemRepo::with_categories(&state.pool, items).await?;
    Ok(OrderWithItems { order, items })
}

/// POST /api/v1/orders
///
/// All sell-count increments and the order insert commit together; a
/// failure on any line leaves no trace.
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<OrderWithItems>>)> {
    input.validate()?;
    validate_lines(&input.items)?;
    validate_total_price(input.total_price)?;
    let delivery_type = input
        .delivery_type
        .as_deref()
        .ok_or_else(|| CoreError::Validation("delivery_type is required".into()))
        .and_then(DeliveryType::parse)?;

    UserRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user.user_id,
        }))?;

    let mut tx = state.pool.begin().await?;
    let line_items = snapshot_lines(&mut tx, &input.items).await?;

    for line in &line_items {
        ItemRepo::increment_sell_count(&mut tx, line.item_id, i64::from(line.quantity)).await?;
    }

    let order = OrderRepo::create(
        &mut tx,
        &CreateOrder {
            user_id: user.user_id,
            line_items,
            total_price: input.total_price,
            delivery_type,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        order_id = order.id,
        user_id = user.user_id,
        lines = order.line_items.0.len(),
        "Order placed"
    );
    let data = with_items(&state, order).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// GET /api/v1/orders
///
/// Optional `status` filter plus `limit` / `offset`.
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> AppResult<Json<DataResponse<Vec<Order>>>> {
    let status = params
        .status
        .as_deref()
        .map(OrderStatus::parse)
        .transpose()?;
    let page = params.pagination();
    let orders = OrderRepo::list(
        &state.pool,
        status,
        page.limit(DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
        page.offset(),
    )
    .await?;
    Ok(Json(DataResponse { data: orders }))
}

/// GET /api/v1/orders/{id}
///
/// Admins see any order; other users only their own.
pub async fn get_by_id(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OrderWithItems>>> {
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if order.user_id != user.user_id && user.role != ROLE_ADMIN {
        return Err(not_found(id));
    }
    let data = with_items(&state, order).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/orders/{id}
///
/// Partial update. `status` must be a legal lifecycle step from the
/// current status; `payment_status` moves independently. Replacing `items`
/// re-validates variants but never touches sell counts.
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateOrderRequest>,
) -> AppResult<Json<DataResponse<OrderWithItems>>> {
    input.validate()?;
    if let Some(items) = &input.items {
        validate_lines(items)?;
    }
    if let Some(total_price) = input.total_price {
        validate_total_price(total_price)?;
    }
    let payment_status = input
        .payment_status
        .as_deref()
        .map(PaymentStatus::parse)
        .transpose()?;

    let user_id = match &input.user_email {
        Some(email) => Some(
            UserRepo::find_by_email(&state.pool, email)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("No user with email {email}")))?
                .id,
        ),
        None => None,
    };

    let mut tx = state.pool.begin().await?;
    let current = OrderRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let status = input
        .status
        .as_deref()
        .map(|target| validate_status_change(&current.status, target))
        .transpose()?;

    let line_items = match &input.items {
        Some(items) => Some(snapshot_lines(&mut tx, items).await?),
        None => None,
    };

    let changes = UpdateOrder {
        user_id,
        line_items,
        total_price: input.total_price,
        status,
        payment_status,
    };
    let order = OrderRepo::update(&mut tx, id, &changes)
        .await?
        .ok_or_else(|| not_found(id))?;
    tx.commit().await?;

    tracing::info!(
        order_id = id,
        user_id = admin.user_id,
        from_status = %current.status,
        to_status = %order.status,
        "Order updated"
    );
    let data = with_items(&state, order).await?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/orders/{id}
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !OrderRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    tracing::info!(order_id = id, user_id = admin.user_id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

//! HTTP-level integration tests for placing and managing orders.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_category, create_item, delete_auth, get, get_auth, item_form,
    post_json_auth, put_json_auth, seed_user, TestApp,
};
use serde_json::json;
use sqlx::PgPool;

/// A category with one item offering sizes Small/Large and temperature Hot.
async fn seed_menu(app: &TestApp) -> i64 {
    let category_id = create_category(app, "Coffee").await;
    let form = item_form("Latte", category_id)
        .text("sizes", r#"[{"name":"Small","price":0},{"name":"Large","price":1}]"#)
        .text("temperatures", r#"[{"name":"Hot","price":0}]"#);
    create_item(app, form).await["id"].as_i64().unwrap()
}

async fn sell_count(app: &TestApp, item_id: i64) -> i64 {
    let response = get(app.app(), &format!("/api/v1/items/{item_id}")).await;
    body_json(response).await["data"]["sell_count"].as_i64().unwrap()
}

async fn place_order(app: &TestApp, user_id: i64, body: serde_json::Value) -> axum::response::Response {
    post_json_auth(app.app(), "/api/v1/orders", body, &app.user_token(user_id)).await
}

// ---------------------------------------------------------------------------
// Placing orders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_order_increments_sell_count_by_quantity(pool: PgPool) {
    let user = seed_user(&pool, "buyer@test.com").await;
    let app = common::build_test_app(pool);
    let item_id = seed_menu(&app).await;

    let response = place_order(
        &app,
        user.id,
        json!({
            "items": [
                {"item_id": item_id, "quantity": 2, "size": "Large", "temperature": "Hot"},
                {"item_id": item_id, "quantity": 1, "size": "", "special_instructions": "extra hot"}
            ],
            "total_price": 12.5,
            "delivery_type": "takeaway"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["payment_status"], "unpaid");
    assert_eq!(json["data"]["user_id"], user.id);
    assert_eq!(json["data"]["line_items"][0]["size"], "Large");
    assert_eq!(json["data"]["items"][0]["name"], "Latte");
    assert_eq!(sell_count(&app, item_id).await, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_size_rejects_whole_order(pool: PgPool) {
    let user = seed_user(&pool, "buyer@test.com").await;
    let app = common::build_test_app(pool);
    let item_id = seed_menu(&app).await;

    let response = place_order(
        &app,
        user.id,
        json!({
            "items": [
                {"item_id": item_id, "quantity": 1, "size": "Small"},
                {"item_id": item_id, "quantity": 1, "size": "Venti"}
            ],
            "total_price": 8,
            "delivery_type": "delivery"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_VARIANT");
    assert_eq!(sell_count(&app, item_id).await, 0);

    let response = get_auth(app.app(), "/api/v1/orders", &app.admin_token()).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_item_returns_404(pool: PgPool) {
    let user = seed_user(&pool, "buyer@test.com").await;
    let app = common::build_test_app(pool);

    let response = place_order(
        &app,
        user.id,
        json!({
            "items": [{"item_id": 424242, "quantity": 1}],
            "total_price": 5,
            "delivery_type": "delivery"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_order_input_validation(pool: PgPool) {
    let user = seed_user(&pool, "buyer@test.com").await;
    let app = common::build_test_app(pool);
    let item_id = seed_menu(&app).await;

    let cases = [
        json!({"items": [], "total_price": 5, "delivery_type": "delivery"}),
        json!({"items": [{"item_id": item_id, "quantity": 1}], "total_price": 0, "delivery_type": "delivery"}),
        json!({"items": [{"item_id": item_id, "quantity": 1}], "total_price": 5, "delivery_type": "drone"}),
        json!({"items": [{"item_id": item_id, "quantity": 1}], "total_price": 5}),
        json!({"items": [{"item_id": item_id, "quantity": 0}], "total_price": 5, "delivery_type": "delivery"}),
    ];
    for body in cases {
        let response = place_order(&app, user.id, body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }

    // Bodies that do not deserialize still get the JSON error envelope.
    let malformed = [
        json!({"items": [{"item_id": item_id, "quantity": 1}], "delivery_type": "delivery"}),
        json!({"items": [{"item_id": item_id, "quantity": 1}], "total_price": "five", "delivery_type": "delivery"}),
        json!({"items": {"item_id": item_id}, "total_price": 5, "delivery_type": "delivery"}),
    ];
    for body in malformed {
        let response = place_order(&app, user.id, body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        let error = body_json(response).await;
        assert_eq!(error["code"], "BAD_REQUEST", "{body}");
        assert!(error["message"].is_string(), "{body}");
    }
    assert_eq!(sell_count(&app, item_id).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_token_for_missing_user_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let item_id = seed_menu(&app).await;

    let response = place_order(
        &app,
        987_654,
        json!({
            "items": [{"item_id": item_id, "quantity": 1}],
            "total_price": 5,
            "delivery_type": "delivery"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(sell_count(&app, item_id).await, 0);
}

// ---------------------------------------------------------------------------
// Managing orders
// ---------------------------------------------------------------------------

async fn placed_order(app: &TestApp, user_id: i64, item_id: i64) -> i64 {
    let response = place_order(
        app,
        user_id,
        json!({
            "items": [{"item_id": item_id, "quantity": 1, "size": "Small"}],
            "total_price": 4.5,
            "delivery_type": "delivery"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_status_follows_lifecycle(pool: PgPool) {
    let user = seed_user(&pool, "buyer@test.com").await;
    let app = common::build_test_app(pool);
    let item_id = seed_menu(&app).await;
    let order_id = placed_order(&app, user.id, item_id).await;
    let uri = format!("/api/v1/orders/{order_id}");

    let response = put_json_auth(app.app(), &uri, json!({"status": "delivered"}), &app.admin_token()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(app.app(), &uri, json!({"status": "accept"}), &app.admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "accept");

    let response = put_json_auth(app.app(), &uri, json!({"status": "returned"}), &app.admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put_json_auth(app.app(), &uri, json!({"status": "pending"}), &app.admin_token()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_items_revalidates_without_counting_sales(pool: PgPool) {
    let user = seed_user(&pool, "buyer@test.com").await;
    let app = common::build_test_app(pool);
    let item_id = seed_menu(&app).await;
    let order_id = placed_order(&app, user.id, item_id).await;
    let uri = format!("/api/v1/orders/{order_id}");

    let bad = json!({"items": [{"item_id": item_id, "quantity": 3, "temperature": "Iced"}]});
    let response = put_json_auth(app.app(), &uri, bad, &app.admin_token()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let good = json!({
        "items": [{"item_id": item_id, "quantity": 3, "size": "Large"}],
        "total_price": 16.5,
        "payment_status": "paid"
    });
    let response = put_json_auth(app.app(), &uri, good, &app.admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["line_items"][0]["quantity"], 3);
    assert_eq!(json["data"]["payment_status"], "paid");
    assert_eq!(json["data"]["status"], "pending");

    assert_eq!(sell_count(&app, item_id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reassign_by_email(pool: PgPool) {
    let buyer = seed_user(&pool, "buyer@test.com").await;
    let other = seed_user(&pool, "other@test.com").await;
    let app = common::build_test_app(pool);
    let item_id = seed_menu(&app).await;
    let order_id = placed_order(&app, buyer.id, item_id).await;
    let uri = format!("/api/v1/orders/{order_id}");

    let response = put_json_auth(
        app.app(),
        &uri,
        json!({"user_email": "nobody@test.com"}),
        &app.admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = put_json_auth(
        app.app(),
        &uri,
        json!({"user_email": "Other@Test.com"}),
        &app.admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["user_id"], other.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_order_visibility_and_admin_routes(pool: PgPool) {
    let buyer = seed_user(&pool, "buyer@test.com").await;
    let other = seed_user(&pool, "other@test.com").await;
    let app = common::build_test_app(pool);
    let item_id = seed_menu(&app).await;
    let order_id = placed_order(&app, buyer.id, item_id).await;
    let uri = format!("/api/v1/orders/{order_id}");

    let response = get_auth(app.app(), &uri, &app.user_token(buyer.id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(app.app(), &uri, &app.user_token(other.id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(app.app(), "/api/v1/orders", &app.user_token(buyer.id)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app.app(), "/api/v1/orders?status=accept", &app.admin_token()).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());

    let response = get_auth(app.app(), "/api/v1/orders?status=bogus", &app.admin_token()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = delete_auth(app.app(), &uri, &app.admin_token()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = delete_auth(app.app(), &uri, &app.admin_token()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

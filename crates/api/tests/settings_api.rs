//! HTTP-level integration tests for the restaurant settings record.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete_auth, get, post_json, post_json_auth, put_json_auth};
use serde_json::json;
use sqlx::PgPool;

fn full_settings() -> serde_json::Value {
    json!({
        "restaurant_name": "Bistro Nord",
        "contact_phone": "+1 555 0100",
        "address": "1 Harbour Road",
        "opening_hours": "08:00-22:00",
        "payment_gateway": {"type": "stripe", "api_key": "pk_test", "secret_key": "sk_test"}
    })
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_settings_writes_require_admin(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app.app(), "/api/v1/settings", full_settings()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json_auth(
        app.app(),
        "/api/v1/settings",
        full_settings(),
        &app.user_token(7),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_public_view_hides_gateway(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app.app(), "/api/v1/settings").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response =
        post_json_auth(app.app(), "/api/v1/settings", full_settings(), &app.admin_token()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["payment_gateway"]["type"], "stripe");

    let response = get(app.app(), "/api/v1/settings").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["restaurant_name"], "Bistro Nord");
    assert!(json["data"].get("payment_gateway").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_post_replaces_existing_record(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = app.admin_token();

    post_json_auth(app.app(), "/api/v1/settings", full_settings(), &token).await;
    let response = post_json_auth(
        app.app(),
        "/api/v1/settings",
        json!({
            "restaurant_name": "Bistro Sud",
            "contact_phone": "+1 555 0199",
            "address": "9 Quay Street",
            "opening_hours": "10:00-23:00"
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["restaurant_name"], "Bistro Sud");
    assert_eq!(json["data"]["payment_gateway"]["type"], "none");
    assert_eq!(json["data"]["payment_gateway"]["api_key"], "");

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_settings_validation(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = app.admin_token();

    let mut missing_phone = full_settings();
    missing_phone.as_object_mut().unwrap().remove("contact_phone");
    let mut bad_gateway = full_settings();
    bad_gateway["payment_gateway"]["type"] = json!("bitcoin");

    for body in [missing_phone, bad_gateway, json!({"restaurant_name": 42})] {
        let response = post_json_auth(app.app(), "/api/v1/settings", body.clone(), &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }

    // Partial updates need an existing record and at least one field.
    let response = put_json_auth(
        app.app(),
        "/api/v1/settings",
        json!({"address": "2 Harbour Road"}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    post_json_auth(app.app(), "/api/v1/settings", full_settings(), &token).await;
    let response = put_json_auth(app.app(), "/api/v1/settings", json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_partial_update_and_reset(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = app.admin_token();
    post_json_auth(app.app(), "/api/v1/settings", full_settings(), &token).await;

    let response = put_json_auth(
        app.app(),
        "/api/v1/settings",
        json!({"opening_hours": "09:00-21:00", "payment_gateway": {"type": "paypal"}}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["opening_hours"], "09:00-21:00");
    assert_eq!(json["data"]["address"], "1 Harbour Road");
    assert_eq!(json["data"]["payment_gateway"]["type"], "paypal");
    assert_eq!(json["data"]["payment_gateway"]["api_key"], "pk_test");

    let response = delete_auth(app.app(), "/api/v1/settings", &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = delete_auth(app.app(), "/api/v1/settings", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = get(app.app(), "/api/v1/settings").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use bistro_api::auth::jwt::{generate_access_token, JwtConfig};
use bistro_api::config::{BlobBackend, ServerConfig};
use bistro_api::router::build_app_router;
use bistro_api::state::AppState;
use bistro_core::assets::memory::MemoryBlobStore;
use bistro_core::assets::upload::DEFAULT_MAX_UPLOAD_BYTES;
use bistro_core::roles::{ROLE_ADMIN, ROLE_USER};
use bistro_core::types::DbId;
use bistro_db::models::user::{CreateUser, User};
use bistro_db::repositories::UserRepo;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

const BOUNDARY: &str = "bistro-test-boundary";

/// Build a test `ServerConfig` with safe defaults and an in-memory blob store.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        max_request_bytes: 32 * 1024 * 1024,
        blob_backend: BlobBackend::Memory,
        blob_root: PathBuf::from("./uploads"),
        blob_public_base_url: "http://localhost/uploads".to_string(),
        jwt: JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// The router plus the recording blob store behind it.
#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryBlobStore>,
    pub config: ServerConfig,
}

impl TestApp {
    pub fn admin_token(&self) -> String {
        token(&self.config, 1, ROLE_ADMIN)
    }

    pub fn user_token(&self, user_id: DbId) -> String {
        token(&self.config, user_id, ROLE_USER)
    }

    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router, with the production middleware stack,
/// around `pool` and a fresh [`MemoryBlobStore`].
pub fn build_test_app(pool: PgPool) -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryBlobStore::new());
    let state = AppState::with_store(pool, config.clone(), store.clone());
    TestApp {
        router: build_app_router(state, &config),
        store,
        config,
    }
}

fn token(config: &ServerConfig, user_id: DbId, role: &str) -> String {
    generate_access_token(user_id, role, &config.jwt).expect("token generation should succeed")
}

/// Insert a customer directly in the database.
pub async fn seed_user(pool: &PgPool, email: &str) -> User {
    let input = CreateUser {
        email: email.to_string(),
        first_name: "Test".to_string(),
        last_name: Some("Customer".to_string()),
        phone_no: None,
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request should complete")
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, builder(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, builder(Method::GET, uri, Some(token)).body(Body::empty()).unwrap()).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, builder(Method::DELETE, uri, Some(token)).body(Body::empty()).unwrap()).await
}

async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response {
    let request = builder(method, uri, token)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::POST, uri, body, None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send_json(app, Method::POST, uri, body, Some(token)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send_json(app, Method::PUT, uri, body, Some(token)).await
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

/// A `multipart/form-data` body under construction.
#[derive(Debug, Default, Clone)]
pub struct Form {
    body: Vec<u8>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(&[0x89, b'P', b'N', b'G']);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

async fn send_form(app: Router, method: Method, uri: &str, form: Form, token: &str) -> Response {
    let request = builder(method, uri, Some(token))
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(form.finish()))
        .unwrap();
    send(app, request).await
}

pub async fn post_form(app: Router, uri: &str, form: Form, token: &str) -> Response {
    send_form(app, Method::POST, uri, form, token).await
}

pub async fn put_form(app: Router, uri: &str, form: Form, token: &str) -> Response {
    send_form(app, Method::PUT, uri, form, token).await
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a category through the API and return its id.
pub async fn create_category(app: &TestApp, name: &str) -> DbId {
    let form = Form::new().text("name", name).file("image", "category.png");
    let response = post_form(app.app(), "/api/v1/categories", form, &app.admin_token()).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Base form for an item in `category_id`; callers add optional fields.
pub fn item_form(name: &str, category_id: DbId) -> Form {
    Form::new()
        .text("name", name)
        .text("description", &format!("{name} description"))
        .text("price", "9.5")
        .text("category_id", &category_id.to_string())
        .file("image", "item.png")
}

/// Create an item through the API and return its JSON representation.
pub async fn create_item(app: &TestApp, form: Form) -> serde_json::Value {
    let response = post_form(app.app(), "/api/v1/items", form, &app.admin_token()).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::FromRef,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::common::ApiResponse;
use super::modules::health::{self, HealthState};
use super::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use super::modules::request_id::request_id_middleware;
use super::modules::users::{self, UserHandlerState};
use crate::application::AuthService;

/// Everything the HTTP layer needs. Handlers pick their own slice via `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub auth: Arc<AuthService>,
    pub db: DatabaseConnection,
    pub started_at: Arc<Instant>,
}

impl ApiState {
    pub fn new(auth: Arc<AuthService>, db: DatabaseConnection) -> Self {
        Self {
            auth,
            db,
            started_at: Arc::new(Instant::now()),
        }
    }
}

impl FromRef<ApiState> for UserHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        UserHandlerState {
            auth: Arc::clone(&s.auth),
        }
    }
}

impl FromRef<ApiState> for HealthState {
    fn from_ref(s: &ApiState) -> Self {
        HealthState {
            db: s.db.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

/// Documents the session token returned by the user endpoints
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token issued by /api/user/*"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::register,
        users::login,
        users::google_register,
        users::google_login,
    ),
    components(
        schemas(
            ApiResponse,
            users::UserDto,
            users::RegisterRequest,
            users::LoginRequest,
            health::HealthResponse,
            health::ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Users", description = "Registration, password login and Google sign-in"),
    ),
    info(
        title = "Shop Identity API",
        version = "1.0.0",
        description = "User registration and authentication for the online shop",
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes.
///
/// `/metrics` is mounted only when a Prometheus recorder handle is given.
pub fn create_api_router(state: ApiState, metrics: Option<PrometheusHandle>) -> Router {
    let user_routes = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/google-register", post(users::google_register))
        .route("/google-login", post(users::google_login));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Query strings may hold ID tokens, so spans record the path only.
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        tracing::info_span!(
            "http",
            method = %request.method(),
            path = %request.uri().path(),
        )
    });

    let mut router = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health::health_check))
        .nest("/api/user", user_routes)
        .with_state(state);

    if let Some(handle) = metrics {
        router = router.route(
            "/metrics",
            get(prometheus_metrics).with_state(MetricsState { handle }),
        );
    }

    router
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(cors)
        .layer(trace)
        .layer(middleware::from_fn(request_id_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::crypto::password::TEST_BCRYPT_COST;
    use crate::application::identity::service::tests::token_issuer;
    use crate::domain::AccountPolicy;
    use crate::infrastructure::crypto::oauth::tests::google_token;
    use crate::infrastructure::database::repositories::user_repository::tests::test_db;
    use crate::infrastructure::SeaOrmIdentityStore;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app() -> Router {
        let db = test_db().await;
        let store = Arc::new(SeaOrmIdentityStore::new(
            db.clone(),
            AccountPolicy::default(),
            TEST_BCRYPT_COST,
        ));
        let auth = Arc::new(AuthService::new(store, token_issuer(), "buyer"));
        create_api_router(ApiState::new(auth, db), None)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_token(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("{}?token={}", uri, token))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn alice_registers_then_logs_in() {
        let app = app().await;

        let (status, body) = send(
            &app,
            post_json(
                "/api/user/register",
                json!({"username": "alice", "password": "Pw1!", "email": "alice@example.com"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["email"], "alice@example.com");
        assert_eq!(body["roles"], json!(["buyer"]));
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

        let (status, body) = send(
            &app,
            post_json(
                "/api/user/register",
                json!({"username": "alice", "password": "Pw2!"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"success": false, "error": "User with this name already exists"})
        );

        let (status, body) = send(
            &app,
            post_json("/api/user/login", json!({"username": "alice", "password": "wrong"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Wrong password");

        let (status, body) = send(
            &app,
            post_json("/api/user/login", json!({"username": "alice", "password": "Pw1!"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roles"], json!(["buyer"]));
    }

    #[tokio::test]
    async fn unknown_user_is_401_with_name() {
        let app = app().await;
        let (status, body) = send(
            &app,
            post_json("/api/user/login", json!({"username": "mallory", "password": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "There is not user with username mallory");
    }

    #[tokio::test]
    async fn empty_login_username_is_401() {
        let app = app().await;
        let (status, body) = send(
            &app,
            post_json("/api/user/login", json!({"username": "", "password": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "There is not user with username ");
    }

    #[tokio::test]
    async fn policy_rejection_lists_reasons() {
        let app = app().await;
        let (status, body) = send(
            &app,
            post_json("/api/user/register", json!({"username": "bob", "password": "abc"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("Passwords must be at least 4 characters."));
        assert!(error.contains("at least one digit"));
    }

    #[tokio::test]
    async fn missing_fields_are_400() {
        let app = app().await;
        let (status, body) = send(&app, post_json("/api/user/register", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn google_register_and_login() {
        let app = app().await;
        let token = google_token(json!({"email": "bob@example.com", "email_verified": true}));

        let (status, body) = send(&app, post_token("/api/user/google-register", &token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "bob@example.com");
        assert_eq!(body["roles"], json!(["buyer"]));

        let (status, _) = send(&app, post_token("/api/user/google-register", &token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, post_token("/api/user/google-login", &token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "bob@example.com");
    }

    #[tokio::test]
    async fn bad_google_token_status_depends_on_endpoint() {
        let app = app().await;

        let (status, body) = send(&app, post_token("/api/user/google-register", "junk")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid external token");

        let (status, _) = send(&app, post_token("/api/user/google-login", "junk")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn google_login_without_account_is_401() {
        let app = app().await;
        let token = google_token(json!({"email": "carol@example.com", "email_verified": true}));
        let (status, body) = send(&app, post_token("/api/user/google-login", &token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "There is not user with username carol@example.com");
    }

    #[tokio::test]
    async fn google_token_without_verified_email_is_refused() {
        let app = app().await;
        let token = google_token(json!({"email": "dave@example.com"}));

        let (status, body) = send(&app, post_token("/api/user/google-register", &token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid external token");

        let (status, _) = send(&app, post_token("/api/user/google-login", &token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn corrupt_password_hash_is_500() {
        use sea_orm::{ConnectionTrait, DbBackend, Statement};

        let db = test_db().await;
        let store = Arc::new(SeaOrmIdentityStore::new(
            db.clone(),
            AccountPolicy::default(),
            TEST_BCRYPT_COST,
        ));
        let auth = Arc::new(AuthService::new(store, token_issuer(), "buyer"));
        let app = create_api_router(ApiState::new(auth, db.clone()), None);

        let (status, _) = send(
            &app,
            post_json("/api/user/register", json!({"username": "erin", "password": "Pw1!"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        db.execute(Statement::from_string(
            DbBackend::Sqlite,
            "UPDATE users SET password_hash = 'garbage'",
        ))
        .await
        .unwrap();

        let (status, body) = send(
            &app,
            post_json("/api/user/login", json!({"username": "erin", "password": "Pw1!"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn health_reports_database() {
        let app = app().await;
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"]["status"], "ok");
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        let app = app().await;
        let req = Request::builder()
            .uri("/health")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.headers()["x-request-id"], "abc-123");
    }

    #[test]
    fn openapi_lists_user_endpoints() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/user/register",
            "/api/user/login",
            "/api/user/google-register",
            "/api/user/google-login",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}

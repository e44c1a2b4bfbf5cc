#![allow(dead_code)]

use actix_web::{body::MessageBody, dev::ServiceResponse, http::header, test, web};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use todo_gate::auth::{
    AuthGate, LoginResponse, PasswordHasher, RegisterResponse, SessionStore, TokenIssuer,
};
use todo_gate::database;

pub const TEST_SECRET: &[u8] = b"integration-test-secret";
pub const TEST_PASSWORD: &str = "Password123!";

/// Shared application state for one test: a private in-memory database plus the gate and
/// hasher built on top of it.
pub struct TestState {
    pub pool: web::Data<SqlitePool>,
    pub gate: web::Data<AuthGate>,
    pub hasher: web::Data<PasswordHasher>,
}

impl TestState {
    pub async fn new() -> Self {
        let pool = database::connect_in_memory()
            .await
            .expect("Failed to open in-memory database");
        let gate = AuthGate::new(TokenIssuer::new(TEST_SECRET), SessionStore::new(pool.clone()));

        TestState {
            pool: web::Data::new(pool),
            gate: web::Data::new(gate),
            // Minimum bcrypt cost keeps the suite fast.
            hasher: web::Data::new(PasswordHasher::new(4)),
        }
    }
}

/// Builds the full application service over a [`TestState`].
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.pool.clone())
                .app_data($state.gate.clone())
                .app_data($state.hasher.clone())
                .configure(todo_gate::routes::config),
        )
        .await
    };
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Reads the response body as JSON, panicking with the raw body if it is not JSON.
pub async fn read_json<B: MessageBody>(resp: ServiceResponse<B>) -> Value {
    let bytes = test::read_body(resp).await;
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "Response is not JSON ({}): {:?}",
            e,
            String::from_utf8_lossy(&bytes)
        )
    })
}

pub async fn register_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    username: &str,
) -> i64 {
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({
            "username": username,
            "password": TEST_PASSWORD,
            "email": format!("{}@example.com", username),
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::CREATED,
        "Registration of {} failed. Body: {:?}",
        username,
        String::from_utf8_lossy(&bytes)
    );

    let body: RegisterResponse =
        serde_json::from_slice(&bytes).expect("Failed to parse registration response");
    body.user_id
}

pub async fn login_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    username: &str,
) -> LoginResponse {
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "username": username, "password": TEST_PASSWORD }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::OK,
        "Login of {} failed. Body: {:?}",
        username,
        String::from_utf8_lossy(&bytes)
    );

    serde_json::from_slice(&bytes).expect("Failed to parse login response")
}

/// Registers and logs in `username`, returning its id and token.
pub async fn signed_in_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    username: &str,
) -> (i64, String) {
    let user_id = register_user(app, username).await;
    let login = login_user(app, username).await;
    assert_eq!(login.user_id, user_id);
    (user_id, login.token)
}

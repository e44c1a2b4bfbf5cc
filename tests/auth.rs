#[macro_use]
mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, App, HttpServer};
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::net::TcpListener;
use todo_gate::auth::TokenIssuer;
use todo_gate::routes;

use common::{bearer, login_user, read_json, register_user, signed_in_user, TestState};

#[test_log::test(actix_web::test)]
async fn test_register_login_and_access_private_route() {
    let state = TestState::new().await;
    let app = init_app!(state);

    let user_id = register_user(&app, "integration_user").await;
    assert!(user_id > 0);

    let login = login_user(&app, "integration_user").await;
    assert_eq!(login.user_id, user_id);
    assert_eq!(login.message, "Logged in successfully");
    assert!(!login.token.is_empty(), "Token should be a non-empty string");

    let req = test::TestRequest::get()
        .uri("/todos")
        .insert_header(bearer(&login.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await, json!([]));
}

#[actix_rt::test]
async fn test_register_response_shape() {
    let state = TestState::new().await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({
            "username": "shape_user",
            "password": "Password123!",
            "email": "shape@example.com",
            "name": "  Shape User  "
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = read_json(resp).await;
    assert_eq!(body["message"], "User created successfully");
    assert!(body["user_id"].is_i64());
    assert!(body.get("token").is_none(), "Registration must not open a session");

    let (name,): (Option<String>,) = sqlx::query_as("SELECT name FROM users WHERE username = ?")
        .bind("shape_user")
        .fetch_one(&**state.pool)
        .await
        .unwrap();
    assert_eq!(name.as_deref(), Some("Shape User"));
}

#[actix_rt::test]
async fn test_password_is_stored_hashed() {
    let state = TestState::new().await;
    let app = init_app!(state);
    register_user(&app, "hashed_user").await;

    let (hash,): (String,) = sqlx::query_as("SELECT password_hash FROM users WHERE username = ?")
        .bind("hashed_user")
        .fetch_one(&**state.pool)
        .await
        .unwrap();
    assert_ne!(hash, common::TEST_PASSWORD);
    assert!(hash.starts_with("$2"), "Expected a bcrypt hash, got {}", hash);
}

#[actix_rt::test]
async fn test_duplicate_registration_conflicts() {
    let state = TestState::new().await;
    let app = init_app!(state);
    register_user(&app, "taken").await;

    // Same username, different email.
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({
            "username": "taken",
            "password": "Password123!",
            "email": "other@example.com"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(
        read_json(resp).await,
        json!({ "error": "Username or email already exists" })
    );

    // Same email, different username.
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({
            "username": "someone_else",
            "password": "Password123!",
            "email": "taken@example.com"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_rt::test]
async fn test_register_rejects_invalid_input() {
    let state = TestState::new().await;
    let app = init_app!(state);

    let cases = [
        json!({ "username": "no_password", "email": "a@example.com" }),
        json!({ "password": "Password123!", "email": "a@example.com" }),
        json!({ "username": "ab", "password": "Password123!", "email": "a@example.com" }),
        json!({ "username": "bad name!", "password": "Password123!", "email": "a@example.com" }),
        json!({ "username": "short_pw", "password": "short", "email": "a@example.com" }),
        json!({ "username": "bad_email", "password": "Password123!", "email": "not-an-email" }),
    ];

    for payload in cases {
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload: {}", payload);
        let body = read_json(resp).await;
        assert!(body["error"].is_string(), "payload: {}", payload);
    }

    let req = test::TestRequest::post()
        .uri("/register")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_validation_errors_do_not_echo_input() {
    let state = TestState::new().await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({ "username": "bob", "password": "hunter2", "email": "b@x.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let bytes = test::read_body(resp).await;
    let body = String::from_utf8_lossy(&bytes);
    assert!(!body.contains("hunter2"), "Password leaked: {}", body);
    assert_eq!(
        serde_json::from_slice::<serde_json::Value>(&bytes).unwrap(),
        json!({ "error": "Password must be at least 8 characters" })
    );

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({ "username": "b!", "password": "hunter2", "email": "nope" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = read_json(resp).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("Email must be a valid address"), "{}", message);
    assert!(message.contains("Password must be at least 8 characters"), "{}", message);
    assert!(!message.contains("hunter2"), "{}", message);
    assert!(!message.contains("nope"), "{}", message);
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let state = TestState::new().await;
    let app = init_app!(state);
    register_user(&app, "login_user").await;

    let wrong_password = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "username": "login_user", "password": "WrongPassword1" }))
        .to_request();
    let resp = test::call_service(&app, wrong_password).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let wrong_password_body = read_json(resp).await;

    let unknown_user = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "username": "nobody", "password": "Password123!" }))
        .to_request();
    let resp = test::call_service(&app, unknown_user).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(read_json(resp).await, wrong_password_body);
    assert_eq!(
        wrong_password_body,
        json!({ "error": "Invalid username or password" })
    );

    let (sessions,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
        .fetch_one(&**state.pool)
        .await
        .unwrap();
    assert_eq!(sessions, 0);
}

#[actix_rt::test]
async fn test_login_requires_both_fields() {
    let state = TestState::new().await;
    let app = init_app!(state);

    for payload in [
        json!({ "username": "someone" }),
        json!({ "password": "Password123!" }),
        json!({ "username": "", "password": "" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload: {}", payload);
    }
}

#[test_log::test(actix_web::test)]
async fn test_logout_revokes_token() {
    let state = TestState::new().await;
    let app = init_app!(state);
    let (_, token) = signed_in_user(&app, "logout_user").await;

    let req = test::TestRequest::post()
        .uri("/logout")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        read_json(resp).await,
        json!({ "message": "Logged out successfully" })
    );

    // The signature is still valid, but the session is gone.
    assert!(state.gate.tokens().verify(&token).is_ok());

    let req = test::TestRequest::get()
        .uri("/todos")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // A second logout changes nothing.
    let req = test::TestRequest::post()
        .uri("/logout")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_logout_rejects_bad_headers() {
    let state = TestState::new().await;
    let app = init_app!(state);

    let req = test::TestRequest::post().uri("/logout").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(resp).await,
        json!({ "error": "Invalid authorization header" })
    );

    let req = test::TestRequest::post()
        .uri("/logout")
        .insert_header((header::AUTHORIZATION, "Token abc"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/logout")
        .insert_header(bearer("not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_sessions_are_independent() {
    let state = TestState::new().await;
    let app = init_app!(state);
    register_user(&app, "two_devices").await;

    let first = login_user(&app, "two_devices").await;
    let second = login_user(&app, "two_devices").await;
    assert_ne!(first.token, second.token);

    let req = test::TestRequest::post()
        .uri("/logout")
        .insert_header(bearer(&first.token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/todos")
        .insert_header(bearer(&second.token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/todos")
        .insert_header(bearer(&first.token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_rt::test]
async fn test_gate_rejects_bad_credentials() {
    let state = TestState::new().await;
    let app = init_app!(state);
    let (user_id, token) = signed_in_user(&app, "gate_user").await;

    let forged = TokenIssuer::new(b"some-other-secret").issue(user_id).unwrap();
    let unsessioned = state.gate.tokens().issue(user_id).unwrap();

    let headers = vec![
        None,
        Some(format!("bearer {}", token)),
        Some(format!("Basic {}", token)),
        Some("Bearer ".to_string()),
        Some("Bearer not.a.jwt".to_string()),
        Some(format!("Bearer {}", forged)),
        Some(format!("Bearer {}", unsessioned)),
    ];

    for value in headers {
        let mut req = test::TestRequest::get().uri("/todos");
        if let Some(value) = &value {
            req = req.insert_header((header::AUTHORIZATION, value.as_str()));
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "header: {:?}", value);
        let body = read_json(resp).await;
        assert!(body["error"].is_string(), "header: {:?}", value);
    }
}

#[actix_rt::test]
async fn test_expired_session_is_rejected_and_purged_on_login() {
    let state = TestState::new().await;
    let app = init_app!(state);
    let user_id = register_user(&app, "stale_user").await;

    let token = state.gate.tokens().issue(user_id).unwrap();
    state
        .gate
        .sessions()
        .create_at(user_id, &token, Utc::now() - Duration::days(2))
        .await
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/profile")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    login_user(&app, "stale_user").await;

    let (stale,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE token = ?")
        .bind(&token)
        .fetch_one(&**state.pool)
        .await
        .unwrap();
    assert_eq!(stale, 0);
}

#[actix_rt::test]
async fn test_unauthorized_over_http() {
    let state = TestState::new().await;
    let pool = state.pool.clone();
    let gate = state.gate.clone();
    let hasher = state.hasher.clone();

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(gate.clone())
            .app_data(hasher.clone())
            .configure(routes::config)
    })
    .listen(listener)
    .expect("Failed to listen")
    .workers(1)
    .run();
    let handle = server.handle();
    actix_rt::spawn(server);

    let client = reqwest::Client::new();
    let base = format!("http://127.0.0.1:{}", port);

    let resp = client
        .post(format!("{}/todos", base))
        .json(&json!({ "task": "Sneaky" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());

    let resp = client
        .get(format!("{}/health", base))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    handle.stop(true).await;
}

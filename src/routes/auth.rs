use crate::{
    auth::{
        AuthGate, AuthRejection, LoginRequest, LoginResponse, PasswordHasher, RegisterRequest,
        RegisterResponse,
    },
    error::AppError,
};
use actix_web::{http::header, post, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

/// Register a new user
///
/// Creates the account and returns its id. No session is opened; the client logs in
/// separately.
///
/// ## Responses:
/// - `201 Created`: `{"message", "user_id"}`.
/// - `400 Bad Request`: missing fields or input that fails validation.
/// - `409 Conflict`: the username or email is already taken.
#[post("/register")]
pub async fn register(
    pool: web::Data<SqlitePool>,
    hasher: web::Data<PasswordHasher>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let password_hash = hasher.hash(&register_data.password).await?;
    let name = register_data
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    // Uniqueness is enforced by the table, so concurrent registrations cannot both win.
    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, name, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&register_data.username)
    .bind(&register_data.email)
    .bind(password_hash)
    .bind(name)
    .bind(Utc::now())
    .execute(&**pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict("Username or email already exists".into()),
        other => other,
    })?;

    let user_id = result.last_insert_rowid();
    log::info!("Registered user {} ({})", user_id, register_data.username);

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User created successfully".to_string(),
        user_id,
    }))
}

/// Login user
///
/// Verifies the credentials, issues a token and opens a session for it. Earlier sessions
/// of the same user stay valid. Expired session rows of all users are purged here.
///
/// ## Responses:
/// - `200 OK`: `{"message", "token", "user_id"}`.
/// - `400 Bad Request`: missing fields.
/// - `401 Unauthorized`: unknown username or wrong password (indistinguishable).
#[post("/login")]
pub async fn login(
    pool: web::Data<SqlitePool>,
    hasher: web::Data<PasswordHasher>,
    gate: web::Data<AuthGate>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = sqlx::query_as::<_, (i64, String)>(
        "SELECT id, password_hash FROM users WHERE username = ?",
    )
    .bind(&login_data.username)
    .fetch_optional(&**pool)
    .await?;

    let user_id = match user {
        Some((user_id, password_hash)) => {
            if !hasher.verify(&login_data.password, &password_hash).await {
                return Err(invalid_credentials());
            }
            user_id
        }
        None => {
            // Same bcrypt work as a wrong password, so timing does not reveal the username.
            hasher.verify_absent(&login_data.password).await;
            return Err(invalid_credentials());
        }
    };

    match gate.sessions().purge_expired().await {
        Ok(0) => {}
        Ok(purged) => log::debug!("Purged {} expired session(s)", purged),
        Err(e) => log::warn!("Failed to purge expired sessions: {}", e),
    }

    let token = gate.tokens().issue(user_id)?;
    gate.sessions()
        .create(user_id, &token)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create session: {}", e)))?;

    log::info!("User {} logged in", user_id);

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Logged in successfully".to_string(),
        token,
        user_id,
    }))
}

/// Logout user
///
/// Deletes the session belonging to the presented token. The token must still pass the
/// gate, so a second logout with the same token changes nothing and is answered with 401.
///
/// ## Responses:
/// - `200 OK`: `{"message"}`.
/// - `400 Bad Request`: the `Authorization` header is missing or not `Bearer <token>`.
/// - `401 Unauthorized`: the token or its session is no longer valid.
#[post("/logout")]
pub async fn logout(
    gate: web::Data<AuthGate>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let authenticated = gate
        .authenticate(req.headers().get(header::AUTHORIZATION))
        .await
        .map_err(|rejection| match rejection {
            AuthRejection::MissingCredential | AuthRejection::MalformedCredential => {
                AppError::BadRequest("Invalid authorization header".into())
            }
            other => other.into(),
        })?;

    gate.sessions().delete(&authenticated.token).await?;
    log::info!("User {} logged out", authenticated.user_id);

    Ok(HttpResponse::Ok().json(json!({
        "message": "Logged out successfully"
    })))
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid username or password".into())
}

use crate::{
    auth::AuthenticatedUserId,
    database::UpdateBuilder,
    error::AppError,
    models::{Profile, UpdateProfileRequest, User},
};
use actix_web::{get, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

/// Retrieves the authenticated user's profile.
///
/// ## Responses:
/// - `200 OK`: username, name, email, bio, created_at and the number of todos owned.
/// - `401 Unauthorized`: no valid token/session.
/// - `404 Not Found`: the account no longer exists.
#[get("")]
pub async fn get_profile(
    pool: web::Data<SqlitePool>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, name, bio, created_at FROM users WHERE id = ?",
    )
    .bind(user_id.0)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let (todo_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM todos WHERE user_id = ?")
        .bind(user_id.0)
        .fetch_one(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(Profile::new(user, todo_count)))
}

/// Updates the authenticated user's name and/or bio.
///
/// ## Request Body:
/// `{"name"?: string, "bio"?: string}`; at least one field must be present.
///
/// ## Responses:
/// - `200 OK`: `{"message"}`.
/// - `400 Bad Request`: no field supplied, or a field is too long.
/// - `401 Unauthorized`: no valid token/session.
#[put("")]
pub async fn update_profile(
    pool: web::Data<SqlitePool>,
    user_id: AuthenticatedUserId,
    profile_data: web::Json<UpdateProfileRequest>,
) -> Result<impl Responder, AppError> {
    profile_data.validate()?;
    let profile_data = profile_data.into_inner();

    let mut query = UpdateBuilder::new("users")
        .set("name", profile_data.name)
        .set("bio", profile_data.bio)
        .filter("id", user_id.0)
        .build()?;

    let result = query.build().execute(&**pool).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Profile updated successfully"
    })))
}

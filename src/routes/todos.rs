use crate::{
    auth::AuthenticatedUserId,
    database::UpdateBuilder,
    error::AppError,
    models::{normalize_task, CreateTodoRequest, Todo, UpdateTodoRequest},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;

const TODO_COLUMNS: &str = "id, task, status, user_id, created_at";

/// Retrieves every todo of the authenticated user, newest first.
///
/// ## Responses:
/// - `200 OK`: a JSON array of `Todo` objects (empty if the user has none).
/// - `401 Unauthorized`: no valid token/session.
#[get("")]
pub async fn list_todos(
    pool: web::Data<SqlitePool>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let todos = sqlx::query_as::<_, Todo>(&format!(
        "SELECT {} FROM todos WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        TODO_COLUMNS
    ))
    .bind(user_id.0)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(todos))
}

/// Creates a todo owned by the authenticated user.
///
/// ## Request Body:
/// `{"task": string}`; surrounding whitespace is trimmed.
///
/// ## Responses:
/// - `201 Created`: the new `Todo`, with `status: false`.
/// - `400 Bad Request`: the trimmed task is empty or longer than 500 characters.
/// - `401 Unauthorized`: no valid token/session.
#[post("")]
pub async fn create_todo(
    pool: web::Data<SqlitePool>,
    user_id: AuthenticatedUserId,
    todo_data: web::Json<CreateTodoRequest>,
) -> Result<impl Responder, AppError> {
    let task = normalize_task(&todo_data.task)?;

    let todo = sqlx::query_as::<_, Todo>(&format!(
        "INSERT INTO todos (user_id, task, status, created_at) VALUES (?, ?, ?, ?) RETURNING {}",
        TODO_COLUMNS
    ))
    .bind(user_id.0)
    .bind(task)
    .bind(false)
    .bind(Utc::now())
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(todo))
}

/// Retrieves one todo of the authenticated user.
///
/// ## Responses:
/// - `200 OK`: the `Todo`.
/// - `400 Bad Request`: the id is not a number.
/// - `401 Unauthorized`: no valid token/session.
/// - `404 Not Found`: no such todo, or it belongs to someone else.
#[get("/{id}")]
pub async fn get_todo(
    pool: web::Data<SqlitePool>,
    user_id: AuthenticatedUserId,
    todo_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let todo = fetch_owned(&pool, todo_id.into_inner(), user_id).await?;
    Ok(HttpResponse::Ok().json(todo))
}

/// Updates the task text and/or completion status of a todo.
///
/// Ownership is checked before the body is applied, so requests for another user's todo
/// get 404 regardless of their content.
///
/// ## Request Body:
/// `{"task"?: string, "status"?: bool}`; at least one field must be present.
///
/// ## Responses:
/// - `200 OK`: the updated `Todo`.
/// - `400 Bad Request`: no field supplied, an empty task, or a non-numeric id.
/// - `401 Unauthorized`: no valid token/session.
/// - `404 Not Found`: no such todo, or it belongs to someone else.
#[put("/{id}")]
pub async fn update_todo(
    pool: web::Data<SqlitePool>,
    user_id: AuthenticatedUserId,
    todo_id: web::Path<i64>,
    todo_data: web::Json<UpdateTodoRequest>,
) -> Result<impl Responder, AppError> {
    let todo_id = todo_id.into_inner();

    let (owned,): (i64,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM todos WHERE id = ? AND user_id = ?)")
            .bind(todo_id)
            .bind(user_id.0)
            .fetch_one(&**pool)
            .await?;
    if owned == 0 {
        return Err(todo_not_found());
    }

    let todo_data = todo_data.into_inner();
    let task = todo_data.task.as_deref().map(normalize_task).transpose()?;

    let mut query = UpdateBuilder::new("todos")
        .set("task", task)
        .set("status", todo_data.status)
        .filter("id", todo_id)
        .filter("user_id", user_id.0)
        .build()?;

    let result = query.build().execute(&**pool).await?;
    if result.rows_affected() == 0 {
        // Deleted between the ownership check and the update.
        return Err(todo_not_found());
    }

    let todo = fetch_owned(&pool, todo_id, user_id).await?;
    Ok(HttpResponse::Ok().json(todo))
}

/// Deletes a todo of the authenticated user.
///
/// ## Responses:
/// - `200 OK`: `{"message"}`.
/// - `400 Bad Request`: the id is not a number.
/// - `401 Unauthorized`: no valid token/session.
/// - `404 Not Found`: no such todo, or it belongs to someone else.
#[delete("/{id}")]
pub async fn delete_todo(
    pool: web::Data<SqlitePool>,
    user_id: AuthenticatedUserId,
    todo_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM todos WHERE id = ? AND user_id = ?")
        .bind(todo_id.into_inner())
        .bind(user_id.0)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(todo_not_found());
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Todo deleted successfully"
    })))
}

async fn fetch_owned(
    pool: &SqlitePool,
    todo_id: i64,
    user_id: AuthenticatedUserId,
) -> Result<Todo, AppError> {
    sqlx::query_as::<_, Todo>(&format!(
        "SELECT {} FROM todos WHERE id = ? AND user_id = ?",
        TODO_COLUMNS
    ))
    .bind(todo_id)
    .bind(user_id.0)
    .fetch_optional(pool)
    .await?
    .ok_or_else(todo_not_found)
}

fn todo_not_found() -> AppError {
    AppError::NotFound("Todo not found".into())
}

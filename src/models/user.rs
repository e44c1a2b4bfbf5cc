use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A registered account as stored in the `users` table.
#[derive(Debug, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// bcrypt hash; never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What `GET /profile` returns: the account plus how many todos it owns.
#[derive(Debug, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub name: Option<String>,
    pub email: String,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub todo_count: i64,
}

impl Profile {
    pub fn new(user: User, todo_count: i64) -> Self {
        Self {
            username: user.username,
            name: user.name,
            email: user.email,
            bio: user.bio,
            created_at: user.created_at,
            todo_count,
        }
    }
}

/// Body of `PUT /profile`. Absent fields are left unchanged; at least one must be present.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,
}

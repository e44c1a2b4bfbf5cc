pub mod auth;
pub mod health;
pub mod profile;
pub mod todos;

use crate::{auth::AuthMiddleware, error::AppError};
use actix_web::web;

/// Registers every route of the service.
///
/// `/register`, `/login`, `/logout` and `/health` are public; `/profile` and `/todos` sit
/// behind [`AuthMiddleware`]. Malformed JSON bodies and non-numeric path ids are answered
/// with the usual `{"error": ...}` envelope.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid request body: {}", err)).into()
    }))
    .app_data(
        web::PathConfig::default()
            .error_handler(|_err, _req| AppError::BadRequest("Invalid todo ID".into()).into()),
    )
    .service(health::health)
    .service(auth::register)
    .service(auth::login)
    .service(auth::logout)
    .service(
        web::scope("/profile")
            .wrap(AuthMiddleware)
            .service(profile::get_profile)
            .service(profile::update_profile),
    )
    .service(
        web::scope("/todos")
            .wrap(AuthMiddleware)
            .service(todos::list_todos)
            .service(todos::create_todo)
            .service(todos::get_todo)
            .service(todos::update_todo)
            .service(todos::delete_todo),
    );
}

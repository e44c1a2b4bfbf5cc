use actix_web::{get, HttpResponse, Responder};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

/// Health check endpoint
///
/// Returns the status of the API and the current time (RFC 3339).
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "OK",
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }))
}

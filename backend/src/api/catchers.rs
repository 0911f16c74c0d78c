use crate::models::ErrorResponse;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{catch, Request};

/// Render every unhandled error status as `{ "error": ... }` instead of HTML.
#[catch(default)]
pub fn json_catcher(status: Status, request: &Request<'_>) -> (Status, Json<ErrorResponse>) {
    log::warn!("{} {} -> {}", request.method(), request.uri(), status);
    (
        status,
        Json(ErrorResponse {
            error: status.reason().unwrap_or("Unknown error").to_string(),
        }),
    )
}

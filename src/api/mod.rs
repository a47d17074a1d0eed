use rocket::{http::Status, serde::json::Json, Catcher, Request, Route};

use crate::error::ErrorBody;

mod health;
mod votes;

pub use health::Started;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(votes::routes());
    routes.extend(health::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

/// Render framework-level failures with the same body as our own errors.
///
/// A body that is not JSON (400) or not the expected shape (422) is reported
/// as `INVALID_INPUT` with status 400, like any other malformed request.
#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> (Status, Json<ErrorBody>) {
    let (status, code) = match status.code {
        400 | 422 => (Status::BadRequest, "INVALID_INPUT"),
        401 => (status, "UNAUTHORIZED"),
        403 => (status, "FORBIDDEN"),
        404 => (status, "NOT_FOUND"),
        415 => (status, "UNSUPPORTED_MEDIA_TYPE"),
        500..=599 => (status, "INTERNAL_ERROR"),
        _ => (status, "HTTP_ERROR"),
    };
    let message = status.reason().unwrap_or("Unknown error");
    (status, Json(ErrorBody::new(code, message)))
}

pub mod auth;
pub mod contact;
pub mod newsletter;
pub mod payment;
pub mod session;
pub mod webhook;

pub use auth::auth_config;
pub use contact::contact_config;
pub use newsletter::newsletter_config;
pub use payment::payment_config;
pub use session::session_config;
pub use webhook::webhook_config;

use crate::error::{AppError, AppResult};
use actix_web::error::{self, JsonPayloadError};
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, web};
use serde_json::json;
use uuid::Uuid;

/// User id placed in the request extensions by the auth middleware.
pub(crate) fn current_user_id(req: &HttpRequest) -> AppResult<Uuid> {
    req.extensions()
        .get::<Uuid>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Unauthorized".to_string()))
}

/// Client errors pass through verbatim; anything else is logged and replaced
/// by the operation's generic message.
pub(crate) fn failure_response(err: AppError, generic: &str) -> HttpResponse {
    if err.is_client_error() {
        return err.error_response();
    }
    log::error!("{generic}: {err}");
    HttpResponse::InternalServerError().json(json!({ "error": generic }))
}

/// JSON extractor config whose rejections use the `{"error": ...}` body.
/// Serde's own wording (types, offsets) is logged, not returned.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected request body: {err}");
        let message = match &err {
            JsonPayloadError::ContentType => "Content-Type must be application/json",
            JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                "Request body is too large"
            }
            _ => "Invalid request body",
        };
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(json!({ "error": message })),
        )
        .into()
    })
}

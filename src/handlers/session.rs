use super::current_user_id;
use crate::models::*;
use crate::services::{AuthService, RefreshThrottle};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

/// Runs the throttled subscription refresh, then re-issues the caller's token
/// from whatever is stored now. The token is returned even when the refresh
/// itself was skipped.
#[utoipa::path(
    post,
    path = "/session/refresh",
    tag = "session",
    request_body = RefreshSessionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Session token re-issued", body = RefreshSessionResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn refresh_session(
    throttle: web::Data<RefreshThrottle>,
    auth_service: web::Data<AuthService>,
    req: HttpRequest,
    request: Option<web::Json<RefreshSessionRequest>>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    let force = request.map(|r| r.force).unwrap_or(false);

    let refreshed = throttle.request_refresh(force).await;

    match auth_service.issue_session_token(user_id).await {
        Ok((user, access_token)) => Ok(HttpResponse::Ok().json(RefreshSessionResponse {
            success: true,
            refreshed,
            subscription: user.subscription,
            access_token,
        })),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn session_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/session").route("/refresh", web::post().to(refresh_session)));
}

use super::failure_response;
use crate::models::*;
use crate::services::NewsletterService;
use actix_web::{HttpResponse, Result, web};

#[utoipa::path(
    post,
    path = "/subscribe",
    tag = "newsletter",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Subscribed or already subscribed", body = MessageResponse),
        (status = 400, description = "Invalid email", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn subscribe(
    newsletter_service: web::Data<NewsletterService>,
    request: web::Json<SubscribeRequest>,
) -> Result<HttpResponse> {
    match newsletter_service.subscribe(&request.email).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(failure_response(
            e,
            "An unexpected error occurred while subscribing",
        )),
    }
}

pub fn newsletter_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/subscribe", web::post().to(subscribe));
}

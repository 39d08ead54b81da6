use super::failure_response;
use crate::models::*;
use crate::services::ContactService;
use actix_web::{HttpResponse, Result, web};

#[utoipa::path(
    post,
    path = "/contact/send",
    tag = "contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message forwarded", body = MessageResponse),
        (status = 400, description = "First validation error", body = ErrorResponse),
        (status = 500, description = "Sending failed", body = ErrorResponse)
    )
)]
pub async fn send_contact(
    contact_service: web::Data<ContactService>,
    request: web::Json<ContactRequest>,
) -> Result<HttpResponse> {
    match contact_service.send(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(failure_response(
            e,
            "An unexpected error occurred while sending your message",
        )),
    }
}

pub fn contact_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/contact").route("/send", web::post().to(send_contact)));
}

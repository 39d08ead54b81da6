use super::{current_user_id, failure_response};
use crate::models::*;
use crate::services::PaymentService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/payment/checkout",
    tag = "payment",
    request_body = CheckoutRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Checkout session created", body = CheckoutResponse),
        (status = 400, description = "Invalid price ID", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Stripe failure", body = ErrorResponse)
    )
)]
pub async fn create_checkout(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    request: Option<web::Json<CheckoutRequest>>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    let request = request.map(web::Json::into_inner).unwrap_or_default();

    match payment_service.create_checkout(user_id, request).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(failure_response(e, "Failed to create checkout session")),
    }
}

#[utoipa::path(
    get,
    path = "/payment/subscription-status",
    tag = "payment",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Stored and live subscription state", body = SubscriptionStatusResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn subscription_status(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service.subscription_status(user_id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payment")
            .route("/checkout", web::post().to(create_checkout))
            .route("/subscription-status", web::get().to(subscription_status)),
    );
}

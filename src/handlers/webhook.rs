use crate::external::StripeService;
use crate::services::PaymentService;
use actix_web::{HttpRequest, HttpResponse, Result, web};
use log::{error, info, warn};
use serde_json::json;

/// Stripe webhook endpoint. Signature failures are 400; processing failures
/// are 500 so Stripe retries the delivery.
pub async fn stripe_webhook(
    req: HttpRequest,
    body: web::Bytes,
    stripe_service: web::Data<StripeService>,
    payment_service: web::Data<PaymentService>,
) -> Result<HttpResponse> {
    let Some(signature) = req
        .headers()
        .get("stripe-signature")
        .and_then(|sig| sig.to_str().ok())
    else {
        warn!("Missing Stripe-Signature header");
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Missing signature or webhook secret"
        })));
    };

    let Ok(payload) = std::str::from_utf8(&body) else {
        error!("Invalid UTF-8 in webhook payload");
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Invalid payload encoding"
        })));
    };

    let event = match stripe_service.construct_event(payload, signature) {
        Ok(event) => event,
        Err(e) => {
            error!("Webhook signature verification failed: {e}");
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": "Webhook signature verification failed"
            })));
        }
    };

    info!("Received Stripe webhook event: {} ({})", event.type_, event.id);

    match payment_service.handle_webhook_event(event).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "received": true }))),
        Err(e) => {
            error!("Error processing webhook: {e}");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Webhook handler failed"
            })))
        }
    }
}

pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/webhook").route("/stripe", web::post().to(stripe_webhook)));
}

use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{SubscriptionTier, UserRole};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::send_otp,
        handlers::auth::verify_otp,
        handlers::auth::request_password_reset,
        handlers::auth::reset_password,
        handlers::auth::register,
        handlers::auth::login,
        handlers::payment::create_checkout,
        handlers::payment::subscription_status,
        handlers::session::refresh_session,
        handlers::newsletter::subscribe,
        handlers::contact::send_contact,
    ),
    components(
        schemas(
            MessageResponse,
            ErrorResponse,
            SendOtpRequest,
            VerifyOtpRequest,
            PasswordResetRequest,
            ResetPasswordRequest,
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            AuthResponse,
            UserResponse,
            UserRole,
            SubscriptionTier,
            CheckoutRequest,
            CheckoutResponse,
            StripeSubscriptionInfo,
            SubscriptionStatusResponse,
            RefreshSessionRequest,
            RefreshSessionResponse,
            SubscribeRequest,
            ContactRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login, OTP and password reset API"),
        (name = "payment", description = "Stripe checkout and subscription API"),
        (name = "session", description = "Session refresh API"),
        (name = "newsletter", description = "Newsletter API"),
        (name = "contact", description = "Contact form API"),
    ),
    info(
        title = "Studio Backend API",
        version = "1.0.0",
        description = "Content studio backend REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

use super::failure_response;
use crate::models::*;
use crate::services::{AuthService, CredentialService};
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/auth/otp/send",
    tag = "auth",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "OTP sent, or email unknown", body = MessageResponse),
        (status = 400, description = "Invalid email", body = ErrorResponse),
        (status = 500, description = "Sending failed", body = ErrorResponse)
    )
)]
pub async fn send_otp(
    credential_service: web::Data<CredentialService>,
    request: web::Json<SendOtpRequest>,
) -> Result<HttpResponse> {
    match credential_service
        .issue(&request.email, CredentialKind::Otp)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(failure_response(
            e,
            "An unexpected error occurred while sending OTP",
        )),
    }
}

#[utoipa::path(
    post,
    path = "/auth/otp/verify",
    tag = "auth",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired OTP", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn verify_otp(
    credential_service: web::Data<CredentialService>,
    request: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse> {
    match credential_service
        .verify_otp(&request.email, &request.otp)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(failure_response(
            e,
            "An unexpected error occurred while verifying OTP",
        )),
    }
}

#[utoipa::path(
    post,
    path = "/auth/reset-password/request",
    tag = "auth",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset link sent, or email unknown", body = MessageResponse),
        (status = 400, description = "Invalid email", body = ErrorResponse),
        (status = 500, description = "Sending failed", body = ErrorResponse)
    )
)]
pub async fn request_password_reset(
    credential_service: web::Data<CredentialService>,
    request: web::Json<PasswordResetRequest>,
) -> Result<HttpResponse> {
    match credential_service
        .issue(&request.email, CredentialKind::PasswordReset)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(failure_response(
            e,
            "An unexpected error occurred while requesting password reset",
        )),
    }
}

#[utoipa::path(
    post,
    path = "/auth/reset-password/reset",
    tag = "auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn reset_password(
    credential_service: web::Data<CredentialService>,
    request: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse> {
    match credential_service
        .reset_password(&request.token, &request.password)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(failure_response(
            e,
            "An unexpected error occurred while resetting password",
        )),
    }
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = RegisterResponse),
        (status = 400, description = "Invalid input or email taken", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn register(
    auth_service: web::Data<AuthService>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    match auth_service.register(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Created().json(response)),
        Err(e) => Ok(failure_response(
            e,
            "An unexpected error occurred during registration",
        )),
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Wrong email or password", body = ErrorResponse),
        (status = 403, description = "Email not verified", body = ErrorResponse)
    )
)]
pub async fn login(
    auth_service: web::Data<AuthService>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    match auth_service.login(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/otp/send", web::post().to(send_otp))
            .route("/otp/verify", web::post().to(verify_otp))
            .route(
                "/reset-password/request",
                web::post().to(request_password_reset),
            )
            .route("/reset-password/reset", web::post().to(reset_password))
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login)),
    );
}

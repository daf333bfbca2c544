//! Authentication endpoints: signup, signin, token refresh and OTP flows

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{Role, Signup, User},
};

use super::MessageResponse;

/// Signin request
#[derive(Deserialize, ToSchema)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Public view of the authenticated user
#[derive(Serialize, ToSchema)]
pub struct UserInfo {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub email_verified: bool,
    pub role: Role,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            email_verified: user.email_verified,
            role: user.role,
        }
    }
}

/// Signin response with both tokens
#[derive(Serialize, ToSchema)]
pub struct SigninResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub user: UserInfo,
}

/// Token refresh request
#[derive(Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token refresh response
#[derive(Serialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
}

/// OTP request (signup verification or password reset)
#[derive(Deserialize, ToSchema)]
pub struct OtpRequest {
    pub email: String,
}

/// OTP verification request; `new_password` turns it into a password reset
#[derive(Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
    pub new_password: Option<String>,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = Signup,
    responses(
        (status = 201, description = "Account created", body = UserInfo),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(state): State<crate::AppState>,
    Json(request): Json<Signup>,
) -> AppResult<(StatusCode, Json<UserInfo>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = state.services.users.signup(&request).await?;
    Ok((StatusCode::CREATED, Json(UserInfo::from(&user))))
}

/// Authenticate and obtain tokens
#[utoipa::path(
    post,
    path = "/auth/signin",
    tag = "auth",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Authenticated", body = SigninResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn signin(
    State(state): State<crate::AppState>,
    Json(request): Json<SigninRequest>,
) -> AppResult<Json<SigninResponse>> {
    let (access_token, refresh_token, user) = state
        .services
        .users
        .signin(&request.email, &request.password)
        .await?;

    Ok(Json(SigninResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        user: UserInfo::from(&user),
    }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/auth/token",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token")
    )
)]
pub async fn refresh_token(
    State(state): State<crate::AppState>,
    Json(request): Json<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    let access_token = state
        .services
        .users
        .refresh_access_token(&request.refresh_token)
        .await?;

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer".to_string(),
    }))
}

/// Invalidate a refresh token
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 204, description = "Logged out")
    )
)]
pub async fn logout(
    State(state): State<crate::AppState>,
    Json(request): Json<RefreshRequest>,
) -> AppResult<StatusCode> {
    state.services.users.logout(&request.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Send a signup email-verification OTP
#[utoipa::path(
    post,
    path = "/auth/signup-otp",
    tag = "auth",
    request_body = OtpRequest,
    responses(
        (status = 200, description = "OTP sent", body = MessageResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn signup_otp(
    State(state): State<crate::AppState>,
    Json(request): Json<OtpRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.services.users.request_otp(&request.email, false).await?;
    Ok(Json(MessageResponse {
        message: "OTP sent successfully".to_string(),
    }))
}

/// Send a password-reset OTP
#[utoipa::path(
    post,
    path = "/auth/forgot",
    tag = "auth",
    request_body = OtpRequest,
    responses(
        (status = 200, description = "OTP sent", body = MessageResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn forgot_password(
    State(state): State<crate::AppState>,
    Json(request): Json<OtpRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.services.users.request_otp(&request.email, true).await?;
    Ok(Json(MessageResponse {
        message: "OTP sent successfully".to_string(),
    }))
}

/// Verify an OTP, optionally resetting the password
#[utoipa::path(
    post,
    path = "/auth/verify",
    tag = "auth",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "OTP verified", body = MessageResponse),
        (status = 400, description = "OTP expired"),
        (status = 403, description = "Invalid OTP")
    )
)]
pub async fn verify_otp(
    State(state): State<crate::AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .users
        .verify_otp(&request.email, &request.otp, request.new_password.as_deref())
        .await?;

    let message = if request.new_password.is_some() {
        "Password reset successfully"
    } else {
        "Email verified successfully"
    };
    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}

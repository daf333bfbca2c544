//! User endpoints: current-user profile and the admin console

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{LoanDetails, LoanState},
        user::{ChangePassword, UpdateProfile, UserQuery, UserShort},
    },
};

use super::{auth::UserInfo, AuthenticatedUser, MessageResponse, PaginatedResponse};

/// Search filter for the current user's borrowed books
#[derive(Deserialize, ToSchema)]
pub struct BorrowedBooksQuery {
    pub search: Option<String>,
}

/// Get the current user
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UserInfo>> {
    let user = state.services.users.get_by_id(claims.user_id).await?;
    Ok(Json(UserInfo::from(&user)))
}

/// Update the current user's profile
#[utoipa::path(
    patch,
    path = "/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = UserInfo),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn update_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(profile): Json<UpdateProfile>,
) -> AppResult<Json<UserInfo>> {
    let user = state
        .services
        .users
        .update_profile(claims.user_id, &profile)
        .await?;
    Ok(Json(UserInfo::from(&user)))
}

/// Change the current user's password; all sessions are revoked
#[utoipa::path(
    put,
    path = "/users/me/password",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = ChangePassword,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid new password"),
        (status = 401, description = "Invalid current password")
    )
)]
pub async fn change_password(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ChangePassword>,
) -> AppResult<Json<MessageResponse>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    state
        .services
        .users
        .change_password(claims.user_id, &request)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully. Please sign in again.".to_string(),
    }))
}

/// The current user's open loans
#[utoipa::path(
    get,
    path = "/users/me/borrowed-books",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("search" = Option<String>, Query, description = "Filter on the borrowed book's fields")
    ),
    responses(
        (status = 200, description = "Open loans", body = Vec<LoanDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn borrowed_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BorrowedBooksQuery>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state
        .services
        .loans
        .loans_for_user(claims.user_id, LoanState::Open, query.search.as_deref())
        .await?;
    Ok(Json(loans))
}

/// The current user's returned loans
#[utoipa::path(
    get,
    path = "/users/me/reading-history",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Closed loans", body = Vec<LoanDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn reading_history(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state
        .services
        .loans
        .loans_for_user(claims.user_id, LoanState::Closed, None)
        .await?;
    Ok(Json(loans))
}

/// List users with pagination (admin)
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("search" = Option<String>, Query, description = "Search in names and email"),
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<i64>, Query, description = "Users per page (default: 20)")
    ),
    responses(
        (status = 200, description = "List of users", body = PaginatedResponse<UserShort>),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<PaginatedResponse<UserShort>>> {
    claims.require_admin()?;

    let (items, total) = state.services.users.search(&query).await?;
    Ok(Json(PaginatedResponse {
        items,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// List a user's loans (admin)
#[utoipa::path(
    get,
    path = "/admin/users/{id}/loans",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID"),
        ("state" = Option<String>, Query, description = "open, closed or all (default)")
    ),
    responses(
        (status = 200, description = "User's loans", body = Vec<LoanDetails>),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_user_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
    Query(query): Query<super::books::LoanStateQuery>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    claims.require_admin()?;

    let loans = state
        .services
        .loans
        .loans_for_user(user_id, query.state, None)
        .await?;
    Ok(Json(loans))
}

/// Delete a user account and everything attached to it (admin)
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Cannot delete own account"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User still has books issued")
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.users.delete_user(&claims, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

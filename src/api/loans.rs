//! Loan circulation endpoints (admin)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::loan::{IssueBook, LoanDetails},
};

use super::AuthenticatedUser;

/// Return request with an optional explicit return date
#[derive(Deserialize, Default, ToSchema)]
pub struct ReturnRequest {
    pub return_date: Option<DateTime<Utc>>,
}

/// Renew request with an optional window override
#[derive(Deserialize, Default, ToSchema)]
pub struct RenewRequest {
    /// Days added to the current due date (default: 14)
    pub days: Option<i64>,
}

/// Issue a book to a user
#[utoipa::path(
    post,
    path = "/admin/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = IssueBook,
    responses(
        (status = 201, description = "Loan created", body = LoanDetails),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User or book not found"),
        (status = 409, description = "No copies available or already issued")
    )
)]
pub async fn issue_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<IssueBook>,
) -> AppResult<(StatusCode, Json<LoanDetails>)> {
    claims.require_admin()?;

    let loan = state.services.loans.issue(&request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/admin/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Book returned", body = LoanDetails),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
    body: Option<Json<ReturnRequest>>,
) -> AppResult<Json<LoanDetails>> {
    claims.require_admin()?;

    let return_date = body.and_then(|Json(r)| r.return_date);
    let loan = state.services.loans.return_loan(loan_id, return_date).await?;
    Ok(Json(loan))
}

/// Renew a loan
#[utoipa::path(
    post,
    path = "/admin/loans/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body = RenewRequest,
    responses(
        (status = 200, description = "Loan renewed", body = LoanDetails),
        (status = 400, description = "Invalid renewal window"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn renew_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
    body: Option<Json<RenewRequest>>,
) -> AppResult<Json<LoanDetails>> {
    claims.require_admin()?;

    let days = body.and_then(|Json(r)| r.days);
    let loan = state.services.loans.renew_loan(loan_id, days).await?;
    Ok(Json(loan))
}

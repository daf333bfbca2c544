//! Wishlist endpoints for the current user

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{error::AppResult, models::wishlist::WishlistBook};

use super::AuthenticatedUser;

/// The current user's wishlist
#[utoipa::path(
    get,
    path = "/users/me/wishlist",
    tag = "wishlist",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Saved books", body = Vec<WishlistBook>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_wishlist(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<WishlistBook>>> {
    let books = state.services.wishlist.get(claims.user_id).await?;
    Ok(Json(books))
}

/// Save a book to the current user's wishlist
#[utoipa::path(
    post,
    path = "/users/me/wishlist/{book_id}",
    tag = "wishlist",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 201, description = "Wishlist after the add", body = Vec<WishlistBook>),
        (status = 404, description = "Book not found")
    )
)]
pub async fn add_to_wishlist(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<(StatusCode, Json<Vec<WishlistBook>>)> {
    let books = state.services.wishlist.add(claims.user_id, book_id).await?;
    Ok((StatusCode::CREATED, Json(books)))
}

/// Remove a book from the current user's wishlist
#[utoipa::path(
    delete,
    path = "/users/me/wishlist/{book_id}",
    tag = "wishlist",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Wishlist after the removal", body = Vec<WishlistBook>),
        (status = 404, description = "Book is not on the wishlist")
    )
)]
pub async fn remove_from_wishlist(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<Json<Vec<WishlistBook>>> {
    let books = state.services.wishlist.remove(claims.user_id, book_id).await?;
    Ok(Json(books))
}

//! Wishlist service

use crate::{
    error::{AppError, AppResult},
    models::wishlist::WishlistBook,
    repository::Repository,
};

#[derive(Clone)]
pub struct WishlistService {
    repository: Repository,
}

impl WishlistService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// A user's saved books
    pub async fn get(&self, user_id: i32) -> AppResult<Vec<WishlistBook>> {
        self.repository.wishlists.list_for_user(user_id).await
    }

    /// Save a book. Adding a book twice is a no-op.
    pub async fn add(&self, user_id: i32, book_id: i32) -> AppResult<Vec<WishlistBook>> {
        // Verify book exists
        self.repository.books.get_by_id(book_id).await?;
        self.repository.wishlists.add(user_id, book_id).await?;
        self.repository.wishlists.list_for_user(user_id).await
    }

    /// Remove a saved book
    pub async fn remove(&self, user_id: i32, book_id: i32) -> AppResult<Vec<WishlistBook>> {
        let removed = self.repository.wishlists.remove(user_id, book_id).await?;
        if !removed {
            return Err(AppError::NotFound("Book is not on the wishlist".to_string()));
        }
        self.repository.wishlists.list_for_user(user_id).await
    }
}

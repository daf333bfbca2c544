//! Wishlists repository

use sqlx::{PgConnection, Pool, Postgres};

use crate::{error::AppResult, models::wishlist::WishlistBook};

#[derive(Clone)]
pub struct WishlistsRepository {
    pool: Pool<Postgres>,
}

impl WishlistsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// A user's saved books, newest first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<WishlistBook>> {
        let books = sqlx::query_as::<_, WishlistBook>(
            r#"
            SELECT w.book_id, b.isbn, b.title, b.author, b.cover, w.added_at
            FROM wishlists w
            JOIN books b ON w.book_id = b.id
            WHERE w.user_id = $1
            ORDER BY w.added_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Save a book for a user. A book appears at most once per wishlist;
    /// re-adding is a no-op. Returns whether a row was inserted.
    pub async fn add(&self, user_id: i32, book_id: i32) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO wishlists (user_id, book_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, book_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(book_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a saved book. Returns whether a row was removed.
    pub async fn remove(&self, user_id: i32, book_id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM wishlists WHERE user_id = $1 AND book_id = $2")
            .bind(user_id)
            .bind(book_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Pull a book out of every wishlist inside the book deletion cascade
    pub async fn remove_book_everywhere(
        &self,
        conn: &mut PgConnection,
        book_id: i32,
    ) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM wishlists WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Drop a user's wishlist inside the account deletion cascade
    pub async fn delete_for_user(&self, conn: &mut PgConnection, user_id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM wishlists WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

//! Inventory ledger repository
//!
//! Every mutation here runs on a transaction connection supplied by the
//! calling service; the ledger is never written outside a unit of work.

use sqlx::{PgConnection, Pool, Postgres};

use crate::{error::AppResult, models::inventory::InventoryRecord};

#[derive(Clone)]
pub struct InventoryRepository {
    pool: Pool<Postgres>,
}

impl InventoryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Read the ledger record for an ISBN
    pub async fn get(&self, isbn: &str) -> AppResult<Option<InventoryRecord>> {
        let record = sqlx::query_as::<_, InventoryRecord>(
            "SELECT isbn, total_copies, available_copies FROM book_inventory WHERE isbn = $1",
        )
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Read and row-lock the ledger record so concurrent issue/return of
    /// the same ISBN serialize on it
    pub async fn get_for_update(
        &self,
        conn: &mut PgConnection,
        isbn: &str,
    ) -> AppResult<Option<InventoryRecord>> {
        let record = sqlx::query_as::<_, InventoryRecord>(
            "SELECT isbn, total_copies, available_copies FROM book_inventory \
             WHERE isbn = $1 FOR UPDATE",
        )
        .bind(isbn)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(record)
    }

    /// Create the ledger record alongside a new book
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        isbn: &str,
        copies: i32,
    ) -> AppResult<InventoryRecord> {
        let record = sqlx::query_as::<_, InventoryRecord>(
            r#"
            INSERT INTO book_inventory (isbn, total_copies, available_copies)
            VALUES ($1, $2, $2)
            RETURNING isbn, total_copies, available_copies
            "#,
        )
        .bind(isbn)
        .bind(copies)
        .fetch_one(&mut *conn)
        .await?;
        Ok(record)
    }

    /// Overwrite both counters after a capacity edit
    pub async fn set_counts(
        &self,
        conn: &mut PgConnection,
        isbn: &str,
        total_copies: i32,
        available_copies: i32,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE book_inventory SET total_copies = $1, available_copies = $2 WHERE isbn = $3",
        )
        .bind(total_copies)
        .bind(available_copies)
        .bind(isbn)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Re-key the record when a book's ISBN is edited
    pub async fn relink_isbn(
        &self,
        conn: &mut PgConnection,
        old_isbn: &str,
        new_isbn: &str,
    ) -> AppResult<()> {
        sqlx::query("UPDATE book_inventory SET isbn = $1 WHERE isbn = $2")
            .bind(new_isbn)
            .bind(old_isbn)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Take one copy off the shelf. Returns false when no record matched,
    /// i.e. the ISBN is unknown or no copies are available.
    pub async fn take_copy(&self, conn: &mut PgConnection, isbn: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE book_inventory SET available_copies = available_copies - 1 \
             WHERE isbn = $1 AND available_copies > 0",
        )
        .bind(isbn)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Put one copy back, clamped so availability never exceeds the total
    /// even if the ledger drifted. Returns false when no record matched.
    pub async fn restock_copy(&self, conn: &mut PgConnection, isbn: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE book_inventory \
             SET available_copies = LEAST(available_copies + 1, total_copies) \
             WHERE isbn = $1",
        )
        .bind(isbn)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the ledger record as part of a book deletion cascade
    pub async fn delete(&self, conn: &mut PgConnection, isbn: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM book_inventory WHERE isbn = $1")
            .bind(isbn)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

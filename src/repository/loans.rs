//! Loans repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookShort,
        loan::{Loan, LoanDetails, LoanState},
        user::UserShort,
    },
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID inside a transaction
    pub async fn get_by_id(&self, conn: &mut PgConnection, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Check for an open loan of this book to this user
    pub async fn open_loan_exists(
        &self,
        conn: &mut PgConnection,
        user_id: i32,
        book_id: i32,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans \
             WHERE user_id = $1 AND book_id = $2 AND NOT returned)",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    /// Count open loans referencing a book
    pub async fn count_open_for_book(
        &self,
        conn: &mut PgConnection,
        book_id: i32,
    ) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE book_id = $1 AND NOT returned")
                .bind(book_id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(count)
    }

    /// Count open loans held by a user
    pub async fn count_open_for_user(
        &self,
        conn: &mut PgConnection,
        user_id: i32,
    ) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE user_id = $1 AND NOT returned")
                .bind(user_id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(count)
    }

    /// Create a new loan. The partial unique index on open (user, book)
    /// pairs backstops the in-transaction uniqueness check.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        user_id: i32,
        book_id: i32,
        issue_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, book_id, issue_date, due_date, returned)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(issue_date)
        .bind(due_date)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Book already issued to this user"))?;

        Ok(loan)
    }

    /// Close a loan
    pub async fn mark_returned(
        &self,
        conn: &mut PgConnection,
        id: i32,
        returned_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE loans SET returned = TRUE, actual_return_date = $1 WHERE id = $2")
            .bind(returned_at)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Move a loan's due date
    pub async fn set_due_date(
        &self,
        conn: &mut PgConnection,
        id: i32,
        due_date: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE loans SET due_date = $1 WHERE id = $2")
            .bind(due_date)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Delete all loan records (open and closed) for a book
    pub async fn delete_for_book(&self, conn: &mut PgConnection, book_id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM loans WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete all loan records (open and closed) for a user
    pub async fn delete_for_user(&self, conn: &mut PgConnection, user_id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM loans WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Loans held by a user, newest first, with book context. An optional
    /// search term filters on the joined book's fields.
    pub async fn list_for_user(
        &self,
        user_id: i32,
        state: LoanState,
        search: Option<&str>,
    ) -> AppResult<Vec<LoanDetails>> {
        let mut query = String::from(
            r#"
            SELECT l.id, l.issue_date, l.due_date, l.returned, l.actual_return_date,
                   b.id as book_id, b.isbn, b.title, b.author, b.cover
            FROM loans l
            JOIN books b ON l.book_id = b.id
            WHERE l.user_id = $1
            "#,
        );
        match state {
            LoanState::Open => query.push_str(" AND NOT l.returned"),
            LoanState::Closed => query.push_str(" AND l.returned"),
            LoanState::All => {}
        }
        if search.is_some() {
            query.push_str(
                " AND (LOWER(b.title) LIKE $2 OR LOWER(b.author) LIKE $2 \
                 OR LOWER(b.isbn) LIKE $2 OR LOWER(b.category) LIKE $2)",
            );
        }
        query.push_str(" ORDER BY l.issue_date DESC");

        let mut builder = sqlx::query(&query).bind(user_id);
        if let Some(term) = search {
            builder = builder.bind(format!("%{}%", term.to_lowercase()));
        }
        let rows = builder.fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(|row| Self::details_row(&row, None)).collect())
    }

    /// Loans referencing a book, newest first, with borrower context
    pub async fn list_for_book(&self, book_id: i32, state: LoanState) -> AppResult<Vec<LoanDetails>> {
        let mut query = String::from(
            r#"
            SELECT l.id, l.issue_date, l.due_date, l.returned, l.actual_return_date,
                   b.id as book_id, b.isbn, b.title, b.author, b.cover,
                   u.id as user_id, u.first_name, u.last_name, u.email, u.role
            FROM loans l
            JOIN books b ON l.book_id = b.id
            JOIN users u ON l.user_id = u.id
            WHERE l.book_id = $1
            "#,
        );
        match state {
            LoanState::Open => query.push_str(" AND NOT l.returned"),
            LoanState::Closed => query.push_str(" AND l.returned"),
            LoanState::All => {}
        }
        query.push_str(" ORDER BY l.issue_date DESC");

        let rows = sqlx::query(&query).bind(book_id).fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let user = UserShort {
                    id: row.get("user_id"),
                    first_name: row.get("first_name"),
                    last_name: row.get("last_name"),
                    email: row.get("email"),
                    role: row.get("role"),
                };
                Self::details_row(&row, Some(user))
            })
            .collect())
    }

    fn details_row(row: &sqlx::postgres::PgRow, user: Option<UserShort>) -> LoanDetails {
        let loan = Loan {
            id: row.get("id"),
            user_id: user.as_ref().map(|u| u.id).unwrap_or_default(),
            book_id: row.get("book_id"),
            issue_date: row.get("issue_date"),
            due_date: row.get("due_date"),
            returned: row.get("returned"),
            actual_return_date: row.get("actual_return_date"),
        };
        let status = loan.status_at(Utc::now());
        LoanDetails {
            id: loan.id,
            book: BookShort {
                id: row.get("book_id"),
                isbn: row.get("isbn"),
                title: row.get("title"),
                author: row.get("author"),
                cover: row.get("cover"),
            },
            user,
            issue_date: loan.issue_date,
            due_date: loan.due_date,
            status,
            actual_return_date: loan.actual_return_date,
        }
    }
}

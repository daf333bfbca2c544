//! Books repository for database operations

use sqlx::{PgConnection, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::book::{AvailabilityStatus, Book, BookQuery, BookSummary, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Get book by ISBN
    pub async fn get_by_isbn(&self, isbn: &str) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with ISBN {} not found", isbn)))
    }

    /// Get book by ID inside a transaction
    pub async fn find_by_id(&self, conn: &mut PgConnection, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(book)
    }

    /// Check whether a different book already claims this ISBN
    pub async fn isbn_exists(
        &self,
        conn: &mut PgConnection,
        isbn: &str,
        exclude_id: Option<i32>,
    ) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND id != $2)")
                .bind(isbn)
                .bind(id)
                .fetch_one(&mut *conn)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
                .bind(isbn)
                .fetch_one(&mut *conn)
                .await?
        };
        Ok(exists)
    }

    /// Insert a new book
    pub async fn insert(&self, conn: &mut PgConnection, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                isbn, title, author, publish_date, pages, cover,
                language, location, publisher, category, featured, description
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publish_date)
        .bind(book.pages)
        .bind(&book.cover)
        .bind(&book.language)
        .bind(&book.location)
        .bind(&book.publisher)
        .bind(&book.category)
        .bind(book.featured)
        .bind(&book.description)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Book with this ISBN already exists"))?;

        Ok(created)
    }

    /// Apply a field patch to an existing book
    pub async fn update(
        &self,
        conn: &mut PgConnection,
        id: i32,
        patch: &UpdateBook,
    ) -> AppResult<Book> {
        let mut sets = Vec::new();
        let mut param_idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, param_idx));
                    param_idx += 1;
                }
            };
        }

        add_field!(patch.title, "title");
        add_field!(patch.author, "author");
        add_field!(patch.publish_date, "publish_date");
        add_field!(patch.isbn, "isbn");
        add_field!(patch.pages, "pages");
        add_field!(patch.cover, "cover");
        add_field!(patch.language, "language");
        add_field!(patch.location, "location");
        add_field!(patch.publisher, "publisher");
        add_field!(patch.category, "category");
        add_field!(patch.featured, "featured");
        add_field!(patch.description, "description");

        if sets.is_empty() {
            // total_copies-only patches touch the inventory ledger, not this table
            return self
                .find_by_id(conn, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)));
        }

        let query = format!(
            "UPDATE books SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            param_idx
        );

        let mut builder = sqlx::query_as::<_, Book>(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(patch.title);
        bind_field!(patch.author);
        bind_field!(patch.publish_date);
        bind_field!(patch.isbn);
        bind_field!(patch.pages);
        bind_field!(patch.cover);
        bind_field!(patch.language);
        bind_field!(patch.location);
        bind_field!(patch.publisher);
        bind_field!(patch.category);
        bind_field!(patch.featured);
        bind_field!(patch.description);

        let updated = builder
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "Book with this ISBN already exists"))?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        Ok(updated)
    }

    /// Delete a book row
    pub async fn delete(&self, conn: &mut PgConnection, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Search books with pagination, joined with the inventory ledger
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<BookSummary>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(15).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref search) = query.search {
            params.push(format!("%{}%", search.to_lowercase()));
            conditions.push(format!(
                "(LOWER(b.title) LIKE ${n} OR LOWER(b.author) LIKE ${n} \
                 OR LOWER(b.isbn) LIKE ${n} OR LOWER(b.category) LIKE ${n})",
                n = params.len()
            ));
        }

        if let Some(ref category) = query.category {
            params.push(category.clone());
            conditions.push(format!("b.category = ${}", params.len()));
        }

        if let Some(featured) = query.featured {
            conditions.push(format!("b.featured = {}", featured));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let order_clause = match query.sort_by.as_deref() {
            Some("title_desc") => "b.title DESC",
            Some("author_asc") => "b.author ASC",
            Some("author_desc") => "b.author DESC",
            _ => "b.title ASC",
        };

        let count_query = format!("SELECT COUNT(*) FROM books b {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT b.id, b.isbn, b.title, b.author, b.category, b.cover,
                   b.publish_date, b.location, b.featured,
                   COALESCE(bi.total_copies, 0) as total_copies,
                   COALESCE(bi.available_copies, 0) as available_copies
            FROM books b
            LEFT JOIN book_inventory bi ON bi.isbn = b.isbn
            {}
            ORDER BY {}
            LIMIT {} OFFSET {}
            "#,
            where_clause, order_clause, per_page, offset
        );

        let mut select_builder = sqlx::query(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let rows = select_builder.fetch_all(&self.pool).await?;

        let books = rows
            .into_iter()
            .map(|row| {
                let available_copies: i32 = row.get("available_copies");
                BookSummary {
                    id: row.get("id"),
                    isbn: row.get("isbn"),
                    title: row.get("title"),
                    author: row.get("author"),
                    category: row.get("category"),
                    cover: row.get("cover"),
                    publish_date: row.get("publish_date"),
                    location: row.get("location"),
                    featured: row.get("featured"),
                    total_copies: row.get("total_copies"),
                    available_copies,
                    status: AvailabilityStatus::from_available(available_copies),
                }
            })
            .collect();

        Ok((books, total))
    }

    /// Distinct categories for catalog filters
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM books WHERE category IS NOT NULL ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }
}

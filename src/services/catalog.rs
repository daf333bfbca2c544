//! Catalog management service
//!
//! Book lifecycle operations run as single transactions spanning the
//! catalog, the inventory ledger, the loan records and the wishlists,
//! so no partial effect is ever observable.

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{AvailabilityStatus, Book, BookDetails, BookQuery, BookSummary, CreateBook, UpdateBook},
        inventory::InventoryRecord,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<BookSummary>, i64)> {
        self.repository.books.search(query).await
    }

    /// Distinct catalog categories
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        self.repository.books.categories().await
    }

    /// Get a book with its inventory counts
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;
        self.with_inventory(book).await
    }

    /// Get a book by ISBN with its inventory counts
    pub async fn get_book_by_isbn(&self, isbn: &str) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_isbn(isbn).await?;
        self.with_inventory(book).await
    }

    /// Current inventory state for an ISBN
    pub async fn get_inventory(&self, isbn: &str) -> AppResult<InventoryRecord> {
        self.repository
            .inventory
            .get(isbn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No inventory record for ISBN {}", isbn)))
    }

    /// Create a book and its inventory record as one unit. Fails with
    /// `Conflict` when the ISBN is already in the catalog.
    pub async fn add_book(&self, book: &CreateBook) -> AppResult<BookDetails> {
        let mut tx = self.repository.pool.begin().await?;

        if self.repository.books.isbn_exists(&mut tx, &book.isbn, None).await? {
            return Err(AppError::Conflict("Book with this ISBN already exists".to_string()));
        }

        let created = self.repository.books.insert(&mut tx, book).await?;
        let inventory = self
            .repository
            .inventory
            .insert(&mut tx, &created.isbn, book.total_copies)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Added book id={} isbn={} with {} copies",
            created.id,
            created.isbn,
            inventory.total_copies
        );

        Ok(BookDetails {
            status: AvailabilityStatus::from_available(inventory.available_copies),
            total_copies: inventory.total_copies,
            available_copies: inventory.available_copies,
            book: created,
        })
    }

    /// Patch a book; capacity edits are rebalanced into the ledger and an
    /// ISBN edit re-keys the inventory record.
    pub async fn update_book(&self, id: i32, patch: &UpdateBook) -> AppResult<BookDetails> {
        let mut tx = self.repository.pool.begin().await?;

        let book = self
            .repository
            .books
            .find_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        if let Some(ref new_isbn) = patch.isbn {
            if *new_isbn != book.isbn
                && self.repository.books.isbn_exists(&mut tx, new_isbn, Some(id)).await?
            {
                return Err(AppError::Conflict(
                    "Cannot update to an ISBN that already exists".to_string(),
                ));
            }
        }

        let updated = self.repository.books.update(&mut tx, id, patch).await?;

        if updated.isbn != book.isbn {
            self.repository
                .inventory
                .relink_isbn(&mut tx, &book.isbn, &updated.isbn)
                .await?;
        }

        let inventory = self
            .repository
            .inventory
            .get_for_update(&mut tx, &updated.isbn)
            .await?;

        let (total, available) = match (patch.total_copies, inventory) {
            (Some(new_total), Some(record)) => {
                let new_available = record.rebalanced_available(new_total);
                self.repository
                    .inventory
                    .set_counts(&mut tx, &updated.isbn, new_total, new_available)
                    .await?;
                (new_total, new_available)
            }
            (Some(_), None) => {
                tracing::warn!(
                    "No inventory record for ISBN {}; capacity edit skipped",
                    updated.isbn
                );
                (0, 0)
            }
            (None, Some(record)) => (record.total_copies, record.available_copies),
            (None, None) => (0, 0),
        };

        tx.commit().await?;

        Ok(BookDetails {
            status: AvailabilityStatus::from_available(available),
            total_copies: total,
            available_copies: available,
            book: updated,
        })
    }

    /// Delete a book and cascade to its inventory record, loan history and
    /// wishlist references. Refused while open loans reference the book,
    /// so borrowers are never orphaned.
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;

        let book = self
            .repository
            .books
            .find_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let open_loans = self.repository.loans.count_open_for_book(&mut tx, id).await?;
        if open_loans > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete book: {} active loan(s) exist",
                open_loans
            )));
        }

        let loans_removed = self.repository.loans.delete_for_book(&mut tx, id).await?;
        let wishlist_refs = self
            .repository
            .wishlists
            .remove_book_everywhere(&mut tx, id)
            .await?;
        self.repository.inventory.delete(&mut tx, &book.isbn).await?;
        self.repository.books.delete(&mut tx, id).await?;

        tx.commit().await?;

        tracing::info!(
            "Deleted book id={} isbn={} ({} loan records, {} wishlist references)",
            id,
            book.isbn,
            loans_removed,
            wishlist_refs
        );

        Ok(())
    }

    async fn with_inventory(&self, book: Book) -> AppResult<BookDetails> {
        let inventory = self.repository.inventory.get(&book.isbn).await?;
        let (total, available) = inventory
            .map(|r| (r.total_copies, r.available_copies))
            .unwrap_or((0, 0));
        Ok(BookDetails {
            status: AvailabilityStatus::from_available(available),
            total_copies: total,
            available_copies: available,
            book,
        })
    }
}

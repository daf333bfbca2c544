//! Repository layer for database operations
//!
//! Plain reads go through each repository's pool. Everything that
//! participates in a multi-collection transaction takes an explicit
//! `&mut PgConnection`, so the calling service decides the unit of work
//! and commits or rolls back as a whole.

pub mod books;
pub mod inventory;
pub mod loans;
pub mod refresh_tokens;
pub mod users;
pub mod wishlists;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub inventory: inventory::InventoryRepository,
    pub loans: loans::LoansRepository,
    pub users: users::UsersRepository,
    pub wishlists: wishlists::WishlistsRepository,
    pub refresh_tokens: refresh_tokens::RefreshTokensRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            inventory: inventory::InventoryRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            wishlists: wishlists::WishlistsRepository::new(pool.clone()),
            refresh_tokens: refresh_tokens::RefreshTokensRepository::new(pool.clone()),
            pool,
        }
    }
}

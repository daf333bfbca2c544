//! Wishlist model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A saved book on a user's wishlist, joined with catalog data.
/// A book appears at most once per user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct WishlistBook {
    pub book_id: i32,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub cover: Option<String>,
    pub added_at: DateTime<Utc>,
}

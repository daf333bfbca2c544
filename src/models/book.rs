//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publish_date: String,
    pub pages: i32,
    pub cover: Option<String>,
    pub language: String,
    pub location: String,
    pub publisher: Option<String>,
    pub category: Option<String>,
    pub featured: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Short book representation embedded in loans and wishlists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub cover: Option<String>,
}

/// Availability label derived from inventory counts. Never persisted;
/// recomputed on every read so it cannot drift from the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AvailabilityStatus {
    Available,
    Unavailable,
}

impl AvailabilityStatus {
    pub fn from_available(available_copies: i32) -> Self {
        if available_copies > 0 {
            AvailabilityStatus::Available
        } else {
            AvailabilityStatus::Unavailable
        }
    }
}

/// Book list row joined with inventory counts
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    pub cover: Option<String>,
    pub publish_date: String,
    pub location: String,
    pub featured: bool,
    pub total_copies: i32,
    pub available_copies: i32,
    pub status: AvailabilityStatus,
}

/// Book detail with inventory counts
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub total_copies: i32,
    pub available_copies: i32,
    pub status: AvailabilityStatus,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "publish_date is required"))]
    pub publish_date: String,
    #[validate(length(min = 10, max = 17, message = "isbn must be 10-17 characters"))]
    pub isbn: String,
    #[validate(range(min = 1, message = "pages must be positive"))]
    pub pages: i32,
    pub cover: Option<String>,
    #[validate(length(min = 1, message = "language is required"))]
    pub language: String,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    pub publisher: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub description: Option<String>,
    /// Initial number of copies for the inventory ledger
    #[serde(default = "default_total_copies")]
    #[validate(range(min = 0, message = "total_copies cannot be negative"))]
    pub total_copies: i32,
}

fn default_total_copies() -> i32 {
    1
}

/// Field patch for an existing book. Absent fields are left untouched;
/// `total_copies` flows through to the inventory ledger.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publish_date: Option<String>,
    #[validate(length(min = 10, max = 17, message = "isbn must be 10-17 characters"))]
    pub isbn: Option<String>,
    #[validate(range(min = 1, message = "pages must be positive"))]
    pub pages: Option<i32>,
    pub cover: Option<String>,
    pub language: Option<String>,
    pub location: Option<String>,
    pub publisher: Option<String>,
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "total_copies cannot be negative"))]
    pub total_copies: Option<i32>,
}

/// Book query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive match against title, author, ISBN and category
    pub search: Option<String>,
    pub category: Option<String>,
    pub featured: Option<bool>,
    /// One of title_asc, title_desc, author_asc, author_desc
    pub sort_by: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_derives_from_copies() {
        assert_eq!(
            AvailabilityStatus::from_available(3),
            AvailabilityStatus::Available
        );
        assert_eq!(
            AvailabilityStatus::from_available(0),
            AvailabilityStatus::Unavailable
        );
        assert_eq!(
            AvailabilityStatus::from_available(-1),
            AvailabilityStatus::Unavailable
        );
    }

    #[test]
    fn create_book_rejects_missing_fields() {
        let book = CreateBook {
            title: String::new(),
            author: "Iain Banks".to_string(),
            publish_date: "1987".to_string(),
            isbn: "978-0-333-45430-6".to_string(),
            pages: 471,
            cover: None,
            language: "en".to_string(),
            location: "A-12".to_string(),
            publisher: None,
            category: None,
            featured: false,
            description: None,
            total_copies: 1,
        };
        assert!(book.validate().is_err());
    }

    #[test]
    fn create_book_rejects_short_isbn() {
        let book = CreateBook {
            title: "Consider Phlebas".to_string(),
            author: "Iain Banks".to_string(),
            publish_date: "1987".to_string(),
            isbn: "123".to_string(),
            pages: 471,
            cover: None,
            language: "en".to_string(),
            location: "A-12".to_string(),
            publisher: None,
            category: None,
            featured: false,
            description: None,
            total_copies: 1,
        };
        assert!(book.validate().is_err());
    }
}

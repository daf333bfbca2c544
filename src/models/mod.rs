//! Data models for Libris

pub mod book;
pub mod inventory;
pub mod loan;
pub mod user;
pub mod wishlist;

// Re-export commonly used types
pub use book::{AvailabilityStatus, Book, BookShort, BookSummary};
pub use inventory::InventoryRecord;
pub use loan::{Loan, LoanDetails, LoanStatus};
pub use user::{Role, User, UserShort};
pub use wishlist::WishlistBook;

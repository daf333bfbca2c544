//! Inventory ledger model
//!
//! One record per ISBN, kept in lockstep with the book catalog and loan
//! activity. Only the catalog and loan services write to it; invariant:
//! `0 <= available_copies <= total_copies`.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Per-ISBN copy counts
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InventoryRecord {
    pub isbn: String,
    pub total_copies: i32,
    pub available_copies: i32,
}

impl InventoryRecord {
    /// Availability after a capacity edit: a capacity increase grows
    /// availability by the same delta, a decrease shrinks it, and the
    /// result is clamped to `[0, new_total]`.
    pub fn rebalanced_available(&self, new_total: i32) -> i32 {
        let delta = new_total - self.total_copies;
        (self.available_copies + delta).clamp(0, new_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(total: i32, available: i32) -> InventoryRecord {
        InventoryRecord {
            isbn: "978-0-575-07921-4".to_string(),
            total_copies: total,
            available_copies: available,
        }
    }

    #[test]
    fn capacity_increase_grows_availability() {
        assert_eq!(record(3, 1).rebalanced_available(5), 3);
    }

    #[test]
    fn capacity_decrease_shrinks_availability() {
        assert_eq!(record(5, 4).rebalanced_available(3), 2);
    }

    #[test]
    fn availability_never_goes_negative() {
        // 1 available, capacity cut by 4: clamped at zero
        assert_eq!(record(5, 1).rebalanced_available(1), 0);
    }

    #[test]
    fn availability_never_exceeds_new_total() {
        // Drifted record with available > total still clamps down
        assert_eq!(record(3, 5).rebalanced_available(2), 2);
    }

    #[test]
    fn reducing_total_below_available_clamps_to_total() {
        assert_eq!(record(10, 10).rebalanced_available(4), 4);
    }

    #[test]
    fn zero_capacity_empties_availability() {
        assert_eq!(record(3, 2).rebalanced_available(0), 0);
    }
}

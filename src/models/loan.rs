//! Loan model and related types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::BookShort;
use super::user::UserShort;

/// Standard loan window applied when no explicit due date is requested
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned: bool,
    pub actual_return_date: Option<DateTime<Utc>>,
}

/// Loan lifecycle label. `Overdue` is derived from `returned` and
/// `due_date` against the clock, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Issued,
    Overdue,
    Returned,
}

impl Loan {
    /// Due date for a loan issued at `issue_date` with the standard window
    pub fn default_due_date(issue_date: DateTime<Utc>) -> DateTime<Utc> {
        issue_date + Duration::days(LOAN_PERIOD_DAYS)
    }

    /// Lifecycle state of this loan as observed at `now`
    pub fn status_at(&self, now: DateTime<Utc>) -> LoanStatus {
        if self.returned {
            LoanStatus::Returned
        } else if now > self.due_date {
            LoanStatus::Overdue
        } else {
            LoanStatus::Issued
        }
    }
}

/// Loan with book and user context for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub book: BookShort,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserShort>,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub status: LoanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_return_date: Option<DateTime<Utc>>,
}

/// Issue request: the borrower is addressed by id or by email
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueBook {
    pub book_id: i32,
    pub user_id: Option<i32>,
    pub user_email: Option<String>,
    /// Explicit issue date override; defaults to now
    pub issue_date: Option<DateTime<Utc>>,
}

/// Filter for per-book and per-user loan listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanState {
    Open,
    Closed,
    #[default]
    All,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn loan(due: DateTime<Utc>, returned: bool) -> Loan {
        Loan {
            id: 1,
            user_id: 7,
            book_id: 3,
            issue_date: due - Duration::days(LOAN_PERIOD_DAYS),
            due_date: due,
            returned,
            actual_return_date: None,
        }
    }

    #[test]
    fn default_due_date_is_fourteen_days_out() {
        let issued = Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap();
        let due = Loan::default_due_date(issued);
        assert_eq!(due, Utc.with_ymd_and_hms(2024, 1, 17, 10, 0, 0).unwrap());
    }

    #[test]
    fn open_loan_within_window_is_issued() {
        let due = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap();
        assert_eq!(loan(due, false).status_at(now), LoanStatus::Issued);
    }

    #[test]
    fn open_loan_past_due_is_overdue() {
        let due = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap();
        assert_eq!(loan(due, false).status_at(now), LoanStatus::Overdue);
    }

    #[test]
    fn due_date_boundary_is_not_overdue() {
        let due = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(loan(due, false).status_at(due), LoanStatus::Issued);
    }

    #[test]
    fn returned_loan_is_terminal_even_past_due() {
        let due = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(loan(due, true).status_at(now), LoanStatus::Returned);
    }
}

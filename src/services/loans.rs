//! Loan management service
//!
//! Issue, return and renew each run as one transaction against the loan
//! records and the inventory ledger. Precondition failures abort before
//! any write; the ledger and the loan set always move together.

use chrono::{DateTime, Duration, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookShort,
        loan::{IssueBook, Loan, LoanDetails, LoanState},
        user::UserShort,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Issue a book to a user.
    ///
    /// Checked in order inside the transaction: the borrower exists, the
    /// book exists, a copy is available, and the pair has no open loan.
    /// On success one copy leaves the ledger and a loan is created with a
    /// fourteen-day window from the issue date.
    pub async fn issue(&self, request: &IssueBook) -> AppResult<LoanDetails> {
        let mut tx = self.repository.pool.begin().await?;

        let user = match (request.user_id, request.user_email.as_deref()) {
            (Some(id), _) => self
                .repository
                .users
                .find_by_id(&mut tx, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?,
            (None, Some(email)) => self
                .repository
                .users
                .find_by_email(&mut tx, email)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("User with email {} not found", email)))?,
            (None, None) => {
                return Err(AppError::Validation(
                    "user_id or user_email is required".to_string(),
                ))
            }
        };

        let book = self
            .repository
            .books
            .find_by_id(&mut tx, request.book_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Book with id {} not found", request.book_id))
            })?;

        let inventory = self
            .repository
            .inventory
            .get_for_update(&mut tx, &book.isbn)
            .await?;
        let available = inventory.map(|r| r.available_copies).unwrap_or(0);
        if available <= 0 {
            return Err(AppError::Conflict("No available copies".to_string()));
        }

        if self
            .repository
            .loans
            .open_loan_exists(&mut tx, user.id, book.id)
            .await?
        {
            return Err(AppError::Conflict(
                "Book already issued to this user".to_string(),
            ));
        }

        if !self.repository.inventory.take_copy(&mut tx, &book.isbn).await? {
            return Err(AppError::Conflict("No available copies".to_string()));
        }

        let issue_date = request.issue_date.unwrap_or_else(Utc::now);
        let due_date = Loan::default_due_date(issue_date);
        let loan = self
            .repository
            .loans
            .insert(&mut tx, user.id, book.id, issue_date, due_date)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Issued book id={} to user id={} (loan id={}, due {})",
            book.id,
            user.id,
            loan.id,
            due_date
        );

        Ok(Self::details(loan, book_short(&book), Some(user_short(&user))))
    }

    /// Return a loan.
    ///
    /// Returning twice is a conflict, so a double scan can never restock
    /// the same copy twice. A missing inventory record is tolerated: the
    /// loan still closes, and the anomaly is logged for repair.
    pub async fn return_loan(
        &self,
        loan_id: i32,
        return_date: Option<DateTime<Utc>>,
    ) -> AppResult<LoanDetails> {
        let mut tx = self.repository.pool.begin().await?;

        let loan = self.repository.loans.get_by_id(&mut tx, loan_id).await?;
        if loan.returned {
            return Err(AppError::Conflict("Loan already returned".to_string()));
        }

        let returned_at = return_date.unwrap_or_else(Utc::now);
        self.repository
            .loans
            .mark_returned(&mut tx, loan_id, returned_at)
            .await?;

        let book = self.repository.books.find_by_id(&mut tx, loan.book_id).await?;
        match &book {
            Some(book) => {
                let restocked = self
                    .repository
                    .inventory
                    .restock_copy(&mut tx, &book.isbn)
                    .await?;
                if !restocked {
                    tracing::warn!(
                        "No inventory record for ISBN {}; returned copy not restocked",
                        book.isbn
                    );
                }
            }
            None => {
                tracing::warn!(
                    "Book id={} referenced by loan id={} is missing; returned copy not restocked",
                    loan.book_id,
                    loan_id
                );
            }
        }

        let user = self.repository.users.find_by_id(&mut tx, loan.user_id).await?;

        tx.commit().await?;

        let loan = Loan {
            returned: true,
            actual_return_date: Some(returned_at),
            ..loan
        };
        let book = book.map(|b| book_short(&b)).unwrap_or_else(|| BookShort {
            id: loan.book_id,
            isbn: String::new(),
            title: String::new(),
            author: String::new(),
            cover: None,
        });

        Ok(Self::details(loan, book, user.map(|u| user_short(&u))))
    }

    /// Renew a loan, extending the current due date by `days`. Renewals
    /// compound: the extension is applied to the existing due date, not
    /// to the clock.
    pub async fn renew_loan(&self, loan_id: i32, days: Option<i64>) -> AppResult<LoanDetails> {
        let days = days.unwrap_or(crate::models::loan::LOAN_PERIOD_DAYS);
        if days <= 0 {
            return Err(AppError::Validation(
                "Renewal window must be positive".to_string(),
            ));
        }

        let mut tx = self.repository.pool.begin().await?;

        let loan = self.repository.loans.get_by_id(&mut tx, loan_id).await?;
        if loan.returned {
            return Err(AppError::Conflict("Cannot renew a returned loan".to_string()));
        }

        let new_due_date = loan.due_date + Duration::days(days);
        self.repository
            .loans
            .set_due_date(&mut tx, loan_id, new_due_date)
            .await?;

        let book = self.repository.books.find_by_id(&mut tx, loan.book_id).await?;
        let user = self.repository.users.find_by_id(&mut tx, loan.user_id).await?;

        tx.commit().await?;

        tracing::info!("Renewed loan id={} until {}", loan_id, new_due_date);

        let loan = Loan {
            due_date: new_due_date,
            ..loan
        };
        let book = book.map(|b| book_short(&b)).unwrap_or_else(|| BookShort {
            id: loan.book_id,
            isbn: String::new(),
            title: String::new(),
            author: String::new(),
            cover: None,
        });

        Ok(Self::details(loan, book, user.map(|u| user_short(&u))))
    }

    /// Loans held by a user
    pub async fn loans_for_user(
        &self,
        user_id: i32,
        state: LoanState,
        search: Option<&str>,
    ) -> AppResult<Vec<LoanDetails>> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;
        self.repository.loans.list_for_user(user_id, state, search).await
    }

    /// Loans referencing a book
    pub async fn loans_for_book(&self, book_id: i32, state: LoanState) -> AppResult<Vec<LoanDetails>> {
        // Verify book exists
        self.repository.books.get_by_id(book_id).await?;
        self.repository.loans.list_for_book(book_id, state).await
    }

    fn details(loan: Loan, book: BookShort, user: Option<UserShort>) -> LoanDetails {
        let status = loan.status_at(Utc::now());
        LoanDetails {
            id: loan.id,
            book,
            user,
            issue_date: loan.issue_date,
            due_date: loan.due_date,
            status,
            actual_return_date: loan.actual_return_date,
        }
    }
}

fn book_short(book: &crate::models::book::Book) -> BookShort {
    BookShort {
        id: book.id,
        isbn: book.isbn.clone(),
        title: book.title.clone(),
        author: book.author.clone(),
        cover: book.cover.clone(),
    }
}

fn user_short(user: &crate::models::user::User) -> UserShort {
    UserShort {
        id: user.id,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        role: user.role,
    }
}

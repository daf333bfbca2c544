//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, loans, users, wishlist};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "1.0.0",
        description = "Library Management System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "Libris Team", email = "contact@libris.org")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::signup,
        auth::signin,
        auth::refresh_token,
        auth::logout,
        auth::signup_otp,
        auth::forgot_password,
        auth::verify_otp,
        // Books
        books::list_books,
        books::list_categories,
        books::get_book,
        books::get_book_by_isbn,
        books::admin_list_books,
        books::admin_get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::list_book_loans,
        books::get_inventory,
        // Users
        users::me,
        users::update_profile,
        users::change_password,
        users::borrowed_books,
        users::reading_history,
        users::list_users,
        users::list_user_loans,
        users::delete_user,
        // Loans
        loans::issue_book,
        loans::return_loan,
        loans::renew_loan,
        // Wishlist
        wishlist::get_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
    ),
    components(
        schemas(
            // Auth
            auth::SigninRequest,
            auth::SigninResponse,
            auth::UserInfo,
            auth::RefreshRequest,
            auth::RefreshResponse,
            auth::OtpRequest,
            auth::VerifyOtpRequest,
            // Books
            crate::models::book::Book,
            crate::models::book::BookShort,
            crate::models::book::BookSummary,
            crate::models::book::BookDetails,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::AvailabilityStatus,
            crate::models::inventory::InventoryRecord,
            // Loans
            crate::models::loan::LoanDetails,
            crate::models::loan::LoanStatus,
            crate::models::loan::LoanState,
            crate::models::loan::IssueBook,
            loans::ReturnRequest,
            loans::RenewRequest,
            // Users
            crate::models::user::Role,
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::Signup,
            crate::models::user::UpdateProfile,
            crate::models::user::ChangePassword,
            // Wishlist
            crate::models::wishlist::WishlistBook,
            // Shared
            super::MessageResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Authentication and OTP flows"),
        (name = "books", description = "Public catalog"),
        (name = "loans", description = "Loan circulation"),
        (name = "users", description = "User accounts"),
        (name = "wishlist", description = "Saved books"),
        (name = "admin", description = "Admin console")
    )
)]
pub struct ApiDoc;

/// Create the Swagger UI router serving the OpenAPI document
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

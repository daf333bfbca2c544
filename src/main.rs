//! Libris Server - Library Management System
//!
//! A Rust REST API server for library management.

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use libris_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("libris_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Libris Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, config.auth.clone(), config.email.clone());

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/signup", post(api::auth::signup))
        .route("/auth/signin", post(api::auth::signin))
        .route("/auth/token", post(api::auth::refresh_token))
        .route("/auth/logout", post(api::auth::logout))
        .route("/auth/signup-otp", post(api::auth::signup_otp))
        .route("/auth/forgot", post(api::auth::forgot_password))
        .route("/auth/verify", post(api::auth::verify_otp))
        // Public catalog
        .route("/books", get(api::books::list_books))
        .route("/books/categories", get(api::books::list_categories))
        .route("/books/isbn/:isbn", get(api::books::get_book_by_isbn))
        .route("/books/:id", get(api::books::get_book))
        // Current user
        .route("/users/me", get(api::users::me))
        .route("/users/me", patch(api::users::update_profile))
        .route("/users/me/password", put(api::users::change_password))
        .route("/users/me/borrowed-books", get(api::users::borrowed_books))
        .route("/users/me/reading-history", get(api::users::reading_history))
        .route("/users/me/wishlist", get(api::wishlist::get_wishlist))
        .route("/users/me/wishlist/:book_id", post(api::wishlist::add_to_wishlist))
        .route("/users/me/wishlist/:book_id", delete(api::wishlist::remove_from_wishlist))
        // Admin console: book lifecycle
        .route("/admin/books", get(api::books::admin_list_books))
        .route("/admin/books", post(api::books::create_book))
        .route("/admin/books/:id", get(api::books::admin_get_book))
        .route("/admin/books/:id", put(api::books::update_book))
        .route("/admin/books/:id", delete(api::books::delete_book))
        .route("/admin/books/:id/loans", get(api::books::list_book_loans))
        .route("/admin/inventory/:isbn", get(api::books::get_inventory))
        // Admin console: circulation
        .route("/admin/loans", post(api::loans::issue_book))
        .route("/admin/loans/:id/return", post(api::loans::return_loan))
        .route("/admin/loans/:id/renew", post(api::loans::renew_loan))
        // Admin console: users
        .route("/admin/users", get(api::users::list_users))
        .route("/admin/users/:id/loans", get(api::users::list_user_loans))
        .route("/admin/users/:id", delete(api::users::delete_user))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

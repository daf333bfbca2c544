//! API integration tests
//!
//! Run with: cargo test -- --ignored
//! Requires a running server and a seeded admin account
//! (override with LIBRIS_TEST_ADMIN_EMAIL / LIBRIS_TEST_ADMIN_PASSWORD).

use reqwest::Client;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get an authenticated admin token
async fn admin_token(client: &Client) -> String {
    let email = std::env::var("LIBRIS_TEST_ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@libris.local".to_string());
    let password = std::env::var("LIBRIS_TEST_ADMIN_PASSWORD")
        .unwrap_or_else(|_| "admin-password".to_string());

    let response = client
        .post(format!("{}/auth/signin", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send signin request");

    let body: Value = response.json().await.expect("Failed to parse signin response");
    body["access_token"]
        .as_str()
        .expect("No access token in response")
        .to_string()
}

/// ISBN unique to this test run
fn unique_isbn() -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
    format!("978-1-{:04}{:05}", now.subsec_micros() % 10_000, now.as_secs() % 100_000)
}

/// Email unique to this test run
fn unique_email(prefix: &str) -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
    format!("{}-{}{}@libris.local", prefix, now.as_secs(), now.subsec_micros())
}

/// Create a book with the given number of copies, returning its id
async fn create_book(client: &Client, token: &str, isbn: &str, copies: i32) -> i64 {
    let response = client
        .post(format!("{}/admin/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Integration Test Book",
            "author": "Test Author",
            "publish_date": "2020",
            "isbn": isbn,
            "pages": 321,
            "language": "en",
            "location": "T-1",
            "total_copies": copies
        }))
        .send()
        .await
        .expect("Failed to send create book request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse book response");
    body["id"].as_i64().expect("No book ID")
}

/// Register a student account, returning (id, email)
async fn create_student(client: &Client) -> (i64, String) {
    let email = unique_email("student");
    let response = client
        .post(format!("{}/auth/signup", BASE_URL))
        .json(&json!({
            "first_name": "Test",
            "last_name": "Student",
            "email": email,
            "password": "student-password"
        }))
        .send()
        .await
        .expect("Failed to send signup request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse signup response");
    (body["id"].as_i64().expect("No user ID"), email)
}

/// Issue a book to a user, returning the loan id
async fn issue_book(client: &Client, token: &str, book_id: i64, user_id: i64) -> i64 {
    let response = client
        .post(format!("{}/admin/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id, "user_id": user_id }))
        .send()
        .await
        .expect("Failed to send issue request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse loan response");
    body["id"].as_i64().expect("No loan ID")
}

/// Read a book's inventory counts
async fn book_counts(client: &Client, book_id: i64) -> (i64, i64) {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send get book request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse book response");
    (
        body["total_copies"].as_i64().expect("No total_copies"),
        body["available_copies"].as_i64().expect("No available_copies"),
    )
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_signin_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/signin", BASE_URL))
        .json(&json!({
            "email": "nobody@libris.local",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_admin_access() {
    let client = Client::new();

    let response = client
        .post(format!("{}/admin/books", BASE_URL))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_is_rejected() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let isbn = unique_isbn();

    create_book(&client, &token, &isbn, 1).await;

    let response = client
        .post(format!("{}/admin/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Duplicate",
            "author": "Test Author",
            "publish_date": "2020",
            "isbn": isbn,
            "pages": 100,
            "language": "en",
            "location": "T-1"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_issue_return_round_trip() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let isbn = unique_isbn();

    let book_id = create_book(&client, &token, &isbn, 3).await;
    assert_eq!(book_counts(&client, book_id).await, (3, 3));

    let (user_id, _) = create_student(&client).await;
    let loan_id = issue_book(&client, &token, book_id, user_id).await;
    assert_eq!(book_counts(&client, book_id).await, (3, 2));

    let response = client
        .post(format!("{}/admin/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 200);
    assert_eq!(book_counts(&client, book_id).await, (3, 3));
}

#[tokio::test]
#[ignore]
async fn test_return_twice_conflicts_and_restocks_once() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let isbn = unique_isbn();

    let book_id = create_book(&client, &token, &isbn, 2).await;
    let (user_id, _) = create_student(&client).await;
    let loan_id = issue_book(&client, &token, book_id, user_id).await;

    let first = client
        .post(format!("{}/admin/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(first.status(), 200);

    let second = client
        .post(format!("{}/admin/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(second.status(), 409);

    // Restocked exactly once
    assert_eq!(book_counts(&client, book_id).await, (2, 2));
}

#[tokio::test]
#[ignore]
async fn test_issue_without_copies_conflicts() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let isbn = unique_isbn();

    let book_id = create_book(&client, &token, &isbn, 0).await;
    let (user_id, _) = create_student(&client).await;

    let response = client
        .post(format!("{}/admin/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id, "user_id": user_id }))
        .send()
        .await
        .expect("Failed to send issue request");

    assert_eq!(response.status(), 409);
    // No inventory change
    assert_eq!(book_counts(&client, book_id).await, (0, 0));
}

#[tokio::test]
#[ignore]
async fn test_double_issue_to_same_user_conflicts() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let isbn = unique_isbn();

    let book_id = create_book(&client, &token, &isbn, 5).await;
    let (user_id, _) = create_student(&client).await;
    issue_book(&client, &token, book_id, user_id).await;

    let response = client
        .post(format!("{}/admin/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id, "user_id": user_id }))
        .send()
        .await
        .expect("Failed to send issue request");

    assert_eq!(response.status(), 409);
    // Only the first copy left the shelf
    assert_eq!(book_counts(&client, book_id).await, (5, 4));
}

#[tokio::test]
#[ignore]
async fn test_delete_book_with_open_loan_conflicts() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let isbn = unique_isbn();

    let book_id = create_book(&client, &token, &isbn, 1).await;
    let (user_id, _) = create_student(&client).await;
    issue_book(&client, &token, book_id, user_id).await;

    let response = client
        .delete(format!("{}/admin/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send delete request");

    assert_eq!(response.status(), 409);

    // Book and inventory unchanged
    assert_eq!(book_counts(&client, book_id).await, (1, 0));
}

#[tokio::test]
#[ignore]
async fn test_renew_extends_current_due_date() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let isbn = unique_isbn();

    let book_id = create_book(&client, &token, &isbn, 1).await;
    let (user_id, _) = create_student(&client).await;

    let response = client
        .post(format!("{}/admin/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "book_id": book_id,
            "user_id": user_id,
            "issue_date": "2024-01-01T00:00:00Z"
        }))
        .send()
        .await
        .expect("Failed to send issue request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse loan response");
    let loan_id = body["id"].as_i64().expect("No loan ID");
    assert_eq!(body["due_date"], "2024-01-15T00:00:00Z");

    let response = client
        .post(format!("{}/admin/loans/{}/renew", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "days": 7 }))
        .send()
        .await
        .expect("Failed to send renew request");
    assert_eq!(response.status(), 200);

    // Extended from the due date, not from today
    let body: Value = response.json().await.expect("Failed to parse renew response");
    assert_eq!(body["due_date"], "2024-01-22T00:00:00Z");
}

#[tokio::test]
#[ignore]
async fn test_renew_returned_loan_conflicts() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let isbn = unique_isbn();

    let book_id = create_book(&client, &token, &isbn, 1).await;
    let (user_id, _) = create_student(&client).await;
    let loan_id = issue_book(&client, &token, book_id, user_id).await;

    let response = client
        .post(format!("{}/admin/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 200);

    let response = client
        .post(format!("{}/admin/loans/{}/renew", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send renew request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_reducing_capacity_clamps_availability() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let isbn = unique_isbn();

    let book_id = create_book(&client, &token, &isbn, 10).await;

    let response = client
        .put(format!("{}/admin/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "total_copies": 4 }))
        .send()
        .await
        .expect("Failed to send update request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse update response");
    assert_eq!(body["total_copies"], 4);
    assert_eq!(body["available_copies"], 4);
}

#[tokio::test]
#[ignore]
async fn test_delete_user_cascade() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let isbn = unique_isbn();

    let book_id = create_book(&client, &token, &isbn, 2).await;
    let (user_id, _) = create_student(&client).await;

    // Deleting while a loan is open is refused
    let loan_id = issue_book(&client, &token, book_id, user_id).await;
    let response = client
        .delete(format!("{}/admin/users/{}", BASE_URL, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(response.status(), 409);

    // After returning, the cascade goes through
    let response = client
        .post(format!("{}/admin/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 200);

    let response = client
        .delete(format!("{}/admin/users/{}", BASE_URL, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(response.status(), 204);

    // Closed loan history went with the account
    let response = client
        .get(format!("{}/admin/users/{}/loans", BASE_URL, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send loans request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_wishlist_add_is_idempotent() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let isbn = unique_isbn();
    let book_id = create_book(&client, &token, &isbn, 1).await;

    let (_, email) = create_student(&client).await;
    let response = client
        .post(format!("{}/auth/signin", BASE_URL))
        .json(&json!({ "email": email, "password": "student-password" }))
        .send()
        .await
        .expect("Failed to send signin request");
    let body: Value = response.json().await.expect("Failed to parse signin response");
    let student_token = body["access_token"].as_str().expect("No token").to_string();

    for _ in 0..2 {
        let response = client
            .post(format!("{}/users/me/wishlist/{}", BASE_URL, book_id))
            .header("Authorization", format!("Bearer {}", student_token))
            .send()
            .await
            .expect("Failed to send wishlist request");
        assert_eq!(response.status(), 201);
    }

    let response = client
        .get(format!("{}/users/me/wishlist", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .expect("Failed to send wishlist request");
    let body: Value = response.json().await.expect("Failed to parse wishlist response");
    let matches = body
        .as_array()
        .expect("Wishlist is not an array")
        .iter()
        .filter(|entry| entry["book_id"].as_i64() == Some(book_id))
        .count();
    assert_eq!(matches, 1);
}

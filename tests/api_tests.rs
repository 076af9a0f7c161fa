//! API integration tests
//!
//! These run against a live server with a freshly migrated database and the
//! default bootstrap admin account (admin/admin).

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api";

/// Unique suffix so repeated runs don't trip unique constraints
fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("Clock before epoch")
        .subsec_nanos();
    format!("{} {}", prefix, nanos)
}

/// Helper to get an admin token
async fn get_admin_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/user/login", BASE_URL))
        .json(&json!({
            "user": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["data"]["access_token"]
        .as_str()
        .expect("No token in response")
        .to_string()
}

/// Helper to register a Public account and log in as it
async fn get_public_token(client: &Client, admin_token: &str) -> (String, String) {
    let username = unique("reader").replace(' ', "");

    let response = client
        .post(format!("{}/user/register", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "first_name": "Test",
            "last_name": "Reader",
            "password1": "testpass",
            "password2": "testpass"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/user/login", BASE_URL))
        .json(&json!({
            "user": username,
            "password": "testpass"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    let token = body["data"]["access_token"]
        .as_str()
        .expect("No token in response")
        .to_string();

    (token, username)
}

/// Helper to create a book with the given number of copies
async fn create_book(client: &Client, admin_token: &str, copies: i32) -> String {
    let response = client
        .post(format!("{}/book", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({
            "title": unique("Test Book"),
            "author": "Test Author",
            "short_description": "short",
            "full_description": "full",
            "copies": copies
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["data"]["id"].as_str().expect("No book ID").to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
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
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/user/login", BASE_URL))
        .json(&json!({
            "user": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"]["access_token"].is_string());
    assert_eq!(body["data"]["role"], "admin");
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_password() {
    let client = Client::new();

    let response = client
        .post(format!("{}/user/login", BASE_URL))
        .json(&json!({
            "user": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "FORBIDDEN");
}

#[tokio::test]
#[ignore]
async fn test_login_unknown_user() {
    let client = Client::new();

    let response = client
        .post(format!("{}/user/login", BASE_URL))
        .json(&json!({
            "user": "nobody-here",
            "password": "whatever"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_missing_token_rejected() {
    let client = Client::new();

    let response = client
        .get(format!("{}/book", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_logout_revokes_token() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let (token, _) = get_public_token(&client, &admin_token).await;

    let response = client
        .delete(format!("{}/user/logout", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    // Same token is rejected afterwards
    let response = client
        .get(format!("{}/book", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let response = client
        .get(format!("{}/book", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"].is_array());
    assert!(body["total"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_create_and_delete_category() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let response = client
        .post(format!("{}/category", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": unique("Science Fiction") }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let category_id = body["data"]["id"].as_str().expect("No category ID");

    let response = client
        .delete(format!("{}/category/{}", BASE_URL, category_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_create_and_delete_book() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let book_id = create_book(&client, &token, 2).await;

    let response = client
        .get(format!("{}/book/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["copies"], 2);

    let response = client
        .delete(format!("{}/book/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_public_cannot_list_users() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let (token, _) = get_public_token(&client, &admin_token).await;

    let response = client
        .get(format!("{}/user", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_borrow_return_flow() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let (token, _) = get_public_token(&client, &admin_token).await;
    let book_id = create_book(&client, &admin_token, 1).await;

    // Borrow
    let response = client
        .get(format!("{}/book/borrow/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    // Second borrow of the same book conflicts
    let response = client
        .get(format!("{}/book/borrow/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);

    // Shows up in my_books
    let response = client
        .get(format!("{}/my_books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let ids: Vec<&str> = body["data"]
        .as_array()
        .expect("No data array")
        .iter()
        .filter_map(|b| b["id"].as_str())
        .collect();
    assert!(ids.contains(&book_id.as_str()));

    // Return
    let response = client
        .get(format!("{}/book/return/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    // Returning again is rejected
    let response = client
        .get(format!("{}/book/return/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_review_requires_borrow() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let (token, _) = get_public_token(&client, &admin_token).await;
    let book_id = create_book(&client, &admin_token, 1).await;

    // Review without ever borrowing is rejected
    let response = client
        .post(format!("{}/book/review/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "rating": 5, "review": "great" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_review_flow() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let (token, _) = get_public_token(&client, &admin_token).await;
    let book_id = create_book(&client, &admin_token, 1).await;

    // Borrow to become eligible
    let response = client
        .get(format!("{}/book/borrow/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Create review
    let response = client
        .post(format!("{}/book/review/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "rating": 4, "review": "solid read" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let review_id = body["data"]["id"].as_str().expect("No review ID").to_string();

    // A second review of the same book conflicts
    let response = client
        .post(format!("{}/book/review/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "rating": 2, "review": "changed my mind" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);

    // Rating aggregate lands on the book
    let response = client
        .get(format!("{}/book/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["overall_rating"], 4.0);
    assert_eq!(body["data"]["total_review"], 1);

    // Edit the review
    let response = client
        .put(format!("{}/book/review/{}", BASE_URL, review_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "rating": 2, "review": "on reflection" }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/book/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["overall_rating"], 2.0);
    assert_eq!(body["data"]["total_review"], 1);
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_of_last_copy() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin_token, 1).await;

    let mut tokens = Vec::new();
    for _ in 0..3 {
        let (token, _) = get_public_token(&client, &admin_token).await;
        tokens.push(token);
    }

    // Fire all borrows at once; exactly one may win the last copy
    let mut handles = Vec::new();
    for token in tokens {
        let book_id = book_id.clone();
        handles.push(tokio::spawn(async move {
            let client = Client::new();
            client
                .get(format!("{}/book/borrow/{}", BASE_URL, book_id))
                .header("Authorization", format!("Bearer {}", token))
                .send()
                .await
                .expect("Failed to send request")
                .status()
                .as_u16()
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.expect("Borrow task panicked") {
            200 => successes += 1,
            409 => conflicts += 1,
            other => panic!("Unexpected status {}", other),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 2);
}

#[tokio::test]
#[ignore]
async fn test_rating_averages_across_reviewers() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin_token, 2).await;

    // Two readers borrow and review with ratings 4 and 3
    for rating in [4, 3] {
        let (token, _) = get_public_token(&client, &admin_token).await;

        let response = client
            .get(format!("{}/book/borrow/{}", BASE_URL, book_id))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());

        let response = client
            .post(format!("{}/book/review/{}", BASE_URL, book_id))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({ "rating": rating, "review": "fine" }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201);
    }

    // (4 + 3) / 2 rounds to 3.5 at one decimal
    let response = client
        .get(format!("{}/book/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to send request");

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["overall_rating"], 3.5);
    assert_eq!(body["data"]["total_review"], 2);
}

#[tokio::test]
#[ignore]
async fn test_review_edit_by_non_owner_rejected() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let (owner_token, _) = get_public_token(&client, &admin_token).await;
    let (other_token, _) = get_public_token(&client, &admin_token).await;
    let book_id = create_book(&client, &admin_token, 2).await;

    let response = client
        .get(format!("{}/book/borrow/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/book/review/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&json!({ "rating": 5, "review": "mine" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let review_id = body["data"]["id"].as_str().expect("No review ID");

    // Someone else editing the review is rejected
    let response = client
        .put(format!("{}/book/review/{}", BASE_URL, review_id))
        .header("Authorization", format!("Bearer {}", other_token))
        .json(&json!({ "rating": 1, "review": "not mine" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);

    // The owner's rating is untouched
    let response = client
        .get(format!("{}/book/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to send request");

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["overall_rating"], 5.0);
}

#[tokio::test]
#[ignore]
async fn test_history_recorded() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let (token, username) = get_public_token(&client, &admin_token).await;
    let book_id = create_book(&client, &admin_token, 1).await;

    let response = client
        .get(format!("{}/book/borrow/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Public caller sees only their own entries
    let response = client
        .get(format!("{}/history", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let entries = body["data"].as_array().expect("No data array");
    assert!(!entries.is_empty());
    for entry in entries {
        assert_eq!(entry["user_name"].as_str(), Some(username.as_str()));
    }
}

//! Annotation store API integration tests

mod common;

use axum::http::StatusCode;
use serde_json::Value;
use shared_types::PageKey;

use book_server::models::{annotations, pages};
use common::setup_test_app;

const ONE_COMMENT: &str = r##"[{"id":"#a1","type":"Annotation","body":[{"type":"TextualBody","value":"Nice point","purpose":"commenting"}],"target":{"selector":[{"type":"TextQuoteSelector","exact":"cloud"}]},"style":"default-annotation"}]"##;
const ONE_HIGHLIGHT: &str = r##"[{"id":"#h1","type":"Annotation","body":[],"target":{"selector":[{"type":"TextQuoteSelector","exact":"agile"}]},"style":"green-highlight"}]"##;

async fn page_id(db: &sqlx::SqlitePool, chapter: i64, section: i64) -> i64 {
    pages::find(db, PageKey::new(chapter, section))
        .await
        .expect("page lookup failed")
        .expect("page not seeded")
        .id
}

#[tokio::test]
async fn test_fetch_without_session_returns_null() {
    let app = setup_test_app().await;
    let mut browser = app.browser();

    assert_eq!(browser.fetch(1, 4).await, Value::Null);
}

#[tokio::test]
async fn test_signed_in_reader_without_record_gets_null() {
    let app = setup_test_app().await;
    let mut browser = app.browser();
    browser.sign_in("alice-code").await;

    assert_eq!(browser.fetch(1, 4).await, Value::Null);
    assert_eq!(browser.fetch(99, 99).await, Value::Null);
}

#[tokio::test]
async fn test_upload_then_fetch_returns_exact_payload() {
    let app = setup_test_app().await;
    let mut browser = app.browser();
    browser.sign_in("alice-code").await;

    let reply = browser.upload(1, 4, ONE_COMMENT).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    assert_eq!(browser.fetch(1, 4).await, Value::String(ONE_COMMENT.to_string()));
    // Other pages are untouched.
    assert_eq!(browser.fetch(1, 5).await, Value::Null);
}

#[tokio::test]
async fn test_repeated_uploads_replace_the_single_record() {
    let app = setup_test_app().await;
    let mut browser = app.browser();
    browser.sign_in("alice-code").await;

    browser.upload(1, 4, ONE_COMMENT).await;
    browser.upload(1, 4, ONE_HIGHLIGHT).await;
    let reply = browser.upload(1, 4, "[]").await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    let user = book_server::models::users::find_by_provider(&app.db, "github", "1001")
        .await
        .unwrap()
        .expect("user created on sign-in");
    let page = page_id(&app.db, 1, 4).await;
    assert_eq!(annotations::count_for(&app.db, &user.id, page).await.unwrap(), 1);
    assert_eq!(browser.fetch(1, 4).await, Value::String("[]".to_string()));
}

#[tokio::test]
async fn test_second_upload_keeps_record_count() {
    let app = setup_test_app().await;
    let mut browser = app.browser();
    browser.sign_in("alice-code").await;

    let before = annotations::count_all(&app.db).await.unwrap();

    browser.upload(1, 4, "hello world").await;
    assert_eq!(annotations::count_all(&app.db).await.unwrap(), before + 1);

    browser.upload(1, 4, "goodbye moon").await;
    assert_eq!(annotations::count_all(&app.db).await.unwrap(), before + 1);
    assert_eq!(browser.fetch(1, 4).await, Value::String("goodbye moon".to_string()));
}

#[tokio::test]
async fn test_readers_only_see_their_own_annotations() {
    let app = setup_test_app().await;
    let mut alice = app.browser();
    let mut bob = app.browser();
    alice.sign_in("alice-code").await;
    bob.sign_in("bob-code").await;

    alice.upload(1, 4, ONE_COMMENT).await;
    assert_eq!(bob.fetch(1, 4).await, Value::Null);

    bob.upload(1, 4, ONE_HIGHLIGHT).await;
    assert_eq!(alice.fetch(1, 4).await, Value::String(ONE_COMMENT.to_string()));
    assert_eq!(bob.fetch(1, 4).await, Value::String(ONE_HIGHLIGHT.to_string()));
    assert_eq!(annotations::count_all(&app.db).await.unwrap(), 2);
}

#[tokio::test]
async fn test_anonymous_upload_is_accepted_and_dropped() {
    let app = setup_test_app().await;
    let mut browser = app.browser();

    let reply = browser.upload(1, 4, ONE_COMMENT).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert_eq!(annotations::count_all(&app.db).await.unwrap(), 0);

    // Signing in afterwards does not surface the anonymous upload.
    browser.sign_in("alice-code").await;
    assert_eq!(browser.fetch(1, 4).await, Value::Null);
}

#[tokio::test]
async fn test_anonymous_malformed_upload_is_a_no_op() {
    let app = setup_test_app().await;
    let mut browser = app.browser();
    let token = browser.csrf_token().await;

    let fields = [("chapter", "one"), ("annotation", ONE_COMMENT)];
    let reply = browser.post_form("/annotate", &fields, Some(&token)).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert_eq!(annotations::count_all(&app.db).await.unwrap(), 0);

    // The same body from a signed-in reader is rejected.
    browser.sign_in("alice-code").await;
    let token = browser.csrf_token().await;
    let reply = browser.post_form("/annotate", &fields, Some(&token)).await;
    assert!(reply.status.is_client_error());
    assert_eq!(annotations::count_all(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_html_fetch_redirects_home() {
    let app = setup_test_app().await;
    let mut browser = app.browser();
    browser.sign_in("alice-code").await;
    browser.upload(1, 4, ONE_COMMENT).await;

    let reply = browser.get("/fetch_annotations?chapter=1&section=4").await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), Some("/"));
}

#[tokio::test]
async fn test_upload_without_token_is_rejected() {
    let app = setup_test_app().await;
    let mut browser = app.browser();
    browser.sign_in("alice-code").await;

    let fields = [("chapter", "1"), ("section", "4"), ("annotation", ONE_COMMENT)];
    let reply = browser.post_form("/annotate", &fields, None).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);

    let reply = browser.post_form("/annotate", &fields, Some("forged")).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(annotations::count_all(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_upload_accepts_token_in_form_field() {
    let app = setup_test_app().await;
    let mut browser = app.browser();
    browser.sign_in("alice-code").await;
    let token = browser.csrf_token().await;

    let fields = [
        ("authenticity_token", token.as_str()),
        ("chapter", "1"),
        ("section", "-1"),
        ("annotation", ONE_HIGHLIGHT),
    ];
    let reply = browser.post_form("/annotate", &fields, None).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert_eq!(browser.fetch(1, -1).await, Value::String(ONE_HIGHLIGHT.to_string()));
}

#[tokio::test]
async fn test_upload_for_unknown_page_is_not_found() {
    let app = setup_test_app().await;
    let mut browser = app.browser();
    browser.sign_in("alice-code").await;

    let reply = browser.upload(42, 7, ONE_COMMENT).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(annotations::count_all(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_sign_out_hides_annotations() {
    let app = setup_test_app().await;
    let mut browser = app.browser();
    browser.sign_in("alice-code").await;
    browser.upload(1, 4, ONE_COMMENT).await;

    let token = browser.csrf_token().await;
    let reply = browser.post_form("/auth/logout", &[], Some(&token)).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);

    assert_eq!(browser.fetch(1, 4).await, Value::Null);

    // Signing back in restores them.
    browser.sign_in("alice-code").await;
    assert_eq!(browser.fetch(1, 4).await, Value::String(ONE_COMMENT.to_string()));
}

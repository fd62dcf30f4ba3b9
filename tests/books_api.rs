//! End-to-end behaviour of the `/books` HTTP surface against a throwaway store.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use bookshelf_app::Application;
use bookshelf_kernel::settings::{DatabaseSettings, Settings};

fn book1() -> Value {
    json!({
        "isbn": "1111111111",
        "amazon_url": "http://hostname.co/asdf",
        "author": "Arthur Author",
        "language": "english",
        "pages": 123,
        "publisher": "Publisher",
        "title": "Book Title",
        "year": 2017
    })
}

fn book2() -> Value {
    json!({
        "isbn": "2222222222222",
        "amazon_url": "http://hostname.co/qwerty",
        "author": "Bea Aruthur",
        "language": "spanish",
        "pages": 9,
        "publisher": "Another Publisher",
        "title": "Some Words",
        "year": 2020
    })
}

/// Not stored by `seeded()`
fn book3() -> Value {
    json!({
        "isbn": "3333333333",
        "amazon_url": "http://hostname.co/asdf",
        "author": "Unknown Author",
        "language": "a langauge",
        "pages": 420,
        "publisher": "the world",
        "title": "a picture book",
        "year": 1969
    })
}

fn with(mut record: Value, field: &str, value: Value) -> Value {
    record[field] = value;
    record
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

/// Router over a fresh temporary store holding book1 and book2
async fn seeded() -> Router {
    let mut settings = Settings::default();
    settings.database = DatabaseSettings::temporary();
    let router = Application::build(settings).unwrap().router();

    for book in [book1(), book2()] {
        let (status, _) = send(&router, Method::POST, "/books", Some(book)).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    router
}

#[tokio::test]
async fn list_returns_every_book() {
    let router = seeded().await;
    let (status, body) = send(&router, Method::GET, "/books", None).await;

    assert_eq!(status, StatusCode::OK);
    let books = body["books"].as_array().unwrap();
    assert_eq!(books.len(), 2);
    assert!(books.contains(&book1()));
    assert!(books.contains(&book2()));
}

#[tokio::test]
async fn fetch_one_returns_that_book() {
    let router = seeded().await;
    let (status, body) = send(&router, Method::GET, "/books/1111111111", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "book": book1() }));
}

#[tokio::test]
async fn fetch_missing_book_is_not_found() {
    let router = seeded().await;
    let (status, body) = send(&router, Method::GET, "/books/doesnotexist", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["status"], 404);
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn create_returns_inserted_book() {
    let router = seeded().await;
    let (status, body) = send(&router, Method::POST, "/books", Some(book3())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "book": book3() }));

    let (status, _) = send(&router, Method::GET, "/books/3333333333", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn create_rejects_each_invalid_field() {
    let router = seeded().await;
    let cases = [
        ("isbn", json!("333")),
        ("isbn", json!("3333333333333333")),
        ("amazon_url", json!("asdfg")),
        ("pages", json!(0)),
        ("year", json!("1/1/1900")),
        ("year", json!(2050)),
        ("title", json!("")),
    ];

    for (field, value) in cases {
        let payload = with(book3(), field, value.clone());
        let (status, body) = send(&router, Method::POST, "/books", Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{field} = {value}");
        assert_eq!(body["error"]["status"], 400);
        let messages = body["error"]["message"].as_array().unwrap();
        assert!(
            messages.iter().any(|m| m.as_str().unwrap().starts_with(field)),
            "{field} = {value} gave {messages:?}"
        );
    }

    let (_, body) = send(&router, Method::GET, "/books", None).await;
    assert_eq!(body["books"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn create_reports_every_violation_at_once() {
    let router = seeded().await;
    let payload = json!({
        "isbn": "333",
        "amazon_url": "asdfg",
        "author": "",
        "language": "english",
        "pages": 0,
        "publisher": "p",
        "title": "t",
        "year": "1/1/1900"
    });

    let (status, body) = send(&router, Method::POST, "/books", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn duplicate_isbn_conflicts() {
    let router = seeded().await;
    let duplicate = with(book3(), "isbn", json!("1111111111"));
    let (status, body) = send(&router, Method::POST, "/books", Some(duplicate)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["status"], 409);

    let (_, body) = send(&router, Method::GET, "/books/1111111111", None).await;
    assert_eq!(body["book"], book1());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let router = seeded().await;
    let request = Request::post("/books")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn replace_updates_and_is_idempotent() {
    let router = seeded().await;
    let edited = with(book2(), "title", json!("new title"));

    let first = send(&router, Method::PUT, "/books/2222222222222", Some(edited.clone())).await;
    let second = send(&router, Method::PUT, "/books/2222222222222", Some(edited.clone())).await;

    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(first.1, json!({ "book": edited }));
    assert_eq!(first, second);

    let (_, body) = send(&router, Method::GET, "/books/2222222222222", None).await;
    assert_eq!(body["book"], edited);
}

#[tokio::test]
async fn replace_rejects_invalid_fields_and_keeps_stored_record() {
    let router = seeded().await;
    let cases = [
        ("amazon_url", json!("asdfg")),
        ("pages", json!(0)),
        ("year", json!("1/1/1900")),
        ("year", json!(2050)),
    ];

    for (field, value) in cases {
        let payload = with(book2(), field, value.clone());
        let (status, _) = send(&router, Method::PUT, "/books/2222222222222", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{field} = {value}");
    }

    let (_, body) = send(&router, Method::GET, "/books/2222222222222", None).await;
    assert_eq!(body["book"], book2());
}

#[tokio::test]
async fn replace_with_invalid_isbn_is_a_bad_request() {
    let router = seeded().await;
    for isbn in ["222", "3333333333333333"] {
        let payload = with(book2(), "isbn", json!(isbn));
        let (status, _) = send(&router, Method::PUT, &format!("/books/{isbn}"), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "isbn {isbn}");
    }
}

#[tokio::test]
async fn replace_requires_matching_isbn() {
    let router = seeded().await;
    let (status, body) = send(&router, Method::PUT, "/books/2222222222222", Some(book1())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"][0]
        .as_str()
        .unwrap()
        .contains("2222222222222"));
}

#[tokio::test]
async fn replace_missing_book_is_not_found() {
    let router = seeded().await;
    let (status, _) = send(&router, Method::PUT, "/books/3333333333", Some(book3())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_book() {
    let router = seeded().await;
    let (status, body) = send(&router, Method::DELETE, "/books/1111111111", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Book deleted" }));

    let (status, _) = send(&router, Method::GET, "/books/1111111111", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&router, Method::DELETE, "/books/1111111111", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_route_uses_error_envelope() {
    let router = seeded().await;
    let (status, body) = send(&router, Method::GET, "/authors", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": { "message": "Not Found", "status": 404 } }));
}

#[tokio::test]
async fn openapi_documents_the_books_routes() {
    let router = seeded().await;
    let (status, body) = send(&router, Method::GET, "/docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/books"]["post"].is_object());
    assert!(body["paths"]["/books/{isbn}"]["put"].is_object());
    assert_eq!(
        body["components"]["schemas"]["Book"]["properties"]["isbn"]["maxLength"],
        13
    );
}

#[tokio::test]
async fn swagger_ui_serves_the_books_document() {
    let router = seeded().await;
    let (status, body) = send(&router, Method::GET, "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["openapi"], "3.1.0");
    assert!(body["paths"]["/books"]["get"].is_object());
    assert!(body["paths"]["/books/{isbn}"]["delete"].is_object());
    assert!(body["components"]["schemas"]["Book"].is_object());
}

//! HTTP handlers for `/books`.
//!
//! Each handler validates before touching the store, so a rejected payload
//! never causes a write.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use bookshelf_db::StoreError;
use bookshelf_http::AppError;

use super::models::{BookResponse, BooksResponse, MessageResponse};
use super::store::BookStore;
use super::validator::{Validator, Violations};

/// Shared by every books handler; cheap to clone per request.
#[derive(Clone)]
pub struct BooksState {
    pub store: Arc<dyn BookStore>,
    pub validator: Validator,
}

impl From<Violations> for AppError {
    fn from(violations: Violations) -> Self {
        AppError::validation(violations.messages())
    }
}

/// Store outcomes phrased in terms of the book the client asked for
fn store_error(isbn: &str, err: StoreError) -> AppError {
    match err {
        StoreError::NotFound { .. } => {
            AppError::not_found(format!("There is no book with an isbn of '{isbn}'"))
        }
        StoreError::Conflict { .. } => {
            AppError::conflict(format!("A book with isbn '{isbn}' already exists"))
        }
        other => other.into(),
    }
}

pub async fn list_books(State(state): State<BooksState>) -> Result<Json<BooksResponse>, AppError> {
    let books = state.store.fetch_all().await?;
    Ok(Json(BooksResponse { books }))
}

pub async fn get_book(
    State(state): State<BooksState>,
    Path(isbn): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let book = state
        .store
        .fetch_by_isbn(&isbn)
        .await
        .map_err(|err| store_error(&isbn, err))?;
    Ok(Json(BookResponse { book }))
}

pub async fn create_book(
    State(state): State<BooksState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let Json(payload) = payload?;
    let book = state.validator.validate(&payload)?;

    let isbn = book.isbn.clone();
    let book = state
        .store
        .create(book)
        .await
        .map_err(|err| store_error(&isbn, err))?;

    tracing::info!(isbn = %book.isbn, "book created");
    Ok((StatusCode::CREATED, Json(BookResponse { book })))
}

/// Full-record replace; the payload's isbn must equal the path's.
pub async fn replace_book(
    State(state): State<BooksState>,
    Path(isbn): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BookResponse>, AppError> {
    let Json(payload) = payload?;
    let book = state.validator.validate_replacement(&isbn, &payload)?;

    let book = state
        .store
        .replace(&isbn, book)
        .await
        .map_err(|err| store_error(&isbn, err))?;

    tracing::info!(isbn = %book.isbn, "book replaced");
    Ok(Json(BookResponse { book }))
}

pub async fn delete_book(
    State(state): State<BooksState>,
    Path(isbn): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .store
        .remove(&isbn)
        .await
        .map_err(|err| store_error(&isbn, err))?;

    tracing::info!(isbn = %isbn, "book deleted");
    Ok(Json(MessageResponse {
        message: "Book deleted".to_string(),
    }))
}

pub async fn health_check() -> &'static str {
    "books module is healthy"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::Book;
    use axum::response::IntoResponse;
    use bookshelf_db::StoreResult;
    use serde_json::json;

    /// A store whose backend is gone.
    struct UnavailableStore;

    #[async_trait::async_trait]
    impl BookStore for UnavailableStore {
        async fn create(&self, _book: Book) -> StoreResult<Book> {
            Err(StoreError::Storage(sled::Error::Unsupported("offline".into())))
        }

        async fn fetch_all(&self) -> StoreResult<Vec<Book>> {
            Err(StoreError::Storage(sled::Error::Unsupported("offline".into())))
        }

        async fn count(&self) -> StoreResult<usize> {
            Err(StoreError::Storage(sled::Error::Unsupported("offline".into())))
        }

        async fn fetch_by_isbn(&self, _isbn: &str) -> StoreResult<Book> {
            Err(StoreError::Storage(sled::Error::Unsupported("offline".into())))
        }

        async fn replace(&self, _isbn: &str, _book: Book) -> StoreResult<Book> {
            Err(StoreError::Storage(sled::Error::Unsupported("offline".into())))
        }

        async fn remove(&self, _isbn: &str) -> StoreResult<()> {
            Err(StoreError::Storage(sled::Error::Unsupported("offline".into())))
        }
    }

    fn unavailable() -> BooksState {
        BooksState {
            store: Arc::new(UnavailableStore),
            validator: Validator::at_year(2026),
        }
    }

    fn payload() -> Value {
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

    #[tokio::test]
    async fn storage_failure_is_a_server_error() {
        let err = list_books(State(unavailable())).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = create_book(State(unavailable()), Ok(Json(payload())))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn invalid_payload_never_reaches_the_store() {
        let mut bad = payload();
        bad["pages"] = json!(0);

        // The unavailable store would turn any write into a 500.
        let err = create_book(State(unavailable()), Ok(Json(bad.clone())))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = replace_book(
            State(unavailable()),
            Path("3333333333".to_string()),
            Ok(Json(bad)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_outcomes_name_the_isbn() {
        let err = store_error("123", StoreError::not_found("books", "123"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("'123'"));

        let err = store_error("123", StoreError::conflict("books", "123"));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}

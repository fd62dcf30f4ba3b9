use serde::{Deserialize, Serialize};

/// A validated book record, as stored and as returned to clients.
///
/// Only ever built by the validator or read back from the store, so every
/// instance satisfies the book schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// 10 to 13 character ISBN; the record's immutable key
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i64,
    pub publisher: String,
    pub title: String,
    pub year: i64,
}

/// `{ "book": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookResponse {
    pub book: Book,
}

/// `{ "books": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BooksResponse {
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

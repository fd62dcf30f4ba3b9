//! Persistence gateway for book records, keyed by ISBN.

use async_trait::async_trait;

use bookshelf_db::{Collection, Database, StoreError, StoreResult};

use super::models::Book;

/// What the request handlers need from storage.
///
/// Implementations own uniqueness: `create` and `replace` must each be a
/// single atomic check-and-write against the backing store.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Persist a new record; `Conflict` if the isbn is taken.
    async fn create(&self, book: Book) -> StoreResult<Book>;

    async fn fetch_all(&self) -> StoreResult<Vec<Book>>;

    /// Number of stored records, without decoding them.
    async fn count(&self) -> StoreResult<usize>;

    /// `NotFound` if no record has this isbn.
    async fn fetch_by_isbn(&self, isbn: &str) -> StoreResult<Book>;

    /// Overwrite every field of an existing record; `NotFound` if absent.
    async fn replace(&self, isbn: &str, book: Book) -> StoreResult<Book>;

    /// `NotFound` if absent.
    async fn remove(&self, isbn: &str) -> StoreResult<()>;
}

/// Books stored as JSON documents in a sled tree.
#[derive(Clone)]
pub struct SledBookStore {
    books: Collection<Book>,
}

impl SledBookStore {
    pub const COLLECTION: &'static str = "books";

    pub fn open(database: &Database) -> StoreResult<Self> {
        Ok(Self {
            books: database.collection(Self::COLLECTION)?,
        })
    }
}

#[async_trait]
impl BookStore for SledBookStore {
    async fn create(&self, book: Book) -> StoreResult<Book> {
        self.books.insert_new(&book.isbn, &book).await?;
        Ok(book)
    }

    async fn fetch_all(&self) -> StoreResult<Vec<Book>> {
        self.books.list()
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.books.len())
    }

    async fn fetch_by_isbn(&self, isbn: &str) -> StoreResult<Book> {
        self.books
            .get(isbn)?
            .ok_or_else(|| StoreError::not_found(Self::COLLECTION, isbn))
    }

    async fn replace(&self, isbn: &str, book: Book) -> StoreResult<Book> {
        self.books.replace_existing(isbn, &book).await?;
        Ok(book)
    }

    async fn remove(&self, isbn: &str) -> StoreResult<()> {
        self.books.remove(isbn).await
    }
}

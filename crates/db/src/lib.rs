//! Book document store.
//!
//! The collection is a set of [`Book`] documents keyed by a numeric id. The
//! store owns id assignment: a new book gets `max(id) + 1`, or `1` when the
//! collection is empty, computed under the same write lock that stores it.

use async_trait::async_trait;
use thiserror::Error;

pub mod document;
pub mod models;
pub mod seed;

pub use document::DocumentStore;
pub use models::{Book, BookDraft, BookId, FieldError, NewBook};

/// Errors returned by store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The document does not satisfy the collection schema.
    #[error("schema violation: {}", join_fields(.0))]
    Schema(Vec<FieldError>),

    /// A bulk load carried an id that is already taken.
    #[error("book {0} already exists")]
    DuplicateId(BookId),

    /// The highest stored id is the largest representable one.
    #[error("no id left after {0}")]
    IdSpaceExhausted(BookId),

    /// Reading or writing the backing file failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be encoded or decoded.
    #[error("document encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<Vec<FieldError>> for StoreError {
    fn from(errors: Vec<FieldError>) -> Self {
        StoreError::Schema(errors)
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A specialized Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistent collection of books.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books ordered by id ascending.
    async fn list(&self) -> Result<Vec<Book>>;

    /// A single book, or `None` if no book has that id.
    async fn get(&self, id: BookId) -> Result<Option<Book>>;

    /// Validate and store a new book under the next free id.
    async fn insert(&self, book: NewBook) -> Result<Book>;

    /// Merge `draft` onto an existing book. Returns `None` if the id is absent;
    /// never creates a record.
    async fn update(&self, id: BookId, draft: BookDraft) -> Result<Option<Book>>;

    /// Remove a book permanently. Returns whether it existed.
    async fn delete(&self, id: BookId) -> Result<bool>;

    /// Number of stored books.
    async fn count(&self) -> Result<usize>;

    /// Load books that already carry ids, all or nothing.
    async fn insert_many(&self, books: Vec<Book>) -> Result<usize>;
}

//! Admin-side access to the bookshop API.
//!
//! [`BookCache`] keeps an ordered copy of the inventory in memory, mirrors it
//! into a local storage slot, and reconciles it after every successful call
//! through a [`BookApi`].

use thiserror::Error;

pub mod api;
pub mod cache;
pub mod form;
pub mod storage;
pub mod view;

pub use api::{BookApi, HttpBookApi};
pub use cache::{BookCache, CacheSource};
pub use form::{BookForm, FormError};
pub use storage::LocalStorage;
pub use view::InventoryStats;

pub use bookshop_db::{Book, BookDraft, BookId, NewBook};

/// Errors returned by the client and cache.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server has no book with this id.
    #[error("book {0} not found")]
    NotFound(BookId),

    /// The server answered with a non-success status.
    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },

    /// The local storage slot could not be read or written.
    #[error("local storage failed: {0}")]
    Storage(#[from] std::io::Error),

    /// A snapshot could not be encoded or decoded.
    #[error("snapshot encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

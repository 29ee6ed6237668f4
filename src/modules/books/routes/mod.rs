//! HTTP handlers for `/api/books`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshop_db::{BookStore, StoreError};
use bookshop_http::error::AppError;

use super::models::{Book, BookDraft, BookId, DeleteConfirmation};

/// Store handle shared by every handler.
pub type SharedStore = Arc<dyn BookStore>;

/// Routes for the books module, relative to its mount point.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(store)
}

fn book_not_found(id: BookId) -> AppError {
    tracing::debug!(id, "book not found");
    AppError::not_found("Book not found")
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

/// All books ordered by id
async fn list_books(State(store): State<SharedStore>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(store.list().await?))
}

async fn get_book(
    State(store): State<SharedStore>,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = id?;
    match store.get(id).await? {
        Some(book) => Ok(Json(book)),
        None => Err(book_not_found(id)),
    }
}

/// Create a book; the store assigns the id
async fn create_book(
    State(store): State<SharedStore>,
    body: Result<Json<BookDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(draft) = body?;
    let new_book = draft.into_new_book().map_err(StoreError::Schema)?;

    let book = store.insert(new_book).await?;
    tracing::info!(id = book.id, title = %book.title, "book created");
    Ok((StatusCode::CREATED, Json(book)))
}

/// Merge the provided fields onto an existing book
async fn update_book(
    State(store): State<SharedStore>,
    id: Result<Path<BookId>, PathRejection>,
    body: Result<Json<BookDraft>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = id?;
    let Json(draft) = body?;

    match store.update(id, draft).await? {
        Some(book) => {
            tracing::info!(id, "book updated");
            Ok(Json(book))
        }
        None => Err(book_not_found(id)),
    }
}

async fn delete_book(
    State(store): State<SharedStore>,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<Json<DeleteConfirmation>, AppError> {
    let Path(id) = id?;

    if store.delete(id).await? {
        tracing::info!(id, "book deleted");
        Ok(Json(DeleteConfirmation::deleted()))
    } else {
        Err(book_not_found(id))
    }
}

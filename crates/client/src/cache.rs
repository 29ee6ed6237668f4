use bookshop_db::seed::default_books;
use tokio::sync::watch;

use crate::api::BookApi;
use crate::storage::LocalStorage;
use crate::view::InventoryStats;
use crate::{Book, BookDraft, BookId, NewBook, Result};

/// Where the cached books came from on the last load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    /// Nothing loaded yet.
    Empty,
    /// Fetched from the API.
    Remote,
    /// Read from the local storage slot because the API was unavailable.
    Snapshot,
    /// The bundled defaults, because neither the API nor a snapshot was available.
    Defaults,
}

/// Client-side copy of the inventory.
///
/// Reads degrade gracefully: a failed load falls back to the local snapshot
/// and then to the bundled defaults. Writes do not: a failed create, update,
/// or delete returns the error and leaves the cache as it was.
pub struct BookCache<A> {
    api: A,
    storage: LocalStorage,
    slot: String,
    books: Vec<Book>,
    source: CacheSource,
    revision: watch::Sender<u64>,
}

impl<A: BookApi> BookCache<A> {
    pub fn new(api: A, storage: LocalStorage, slot: impl Into<String>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            api,
            storage,
            slot: slot.into(),
            books: Vec::new(),
            source: CacheSource::Empty,
            revision,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Replace the cache with the server's listing, or the best offline substitute.
    pub async fn load(&mut self) -> CacheSource {
        match self.api.list_books().await {
            Ok(books) => {
                tracing::debug!(count = books.len(), "books loaded from server");
                self.books = books;
                self.source = CacheSource::Remote;
                self.persist().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch books from server");
                match self.read_snapshot().await {
                    Some(books) => {
                        tracing::info!(count = books.len(), "using local snapshot");
                        self.books = books;
                        self.source = CacheSource::Snapshot;
                    }
                    None => {
                        tracing::info!("using default books");
                        self.books = default_books();
                        self.source = CacheSource::Defaults;
                    }
                }
            }
        }

        self.notify();
        self.source
    }

    /// Refresh one book from the server, falling back to the cached copy.
    pub async fn fetch(&mut self, id: BookId) -> Option<Book> {
        match self.api.get_book(id).await {
            Ok(book) => {
                if let Some(slot) = self.books.iter_mut().find(|b| b.id == id) {
                    *slot = book.clone();
                    self.notify();
                }
                Some(book)
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "failed to fetch book; using cached copy");
                self.books.iter().find(|b| b.id == id).cloned()
            }
        }
    }

    /// Create a book on the server and append it locally.
    pub async fn create(&mut self, book: NewBook) -> Result<Book> {
        let created = self.api.create_book(&book).await?;
        self.books.push(created.clone());
        self.commit().await;
        Ok(created)
    }

    /// Update a book on the server and replace the local copy.
    pub async fn update(&mut self, id: BookId, draft: &BookDraft) -> Result<Book> {
        let updated = self.api.update_book(id, draft).await?;
        match self.books.iter_mut().find(|b| b.id == id) {
            Some(slot) => *slot = updated.clone(),
            None => self.books.push(updated.clone()),
        }
        self.commit().await;
        Ok(updated)
    }

    /// Delete a book on the server and drop the local copy.
    pub async fn delete(&mut self, id: BookId) -> Result<()> {
        self.api.delete_book(id).await?;
        self.books.retain(|b| b.id != id);
        self.commit().await;
        Ok(())
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Book at a table position.
    pub fn get_at(&self, index: usize) -> Option<&Book> {
        self.books.get(index)
    }

    /// Table position of the book with `id`.
    pub fn position(&self, id: BookId) -> Option<usize> {
        self.books.iter().position(|b| b.id == id)
    }

    pub fn source(&self) -> CacheSource {
        self.source
    }

    pub fn stats(&self) -> InventoryStats {
        InventoryStats::from_books(&self.books)
    }

    /// Revision counter bumped on every change to the cached books.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    async fn commit(&mut self) {
        self.persist().await;
        self.notify();
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    /// Write the snapshot. The server already holds the authoritative copy,
    /// so a failed write is logged rather than returned.
    async fn persist(&self) {
        let result = match serde_json::to_string(&self.books) {
            Ok(json) => self.storage.write(&self.slot, &json).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            tracing::warn!(slot = %self.slot, error = %e, "failed to persist local snapshot");
        }
    }

    async fn read_snapshot(&self) -> Option<Vec<Book>> {
        let contents = match self.storage.read(&self.slot).await {
            Ok(contents) => contents?,
            Err(e) => {
                tracing::warn!(slot = %self.slot, error = %e, "failed to read local snapshot");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(books) => Some(books),
            Err(e) => {
                tracing::warn!(slot = %self.slot, error = %e, "discarding unreadable local snapshot");
                None
            }
        }
    }
}

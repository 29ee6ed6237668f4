//! In-memory document collection with optional JSON-file persistence.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::models::{Book, BookDraft, BookId, NewBook};
use crate::{BookStore, Result, StoreError};

type Collection = BTreeMap<BookId, Book>;

/// Document store keeping the collection in a sorted map.
///
/// When opened on a file, the whole collection is rewritten after every
/// mutation through a temporary sibling file and a rename, so readers of the
/// file never see a partial write. A failed write rolls the in-memory change
/// back.
pub struct DocumentStore {
    books: RwLock<Collection>,
    path: Option<PathBuf>,
}

impl DocumentStore {
    /// A volatile store; nothing is written to disk.
    pub fn in_memory() -> Self {
        Self {
            books: RwLock::new(Collection::new()),
            path: None,
        }
    }

    /// Open the collection stored at `path`. A missing file is an empty collection.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let books = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Collection::new(),
            Ok(bytes) => {
                let documents: Vec<Book> = serde_json::from_slice(&bytes)?;
                let mut books = Collection::new();
                for book in documents {
                    book.validate()?;
                    let id = book.id;
                    if books.insert(id, book).is_some() {
                        return Err(StoreError::DuplicateId(id));
                    }
                }
                books
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Collection::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = %path.display(),
            count = books.len(),
            "document store opened"
        );

        Ok(Self {
            books: RwLock::new(books),
            path: Some(path),
        })
    }

    async fn persist(&self, books: &Collection) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let documents: Vec<&Book> = books.values().collect();
        let bytes = serde_json::to_vec_pretty(&documents)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, path).await?;

        tracing::trace!(path = %path.display(), count = books.len(), "collection persisted");
        Ok(())
    }
}

fn next_id(books: &Collection) -> Result<BookId> {
    match books.last_key_value() {
        Some((&max, _)) => max.checked_add(1).ok_or(StoreError::IdSpaceExhausted(max)),
        None => Ok(1),
    }
}

#[async_trait]
impl BookStore for DocumentStore {
    async fn list(&self) -> Result<Vec<Book>> {
        Ok(self.books.read().await.values().cloned().collect())
    }

    async fn get(&self, id: BookId) -> Result<Option<Book>> {
        Ok(self.books.read().await.get(&id).cloned())
    }

    async fn insert(&self, book: NewBook) -> Result<Book> {
        book.validate()?;

        let mut books = self.books.write().await;
        let id = next_id(&books)?;
        if books.contains_key(&id) {
            return Err(StoreError::DuplicateId(id));
        }
        let book = book.into_book(id, OffsetDateTime::now_utc());
        books.insert(id, book.clone());

        if let Err(e) = self.persist(&books).await {
            books.remove(&id);
            return Err(e);
        }

        tracing::debug!(id, title = %book.title, "book inserted");
        Ok(book)
    }

    async fn update(&self, id: BookId, draft: BookDraft) -> Result<Option<Book>> {
        let mut books = self.books.write().await;
        let Some(current) = books.get(&id) else {
            return Ok(None);
        };

        let mut merged = current.clone();
        draft.apply_to(&mut merged);
        merged.validate()?;
        merged.updated_at = Some(OffsetDateTime::now_utc());

        let previous = books.insert(id, merged.clone());
        if let Err(e) = self.persist(&books).await {
            if let Some(previous) = previous {
                books.insert(id, previous);
            }
            return Err(e);
        }

        tracing::debug!(id, "book updated");
        Ok(Some(merged))
    }

    async fn delete(&self, id: BookId) -> Result<bool> {
        let mut books = self.books.write().await;
        let Some(removed) = books.remove(&id) else {
            return Ok(false);
        };

        if let Err(e) = self.persist(&books).await {
            books.insert(id, removed);
            return Err(e);
        }

        tracing::debug!(id, "book deleted");
        Ok(true)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.books.read().await.len())
    }

    async fn insert_many(&self, batch: Vec<Book>) -> Result<usize> {
        let mut books = self.books.write().await;

        let mut seen = HashSet::new();
        for book in &batch {
            book.validate()?;
            if books.contains_key(&book.id) || !seen.insert(book.id) {
                return Err(StoreError::DuplicateId(book.id));
            }
        }

        let now = OffsetDateTime::now_utc();
        let count = batch.len();
        for mut book in batch {
            book.created_at.get_or_insert(now);
            book.updated_at.get_or_insert(now);
            books.insert(book.id, book);
        }

        if let Err(e) = self.persist(&books).await {
            for id in &seen {
                books.remove(id);
            }
            return Err(e);
        }

        tracing::debug!(count, "books loaded");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_book(title: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "George Orwell".to_string(),
            price: 11.99,
            pages: None,
            image: "1984.jpg".to_string(),
            rating: 4.6,
        }
    }

    fn ids(books: &[Book]) -> Vec<BookId> {
        books.iter().map(|b| b.id).collect()
    }

    #[tokio::test]
    async fn first_insert_gets_id_one_then_two() {
        let store = DocumentStore::in_memory();

        let first = store.insert(new_book("1984")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(first.title, "1984");
        assert_eq!(first.author, "George Orwell");
        assert!(first.created_at.is_some());

        let second = store.insert(new_book("Animal Farm")).await.unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn insert_uses_max_plus_one() {
        let store = DocumentStore::in_memory();
        let mut seeded = store.insert(new_book("a")).await.unwrap();
        seeded.id = 40;
        store.insert_many(vec![seeded]).await.unwrap();

        let next = store.insert(new_book("b")).await.unwrap();
        assert_eq!(next.id, 41);
    }

    #[tokio::test]
    async fn insert_after_largest_id_fails_without_overwriting() {
        let store = DocumentStore::in_memory();
        let mut last = store.insert(new_book("a")).await.unwrap();
        last.id = BookId::MAX;
        store.insert_many(vec![last]).await.unwrap();

        let err = store.insert(new_book("b")).await.unwrap_err();
        assert!(matches!(err, StoreError::IdSpaceExhausted(BookId::MAX)));
        let err = store.insert(new_book("c")).await.unwrap_err();
        assert!(matches!(err, StoreError::IdSpaceExhausted(BookId::MAX)));

        let books = store.list().await.unwrap();
        assert_eq!(ids(&books), vec![1, BookId::MAX]);
        assert!(books.iter().all(|b| b.title == "a"));
    }

    #[tokio::test]
    async fn delete_removes_from_listing_and_keeps_order() {
        let store = DocumentStore::in_memory();
        for title in ["a", "b", "c"] {
            store.insert(new_book(title)).await.unwrap();
        }

        assert!(store.delete(2).await.unwrap());
        assert_eq!(ids(&store.list().await.unwrap()), vec![1, 3]);
        assert!(store.get(2).await.unwrap().is_none());
        assert!(!store.delete(2).await.unwrap());
    }

    #[tokio::test]
    async fn update_of_missing_id_does_not_create() {
        let store = DocumentStore::in_memory();
        let draft = BookDraft {
            title: Some("Ghost".to_string()),
            ..BookDraft::default()
        };

        assert!(store.update(7, draft).await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn partial_update_preserves_other_fields() {
        let store = DocumentStore::in_memory();
        let mut original = new_book("1984");
        original.pages = Some(280);
        let created = store.insert(original).await.unwrap();

        let draft = BookDraft {
            rating: Some(4.9),
            ..BookDraft::default()
        };
        let updated = store.update(created.id, draft).await.unwrap().unwrap();

        assert_eq!(updated.rating, 4.9);
        assert_eq!(updated.title, created.title);
        assert_eq!(updated.author, created.author);
        assert_eq!(updated.price, created.price);
        assert_eq!(updated.pages, Some(280));
        assert_eq!(updated.image, created.image);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn invalid_update_leaves_record_untouched() {
        let store = DocumentStore::in_memory();
        let created = store.insert(new_book("1984")).await.unwrap();

        let draft = BookDraft {
            rating: Some(6.0),
            ..BookDraft::default()
        };
        let err = store.update(created.id, draft).await.unwrap_err();
        assert!(matches!(err, StoreError::Schema(_)));
        assert_eq!(store.get(created.id).await.unwrap().unwrap(), created);
    }

    #[tokio::test]
    async fn insert_rejects_schema_violations() {
        let store = DocumentStore::in_memory();
        let mut book = new_book("");
        book.rating = -0.5;

        let err = store.insert(book).await.unwrap_err();
        match err {
            StoreError::Schema(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected schema error, got {other:?}"),
        }
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_inserts_get_distinct_ids() {
        let store = Arc::new(DocumentStore::in_memory());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.insert(new_book(&format!("book {i}"))).await })
            })
            .collect();

        let mut assigned = Vec::new();
        for handle in handles {
            assigned.push(handle.await.unwrap().unwrap().id);
        }
        assigned.sort_unstable();
        assert_eq!(assigned, (1..=16).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn insert_many_is_all_or_nothing() {
        let store = DocumentStore::in_memory();
        let existing = store.insert(new_book("a")).await.unwrap();

        let mut fresh = existing.clone();
        fresh.id = 2;
        let err = store
            .insert_many(vec![fresh, existing.clone()])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(1)));
        assert_eq!(ids(&store.list().await.unwrap()), vec![1]);
    }

    #[tokio::test]
    async fn file_store_reloads_what_was_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("books.json");

        {
            let store = DocumentStore::open(&path).await.unwrap();
            assert_eq!(store.count().await.unwrap(), 0);
            store.insert(new_book("a")).await.unwrap();
            store.insert(new_book("b")).await.unwrap();
            store.delete(1).await.unwrap();
            store
                .update(
                    2,
                    BookDraft {
                        price: Some(3.5),
                        ..BookDraft::default()
                    },
                )
                .await
                .unwrap();
        }

        let reopened = DocumentStore::open(&path).await.unwrap();
        let books = reopened.list().await.unwrap();
        assert_eq!(ids(&books), vec![2]);
        assert_eq!(books[0].title, "b");
        assert_eq!(books[0].price, 3.5);
        assert!(!path.with_file_name("books.json.tmp").exists());
    }

    #[tokio::test]
    async fn open_rejects_duplicate_ids_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        let doc = serde_json::json!([
            {"id": 1, "title": "a", "author": "x", "price": 1.0, "image": "a.jpg", "rating": 1.0},
            {"id": 1, "title": "b", "author": "y", "price": 2.0, "image": "b.jpg", "rating": 2.0}
        ]);
        std::fs::write(&path, doc.to_string()).unwrap();

        let err = DocumentStore::open(&path).await.err().unwrap();
        assert!(matches!(err, StoreError::DuplicateId(1)));
    }

    #[tokio::test]
    async fn open_rejects_records_violating_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        let doc = serde_json::json!([
            {"id": 1, "title": "a", "author": "x", "price": 1.0, "image": "a.jpg", "rating": 9.0}
        ]);
        std::fs::write(&path, doc.to_string()).unwrap();

        match DocumentStore::open(&path).await.err().unwrap() {
            StoreError::Schema(errors) => assert_eq!(errors[0].field, "rating"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }
}

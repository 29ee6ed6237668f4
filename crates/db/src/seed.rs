//! Bundled default catalogue and bulk loading.

use std::path::Path;

use once_cell::sync::Lazy;

use crate::models::Book;
use crate::{BookStore, Result};

fn default_book(
    id: u64,
    title: &str,
    author: &str,
    price: f64,
    pages: u32,
    image: &str,
    rating: f64,
) -> Book {
    Book {
        id,
        title: title.to_string(),
        author: author.to_string(),
        price,
        pages: Some(pages),
        image: image.to_string(),
        rating,
        created_at: None,
        updated_at: None,
    }
}

static DEFAULT_BOOKS: Lazy<Vec<Book>> = Lazy::new(|| {
    vec![
        default_book(1, "Hobbit", "J.R.R. Tolkien", 10.99, 300, "Hobbit.webp", 4.7),
        default_book(
            2,
            "The Lord of the Rings",
            "J.R.R. Tolkien",
            15.99,
            500,
            "The_Lord_of _the_Rings.jpg",
            4.9,
        ),
        default_book(
            3,
            "The Hitchhiker's Guide to the Galaxy",
            "Douglas Adams",
            12.99,
            200,
            "The_Hitchhikers_Guide_to_the_Galaxy.jpg",
            4.2,
        ),
        default_book(
            4,
            "The Great Gatsby",
            "F. Scott Fitzgerald",
            14.99,
            250,
            "The_Great_Gatsby.webp",
            4.5,
        ),
        default_book(
            5,
            "To Kill a Mockingbird",
            "Harper Lee",
            13.99,
            220,
            "To_Kill_a_Mockingbird.jpg",
            4.8,
        ),
        default_book(6, "1984", "George Orwell", 11.99, 280, "1984.jpg", 4.6),
        default_book(
            7,
            "The Catcher in the Rye",
            "J.D. Salinger",
            10.99,
            224,
            "The_Catcher_in_the_Rye.jpg",
            3.9,
        ),
    ]
});

/// The seven books shipped with the application.
pub fn default_books() -> Vec<Book> {
    DEFAULT_BOOKS.clone()
}

/// Insert the default books if the collection is empty. Returns how many were inserted.
pub async fn seed_if_empty(store: &dyn BookStore) -> Result<usize> {
    let existing = store.count().await?;
    if existing > 0 {
        tracing::info!(count = existing, "collection already populated");
        return Ok(0);
    }

    let inserted = store.insert_many(default_books()).await?;
    tracing::info!(count = inserted, "inserted default books into empty collection");
    Ok(inserted)
}

/// Load a JSON array of books from `path` into the store.
pub async fn import_file(store: &dyn BookStore, path: &Path) -> Result<usize> {
    let bytes = tokio::fs::read(path).await?;
    let books: Vec<Book> = serde_json::from_slice(&bytes)?;

    let imported = store.insert_many(books).await?;
    tracing::info!(path = %path.display(), count = imported, "imported books");
    Ok(imported)
}

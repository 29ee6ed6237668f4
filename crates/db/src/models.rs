use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// Numeric book identifier, unique across the collection.
pub type BookId = u64;

/// Upper bound of the rating scale.
pub const MAX_RATING: f64 = 5.0;

/// A stored book record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Identifier assigned by the store
    pub id: BookId,
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Shelf price
    pub price: f64,
    /// Page count, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    /// Absolute image URL or a filename under the assets folder
    pub image: String,
    /// Reader rating between 0 and 5
    pub rating: f64,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

impl Book {
    /// Check the record against the collection schema.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        check_fields(&self.title, &self.author, self.price, &self.image, self.rating)
    }
}

/// Fields required to insert a book; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    pub image: String,
    pub rating: f64,
}

impl NewBook {
    /// Check the fields against the collection schema.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        check_fields(&self.title, &self.author, self.price, &self.image, self.rating)
    }

    /// Attach an identifier and creation time.
    pub fn into_book(self, id: BookId, now: OffsetDateTime) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            price: self.price,
            pages: self.pages,
            image: self.image,
            rating: self.rating,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Request body shared by create and update.
///
/// Every field is optional. On update an absent field keeps its stored value;
/// `pages` additionally distinguishes an absent key (keep) from `null` (clear).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub pages: Option<Option<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl BookDraft {
    /// Turn a draft into an insertable book, reporting every missing field.
    pub fn into_new_book(self) -> Result<NewBook, Vec<FieldError>> {
        let mut missing = Vec::new();
        if self.title.is_none() {
            missing.push(FieldError::required("title"));
        }
        if self.author.is_none() {
            missing.push(FieldError::required("author"));
        }
        if self.price.is_none() {
            missing.push(FieldError::required("price"));
        }
        if self.image.is_none() {
            missing.push(FieldError::required("image"));
        }
        if self.rating.is_none() {
            missing.push(FieldError::required("rating"));
        }

        match (self.title, self.author, self.price, self.image, self.rating) {
            (Some(title), Some(author), Some(price), Some(image), Some(rating)) => Ok(NewBook {
                title,
                author,
                price,
                pages: self.pages.flatten(),
                image,
                rating,
            }),
            _ => Err(missing),
        }
    }

    /// Merge the present fields onto `book`, leaving the others untouched.
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(title) = &self.title {
            book.title.clone_from(title);
        }
        if let Some(author) = &self.author {
            book.author.clone_from(author);
        }
        if let Some(price) = self.price {
            book.price = price;
        }
        if let Some(pages) = self.pages {
            book.pages = pages;
        }
        if let Some(image) = &self.image {
            book.image.clone_from(image);
        }
        if let Some(rating) = self.rating {
            book.rating = rating;
        }
    }
}

impl From<NewBook> for BookDraft {
    fn from(book: NewBook) -> Self {
        Self {
            title: Some(book.title),
            author: Some(book.author),
            price: Some(book.price),
            pages: Some(book.pages),
            image: Some(book.image),
            rating: Some(book.rating),
        }
    }
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

impl FieldError {
    pub fn new(field: &str, error: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            error: error.into(),
        }
    }

    fn required(field: &str) -> Self {
        Self::new(field, "required")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

fn check_fields(
    title: &str,
    author: &str,
    price: f64,
    image: &str,
    rating: f64,
) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if title.trim().is_empty() {
        errors.push(FieldError::required("title"));
    }
    if author.trim().is_empty() {
        errors.push(FieldError::required("author"));
    }
    if !price.is_finite() || price < 0.0 {
        errors.push(FieldError::new("price", "must be a non-negative number"));
    }
    if image.trim().is_empty() {
        errors.push(FieldError::required("image"));
    }
    if !rating.is_finite() || !(0.0..=MAX_RATING).contains(&rating) {
        errors.push(FieldError::new("rating", "must be between 0 and 5"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored() -> Book {
        Book {
            id: 6,
            title: "1984".to_string(),
            author: "George Orwell".to_string(),
            price: 11.99,
            pages: Some(280),
            image: "1984.jpg".to_string(),
            rating: 4.6,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn draft_distinguishes_absent_and_null_pages() {
        let absent: BookDraft = serde_json::from_value(json!({"price": 9.5})).unwrap();
        assert_eq!(absent.pages, None);

        let cleared: BookDraft = serde_json::from_value(json!({"pages": null})).unwrap();
        assert_eq!(cleared.pages, Some(None));

        let set: BookDraft = serde_json::from_value(json!({"pages": 120})).unwrap();
        assert_eq!(set.pages, Some(Some(120)));
    }

    #[test]
    fn apply_keeps_unspecified_fields() {
        let mut book = stored();
        let draft = BookDraft {
            price: Some(8.0),
            ..BookDraft::default()
        };
        draft.apply_to(&mut book);

        let mut expected = stored();
        expected.price = 8.0;
        assert_eq!(book, expected);
    }

    #[test]
    fn apply_null_pages_clears_them() {
        let mut book = stored();
        let draft: BookDraft = serde_json::from_value(json!({"pages": null})).unwrap();
        draft.apply_to(&mut book);
        assert_eq!(book.pages, None);
        assert_eq!(book.title, "1984");
    }

    #[test]
    fn draft_ignores_client_supplied_id() {
        let draft: BookDraft =
            serde_json::from_value(json!({"id": 99, "title": "Dune"})).unwrap();
        assert_eq!(draft.title.as_deref(), Some("Dune"));
    }

    #[test]
    fn into_new_book_lists_every_missing_field() {
        let draft = BookDraft {
            title: Some("Dune".to_string()),
            ..BookDraft::default()
        };
        let missing = draft.into_new_book().unwrap_err();
        let fields: Vec<_> = missing.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["author", "price", "image", "rating"]);
    }

    #[test]
    fn schema_rejects_out_of_range_values() {
        let mut book = stored();
        book.rating = 5.1;
        book.price = -1.0;
        book.title = "   ".to_string();

        let errors = book.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "price", "rating"]);
    }

    #[test]
    fn rating_bounds_are_inclusive() {
        let mut book = stored();
        book.rating = 0.0;
        assert!(book.validate().is_ok());
        book.rating = 5.0;
        assert!(book.validate().is_ok());
    }

    #[test]
    fn book_json_uses_camel_case_and_omits_missing_pages() {
        let mut book = stored();
        book.pages = None;
        book.created_at = Some(OffsetDateTime::UNIX_EPOCH);

        let value = serde_json::to_value(&book).unwrap();
        assert!(value.get("pages").is_none());
        assert_eq!(value["createdAt"], "1970-01-01T00:00:00Z");
        assert!(value.get("updatedAt").is_none());
    }
}

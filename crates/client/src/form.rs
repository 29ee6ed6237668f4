//! Validation of the add/edit book form.

use bookshop_db::models::MAX_RATING;
use thiserror::Error;

use crate::{BookDraft, NewBook};

/// Why a submitted form was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Please fill in all required fields")]
    MissingRequired,

    #[error("Price must not be negative")]
    NegativePrice,

    #[error("Rating must be between 0 and 5")]
    RatingOutOfRange,

    #[error("Pages must be a whole number, got '{0}'")]
    InvalidPages(String),
}

/// Raw text as typed into the add/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub price: String,
    pub pages: String,
    pub image: String,
    pub rating: String,
}

impl BookForm {
    /// Prefill the form from an existing record.
    pub fn from_book(book: &crate::Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            price: book.price.to_string(),
            pages: book.pages.map(|p| p.to_string()).unwrap_or_default(),
            image: book.image.clone(),
            rating: book.rating.to_string(),
        }
    }

    /// Validate the form for the add action.
    pub fn validate_new(&self) -> Result<NewBook, FormError> {
        let title = self.title.trim();
        let author = self.author.trim();
        let image = self.image.trim();
        let price = parse_number(&self.price);
        let rating = parse_number(&self.rating);

        let (Some(price), Some(rating)) = (price, rating) else {
            return Err(FormError::MissingRequired);
        };
        if title.is_empty() || author.is_empty() || image.is_empty() {
            return Err(FormError::MissingRequired);
        }
        if !(0.0..=MAX_RATING).contains(&rating) {
            return Err(FormError::RatingOutOfRange);
        }
        if price < 0.0 {
            return Err(FormError::NegativePrice);
        }

        Ok(NewBook {
            title: title.to_string(),
            author: author.to_string(),
            price,
            pages: parse_pages(&self.pages)?,
            image: image.to_string(),
            rating,
        })
    }

    /// Validate the form for the edit action. The edit form submits every
    /// field, so an empty pages box clears the stored page count.
    pub fn validate_edit(&self) -> Result<BookDraft, FormError> {
        self.validate_new().map(BookDraft::from)
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_pages(raw: &str) -> Result<Option<u32>, FormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| FormError::InvalidPages(raw.to_string()))
}

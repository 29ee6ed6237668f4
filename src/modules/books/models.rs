use serde::{Deserialize, Serialize};

pub use bookshop_db::{Book, BookDraft, BookId, NewBook};

/// Response body for a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub message: String,
}

impl DeleteConfirmation {
    pub fn deleted() -> Self {
        Self {
            message: "Book deleted successfully".to_string(),
        }
    }
}

use std::time::Duration;

use async_trait::async_trait;
use bookshop_kernel::settings::ClientSettings;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{Book, BookDraft, BookId, ClientError, NewBook, Result};

/// Operations exposed by the books API.
#[async_trait]
pub trait BookApi: Send + Sync {
    async fn list_books(&self) -> Result<Vec<Book>>;

    async fn get_book(&self, id: BookId) -> Result<Book>;

    async fn create_book(&self, book: &NewBook) -> Result<Book>;

    async fn update_book(&self, id: BookId, draft: &BookDraft) -> Result<Book>;

    async fn delete_book(&self, id: BookId) -> Result<()>;
}

/// [`BookApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBookApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBookApi {
    /// Client for the collection at `base_url`, e.g. `http://localhost:3000/api/books`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        Self::new(
            settings.api_url.clone(),
            Duration::from_millis(settings.timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn book_url(&self, id: BookId) -> String {
        format!("{}/{}", self.base_url, id)
    }

    /// Map non-success statuses onto [`ClientError`].
    async fn check(response: Response, id: Option<BookId>) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if let (StatusCode::NOT_FOUND, Some(id)) = (status, id) {
            return Err(ClientError::NotFound(id));
        }

        let text = response.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            message: error_message(&text),
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response, id: Option<BookId>) -> Result<T> {
        let response = Self::check(response, id).await?;
        Ok(response.json().await?)
    }
}

/// Pull `error.message` out of the server's error envelope, if there is one.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl BookApi for HttpBookApi {
    async fn list_books(&self) -> Result<Vec<Book>> {
        let response = self.client.get(&self.base_url).send().await?;
        Self::decode(response, None).await
    }

    async fn get_book(&self, id: BookId) -> Result<Book> {
        let response = self.client.get(self.book_url(id)).send().await?;
        Self::decode(response, Some(id)).await
    }

    async fn create_book(&self, book: &NewBook) -> Result<Book> {
        let response = self.client.post(&self.base_url).json(book).send().await?;
        Self::decode(response, None).await
    }

    async fn update_book(&self, id: BookId, draft: &BookDraft) -> Result<Book> {
        let response = self
            .client
            .put(self.book_url(id))
            .json(draft)
            .send()
            .await?;
        Self::decode(response, Some(id)).await
    }

    async fn delete_book(&self, id: BookId) -> Result<()> {
        let response = self.client.delete(self.book_url(id)).send().await?;
        Self::check(response, Some(id)).await?;
        Ok(())
    }
}

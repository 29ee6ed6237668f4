pub mod models;
pub mod routes;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use bookshop_db::seed;
use bookshop_kernel::{InitCtx, Module};
use serde_json::json;

use routes::SharedStore;

/// Books module: the inventory API over the book store
pub struct BooksModule {
    store: SharedStore,
}

impl BooksModule {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if ctx.settings.database.seed_defaults {
            seed::seed_if_empty(self.store.as_ref())
                .await
                .context("failed to seed default books")?;
        }

        let count = self.store.count().await.context("failed to count books")?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            count,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(Arc::clone(&self.store))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }
}

fn json_content(schema: serde_json::Value) -> serde_json::Value {
    json!({ "application/json": { "schema": schema } })
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": json_content(json!({ "$ref": "#/components/schemas/ErrorResponse" }))
    })
}

fn book_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": json_content(json!({ "$ref": "#/components/schemas/Book" }))
    })
}

fn id_parameter() -> serde_json::Value {
    json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64", "minimum": 1 }
    }])
}

fn draft_body(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "required": true,
        "content": json_content(json!({ "$ref": "#/components/schemas/BookDraft" }))
    })
}

fn openapi_fragment() -> serde_json::Value {
    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "All books ordered by id",
                            "content": json_content(json!({
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Book" }
                            }))
                        },
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": draft_body("Book fields; the id is assigned by the server"),
                    "responses": {
                        "201": book_response("Created book"),
                        "400": error_response("Malformed body"),
                        "422": error_response("Schema violation"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": id_parameter(),
                    "responses": {
                        "200": book_response("The book"),
                        "404": error_response("Book not found"),
                        "500": error_response("Internal server error")
                    }
                },
                "put": {
                    "summary": "Update a book",
                    "tags": ["Books"],
                    "parameters": id_parameter(),
                    "requestBody": draft_body("Fields to change; omitted fields keep their value"),
                    "responses": {
                        "200": book_response("Merged book"),
                        "404": error_response("Book not found"),
                        "422": error_response("Schema violation"),
                        "500": error_response("Internal server error")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": id_parameter(),
                    "responses": {
                        "200": {
                            "description": "Deleted",
                            "content": json_content(json!({
                                "$ref": "#/components/schemas/DeleteConfirmation"
                            }))
                        },
                        "404": error_response("Book not found"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "price": { "type": "number", "minimum": 0 },
                        "pages": { "type": "integer", "minimum": 0 },
                        "image": { "type": "string", "description": "Absolute URL or asset filename" },
                        "rating": { "type": "number", "minimum": 0, "maximum": 5 },
                        "createdAt": { "type": "string", "format": "date-time" },
                        "updatedAt": { "type": "string", "format": "date-time" }
                    },
                    "required": ["id", "title", "author", "price", "image", "rating"]
                },
                "BookDraft": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "price": { "type": "number", "minimum": 0 },
                        "pages": { "type": "integer", "minimum": 0, "description": "null clears the page count" },
                        "image": { "type": "string" },
                        "rating": { "type": "number", "minimum": 0, "maximum": 5 }
                    }
                },
                "DeleteConfirmation": {
                    "type": "object",
                    "properties": { "message": { "type": "string" } },
                    "required": ["message"]
                }
            }
        }
    })
}

/// Create a new instance of the books module
pub fn create_module(store: SharedStore) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshop_db::{BookStore, DocumentStore};
    use bookshop_kernel::settings::Settings;

    #[tokio::test]
    async fn init_seeds_an_empty_store() {
        let store: SharedStore = Arc::new(DocumentStore::in_memory());
        let module = BooksModule::new(Arc::clone(&store));
        let settings = Settings::default();

        module.init(&InitCtx { settings: &settings }).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn init_respects_disabled_seeding() {
        let store: SharedStore = Arc::new(DocumentStore::in_memory());
        let module = BooksModule::new(Arc::clone(&store));
        let mut settings = Settings::default();
        settings.database.seed_defaults = false;

        module.init(&InitCtx { settings: &settings }).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[test]
    fn openapi_fragment_covers_every_route() {
        let fragment = openapi_fragment();
        let paths = fragment["paths"].as_object().unwrap();
        assert!(paths["/"]["get"].is_object());
        assert!(paths["/"]["post"].is_object());
        for method in ["get", "put", "delete"] {
            assert!(paths["/{id}"][method].is_object(), "missing {method}");
        }
        assert!(fragment["components"]["schemas"]["BookDraft"].is_object());
    }
}

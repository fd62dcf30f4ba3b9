pub mod handlers;
pub mod models;
pub mod schema;
pub mod store;
pub mod validator;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use serde_json::json;

use bookshelf_db::{Database, StoreResult};
use bookshelf_kernel::{InitCtx, Module};

use handlers::BooksState;
use schema::BOOK_SCHEMA;
use store::{BookStore, SledBookStore};
use validator::Validator;

/// Validated CRUD over book records
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self::with_validator(store, Validator::new())
    }

    pub fn with_validator(store: Arc<dyn BookStore>, validator: Validator) -> Self {
        Self {
            state: BooksState { store, validator },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            fields = BOOK_SCHEMA.fields.len(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(handlers::list_books).post(handlers::create_book))
            .route("/health", get(handlers::health_check))
            .route(
                "/{isbn}",
                get(handlers::get_book)
                    .put(handlers::replace_book)
                    .delete(handlers::delete_book),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let book_body = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/BookResponse" }
                    }
                }
            })
        };
        let isbn_param = json!({
            "name": "isbn",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        });
        let request_body = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/Book" }
                }
            }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Every stored book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/BooksResponse" }
                                    }
                                }
                            },
                            "500": error("Storage failure")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": request_body,
                        "responses": {
                            "201": book_body("Created book"),
                            "400": error("Validation failed; message lists every violation"),
                            "409": error("A book with this isbn already exists"),
                            "500": error("Storage failure")
                        }
                    }
                },
                "/{isbn}": {
                    "get": {
                        "summary": "Fetch one book",
                        "tags": ["Books"],
                        "parameters": [isbn_param],
                        "responses": {
                            "200": book_body("The book"),
                            "404": error("No book with this isbn")
                        }
                    },
                    "put": {
                        "summary": "Replace a book (full record)",
                        "tags": ["Books"],
                        "parameters": [isbn_param],
                        "requestBody": request_body,
                        "responses": {
                            "200": book_body("Replaced book"),
                            "400": error("Validation failed; message lists every violation"),
                            "404": error("No book with this isbn")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [isbn_param],
                        "responses": {
                            "200": {
                                "description": "Deleted",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": { "message": { "type": "string" } },
                                            "required": ["message"]
                                        }
                                    }
                                }
                            },
                            "404": error("No book with this isbn")
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
                                "content": {
                                    "text/plain": { "schema": { "type": "string" } }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": BOOK_SCHEMA.to_json_schema(),
                    "BookResponse": {
                        "type": "object",
                        "properties": { "book": { "$ref": "#/components/schemas/Book" } },
                        "required": ["book"]
                    },
                    "BooksResponse": {
                        "type": "object",
                        "properties": {
                            "books": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Book" }
                            }
                        },
                        "required": ["books"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let stored = self.state.store.count().await?;
        tracing::info!(module = self.name(), stored, "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module backed by the `books` collection of `database`
pub fn create_module(database: &Database) -> StoreResult<Arc<dyn Module>> {
    let store = SledBookStore::open(database)?;
    Ok(Arc::new(BooksModule::new(Arc::new(store))))
}

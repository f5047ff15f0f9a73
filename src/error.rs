//! Error taxonomy for store operations and its mapping onto the HTTP envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::json;
use std::fmt;
use thiserror::Error;

use crate::persistence::StorageError;
use crate::types::{CartId, ProductId};

/// Which collection a missing id was looked up in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Product,
    Cart,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Product => f.write_str("product"),
            Resource::Cart => f.write_str("cart"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: Resource, id: String },
    #[error("product {product_id} not found in cart {cart_id}")]
    ProductNotInCart {
        cart_id: CartId,
        product_id: ProductId,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("no free identifiers left")]
    IdSpaceExhausted,
}

impl StoreError {
    pub fn product_not_found(id: &str) -> Self {
        StoreError::NotFound {
            kind: Resource::Product,
            id: id.to_string(),
        }
    }

    pub fn cart_not_found(id: &str) -> Self {
        StoreError::NotFound {
            kind: Resource::Cart,
            id: id.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound { .. } | StoreError::ProductNotInCart { .. } => StatusCode::NOT_FOUND,
            StoreError::Storage(_) | StoreError::IdSpaceExhausted => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            StoreError::InvalidInput(msg) => format!("invalid input: {}", msg),
            StoreError::NotFound { kind, .. } => format!("{} not found", kind),
            StoreError::ProductNotInCart { .. } => "product not found in cart".to_string(),
            StoreError::Storage(_) | StoreError::IdSpaceExhausted => {
                // Detail stays in the log; callers get a generic message.
                error!("request failed status={} error={}", status.as_u16(), self);
                "internal storage error".to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

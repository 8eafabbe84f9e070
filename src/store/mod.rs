//! Document store abstraction.
//!
//! The store is the only persistence layer. Handlers never talk to it
//! directly; they go through `db::Repository`, which owns an
//! `Arc<dyn DocumentStore>` so tests can swap in an in-memory fake.

mod firestore;
#[cfg(test)]
pub mod memory;

pub use firestore::*;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A typed field value as reported by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Array(Vec<Value>),
    /// Any kind this service never writes (numbers, maps, nulls, references).
    Unsupported,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }
}

/// Field name to value mapping of a single document.
pub type Fields = BTreeMap<String, Value>;

/// A raw document: fully-qualified resource name plus its fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub name: String,
    pub fields: Fields,
}

/// A started export of collections to object storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOperation {
    /// Long-running operation name
    pub name: String,
    pub output_uri_prefix: String,
}

/// Errors raised by a document store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("document store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("document store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected document store response: {0}")]
    Decode(String),
    #[error("failed to obtain access token: {0}")]
    Credentials(String),
    #[error("{context}; {source}")]
    Context {
        context: String,
        #[source]
        source: Box<StoreError>,
    },
}

impl StoreError {
    /// Wrap the error with a message describing the failed operation.
    pub fn context(self, context: impl Into<String>) -> Self {
        StoreError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Narrow contract over a remote document collection.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by collection and id.
    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError>;

    /// List every document of a collection, optionally ordered by the store
    /// (e.g. `"published desc"`).
    async fn list(&self, collection: &str, order_by: Option<&str>)
        -> Result<Vec<Document>, StoreError>;

    /// Create a document. The store assigns the id.
    async fn create(&self, collection: &str, fields: Fields) -> Result<Document, StoreError>;

    /// Replace every field of a document.
    async fn update(&self, collection: &str, id: &str, fields: Fields)
        -> Result<Document, StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Start exporting `collection_ids` to `output_uri_prefix` (a `gs://` URI).
    /// Returns once the export is accepted, not when it finishes.
    async fn export(
        &self,
        output_uri_prefix: &str,
        collection_ids: &[&str],
    ) -> Result<ExportOperation, StoreError>;
}

//! In-memory [`DocumentStore`] used by tests.
//!
//! Documents are kept per collection in insertion order and are returned
//! by `list` in that order, ignoring `order_by`, so callers that rely on
//! ordering must sort themselves.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Document, DocumentStore, ExportOperation, Fields, StoreError};

const ROOT: &str = "projects/test/databases/(default)/documents";

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, Vec<Document>>>,
    next_id: AtomicUsize,
    fail: bool,
    pub gets: AtomicUsize,
    pub lists: AtomicUsize,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    pub exports: AtomicUsize,
    /// Collection ids of the most recent export
    pub exported: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails with a transport-like error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Seed a document with a chosen id.
    pub fn insert(&self, collection: &str, id: &str, fields: Fields) {
        let name = Self::name(collection, id);
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();
        docs.retain(|d| d.name != name);
        docs.push(Document { name, fields });
    }

    pub fn total_calls(&self) -> usize {
        [
            &self.gets,
            &self.lists,
            &self.creates,
            &self.updates,
            &self.deletes,
            &self.exports,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn name(collection: &str, id: &str) -> String {
        format!("{}/{}/{}", ROOT, collection, id)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let name = Self::name(collection, id);
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.name == name).cloned())
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))
    }

    async fn list(
        &self,
        collection: &str,
        _order_by: Option<&str>,
    ) -> Result<Vec<Document>, StoreError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<Document, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let doc = Document {
            name: Self::name(collection, &id),
            fields,
        };
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Document, StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let name = Self::name(collection, id);
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();
        let doc = Document { name, fields };
        match docs.iter_mut().find(|d| d.name == doc.name) {
            Some(existing) => *existing = doc.clone(),
            None => docs.push(doc.clone()),
        }
        Ok(doc)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let name = Self::name(collection, id);
        if let Some(docs) = self.collections.lock().unwrap().get_mut(collection) {
            docs.retain(|d| d.name != name);
        }
        Ok(())
    }

    async fn export(
        &self,
        output_uri_prefix: &str,
        collection_ids: &[&str],
    ) -> Result<ExportOperation, StoreError> {
        let n = self.exports.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        *self.exported.lock().unwrap() = collection_ids.iter().map(|c| c.to_string()).collect();
        Ok(ExportOperation {
            name: format!("projects/test/databases/(default)/operations/export-{}", n),
            output_uri_prefix: output_uri_prefix.to_string(),
        })
    }
}

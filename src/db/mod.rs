//! Persistence module.
//!
//! Firestore is the source of truth for all application data.

mod repository;

pub use repository::*;

use std::sync::Arc;

use crate::config::Config;
use crate::store::{FirestoreStore, StoreError};

/// Build a repository backed by Firestore.
pub fn init_repository(config: &Config) -> Result<Repository, StoreError> {
    let store = FirestoreStore::new(config)?;
    Ok(Repository::new(Arc::new(store)))
}

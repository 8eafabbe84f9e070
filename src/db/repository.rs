//! Typed repository over the document store.
//!
//! Every store failure is wrapped with the operation that failed and
//! returned as-is; nothing is retried.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::filter::PostFilter;
use crate::models::mapper::{
    decode_hash_list, decode_like, decode_post, encode_hash_list, encode_like, encode_post,
};
use crate::models::{Backup, CreateLikeRequest, HashList, Like, Post};
use crate::store::{DocumentStore, StoreError};

pub const LIKES_COLLECTION: &str = "web-likes";
pub const POSTS_COLLECTION: &str = "web-posts";
pub const METADATA_COLLECTION: &str = "web-metadata";
/// Document id of the singleton hash list inside [`METADATA_COLLECTION`].
pub const HASH_LIST_ID: &str = "hashes";

/// Repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // ==================== LIKE OPERATIONS ====================

    /// List all likes, newest first.
    pub async fn list_likes(&self) -> Result<Vec<Like>, StoreError> {
        let docs = self
            .store
            .list(LIKES_COLLECTION, Some("timestamp desc"))
            .await
            .map_err(|e| e.context("failed to list likes"))?;

        let mut likes: Vec<Like> = docs.iter().map(decode_like).collect();
        likes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(likes)
    }

    pub async fn get_like(&self, id: &str) -> Result<Like, StoreError> {
        let doc = self
            .store
            .get(LIKES_COLLECTION, id)
            .await
            .map_err(|e| e.context("failed to get like"))?;
        Ok(decode_like(&doc))
    }

    /// Create a like stamped with the current time.
    pub async fn create_like(&self, request: &CreateLikeRequest) -> Result<Like, StoreError> {
        let like = Like {
            id: String::new(),
            timestamp: Utc::now(),
            title: request.title.clone(),
            url: request.url.clone(),
        };
        let doc = self
            .store
            .create(LIKES_COLLECTION, encode_like(&like))
            .await
            .map_err(|e| e.context("failed to create like"))?;
        Ok(decode_like(&doc))
    }

    pub async fn delete_like(&self, id: &str) -> Result<(), StoreError> {
        self.store
            .delete(LIKES_COLLECTION, id)
            .await
            .map_err(|e| e.context("failed to delete like"))
    }

    // ==================== POST OPERATIONS ====================

    /// List posts matching `filter` at instant `now`, newest first.
    pub async fn list_posts(
        &self,
        filter: PostFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Post>, StoreError> {
        let docs = self
            .store
            .list(POSTS_COLLECTION, Some("published desc"))
            .await
            .map_err(|e| e.context("failed to list posts"))?;

        let posts = docs.iter().map(decode_post).collect();
        Ok(filter.apply(posts, now))
    }

    pub async fn get_post(&self, id: &str) -> Result<Post, StoreError> {
        let doc = self
            .store
            .get(POSTS_COLLECTION, id)
            .await
            .map_err(|e| e.context("failed to get post"))?;
        Ok(decode_post(&doc))
    }

    /// Create a post. Any id on `post` is ignored; the store assigns one.
    pub async fn create_post(&self, post: &Post) -> Result<Post, StoreError> {
        let doc = self
            .store
            .create(POSTS_COLLECTION, encode_post(post))
            .await
            .map_err(|e| e.context("failed to create post"))?;
        Ok(decode_post(&doc))
    }

    /// Replace every stored field of post `id`.
    pub async fn update_post(&self, id: &str, post: &Post) -> Result<Post, StoreError> {
        let doc = self
            .store
            .update(POSTS_COLLECTION, id, encode_post(post))
            .await
            .map_err(|e| e.context("failed to update post"))?;
        Ok(decode_post(&doc))
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), StoreError> {
        self.store
            .delete(POSTS_COLLECTION, id)
            .await
            .map_err(|e| e.context("failed to delete post"))
    }

    // ==================== HASH LIST OPERATIONS ====================

    pub async fn get_hash_list(&self) -> Result<HashList, StoreError> {
        let doc = self
            .store
            .get(METADATA_COLLECTION, HASH_LIST_ID)
            .await
            .map_err(|e| e.context("failed to get hash list"))?;
        Ok(decode_hash_list(&doc))
    }

    /// Overwrite the hash list; keys missing from `list` are dropped.
    pub async fn update_hash_list(&self, list: &HashList) -> Result<HashList, StoreError> {
        let doc = self
            .store
            .update(METADATA_COLLECTION, HASH_LIST_ID, encode_hash_list(list))
            .await
            .map_err(|e| e.context("failed to update hash list"))?;
        Ok(decode_hash_list(&doc))
    }

    // ==================== BACKUP OPERATIONS ====================

    /// Start exporting every collection this service owns to `bucket`.
    pub async fn create_backup(&self, bucket: &str) -> Result<Backup, StoreError> {
        let prefix = if bucket.starts_with("gs://") {
            bucket.to_string()
        } else {
            format!("gs://{}", bucket)
        };
        let operation = self
            .store
            .export(
                &prefix,
                &[LIKES_COLLECTION, POSTS_COLLECTION, METADATA_COLLECTION],
            )
            .await
            .map_err(|e| e.context("failed to create backup"))?;

        Ok(Backup {
            backup_id: operation.name,
            backup_prefix: operation.output_uri_prefix,
        })
    }
}

//! Like model: a bookmarked link.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A liked link. The id is assigned by the store at creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub url: String,
}

/// Request body for creating a like. The timestamp is set by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLikeRequest {
    pub title: String,
    pub url: String,
}

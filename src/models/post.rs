//! Post model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A blog post.
///
/// `draft` and `published` together decide public visibility; see
/// `filter::PostFilter`. `content_html` and `content_html_preview` are
/// rendered elsewhere and only passed through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub listed: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_html: String,
    #[serde(default)]
    pub content_html_preview: String,
    /// Order preserving, duplicates allowed.
    #[serde(default)]
    pub tags: Vec<String>,
    /// May lie in the future for scheduled posts.
    pub published: DateTime<Utc>,
}

//! Conversion between store documents and domain entities.
//!
//! Decoding is deliberately lenient: a missing or mistyped field becomes the
//! zero value of its type and never fails. Older documents written before a
//! field existed must still decode.

use chrono::{DateTime, Utc};

use super::{HashList, Like, Post};
use crate::store::{Document, Fields, Value};

/// Extract an entity id from a fully-qualified document name: the last
/// `/`-separated segment.
pub fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn string_field(fields: &Fields, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn bool_field(fields: &Fields, key: &str) -> bool {
    fields.get(key).and_then(Value::as_bool).unwrap_or_default()
}

fn timestamp_field(fields: &Fields, key: &str) -> DateTime<Utc> {
    fields
        .get(key)
        .and_then(Value::as_timestamp)
        .unwrap_or_default()
}

fn string_array_field(fields: &Fields, key: &str) -> Vec<String> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .unwrap_or_default()
        .iter()
        .map(|v| v.as_str().unwrap_or_default().to_string())
        .collect()
}

pub fn decode_like(doc: &Document) -> Like {
    Like {
        id: document_id(&doc.name).to_string(),
        timestamp: timestamp_field(&doc.fields, "timestamp"),
        title: string_field(&doc.fields, "title"),
        url: string_field(&doc.fields, "url"),
    }
}

pub fn encode_like(like: &Like) -> Fields {
    let mut fields = Fields::new();
    fields.insert("timestamp".to_string(), Value::Timestamp(like.timestamp));
    fields.insert("title".to_string(), Value::String(like.title.clone()));
    fields.insert("url".to_string(), Value::String(like.url.clone()));
    fields
}

pub fn decode_post(doc: &Document) -> Post {
    Post {
        id: document_id(&doc.name).to_string(),
        draft: bool_field(&doc.fields, "draft"),
        listed: bool_field(&doc.fields, "listed"),
        title: string_field(&doc.fields, "title"),
        slug: string_field(&doc.fields, "slug"),
        content: string_field(&doc.fields, "content"),
        content_html: String::new(),
        content_html_preview: String::new(),
        tags: string_array_field(&doc.fields, "tags"),
        published: timestamp_field(&doc.fields, "published"),
    }
}

/// Rendered HTML is derived data and is not stored.
pub fn encode_post(post: &Post) -> Fields {
    let mut fields = Fields::new();
    fields.insert("draft".to_string(), Value::Boolean(post.draft));
    fields.insert("listed".to_string(), Value::Boolean(post.listed));
    fields.insert("title".to_string(), Value::String(post.title.clone()));
    fields.insert("slug".to_string(), Value::String(post.slug.clone()));
    fields.insert("content".to_string(), Value::String(post.content.clone()));
    fields.insert(
        "tags".to_string(),
        Value::Array(post.tags.iter().cloned().map(Value::String).collect()),
    );
    fields.insert("published".to_string(), Value::Timestamp(post.published));
    fields
}

/// Every field of the hash list document is one entry.
pub fn decode_hash_list(doc: &Document) -> HashList {
    HashList {
        hashes: doc
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), value.as_str().unwrap_or_default().to_string()))
            .collect(),
    }
}

pub fn encode_hash_list(list: &HashList) -> Fields {
    list.hashes
        .iter()
        .map(|(key, hash)| (key.clone(), Value::String(hash.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_post() -> Post {
        Post {
            id: String::new(),
            draft: true,
            listed: false,
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            content: "# Hello\n\nBody".to_string(),
            content_html: String::new(),
            content_html_preview: String::new(),
            tags: vec!["rust".into(), "web".into(), "rust".into()],
            published: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_document_id_takes_last_segment() {
        assert_eq!(
            document_id("projects/p/databases/(default)/documents/web-posts/abc123"),
            "abc123"
        );
        assert_eq!(document_id("abc123"), "abc123");
        assert_eq!(document_id(""), "");
    }

    #[test]
    fn test_post_round_trip_keeps_tag_order() {
        let post = sample_post();
        let doc = Document {
            name: "projects/p/databases/d/documents/web-posts/xyz".to_string(),
            fields: encode_post(&post),
        };

        let decoded = decode_post(&doc);
        assert_eq!(decoded.id, "xyz");
        assert_eq!(Post { id: String::new(), ..decoded }, post);
    }

    #[test]
    fn test_like_round_trip() {
        let like = Like {
            id: "ignored".to_string(),
            timestamp: Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap(),
            title: "A link".to_string(),
            url: "https://example.com".to_string(),
        };
        let doc = Document {
            name: "projects/p/databases/d/documents/web-likes/l1".to_string(),
            fields: encode_like(&like),
        };

        let decoded = decode_like(&doc);
        assert_eq!(decoded.id, "l1");
        assert_eq!(decoded.timestamp, like.timestamp);
        assert_eq!(decoded.title, like.title);
        assert_eq!(decoded.url, like.url);
    }

    #[test]
    fn test_encode_does_not_write_id_or_html() {
        let mut post = sample_post();
        post.id = "caller-chosen".to_string();
        post.content_html = "<p>x</p>".to_string();

        let fields = encode_post(&post);
        assert!(!fields.contains_key("id"));
        assert!(!fields.contains_key("contentHtml"));
        assert_eq!(fields.len(), 7);
    }

    #[test]
    fn test_missing_fields_decode_to_zero_values() {
        let doc = Document {
            name: "projects/p/databases/d/documents/web-posts/empty".to_string(),
            fields: Fields::new(),
        };

        let post = decode_post(&doc);
        assert_eq!(post.id, "empty");
        assert!(!post.draft);
        assert!(!post.listed);
        assert!(post.title.is_empty());
        assert!(post.tags.is_empty());
        assert_eq!(post.published, DateTime::<Utc>::default());
    }

    #[test]
    fn test_mistyped_fields_decode_to_zero_values() {
        let mut fields = Fields::new();
        fields.insert("draft".to_string(), Value::String("yes".into()));
        fields.insert("title".to_string(), Value::Boolean(true));
        fields.insert("published".to_string(), Value::Unsupported);
        fields.insert(
            "tags".to_string(),
            Value::Array(vec![Value::String("a".into()), Value::Boolean(false)]),
        );
        let doc = Document {
            name: "web-posts/p".to_string(),
            fields,
        };

        let post = decode_post(&doc);
        assert!(!post.draft);
        assert_eq!(post.title, "");
        assert_eq!(post.published, DateTime::<Utc>::default());
        assert_eq!(post.tags, vec!["a".to_string(), String::new()]);
    }

    #[test]
    fn test_hash_list_round_trip() {
        let mut list = HashList::default();
        list.hashes.insert("index.html".into(), "abc".into());
        list.hashes.insert("style.css".into(), "def".into());

        let doc = Document {
            name: "projects/p/databases/d/documents/web-metadata/hashes".to_string(),
            fields: encode_hash_list(&list),
        };
        assert_eq!(decode_hash_list(&doc), list);
    }
}

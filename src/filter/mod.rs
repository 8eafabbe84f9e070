//! Post filtering for list requests.
//!
//! The store has no query that combines the `listed` flag with "publicly
//! visible now", so filtering happens in-process after fetching.

use chrono::{DateTime, Utc};

use crate::models::Post;

/// Tri-state predicates: `None` means no filtering on that axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub listed: Option<bool>,
    pub published: Option<bool>,
}

/// A post is publicly visible once it is not a draft and its publish time
/// has been reached (inclusive).
pub fn is_visible(post: &Post, now: DateTime<Utc>) -> bool {
    !post.draft && post.published <= now
}

impl PostFilter {
    pub fn new(listed: Option<bool>, published: Option<bool>) -> Self {
        Self { listed, published }
    }

    /// Decide whether `post` belongs in the result at instant `now`.
    ///
    /// `published = Some(false)` selects exactly the posts that
    /// `Some(true)` rejects: drafts and scheduled posts.
    pub fn matches(&self, post: &Post, now: DateTime<Utc>) -> bool {
        if let Some(listed) = self.listed {
            if post.listed != listed {
                return false;
            }
        }
        match self.published {
            Some(published) => is_visible(post, now) == published,
            None => true,
        }
    }

    /// Keep matching posts, newest `published` first. Ties keep the order
    /// they arrived in.
    pub fn apply(&self, posts: Vec<Post>, now: DateTime<Utc>) -> Vec<Post> {
        let mut kept: Vec<Post> = posts
            .into_iter()
            .filter(|post| self.matches(post, now))
            .collect();
        kept.sort_by(|a, b| b.published.cmp(&a.published));
        kept
    }
}

/// Parse a `"true"` / `"false"` query value. Anything else is rejected.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn post(id: &str, published: DateTime<Utc>, draft: bool, listed: bool) -> Post {
        Post {
            id: id.to_string(),
            draft,
            listed,
            title: id.to_string(),
            published,
            ..Default::default()
        }
    }

    fn scenario(now: DateTime<Utc>) -> Vec<Post> {
        vec![
            post("past", now - Duration::hours(1), false, true),
            post("future", now + Duration::hours(1), false, true),
            post("draft", now - Duration::hours(1), true, true),
        ]
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_published_true_keeps_only_visible() {
        let now = Utc::now();
        let result = PostFilter::new(None, Some(true)).apply(scenario(now), now);
        assert_eq!(ids(&result), vec!["past"]);
    }

    #[test]
    fn test_listed_true_without_published_keeps_all_listed() {
        let now = Utc::now();
        let result = PostFilter::new(Some(true), None).apply(scenario(now), now);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_published_false_is_complement() {
        let now = Utc::now();
        let result = PostFilter::new(None, Some(false)).apply(scenario(now), now);
        assert_eq!(ids(&result), vec!["future", "draft"]);
    }

    #[test]
    fn test_boundary_at_now_counts_as_visible() {
        let now = Utc::now();
        let at_now = post("now", now, false, true);
        assert!(PostFilter::new(None, Some(true)).matches(&at_now, now));
        assert!(!PostFilter::new(None, Some(false)).matches(&at_now, now));
    }

    #[test]
    fn test_listed_false_keeps_unlisted() {
        let now = Utc::now();
        let posts = vec![
            post("a", now, false, true),
            post("b", now, false, false),
        ];
        let result = PostFilter::new(Some(false), None).apply(posts, now);
        assert_eq!(ids(&result), vec!["b"]);
    }

    #[test]
    fn test_combined_predicates() {
        let now = Utc::now();
        let posts = vec![
            post("visible-listed", now - Duration::minutes(5), false, true),
            post("visible-unlisted", now - Duration::minutes(5), false, false),
            post("draft-listed", now - Duration::minutes(5), true, true),
        ];
        let result = PostFilter::new(Some(true), Some(true)).apply(posts, now);
        assert_eq!(ids(&result), vec!["visible-listed"]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let now = Utc::now();
        let filters = [
            PostFilter::default(),
            PostFilter::new(Some(true), None),
            PostFilter::new(Some(false), Some(true)),
            PostFilter::new(None, Some(false)),
        ];
        for filter in filters {
            let once = filter.apply(scenario(now), now);
            let twice = filter.apply(once.clone(), now);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_apply_sorts_descending_regardless_of_input_order() {
        let now = Utc::now();
        let posts = vec![
            post("old", now - Duration::days(3), false, true),
            post("new", now - Duration::days(1), false, true),
            post("mid", now - Duration::days(2), false, true),
        ];
        let result = PostFilter::default().apply(posts, now);
        assert_eq!(ids(&result), vec!["new", "mid", "old"]);
        assert!(result
            .windows(2)
            .all(|pair| pair[0].published >= pair[1].published));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("TRUE"), None);
        assert_eq!(parse_flag(""), None);
    }
}

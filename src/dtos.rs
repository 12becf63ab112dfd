use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Read models: rows produced by joined queries, shaped for the pages that
// display them. Write-side input lives in forms.rs.

// ============================================================================
// Post read models
// ============================================================================

/// Post joined with its author, category, location and comment count
///
/// This is the row type of every post query (feeds and detail page).
/// Category and location columns are all NULL when the post is detached.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,

    pub author_id: Uuid,
    pub author_username: String,

    pub category_id: Option<i64>,
    pub category_title: Option<String>,
    pub category_slug: Option<String>,
    pub category_is_published: Option<bool>,

    pub location_id: Option<i64>,
    pub location_name: Option<String>,
    pub location_is_published: Option<bool>,

    pub comment_count: i64,
}

impl PostView {
    /// Publication gate shared by every public listing
    ///
    /// A post is public when it is published, filed under a published
    /// category, and its `pub_date` has been reached. Posts without a
    /// category are never public.
    pub fn is_public(&self, now: DateTime<Utc>) -> bool {
        self.is_published && self.category_is_published == Some(true) && self.pub_date <= now
    }

    /// Public posts are visible to everyone; the author always sees their own.
    pub fn is_visible_to(&self, viewer: Option<Uuid>, now: DateTime<Utc>) -> bool {
        viewer == Some(self.author_id) || self.is_public(now)
    }

    /// Location shown on pages only while it is published.
    pub fn visible_location(&self) -> Option<&str> {
        match self.location_is_published {
            Some(true) => self.location_name.as_deref(),
            _ => None,
        }
    }
}

// ============================================================================
// Comment read models
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub post_id: i64,
    pub author_id: Uuid,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Query DTOs
// ============================================================================

/// `?page=` query parameter of the listing pages
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// `?next=` query parameter of the login page
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    fn post(is_published: bool, category_is_published: Option<bool>, offset: i64) -> PostView {
        let now = Utc::now();
        PostView {
            id: 1,
            title: "Title".to_string(),
            text: "Text".to_string(),
            pub_date: now + Duration::hours(offset),
            is_published,
            created_at: now,
            image: None,
            author_id: Uuid::nil(),
            author_username: "author".to_string(),
            category_id: category_is_published.map(|_| 1),
            category_title: category_is_published.map(|_| "Travel".to_string()),
            category_slug: category_is_published.map(|_| "travel".to_string()),
            category_is_published,
            location_id: None,
            location_name: None,
            location_is_published: None,
            comment_count: 0,
        }
    }

    #[rstest]
    #[case::published(true, Some(true), -1, true)]
    #[case::unpublished_post(false, Some(true), -1, false)]
    #[case::unpublished_category(true, Some(false), -1, false)]
    #[case::no_category(true, None, -1, false)]
    #[case::scheduled(true, Some(true), 1, false)]
    fn public_gate(
        #[case] is_published: bool,
        #[case] category: Option<bool>,
        #[case] offset_hours: i64,
        #[case] expected: bool,
    ) {
        let post = post(is_published, category, offset_hours);
        assert_eq!(post.is_public(Utc::now()), expected);
    }

    #[test]
    fn author_sees_hidden_post() {
        let post = post(false, Some(true), 24);
        assert!(post.is_visible_to(Some(post.author_id), Utc::now()));
        assert!(!post.is_visible_to(Some(Uuid::new_v4()), Utc::now()));
        assert!(!post.is_visible_to(None, Utc::now()));
    }

    #[test]
    fn scheduled_post_becomes_public_once_due() {
        let post = post(true, Some(true), 2);
        assert!(!post.is_public(Utc::now()));
        assert!(post.is_public(Utc::now() + Duration::hours(3)));
    }

    #[test]
    fn hidden_location_is_not_shown() {
        let mut post = post(true, Some(true), -1);
        post.location_name = Some("Moscow".to_string());
        post.location_is_published = Some(false);
        assert_eq!(post.visible_location(), None);
        post.location_is_published = Some(true);
        assert_eq!(post.visible_location(), Some("Moscow"));
    }
}

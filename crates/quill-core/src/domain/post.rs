use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a blog post with its comments embedded.
///
/// Comments live inside the post rather than as independent records: they
/// are appended in order, never edited, and removed together with the post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment embedded in a post. `author_name` is denormalized at creation
/// time so listings render without a user lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub user_id: Uuid,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(user_id: Uuid, author_name: String, text: String) -> Self {
        Self {
            user_id,
            author_name,
            text,
            created_at: Utc::now(),
        }
    }
}

impl Post {
    /// Create a new post with generated ID, empty comments, and timestamps.
    pub fn new(
        author_id: Uuid,
        title: String,
        content: String,
        tags: Vec<String>,
        image_url: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            content,
            tags,
            image_url,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update. Only fields present in the patch change;
    /// the author is not reachable from a patch.
    pub fn apply(&mut self, patch: PostPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = Some(image_url);
        }
        self.updated_at = Utc::now();
    }
}

/// Allowlisted mutable fields of a post.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image_url: Option<String>,
}

/// A post joined with its author's display name.
#[derive(Debug, Clone)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author_name: String,
}

/// One page of posts, newest first.
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<PostWithAuthor>,
    pub page: u64,
    pub pages: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> Post {
        Post::new(
            Uuid::new_v4(),
            "First post".to_string(),
            "Hello".to_string(),
            vec!["intro".to_string()],
            None,
        )
    }

    #[test]
    fn patch_changes_only_present_fields() {
        let mut post = sample_post();
        let author = post.author_id;

        post.apply(PostPatch {
            content: Some("Updated".to_string()),
            ..Default::default()
        });

        assert_eq!(post.title, "First post");
        assert_eq!(post.content, "Updated");
        assert_eq!(post.tags, vec!["intro".to_string()]);
        assert_eq!(post.author_id, author);
    }

    #[test]
    fn patch_bumps_updated_at() {
        let mut post = sample_post();
        let before = post.updated_at;

        post.apply(PostPatch {
            title: Some("Renamed".to_string()),
            ..Default::default()
        });

        assert!(post.updated_at >= before);
    }

    #[test]
    fn comments_start_empty_and_keep_order() {
        let mut post = sample_post();
        assert!(post.comments.is_empty());

        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        post.comments
            .push(Comment::new(alice, "Alice".to_string(), "first".to_string()));
        post.comments
            .push(Comment::new(bob, "Bob".to_string(), "second".to_string()));

        assert_eq!(post.comments.len(), 2);
        assert_eq!(post.comments[0].text, "first");
        assert_eq!(post.comments[1].text, "second");
    }
}

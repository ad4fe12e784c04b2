//! In-memory repository implementations - used as fallback when no
//! database is configured. Note: Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Comment, Post, PostPage, PostWithAuthor, User};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository, UserRepository};

/// In-memory user store backed by a HashMap with async RwLock.
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        // Mirrors the unique index on email in the real store.
        if users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

/// In-memory post store. Shares the user store to resolve author names.
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<Uuid, Post>>,
    users: Arc<InMemoryUserRepository>,
}

impl InMemoryPostRepository {
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            posts: RwLock::new(HashMap::new()),
            users,
        }
    }

    async fn with_author(&self, post: Post) -> PostWithAuthor {
        let author_name = self
            .users
            .users
            .read()
            .await
            .get(&post.author_id)
            .map(|u| u.name.clone())
            .unwrap_or_default();

        PostWithAuthor { post, author_name }
    }

    async fn with_authors(&self, posts: Vec<Post>) -> Vec<PostWithAuthor> {
        let users = self.users.users.read().await;
        posts
            .into_iter()
            .map(|post| {
                let author_name = users
                    .get(&post.author_id)
                    .map(|u| u.name.clone())
                    .unwrap_or_default();
                PostWithAuthor { post, author_name }
            })
            .collect()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        self.posts.write().await.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if !posts.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.posts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list_page(&self, page: u64, page_size: u64) -> Result<PostPage, RepoError> {
        let page = page.max(1);

        let mut posts: Vec<Post> = self.posts.read().await.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = posts.len() as u64;
        let pages = total.div_ceil(page_size);

        let slice: Vec<Post> = posts
            .into_iter()
            .skip(((page - 1) * page_size) as usize)
            .take(page_size as usize)
            .collect();

        Ok(PostPage {
            posts: self.with_authors(slice).await,
            page,
            pages,
        })
    }

    async fn find_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError> {
        match self.posts.read().await.get(&id).cloned() {
            Some(post) => Ok(Some(self.with_author(post).await)),
            None => Ok(None),
        }
    }

    async fn search_title(&self, keyword: &str) -> Result<Vec<PostWithAuthor>, RepoError> {
        let needle = keyword.to_lowercase();
        let matches: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|p| p.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        Ok(self.with_authors(matches).await)
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<PostWithAuthor>, RepoError> {
        let matches: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();

        Ok(self.with_authors(matches).await)
    }

    async fn append_comment(&self, post_id: Uuid, comment: Comment) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts.get_mut(&post_id).ok_or(RepoError::NotFound)?;

        post.comments.push(comment);
        post.updated_at = Utc::now();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    async fn seed_user(users: &InMemoryUserRepository, name: &str, email: &str) -> User {
        users
            .save(User::new(name.to_string(), email.to_string(), "hash".to_string()))
            .await
            .unwrap()
    }

    fn post_titled(author: Uuid, title: &str) -> Post {
        Post::new(
            author,
            title.to_string(),
            "content".to_string(),
            Vec::new(),
            None,
        )
    }

    #[tokio::test]
    async fn duplicate_email_is_a_constraint_violation() {
        let users = InMemoryUserRepository::new();
        seed_user(&users, "Alice", "alice@example.com").await;

        let result = users
            .save(User::new(
                "Alice Again".to_string(),
                "alice@example.com".to_string(),
                "hash".to_string(),
            ))
            .await;

        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn pagination_slices_newest_first() {
        let users = Arc::new(InMemoryUserRepository::new());
        let author = seed_user(&users, "Alice", "alice@example.com").await;
        let posts = InMemoryPostRepository::new(users);

        let base = Utc::now();
        for i in 0..17 {
            let mut post = post_titled(author.id, &format!("Post {i}"));
            post.created_at = base + TimeDelta::seconds(i);
            posts.save(post).await.unwrap();
        }

        let page = posts.list_page(2, 8).await.unwrap();
        assert_eq!(page.posts.len(), 8);
        assert_eq!(page.page, 2);
        assert_eq!(page.pages, 3);
        // Page 2 starts after the 8 newest.
        assert_eq!(page.posts[0].post.title, "Post 8");

        let last = posts.list_page(3, 8).await.unwrap();
        assert_eq!(last.posts.len(), 1);
        assert_eq!(last.posts[0].post.title, "Post 0");
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_empty_matches_all() {
        let users = Arc::new(InMemoryUserRepository::new());
        let author = seed_user(&users, "Alice", "alice@example.com").await;
        let posts = InMemoryPostRepository::new(users);

        posts
            .save(post_titled(author.id, "Foo adventures"))
            .await
            .unwrap();
        posts
            .save(post_titled(author.id, "Nothing to see"))
            .await
            .unwrap();

        let hits = posts.search_title("FOO").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].post.title, "Foo adventures");
        assert_eq!(hits[0].author_name, "Alice");

        let all = posts.search_title("").await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn unknown_author_yields_empty_list() {
        let users = Arc::new(InMemoryUserRepository::new());
        let posts = InMemoryPostRepository::new(users);

        let found = posts.find_by_author(Uuid::new_v4()).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn append_comment_preserves_order_and_checks_existence() {
        let users = Arc::new(InMemoryUserRepository::new());
        let author = seed_user(&users, "Alice", "alice@example.com").await;
        let posts = InMemoryPostRepository::new(users);

        let post = posts.save(post_titled(author.id, "Commented")).await.unwrap();

        let missing = posts
            .append_comment(
                Uuid::new_v4(),
                Comment::new(author.id, "Alice".to_string(), "hi".to_string()),
            )
            .await;
        assert!(matches!(missing, Err(RepoError::NotFound)));

        posts
            .append_comment(
                post.id,
                Comment::new(author.id, "Alice".to_string(), "first".to_string()),
            )
            .await
            .unwrap();
        posts
            .append_comment(
                post.id,
                Comment::new(author.id, "Alice".to_string(), "second".to_string()),
            )
            .await
            .unwrap();

        let stored = posts.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.comments.len(), 2);
        assert_eq!(stored.comments[0].text, "first");
        assert_eq!(stored.comments[1].text, "second");
    }

    #[tokio::test]
    async fn deleting_a_post_removes_its_comments() {
        let users = Arc::new(InMemoryUserRepository::new());
        let author = seed_user(&users, "Alice", "alice@example.com").await;
        let posts = InMemoryPostRepository::new(users);

        let post = posts.save(post_titled(author.id, "Doomed")).await.unwrap();
        posts
            .append_comment(
                post.id,
                Comment::new(author.id, "Alice".to_string(), "gone soon".to_string()),
            )
            .await
            .unwrap();

        posts.delete(post.id).await.unwrap();

        assert!(posts.find_by_id(post.id).await.unwrap().is_none());
        // A second delete confirms nothing is left behind.
        assert!(matches!(posts.delete(post.id).await, Err(RepoError::NotFound)));
    }
}

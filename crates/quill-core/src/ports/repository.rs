use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, Post, PostPage, PostWithAuthor, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Persist a new entity.
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Replace an existing entity. Fails with `NotFound` if it does not exist.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address (exact, case-sensitive match).
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository. Every read method resolves the author's display name.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// One page of posts, newest first.
    async fn list_page(&self, page: u64, page_size: u64) -> Result<PostPage, RepoError>;

    /// A single post with its author's name.
    async fn find_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError>;

    /// All posts whose title contains `keyword`, case-insensitively.
    /// An empty keyword matches everything.
    async fn search_title(&self, keyword: &str) -> Result<Vec<PostWithAuthor>, RepoError>;

    /// All posts by the given author. An unknown author yields an empty list.
    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<PostWithAuthor>, RepoError>;

    /// Append a comment to a post in one atomic mutation.
    /// Fails with `NotFound` if the post does not exist.
    async fn append_comment(&self, post_id: Uuid, comment: Comment) -> Result<(), RepoError>;
}

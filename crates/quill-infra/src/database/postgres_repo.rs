//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, extension::postgres::PgExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use quill_core::domain::{Comment, PostPage, PostWithAuthor, User};
use quill_core::error::RepoError;
use quill_core::ports::{PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::PostgresBaseRepository;

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        // Mask email for logging to avoid PII in logs
        let masked = if let Some(at_pos) = email.find('@') {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = if local.len() > 1 {
                format!("{}***", &local[..1])
            } else {
                "***".to_string()
            };
            format!("{}{}", masked_local, domain)
        } else {
            "***".to_string()
        };
        tracing::debug!(user_email = %masked, "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }
}

impl PostgresPostRepository {
    /// Attach author display names to a batch of post rows with a single
    /// lookup, the way the original store resolved its author references.
    async fn resolve_authors(
        &self,
        models: Vec<post::Model>,
    ) -> Result<Vec<PostWithAuthor>, RepoError> {
        let mut author_ids: Vec<Uuid> = models.iter().map(|m| m.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let names: HashMap<Uuid, String> = if author_ids.is_empty() {
            HashMap::new()
        } else {
            UserEntity::find()
                .filter(user::Column::Id.is_in(author_ids))
                .all(&*self.db)
                .await
                .map_err(|e| RepoError::Query(e.to_string()))?
                .into_iter()
                .map(|u| (u.id, u.name))
                .collect()
        };

        Ok(models
            .into_iter()
            .map(|m| {
                let author_name = names.get(&m.author_id).cloned().unwrap_or_default();
                PostWithAuthor {
                    post: m.into(),
                    author_name,
                }
            })
            .collect())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list_page(&self, page: u64, page_size: u64) -> Result<PostPage, RepoError> {
        let page = page.max(1);

        let paginator = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .paginate(&*self.db, page_size);

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;
        let models = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        let posts = self.resolve_authors(models).await?;

        Ok(PostPage { posts, page, pages })
    }

    async fn find_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?
        else {
            return Ok(None);
        };

        Ok(self.resolve_authors(vec![model]).await?.pop())
    }

    async fn search_title(&self, keyword: &str) -> Result<Vec<PostWithAuthor>, RepoError> {
        let mut query = PostEntity::find();
        if !keyword.is_empty() {
            query = query.filter(Expr::col(post::Column::Title).ilike(format!("%{keyword}%")));
        }

        let models = query
            .all(&*self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        self.resolve_authors(models).await
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<PostWithAuthor>, RepoError> {
        let models = PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .all(&*self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        self.resolve_authors(models).await
    }

    async fn append_comment(&self, post_id: Uuid, comment: Comment) -> Result<(), RepoError> {
        let model = PostEntity::find_by_id(post_id)
            .one(&*self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?
            .ok_or(RepoError::NotFound)?;

        let mut comments = model.comments.0.clone();
        comments.push(comment);

        // Single-row update: only the comment list and timestamp change.
        let mut active = model.into_active_model();
        active.comments = Set(post::Comments(comments));
        active.updated_at = Set(Utc::now().into());
        active.update(&*self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => RepoError::NotFound,
            other => RepoError::Query(other.to_string()),
        })?;

        Ok(())
    }
}

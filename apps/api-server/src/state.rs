//! Application state - shared across all handlers.

use std::path::PathBuf;
use std::sync::Arc;

use quill_core::ports::{PasswordService, PostRepository, TokenService, UserRepository};
use quill_infra::database::{
    self, InMemoryPostRepository, InMemoryUserRepository, PostgresPostRepository,
    PostgresUserRepository,
};
use quill_infra::{Argon2PasswordService, JwtConfig, JwtTokenService};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub upload_dir: PathBuf,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let (users, posts): (Arc<dyn UserRepository>, Arc<dyn PostRepository>) =
            match &config.database {
                Some(db_config) => match database::connect(db_config).await {
                    Ok(conn) => {
                        let conn = Arc::new(conn);
                        (
                            Arc::new(PostgresUserRepository::new(conn.clone())),
                            Arc::new(PostgresPostRepository::new(conn)),
                        )
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                        Self::in_memory_repos()
                    }
                },
                None => {
                    tracing::warn!(
                        "DATABASE_URL not set. Running without database (in-memory mode)."
                    );
                    Self::in_memory_repos()
                }
            };

        tracing::info!("Application state initialized");

        Self {
            users,
            posts,
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
            upload_dir: config.upload_dir.clone(),
        }
    }

    /// Fully in-memory state, used when no database is configured and by tests.
    pub fn in_memory(jwt: JwtConfig, upload_dir: PathBuf) -> Self {
        let (users, posts) = Self::in_memory_repos();

        Self {
            users,
            posts,
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords: Arc::new(Argon2PasswordService::new()),
            upload_dir,
        }
    }

    fn in_memory_repos() -> (Arc<dyn UserRepository>, Arc<dyn PostRepository>) {
        let users = Arc::new(InMemoryUserRepository::new());
        let posts = Arc::new(InMemoryPostRepository::new(users.clone()));
        (users, posts)
    }
}

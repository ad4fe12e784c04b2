//! Database connection management and repositories.

mod connections;
pub mod entity;
mod memory;
mod postgres_base;
mod postgres_repo;

pub use connections::{DatabaseConfig, connect};
pub use memory::{InMemoryPostRepository, InMemoryUserRepository};
pub use postgres_repo::{PostgresPostRepository, PostgresUserRepository};

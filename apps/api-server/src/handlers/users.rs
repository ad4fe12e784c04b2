//! User profile handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use super::{post_response, user_response};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/users/{id}
pub async fn profile(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(user_response(user)))
}

/// GET /api/users/{id}/posts
pub async fn posts(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let found = state.posts.find_by_author(id).await?;
    let posts: Vec<_> = found.into_iter().map(post_response).collect();

    Ok(HttpResponse::Ok().json(posts))
}

//! Post handlers: CRUD, search, pagination, and comments.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use quill_core::domain::{Comment, Post, PostPatch, PostWithAuthor};
use quill_shared::dto::{
    CommentRequest, CreatePostRequest, MessageResponse, PostListResponse, UpdatePostRequest,
};

use super::post_response;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Posts per page, fixed.
const PAGE_SIZE: u64 = 8;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "pageNumber")]
    page_number: Option<u64>,
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.title.is_empty() || req.content.is_empty() {
        return Err(AppError::BadRequest(
            "Please add a title and content".to_string(),
        ));
    }

    let post = Post::new(user.id, req.title, req.content, req.tags, req.image_url);
    let saved = state.posts.save(post).await?;

    tracing::info!(post_id = %saved.id, author_id = %user.id, "Post created");

    Ok(HttpResponse::Created().json(post_response(PostWithAuthor {
        post: saved,
        author_name: user.0.name,
    })))
}

/// GET /api/posts?pageNumber=N
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let page = query.page_number.unwrap_or(1);

    let result = state.posts.list_page(page, PAGE_SIZE).await?;

    Ok(HttpResponse::Ok().json(PostListResponse {
        posts: result.posts.into_iter().map(post_response).collect(),
        page: result.page,
        pages: result.pages,
    }))
}

/// GET /api/posts/search/{keyword}
pub async fn search(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let keyword = path.into_inner();

    let found = state.posts.search_title(&keyword).await?;
    let posts: Vec<_> = found.into_iter().map(post_response).collect();

    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/user/{user_id}
pub async fn list_by_author(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let author_id = path.into_inner();

    let found = state.posts.find_by_author(author_id).await?;
    let posts: Vec<_> = found.into_iter().map(post_response).collect();

    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let found = state
        .posts
        .find_with_author(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    Ok(HttpResponse::Ok().json(post_response(found)))
}

/// PUT /api/posts/{id}
///
/// Only the author may update, and only the allowlisted fields change.
pub async fn update(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let req = body.into_inner();

    let mut post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if post.author_id != user.id {
        return Err(AppError::Forbidden("User not authorized".to_string()));
    }

    post.apply(PostPatch {
        title: req.title,
        content: req.content,
        tags: req.tags,
        image_url: req.image_url,
    });

    let updated = state.posts.update(post).await?;

    Ok(HttpResponse::Ok().json(post_response(PostWithAuthor {
        post: updated,
        author_name: user.0.name,
    })))
}

/// DELETE /api/posts/{id}
///
/// Removes the post together with its embedded comments.
pub async fn delete(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if post.author_id != user.id {
        return Err(AppError::Forbidden("User not authorized".to_string()));
    }

    state.posts.delete(id).await?;

    tracing::info!(post_id = %id, "Post removed");

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Post removed".to_string(),
    }))
}

/// POST /api/posts/{id}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let req = body.into_inner();

    if req.text.is_empty() {
        return Err(AppError::BadRequest("Please add a comment text".to_string()));
    }

    let comment = Comment::new(user.id, user.0.name.clone(), req.text);

    state
        .posts
        .append_comment(id, comment)
        .await
        .map_err(|e| match e {
            quill_core::error::RepoError::NotFound => {
                AppError::NotFound("Post not found".to_string())
            }
            other => other.into(),
        })?;

    Ok(HttpResponse::Created().json(MessageResponse {
        message: "Comment added".to_string(),
    }))
}

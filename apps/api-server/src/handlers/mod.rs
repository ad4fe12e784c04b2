//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;
mod upload;
mod users;

use actix_web::web;

use quill_core::domain::{PostWithAuthor, User};
use quill_shared::dto::{AuthorResponse, CommentResponse, PostResponse, UserResponse};

/// Configure all application routes.
///
/// Mutation endpoints take the `AuthenticatedUser` extractor; everything
/// else is public.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("", web::get().to(health::liveness))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login)),
            )
            .service(
                web::scope("/posts")
                    .service(
                        web::resource("")
                            .route(web::get().to(posts::list))
                            .route(web::post().to(posts::create)),
                    )
                    .route("/search/{keyword}", web::get().to(posts::search))
                    .route("/user/{user_id}", web::get().to(posts::list_by_author))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(posts::get))
                            .route(web::put().to(posts::update))
                            .route(web::delete().to(posts::delete)),
                    )
                    .route("/{id}/comments", web::post().to(posts::add_comment)),
            )
            .service(
                web::scope("/users")
                    .route("/{id}", web::get().to(users::profile))
                    .route("/{id}/posts", web::get().to(users::posts)),
            )
            .service(web::scope("/upload").route("", web::post().to(upload::image))),
    );
}

/// Map a resolved post to its wire shape.
pub(crate) fn post_response(resolved: PostWithAuthor) -> PostResponse {
    let PostWithAuthor { post, author_name } = resolved;

    PostResponse {
        id: post.id,
        title: post.title,
        content: post.content,
        tags: post.tags,
        image_url: post.image_url,
        author: AuthorResponse {
            id: post.author_id,
            name: author_name,
        },
        comments: post
            .comments
            .into_iter()
            .map(|c| CommentResponse {
                user: c.user_id,
                name: c.author_name,
                text: c.text,
                created_at: c.created_at,
            })
            .collect(),
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

/// Map a user to its public profile. The password hash stays behind.
pub(crate) fn user_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        bio: user.bio,
        profile_picture: user.profile_picture,
        location: user.location,
        website: user.website,
        twitter: user.twitter,
        linkedin: user.linkedin,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

#[cfg(test)]
mod tests;

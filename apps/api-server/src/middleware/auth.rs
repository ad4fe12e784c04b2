//! Authentication extractor for protected routes.

use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload, http::header, web};
use futures_util::future::LocalBoxFuture;
use std::ops::Deref;

use quill_core::domain::User;
use quill_shared::ErrorResponse;

use crate::state::AppState;

/// Authenticated user extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(user: AuthenticatedUser) -> impl Responder {
///     format!("Hello, {}!", user.name)
/// }
/// ```
///
/// Extracts the bearer token from the Authorization header, verifies it,
/// and resolves the acting user from the store. A token whose user no
/// longer exists fails the same way as a bad token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl Deref for AuthenticatedUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

/// Error type for authentication failures.
#[derive(Debug)]
pub enum AuthenticationError {
    NoToken,
    TokenFailed,
}

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthenticationError::NoToken => write!(f, "Not authorized, no token"),
            AuthenticationError::TokenFailed => write!(f, "Not authorized, token failed"),
        }
    }
}

impl ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.to_string()))
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AuthenticationError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let state = match req.app_data::<web::Data<AppState>>() {
                Some(state) => state,
                None => {
                    tracing::error!("AppState not found in app data");
                    return Err(AuthenticationError::TokenFailed);
                }
            };

            // Extract "Bearer <token>" from the Authorization header.
            let token = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .ok_or(AuthenticationError::NoToken)?;

            let claims = state
                .tokens
                .validate_token(token)
                .map_err(|_| AuthenticationError::TokenFailed)?;

            let user = state
                .users
                .find_by_id(claims.user_id)
                .await
                .map_err(|_| AuthenticationError::TokenFailed)?
                .ok_or(AuthenticationError::TokenFailed)?;

            Ok(AuthenticatedUser(user))
        })
    }
}

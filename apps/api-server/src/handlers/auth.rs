//! Authentication handlers.

use actix_web::{HttpResponse, web};

use quill_core::domain::User;
use quill_shared::dto::{AuthResponse, LoginRequest, RegisterRequest};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn auth_response(user: User, token: String) -> AuthResponse {
    AuthResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        bio: user.bio,
        profile_picture: user.profile_picture,
        token,
    }
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.name.is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Please add a name, email and password".to_string(),
        ));
    }

    // Pre-check; the unique index on email backstops concurrent registrations.
    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = state.passwords.hash(&req.password)?;

    let user = User::new(req.name, req.email, password_hash);
    let saved = state.users.save(user).await.map_err(|e| match e {
        quill_core::error::RepoError::Constraint(_) => {
            AppError::Conflict("User already exists".to_string())
        }
        other => other.into(),
    })?;

    let token = state.tokens.generate_token(saved.id)?;

    tracing::info!(user_id = %saved.id, "User registered");

    Ok(HttpResponse::Created().json(auth_response(saved, token)))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    // Unknown email and wrong password must be indistinguishable.
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;

    let valid = state.passwords.verify(&req.password, &user.password_hash)?;
    if !valid {
        return Err(invalid());
    }

    let token = state.tokens.generate_token(user.id)?;

    Ok(HttpResponse::Ok().json(auth_response(user, token)))
}

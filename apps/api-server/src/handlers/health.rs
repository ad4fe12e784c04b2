//! Liveness endpoint.

use actix_web::HttpResponse;

/// GET /api - liveness check.
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().body("Quill blogging API is running")
}

use actix_web::{App, test, web};
use serde_json::{Value, json};

use quill_infra::JwtConfig;

use crate::handlers::configure_routes;
use crate::state::AppState;

fn test_state() -> AppState {
    AppState::in_memory(
        JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_hours: 1,
            issuer: "test-issuer".to_string(),
        },
        std::env::temp_dir(),
    )
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

fn register_payload(name: &str, email: &str) -> Value {
    json!({ "name": name, "email": email, "password": "hunter2-secure" })
}

macro_rules! register {
    ($app:expr, $name:expr, $email:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(register_payload($name, $email))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        body
    }};
}

macro_rules! create_post {
    ($app:expr, $token:expr, $title:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(("Authorization", format!("Bearer {}", $token)))
            .set_json(json!({ "title": $title, "content": "Some content" }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        body
    }};
}

#[actix_web::test]
async fn liveness_returns_text() {
    let app = test_app!(test_state());

    let req = test::TestRequest::get().uri("/api").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body = test::read_body(resp).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("running"));
}

#[actix_web::test]
async fn register_returns_user_fields_and_token() {
    let app = test_app!(test_state());

    let body = register!(app, "Alice", "alice@example.com");

    assert_eq!(body["name"], "Alice");
    assert_eq!(body["email"], "alice@example.com");
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
}

#[actix_web::test]
async fn duplicate_registration_is_rejected() {
    let app = test_app!(test_state());

    register!(app, "Alice", "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(register_payload("Alice Again", "alice@example.com"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User already exists");
}

#[actix_web::test]
async fn registration_requires_all_fields() {
    let app = test_app!(test_state());

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": "alice@example.com", "password": "hunter2-secure" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn failed_logins_are_indistinguishable() {
    let app = test_app!(test_state());

    register!(app, "Alice", "alice@example.com");

    let wrong_password = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "alice@example.com", "password": "not-it" }))
        .to_request();
    let resp1 = test::call_service(&app, wrong_password).await;
    let status1 = resp1.status();
    let body1: Value = test::read_body_json(resp1).await;

    let unknown_email = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "nobody@example.com", "password": "hunter2-secure" }))
        .to_request();
    let resp2 = test::call_service(&app, unknown_email).await;
    let status2 = resp2.status();
    let body2: Value = test::read_body_json(resp2).await;

    assert_eq!(status1, 401);
    assert_eq!(status1, status2);
    assert_eq!(body1, body2);
}

#[actix_web::test]
async fn login_returns_fresh_token() {
    let app = test_app!(test_state());

    register!(app, "Alice", "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "alice@example.com", "password": "hunter2-secure" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[actix_web::test]
async fn mutation_without_token_is_rejected() {
    let app = test_app!(test_state());

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .set_json(json!({ "title": "T", "content": "C" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Not authorized, no token");
}

#[actix_web::test]
async fn tampered_token_is_rejected() {
    let app = test_app!(test_state());

    let registered = register!(app, "Alice", "alice@example.com");
    let mut token = registered["token"].as_str().unwrap().to_string();
    token.push('x');

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "title": "T", "content": "C" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Not authorized, token failed");
}

#[actix_web::test]
async fn create_post_requires_title_and_content() {
    let app = test_app!(test_state());

    let registered = register!(app, "Alice", "alice@example.com");
    let token = registered["token"].as_str().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "title": "No content here" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn created_post_is_retrievable_with_author_name() {
    let app = test_app!(test_state());

    let registered = register!(app, "Alice", "alice@example.com");
    let token = registered["token"].as_str().unwrap();

    let created = create_post!(app, token, "Hello world");
    let id = created["id"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Hello world");
    assert_eq!(body["author"]["name"], "Alice");
    assert_eq!(body["comments"].as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn missing_post_is_not_found() {
    let app = test_app!(test_state());

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}", uuid::Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 404);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Post not found");
}

#[actix_web::test]
async fn non_author_cannot_update_or_delete() {
    let app = test_app!(test_state());

    let alice = register!(app, "Alice", "alice@example.com");
    let bob = register!(app, "Bob", "bob@example.com");
    let alice_token = alice["token"].as_str().unwrap();
    let bob_token = bob["token"].as_str().unwrap();

    let created = create_post!(app, alice_token, "Alice's post");
    let id = created["id"].as_str().unwrap();

    let update = test::TestRequest::put()
        .uri(&format!("/api/posts/{id}"))
        .insert_header(("Authorization", format!("Bearer {bob_token}")))
        .set_json(json!({ "title": "Hijacked" }))
        .to_request();
    let resp = test::call_service(&app, update).await;
    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User not authorized");

    let delete = test::TestRequest::delete()
        .uri(&format!("/api/posts/{id}"))
        .insert_header(("Authorization", format!("Bearer {bob_token}")))
        .to_request();
    let resp = test::call_service(&app, delete).await;
    assert_eq!(resp.status(), 401);

    // The post is unchanged.
    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Alice's post");
}

#[actix_web::test]
async fn author_can_update_allowlisted_fields_only() {
    let app = test_app!(test_state());

    let alice = register!(app, "Alice", "alice@example.com");
    let token = alice["token"].as_str().unwrap();
    let alice_id = alice["id"].as_str().unwrap();

    let created = create_post!(app, token, "Original title");
    let id = created["id"].as_str().unwrap();

    // An `author` field in the body must be ignored.
    let update = test::TestRequest::put()
        .uri(&format!("/api/posts/{id}"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({
            "title": "New title",
            "author": uuid::Uuid::new_v4().to_string(),
        }))
        .to_request();
    let resp = test::call_service(&app, update).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "New title");
    assert_eq!(body["content"], "Some content");
    assert_eq!(body["author"]["id"], *alice_id);
}

#[actix_web::test]
async fn listing_paginates_in_pages_of_eight() {
    let state = test_state();
    let app = test_app!(state);

    let alice = register!(app, "Alice", "alice@example.com");
    let token = alice["token"].as_str().unwrap();

    for i in 0..17 {
        create_post!(app, token, format!("Post {i}"));
    }

    let req = test::TestRequest::get()
        .uri("/api/posts?pageNumber=2")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 8);
    assert_eq!(body["page"], 2);
    assert_eq!(body["pages"], 3);

    // Default page is the first one.
    let req = test::TestRequest::get().uri("/api/posts").to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 8);
    assert_eq!(body["page"], 1);

    let req = test::TestRequest::get()
        .uri("/api/posts?pageNumber=3")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn search_matches_titles_case_insensitively() {
    let app = test_app!(test_state());

    let alice = register!(app, "Alice", "alice@example.com");
    let token = alice["token"].as_str().unwrap();

    create_post!(app, token, "Foo adventures");
    create_post!(app, token, "Nothing to see");

    let req = test::TestRequest::get()
        .uri("/api/posts/search/FOO")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "Foo adventures");
}

#[actix_web::test]
async fn posts_by_user_and_unknown_user() {
    let app = test_app!(test_state());

    let alice = register!(app, "Alice", "alice@example.com");
    let token = alice["token"].as_str().unwrap();
    let alice_id = alice["id"].as_str().unwrap();

    create_post!(app, token, "One");
    create_post!(app, token, "Two");

    for uri in [
        format!("/api/posts/user/{alice_id}"),
        format!("/api/users/{alice_id}/posts"),
    ] {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    // Unknown user id yields an empty list, not an error.
    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/user/{}", uuid::Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn commenting_appends_in_order() {
    let app = test_app!(test_state());

    let alice = register!(app, "Alice", "alice@example.com");
    let token = alice["token"].as_str().unwrap();

    let created = create_post!(app, token, "Commented");
    let id = created["id"].as_str().unwrap();

    // Comment on a missing post fails.
    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/comments", uuid::Uuid::new_v4()))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "text": "hello?" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    for text in ["first", "second"] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/posts/{id}/comments"))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({ "text": text }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Comment added");
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["text"], "first");
    assert_eq!(comments[1]["text"], "second");
    assert_eq!(comments[0]["name"], "Alice");
}

#[actix_web::test]
async fn deleting_a_post_takes_its_comments_with_it() {
    let app = test_app!(test_state());

    let alice = register!(app, "Alice", "alice@example.com");
    let token = alice["token"].as_str().unwrap();

    let created = create_post!(app, token, "Doomed");
    let id = created["id"].as_str().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{id}/comments"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "text": "gone soon" }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{id}"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Post removed");

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn user_profile_never_exposes_the_password() {
    let app = test_app!(test_state());

    let alice = register!(app, "Alice", "alice@example.com");
    let alice_id = alice["id"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{alice_id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["name"], "Alice");
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}", uuid::Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn upload_stores_the_image_and_returns_its_path() {
    let upload_dir = std::env::temp_dir().join(format!("quill-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&upload_dir).unwrap();

    let state = AppState::in_memory(
        JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_hours: 1,
            issuer: "test-issuer".to_string(),
        },
        upload_dir.clone(),
    );
    let app = test_app!(state);

    let boundary = "------------------------testboundary";
    let payload = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"image\"; filename=\"pic.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         not-actually-a-png\r\n\
         --{boundary}--\r\n"
    );

    let req = test::TestRequest::post()
        .uri("/api/upload")
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={boundary}"),
        ))
        .set_payload(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Image Uploaded");

    let image = body["image"].as_str().unwrap();
    assert!(image.starts_with("/uploads/image-"));
    assert!(image.ends_with(".png"));

    let stored = upload_dir.join(image.trim_start_matches("/uploads/"));
    assert_eq!(std::fs::read_to_string(stored).unwrap(), "not-actually-a-png");

    std::fs::remove_dir_all(upload_dir).ok();
}

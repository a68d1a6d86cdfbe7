
use actix_web::{
    http::{header, StatusCode},
    middleware::NormalizePath,
    test, web, App,
};
use car_listings_backend::{
    db::postgres::create_lazy_pool,
    entities::token::Identity,
    middlewares::auth::AuthMiddleware,
    routes::configure_routes,
    settings::AppConfig,
    AppState,
};
use serde_json::{json, Value};

use test_utils::{gif_bytes, identity, jpeg_bytes, mint_token, test_config, valid_form, TestStorage};

const BOUNDARY: &str = "----car-listings-test-boundary";

fn build_state(config: &AppConfig) -> web::Data<AppState> {
    // Never reached by the routes exercised here
    let pool = create_lazy_pool(&config.database_url).expect("lazy pool");
    web::Data::new(AppState::new(config, pool).expect("app state"))
}

fn bearer(config: &AppConfig, user: &Identity) -> String {
    format!("Bearer {}", mint_token(&config.jwt_secret, user, 5))
}

fn multipart_body(file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(auth: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/drafts/images")
        .insert_header((header::AUTHORIZATION, auth.to_string()))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(file_name, content_type, bytes))
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .wrap(NormalizePath::trim())
                .wrap(AuthMiddleware)
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_rt::test]
async fn test_home_is_public() {
    let storage = TestStorage::new();
    let config = test_config(&storage.root);
    let state = build_state(&config);
    let app = init_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_draft_routes_require_a_token() {
    let storage = TestStorage::new();
    let config = test_config(&storage.root);
    let state = build_state(&config);
    let app = init_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/drafts").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/drafts")
        .insert_header((header::AUTHORIZATION, "Bearer not.a.token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Missing or invalid credentials");
}

#[actix_rt::test]
async fn test_expired_token_is_rejected() {
    let storage = TestStorage::new();
    let config = test_config(&storage.root);
    let state = build_state(&config);
    let app = init_app!(state);

    let expired = format!("Bearer {}", mint_token(&config.jwt_secret, &identity(), -5));

    let req = test::TestRequest::get()
        .uri("/api/v1/drafts")
        .insert_header((header::AUTHORIZATION, expired))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Token has expired");
}

#[actix_rt::test]
async fn test_gif_upload_is_unsupported_media_type() {
    let storage = TestStorage::new();
    let config = test_config(&storage.root);
    let state = build_state(&config);
    let app = init_app!(state);
    let user = identity();
    let auth = bearer(&config, &user);

    let resp = test::call_service(&app, upload_request(&auth, "car.gif", "image/gif", &gif_bytes()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    assert!(state.listing_handler.get_draft(&user).is_empty());
}

#[actix_rt::test]
async fn test_upload_serve_and_remove_image() {
    let storage = TestStorage::new();
    let config = test_config(&storage.root);
    let state = build_state(&config);
    let app = init_app!(state);
    let user = identity();
    let auth = bearer(&config, &user);

    let resp = test::call_service(&app, upload_request(&auth, "car.jpg", "image/jpeg", &jpeg_bytes()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let image: Value = test::read_body_json(resp).await;
    let name = image["name"].as_str().unwrap().to_string();
    let url = image["url"].as_str().unwrap().to_string();
    assert_eq!(image["media_type"], "image/jpeg");
    assert_eq!(image["file_name"], "car.jpg");

    let req = test::TestRequest::get()
        .uri("/api/v1/drafts")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .to_request();
    let draft: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(draft["count"], 1);
    assert_eq!(draft["images"][0]["name"], name.as_str());

    let media_path = url::Url::parse(&url).unwrap().path().to_string();
    let resp = test::call_service(&app, test::TestRequest::get().uri(&media_path).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/jpeg");
    let served = test::read_body(resp).await;
    assert_eq!(served.to_vec(), jpeg_bytes());

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/drafts/images/{}", name))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    assert!(state.listing_handler.get_draft(&user).is_empty());

    let resp = test::call_service(&app, test::TestRequest::get().uri(&media_path).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_upload_without_image_field_is_bad_request() {
    let storage = TestStorage::new();
    let config = test_config(&storage.root);
    let state = build_state(&config);
    let app = init_app!(state);
    let auth = bearer(&config, &identity());

    let req = test::TestRequest::post()
        .uri("/api/v1/drafts/images")
        .insert_header((header::AUTHORIZATION, auth))
        .set_json(json!({"image": "car.jpg"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_submit_with_empty_draft_is_unprocessable() {
    let storage = TestStorage::new();
    let config = test_config(&storage.root);
    let state = build_state(&config);
    let app = init_app!(state);
    let auth = bearer(&config, &identity());

    let req = test::TestRequest::post()
        .uri("/api/v1/listings")
        .insert_header((header::AUTHORIZATION, auth))
        .set_json(valid_form())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Send at least 1 image");
}

#[actix_rt::test]
async fn test_submit_with_invalid_form_lists_field_errors() {
    let storage = TestStorage::new();
    let config = test_config(&storage.root);
    let state = build_state(&config);
    let app = init_app!(state);
    let auth = bearer(&config, &identity());

    let mut form = valid_form();
    form.whatsapp = "not-a-phone".into();

    let req = test::TestRequest::post()
        .uri("/api/v1/listings")
        .insert_header((header::AUTHORIZATION, auth))
        .set_json(form)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"][0]["field"], "whatsapp");
}

#[actix_rt::test]
async fn test_malformed_json_is_reported_as_json() {
    let storage = TestStorage::new();
    let config = test_config(&storage.root);
    let state = build_state(&config);
    let app = init_app!(state);
    let auth = bearer(&config, &identity());

    let req = test::TestRequest::post()
        .uri("/api/v1/listings")
        .insert_header((header::AUTHORIZATION, auth))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"name\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("JSON payload error"));
}

#[actix_rt::test]
async fn test_listing_lookup_with_malformed_id_is_bad_request() {
    let storage = TestStorage::new();
    let config = test_config(&storage.root);
    let state = build_state(&config);
    let app = init_app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/listings/not-a-uuid").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_delete_listing_requires_a_token() {
    let storage = TestStorage::new();
    let config = test_config(&storage.root);
    let state = build_state(&config);
    let app = init_app!(state);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/listings/{}", uuid::Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_discard_draft_removes_uploads() {
    let storage = TestStorage::new();
    let config = test_config(&storage.root);
    let state = build_state(&config);
    let app = init_app!(state);
    let user = identity();
    let auth = bearer(&config, &user);

    for _ in 0..2 {
        let resp = test::call_service(&app, upload_request(&auth, "car.jpg", "image/jpeg", &jpeg_bytes()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::delete()
        .uri("/api/v1/drafts")
        .insert_header((header::AUTHORIZATION, auth))
        .to_request();
    let report: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(report["removed_images"], 2);
    assert_eq!(report["orphaned_images"], json!([]));
    assert_eq!(state.listing_handler.pending.draft_count(), 0);
}

#[actix_rt::test]
async fn test_health_reports_degraded_without_database() {
    let storage = TestStorage::new();
    let config = test_config(&storage.root);
    let state = build_state(&config);
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "Unavailable");
    assert_eq!(body["open_drafts"], 0);
}

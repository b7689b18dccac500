use actix_web::{http::header, test, web, App, HttpResponse};
use chrono::{Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use chirpy::auth::{generate_access_token, generate_access_token_at};
use chirpy::configuration::JwtSettings;
use chirpy::middleware::{AuthenticatedUser, JwtMiddleware};

const SECRET: &str = "middleware-test-secret";

async fn whoami(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    HttpResponse::Ok().body(user.user_id.to_string())
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().finish()
}

macro_rules! test_app {
    () => {
        test::init_service(
            App::new()
                .route("/api/healthz", web::get().to(health_check))
                .service(
                    web::scope("/api/me")
                        .wrap(JwtMiddleware::new(JwtSettings::new(SECRET)))
                        .route("", web::get().to(whoami)),
                ),
        )
        .await
    };
}

#[actix_web::test]
async fn protected_route_returns_user_for_valid_token() {
    let app = test_app!();
    let user_id = Uuid::new_v4();
    let token = generate_access_token(&user_id, SECRET.as_bytes(), Duration::hours(1))
        .expect("Failed to generate token");

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(200, resp.status().as_u16());
    let body = test::read_body(resp).await;
    assert_eq!(body, user_id.to_string());
}

#[actix_web::test]
async fn protected_route_returns_401_without_token() {
    let app = test_app!();

    let req = test::TestRequest::get().uri("/api/me").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(401, resp.status().as_u16());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "MISSING_TOKEN");
}

#[actix_web::test]
async fn protected_route_returns_401_with_invalid_token() {
    let app = test_app!();

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header((header::AUTHORIZATION, "Bearer invalid.token.here"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(401, resp.status().as_u16());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "TOKEN_INVALID");
}

#[actix_web::test]
async fn expired_and_forged_tokens_get_the_same_answer() {
    let app = test_app!();
    let user_id = Uuid::new_v4();

    let expired = generate_access_token_at(
        &user_id,
        SECRET.as_bytes(),
        Duration::minutes(5),
        Utc::now() - Duration::hours(1),
    )
    .expect("Failed to generate token");
    let forged = generate_access_token(&user_id, b"another-secret", Duration::hours(1))
        .expect("Failed to generate token");

    for token in [expired, forged] {
        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(401, resp.status().as_u16());
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "TOKEN_INVALID");
        assert_eq!(body["message"], "Invalid or expired token");
    }
}

#[actix_web::test]
async fn protected_route_rejects_malformed_authorization_header() {
    let app = test_app!();

    let malformed_headers = vec![
        "Bearer",             // missing token
        "Basic dXNlcjpwYXNz", // not Bearer
        "bearer abc",         // wrong case
    ];

    for value in malformed_headers {
        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header((header::AUTHORIZATION, value))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(401, resp.status().as_u16(), "Should reject malformed header: {}", value);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "MALFORMED_HEADER", "header: {}", value);
    }
}

#[actix_web::test]
async fn bearer_scheme_without_space_still_yields_token() {
    let app = test_app!();
    let user_id = Uuid::new_v4();
    let token = generate_access_token(&user_id, SECRET.as_bytes(), Duration::hours(1))
        .expect("Failed to generate token");

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header((header::AUTHORIZATION, format!("Bearer{}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(200, resp.status().as_u16());
}

#[actix_web::test]
async fn public_routes_are_not_guarded() {
    let app = test_app!();

    let req = test::TestRequest::get().uri("/api/healthz").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(200, resp.status().as_u16());
}

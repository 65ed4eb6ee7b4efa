#![allow(dead_code)]

use std::time::Duration;

use actix_web::{test, web};
use serde_json::json;
use taskkeeper::auth::AuthResponse;
use taskkeeper::{AppState, Config, Stores};

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_config() -> Config {
    Config {
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl: Duration::from_secs(60 * 60),
        database_url: None,
        database_max_connections: 1,
        store_timeout: Duration::from_secs(2),
        sweep_interval: Duration::from_millis(50),
        bcrypt_cost: 4,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        cors_origin: None,
    }
}

pub fn test_state() -> web::Data<AppState> {
    web::Data::new(AppState::new(&test_config(), Stores::memory()).expect("valid test config"))
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Registers a user through the API and returns the auth response.
pub async fn register_user<S, B>(app: &S, username: &str, email: &str) -> AuthResponse
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    B: actix_web::body::MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "username": username,
            "email": email,
            "password": "Password123!"
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(
        resp.status(),
        actix_web::http::StatusCode::CREATED,
        "registration of {} failed",
        email
    );
    test::read_body_json(resp).await
}

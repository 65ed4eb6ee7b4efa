use crate::{
    auth::{hash_password, verify_password, AuthResponse, CurrentUser, LoginRequest, RegisterRequest},
    error::AppError,
    models::NewUser,
    state::AppState,
    store::bounded,
};
use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Register a new user
///
/// Creates a new user account and returns an authentication token.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let register_data = register_data.into_inner();

    let password_hash = hash_password(&register_data.password, state.bcrypt_cost)?;

    let user = bounded(
        state.store_timeout,
        state.users.create_user(NewUser {
            username: register_data.username,
            email: register_data.email,
            password_hash,
        }),
    )
    .await?;
    log::info!("registered user {}", user.id);

    let issued = state.tokens.issue(&user.id)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user: user.into(),
    }))
}

/// Login user
///
/// Authenticates a user by email and password and returns an authentication token.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = bounded(
        state.store_timeout,
        state.users.find_by_handle(&login_data.email),
    )
    .await?;

    let user = match user {
        Some(user) if verify_password(&login_data.password, &user.password_hash)? => user,
        Some(_) => return Err(AppError::Unauthorized("Invalid credentials".into())),
        None => {
            // Pay the same bcrypt cost as a real account before answering.
            verify_password(&login_data.password, &state.dummy_password_hash)?;
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }
    };

    let issued = state.tokens.issue(&user.id)?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user: user.into(),
    }))
}

/// Logout user
///
/// Revokes the presented token until it would have expired on its own.
pub async fn logout(
    state: web::Data<AppState>,
    current: CurrentUser,
) -> Result<impl Responder, AppError> {
    state
        .ledger
        .revoke(&current.0.token, current.0.expires_at)
        .await?;
    log::info!("user {} logged out", current.id());

    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out successfully" })))
}

/// Current user
///
/// Returns the authenticated user's profile.
pub async fn me(current: CurrentUser) -> impl Responder {
    HttpResponse::Ok().json(current.0.user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::Stores;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;
    use std::time::Duration;

    fn state() -> web::Data<AppState> {
        let config = Config {
            jwt_secret: "routes-auth-secret".to_string(),
            token_ttl: Duration::from_secs(3600),
            database_url: None,
            database_max_connections: 1,
            store_timeout: Duration::from_secs(1),
            sweep_interval: Duration::from_secs(60),
            bcrypt_cost: 4,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            cors_origin: None,
        };
        web::Data::new(AppState::new(&config, Stores::memory()).unwrap())
    }

    #[actix_rt::test]
    async fn test_register_validation() {
        let app = test::init_service(App::new().app_data(state()).service(register)).await;

        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({
                "username": "test",
                "email": "invalid-email",
                "password": "password123"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({
                "username": "test",
                "email": "test@example.com",
                "password": "short"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_rt::test]
    async fn test_login_with_wrong_password() {
        let state = state();
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .service(register)
                .service(login),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({
                "username": "tester",
                "email": "tester@example.com",
                "password": "password123"
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({
                "email": "tester@example.com",
                "password": "not-the-password"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid credentials");
    }

    #[actix_rt::test]
    async fn test_login_with_unknown_email() {
        let state = state();
        assert!(state.dummy_password_hash.starts_with("$2b$04$"));
        let app = test::init_service(App::new().app_data(state.clone()).service(login)).await;

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({
                "email": "nobody@example.com",
                "password": "password123"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid credentials");
    }
}

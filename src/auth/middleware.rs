use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use super::gate::AuthGate;
use crate::error::AppError;

/// Runs the [`AuthGate`] in front of every wrapped route.
///
/// On success the resulting `AuthContext` is placed in the request extensions
/// for the [`CurrentUser`](super::extractors::CurrentUser) extractor. On failure
/// the request is answered here with the mapped error and never reaches the
/// handler.
#[derive(Clone)]
pub struct AuthMiddleware {
    gate: Arc<AuthGate>,
}

impl AuthMiddleware {
    pub fn new(gate: Arc<AuthGate>) -> Self {
        Self { gate }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            gate: Arc::clone(&self.gate),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    gate: Arc<AuthGate>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let gate = Arc::clone(&self.gate);

        Box::pin(async move {
            let authorization = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            match gate.authenticate(authorization.as_deref()).await {
                Ok(context) => {
                    req.extensions_mut().insert(context);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(auth_err) => {
                    let response = AppError::from(auth_err).error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::revocation::RevocationLedger;
    use crate::auth::token::TokenService;
    use crate::auth::AuthContext;
    use crate::models::User;
    use crate::store::{MemoryStore, StoreResult, UserStore};
    use actix_web::{http::StatusCode, test, web, App, HttpRequest, HttpResponse};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration;

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match req.extensions().get::<AuthContext>() {
            Some(ctx) => HttpResponse::Ok().body(ctx.user.id.clone()),
            None => HttpResponse::InternalServerError().finish(),
        }
    }

    #[actix_rt::test]
    async fn test_middleware_inserts_context_or_answers_401() {
        let tokens = Arc::new(TokenService::new("mw-secret", chrono::Duration::hours(1)));
        let store = Arc::new(MemoryStore::new());
        store
            .insert_user(User {
                id: "U123".to_string(),
                username: "u123".to_string(),
                email: "u123@example.com".to_string(),
                password_hash: "hash".to_string(),
                created_at: Utc::now(),
            })
            .await;
        let ledger = Arc::new(RevocationLedger::new(store.clone(), Duration::from_secs(1)));
        let gate = Arc::new(AuthGate::new(
            tokens.clone(),
            ledger,
            store.clone(),
            Duration::from_secs(1),
        ));

        let app = test::init_service(
            App::new().service(
                web::resource("/me")
                    .wrap(AuthMiddleware::new(gate))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let token = tokens.issue("U123").unwrap().token;
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "U123");

        let req = test::TestRequest::get().uri("/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Not authorized, no token");
    }

    struct StalledUsers;

    #[async_trait]
    impl UserStore for StalledUsers {
        async fn create_user(&self, _: crate::models::NewUser) -> StoreResult<User> {
            std::future::pending().await
        }

        async fn find_by_id(&self, _: &str) -> StoreResult<Option<User>> {
            std::future::pending().await
        }

        async fn find_by_handle(&self, _: &str) -> StoreResult<Option<User>> {
            std::future::pending().await
        }
    }

    #[actix_rt::test]
    async fn test_middleware_answers_503_when_user_store_hangs() {
        let tokens = Arc::new(TokenService::new("mw-secret", chrono::Duration::hours(1)));
        let ledger = Arc::new(RevocationLedger::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(1),
        ));
        let gate = Arc::new(AuthGate::new(
            tokens.clone(),
            ledger,
            Arc::new(StalledUsers),
            Duration::from_millis(20),
        ));

        let app = test::init_service(
            App::new().service(
                web::resource("/me")
                    .wrap(AuthMiddleware::new(gate))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let token = tokens.issue("U123").unwrap().token;
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Service temporarily unavailable");
    }
}

use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use super::gate::AuthContext;
use crate::error::{AppError, TOKEN_FAILED_MESSAGE};

/// The authenticated caller, as resolved by `AuthMiddleware`.
///
/// Only meaningful on routes wrapped by the middleware. Without an
/// `AuthContext` in the request extensions the extractor fails with 401, so a
/// route that was accidentally left unwrapped fails closed.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthContext);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0.user.id
    }
}

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthContext>().cloned() {
            Some(context) => ready(Ok(CurrentUser(context))),
            None => {
                log::error!("no auth context on {}; is AuthMiddleware applied?", req.path());
                ready(Err(AppError::Unauthorized(TOKEN_FAILED_MESSAGE.into()).into()))
            }
        }
    }
}

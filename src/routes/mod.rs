pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

use crate::auth::AuthMiddleware;
use crate::error::AppError;
use crate::state::AppState;

/// Registers every route. Everything under `/tasks`, plus logout and the
/// profile endpoint, sits behind [`AuthMiddleware`].
pub fn config(cfg: &mut web::ServiceConfig, state: web::Data<AppState>) {
    let guard = AuthMiddleware::new(state.gate.clone());

    cfg.app_data(state)
        .app_data(
            web::JsonConfig::default()
                .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
        )
        .app_data(
            web::PathConfig::default()
                .error_handler(|_err, _req| AppError::NotFound("Task not found".into()).into()),
        )
        .service(health::index)
        .service(health::health)
        .service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::login)
                .service(
                    web::resource("/logout")
                        .wrap(guard.clone())
                        .route(web::post().to(auth::logout)),
                )
                .service(
                    web::resource("/me")
                        .wrap(guard.clone())
                        .route(web::get().to(auth::me)),
                ),
        )
        .service(
            web::scope("/tasks")
                .wrap(guard)
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}

pub mod admin;
pub mod auth;
pub mod bookmarks;
pub mod careers;
pub mod questions;

use axum::extract::FromRequest;
use axum::routing::{get, post, put};
use axum::Router;
use serde::Serialize;

use crate::error::AppError;
use crate::state::SharedState;

/// `Json` whose rejections come back as `400 {"error": ...}` instead of 422.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/auth/register/", post(auth::register))
        .route("/auth/login/", post(auth::login))
        .route("/auth/me/", get(auth::me))
        .route("/auth/password-reset/", post(auth::password_reset_request))
        .route(
            "/auth/password-reset/confirm/",
            post(auth::password_reset_confirm),
        )
        // Careers
        .route("/careers/", get(careers::list).post(careers::create))
        .route(
            "/careers/{id}/",
            get(careers::get)
                .put(careers::update)
                .delete(careers::delete),
        )
        // Quiz content
        .route("/questions/list/", get(questions::list_public))
        .route("/questions/", get(questions::list).post(questions::create))
        .route(
            "/questions/{id}/",
            put(questions::update).delete(questions::delete),
        )
        // Bookmarks
        .route("/bookmarks/", get(bookmarks::list).post(bookmarks::create))
        .route("/bookmarks/{id}/", axum::routing::delete(bookmarks::delete))
        // User administration
        .route("/users/", get(admin::list_users))
        .route(
            "/users/{id}/",
            axum::routing::patch(admin::update_user).delete(admin::delete_user),
        )
}

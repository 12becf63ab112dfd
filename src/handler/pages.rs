use axum::{Extension, Router, response::IntoResponse, routing::get};

use crate::{AppState, middleware::CurrentUser, render};

/// Router for the static pages
pub fn pages_handler() -> Router<AppState> {
    Router::new()
        .route("/pages/about/", get(about))
        .route("/pages/rules/", get(rules))
}

pub async fn about(Extension(current): Extension<CurrentUser>) -> impl IntoResponse {
    render::pages::about_page(current.user())
}

pub async fn rules(Extension(current): Extension<CurrentUser>) -> impl IntoResponse {
    render::pages::rules_page(current.user())
}

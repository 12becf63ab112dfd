use axum::{Router, middleware};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    AppState,
    error::{ErrorMessage, HttpError},
    handler::{
        admin::admin_handler, auth::auth_handler, comment::comment_handler, pages::pages_handler,
        post::post_handler, users::users_handler,
    },
    middleware::session,
};

/// Unknown paths get the HTML 404 page.
async fn not_found() -> HttpError {
    HttpError::not_found(ErrorMessage::PageNotFound.to_string())
}

pub fn create_router(app_state: AppState) -> Router {
    let media = ServeDir::new(&app_state.env.media_root);

    Router::new()
        .merge(post_handler())
        .merge(comment_handler())
        .merge(users_handler())
        .merge(pages_handler())
        .merge(admin_handler())
        .nest("/auth", auth_handler())
        .nest_service("/media", media)
        .fallback(not_found)
        // Outermost layers run first: the session is resolved before any
        // route-level login check.
        .layer(middleware::from_fn_with_state(app_state.clone(), session))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

use axum::{
    Extension, Form, Router,
    extract::{Path, Query, State},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::WithRejection;
use tracing::instrument;

use crate::{
    AppState,
    db::{CommentExt, PostScope, UserExt, is_unique_violation},
    dtos::PageQuery,
    error::{ErrorMessage, HttpError},
    forms::{FormErrors, UserForm, check},
    handler::post::load_feed,
    middleware::{AuthUser, CurrentUser, login_required},
    render::{self, urls},
};

/// Router for profile pages
///
/// `/profile/edit/` is matched before the `{username}` capture.
pub fn users_handler() -> Router<AppState> {
    Router::new()
        .route("/profile/{username}/", get(profile))
        .route(
            "/profile/edit/",
            get(edit_profile_page)
                .post(edit_profile)
                .route_layer(middleware::from_fn(login_required)),
        )
}

/// Profile with the user's posts and statistics
///
/// The owner also sees unpublished, scheduled and hidden-category posts.
#[instrument(skip(app_state, current))]
pub async fn profile(
    WithRejection(Path(username), _): WithRejection<Path<String>, HttpError>,
    Query(query): Query<PageQuery>,
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state
        .db_client
        .get_user(None, Some(&username), None, None)
        .await
        .map_err(|e| HttpError::db(e, "getting user"))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::PageNotFound.to_string()))?;

    let is_owner = current.user().is_some_and(|viewer| viewer.id == profile.id);
    let scope = PostScope::Author {
        author_id: profile.id,
        include_hidden: is_owner,
    };

    let page = load_feed(&app_state, scope, query.page.as_deref()).await?;

    let comment_count = app_state
        .db_client
        .get_user_comment_count(profile.id)
        .await
        .map_err(|e| HttpError::db(e, "counting comments"))?;

    Ok(render::blog::profile_page(
        current.user(),
        &profile,
        comment_count,
        &page,
    ))
}

#[instrument(skip(auth), fields(username = %auth.user.username))]
pub async fn edit_profile_page(
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(render::blog::user_form_page(
        Some(&auth.user),
        &UserForm::from_user(&auth.user),
        &FormErrors::new(),
    ))
}

/// Updates the requester's own account; username clashes come back as a
/// field error
#[instrument(skip(app_state, auth, body), fields(username = %auth.user.username))]
pub async fn edit_profile(
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Form(body): Form<UserForm>,
) -> Result<Response, HttpError> {
    if let Err(errors) = check(&body) {
        return Ok(render::blog::user_form_page(Some(&auth.user), &body, &errors).into_response());
    }

    let result = app_state
        .db_client
        .update_profile(
            auth.user.id,
            body.username.trim(),
            body.email.trim(),
            body.first_name.trim(),
            body.last_name.trim(),
        )
        .await;

    match result {
        Ok(user) => {
            tracing::info!(new_username = %user.username, "Profile updated");
            Ok(Redirect::to(&urls::profile(&user.username)).into_response())
        }
        Err(e) if is_unique_violation(&e) => {
            let mut errors = FormErrors::new();
            errors.add("username", "A user with that username already exists.");
            Ok(render::blog::user_form_page(Some(&auth.user), &body, &errors).into_response())
        }
        Err(e) => Err(HttpError::db(e, "updating profile")),
    }
}

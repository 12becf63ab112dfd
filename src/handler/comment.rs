use axum::{
    Extension, Form, Router,
    extract::{Path, State},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use tracing::instrument;

use crate::{
    AppState,
    access::ensure_author,
    db::CommentExt,
    error::HttpError,
    forms::{CommentForm, FormErrors, check},
    handler::post::visible_post,
    middleware::{AuthUser, login_required},
    models::{Comment, User},
    render::{self, urls},
};

/// Router for comment endpoints
///
/// Every route needs a login. The edit route has no trailing slash.
pub fn comment_handler() -> Router<AppState> {
    Router::new()
        .route("/posts/{post_id}/comment/", post(add_comment))
        .route(
            "/posts/{post_id}/edit_comment/{comment_id}",
            get(edit_comment_page).post(edit_comment),
        )
        .route(
            "/posts/{post_id}/delete_comment/{comment_id}/",
            get(delete_comment_page).post(delete_comment),
        )
        .route_layer(middleware::from_fn(login_required))
}

/// Adds a comment to a post the requester can see
///
/// An empty comment re-renders the post page with the error.
#[instrument(skip(app_state, auth, body), fields(username = %auth.user.username))]
pub async fn add_comment(
    WithRejection(Path(post_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Form(body): Form<CommentForm>,
) -> Result<Response, HttpError> {
    let post = visible_post(&app_state, post_id, Some(&auth.user)).await?;

    if let Err(errors) = check(&body) {
        let comments = app_state
            .db_client
            .get_comments(post.id)
            .await
            .map_err(|e| HttpError::db(e, "getting comments"))?;

        return Ok(render::blog::post_detail_page(
            Some(&auth.user),
            &post,
            &comments,
            &body,
            &errors,
        )
        .into_response());
    }

    let comment = app_state
        .db_client
        .create_comment(auth.user.id, post.id, &body.text)
        .await
        .map_err(|e| HttpError::db(e, "creating comment"))?;

    tracing::info!(post_id = post.id, comment_id = comment.id, "Comment added");
    Ok(Redirect::to(&urls::post_detail(post.id)).into_response())
}

/// The comment must belong to the post in the path and to the requester.
async fn authored_comment(
    app_state: &AppState,
    post_id: i64,
    comment_id: i64,
    user: &User,
) -> Result<Comment, HttpError> {
    let comment = app_state
        .db_client
        .get_comment(post_id, comment_id)
        .await
        .map_err(|e| HttpError::from_lookup(e, "getting comment"))?;

    ensure_author(comment, user)
}

#[instrument(skip(app_state, auth), fields(username = %auth.user.username))]
pub async fn edit_comment_page(
    WithRejection(Path((post_id, comment_id)), _): WithRejection<Path<(i64, i64)>, HttpError>,
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let comment = authored_comment(&app_state, post_id, comment_id, &auth.user).await?;
    let form = CommentForm {
        text: comment.text.clone(),
    };

    Ok(render::blog::comment_form_page(
        Some(&auth.user),
        "Edit comment",
        &urls::edit_comment(post_id, comment.id),
        &form,
        &FormErrors::new(),
    ))
}

#[instrument(skip(app_state, auth, body), fields(username = %auth.user.username))]
pub async fn edit_comment(
    WithRejection(Path((post_id, comment_id)), _): WithRejection<Path<(i64, i64)>, HttpError>,
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Form(body): Form<CommentForm>,
) -> Result<Response, HttpError> {
    let comment = authored_comment(&app_state, post_id, comment_id, &auth.user).await?;

    if let Err(errors) = check(&body) {
        return Ok(render::blog::comment_form_page(
            Some(&auth.user),
            "Edit comment",
            &urls::edit_comment(post_id, comment.id),
            &body,
            &errors,
        )
        .into_response());
    }

    app_state
        .db_client
        .edit_comment(comment.id, &body.text)
        .await
        .map_err(|e| HttpError::from_lookup(e, "editing comment"))?;

    tracing::info!(post_id, comment_id = comment.id, "Comment edited");
    Ok(Redirect::to(&urls::post_detail(post_id)).into_response())
}

#[instrument(skip(app_state, auth), fields(username = %auth.user.username))]
pub async fn delete_comment_page(
    WithRejection(Path((post_id, comment_id)), _): WithRejection<Path<(i64, i64)>, HttpError>,
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let comment = authored_comment(&app_state, post_id, comment_id, &auth.user).await?;

    Ok(render::blog::comment_delete_page(Some(&auth.user), &comment))
}

#[instrument(skip(app_state, auth), fields(username = %auth.user.username))]
pub async fn delete_comment(
    WithRejection(Path((post_id, comment_id)), _): WithRejection<Path<(i64, i64)>, HttpError>,
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let comment = authored_comment(&app_state, post_id, comment_id, &auth.user).await?;

    app_state
        .db_client
        .delete_comment(comment.id)
        .await
        .map_err(|e| HttpError::from_lookup(e, "deleting comment"))?;

    tracing::info!(post_id, comment_id = comment.id, "Comment deleted");
    Ok(Redirect::to(&urls::post_detail(post_id)))
}

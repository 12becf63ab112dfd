use axum::{
    Extension, Form, Router,
    extract::{Path, Query, State},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::{
    WithRejection,
    cookie::{Cookie, CookieJar, SameSite},
};
use chrono::{Duration, Utc};
use tracing::instrument;

use crate::{
    AppState,
    db::{UserExt, is_unique_violation},
    dtos::NextQuery,
    error::{ErrorMessage, HttpError},
    forms::{
        FormErrors, LoginForm, PasswordChangeForm, PasswordResetForm, RegistrationForm,
        SetPasswordForm, check,
    },
    mail::mails::send_password_reset_email,
    middleware::{AuthUser, SESSION_COOKIE, login_required},
    models::User,
    render::{self, NON_FIELD_ERRORS, urls},
    utils::{password, token},
};

/// How long a password reset link stays valid
const RESET_TOKEN_HOURS: i64 = 24;

/// Router for authentication pages, mounted at `/auth`
pub fn auth_handler() -> Router<AppState> {
    Router::new()
        .route("/login/", get(login_page).post(login))
        .route("/logout/", post(logout))
        .route("/registration/", get(registration_page).post(registration))
        .route(
            "/password_change/",
            get(password_change_page)
                .post(password_change)
                .route_layer(middleware::from_fn(login_required)),
        )
        .route(
            "/password_change/done/",
            get(password_change_done).route_layer(middleware::from_fn(login_required)),
        )
        .route(
            "/password_reset/",
            get(password_reset_page).post(password_reset),
        )
        .route("/password_reset/done/", get(password_reset_done))
        .route("/reset/done/", get(password_reset_complete))
        .route(
            "/reset/{token}/",
            get(password_reset_confirm_page).post(password_reset_confirm),
        )
}

fn hash_password(raw: &str) -> Result<String, HttpError> {
    password::hash(raw).map_err(|e| {
        tracing::error!("Password hashing error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })
}

/// Session cookie carrying a freshly signed token for `user`
fn session_cookie(app_state: &AppState, user: &User) -> Result<Cookie<'static>, HttpError> {
    let session_token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| {
        tracing::error!("Session token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    Ok(Cookie::build((SESSION_COOKIE, session_token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(app_state.env.jwt_maxage))
        .build())
}

#[instrument(skip_all)]
pub async fn login_page(Query(query): Query<NextQuery>) -> impl IntoResponse {
    let form = LoginForm {
        next: query.next.unwrap_or_default(),
        ..Default::default()
    };
    render::auth::login_page(&form, &FormErrors::new())
}

/// Checks the credentials and starts a session
///
/// Wrong username and wrong password produce the same message.
#[instrument(skip(app_state, jar, body), fields(username = %body.username))]
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Form(body): Form<LoginForm>,
) -> Result<Response, HttpError> {
    if let Err(errors) = check(&body) {
        return Ok(render::auth::login_page(&body, &errors).into_response());
    }

    let user = app_state
        .db_client
        .get_user(None, Some(&body.username), None, None)
        .await
        .map_err(|e| HttpError::db(e, "getting user"))?;

    let authenticated = user.filter(|user| {
        password::compare(&body.password, &user.password).unwrap_or_else(|e| {
            tracing::warn!("Password check failed: {}", e);
            false
        })
    });

    let Some(user) = authenticated else {
        tracing::warn!("Login failed");
        let mut errors = FormErrors::new();
        errors.add(NON_FIELD_ERRORS, ErrorMessage::InvalidCredentials.to_string());
        return Ok(render::auth::login_page(&body, &errors).into_response());
    };

    let cookie = session_cookie(&app_state, &user)?;
    let destination = urls::safe_next(&body.next).unwrap_or(urls::INDEX);

    tracing::info!(user_id = %user.id, "Login successful");
    Ok((jar.add(cookie), Redirect::to(destination)).into_response())
}

/// Ends the session by expiring the cookie
#[instrument(skip_all)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, render::auth::logged_out_page())
}

#[instrument(skip_all)]
pub async fn registration_page() -> impl IntoResponse {
    render::auth::registration_page(&RegistrationForm::default(), &FormErrors::new())
}

/// Creates a regular account and sends the visitor to the home page
#[instrument(skip(app_state, body), fields(username = %body.username))]
pub async fn registration(
    State(app_state): State<AppState>,
    Form(body): Form<RegistrationForm>,
) -> Result<Response, HttpError> {
    if let Err(errors) = check(&body) {
        return Ok(render::auth::registration_page(&body, &errors).into_response());
    }

    let hashed = hash_password(&body.password)?;

    let result = app_state
        .db_client
        .save_user(body.username.trim(), body.email.trim(), &hashed)
        .await;

    match result {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Registration successful");
            Ok(Redirect::to(urls::INDEX).into_response())
        }
        Err(e) if is_unique_violation(&e) => {
            let mut errors = FormErrors::new();
            errors.add("username", "A user with that username already exists.");
            Ok(render::auth::registration_page(&body, &errors).into_response())
        }
        Err(e) => Err(HttpError::db(e, "saving user")),
    }
}

#[instrument(skip(auth), fields(username = %auth.user.username))]
pub async fn password_change_page(Extension(auth): Extension<AuthUser>) -> impl IntoResponse {
    render::auth::password_change_page(&auth.user, &FormErrors::new())
}

#[instrument(skip(app_state, auth, body), fields(username = %auth.user.username))]
pub async fn password_change(
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Form(body): Form<PasswordChangeForm>,
) -> Result<Response, HttpError> {
    let mut errors = check(&body).err().unwrap_or_default();

    let old_matches = password::compare(&body.old_password, &auth.user.password).unwrap_or(false);
    if !body.old_password.is_empty() && !old_matches {
        errors.add(
            "old_password",
            "Your old password was entered incorrectly. Please enter it again.",
        );
    }

    if !errors.is_empty() {
        return Ok(render::auth::password_change_page(&auth.user, &errors).into_response());
    }

    let hashed = hash_password(&body.new_password)?;

    app_state
        .db_client
        .update_user_password(auth.user.id, &hashed)
        .await
        .map_err(|e| HttpError::db(e, "updating user password"))?;

    tracing::info!("Password changed");
    Ok(Redirect::to(urls::PASSWORD_CHANGE_DONE).into_response())
}

#[instrument(skip(auth), fields(username = %auth.user.username))]
pub async fn password_change_done(Extension(auth): Extension<AuthUser>) -> impl IntoResponse {
    render::auth::password_change_done_page(&auth.user)
}

#[instrument(skip_all)]
pub async fn password_reset_page() -> impl IntoResponse {
    render::auth::password_reset_page(&PasswordResetForm::default(), &FormErrors::new())
}

/// Mails a reset link when the address belongs to an account
///
/// The visitor always lands on the same "sent" page, so the form cannot be
/// used to probe which addresses are registered.
#[instrument(skip(app_state, body))]
pub async fn password_reset(
    State(app_state): State<AppState>,
    Form(body): Form<PasswordResetForm>,
) -> Result<Response, HttpError> {
    if let Err(errors) = check(&body) {
        return Ok(render::auth::password_reset_page(&body, &errors).into_response());
    }

    let user = app_state
        .db_client
        .get_user(None, None, Some(body.email.trim()), None)
        .await
        .map_err(|e| HttpError::db(e, "getting user"))?;

    let Some(user) = user else {
        tracing::info!("Password reset requested for an unknown email");
        return Ok(Redirect::to(urls::PASSWORD_RESET_DONE).into_response());
    };

    let reset_token = uuid::Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_HOURS);

    app_state
        .db_client
        .add_reset_token(user.id, &reset_token, expires_at)
        .await
        .map_err(|e| HttpError::db(e, "adding reset token"))?;

    let reset_link = format!(
        "{}{}",
        app_state.env.site_url,
        urls::password_reset_confirm(&reset_token)
    );

    if let Err(e) = send_password_reset_email(
        app_state.env.smtp.as_ref(),
        &user.email,
        &user.username,
        &reset_link,
    )
    .await
    {
        tracing::error!(user_id = %user.id, "Failed to send password reset email: {}", e);
    }

    tracing::info!(user_id = %user.id, "Password reset link issued");
    Ok(Redirect::to(urls::PASSWORD_RESET_DONE).into_response())
}

#[instrument(skip_all)]
pub async fn password_reset_done() -> impl IntoResponse {
    render::auth::password_reset_done_page()
}

/// Account owning an unexpired reset token
async fn reset_user(app_state: &AppState, reset_token: &str) -> Result<Option<User>, HttpError> {
    app_state
        .db_client
        .get_user(None, None, None, Some(reset_token))
        .await
        .map_err(|e| HttpError::db(e, "getting user by reset token"))
}

#[instrument(skip(app_state, reset_token))]
pub async fn password_reset_confirm_page(
    WithRejection(Path(reset_token), _): WithRejection<Path<String>, HttpError>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let valid = reset_user(&app_state, &reset_token).await?.is_some();

    Ok(render::auth::password_reset_confirm_page(
        &reset_token,
        valid,
        &FormErrors::new(),
    ))
}

/// Sets the new password; the token is cleared with it
#[instrument(skip(app_state, reset_token, body))]
pub async fn password_reset_confirm(
    WithRejection(Path(reset_token), _): WithRejection<Path<String>, HttpError>,
    State(app_state): State<AppState>,
    Form(body): Form<SetPasswordForm>,
) -> Result<Response, HttpError> {
    let Some(user) = reset_user(&app_state, &reset_token).await? else {
        tracing::warn!("Invalid or expired reset token used");
        return Ok(
            render::auth::password_reset_confirm_page(&reset_token, false, &FormErrors::new())
                .into_response(),
        );
    };

    if let Err(errors) = check(&body) {
        return Ok(
            render::auth::password_reset_confirm_page(&reset_token, true, &errors).into_response(),
        );
    }

    let hashed = hash_password(&body.new_password)?;

    app_state
        .db_client
        .update_user_password(user.id, &hashed)
        .await
        .map_err(|e| HttpError::db(e, "updating user password"))?;

    tracing::info!(user_id = %user.id, "Password reset successfully");
    Ok(Redirect::to(urls::PASSWORD_RESET_COMPLETE).into_response())
}

#[instrument(skip_all)]
pub async fn password_reset_complete() -> impl IntoResponse {
    render::auth::password_reset_complete_page()
}

use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::IntoResponse,
};

use axum_extra::extract::cookie::CookieJar;

use crate::{
    AppState,
    db::UserExt,
    error::{ErrorMessage, HttpError},
    models::{User, UserRole},
    utils::token,
};

/// Name of the cookie carrying the signed session token
pub const SESSION_COOKIE: &str = "session";

/// The visitor behind the current request, if they are logged in
///
/// Inserted into the request extensions by [`session`] on every request, so
/// public pages can personalise themselves without requiring a login.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

/// Authenticated user, present only behind [`login_required`]
///
/// Example usage in a handler:
/// ```ignore
/// async fn my_handler(Extension(auth): Extension<AuthUser>) {
///     // auth.user is the logged-in account
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

/// Resolves the `session` cookie to the logged-in user
///
/// A missing, invalid or expired token, or a token whose user no longer
/// exists, simply makes the request anonymous. The database is only touched
/// when a cookie is present.
pub async fn session(
    cookie_jar: CookieJar,
    State(app_state): State<AppState>,
    mut req: Request,
    next: Next,
) -> impl IntoResponse {
    let user = match cookie_jar.get(SESSION_COOKIE) {
        Some(cookie) => resolve_user(&app_state, cookie.value()).await,
        None => None,
    };

    req.extensions_mut().insert(CurrentUser(user));

    next.run(req).await
}

async fn resolve_user(app_state: &AppState, token: &str) -> Option<User> {
    let user_id = token::decode_token(token, app_state.env.jwt_secret.as_bytes()).ok()?;

    match app_state
        .db_client
        .get_user(Some(user_id), None, None, None)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("DB error, resolving session user: {}", e);
            None
        }
    }
}

/// Sends anonymous visitors to the login page
///
/// The login page gets the requested path as `next` so the visitor lands
/// back here afterwards. Must run after [`session`].
pub async fn login_required(mut req: Request, next: Next) -> Result<impl IntoResponse, HttpError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .and_then(|current| current.0.clone());

    let Some(user) = user else {
        return Err(HttpError::login_required(&requested_path(&req)));
    };

    req.extensions_mut().insert(AuthUser { user });

    Ok(next.run(req).await)
}

/// Full request path, including the prefix of any router this one is nested in
fn requested_path(req: &Request) -> String {
    match req.extensions().get::<OriginalUri>() {
        Some(OriginalUri(uri)) => uri.path().to_string(),
        None => req.uri().path().to_string(),
    }
}

/// Role-based access control middleware
///
/// Must be used after [`login_required`]; a logged-in user without one of
/// `required_roles` gets 403.
pub async fn role_check(
    req: Request,
    next: Next,
    required_roles: Vec<UserRole>,
) -> Result<impl IntoResponse, HttpError> {
    let auth = req
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| HttpError::login_required(&requested_path(&req)))?;

    if !required_roles.contains(&auth.user.role) {
        tracing::warn!(user = %auth.user.username, "Role check failed");
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    Ok(next.run(req).await)
}

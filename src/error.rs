use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use std::fmt;
use url::form_urlencoded;

use crate::render;

/// Enumeration of the user-facing error texts
///
/// Handlers pass these through `to_string()` so the same situation always
/// produces the same wording. PartialEq allows comparing variants in tests.
#[derive(Debug, PartialEq)]
pub enum ErrorMessage {
    // Password validation errors
    EmptyPassword,
    PasswordTooShort(usize),
    ExceededMaxPasswordLength(usize),
    InvalidHashFormat,
    HashingError,

    // Authentication errors
    InvalidToken,
    InvalidCredentials,
    UserNotAuthenticated,

    // Authorization errors
    PermissionDenied,

    // Lookup errors
    PageNotFound,
    InvalidPage,

    //Else
    ServerError,
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorMessage::EmptyPassword => "Password cannot be empty".to_string(),
            ErrorMessage::PasswordTooShort(min_length) => {
                format!("Password must be at least {} characters", min_length)
            }
            ErrorMessage::ExceededMaxPasswordLength(max_length) => {
                format!("Password must not be more than {} characters", max_length)
            }
            ErrorMessage::InvalidHashFormat => "Invalid password hash format".to_string(),
            ErrorMessage::HashingError => "Error while hashing password".to_string(),
            ErrorMessage::InvalidToken => "Token is invalid or expired".to_string(),
            ErrorMessage::InvalidCredentials => {
                "Please enter a correct username and password".to_string()
            }
            ErrorMessage::UserNotAuthenticated => {
                "Authentication required. Please log in.".to_string()
            }
            ErrorMessage::PermissionDenied => {
                "You are not allowed to perform this action".to_string()
            }
            ErrorMessage::PageNotFound => "The requested page was not found".to_string(),
            ErrorMessage::InvalidPage => "Invalid page".to_string(),
            ErrorMessage::ServerError => "Server Error. Please try again later".to_string(),
        };
        write!(f, "{}", message)
    }
}

/// Error type returned by every handler and middleware
///
/// Most variants render an HTML error page with `status`. When `location` is
/// set the error is a denial by redirect instead: the login redirect for
/// anonymous users, and the silent redirect for non-authors of a post.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub status: StatusCode,
    pub location: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        HttpError {
            message: message.into(),
            status,
            location: None,
        }
    }

    /// 500; the message shown to users should stay generic.
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::FORBIDDEN)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::NOT_FOUND)
    }

    /// Deny by sending the client elsewhere (303 See Other).
    pub fn redirect(location: impl Into<String>) -> Self {
        HttpError {
            message: ErrorMessage::PermissionDenied.to_string(),
            status: StatusCode::SEE_OTHER,
            location: Some(location.into()),
        }
    }

    /// Redirect to the login page, coming back to `next` afterwards.
    pub fn login_required(next: &str) -> Self {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("next", next)
            .finish();

        HttpError {
            message: ErrorMessage::UserNotAuthenticated.to_string(),
            status: StatusCode::SEE_OTHER,
            location: Some(format!("/auth/login/?{}", query)),
        }
    }

    /// Maps a lookup failure to 404, anything else to a logged 500.
    pub fn from_lookup(err: sqlx::Error, what: &str) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found(ErrorMessage::PageNotFound.to_string()),
            e => {
                tracing::error!("DB error, {}: {}", what, e);
                Self::server_error(ErrorMessage::ServerError.to_string())
            }
        }
    }

    /// Logs a database failure and hides its details from the client.
    pub fn db(err: sqlx::Error, what: &str) -> Self {
        tracing::error!("DB error, {}: {}", what, err);
        Self::server_error(ErrorMessage::ServerError.to_string())
    }

    pub fn into_http_response(self) -> Response {
        match self.location {
            Some(location) => Redirect::to(&location).into_response(),
            None => (self.status, render::pages::error_page(self.status, &self.message))
                .into_response(),
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpError: message: {}, status: {}",
            self.message, self.status
        )
    }
}

impl std::error::Error for HttpError {}

/// A path segment that does not parse (`/posts/abc/`) names no entity.
impl From<PathRejection> for HttpError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Path rejected: {}", rejection.body_text());
        HttpError::not_found(ErrorMessage::PageNotFound.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn not_found_renders_error_page() {
        let response = HttpError::not_found(ErrorMessage::PageNotFound.to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::LOCATION).is_none());
    }

    #[test]
    fn login_required_redirects_with_next() {
        let response = HttpError::login_required("/posts/create/").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=%2Fposts%2Fcreate%2F"
        );
    }

    #[test]
    fn login_next_is_percent_encoded() {
        let err = HttpError::login_required("/search/a&b%c/");
        assert_eq!(
            err.location.as_deref(),
            Some("/auth/login/?next=%2Fsearch%2Fa%26b%25c%2F")
        );
    }

    #[test]
    fn redirect_denial_points_to_location() {
        let response = HttpError::redirect("/posts/7/").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/posts/7/");
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = HttpError::from_lookup(sqlx::Error::RowNotFound, "getting post");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn other_db_errors_map_to_500() {
        let err = HttpError::from_lookup(sqlx::Error::PoolTimedOut, "getting post");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, ErrorMessage::ServerError.to_string());
    }

    #[test]
    fn password_messages_carry_limits() {
        assert_eq!(
            ErrorMessage::ExceededMaxPasswordLength(64).to_string(),
            "Password must not be more than 64 characters"
        );
        assert_eq!(
            ErrorMessage::PasswordTooShort(8).to_string(),
            "Password must be at least 8 characters"
        );
    }
}

use uuid::Uuid;

use crate::{
    dtos::PostView,
    error::{ErrorMessage, HttpError},
    models::{Comment, User},
    render::urls,
};

/// An entity that only its author may change
///
/// `deny` decides what a non-author gets instead of the mutation.
pub trait Authored {
    fn author_id(&self) -> Uuid;

    fn deny(&self) -> HttpError;
}

/// Non-authors of a post are quietly sent back to the post.
impl Authored for PostView {
    fn author_id(&self) -> Uuid {
        self.author_id
    }

    fn deny(&self) -> HttpError {
        HttpError::redirect(urls::post_detail(self.id))
    }
}

/// Non-authors of a comment get an explicit 403.
impl Authored for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }

    fn deny(&self) -> HttpError {
        HttpError::forbidden(ErrorMessage::PermissionDenied.to_string())
    }
}

/// Passes the entity through when `user` wrote it, otherwise returns the
/// entity's denial. Runs before any edit/delete logic.
pub fn ensure_author<T: Authored>(entity: T, user: &User) -> Result<T, HttpError> {
    if entity.author_id() == user.id {
        Ok(entity)
    } else {
        tracing::warn!(user = %user.username, "Non-author tried to modify an entity");
        Err(entity.deny())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use axum::http::StatusCode;
    use chrono::Utc;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "reader".to_string(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password: String::new(),
            role: UserRole::User,
            reset_token: None,
            token_expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn comment(author_id: Uuid) -> Comment {
        Comment {
            id: 5,
            text: "First!".to_string(),
            post_id: 9,
            author_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn author_passes() {
        let user = user();
        let comment = ensure_author(comment(user.id), &user).unwrap();
        assert_eq!(comment.id, 5);
    }

    #[test]
    fn stranger_gets_forbidden_on_comment() {
        let err = ensure_author(comment(Uuid::new_v4()), &user()).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.location, None);
    }

    #[test]
    fn stranger_is_redirected_to_post() {
        let post = PostView {
            id: 42,
            title: "Title".to_string(),
            text: "Text".to_string(),
            pub_date: Utc::now(),
            is_published: true,
            created_at: Utc::now(),
            image: None,
            author_id: Uuid::new_v4(),
            author_username: "author".to_string(),
            category_id: None,
            category_title: None,
            category_slug: None,
            category_is_published: None,
            location_id: None,
            location_name: None,
            location_is_published: None,
            comment_count: 0,
        };

        let err = ensure_author(post, &user()).unwrap_err();
        assert_eq!(err.status, StatusCode::SEE_OTHER);
        assert_eq!(err.location.as_deref(), Some("/posts/42/"));
    }
}

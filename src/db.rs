use sqlx::{Pool, Postgres};

pub mod scheduler;

mod user;
pub use user::UserExt;

mod post;
pub use post::{PostExt, PostInput, PostScope};

mod comment;
pub use comment::CommentExt;

mod taxonomy;
pub use taxonomy::{CategoryExt, LocationExt};

#[derive(Debug, Clone)]
pub struct DBClient {
    pool: Pool<Postgres>,
}
impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

/// True when `err` is a violated UNIQUE constraint (taken username or slug)
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_is_not_a_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}

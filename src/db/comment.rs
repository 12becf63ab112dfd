use super::DBClient;
use crate::dtos::CommentView;
use crate::models::Comment;
use uuid::Uuid;

/// Comment database operations trait
pub trait CommentExt {
    /// All comments of a post, oldest first
    async fn get_comments(&self, post_id: i64) -> Result<Vec<CommentView>, sqlx::Error>;

    /// Comment addressed through its post; RowNotFound when it belongs elsewhere
    async fn get_comment(&self, post_id: i64, comment_id: i64) -> Result<Comment, sqlx::Error>;

    async fn create_comment(
        &self,
        author_id: Uuid,
        post_id: i64,
        text: &str,
    ) -> Result<Comment, sqlx::Error>;

    async fn edit_comment(&self, comment_id: i64, text: &str) -> Result<Comment, sqlx::Error>;

    async fn delete_comment(&self, comment_id: i64) -> Result<(), sqlx::Error>;

    /// Count total comments by user
    async fn get_user_comment_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error>;
}

impl CommentExt for DBClient {
    async fn get_comments(&self, post_id: i64) -> Result<Vec<CommentView>, sqlx::Error> {
        let comments = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT cm.id, cm.text, cm.post_id, cm.author_id, u.username AS author_username, cm.created_at
            FROM comment cm
            INNER JOIN users u ON cm.author_id = u.id
            WHERE cm.post_id = $1
            ORDER BY cm.created_at ASC, cm.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn get_comment(&self, post_id: i64, comment_id: i64) -> Result<Comment, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, text, post_id, author_id, created_at FROM comment WHERE id = $1 AND post_id = $2",
        )
        .bind(comment_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn create_comment(
        &self,
        author_id: Uuid,
        post_id: i64,
        text: &str,
    ) -> Result<Comment, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comment (author_id, post_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, text, post_id, author_id, created_at
            "#,
        )
        .bind(author_id)
        .bind(post_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn edit_comment(&self, comment_id: i64, text: &str) -> Result<Comment, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comment SET text = $1
            WHERE id = $2
            RETURNING id, text, post_id, author_id, created_at
            "#,
        )
        .bind(text)
        .bind(comment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM comment WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn get_user_comment_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comment WHERE author_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

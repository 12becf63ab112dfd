use super::DBClient;
use crate::dtos::PostView;
use crate::models::Post;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// Base post query: post joined with author, category and location, annotated
/// with its comment count. Every listing and the detail page start here.
const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.text, p.pub_date, p.is_published, p.created_at, p.image,
           p.author_id, u.username AS author_username,
           p.category_id, c.title AS category_title, c.slug AS category_slug,
           c.is_published AS category_is_published,
           p.location_id, l.name AS location_name, l.is_published AS location_is_published,
           (SELECT COUNT(*) FROM comment cm WHERE cm.post_id = p.id) AS comment_count
    FROM post p
    INNER JOIN users u ON p.author_id = u.id
    LEFT JOIN category c ON p.category_id = c.id
    LEFT JOIN location l ON p.location_id = l.id
    WHERE TRUE"#;

const POST_COUNT: &str = r#"
    SELECT COUNT(*)
    FROM post p
    LEFT JOIN category c ON p.category_id = c.id
    WHERE TRUE"#;

/// Publication gate; SQL twin of `PostView::is_public`.
/// A NULL category makes the condition NULL, which filters the row out.
pub const PUBLISHED_FILTER: &str =
    " AND p.is_published AND c.is_published AND p.pub_date <= NOW()";

/// Which posts a feed shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostScope<'a> {
    /// Home page: every public post
    Home,
    /// Public posts of the category with this slug
    Category(&'a str),
    /// Posts of one author; the profile owner also sees hidden ones
    Author { author_id: Uuid, include_hidden: bool },
}

/// Validated post fields ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct PostInput {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    /// Newly uploaded image; None keeps the stored one
    pub image: Option<String>,
    pub clear_image: bool,
}

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: PostScope<'_>) {
    match scope {
        PostScope::Home => {
            qb.push(PUBLISHED_FILTER);
        }
        PostScope::Category(slug) => {
            qb.push(PUBLISHED_FILTER);
            qb.push(" AND c.slug = ");
            qb.push_bind(slug.to_string());
        }
        PostScope::Author {
            author_id,
            include_hidden,
        } => {
            qb.push(" AND p.author_id = ");
            qb.push_bind(author_id);
            if !include_hidden {
                qb.push(PUBLISHED_FILTER);
            }
        }
    }
}

pub trait PostExt {
    /// Single post with its joins, regardless of visibility
    async fn get_post(&self, post_id: i64) -> Result<PostView, sqlx::Error>;

    /// One page of a feed, newest `pub_date` first
    async fn get_posts(
        &self,
        scope: PostScope<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostView>, sqlx::Error>;

    async fn count_posts(&self, scope: PostScope<'_>) -> Result<i64, sqlx::Error>;

    async fn create_post(&self, author_id: Uuid, input: &PostInput) -> Result<Post, sqlx::Error>;

    async fn edit_post(&self, post_id: i64, input: &PostInput) -> Result<Post, sqlx::Error>;

    /// Deletes the post; its comments go with it (ON DELETE CASCADE)
    async fn delete_post(&self, post_id: i64) -> Result<(), sqlx::Error>;
}

impl PostExt for DBClient {
    async fn get_post(&self, post_id: i64) -> Result<PostView, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(POST_SELECT);
        qb.push(" AND p.id = ");
        qb.push_bind(post_id);

        let post = qb
            .build_query_as::<PostView>()
            .fetch_one(&self.pool)
            .await?;

        Ok(post)
    }

    async fn get_posts(
        &self,
        scope: PostScope<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostView>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(POST_SELECT);
        push_scope(&mut qb, scope);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let posts = qb
            .build_query_as::<PostView>()
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn count_posts(&self, scope: PostScope<'_>) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(POST_COUNT);
        push_scope(&mut qb, scope);

        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;

        Ok(count)
    }

    async fn create_post(&self, author_id: Uuid, input: &PostInput) -> Result<Post, sqlx::Error> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO post (title, text, pub_date, is_published, category_id, location_id, image, author_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&input.title)
        .bind(&input.text)
        .bind(input.pub_date)
        .bind(input.is_published)
        .bind(input.category_id)
        .bind(input.location_id)
        .bind(&input.image)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn edit_post(&self, post_id: i64, input: &PostInput) -> Result<Post, sqlx::Error> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE post
            SET title = $1, text = $2, pub_date = $3, is_published = $4,
                category_id = $5, location_id = $6,
                image = CASE WHEN $8 THEN NULL ELSE COALESCE($7, image) END
            WHERE id = $9
            RETURNING *
            "#,
        )
        .bind(&input.title)
        .bind(&input.text)
        .bind(input.pub_date)
        .bind(input.is_published)
        .bind(input.category_id)
        .bind(input.location_id)
        .bind(&input.image)
        .bind(input.clear_image)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn delete_post(&self, post_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM post WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}

//! Database behaviour against a real PostgreSQL.
//!
//! Ignored by default; run with `cargo test -- --ignored` and `DATABASE_URL`
//! pointing at a server where sqlx may create test databases.

use blogicum::{
    db::{CategoryExt, CommentExt, DBClient, LocationExt, PostExt, PostInput, PostScope, UserExt},
    models::{Category, User},
};
use chrono::{Duration, Utc};
use sqlx::PgPool;

async fn user(db: &DBClient, username: &str) -> User {
    db.save_user(username, &format!("{}@example.com", username), "hash")
        .await
        .unwrap()
}

async fn category(db: &DBClient, slug: &str, is_published: bool) -> Category {
    db.create_category("Travel", "Trips", slug, is_published)
        .await
        .unwrap()
}

fn input(title: &str, category_id: Option<i64>) -> PostInput {
    PostInput {
        title: title.to_string(),
        text: "Text".to_string(),
        pub_date: Utc::now() - Duration::hours(1),
        is_published: true,
        category_id,
        location_id: None,
        image: None,
        clear_image: false,
    }
}

async fn titles(db: &DBClient, scope: PostScope<'_>) -> Vec<String> {
    db.get_posts(scope, 10, 0)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.title)
        .collect()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn home_feed_shows_only_public_posts(pool: PgPool) {
    let db = DBClient::new(pool);
    let author = user(&db, "author").await;
    let open = category(&db, "open", true).await;
    let closed = category(&db, "closed", false).await;

    db.create_post(author.id, &input("public", Some(open.id)))
        .await
        .unwrap();
    db.create_post(author.id, &input("hidden category", Some(closed.id)))
        .await
        .unwrap();
    db.create_post(author.id, &input("no category", None))
        .await
        .unwrap();

    let mut draft = input("draft", Some(open.id));
    draft.is_published = false;
    db.create_post(author.id, &draft).await.unwrap();

    let mut scheduled = input("scheduled", Some(open.id));
    scheduled.pub_date = Utc::now() + Duration::days(1);
    db.create_post(author.id, &scheduled).await.unwrap();

    assert_eq!(titles(&db, PostScope::Home).await, ["public"]);
    assert_eq!(db.count_posts(PostScope::Home).await.unwrap(), 1);
    assert_eq!(titles(&db, PostScope::Category("open")).await, ["public"]);

    let visitor = PostScope::Author {
        author_id: author.id,
        include_hidden: false,
    };
    assert_eq!(db.count_posts(visitor).await.unwrap(), 1);

    let owner = PostScope::Author {
        author_id: author.id,
        include_hidden: true,
    };
    assert_eq!(db.count_posts(owner).await.unwrap(), 5);
    // newest pub_date first
    assert_eq!(titles(&db, owner).await[0], "scheduled");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn feed_pages_are_ten_posts(pool: PgPool) {
    let db = DBClient::new(pool);
    let author = user(&db, "author").await;
    let open = category(&db, "open", true).await;

    for i in 0..11 {
        let mut post = input(&format!("post {}", i), Some(open.id));
        post.pub_date = Utc::now() - Duration::hours(i + 1);
        db.create_post(author.id, &post).await.unwrap();
    }

    assert_eq!(db.count_posts(PostScope::Home).await.unwrap(), 11);
    assert_eq!(db.get_posts(PostScope::Home, 10, 0).await.unwrap().len(), 10);
    let last = db.get_posts(PostScope::Home, 10, 10).await.unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].title, "post 10");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn comments_are_oldest_first_and_counted(pool: PgPool) {
    let db = DBClient::new(pool);
    let author = user(&db, "author").await;
    let reader = user(&db, "reader").await;
    let post = db.create_post(author.id, &input("post", None)).await.unwrap();

    db.create_comment(reader.id, post.id, "first").await.unwrap();
    db.create_comment(author.id, post.id, "second").await.unwrap();
    db.create_comment(reader.id, post.id, "third").await.unwrap();

    let texts: Vec<String> = db
        .get_comments(post.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.text)
        .collect();
    assert_eq!(texts, ["first", "second", "third"]);

    assert_eq!(db.get_post(post.id).await.unwrap().comment_count, 3);
    assert_eq!(db.get_user_comment_count(reader.id).await.unwrap(), 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn comment_is_addressed_through_its_post(pool: PgPool) {
    let db = DBClient::new(pool);
    let author = user(&db, "author").await;
    let first = db.create_post(author.id, &input("one", None)).await.unwrap();
    let second = db.create_post(author.id, &input("two", None)).await.unwrap();
    let comment = db.create_comment(author.id, first.id, "hi").await.unwrap();

    assert!(db.get_comment(first.id, comment.id).await.is_ok());
    assert!(matches!(
        db.get_comment(second.id, comment.id).await,
        Err(sqlx::Error::RowNotFound)
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn deleting_a_post_removes_its_comments(pool: PgPool) {
    let db = DBClient::new(pool);
    let author = user(&db, "author").await;
    let post = db.create_post(author.id, &input("post", None)).await.unwrap();
    let comment = db.create_comment(author.id, post.id, "hi").await.unwrap();

    db.delete_post(post.id).await.unwrap();

    assert!(matches!(
        db.get_post(post.id).await,
        Err(sqlx::Error::RowNotFound)
    ));
    assert!(matches!(
        db.get_comment(post.id, comment.id).await,
        Err(sqlx::Error::RowNotFound)
    ));
    assert!(matches!(
        db.delete_post(post.id).await,
        Err(sqlx::Error::RowNotFound)
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn deleting_category_or_location_keeps_posts(pool: PgPool) {
    let db = DBClient::new(pool);
    let author = user(&db, "author").await;
    let open = category(&db, "open", true).await;
    let place = db.create_location("Kazan", true).await.unwrap();

    let mut post_input = input("post", Some(open.id));
    post_input.location_id = Some(place.id);
    let post = db.create_post(author.id, &post_input).await.unwrap();

    db.delete_category(open.id).await.unwrap();
    db.delete_location(place.id).await.unwrap();

    let post = db.get_post(post.id).await.unwrap();
    assert_eq!(post.category_id, None);
    assert_eq!(post.location_id, None);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn editing_without_new_image_keeps_the_old_one(pool: PgPool) {
    let db = DBClient::new(pool);
    let author = user(&db, "author").await;
    let mut post_input = input("post", None);
    post_input.image = Some("posts_images/a.png".to_string());
    let post = db.create_post(author.id, &post_input).await.unwrap();

    let mut edit = input("renamed", None);
    edit.image = None;
    let edited = db.edit_post(post.id, &edit).await.unwrap();
    assert_eq!(edited.title, "renamed");
    assert_eq!(edited.image.as_deref(), Some("posts_images/a.png"));

    edit.clear_image = true;
    let cleared = db.edit_post(post.id, &edit).await.unwrap();
    assert_eq!(cleared.image, None);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn unpublished_category_page_is_missing(pool: PgPool) {
    let db = DBClient::new(pool);
    category(&db, "closed", false).await;
    category(&db, "open", true).await;

    assert!(matches!(
        db.get_published_category("closed").await,
        Err(sqlx::Error::RowNotFound)
    ));
    assert!(db.get_published_category("open").await.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn taken_username_is_a_unique_violation(pool: PgPool) {
    let db = DBClient::new(pool);
    user(&db, "author").await;

    let err = db
        .save_user("author", "other@example.com", "hash")
        .await
        .unwrap_err();
    assert!(blogicum::db::is_unique_violation(&err));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn expired_reset_tokens_are_ignored_and_cleared(pool: PgPool) {
    let db = DBClient::new(pool);
    let fresh = user(&db, "fresh").await;
    let stale = user(&db, "stale").await;

    db.add_reset_token(fresh.id, "fresh-token", Utc::now() + Duration::hours(24))
        .await
        .unwrap();
    db.add_reset_token(stale.id, "stale-token", Utc::now() - Duration::hours(1))
        .await
        .unwrap();

    let found = db.get_user(None, None, None, Some("fresh-token")).await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(fresh.id));
    assert!(
        db.get_user(None, None, None, Some("stale-token"))
            .await
            .unwrap()
            .is_none()
    );

    assert_eq!(db.clear_expired_reset_tokens().await.unwrap(), 1);

    // a successful reset consumes the token
    db.update_user_password(fresh.id, "new-hash").await.unwrap();
    assert!(
        db.get_user(None, None, None, Some("fresh-token"))
            .await
            .unwrap()
            .is_none()
    );
}

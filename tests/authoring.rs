//! Author-only and form rules driven through the router against a real
//! PostgreSQL. Ignored by default like `tests/db.rs`.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use blogicum::{
    AppState,
    config::Config,
    db::{CategoryExt, CommentExt, DBClient, PostExt, PostInput, UserExt},
    dtos::PostView,
    models::User,
    routes::create_router,
    utils::token,
};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

fn app(db: DBClient) -> Router {
    let config = Config {
        database_url: String::new(),
        jwt_secret: SECRET.to_string(),
        jwt_maxage: 3600,
        port: 8000,
        site_url: "http://localhost:8000".to_string(),
        media_root: std::env::temp_dir().to_string_lossy().to_string(),
        smtp: None,
    };

    create_router(AppState {
        env: Arc::new(config),
        db_client: db,
    })
}

fn session_for(user: &User) -> String {
    let session = token::create_token(&user.id.to_string(), SECRET.as_bytes(), 3600).unwrap();
    format!("session={}", session)
}

async fn user(db: &DBClient, username: &str) -> User {
    db.save_user(username, &format!("{}@example.com", username), "hash")
        .await
        .unwrap()
}

/// A public post by `author`
async fn public_post(db: &DBClient, author: &User) -> PostView {
    let category = db
        .create_category("Travel", "Trips", "travel", true)
        .await
        .unwrap();
    let input = PostInput {
        title: "Original".to_string(),
        text: "Original text".to_string(),
        pub_date: Utc::now() - Duration::hours(1),
        is_published: true,
        category_id: Some(category.id),
        location_id: None,
        image: None,
        clear_image: false,
    };
    let post = db.create_post(author.id, &input).await.unwrap();
    db.get_post(post.id).await.unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn stranger_cannot_edit_a_post(pool: PgPool) {
    let db = DBClient::new(pool);
    let author = user(&db, "author").await;
    let stranger = user(&db, "stranger").await;
    let post = public_post(&db, &author).await;

    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nChanged\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\nChanged text\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri(format!("/posts/{}/edit/", post.id))
        .header(header::COOKIE, session_for(&stranger))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app(db.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        format!("/posts/{}/", post.id).as_str()
    );

    let stored = db.get_post(post.id).await.unwrap();
    assert_eq!(stored.title, "Original");
    assert_eq!(stored.text, "Original text");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn stranger_cannot_delete_a_post(pool: PgPool) {
    let db = DBClient::new(pool);
    let author = user(&db, "author").await;
    let stranger = user(&db, "stranger").await;
    let post = public_post(&db, &author).await;

    let request = Request::builder()
        .method("POST")
        .uri(format!("/posts/{}/delete/", post.id))
        .header(header::COOKIE, session_for(&stranger))
        .body(Body::empty())
        .unwrap();

    let response = app(db.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        format!("/posts/{}/", post.id).as_str()
    );
    assert!(db.get_post(post.id).await.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn author_deletes_own_post(pool: PgPool) {
    let db = DBClient::new(pool);
    let author = user(&db, "author").await;
    let post = public_post(&db, &author).await;

    let request = Request::builder()
        .method("POST")
        .uri(format!("/posts/{}/delete/", post.id))
        .header(header::COOKIE, session_for(&author))
        .body(Body::empty())
        .unwrap();

    let response = app(db.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    assert!(matches!(
        db.get_post(post.id).await,
        Err(sqlx::Error::RowNotFound)
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn empty_comment_is_not_saved(pool: PgPool) {
    let db = DBClient::new(pool);
    let author = user(&db, "author").await;
    let reader = user(&db, "reader").await;
    let post = public_post(&db, &author).await;

    let request = Request::builder()
        .method("POST")
        .uri(format!("/posts/{}/comment/", post.id))
        .header(header::COOKIE, session_for(&reader))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("text="))
        .unwrap();

    let response = app(db.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains(r#"class="errorlist""#));

    assert!(db.get_comments(post.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn comment_with_text_is_saved(pool: PgPool) {
    let db = DBClient::new(pool);
    let author = user(&db, "author").await;
    let reader = user(&db, "reader").await;
    let post = public_post(&db, &author).await;

    let request = Request::builder()
        .method("POST")
        .uri(format!("/posts/{}/comment/", post.id))
        .header(header::COOKIE, session_for(&reader))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("text=Nice+trip"))
        .unwrap();

    let response = app(db.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let comments = db.get_comments(post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Nice trip");
    assert_eq!(comments[0].author_username, "reader");
}

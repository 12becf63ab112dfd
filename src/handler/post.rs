use axum::{
    Extension, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::MultipartError},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::Utc;
use axum_extra::extract::WithRejection;
use tracing::instrument;

use crate::{
    AppState,
    access::ensure_author,
    db::{CategoryExt, CommentExt, LocationExt, PostExt, PostInput, PostScope},
    dtos::{PageQuery, PostView},
    error::{ErrorMessage, HttpError},
    forms::{CommentForm, FormErrors, PostForm},
    media::{self, Upload},
    middleware::{AuthUser, CurrentUser, login_required},
    models::{Category, Location, User},
    pagination::{Page, Paginator},
    render::{
        self,
        blog::{PostFormPage, post_form_page},
        urls,
    },
};

/// Upper bound for a post form body, image included
const POST_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Router for feeds and post pages
///
/// Reading is public; creating, editing and deleting require a login.
pub fn post_handler() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/category/{category_slug}/", get(category_posts))
        .route("/posts/{post_id}/", get(post_detail))
        .route(
            "/posts/create/",
            get(create_post_page)
                .post(create_post)
                .layer(DefaultBodyLimit::max(POST_BODY_LIMIT))
                .route_layer(middleware::from_fn(login_required)),
        )
        .route(
            "/posts/{post_id}/edit/",
            get(edit_post_page)
                .post(edit_post)
                .layer(DefaultBodyLimit::max(POST_BODY_LIMIT))
                .route_layer(middleware::from_fn(login_required)),
        )
        .route(
            "/posts/{post_id}/delete/",
            get(delete_post_page)
                .post(delete_post)
                .route_layer(middleware::from_fn(login_required)),
        )
}

/// Loads one page of a feed: counts the scope, resolves `?page=`, fetches
/// the window.
pub(crate) async fn load_feed(
    app_state: &AppState,
    scope: PostScope<'_>,
    page: Option<&str>,
) -> Result<Page<PostView>, HttpError> {
    let total = app_state
        .db_client
        .count_posts(scope)
        .await
        .map_err(|e| HttpError::db(e, "counting posts"))?;

    let window = Paginator::new(total).window(page)?;

    let posts = app_state
        .db_client
        .get_posts(scope, window.limit, window.offset)
        .await
        .map_err(|e| HttpError::db(e, "getting posts"))?;

    Ok(Page::new(posts, window))
}

/// Home page: all public posts, newest first
#[instrument(skip(app_state, current))]
pub async fn index(
    Query(query): Query<PageQuery>,
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, HttpError> {
    let page = load_feed(&app_state, PostScope::Home, query.page.as_deref()).await?;

    Ok(render::blog::index_page(current.user(), &page))
}

/// Public posts of a published category; unknown or hidden categories are 404
#[instrument(skip(app_state, current))]
pub async fn category_posts(
    WithRejection(Path(category_slug), _): WithRejection<Path<String>, HttpError>,
    Query(query): Query<PageQuery>,
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, HttpError> {
    let category = app_state
        .db_client
        .get_published_category(&category_slug)
        .await
        .map_err(|e| HttpError::from_lookup(e, "getting category"))?;

    let page = load_feed(
        &app_state,
        PostScope::Category(&category.slug),
        query.page.as_deref(),
    )
    .await?;

    Ok(render::blog::category_page(current.user(), &category, &page))
}

/// Fetches a post the viewer is allowed to see; anything else is 404.
pub(crate) async fn visible_post(
    app_state: &AppState,
    post_id: i64,
    viewer: Option<&User>,
) -> Result<PostView, HttpError> {
    let post = app_state
        .db_client
        .get_post(post_id)
        .await
        .map_err(|e| HttpError::from_lookup(e, "getting post"))?;

    if !post.is_visible_to(viewer.map(|u| u.id), Utc::now()) {
        return Err(HttpError::not_found(ErrorMessage::PageNotFound.to_string()));
    }

    Ok(post)
}

/// Post with its comments, oldest comment first
#[instrument(skip(app_state, current))]
pub async fn post_detail(
    WithRejection(Path(post_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, HttpError> {
    let post = visible_post(&app_state, post_id, current.user()).await?;

    let comments = app_state
        .db_client
        .get_comments(post.id)
        .await
        .map_err(|e| HttpError::db(e, "getting comments"))?;

    Ok(render::blog::post_detail_page(
        current.user(),
        &post,
        &comments,
        &CommentForm::default(),
        &FormErrors::new(),
    ))
}

fn bad_multipart(e: MultipartError) -> HttpError {
    tracing::warn!("Malformed post form: {}", e);
    HttpError::new(e.body_text(), e.status())
}

/// Reads the multipart post form. An empty file input means "no new image".
async fn read_post_form(mut multipart: Multipart) -> Result<(PostForm, Option<Upload>), HttpError> {
    let mut form = PostForm::default();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "image" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(bad_multipart)?;
            if !filename.is_empty() && !bytes.is_empty() {
                upload = Some(Upload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field.text().await.map_err(bad_multipart)?;
        match name.as_str() {
            "title" => form.title = value,
            "text" => form.text = value,
            "pub_date" => form.pub_date = value,
            "category" => form.category = value,
            "location" => form.location = value,
            // checkboxes are only sent when ticked
            "is_published" => form.is_published = true,
            "clear_image" => form.clear_image = true,
            _ => {}
        }
    }

    Ok((form, upload))
}

/// Form validation plus the image type check.
fn validate_post(
    form: &PostForm,
    upload: Option<&Upload>,
    categories: &[Category],
    locations: &[Location],
) -> Result<PostInput, FormErrors> {
    let image_ok = upload.is_none_or(|u| media::image_extension(&u.filename).is_some());

    match form.to_input(categories, locations, None) {
        Ok(input) if image_ok => Ok(input),
        result => {
            let mut errors = result.err().unwrap_or_default();
            if !image_ok {
                errors.add(
                    "image",
                    "Upload a valid image: jpg, jpeg, png, gif or webp.",
                );
            }
            Err(errors)
        }
    }
}

async fn choices(app_state: &AppState) -> Result<(Vec<Category>, Vec<Location>), HttpError> {
    let categories = app_state
        .db_client
        .get_categories()
        .await
        .map_err(|e| HttpError::db(e, "getting categories"))?;

    let locations = app_state
        .db_client
        .get_locations()
        .await
        .map_err(|e| HttpError::db(e, "getting locations"))?;

    Ok((categories, locations))
}

async fn store_image(app_state: &AppState, upload: &Upload) -> Result<String, HttpError> {
    media::save_image(&app_state.env.media_root, upload)
        .await
        .map_err(|e| {
            tracing::error!("Saving uploaded image failed: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })
}

#[instrument(skip(app_state, auth), fields(username = %auth.user.username))]
pub async fn create_post_page(
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let (categories, locations) = choices(&app_state).await?;

    Ok(post_form_page(
        Some(&auth.user),
        PostFormPage {
            heading: "New post",
            action: urls::POST_CREATE,
            form: &PostForm::blank(),
            errors: &FormErrors::new(),
            categories: &categories,
            locations: &locations,
            current_image: None,
        },
    ))
}

/// Creates a post authored by the requester and opens their profile
#[instrument(skip(app_state, auth, multipart), fields(username = %auth.user.username))]
pub async fn create_post(
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<Response, HttpError> {
    let (form, upload) = read_post_form(multipart).await?;
    let (categories, locations) = choices(&app_state).await?;

    let mut input = match validate_post(&form, upload.as_ref(), &categories, &locations) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(post_form_page(
                Some(&auth.user),
                PostFormPage {
                    heading: "New post",
                    action: urls::POST_CREATE,
                    form: &form,
                    errors: &errors,
                    categories: &categories,
                    locations: &locations,
                    current_image: None,
                },
            )
            .into_response());
        }
    };

    if let Some(upload) = &upload {
        input.image = Some(store_image(&app_state, upload).await?);
    }

    let post = app_state
        .db_client
        .create_post(auth.user.id, &input)
        .await
        .map_err(|e| HttpError::db(e, "creating post"))?;

    tracing::info!(post_id = post.id, "Post created");
    Ok(Redirect::to(&urls::profile(&auth.user.username)).into_response())
}

async fn authored_post(
    app_state: &AppState,
    post_id: i64,
    user: &User,
) -> Result<PostView, HttpError> {
    let post = app_state
        .db_client
        .get_post(post_id)
        .await
        .map_err(|e| HttpError::from_lookup(e, "getting post"))?;

    ensure_author(post, user)
}

#[instrument(skip(app_state, auth), fields(username = %auth.user.username))]
pub async fn edit_post_page(
    WithRejection(Path(post_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let post = authored_post(&app_state, post_id, &auth.user).await?;
    let (categories, locations) = choices(&app_state).await?;
    let action = urls::post_edit(post.id);

    Ok(post_form_page(
        Some(&auth.user),
        PostFormPage {
            heading: "Edit post",
            action: &action,
            form: &PostForm::from_post(&post),
            errors: &FormErrors::new(),
            categories: &categories,
            locations: &locations,
            current_image: post.image.as_deref(),
        },
    ))
}

/// Saves the author's changes; a missing file keeps the current image
#[instrument(skip(app_state, auth, multipart), fields(username = %auth.user.username))]
pub async fn edit_post(
    WithRejection(Path(post_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<Response, HttpError> {
    let post = authored_post(&app_state, post_id, &auth.user).await?;
    let (form, upload) = read_post_form(multipart).await?;
    let (categories, locations) = choices(&app_state).await?;

    let mut input = match validate_post(&form, upload.as_ref(), &categories, &locations) {
        Ok(input) => input,
        Err(errors) => {
            let action = urls::post_edit(post.id);
            return Ok(post_form_page(
                Some(&auth.user),
                PostFormPage {
                    heading: "Edit post",
                    action: &action,
                    form: &form,
                    errors: &errors,
                    categories: &categories,
                    locations: &locations,
                    current_image: post.image.as_deref(),
                },
            )
            .into_response());
        }
    };

    if let Some(upload) = &upload {
        input.image = Some(store_image(&app_state, upload).await?);
        input.clear_image = false;
    }

    app_state
        .db_client
        .edit_post(post.id, &input)
        .await
        .map_err(|e| HttpError::from_lookup(e, "editing post"))?;

    tracing::info!(post_id = post.id, "Post edited");
    Ok(Redirect::to(&urls::post_detail(post.id)).into_response())
}

#[instrument(skip(app_state, auth), fields(username = %auth.user.username))]
pub async fn delete_post_page(
    WithRejection(Path(post_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let post = authored_post(&app_state, post_id, &auth.user).await?;

    Ok(render::blog::post_delete_page(Some(&auth.user), &post))
}

/// Deletes the post with all of its comments and returns to the home page
#[instrument(skip(app_state, auth), fields(username = %auth.user.username))]
pub async fn delete_post(
    WithRejection(Path(post_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let post = authored_post(&app_state, post_id, &auth.user).await?;

    app_state
        .db_client
        .delete_post(post.id)
        .await
        .map_err(|e| HttpError::from_lookup(e, "deleting post"))?;

    tracing::info!(post_id = post.id, "Post deleted");
    Ok(Redirect::to(urls::INDEX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: i64) -> Location {
        Location {
            id,
            name: "Kazan".to_string(),
            is_published: true,
            created_at: Utc::now(),
        }
    }

    fn form() -> PostForm {
        PostForm {
            title: "Title".to_string(),
            text: "Text".to_string(),
            pub_date: "2025-01-01T12:00".to_string(),
            location: "2".to_string(),
            is_published: true,
            ..Default::default()
        }
    }

    #[test]
    fn rejects_non_image_upload() {
        let upload = Upload {
            filename: "notes.txt".to_string(),
            bytes: vec![1],
        };
        let errors = validate_post(&form(), Some(&upload), &[], &[location(2)]).unwrap_err();
        assert_eq!(errors.field("image").len(), 1);
    }

    #[test]
    fn image_error_joins_field_errors() {
        let upload = Upload {
            filename: "notes.txt".to_string(),
            bytes: vec![1],
        };
        let mut form = form();
        form.title.clear();
        let errors = validate_post(&form, Some(&upload), &[], &[location(2)]).unwrap_err();
        assert!(!errors.field("title").is_empty());
        assert!(!errors.field("image").is_empty());
    }

    #[test]
    fn accepts_form_without_upload() {
        let input = validate_post(&form(), None, &[], &[location(2)]).unwrap();
        assert_eq!(input.location_id, Some(2));
        assert_eq!(input.category_id, None);
        assert_eq!(input.image, None);
    }
}

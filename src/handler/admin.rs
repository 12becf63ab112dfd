use axum::{
    Extension, Form, Router,
    extract::{Path, State},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use tracing::instrument;

use crate::{
    AppState,
    db::{CategoryExt, LocationExt, is_unique_violation},
    error::HttpError,
    forms::{CategoryForm, FormErrors, LocationForm, check},
    middleware::{AuthUser, login_required, role_check},
    models::UserRole,
    render::{self, urls},
};

/// Router for the administration pages under `/admin/`
///
/// Anonymous visitors are sent to the login page, non-admins get 403.
pub fn admin_handler() -> Router<AppState> {
    Router::new()
        .route("/admin/", get(index))
        .route("/admin/categories/", get(category_list))
        .route(
            "/admin/categories/create/",
            get(create_category_page).post(create_category),
        )
        .route(
            "/admin/categories/{category_id}/edit/",
            get(edit_category_page).post(edit_category),
        )
        .route("/admin/categories/{category_id}/delete/", post(delete_category))
        .route("/admin/locations/", get(location_list))
        .route(
            "/admin/locations/create/",
            get(create_location_page).post(create_location),
        )
        .route(
            "/admin/locations/{location_id}/edit/",
            get(edit_location_page).post(edit_location),
        )
        .route("/admin/locations/{location_id}/delete/", post(delete_location))
        .route_layer(middleware::from_fn(|req, next| {
            role_check(req, next, vec![UserRole::Admin])
        }))
        .route_layer(middleware::from_fn(login_required))
}

#[instrument(skip(auth), fields(username = %auth.user.username))]
pub async fn index(Extension(auth): Extension<AuthUser>) -> impl IntoResponse {
    render::admin::index_page(&auth.user)
}

// ============================================================================
// Categories
// ============================================================================

#[instrument(skip(app_state, auth), fields(username = %auth.user.username))]
pub async fn category_list(
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let categories = app_state
        .db_client
        .get_categories()
        .await
        .map_err(|e| HttpError::db(e, "getting categories"))?;

    Ok(render::admin::category_list_page(&auth.user, &categories))
}

fn slug_taken() -> FormErrors {
    let mut errors = FormErrors::new();
    errors.add("slug", "Category with this slug already exists.");
    errors
}

#[instrument(skip(auth), fields(username = %auth.user.username))]
pub async fn create_category_page(Extension(auth): Extension<AuthUser>) -> impl IntoResponse {
    render::admin::category_form_page(
        &auth.user,
        urls::ADMIN_CATEGORY_CREATE,
        &CategoryForm::blank(),
        &FormErrors::new(),
    )
}

#[instrument(skip(app_state, auth, body), fields(username = %auth.user.username))]
pub async fn create_category(
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Form(body): Form<CategoryForm>,
) -> Result<Response, HttpError> {
    let action = urls::ADMIN_CATEGORY_CREATE;
    if let Err(errors) = check(&body) {
        return Ok(render::admin::category_form_page(&auth.user, action, &body, &errors).into_response());
    }

    let result = app_state
        .db_client
        .create_category(
            body.title.trim(),
            body.description.trim(),
            body.slug.trim(),
            body.published(),
        )
        .await;

    match result {
        Ok(category) => {
            tracing::info!(category_id = category.id, slug = %category.slug, "Category created");
            Ok(Redirect::to(urls::ADMIN_CATEGORIES).into_response())
        }
        Err(e) if is_unique_violation(&e) => Ok(render::admin::category_form_page(
            &auth.user,
            action,
            &body,
            &slug_taken(),
        )
        .into_response()),
        Err(e) => Err(HttpError::db(e, "creating category")),
    }
}

#[instrument(skip(app_state, auth), fields(username = %auth.user.username))]
pub async fn edit_category_page(
    WithRejection(Path(category_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let category = app_state
        .db_client
        .get_category(category_id)
        .await
        .map_err(|e| HttpError::from_lookup(e, "getting category"))?;

    Ok(render::admin::category_form_page(
        &auth.user,
        &urls::admin_category_edit(category.id),
        &CategoryForm::from_category(&category),
        &FormErrors::new(),
    ))
}

#[instrument(skip(app_state, auth, body), fields(username = %auth.user.username))]
pub async fn edit_category(
    WithRejection(Path(category_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Form(body): Form<CategoryForm>,
) -> Result<Response, HttpError> {
    let action = urls::admin_category_edit(category_id);
    if let Err(errors) = check(&body) {
        return Ok(render::admin::category_form_page(&auth.user, &action, &body, &errors).into_response());
    }

    let result = app_state
        .db_client
        .edit_category(
            category_id,
            body.title.trim(),
            body.description.trim(),
            body.slug.trim(),
            body.published(),
        )
        .await;

    match result {
        Ok(category) => {
            tracing::info!(category_id = category.id, "Category edited");
            Ok(Redirect::to(urls::ADMIN_CATEGORIES).into_response())
        }
        Err(e) if is_unique_violation(&e) => Ok(render::admin::category_form_page(
            &auth.user,
            &action,
            &body,
            &slug_taken(),
        )
        .into_response()),
        Err(e) => Err(HttpError::from_lookup(e, "editing category")),
    }
}

/// Deletes the category; its posts lose their category
#[instrument(skip(app_state, auth), fields(username = %auth.user.username))]
pub async fn delete_category(
    WithRejection(Path(category_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_category(category_id)
        .await
        .map_err(|e| HttpError::from_lookup(e, "deleting category"))?;

    tracing::info!(category_id, "Category deleted");
    Ok(Redirect::to(urls::ADMIN_CATEGORIES))
}

// ============================================================================
// Locations
// ============================================================================

#[instrument(skip(app_state, auth), fields(username = %auth.user.username))]
pub async fn location_list(
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let locations = app_state
        .db_client
        .get_locations()
        .await
        .map_err(|e| HttpError::db(e, "getting locations"))?;

    Ok(render::admin::location_list_page(&auth.user, &locations))
}

#[instrument(skip(auth), fields(username = %auth.user.username))]
pub async fn create_location_page(Extension(auth): Extension<AuthUser>) -> impl IntoResponse {
    render::admin::location_form_page(
        &auth.user,
        urls::ADMIN_LOCATION_CREATE,
        &LocationForm::blank(),
        &FormErrors::new(),
    )
}

#[instrument(skip(app_state, auth, body), fields(username = %auth.user.username))]
pub async fn create_location(
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Form(body): Form<LocationForm>,
) -> Result<Response, HttpError> {
    if let Err(errors) = check(&body) {
        return Ok(render::admin::location_form_page(
            &auth.user,
            urls::ADMIN_LOCATION_CREATE,
            &body,
            &errors,
        )
        .into_response());
    }

    let location = app_state
        .db_client
        .create_location(body.name.trim(), body.published())
        .await
        .map_err(|e| HttpError::db(e, "creating location"))?;

    tracing::info!(location_id = location.id, "Location created");
    Ok(Redirect::to(urls::ADMIN_LOCATIONS).into_response())
}

#[instrument(skip(app_state, auth), fields(username = %auth.user.username))]
pub async fn edit_location_page(
    WithRejection(Path(location_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let location = app_state
        .db_client
        .get_location(location_id)
        .await
        .map_err(|e| HttpError::from_lookup(e, "getting location"))?;

    Ok(render::admin::location_form_page(
        &auth.user,
        &urls::admin_location_edit(location.id),
        &LocationForm::from_location(&location),
        &FormErrors::new(),
    ))
}

#[instrument(skip(app_state, auth, body), fields(username = %auth.user.username))]
pub async fn edit_location(
    WithRejection(Path(location_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Form(body): Form<LocationForm>,
) -> Result<Response, HttpError> {
    if let Err(errors) = check(&body) {
        return Ok(render::admin::location_form_page(
            &auth.user,
            &urls::admin_location_edit(location_id),
            &body,
            &errors,
        )
        .into_response());
    }

    app_state
        .db_client
        .edit_location(location_id, body.name.trim(), body.published())
        .await
        .map_err(|e| HttpError::from_lookup(e, "editing location"))?;

    tracing::info!(location_id, "Location edited");
    Ok(Redirect::to(urls::ADMIN_LOCATIONS).into_response())
}

/// Deletes the location; its posts lose their location
#[instrument(skip(app_state, auth), fields(username = %auth.user.username))]
pub async fn delete_location(
    WithRejection(Path(location_id), _): WithRejection<Path<i64>, HttpError>,
    State(app_state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_location(location_id)
        .await
        .map_err(|e| HttpError::from_lookup(e, "deleting location"))?;

    tracing::info!(location_id, "Location deleted");
    Ok(Redirect::to(urls::ADMIN_LOCATIONS))
}

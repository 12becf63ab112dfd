use axum::response::Html;

use super::{checkbox, esc, input, layout, non_field_errors, textarea, urls};
use crate::{
    forms::{CategoryForm, FormErrors, LocationForm},
    models::{Category, Location, User},
};

fn published_mark(is_published: bool) -> &'static str {
    if is_published { "yes" } else { "no" }
}

fn delete_button(action: &str) -> String {
    format!(
        r#"<form method="post" action="{}" class="inline"><button type="submit">Delete</button></form>"#,
        action
    )
}

pub fn index_page(viewer: &User) -> Html<String> {
    let body = format!(
        r#"<h1>Site administration</h1>
<ul>
<li><a href="{}">Categories</a></li>
<li><a href="{}">Locations</a></li>
</ul>"#,
        urls::ADMIN_CATEGORIES,
        urls::ADMIN_LOCATIONS
    );
    layout::page("Administration", Some(viewer), &body)
}

pub fn category_list_page(viewer: &User, categories: &[Category]) -> Html<String> {
    let rows: String = categories
        .iter()
        .map(|c| {
            format!(
                r#"<tr><td><a href="{edit}">{title}</a></td><td>{slug}</td><td>{published}</td><td>{delete}</td></tr>"#,
                edit = urls::admin_category_edit(c.id),
                title = esc(&c.title),
                slug = esc(&c.slug),
                published = published_mark(c.is_published),
                delete = delete_button(&urls::admin_category_delete(c.id)),
            )
        })
        .collect();
    let body = format!(
        r#"<h1>Categories</h1>
<p><a href="{new}">Add category</a></p>
<table>
<tr><th>Title</th><th>Slug</th><th>Published</th><th></th></tr>
{rows}
</table>"#,
        new = urls::ADMIN_CATEGORY_CREATE,
        rows = rows,
    );
    layout::page("Categories", Some(viewer), &body)
}

pub fn category_form_page(
    viewer: &User,
    action: &str,
    form: &CategoryForm,
    errors: &FormErrors,
) -> Html<String> {
    let body = format!(
        r#"<h1>Category</h1>
<form method="post" action="{action}">
{non_field}
{title}
{description}
{slug}
<p class="help">Page address identifier; Latin letters, digits, hyphen and underscore are allowed.</p>
{published}
<p class="help">Untick to hide the category and all of its posts.</p>
<button type="submit">Save</button>
</form>"#,
        action = action,
        non_field = non_field_errors(errors),
        title = input("text", "title", "Title", &form.title, errors),
        description = textarea("description", "Description", &form.description, errors),
        slug = input("text", "slug", "Slug", &form.slug, errors),
        published = checkbox("is_published", "Published", form.published(), errors),
    );
    layout::page("Category", Some(viewer), &body)
}

pub fn location_list_page(viewer: &User, locations: &[Location]) -> Html<String> {
    let rows: String = locations
        .iter()
        .map(|l| {
            format!(
                r#"<tr><td><a href="{edit}">{name}</a></td><td>{published}</td><td>{delete}</td></tr>"#,
                edit = urls::admin_location_edit(l.id),
                name = esc(&l.name),
                published = published_mark(l.is_published),
                delete = delete_button(&urls::admin_location_delete(l.id)),
            )
        })
        .collect();
    let body = format!(
        r#"<h1>Locations</h1>
<p><a href="{new}">Add location</a></p>
<table>
<tr><th>Name</th><th>Published</th><th></th></tr>
{rows}
</table>"#,
        new = urls::ADMIN_LOCATION_CREATE,
        rows = rows,
    );
    layout::page("Locations", Some(viewer), &body)
}

pub fn location_form_page(
    viewer: &User,
    action: &str,
    form: &LocationForm,
    errors: &FormErrors,
) -> Html<String> {
    let body = format!(
        r#"<h1>Location</h1>
<form method="post" action="{action}">
{non_field}
{name}
{published}
<button type="submit">Save</button>
</form>"#,
        action = action,
        non_field = non_field_errors(errors),
        name = input("text", "name", "Name", &form.name, errors),
        published = checkbox("is_published", "Published", form.published(), errors),
    );
    layout::page("Location", Some(viewer), &body)
}

use axum::response::Html;
use chrono::{DateTime, Utc};

use super::{
    checkbox, esc, input, layout, linebreaks, non_field_errors, select, textarea, truncate_words,
    urls,
};
use crate::{
    dtos::{CommentView, PostView},
    forms::{CommentForm, FormErrors, PostForm, UserForm},
    models::{Category, Comment, Location, User},
    pagination::{Page, PageWindow},
};

const EXCERPT_WORDS: usize = 30;

fn date(value: DateTime<Utc>) -> String {
    value.format("%d.%m.%Y %H:%M").to_string()
}

fn post_meta(post: &PostView) -> String {
    let mut meta = format!(
        r#"<span class="date">{}</span> by <a href="{}">@{}</a>"#,
        date(post.pub_date),
        esc(&urls::profile(&post.author_username)),
        esc(&post.author_username)
    );
    if let Some(location) = post.visible_location() {
        meta.push_str(&format!(r#" · <span class="location">{}</span>"#, esc(location)));
    }
    if let (Some(true), Some(slug), Some(title)) = (
        post.category_is_published,
        post.category_slug.as_deref(),
        post.category_title.as_deref(),
    ) {
        meta.push_str(&format!(
            r#" · in <a href="{}">{}</a>"#,
            esc(&urls::category(slug)),
            esc(title)
        ));
    }
    meta
}

/// Badge shown to an author on their own posts that the public cannot see.
fn visibility_badge(post: &PostView) -> &'static str {
    let now = Utc::now();
    if !post.is_published {
        r#" <span class="badge">hidden</span>"#
    } else if post.pub_date > now {
        r#" <span class="badge">scheduled</span>"#
    } else if !post.is_public(now) {
        r#" <span class="badge">category hidden</span>"#
    } else {
        ""
    }
}

fn post_card(post: &PostView) -> String {
    format!(
        r#"<article class="post">
<h2><a href="{url}">{title}</a>{badge}</h2>
<p class="meta">{meta}</p>
<p>{excerpt}</p>
<p><a href="{url}">Comments ({comments})</a></p>
</article>"#,
        url = urls::post_detail(post.id),
        title = esc(&post.title),
        badge = visibility_badge(post),
        meta = post_meta(post),
        excerpt = esc(&truncate_words(&post.text, EXCERPT_WORDS)),
        comments = post.comment_count,
    )
}

fn pagination_nav(window: &PageWindow, base_url: &str) -> String {
    if window.num_pages <= 1 {
        return String::new();
    }
    let mut links = Vec::new();
    if let Some(previous) = window.previous() {
        links.push(format!(r#"<a href="{}?page=1">&laquo; first</a>"#, base_url));
        links.push(format!(r#"<a href="{}?page={}">previous</a>"#, base_url, previous));
    }
    links.push(format!(
        r#"<span class="current">Page {} of {}</span>"#,
        window.number, window.num_pages
    ));
    if let Some(next) = window.next() {
        links.push(format!(r#"<a href="{}?page={}">next</a>"#, base_url, next));
        links.push(format!(r#"<a href="{}?page=last">last &raquo;</a>"#, base_url));
    }
    format!(r#"<div class="pagination">{}</div>"#, links.join("\n"))
}

fn post_list(page: &Page<PostView>, base_url: &str) -> String {
    if page.items.is_empty() {
        return "<p>No posts yet.</p>".to_string();
    }
    let cards: Vec<String> = page.items.iter().map(post_card).collect();
    format!(
        "{}\n{}",
        cards.join("\n"),
        pagination_nav(&page.window, base_url)
    )
}

pub fn index_page(viewer: Option<&User>, page: &Page<PostView>) -> Html<String> {
    let body = format!("<h1>Latest posts</h1>\n{}", post_list(page, urls::INDEX));
    layout::page("Home", viewer, &body)
}

pub fn category_page(
    viewer: Option<&User>,
    category: &Category,
    page: &Page<PostView>,
) -> Html<String> {
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n{}",
        esc(&category.title),
        linebreaks(&category.description),
        post_list(page, &urls::category(&category.slug))
    );
    layout::page(&category.title, viewer, &body)
}

pub fn profile_page(
    viewer: Option<&User>,
    profile: &User,
    comment_count: i64,
    page: &Page<PostView>,
) -> Html<String> {
    let is_owner = viewer.is_some_and(|v| v.id == profile.id);
    let owner_links = if is_owner {
        format!(
            r#"<p><a href="{}">Edit profile</a> · <a href="{}">Change password</a></p>"#,
            urls::PROFILE_EDIT,
            urls::PASSWORD_CHANGE
        )
    } else {
        String::new()
    };
    let body = format!(
        r#"<h1>{name}</h1>
<p class="meta">@{username} · registered {joined} · {posts} posts · {comments} comments</p>
{owner_links}
{posts_html}"#,
        name = esc(&profile.display_name()),
        username = esc(&profile.username),
        joined = date(profile.created_at),
        posts = page.window.total,
        comments = comment_count,
        owner_links = owner_links,
        posts_html = post_list(page, &urls::profile(&profile.username)),
    );
    layout::page(&profile.username, viewer, &body)
}

fn comment_item(viewer: Option<&User>, comment: &CommentView) -> String {
    let actions = if viewer.is_some_and(|v| v.id == comment.author_id) {
        format!(
            r#"<p class="actions"><a href="{}">Edit</a> · <a href="{}">Delete</a></p>"#,
            urls::edit_comment(comment.post_id, comment.id),
            urls::delete_comment(comment.post_id, comment.id)
        )
    } else {
        String::new()
    };
    format!(
        r#"<li id="comment-{id}"><p class="meta"><a href="{author_url}">@{author}</a> · {date}</p>
<p>{text}</p>{actions}</li>"#,
        id = comment.id,
        author_url = esc(&urls::profile(&comment.author_username)),
        author = esc(&comment.author_username),
        date = date(comment.created_at),
        text = linebreaks(&comment.text),
        actions = actions,
    )
}

fn comment_form(action: &str, form: &CommentForm, errors: &FormErrors, submit: &str) -> String {
    format!(
        r#"<form method="post" action="{}">
{}{}
<button type="submit">{}</button>
</form>"#,
        action,
        non_field_errors(errors),
        textarea("text", "Comment", &form.text, errors),
        esc(submit)
    )
}

pub fn post_detail_page(
    viewer: Option<&User>,
    post: &PostView,
    comments: &[CommentView],
    form: &CommentForm,
    errors: &FormErrors,
) -> Html<String> {
    let image = post
        .image
        .as_deref()
        .map(|path| {
            format!(
                r#"<img src="{}" alt="{}">"#,
                esc(&urls::media(path)),
                esc(&post.title)
            )
        })
        .unwrap_or_default();

    let author_links = if viewer.is_some_and(|v| v.id == post.author_id) {
        format!(
            r#"<p class="actions"><a href="{}">Edit post</a> · <a href="{}">Delete post</a></p>"#,
            urls::post_edit(post.id),
            urls::post_delete(post.id)
        )
    } else {
        String::new()
    };

    let comment_items: String = comments.iter().map(|c| comment_item(viewer, c)).collect();

    let form_html = match viewer {
        Some(_) => comment_form(&urls::add_comment(post.id), form, errors, "Send"),
        None => format!(
            r#"<p><a href="{}?next={}">Log in</a> to leave a comment.</p>"#,
            urls::LOGIN,
            urls::post_detail(post.id)
        ),
    };

    let body = format!(
        r#"<article class="post">
<h1>{title}{badge}</h1>
<p class="meta">{meta}</p>
{image}
<div class="text">{text}</div>
{author_links}
</article>
<section class="comments">
<h2>Comments ({count})</h2>
<ul>{comment_items}</ul>
{form_html}
</section>"#,
        title = esc(&post.title),
        badge = visibility_badge(post),
        meta = post_meta(post),
        image = image,
        text = linebreaks(&post.text),
        author_links = author_links,
        count = comments.len(),
        comment_items = comment_items,
        form_html = form_html,
    );
    layout::page(&post.title, viewer, &body)
}

pub struct PostFormPage<'a> {
    pub heading: &'a str,
    pub action: &'a str,
    pub form: &'a PostForm,
    pub errors: &'a FormErrors,
    pub categories: &'a [Category],
    pub locations: &'a [Location],
    pub current_image: Option<&'a str>,
}

pub fn post_form_page(viewer: Option<&User>, page: PostFormPage<'_>) -> Html<String> {
    let errors = page.errors;
    let category_options: Vec<(String, String)> = page
        .categories
        .iter()
        .map(|c| (c.id.to_string(), c.title.clone()))
        .collect();
    let location_options: Vec<(String, String)> = page
        .locations
        .iter()
        .map(|l| (l.id.to_string(), l.name.clone()))
        .collect();

    let current_image = page
        .current_image
        .map(|path| {
            format!(
                r#"<p>Current image: <a href="{}">{}</a></p>
{}"#,
                esc(&urls::media(path)),
                esc(path),
                checkbox("clear_image", "Remove image", page.form.clear_image, errors)
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"<h1>{heading}</h1>
<form method="post" action="{action}" enctype="multipart/form-data">
{non_field}
{title}
{text}
{pub_date}
<p class="help">Set a date in the future to schedule the post.</p>
{location}
{category}
{current_image}
<p><label for="id_image">Image</label>
<input type="file" name="image" id="id_image" accept="image/*">{image_errors}</p>
{is_published}
<button type="submit">Save</button>
</form>"#,
        heading = esc(page.heading),
        action = page.action,
        non_field = non_field_errors(errors),
        title = input("text", "title", "Title", &page.form.title, errors),
        text = textarea("text", "Text", &page.form.text, errors),
        pub_date = input(
            "datetime-local",
            "pub_date",
            "Publication date",
            &page.form.pub_date,
            errors
        ),
        location = select(
            "location",
            "Location",
            &page.form.location,
            &location_options,
            errors
        ),
        category = select(
            "category",
            "Category",
            &page.form.category,
            &category_options,
            errors
        ),
        current_image = current_image,
        image_errors = super::error_list(errors.field("image")),
        is_published = checkbox("is_published", "Published", page.form.is_published, errors),
    );
    layout::page(page.heading, viewer, &body)
}

pub fn post_delete_page(viewer: Option<&User>, post: &PostView) -> Html<String> {
    let body = format!(
        r#"<h1>Delete post</h1>
<p>Delete “{title}” together with its {count} comments?</p>
<form method="post" action="{action}">
<button type="submit">Delete</button> <a href="{back}">Cancel</a>
</form>"#,
        title = esc(&post.title),
        count = post.comment_count,
        action = urls::post_delete(post.id),
        back = urls::post_detail(post.id),
    );
    layout::page("Delete post", viewer, &body)
}

pub fn comment_form_page(
    viewer: Option<&User>,
    heading: &str,
    action: &str,
    form: &CommentForm,
    errors: &FormErrors,
) -> Html<String> {
    let body = format!(
        "<h1>{}</h1>\n{}",
        esc(heading),
        comment_form(action, form, errors, "Save")
    );
    layout::page(heading, viewer, &body)
}

pub fn comment_delete_page(viewer: Option<&User>, comment: &Comment) -> Html<String> {
    let body = format!(
        r#"<h1>Delete comment</h1>
<blockquote>{text}</blockquote>
<form method="post" action="{action}">
<button type="submit">Delete</button> <a href="{back}">Cancel</a>
</form>"#,
        text = linebreaks(&comment.text),
        action = urls::delete_comment(comment.post_id, comment.id),
        back = urls::post_detail(comment.post_id),
    );
    layout::page("Delete comment", viewer, &body)
}

pub fn user_form_page(viewer: Option<&User>, form: &UserForm, errors: &FormErrors) -> Html<String> {
    let body = format!(
        r#"<h1>Edit profile</h1>
<form method="post" action="{action}">
{non_field}
{username}
{email}
{first_name}
{last_name}
<button type="submit">Save</button>
</form>"#,
        action = urls::PROFILE_EDIT,
        non_field = non_field_errors(errors),
        username = input("text", "username", "Username", &form.username, errors),
        email = input("email", "email", "Email", &form.email, errors),
        first_name = input("text", "first_name", "First name", &form.first_name, errors),
        last_name = input("text", "last_name", "Last name", &form.last_name, errors),
    );
    layout::page("Edit profile", viewer, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::Paginator;
    use chrono::Duration;
    use uuid::Uuid;

    fn post(id: i64, title: &str) -> PostView {
        PostView {
            id,
            title: title.to_string(),
            text: "Body".to_string(),
            pub_date: Utc::now() - Duration::hours(1),
            is_published: true,
            created_at: Utc::now(),
            image: Some("posts_images/cat.png".to_string()),
            author_id: Uuid::new_v4(),
            author_username: "writer".to_string(),
            category_id: Some(1),
            category_title: Some("Travel".to_string()),
            category_slug: Some("travel".to_string()),
            category_is_published: Some(true),
            location_id: None,
            location_name: None,
            location_is_published: None,
            comment_count: 3,
        }
    }

    #[test]
    fn feed_links_posts_and_pages() {
        let window = Paginator::new(25).window(Some("2")).unwrap();
        let page = Page::new(vec![post(7, "Seventh")], window);
        let Html(html) = index_page(None, &page);
        assert!(html.contains(r#"<a href="/posts/7/">Seventh</a>"#));
        assert!(html.contains(r#"href="/?page=1""#));
        assert!(html.contains(r#"href="/?page=3""#));
        assert!(html.contains("Comments (3)"));
    }

    #[test]
    fn titles_are_escaped() {
        let window = Paginator::new(1).window(None).unwrap();
        let page = Page::new(vec![post(1, "<b>bold</b>")], window);
        let Html(html) = index_page(None, &page);
        assert!(!html.contains("<b>bold</b>"));
    }

    #[test]
    fn anonymous_detail_asks_to_log_in() {
        let Html(html) = post_detail_page(
            None,
            &post(4, "Four"),
            &[],
            &CommentForm::default(),
            &FormErrors::new(),
        );
        assert!(html.contains("/auth/login/?next=/posts/4/"));
        assert!(!html.contains("Edit post"));
    }
}

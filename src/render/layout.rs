use axum::response::Html;

use super::{esc, urls};
use crate::models::User;

const SITE_NAME: &str = "Blogicum";

fn navigation(viewer: Option<&User>) -> String {
    let mut links = vec![
        format!(r#"<a href="{}">Home</a>"#, urls::INDEX),
        format!(r#"<a href="{}">About</a>"#, urls::ABOUT),
        format!(r#"<a href="{}">Rules</a>"#, urls::RULES),
    ];

    match viewer {
        Some(user) => {
            links.push(format!(r#"<a href="{}">New post</a>"#, urls::POST_CREATE));
            links.push(format!(
                r#"<a href="{}">{}</a>"#,
                esc(&urls::profile(&user.username)),
                esc(&user.username)
            ));
            if user.is_admin() {
                links.push(format!(r#"<a href="{}">Admin</a>"#, urls::ADMIN));
            }
            links.push(format!(
                r#"<form method="post" action="{}" class="logout"><button type="submit">Log out</button></form>"#,
                urls::LOGOUT
            ));
        }
        None => {
            links.push(format!(r#"<a href="{}">Log in</a>"#, urls::LOGIN));
            links.push(format!(r#"<a href="{}">Register</a>"#, urls::REGISTRATION));
        }
    }

    format!("<nav>{}</nav>", links.join("\n"))
}

/// Wraps a page body in the site chrome.
pub fn page(title: &str, viewer: Option<&User>, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | {site}</title>
</head>
<body>
<header><a href="/" class="brand">{site}</a>
{nav}
</header>
<main>
{body}
</main>
<footer>&copy; {site}</footer>
</body>
</html>"#,
        title = esc(title),
        site = SITE_NAME,
        nav = navigation(viewer),
        body = body,
    ))
}

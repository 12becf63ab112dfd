use axum::{http::StatusCode, response::Html};

use super::{esc, layout};
use crate::models::User;

pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    let title = status
        .canonical_reason()
        .unwrap_or("Error")
        .to_string();
    let body = format!(
        r#"<h1>{} {}</h1>
<p>{}</p>
<p><a href="/">Back to the home page</a></p>"#,
        status.as_u16(),
        esc(&title),
        esc(message)
    );
    layout::page(&title, None, &body)
}

pub fn about_page(viewer: Option<&User>) -> Html<String> {
    layout::page(
        "About",
        viewer,
        r#"<h1>About the project</h1>
<p>Blogicum is a place to write about your travels, your city and everything in between.
Anyone can read; registered users publish posts, schedule them for later and discuss them in comments.</p>"#,
    )
}

pub fn rules_page(viewer: Option<&User>) -> Html<String> {
    layout::page(
        "Rules",
        viewer,
        r#"<h1>Rules</h1>
<ol>
<li>Be polite to other authors and commenters.</li>
<li>Publish only content you have the right to share.</li>
<li>No spam, advertising or personal data of other people.</li>
<li>Posts and comments breaking these rules are removed by the administrators.</li>
</ol>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_page_shows_status_and_message() {
        let Html(html) = error_page(StatusCode::NOT_FOUND, "Nothing here");
        assert!(html.contains("<h1>404 "));
        assert!(html.contains("Nothing"));
    }
}

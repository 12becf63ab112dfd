// Path builders for every page that other pages link or redirect to.

pub const INDEX: &str = "/";
pub const POST_CREATE: &str = "/posts/create/";
pub const PROFILE_EDIT: &str = "/profile/edit/";
pub const LOGIN: &str = "/auth/login/";
pub const LOGOUT: &str = "/auth/logout/";
pub const REGISTRATION: &str = "/auth/registration/";
pub const PASSWORD_CHANGE: &str = "/auth/password_change/";
pub const PASSWORD_CHANGE_DONE: &str = "/auth/password_change/done/";
pub const PASSWORD_RESET: &str = "/auth/password_reset/";
pub const PASSWORD_RESET_DONE: &str = "/auth/password_reset/done/";
pub const PASSWORD_RESET_COMPLETE: &str = "/auth/reset/done/";
pub const ADMIN: &str = "/admin/";
pub const ADMIN_CATEGORIES: &str = "/admin/categories/";
pub const ADMIN_LOCATIONS: &str = "/admin/locations/";
pub const ADMIN_CATEGORY_CREATE: &str = "/admin/categories/create/";
pub const ADMIN_LOCATION_CREATE: &str = "/admin/locations/create/";
pub const ABOUT: &str = "/pages/about/";
pub const RULES: &str = "/pages/rules/";

pub fn post_detail(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

pub fn post_edit(post_id: i64) -> String {
    format!("/posts/{}/edit/", post_id)
}

pub fn post_delete(post_id: i64) -> String {
    format!("/posts/{}/delete/", post_id)
}

pub fn add_comment(post_id: i64) -> String {
    format!("/posts/{}/comment/", post_id)
}

pub fn edit_comment(post_id: i64, comment_id: i64) -> String {
    format!("/posts/{}/edit_comment/{}", post_id, comment_id)
}

pub fn delete_comment(post_id: i64, comment_id: i64) -> String {
    format!("/posts/{}/delete_comment/{}/", post_id, comment_id)
}

pub fn category(slug: &str) -> String {
    format!("/category/{}/", slug)
}

pub fn profile(username: &str) -> String {
    format!("/profile/{}/", username)
}

pub fn password_reset_confirm(token: &str) -> String {
    format!("/auth/reset/{}/", token)
}

pub fn media(path: &str) -> String {
    format!("/media/{}", path)
}

pub fn admin_category_edit(category_id: i64) -> String {
    format!("/admin/categories/{}/edit/", category_id)
}

pub fn admin_category_delete(category_id: i64) -> String {
    format!("/admin/categories/{}/delete/", category_id)
}

pub fn admin_location_edit(location_id: i64) -> String {
    format!("/admin/locations/{}/edit/", location_id)
}

pub fn admin_location_delete(location_id: i64) -> String {
    format!("/admin/locations/{}/delete/", location_id)
}

/// Only local absolute paths are accepted as a post-login destination.
pub fn safe_next(next: &str) -> Option<&str> {
    if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') {
        Some(next)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_routes_keep_their_slashes() {
        assert_eq!(edit_comment(3, 8), "/posts/3/edit_comment/8");
        assert_eq!(delete_comment(3, 8), "/posts/3/delete_comment/8/");
    }

    #[test]
    fn next_must_stay_on_site() {
        assert_eq!(safe_next("/posts/create/"), Some("/posts/create/"));
        assert_eq!(safe_next("//evil.example"), None);
        assert_eq!(safe_next("https://evil.example"), None);
        assert_eq!(safe_next(""), None);
    }
}

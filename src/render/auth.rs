use axum::response::Html;

use super::{esc, input, layout, non_field_errors, urls};
use crate::{
    forms::{FormErrors, LoginForm, PasswordResetForm, RegistrationForm},
    models::User,
};

fn form_page(
    viewer: Option<&User>,
    title: &str,
    action: &str,
    fields: &str,
    submit: &str,
    footer: &str,
) -> Html<String> {
    let body = format!(
        r#"<h1>{title}</h1>
<form method="post" action="{action}">
{fields}
<button type="submit">{submit}</button>
</form>
{footer}"#,
        title = esc(title),
        action = action,
        fields = fields,
        submit = esc(submit),
        footer = footer,
    );
    layout::page(title, viewer, &body)
}

fn message_page(viewer: Option<&User>, title: &str, message: &str) -> Html<String> {
    let body = format!(
        r#"<h1>{}</h1>
<p>{}</p>
<p><a href="{}">Back to the home page</a></p>"#,
        esc(title),
        message,
        urls::INDEX
    );
    layout::page(title, viewer, &body)
}

pub fn login_page(form: &LoginForm, errors: &FormErrors) -> Html<String> {
    let fields = format!(
        r#"{}
{}
{}
<input type="hidden" name="next" value="{}">"#,
        non_field_errors(errors),
        input("text", "username", "Username", &form.username, errors),
        input("password", "password", "Password", "", errors),
        esc(&form.next)
    );
    let footer = format!(
        r#"<p><a href="{}">Forgot your password?</a></p>
<p>No account yet? <a href="{}">Register</a></p>"#,
        urls::PASSWORD_RESET,
        urls::REGISTRATION
    );
    form_page(None, "Log in", urls::LOGIN, &fields, "Log in", &footer)
}

pub fn logged_out_page() -> Html<String> {
    message_page(
        None,
        "Logged out",
        &format!(
            r#"You have left your account. <a href="{}">Log in again</a>"#,
            urls::LOGIN
        ),
    )
}

pub fn registration_page(form: &RegistrationForm, errors: &FormErrors) -> Html<String> {
    let fields = format!(
        "{}\n{}\n{}\n{}\n{}",
        non_field_errors(errors),
        input("text", "username", "Username", &form.username, errors),
        input("email", "email", "Email", &form.email, errors),
        input("password", "password", "Password", "", errors),
        input(
            "password",
            "password_confirm",
            "Password confirmation",
            "",
            errors
        ),
    );
    form_page(
        None,
        "Registration",
        urls::REGISTRATION,
        &fields,
        "Register",
        "",
    )
}

/// Password inputs never echo what was typed, so only the errors are needed.
pub fn password_change_page(viewer: &User, errors: &FormErrors) -> Html<String> {
    let fields = format!(
        "{}\n{}\n{}\n{}",
        non_field_errors(errors),
        input("password", "old_password", "Old password", "", errors),
        input("password", "new_password", "New password", "", errors),
        input(
            "password",
            "new_password_confirm",
            "New password confirmation",
            "",
            errors
        ),
    );
    form_page(
        Some(viewer),
        "Password change",
        urls::PASSWORD_CHANGE,
        &fields,
        "Change my password",
        "",
    )
}

pub fn password_change_done_page(viewer: &User) -> Html<String> {
    message_page(
        Some(viewer),
        "Password changed",
        "Your password was changed.",
    )
}

pub fn password_reset_page(form: &PasswordResetForm, errors: &FormErrors) -> Html<String> {
    let fields = format!(
        "{}\n{}",
        non_field_errors(errors),
        input("email", "email", "Email", &form.email, errors)
    );
    form_page(
        None,
        "Password reset",
        urls::PASSWORD_RESET,
        &fields,
        "Send reset link",
        "",
    )
}

pub fn password_reset_done_page() -> Html<String> {
    message_page(
        None,
        "Password reset sent",
        "If an account with that email exists, we have sent instructions for setting a new password. \
         Check your inbox and the spam folder.",
    )
}

/// `valid` is false when the link's token is unknown or expired.
pub fn password_reset_confirm_page(token: &str, valid: bool, errors: &FormErrors) -> Html<String> {
    if !valid {
        return message_page(
            None,
            "Password reset failed",
            &format!(
                r#"The reset link is invalid, possibly because it has already been used or has expired. <a href="{}">Request a new one</a>"#,
                urls::PASSWORD_RESET
            ),
        );
    }
    let fields = format!(
        "{}\n{}\n{}",
        non_field_errors(errors),
        input("password", "new_password", "New password", "", errors),
        input(
            "password",
            "new_password_confirm",
            "New password confirmation",
            "",
            errors
        ),
    );
    form_page(
        None,
        "Enter new password",
        &urls::password_reset_confirm(token),
        &fields,
        "Change my password",
        "",
    )
}

pub fn password_reset_complete_page() -> Html<String> {
    message_page(
        None,
        "Password reset complete",
        &format!(
            r#"Your password has been set. <a href="{}">Log in</a>"#,
            urls::LOGIN
        ),
    )
}

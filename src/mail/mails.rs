use super::sendmail::{MailError, render_template, send_email};
use crate::config::SmtpConfig;

const PASSWORD_RESET_TEMPLATE: &str = include_str!("templates/password-reset.html");

pub async fn send_password_reset_email(
    smtp: Option<&SmtpConfig>,
    to_email: &str,
    username: &str,
    reset_link: &str,
) -> Result<(), MailError> {
    let subject = "Password reset on Blogicum";
    let html = render_template(
        PASSWORD_RESET_TEMPLATE,
        &[
            ("username", ammonia::clean_text(username)),
            ("reset_link", reset_link.to_string()),
        ],
    );

    send_email(smtp, to_email, subject, html).await
}

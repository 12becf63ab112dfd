use lettre::{
    Message, SmtpTransport, Transport,
    message::{SinglePart, header},
    transport::smtp::authentication::Credentials,
};

use crate::config::SmtpConfig;

pub type MailError = Box<dyn std::error::Error + Send + Sync>;

/// Fills `{{key}}` placeholders of an HTML template.
pub fn render_template(template: &str, placeholders: &[(&str, String)]) -> String {
    let mut html = template.to_string();
    for (key, value) in placeholders {
        html = html.replace(&format!("{{{{{}}}}}", key), value);
    }
    html
}

/// Send an HTML email using SMTP
///
/// Without SMTP settings the message is written to the log instead, which is
/// how development setups read their reset links.
///
/// # Parameters
/// - `smtp`: relay settings, `None` when mail is not configured
/// - `to_email`: Recipient's email address
/// - `subject`: Email subject line
/// - `html`: rendered message body
pub async fn send_email(
    smtp: Option<&SmtpConfig>,
    to_email: &str,
    subject: &str,
    html: String,
) -> Result<(), MailError> {
    let Some(smtp) = smtp else {
        tracing::info!(to = %to_email, subject = %subject, body = %html, "SMTP not configured, email logged");
        return Ok(());
    };

    let email = Message::builder()
        .from(smtp.username.parse()?)
        .to(to_email.parse()?)
        .subject(subject)
        .header(header::ContentType::TEXT_HTML)
        .singlepart(
            SinglePart::builder()
                .header(header::ContentType::TEXT_HTML)
                .body(html),
        )?;

    // STARTTLS: starts unencrypted, upgrades to TLS
    let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());
    let mailer = SmtpTransport::starttls_relay(&smtp.server)?
        .credentials(creds)
        .port(smtp.port)
        .build();

    // The transport is blocking.
    tokio::task::spawn_blocking(move || mailer.send(&email)).await??;

    tracing::info!(to = %to_email, subject = %subject, "Email sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_replaced() {
        let html = render_template(
            "<p>Hi {{username}}, {{username}}!</p>",
            &[("username", "ann".to_string())],
        );
        assert_eq!(html, "<p>Hi ann, ann!</p>");
    }

    #[tokio::test]
    async fn unconfigured_smtp_only_logs() {
        let result = send_email(None, "ann@example.com", "Hi", "<p>body</p>".to_string()).await;
        assert!(result.is_ok());
    }
}

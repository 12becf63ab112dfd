use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::db::PostInput;
use crate::models::{Category, Location, User};
use crate::utils::password;

// Forms define which fields of an entity a user may edit. Each form is the
// urlencoded body of its page; `#[serde(default)]` lets a missing field
// surface as a validation message instead of a rejected request.

/// `<input type="datetime-local">` value format
pub const DATETIME_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Per-field validation messages shown next to the inputs
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();
        for (field, errs) in errors.field_errors() {
            for err in errs.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                form_errors.add(&field, message);
            }
        }
        form_errors
    }
}

fn validation_error(code: &'static str, message: impl Into<String>) -> ValidationError {
    let message: String = message.into();
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn not_blank(value: &String) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(validation_error("required", "This field is required."));
    }
    Ok(())
}

/// Letters, digits and `@ . + - _`, like the usual account name rules.
fn valid_username(value: &String) -> Result<(), ValidationError> {
    if value
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        Ok(())
    } else {
        Err(validation_error(
            "invalid_username",
            "Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters.",
        ))
    }
}

fn optional_email(value: &String) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_email() {
        Ok(())
    } else {
        Err(validation_error("email", "Enter a valid email address."))
    }
}

fn valid_slug(value: &String) -> Result<(), ValidationError> {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        Err(validation_error(
            "invalid_slug",
            "Enter a valid slug consisting of Latin letters, numbers, underscores or hyphens.",
        ))
    }
}

fn strong_password(value: &String) -> Result<(), ValidationError> {
    password::validate(value).map_err(|e| validation_error("password", e.to_string()))
}

/// Parses a `datetime-local` value (with or without seconds) as UTC.
pub fn parse_datetime_input(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, DATETIME_INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn format_datetime_input(value: DateTime<Utc>) -> String {
    value.format(DATETIME_INPUT_FORMAT).to_string()
}

// ============================================================================
// Blog forms
// ============================================================================

/// Post form: every post field except the author, which is the requester
///
/// Built from the multipart body; the uploaded image travels separately.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostForm {
    #[validate(
        length(max = 256, message = "Ensure this value has at most 256 characters."),
        custom(function = "not_blank")
    )]
    pub title: String,

    #[validate(custom(function = "not_blank"))]
    pub text: String,

    pub pub_date: String,
    pub category: String,
    pub location: String,
    pub is_published: bool,
    pub clear_image: bool,
}

impl PostForm {
    /// Initial values of the create page: published now.
    pub fn blank() -> Self {
        PostForm {
            pub_date: format_datetime_input(Utc::now()),
            is_published: true,
            ..Default::default()
        }
    }

    pub fn from_post(post: &crate::dtos::PostView) -> Self {
        PostForm {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: format_datetime_input(post.pub_date),
            category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
            location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
            is_published: post.is_published,
            clear_image: false,
        }
    }

    /// Validates the form against the current choices and produces the
    /// values to store.
    pub fn to_input(
        &self,
        categories: &[Category],
        locations: &[Location],
        image: Option<String>,
    ) -> Result<PostInput, FormErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from(e),
        };

        let pub_date = parse_datetime_input(&self.pub_date);
        if pub_date.is_none() {
            errors.add("pub_date", "Enter a valid date/time.");
        }

        let category_id = choice(&self.category, categories.iter().map(|c| c.id));
        if category_id.is_err() {
            errors.add("category", "Select a valid choice.");
        }

        let location_id = choice(&self.location, locations.iter().map(|l| l.id));
        if location_id.is_err() {
            errors.add("location", "Select a valid choice.");
        }

        match (pub_date, category_id, location_id) {
            (Some(pub_date), Ok(category_id), Ok(location_id)) if errors.is_empty() => {
                Ok(PostInput {
                    title: self.title.trim().to_string(),
                    text: self.text.clone(),
                    pub_date,
                    is_published: self.is_published,
                    category_id,
                    location_id,
                    image,
                    clear_image: self.clear_image,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Optional select value: empty means none, otherwise one of `ids`.
fn choice(raw: &str, mut ids: impl Iterator<Item = i64>) -> Result<Option<i64>, ()> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let id = raw.parse::<i64>().map_err(|_| ())?;
    if ids.any(|candidate| candidate == id) {
        Ok(Some(id))
    } else {
        Err(())
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    #[validate(custom(function = "not_blank"))]
    pub text: String,
}

/// Profile form: the account's public fields, never role or password
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserForm {
    #[validate(
        length(min = 1, max = 150, message = "Username must be between 1 and 150 characters."),
        custom(function = "valid_username")
    )]
    pub username: String,

    #[validate(custom(function = "optional_email"))]
    pub email: String,

    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,

    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,
}

impl UserForm {
    pub fn from_user(user: &User) -> Self {
        UserForm {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

// ============================================================================
// Authentication forms
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    #[validate(
        length(min = 1, max = 150, message = "Username must be between 1 and 150 characters."),
        custom(function = "valid_username")
    )]
    pub username: String,

    #[validate(custom(function = "optional_email"))]
    pub email: String,

    #[validate(custom(function = "strong_password"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "The two password fields didn't match."))]
    pub password_confirm: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,

    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,

    pub next: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordChangeForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub old_password: String,

    #[validate(custom(function = "strong_password"))]
    pub new_password: String,

    #[validate(must_match(
        other = "new_password",
        message = "The two password fields didn't match."
    ))]
    pub new_password_confirm: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordResetForm {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SetPasswordForm {
    #[validate(custom(function = "strong_password"))]
    pub new_password: String,

    #[validate(must_match(
        other = "new_password",
        message = "The two password fields didn't match."
    ))]
    pub new_password_confirm: String,
}

// ============================================================================
// Admin forms
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    #[validate(
        length(max = 256, message = "Ensure this value has at most 256 characters."),
        custom(function = "not_blank")
    )]
    pub title: String,

    #[validate(custom(function = "not_blank"))]
    pub description: String,

    #[validate(
        length(max = 64, message = "Ensure this value has at most 64 characters."),
        custom(function = "valid_slug")
    )]
    pub slug: String,

    /// Checkbox: present only when ticked
    pub is_published: Option<String>,
}

impl CategoryForm {
    pub fn blank() -> Self {
        CategoryForm {
            is_published: Some("on".to_string()),
            ..Default::default()
        }
    }

    pub fn from_category(category: &Category) -> Self {
        CategoryForm {
            title: category.title.clone(),
            description: category.description.clone(),
            slug: category.slug.clone(),
            is_published: category.is_published.then(|| "on".to_string()),
        }
    }

    pub fn published(&self) -> bool {
        self.is_published.is_some()
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationForm {
    #[validate(
        length(max = 256, message = "Ensure this value has at most 256 characters."),
        custom(function = "not_blank")
    )]
    pub name: String,

    pub is_published: Option<String>,
}

impl LocationForm {
    pub fn blank() -> Self {
        LocationForm {
            is_published: Some("on".to_string()),
            ..Default::default()
        }
    }

    pub fn from_location(location: &Location) -> Self {
        LocationForm {
            name: location.name.clone(),
            is_published: location.is_published.then(|| "on".to_string()),
        }
    }

    pub fn published(&self) -> bool {
        self.is_published.is_some()
    }
}

/// Validates a urlencoded form into the messages the page shows.
pub fn check<T: Validate>(form: &T) -> Result<(), FormErrors> {
    form.validate().map_err(FormErrors::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    fn category(id: i64) -> Category {
        Category {
            id,
            title: "Travel".to_string(),
            description: "Trips".to_string(),
            slug: "travel".to_string(),
            is_published: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_comment_is_rejected() {
        let errors = check(&CommentForm {
            text: "   ".to_string(),
        })
        .unwrap_err();
        assert_eq!(errors.field("text"), ["This field is required."]);
    }

    #[test]
    fn comment_with_text_passes() {
        assert!(
            check(&CommentForm {
                text: "Nice post".to_string()
            })
            .is_ok()
        );
    }

    #[test]
    fn post_form_builds_input() {
        let form = PostForm {
            title: "  Trip  ".to_string(),
            text: "We went north.".to_string(),
            pub_date: "2025-05-01T10:30".to_string(),
            category: "3".to_string(),
            location: String::new(),
            is_published: true,
            clear_image: false,
        };

        let input = form
            .to_input(&[category(3)], &[], Some("posts_images/a.png".to_string()))
            .unwrap();

        assert_eq!(input.title, "Trip");
        assert_eq!(input.category_id, Some(3));
        assert_eq!(input.location_id, None);
        assert_eq!(input.image.as_deref(), Some("posts_images/a.png"));
        assert_eq!(
            input.pub_date,
            Utc.with_ymd_and_hms(2025, 5, 1, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn post_form_collects_every_error() {
        let form = PostForm {
            title: String::new(),
            text: String::new(),
            pub_date: "yesterday".to_string(),
            category: "99".to_string(),
            location: "abc".to_string(),
            is_published: true,
            clear_image: false,
        };

        let errors = form.to_input(&[category(3)], &[], None).unwrap_err();
        for field in ["title", "text", "pub_date", "category", "location"] {
            assert!(!errors.field(field).is_empty(), "missing error for {}", field);
        }
    }

    #[test]
    fn datetime_input_accepts_seconds() {
        let parsed = parse_datetime_input("2024-12-31T23:59:30").unwrap();
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.second(), 30);
        assert_eq!(format_datetime_input(parsed), "2024-12-31T23:59");
    }

    #[test]
    fn registration_requires_matching_passwords() {
        let form = RegistrationForm {
            username: "reader".to_string(),
            email: String::new(),
            password: "long enough".to_string(),
            password_confirm: "different".to_string(),
        };
        let errors = check(&form).unwrap_err();
        assert_eq!(
            errors.field("password_confirm"),
            ["The two password fields didn't match."]
        );
    }

    #[test]
    fn registration_rejects_bad_username_and_email() {
        let form = RegistrationForm {
            username: "has space".to_string(),
            email: "not-an-email".to_string(),
            password: "long enough".to_string(),
            password_confirm: "long enough".to_string(),
        };
        let errors = check(&form).unwrap_err();
        assert!(!errors.field("username").is_empty());
        assert_eq!(errors.field("email"), ["Enter a valid email address."]);
    }

    #[test]
    fn short_password_uses_password_rules() {
        let form = SetPasswordForm {
            new_password: "short".to_string(),
            new_password_confirm: "short".to_string(),
        };
        let errors = check(&form).unwrap_err();
        assert_eq!(
            errors.field("new_password"),
            ["Password must be at least 8 characters"]
        );
    }

    #[test]
    fn slug_rules() {
        let mut form = CategoryForm {
            title: "Travel".to_string(),
            description: "Trips".to_string(),
            slug: "travel-2025_ok".to_string(),
            is_published: None,
        };
        assert!(check(&form).is_ok());
        assert!(!form.published());

        form.slug = "no spaces".to_string();
        assert!(!check(&form).unwrap_err().field("slug").is_empty());
    }
}

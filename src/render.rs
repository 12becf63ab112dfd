//! Server-side HTML rendering.
//!
//! Every page is a plain function returning `Html<String>`; user-supplied text
//! always goes through [`esc`] before it reaches the markup.

pub mod admin;
pub mod auth;
pub mod blog;
pub mod layout;
pub mod pages;
pub mod urls;

use crate::forms::FormErrors;

/// Key under which errors that belong to no single field are stored.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Escapes text for element content and quoted attribute values.
pub fn esc(text: &str) -> String {
    ammonia::clean_text(text)
}

/// Escaped text with line breaks kept.
pub fn linebreaks(text: &str) -> String {
    text.lines().map(esc).collect::<Vec<_>>().join("<br>\n")
}

/// First `count` words of `text`, with an ellipsis when cut.
pub fn truncate_words(text: &str, count: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= count {
        words.join(" ")
    } else {
        format!("{} …", words[..count].join(" "))
    }
}

fn error_list(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", esc(m)))
        .collect();
    format!(r#"<ul class="errorlist">{}</ul>"#, items)
}

pub fn non_field_errors(errors: &FormErrors) -> String {
    error_list(errors.field(NON_FIELD_ERRORS))
}

/// `<input>` with label and the field's messages.
pub fn input(kind: &str, name: &str, label: &str, value: &str, errors: &FormErrors) -> String {
    format!(
        r#"<p><label for="id_{name}">{label}</label>
<input type="{kind}" name="{name}" id="id_{name}" value="{value}">{errors}</p>"#,
        kind = kind,
        name = name,
        label = esc(label),
        value = esc(value),
        errors = error_list(errors.field(name)),
    )
}

pub fn textarea(name: &str, label: &str, value: &str, errors: &FormErrors) -> String {
    format!(
        r#"<p><label for="id_{name}">{label}</label>
<textarea name="{name}" id="id_{name}" rows="10" cols="40">{value}</textarea>{errors}</p>"#,
        name = name,
        label = esc(label),
        value = esc(value),
        errors = error_list(errors.field(name)),
    )
}

pub fn checkbox(name: &str, label: &str, checked: bool, errors: &FormErrors) -> String {
    format!(
        r#"<p><label for="id_{name}">{label}</label>
<input type="checkbox" name="{name}" id="id_{name}"{checked}>{errors}</p>"#,
        name = name,
        label = esc(label),
        checked = if checked { " checked" } else { "" },
        errors = error_list(errors.field(name)),
    )
}

/// Optional `<select>`: the empty choice means "none".
pub fn select(
    name: &str,
    label: &str,
    selected: &str,
    options: &[(String, String)],
    errors: &FormErrors,
) -> String {
    let mut choices = format!(
        r#"<option value=""{}>---------</option>"#,
        if selected.is_empty() { " selected" } else { "" }
    );
    for (value, text) in options {
        choices.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            esc(value),
            if value == selected { " selected" } else { "" },
            esc(text)
        ));
    }
    format!(
        r#"<p><label for="id_{name}">{label}</label>
<select name="{name}" id="id_{name}">{choices}</select>{errors}</p>"#,
        name = name,
        label = esc(label),
        choices = choices,
        errors = error_list(errors.field(name)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_escaped() {
        let escaped = esc("<script>alert(1)</script>");
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('>'));
    }

    #[test]
    fn linebreaks_keep_lines() {
        let html = linebreaks("one\ntwo\nthree");
        assert_eq!(html.matches("<br>").count(), 2);
    }

    #[test]
    fn truncates_long_text() {
        assert_eq!(truncate_words("a b c d", 2), "a b …");
        assert_eq!(truncate_words("a  b", 5), "a b");
    }

    #[test]
    fn field_errors_follow_input() {
        let mut errors = FormErrors::new();
        errors.add("title", "This field is required.");
        let html = input("text", "title", "Title", "", &errors);
        assert!(html.contains(r#"<ul class="errorlist">"#));
        assert!(html.contains("required"));
    }

    #[test]
    fn select_marks_current_choice() {
        let options = vec![
            ("1".to_string(), "Travel".to_string()),
            ("2".to_string(), "Food".to_string()),
        ];
        let html = select("category", "Category", "2", &options, &FormErrors::new());
        assert!(html.contains(r#"<option value="2" selected>"#));
        assert!(!html.contains(r#"<option value="" selected>"#));
    }
}

// src/models/page.rs

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::{Validate, ValidationError};

/// Represents the 'pages' table in the database.
///
/// `html` is the source exactly as published. It is sanitized on every read,
/// so a policy change applies to pages published before it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub html: String,
    /// Empty when the publisher gave none.
    pub original_url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A page ready to be stored (already validated and truncated).
#[derive(Debug, Clone)]
pub struct NewPage {
    pub html: String,
    pub original_url: String,
}

/// Form body of `POST /api/page`.
#[derive(Debug, Deserialize, Validate)]
pub struct PublishPageRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "HTML body expected."))]
    pub html: String,

    #[serde(default, rename = "original-url")]
    #[validate(custom(function = validate_origin_url))]
    pub original_url: String,
}

impl PublishPageRequest {
    /// Origin URL cut to at most `max_chars` characters.
    pub fn truncated_original_url(&self, max_chars: usize) -> String {
        self.original_url.chars().take(max_chars).collect()
    }
}

/// Query parameters of `GET /p/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Any non-empty value asks for the plain-text remix view.
    pub code: Option<String>,
}

impl PageQuery {
    pub fn wants_source(&self) -> bool {
        self.code.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// Accepts an empty value or an absolute http(s) URL.
fn validate_origin_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() {
        return Ok(());
    }
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::new("invalid_origin_url")
            .with_message(Cow::Borrowed("Invalid origin URL."))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(html: &str, original_url: &str) -> PublishPageRequest {
        PublishPageRequest {
            html: html.to_string(),
            original_url: original_url.to_string(),
        }
    }

    #[test]
    fn origin_url_must_be_http_or_https() {
        assert!(request("hi", "").validate().is_ok());
        assert!(request("hi", "http://foo.com/").validate().is_ok());
        assert!(request("hi", "https://foo.com/a?b").validate().is_ok());
        assert!(request("hi", "javascript:LOL").validate().is_err());
        assert!(request("hi", "ftp://foo.com/").validate().is_err());
        assert!(request("hi", "not a url").validate().is_err());
    }

    #[test]
    fn empty_html_fails_validation() {
        let errors = request("", "").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("html"));
    }

    #[test]
    fn origin_url_truncation_respects_char_boundaries() {
        let req = request("hi", "http://foo.com/\u{2026}\u{2026}");
        assert_eq!(req.truncated_original_url(16), "http://foo.com/\u{2026}");
        assert_eq!(req.truncated_original_url(1000), req.original_url);
    }

    #[test]
    fn code_flag_requires_a_value() {
        assert!(!PageQuery { code: None }.wants_source());
        assert!(!PageQuery { code: Some(String::new()) }.wants_source());
        assert!(PageQuery { code: Some("yesplease".to_string()) }.wants_source());
    }
}

// src/handlers/page.rs

use std::sync::Arc;

use axum::{
    Form,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use validator::{Validate, ValidationErrors};

use crate::{
    config::Config,
    error::{AppError, PlainTextError},
    models::page::{NewPage, PageQuery, PublishPageRequest},
    sanitizer::{ContentKind, Sanitizer, View},
    store::PageStore,
};

static X_ORIGINAL_URL: HeaderName = HeaderName::from_static("x-original-url");

/// Publish a page.
/// Stores the raw source and answers with its path as plain text; failures
/// are plain-text messages too.
pub async fn publish_page(
    State(store): State<Arc<dyn PageStore>>,
    State(config): State<Config>,
    Form(payload): Form<PublishPageRequest>,
) -> Result<impl IntoResponse, PlainTextError> {
    // 1. Size limit in characters (an empty body can never trip it)
    let size = payload.html.chars().count();
    if size > config.max_page_size {
        tracing::warn!(
            "Rejected page of {} characters (limit {})",
            size,
            config.max_page_size
        );
        return Err(AppError::PayloadTooLarge("Request Entity Too Large".to_string()).into());
    }

    // 2. Validate payload (empty body first, then origin URL)
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(first_message(
            &validation_errors,
            &["html", "original_url"],
        ))
        .into());
    }

    // 3. Store the unsanitized source
    let original_url = payload.truncated_original_url(config.original_url_max_length);
    let id = store
        .insert(NewPage {
            html: payload.html,
            original_url,
        })
        .await?;

    tracing::info!("Published page {}", id);

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, ContentKind::PlainText.mime_type())],
        format!("/p/{}", id),
    ))
}

/// Get a published page, sanitized now with the current policy.
/// `?code=...` returns the same markup as plain text without nofollow.
pub async fn get_page(
    State(store): State<Arc<dyn PageStore>>,
    State(sanitizer): State<Arc<Sanitizer>>,
    Path(id): Path<i64>,
    Query(params): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = store
        .get(id)
        .await?
        .ok_or(AppError::NotFound("Page not found".to_string()))?;

    let view = if params.wants_source() {
        View::Source
    } else {
        View::Page
    };
    let rendered = sanitizer.render(page.html.as_bytes(), view)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(rendered.kind.mime_type()),
    );
    if !page.original_url.is_empty() {
        match HeaderValue::from_str(&page.original_url) {
            Ok(value) => {
                headers.insert(X_ORIGINAL_URL.clone(), value);
            }
            Err(e) => tracing::warn!("Page {} has an unsendable origin URL: {}", id, e),
        }
    }

    Ok((StatusCode::OK, headers, rendered.body))
}

/// Picks the message of the first failing field, in `order`.
fn first_message(errors: &ValidationErrors, order: &[&str]) -> String {
    let fields = errors.field_errors();
    order
        .iter()
        .filter_map(|field| fields.get(*field))
        .flat_map(|errs| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

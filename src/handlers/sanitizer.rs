// src/handlers/sanitizer.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::sanitizer::Sanitizer;

/// The whitelist currently enforced, for client-side pre-validation.
pub async fn get_sanitizer_config(State(sanitizer): State<Arc<Sanitizer>>) -> impl IntoResponse {
    Json(sanitizer.policy().snapshot())
}

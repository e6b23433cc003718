use std::sync::Arc;

use crate::{config::Config, sanitizer::Sanitizer, store::PageStore};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PageStore>,
    pub sanitizer: Arc<Sanitizer>,
    pub config: Config,
}

impl FromRef<AppState> for Arc<dyn PageStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Arc<Sanitizer> {
    fn from_ref(state: &AppState) -> Self {
        state.sanitizer.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

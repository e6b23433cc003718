// src/store/memory.rs

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::PageStore;
use crate::{
    error::AppError,
    models::page::{NewPage, Page},
};

/// Process-local store, used when no database is configured and in tests.
/// Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    pages: RwLock<Vec<Page>>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    async fn insert(&self, page: NewPage) -> Result<i64, AppError> {
        let mut pages = self.pages.write().await;
        let id = i64::try_from(pages.len() + 1)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        pages.push(Page {
            id,
            html: page.html,
            original_url: page.original_url,
            created_at: chrono::Utc::now(),
        });
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Option<Page>, AppError> {
        let pages = self.pages.read().await;
        let page = usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|index| pages.get(index))
            .cloned();
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_get() {
        let store = MemoryPageStore::new();
        let first = store
            .insert(NewPage {
                html: "<p>one</p>".to_string(),
                original_url: String::new(),
            })
            .await
            .unwrap();
        let second = store
            .insert(NewPage {
                html: "<p>two</p>".to_string(),
                original_url: "http://blah.com/".to_string(),
            })
            .await
            .unwrap();

        assert_eq!((first, second), (1, 2));
        let page = store.get(2).await.unwrap().unwrap();
        assert_eq!(page.html, "<p>two</p>");
        assert_eq!(page.original_url, "http://blah.com/");
    }

    #[tokio::test]
    async fn unknown_ids_are_none() {
        let store = MemoryPageStore::new();
        assert!(store.get(0).await.unwrap().is_none());
        assert!(store.get(-5).await.unwrap().is_none());
        assert!(store.get(1).await.unwrap().is_none());
    }
}

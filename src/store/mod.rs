// src/store/mod.rs

//! Persistence for published pages.
//!
//! Only the unsanitized source is stored. Handlers sanitize on the way out.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::page::{NewPage, Page},
};

pub use memory::MemoryPageStore;
pub use postgres::PgPageStore;

#[async_trait]
pub trait PageStore: Send + Sync {
    /// Stores a page and returns its id.
    async fn insert(&self, page: NewPage) -> Result<i64, AppError>;

    async fn get(&self, id: i64) -> Result<Option<Page>, AppError>;
}

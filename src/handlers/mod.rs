// src/handlers/mod.rs

pub mod page;
pub mod sanitizer;

// src/models/mod.rs

pub mod page;

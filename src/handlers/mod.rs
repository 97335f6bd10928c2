// src/handlers/mod.rs
pub mod error;
pub mod pdf;
pub mod report;

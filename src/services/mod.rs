// src/services/mod.rs
pub mod analytics;
pub mod charts;
pub mod data_store;
pub mod indices;
pub mod pdf;
pub mod report;
pub mod source;
pub mod synthesizer;
pub mod yahoo;

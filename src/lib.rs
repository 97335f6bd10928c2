// src/lib.rs
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use crate::error::{ReportError, Result};

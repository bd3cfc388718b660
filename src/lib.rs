//! Library catalog server
//!
//! REST JSON API over a library catalog: authors, books, genres, languages
//! and the lendable copies of each book, with loan renewal and lending for
//! staff.

use std::sync::Arc;

pub mod access;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod validation;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

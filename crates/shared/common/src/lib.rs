//! Common utilities shared across membership services.
//!
//! This crate provides:
//! - Unified application error handling
//! - Pagination request/response types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod pagination;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
pub use pagination::{Page, PageRequest, Sort, SortDirection};

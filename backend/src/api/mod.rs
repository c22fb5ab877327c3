//! REST API module.
//!
//! Handlers translate HTTP requests into store and query operations. Errors
//! flow out through `AppError`, which renders the JSON error body.

mod accounts;
mod posts;

pub use accounts::*;
pub use posts::*;

/// Result type shared by all handlers.
pub type ApiResult<T> = Result<T, crate::errors::AppError>;

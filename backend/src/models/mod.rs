//! Data models for the blog API.

mod account;
mod post;

pub use account::*;
pub use post::*;

//! Data Transfer Objects

pub mod auth;
pub mod vocabulary;

pub use auth::*;
pub use vocabulary::*;

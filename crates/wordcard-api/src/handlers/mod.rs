//! API Handlers

pub mod auth;
pub mod health;
pub mod vocabulary;

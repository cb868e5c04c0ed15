//! Repository implementations

mod user;
mod vocabulary;

pub use user::{CredentialStore, UserRepo};
pub use vocabulary::VocabularyRepo;

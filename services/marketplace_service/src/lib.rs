pub mod context;
pub mod course;
pub mod enrollment;
pub mod http;
pub mod media;
pub mod operations;
pub mod repository;
pub mod user_account;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{Context, ContextKey, Settings};
